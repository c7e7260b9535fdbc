//! Fuzzy resolution of loosely-specified channel, app and input names.
//!
//! Spoken or typed targets ("twenty four", "netflix", "hdmi 2") are matched
//! against the candidates a device reports. Whitespace is always ignored;
//! channel and app names are also compared upper-cased, input identifiers
//! and labels keep their case.
//!
//! Ties in distance go to the candidate that appears first in the list the
//! device reported.

mod distance;
mod spell;

use std::collections::HashSet;

pub use distance::{Rank, closest, distance, rank_find};
pub use spell::{expand_digits, spell_number};

use crate::command::SetChannelDetail;
use crate::error::NoMatchFound;
use crate::media::{App, Channel, Input};

/// A resolved candidate and how far it was from the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Matched<'a, T> {
    pub item: &'a T,
    /// Zero for exact matches.
    pub distance: usize,
}

impl<'a, T> Matched<'a, T> {
    fn exact(item: &'a T) -> Self {
        Self { item, distance: 0 }
    }
}

/// Remove every whitespace character.
#[must_use]
pub fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Normalize an app or channel name: no whitespace, upper-case.
#[must_use]
pub fn normalize_name(text: &str) -> String {
    strip_whitespace(text).to_uppercase()
}

/// Resolve a channel `set` request against the device's channel list.
///
/// Tiers, first decisive one wins:
/// 1. an exact number or exact name must match exactly, with no fallback;
/// 2. a fuzzy identifier that parses as an integer must match a channel number;
/// 3. otherwise the identifier is fuzzy-ranked against every channel name and
///    its digit-run spellings (`NEWS24` also answers to `NEWSTWENTYFOUR`).
///
/// # Errors
///
/// Returns [`NoMatchFound`] when the decisive tier finds nothing.
pub fn match_channel<'a>(
    detail: &SetChannelDetail,
    channels: &'a [Channel],
) -> Result<Matched<'a, Channel>, NoMatchFound> {
    if let Some(number) = detail.number() {
        return channels
            .iter()
            .find(|c| c.number == number)
            .map(Matched::exact)
            .ok_or_else(|| NoMatchFound::new(number.to_string()));
    }
    if let Some(name) = detail.name() {
        return channels
            .iter()
            .find(|c| c.name == name)
            .map(Matched::exact)
            .ok_or_else(|| NoMatchFound::new(name));
    }

    let identifier = detail.identifier().unwrap_or_default();
    if let Ok(number) = identifier.trim().parse::<i64>() {
        return channels
            .iter()
            .find(|c| i64::from(c.number) == number)
            .map(Matched::exact)
            .ok_or_else(|| NoMatchFound::new(identifier));
    }

    let mut seen = HashSet::new();
    let mut variants = Vec::new();
    let mut owners = Vec::new();
    for (index, channel) in channels.iter().enumerate() {
        for variant in expand_digits(&normalize_name(&channel.name)) {
            if seen.insert(variant.clone()) {
                variants.push(variant);
                owners.push(index);
            }
        }
    }

    let query = normalize_name(identifier);
    let ranks = rank_find(&query, &variants);
    closest(&ranks)
        .map(|rank| Matched {
            item: &channels[owners[rank.index]],
            distance: rank.distance,
        })
        .ok_or_else(|| NoMatchFound::new(identifier))
}

/// Resolve an app by name.
///
/// # Errors
///
/// Returns [`NoMatchFound`] when no app name contains the query.
pub fn match_app<'a>(name: &str, apps: &'a [App]) -> Result<Matched<'a, App>, NoMatchFound> {
    let names: Vec<String> = apps.iter().map(|app| normalize_name(&app.name)).collect();
    let query = normalize_name(name);
    let ranks = rank_find(&query, &names);
    closest(&ranks)
        .map(|rank| Matched {
            item: &apps[rank.index],
            distance: rank.distance,
        })
        .ok_or_else(|| NoMatchFound::new(name))
}

/// Resolve an external input by identifier or label.
///
/// Both lists are ranked independently and the lower distance wins wherever
/// it came from; on equal distance the identifier match is kept.
///
/// # Errors
///
/// Returns [`NoMatchFound`] when neither identifiers nor labels contain the query.
pub fn match_input<'a>(
    name: &str,
    inputs: &'a [Input],
) -> Result<Matched<'a, Input>, NoMatchFound> {
    let query = strip_whitespace(name);
    let ids: Vec<String> = inputs.iter().map(|i| strip_whitespace(&i.id)).collect();
    let labels: Vec<String> = inputs.iter().map(|i| strip_whitespace(&i.label)).collect();

    let by_id = closest(&rank_find(&query, &ids));
    let by_label = closest(&rank_find(&query, &labels));

    let best = match (by_id, by_label) {
        (Some(id), Some(label)) if label.distance < id.distance => label,
        (Some(id), _) => id,
        (None, Some(label)) => label,
        (None, None) => return Err(NoMatchFound::new(name)),
    };
    Ok(Matched {
        item: &inputs[best.index],
        distance: best.distance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channels() -> Vec<Channel> {
        vec![Channel::new(5, "ESPN"), Channel::new(24, "NEWS24")]
    }

    #[test]
    fn should_match_spelled_number_through_digit_expansion() {
        let channels = channels();
        let matched = match_channel(&SetChannelDetail::fuzzy("twentyfour"), &channels).unwrap();
        assert_eq!(matched.item.number, 24);
        assert_eq!(matched.item.name, "NEWS24");
    }

    #[test]
    fn should_match_spoken_words_with_spaces() {
        let channels = channels();
        let matched =
            match_channel(&SetChannelDetail::fuzzy("news twenty four"), &channels).unwrap();
        assert_eq!(matched.item.number, 24);
        assert_eq!(matched.distance, 0);
    }

    #[test]
    fn should_match_exact_number() {
        let channels = channels();
        let matched = match_channel(&SetChannelDetail::exact_number(5), &channels).unwrap();
        assert_eq!(matched.item.name, "ESPN");
        assert_eq!(matched.distance, 0);
    }

    #[test]
    fn should_not_fall_back_to_fuzzy_when_exact_number_misses() {
        let channels = channels();
        let detail = SetChannelDetail {
            exact_channel_number: Some(7),
            fuzzy_channel_identifier: Some("espn".to_string()),
            ..SetChannelDetail::default()
        };
        assert_eq!(
            match_channel(&detail, &channels),
            Err(NoMatchFound::new("7"))
        );
    }

    #[test]
    fn should_fall_through_to_fuzzy_when_exact_fields_are_zero_or_blank() {
        let channels = channels();
        let detail = SetChannelDetail {
            exact_channel_number: Some(0),
            exact_channel_name: Some(String::new()),
            fuzzy_channel_identifier: Some("espn".to_string()),
        };
        let matched = match_channel(&detail, &channels).unwrap();
        assert_eq!(matched.item.number, 5);
    }

    #[test]
    fn should_match_exact_name_case_sensitively() {
        let channels = channels();
        assert!(match_channel(&SetChannelDetail::exact_name("ESPN"), &channels).is_ok());
        assert!(match_channel(&SetChannelDetail::exact_name("espn"), &channels).is_err());
    }

    #[test]
    fn should_use_numeric_identifier_as_channel_number() {
        let channels = channels();
        let matched = match_channel(&SetChannelDetail::fuzzy(" 24 "), &channels).unwrap();
        assert_eq!(matched.item.name, "NEWS24");
    }

    #[test]
    fn should_not_fuzzy_match_numeric_identifier_that_misses() {
        let channels = channels();
        assert!(match_channel(&SetChannelDetail::fuzzy("2"), &channels).is_err());
    }

    #[test]
    fn should_fail_on_empty_channel_list() {
        assert!(match_channel(&SetChannelDetail::fuzzy("espn"), &[]).is_err());
    }

    #[test]
    fn should_break_channel_ties_by_list_order() {
        let channels = vec![Channel::new(1, "BBC ONE"), Channel::new(2, "BBC TWO")];
        let matched = match_channel(&SetChannelDetail::fuzzy("bbc"), &channels).unwrap();
        assert_eq!(matched.item.number, 1);
    }

    #[test]
    fn should_attribute_shared_variant_to_first_channel() {
        let channels = vec![Channel::new(3, "ITV"), Channel::new(33, "ITV")];
        let matched = match_channel(&SetChannelDetail::fuzzy("itv"), &channels).unwrap();
        assert_eq!(matched.item.number, 3);
    }

    #[test]
    fn should_match_app_ignoring_case_and_spaces() {
        let apps = vec![App::new("youtube.leanback", "YouTube"), App::new("netflix", "Netflix")];
        let matched = match_app("net flix", &apps).unwrap();
        assert_eq!(matched.item.id, "netflix");
        assert_eq!(matched.distance, 0);
    }

    #[test]
    fn should_fail_app_match_on_empty_list() {
        assert_eq!(match_app("netflix", &[]), Err(NoMatchFound::new("netflix")));
    }

    #[test]
    fn should_match_input_by_label() {
        let inputs = vec![
            Input::new("HDMI_1", "Games Console"),
            Input::new("HDMI_2", "Blu-ray"),
        ];
        let matched = match_input("Games", &inputs).unwrap();
        assert_eq!(matched.item.id, "HDMI_1");
    }

    #[test]
    fn should_match_input_by_identifier() {
        let inputs = vec![
            Input::new("HDMI_1", "Games Console"),
            Input::new("HDMI_2", "Blu-ray"),
        ];
        let matched = match_input("HDMI_2", &inputs).unwrap();
        assert_eq!(matched.item.id, "HDMI_2");
        assert_eq!(matched.distance, 0);
    }

    #[test]
    fn should_pick_globally_closest_across_ids_and_labels() {
        let inputs = vec![Input::new("AV_LONG_NAME", "x"), Input::new("HDMI_3", "AV")];
        let matched = match_input("AV", &inputs).unwrap();
        assert_eq!(matched.item.id, "HDMI_3");
    }

    #[test]
    fn should_keep_input_identifiers_case_sensitive() {
        let inputs = vec![Input::new("HDMI_1", "Console")];
        assert!(match_input("hdmi", &inputs).is_err());
    }
}
