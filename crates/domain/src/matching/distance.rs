//! Fuzzy scorer: subsequence containment plus Levenshtein distance.

/// A candidate that contains the query, with its edit distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rank<'a> {
    pub target: &'a str,
    /// Position of the candidate in the input list.
    pub index: usize,
    pub distance: usize,
}

/// Score `target` against `query`.
///
/// Returns `None` unless every character of `query` appears in `target` in
/// order; otherwise the Levenshtein distance between the two.
#[must_use]
pub fn distance(query: &str, target: &str) -> Option<usize> {
    if !is_subsequence(query, target) {
        return None;
    }
    Some(levenshtein(query, target))
}

/// Rank every candidate containing `query`, preserving input order.
pub fn rank_find<'a, S: AsRef<str>>(query: &str, candidates: &'a [S]) -> Vec<Rank<'a>> {
    candidates
        .iter()
        .enumerate()
        .filter_map(|(index, candidate)| {
            let target = candidate.as_ref();
            distance(query, target).map(|distance| Rank {
                target,
                index,
                distance,
            })
        })
        .collect()
}

/// The lowest-distance rank; the earliest one wins ties.
#[must_use]
pub fn closest<'a>(ranks: &[Rank<'a>]) -> Option<Rank<'a>> {
    ranks.iter().fold(None, |best: Option<Rank<'a>>, rank| match best {
        Some(b) if b.distance <= rank.distance => Some(b),
        _ => Some(*rank),
    })
}

fn is_subsequence(query: &str, target: &str) -> bool {
    let mut remaining = target.chars();
    query.chars().all(|q| remaining.any(|t| t == q))
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != *cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_compute_edit_distance_for_contained_query() {
        assert_eq!(distance("CAR", "CARTOON"), Some(4));
        assert_eq!(distance("NEWS", "NEWS"), Some(0));
    }

    #[test]
    fn should_not_rank_candidate_missing_query_characters() {
        assert_eq!(distance("TWENTYFOUR", "ESPN"), None);
        assert_eq!(distance("BA", "AB"), None);
    }

    #[test]
    fn should_rank_empty_query_against_everything() {
        assert_eq!(distance("", "ABC"), Some(3));
    }

    #[test]
    fn should_handle_multibyte_characters() {
        assert_eq!(distance("ÉTÉ", "ÉTÉS"), Some(1));
    }

    #[test]
    fn should_keep_input_order_in_ranks() {
        let candidates = ["NETFLIX", "YOUTUBE", "NETFLIXKIDS"];
        let ranks = rank_find("NETFLIX", &candidates);
        let indexes: Vec<usize> = ranks.iter().map(|r| r.index).collect();
        assert_eq!(indexes, vec![0, 2]);
    }

    #[test]
    fn should_prefer_first_candidate_on_tie() {
        let candidates = ["ABX", "ABY"];
        let ranks = rank_find("AB", &candidates);
        assert_eq!(closest(&ranks).unwrap().target, "ABX");
    }

    #[test]
    fn should_return_none_for_no_ranks() {
        assert!(closest(&[]).is_none());
    }
}
