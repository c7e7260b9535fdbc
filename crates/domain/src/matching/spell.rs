//! Spelled-out English numbers and digit-run expansion of names.

const ONES: [&str; 20] = [
    "zero",
    "one",
    "two",
    "three",
    "four",
    "five",
    "six",
    "seven",
    "eight",
    "nine",
    "ten",
    "eleven",
    "twelve",
    "thirteen",
    "fourteen",
    "fifteen",
    "sixteen",
    "seventeen",
    "eighteen",
    "nineteen",
];

const TENS: [&str; 10] = [
    "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];

const SCALES: [(u64, &str); 6] = [
    (1_000_000_000_000_000_000, "quintillion"),
    (1_000_000_000_000_000, "quadrillion"),
    (1_000_000_000_000, "trillion"),
    (1_000_000_000, "billion"),
    (1_000_000, "million"),
    (1_000, "thousand"),
];

/// Spell `n` in English words separated by single spaces (`24` → `"twenty four"`).
#[must_use]
pub fn spell_number(n: u64) -> String {
    if n == 0 {
        return ONES[0].to_string();
    }
    let mut words = Vec::new();
    let mut rest = n;
    for (scale, name) in SCALES {
        if rest >= scale {
            push_below_thousand(rest / scale, &mut words);
            words.push(name);
            rest %= scale;
        }
    }
    if rest > 0 {
        push_below_thousand(rest, &mut words);
    }
    words.join(" ")
}

#[allow(clippy::cast_possible_truncation)]
fn push_below_thousand(n: u64, words: &mut Vec<&'static str>) {
    // n < 1000, so every index below fits in usize.
    let hundreds = (n / 100) as usize;
    let rest = (n % 100) as usize;
    if hundreds > 0 {
        words.push(ONES[hundreds]);
        words.push("hundred");
    }
    if rest >= 20 {
        words.push(TENS[rest / 10]);
        if rest % 10 > 0 {
            words.push(ONES[rest % 10]);
        }
    } else if rest > 0 {
        words.push(ONES[rest]);
    }
}

/// Alternate spellings of an already-normalized name.
///
/// The name itself comes first, then one variant per maximal run of ASCII
/// digits with only that run spelled out, then (when there are several runs)
/// a variant with every run spelled out. Spelled words are upper-cased and
/// joined without separators. Runs too long for a `u64` are left as digits.
#[must_use]
pub fn expand_digits(name: &str) -> Vec<String> {
    let runs = digit_runs(name);
    let mut variants = vec![name.to_string()];

    let spelled: Vec<Option<String>> = runs
        .iter()
        .map(|&(start, end)| {
            name[start..end]
                .parse::<u64>()
                .ok()
                .map(|n| spell_number(n).replace(' ', "").to_uppercase())
        })
        .collect();

    for (i, &(start, end)) in runs.iter().enumerate() {
        if let Some(word) = &spelled[i] {
            variants.push(format!("{}{word}{}", &name[..start], &name[end..]));
        }
    }

    if runs.len() > 1 && spelled.iter().any(Option::is_some) {
        let mut all = String::with_capacity(name.len() * 2);
        let mut cursor = 0;
        for (i, &(start, end)) in runs.iter().enumerate() {
            all.push_str(&name[cursor..start]);
            match &spelled[i] {
                Some(word) => all.push_str(word),
                None => all.push_str(&name[start..end]),
            }
            cursor = end;
        }
        all.push_str(&name[cursor..]);
        variants.push(all);
    }

    variants
}

/// Byte ranges of maximal ASCII digit runs.
fn digit_runs(text: &str) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        match (c.is_ascii_digit(), start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                runs.push((s, i));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push((s, text.len()));
    }
    runs
}
