//! Text Clarity Normalizer
//!
//! Rewrites advisory text so a formant synthesizer pronounces it clearly.
//! Stages run in a fixed order:
//! 1. Standalone numerals become words
//! 2. Domain terms are re-spelled phonetically (case-insensitive, whole word)
//! 3. Punctuation becomes explicit pause markers, whitespace is collapsed

use std::borrow::Cow;

/// Exact numeral lookup (0-20 and multiples of ten)
const NUMBER_WORDS: &[(u32, &str)] = &[
    (0, "zero"),
    (1, "one"),
    (2, "two"),
    (3, "three"),
    (4, "four"),
    (5, "five"),
    (6, "six"),
    (7, "seven"),
    (8, "eight"),
    (9, "nine"),
    (10, "ten"),
    (11, "eleven"),
    (12, "twelve"),
    (13, "thirteen"),
    (14, "fourteen"),
    (15, "fifteen"),
    (16, "sixteen"),
    (17, "seventeen"),
    (18, "eighteen"),
    (19, "nineteen"),
    (20, "twenty"),
    (30, "thirty"),
    (40, "forty"),
    (50, "fifty"),
    (60, "sixty"),
    (70, "seventy"),
    (80, "eighty"),
    (90, "ninety"),
];

/// Phonetic re-spellings for units, directions and system vocabulary
const PHONETIC_RESPELLINGS: &[(&str, &str)] = &[
    ("centimeters", "sen-ti-mee-ters"),
    ("centimeter", "sen-ti-mee-ter"),
    ("cm", "sen-ti-mee-ters"),
    ("millimeters", "mil-li-mee-ters"),
    ("millimeter", "mil-li-mee-ter"),
    ("mm", "mil-li-mee-ters"),
    ("obstacle", "ob-sta-cul"),
    ("obstacles", "ob-sta-culs"),
    ("detection", "dee-tek-shun"),
    ("activated", "ak-ti-vay-ted"),
    ("enabled", "en-ay-buld"),
    ("disabled", "dis-ay-buld"),
    ("system", "sis-tem"),
    ("warning", "war-ning"),
    ("shutting", "shut-ting"),
    ("ahead", "ah-hed"),
    ("detected", "dee-tek-ted"),
    ("very", "vair-ee"),
    ("close", "klohz"),
    ("distance", "dis-tans"),
    ("eyeknow", "Eye-Know"),
    ("the", "thuh"),
];

const SHORT_PAUSE: &str = " .. ";
const LONG_PAUSE: &str = " ... ";

/// Spell out a whole number below one thousand.
///
/// Returns `None` for larger values, which are left as digits.
pub fn spell_number(n: u32) -> Option<String> {
    if let Some((_, word)) = NUMBER_WORDS.iter().find(|(value, _)| *value == n) {
        return Some((*word).to_string());
    }
    match n {
        21..=99 => {
            let tens = spell_number(n / 10 * 10)?;
            let ones = spell_number(n % 10)?;
            Some(format!("{} {}", tens, ones))
        }
        100..=999 => {
            let hundreds = format!("{} hundred", spell_number(n / 100)?);
            match n % 100 {
                0 => Some(hundreds),
                rest => Some(format!("{} {}", hundreds, spell_number(rest)?)),
            }
        }
        _ => None,
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Rewrite every maximal word token through `f`, leaving separators untouched
fn map_words<'a, F>(text: &'a str, mut f: F) -> String
where
    F: FnMut(&'a str) -> Option<Cow<'static, str>>,
{
    let mut out = String::with_capacity(text.len() + 16);
    let mut start: Option<usize> = None;

    let mut flush = |out: &mut String, token: &'a str| match f(token) {
        Some(replacement) => out.push_str(&replacement),
        None => out.push_str(token),
    };

    for (idx, c) in text.char_indices() {
        if is_word_char(c) {
            if start.is_none() {
                start = Some(idx);
            }
        } else {
            if let Some(s) = start.take() {
                flush(&mut out, &text[s..idx]);
            }
            out.push(c);
        }
    }
    if let Some(s) = start {
        flush(&mut out, &text[s..]);
    }
    out
}

/// Pronunciation-oriented text normalizer
#[derive(Debug, Clone)]
pub struct TextClarityNormalizer {
    respellings: &'static [(&'static str, &'static str)],
}

impl Default for TextClarityNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextClarityNormalizer {
    /// Normalizer with the built-in re-spelling dictionary
    pub fn new() -> Self {
        Self {
            respellings: PHONETIC_RESPELLINGS,
        }
    }

    /// Normalizer with a custom re-spelling dictionary (keys matched case-insensitively)
    pub fn with_respellings(respellings: &'static [(&'static str, &'static str)]) -> Self {
        Self { respellings }
    }

    /// Run the full pipeline. Total over any input, including empty text.
    pub fn normalize(&self, text: &str) -> String {
        let spelled = self.expand_numerals(text);
        let respelled = self.respell(&spelled);
        Self::insert_pauses(&respelled)
    }

    fn expand_numerals(&self, text: &str) -> String {
        map_words(text, |token| {
            if !token.chars().all(|c| c.is_ascii_digit()) || token.len() > 3 {
                return None;
            }
            token
                .parse::<u32>()
                .ok()
                .and_then(spell_number)
                .map(Cow::Owned)
        })
    }

    fn respell(&self, text: &str) -> String {
        let respellings = self.respellings;
        map_words(text, move |token| {
            respellings
                .iter()
                .find(|(word, _)| word.eq_ignore_ascii_case(token))
                .map(|(_, replacement)| Cow::Borrowed(*replacement))
        })
    }

    fn insert_pauses(text: &str) -> String {
        let mut paused = String::with_capacity(text.len() + 16);
        for c in text.chars() {
            match c {
                '!' | '.' => paused.push_str(LONG_PAUSE),
                ',' => paused.push_str(SHORT_PAUSE),
                _ => paused.push(c),
            }
        }
        paused.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}
