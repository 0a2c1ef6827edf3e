//! Text normalization into a form the Silero Russian models can pronounce.
//!
//! Substitutions run in a fixed order: later rules see the output of earlier ones.

use super::numbers::{MAX_DIGITS, spell_number};
use once_cell::sync::Lazy;
use regex::Regex;

/// Plain substitutions for characters the model does not handle.
const CHAR_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("\u{2026}", "..."), // Ellipsis
    ("*", " звёздочка "),
];

static DECIMAL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]+)[.,]([0-9]+)").expect("valid decimal regex"));

static BC_ERA_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"д\.\s*н\.\s*э\.").expect("valid era regex"));

static AD_ERA_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"н\.\s*э\.").expect("valid era regex"));

static DIGITS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]+").expect("valid digits regex"));

/// Rewrite a single line into its synthesizer-safe form.
///
/// Never fails: text that matches no rule is returned untouched.
pub fn normalize(line: &str) -> String {
    let mut line = line.to_string();

    for (from, to) in CHAR_SUBSTITUTIONS {
        line = line.replace(from, to);
    }

    // "2.75" would otherwise be read as a single number
    line = DECIMAL_PATTERN
        .replace_all(&line, "${1} и ${2}")
        .into_owned();
    line = line.replace('%', " процентов ");

    line = line.replace(" г.", " году");
    line = line.replace(" гг.", " годах");
    line = BC_ERA_PATTERN
        .replace_all(&line, " до нашей эры")
        .into_owned();
    line = AD_ERA_PATTERN.replace_all(&line, " нашей эры").into_owned();

    spell_digits(&line)
}

/// Replace every digit run with its spelled-out form.
///
/// Runs are substituted longest first so that "1 11" becomes "один одиннадцать"
/// rather than "один один один". Only the first [`MAX_DIGITS`] digits of a run
/// are spelled; the rest of an over-long run is dropped.
pub fn spell_digits(line: &str) -> String {
    let mut runs: Vec<&str> = DIGITS_PATTERN.find_iter(line).map(|m| m.as_str()).collect();
    runs.sort_by(|a, b| b.len().cmp(&a.len()));

    let mut result = line.to_string();
    for run in runs {
        let capped = &run[..run.len().min(MAX_DIGITS)];
        let Some(words) = capped.parse::<u64>().ok().and_then(spell_number) else {
            continue;
        };
        result = result.replace(run, &words);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ellipsis_and_asterisk() {
        assert_eq!(normalize("Ну\u{2026} да"), "Ну... да");
        assert_eq!(normalize("a*b"), "a звёздочка b");
    }

    #[test]
    fn test_longest_run_first() {
        assert_eq!(spell_digits("1 11"), "один одиннадцать");
        assert_eq!(spell_digits("11 1"), "одиннадцать один");
    }

    #[test]
    fn test_hundred() {
        assert_eq!(normalize("100"), "сто");
    }

    #[test]
    fn test_decimal_percent() {
        assert_eq!(normalize("2.75%"), "два и семьдесят пять процентов ");
        assert_eq!(normalize("3,5"), "три и пять");
    }

    #[test]
    fn test_year_abbreviations() {
        assert_eq!(normalize("в 1812 г."), "в одна тысяча восемьсот двенадцать году");
        assert_eq!(normalize("в 90 гг."), "в девяносто годах");
    }

    #[test]
    fn test_era_abbreviations() {
        assert_eq!(normalize("500 г. д. н. э."), "пятьсот году  до нашей эры");
        assert_eq!(normalize("300 н.э."), "триста  нашей эры");
    }

    #[test]
    fn test_sentence_with_numbers_and_year() {
        let out = normalize("Temperature was 2.75% higher in 1999 г.");
        assert_eq!(
            out,
            "Temperature was два и семьдесят пять процентов  higher in \
             одна тысяча девятьсот девяносто девять году"
        );
    }

    #[test]
    fn test_long_digit_runs_are_capped() {
        // 13 digits: the last one is dropped
        assert_eq!(
            spell_digits("1000000000005"),
            spell_number(100_000_000_000).unwrap()
        );
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(normalize("Привет, мир!"), "Привет, мир!");
        assert_eq!(normalize(""), "");
    }
}
