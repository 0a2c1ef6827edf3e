//! Russian cardinal numbers spelled out as words.
//!
//! Supports values below 10^12 (up to "девятьсот девяносто девять миллиардов ...").

/// Longest digit run that can be spelled.
pub const MAX_DIGITS: usize = 12;

const ZERO: &str = "ноль";

const UNITS_MASCULINE: [&str; 10] = [
    "", "один", "два", "три", "четыре", "пять", "шесть", "семь", "восемь", "девять",
];

const UNITS_FEMININE: [&str; 10] = [
    "", "одна", "две", "три", "четыре", "пять", "шесть", "семь", "восемь", "девять",
];

const TEENS: [&str; 10] = [
    "десять",
    "одиннадцать",
    "двенадцать",
    "тринадцать",
    "четырнадцать",
    "пятнадцать",
    "шестнадцать",
    "семнадцать",
    "восемнадцать",
    "девятнадцать",
];

const TENS: [&str; 10] = [
    "",
    "",
    "двадцать",
    "тридцать",
    "сорок",
    "пятьдесят",
    "шестьдесят",
    "семьдесят",
    "восемьдесят",
    "девяносто",
];

const HUNDREDS: [&str; 10] = [
    "",
    "сто",
    "двести",
    "триста",
    "четыреста",
    "пятьсот",
    "шестьсот",
    "семьсот",
    "восемьсот",
    "девятьсот",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gender {
    Masculine,
    Feminine,
}

/// Grammatical number of the noun following a count: один / два-четыре / пять+.
#[derive(Debug, Clone, Copy)]
enum Plural {
    One,
    Few,
    Many,
}

/// Order names (singular, few, many) and the gender they agree with.
const ORDERS: [([&str; 3], Gender); 4] = [
    (["", "", ""], Gender::Masculine),
    (["тысяча", "тысячи", "тысяч"], Gender::Feminine),
    (["миллион", "миллиона", "миллионов"], Gender::Masculine),
    (["миллиард", "миллиарда", "миллиардов"], Gender::Masculine),
];

/// Spell a group of three digits (0..=999), most significant word first.
fn spell_triple(n: u64, gender: Gender) -> (Plural, Vec<&'static str>) {
    let mut words = Vec::with_capacity(3);
    let hundreds = (n / 100) as usize;
    let rest = (n % 100) as usize;

    if hundreds > 0 {
        words.push(HUNDREDS[hundreds]);
    }

    if (10..=19).contains(&rest) {
        words.push(TEENS[rest - 10]);
        return (Plural::Many, words);
    }

    let tens = rest / 10;
    let ones = rest % 10;
    if tens >= 2 {
        words.push(TENS[tens]);
    }

    let plural = match ones {
        0 => Plural::Many,
        1 => Plural::One,
        2..=4 => Plural::Few,
        _ => Plural::Many,
    };
    if ones > 0 {
        let units = match gender {
            Gender::Masculine => &UNITS_MASCULINE,
            Gender::Feminine => &UNITS_FEMININE,
        };
        words.push(units[ones]);
    }

    (plural, words)
}

/// Spell `n` as Russian words, or `None` when it has more than [`MAX_DIGITS`] digits.
pub fn spell_number(n: u64) -> Option<String> {
    if n == 0 {
        return Some(ZERO.to_string());
    }

    let mut groups: Vec<Vec<&'static str>> = Vec::new();
    let mut rest = n;
    let mut order = 0;

    while rest > 0 {
        let (names, gender) = ORDERS.get(order)?;
        let (plural, mut words) = spell_triple(rest % 1000, *gender);
        if !words.is_empty() {
            let name = match plural {
                Plural::One => names[0],
                Plural::Few => names[1],
                Plural::Many => names[2],
            };
            if !name.is_empty() {
                words.push(name);
            }
            groups.push(words);
        }
        rest /= 1000;
        order += 1;
    }

    let words: Vec<&str> = groups.into_iter().rev().flatten().collect();
    Some(words.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spell(n: u64) -> String {
        spell_number(n).unwrap()
    }

    #[test]
    fn test_small_numbers() {
        assert_eq!(spell(0), "ноль");
        assert_eq!(spell(1), "один");
        assert_eq!(spell(2), "два");
        assert_eq!(spell(11), "одиннадцать");
        assert_eq!(spell(40), "сорок");
        assert_eq!(spell(75), "семьдесят пять");
    }

    #[test]
    fn test_hundreds() {
        assert_eq!(spell(100), "сто");
        assert_eq!(spell(215), "двести пятнадцать");
        assert_eq!(spell(909), "девятьсот девять");
    }

    #[test]
    fn test_thousands_agree_in_gender() {
        assert_eq!(spell(1000), "одна тысяча");
        assert_eq!(spell(2000), "две тысячи");
        assert_eq!(spell(5000), "пять тысяч");
        assert_eq!(spell(21_000), "двадцать одна тысяча");
        assert_eq!(spell(1999), "одна тысяча девятьсот девяносто девять");
    }

    #[test]
    fn test_millions_and_billions() {
        assert_eq!(spell(1_000_001), "один миллион один");
        assert_eq!(spell(3_000_000), "три миллиона");
        assert_eq!(spell(5_000_000), "пять миллионов");
        assert_eq!(spell(1_000_000_000), "один миллиард");
        assert_eq!(spell(12_000_000_000), "двенадцать миллиардов");
    }

    #[test]
    fn test_skips_empty_groups() {
        assert_eq!(spell(2_000_000_003), "два миллиарда три");
    }

    #[test]
    fn test_twelve_digit_maximum() {
        assert_eq!(
            spell(999_999_999_999),
            "девятьсот девяносто девять миллиардов \
             девятьсот девяносто девять миллионов \
             девятьсот девяносто девять тысяч \
             девятьсот девяносто девять"
        );
        assert!(spell_number(1_000_000_000_000).is_none());
    }
}
