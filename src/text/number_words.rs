//! Spoken forms of digit strings, so "2014" can match "twenty fourteen" or
//! "two thousand and fourteen".

use std::collections::BTreeSet;

const ONES: [&str; 20] = [
    "", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen",
    "eighteen", "nineteen",
];

const TENS: [&str; 10] = [
    "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];

pub const MAX_SPOKEN_NUMBER: u32 = 999_999;

type Form = Vec<&'static str>;

fn two_digit(n: u32) -> Form {
    match n {
        0 => Vec::new(),
        1..=19 => vec![ONES[n as usize]],
        _ => {
            let tens = TENS[(n / 10) as usize];
            match n % 10 {
                0 => vec![tens],
                o => vec![tens, ONES[o as usize]],
            }
        }
    }
}

/// Forms of 1..=999 with an optional "and" after "hundred".
fn hundreds(n: u32) -> Vec<Form> {
    if n < 100 {
        return vec![two_digit(n)];
    }
    let head = ONES[(n / 100) as usize];
    let rest = two_digit(n % 100);
    if rest.is_empty() {
        return vec![vec![head, "hundred"]];
    }
    vec![
        [vec![head, "hundred"], rest.clone()].concat(),
        [vec![head, "hundred", "and"], rest].concat(),
    ]
}

/// Every spoken rendition of a non-negative integer string up to 999,999.
/// Non-digit or out-of-range input yields no forms.
pub fn number_to_word_forms(digits: &str) -> Vec<Vec<String>> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Vec::new();
    }
    let Ok(n) = digits.parse::<u32>() else {
        return Vec::new();
    };
    if n > MAX_SPOKEN_NUMBER {
        return Vec::new();
    }
    if n == 0 {
        return vec![vec!["zero".to_string()]];
    }

    // Insertion order is kept; the set only filters duplicates.
    let mut seen: BTreeSet<Form> = BTreeSet::new();
    let mut forms: Vec<Form> = Vec::new();
    let mut add = |form: Form| {
        if !form.is_empty() && seen.insert(form.clone()) {
            forms.push(form);
        }
    };

    if n < 1000 {
        for form in hundreds(n) {
            add(form);
        }
    } else {
        let thousands = n / 1000;
        let rem = n % 1000;
        for head in hundreds(thousands) {
            let mut base = head;
            base.push("thousand");
            if rem == 0 {
                add(base);
            } else if rem < 100 {
                let tail = two_digit(rem);
                add([base.clone(), tail.clone()].concat());
                add([base, vec!["and"], tail].concat());
            } else {
                for tail in hundreds(rem) {
                    add([base.clone(), tail].concat());
                }
            }
        }

        // Year style: 1900 "nineteen hundred", 2014 "twenty fourteen",
        // 2004 "twenty oh four".
        if n <= 9999 {
            let hi = n / 100;
            let lo = n % 100;
            if (10..=99).contains(&hi) {
                let hi_words = two_digit(hi);
                if lo == 0 {
                    add([hi_words, vec!["hundred"]].concat());
                } else {
                    add([hi_words.clone(), two_digit(lo)].concat());
                    if lo < 10 {
                        add([hi_words, vec!["oh", ONES[lo as usize]]].concat());
                    }
                }
            }
        }
    }

    forms
        .into_iter()
        .map(|form| form.into_iter().map(str::to_string).collect())
        .collect()
}

/// Spoken forms of a decimal like "3.25": "three point two five" and, for
/// multi-digit fractions, "three point twenty five".
pub fn decimal_to_word_forms(text: &str) -> Vec<Vec<String>> {
    let Some((left, right)) = text.split_once('.') else {
        return Vec::new();
    };
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(left) || !all_digits(right) {
        return Vec::new();
    }

    let left_forms = number_to_word_forms(left);
    if left_forms.is_empty() {
        return Vec::new();
    }

    let digit_by_digit: Vec<String> = right
        .bytes()
        .map(|b| match b - b'0' {
            0 => "zero".to_string(),
            d => ONES[d as usize].to_string(),
        })
        .collect();

    let whole_fraction = if right.len() > 1 && right.bytes().any(|b| b != b'0') {
        number_to_word_forms(right.trim_start_matches('0'))
    } else {
        Vec::new()
    };

    let mut forms: Vec<Vec<String>> = Vec::new();
    for left_form in &left_forms {
        let mut spoken = left_form.clone();
        spoken.push("point".to_string());
        let mut digits = spoken.clone();
        digits.extend(digit_by_digit.iter().cloned());
        if !forms.contains(&digits) {
            forms.push(digits);
        }
        for fraction in &whole_fraction {
            let mut form = spoken.clone();
            form.extend(fraction.iter().cloned());
            if !forms.contains(&form) {
                forms.push(form);
            }
        }
    }
    forms
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined(forms: &[Vec<String>]) -> Vec<String> {
        forms.iter().map(|f| f.join(" ")).collect()
    }

    #[test]
    fn small_numbers_have_single_form() {
        assert_eq!(joined(&number_to_word_forms("7")), vec!["seven"]);
        assert_eq!(joined(&number_to_word_forms("45")), vec!["forty five"]);
        assert_eq!(joined(&number_to_word_forms("0")), vec!["zero"]);
    }

    #[test]
    fn hundreds_with_and_without_and() {
        let forms = joined(&number_to_word_forms("365"));
        assert_eq!(
            forms,
            vec!["three hundred sixty five", "three hundred and sixty five"]
        );
        assert_eq!(joined(&number_to_word_forms("500")), vec!["five hundred"]);
    }

    #[test]
    fn years_have_both_readings() {
        let forms = joined(&number_to_word_forms("2014"));
        assert!(forms.contains(&"twenty fourteen".to_string()));
        assert!(forms.contains(&"two thousand fourteen".to_string()));
        assert!(forms.contains(&"two thousand and fourteen".to_string()));

        let forms = joined(&number_to_word_forms("2004"));
        assert!(forms.contains(&"twenty oh four".to_string()));

        let forms = joined(&number_to_word_forms("1900"));
        assert!(forms.contains(&"nineteen hundred".to_string()));
        assert!(forms.contains(&"one thousand nine hundred".to_string()));
    }

    #[test]
    fn large_numbers() {
        let forms = joined(&number_to_word_forms("58000"));
        assert_eq!(forms, vec!["fifty eight thousand"]);
        let forms = joined(&number_to_word_forms("153250"));
        assert!(forms.contains(&"one hundred fifty three thousand two hundred fifty".to_string()));
        assert!(forms.contains(
            &"one hundred and fifty three thousand two hundred and fifty".to_string()
        ));
    }

    #[test]
    fn rejects_non_digits_and_out_of_range() {
        assert!(number_to_word_forms("12a").is_empty());
        assert!(number_to_word_forms("").is_empty());
        assert!(number_to_word_forms("1000000").is_empty());
    }

    #[test]
    fn decimals_read_digit_by_digit_and_whole() {
        assert_eq!(
            joined(&decimal_to_word_forms("3.3")),
            vec!["three point three"]
        );
        let forms = joined(&decimal_to_word_forms("3.25"));
        assert_eq!(
            forms,
            vec!["three point two five", "three point twenty five"]
        );
        assert_eq!(joined(&decimal_to_word_forms("0.5")), vec!["zero point five"]);
        assert!(decimal_to_word_forms("3.").is_empty());
        assert!(decimal_to_word_forms("35").is_empty());
    }
}
