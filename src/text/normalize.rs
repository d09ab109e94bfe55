use serde::Serialize;

/// Filler sounds that never count as reading attempts.
pub const FILLERS: [&str; 7] = ["um", "uh", "uh-huh", "mm", "hmm", "er", "ah"];

/// Punctuation class trailing a source word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Punctuation {
    /// `.`, `!` or `?`
    Period,
    /// `,`, `;` or `:`
    Comma,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub punctuation: Option<Punctuation>,
}

impl Token {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            punctuation: None,
        }
    }
}

pub fn is_filler(word: &str) -> bool {
    let lower = word.trim().to_lowercase();
    let stripped = strip_edges(&lower);
    FILLERS.contains(&stripped)
}

/// Tokenizes passage or transcript text into comparable lowercase word forms.
pub fn normalize(text: &str) -> Vec<Token> {
    let rejoined = rejoin_line_break_hyphens(text);
    let lowered = rejoined.to_lowercase();

    let mut cleaned: Vec<Token> = Vec::new();
    for raw in lowered.split_whitespace() {
        let punctuation = trailing_punctuation(raw);
        let stripped = strip_internal_periods(strip_edges(raw));
        if stripped.is_empty() {
            // Stray punctuation still closes the previous word.
            if let (Some(p), Some(last)) = (punctuation, cleaned.last_mut()) {
                last.punctuation = Some(stronger(last.punctuation, p));
            }
            continue;
        }
        cleaned.push(Token {
            text: stripped,
            punctuation,
        });
    }

    let mut merged: Vec<Token> = Vec::with_capacity(cleaned.len());
    let mut iter = cleaned.into_iter().peekable();
    while let Some(token) = iter.next() {
        if token.text.ends_with('-') && token.text.len() > 1 {
            if let Some(next) = iter.next() {
                let stem = token.text.trim_end_matches('-');
                merged.push(Token {
                    text: format!("{stem}{}", next.text),
                    punctuation: next.punctuation,
                });
                continue;
            }
        }
        merged.push(token);
    }

    let mut result = Vec::with_capacity(merged.len());
    for token in merged {
        if !token.text.contains('-') {
            result.push(token);
            continue;
        }
        let parts: Vec<&str> = token.text.split('-').filter(|p| !p.is_empty()).collect();
        if parts.is_empty() {
            continue;
        }
        if parts.len() == 2 && parts[0].chars().count() == 1 {
            result.push(Token {
                text: format!("{}{}", parts[0], parts[1]),
                punctuation: token.punctuation,
            });
            continue;
        }
        let last = parts.len() - 1;
        for (idx, part) in parts.into_iter().enumerate() {
            let mut piece = Token::plain(part);
            if idx == last {
                piece.punctuation = token.punctuation;
            }
            result.push(piece);
        }
    }
    result
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn strip_edges(raw: &str) -> &str {
    raw.trim_matches(|c: char| !(is_word_char(c) || c == '\'' || c == '-'))
        .trim_matches('\'')
}

fn strip_internal_periods(word: &str) -> String {
    if !word.contains('.') {
        return word.to_string();
    }
    let chars: Vec<char> = word.chars().collect();
    let mut out = String::with_capacity(word.len());
    for (idx, &c) in chars.iter().enumerate() {
        if c == '.' {
            let before = idx.checked_sub(1).and_then(|i| chars.get(i));
            let after = chars.get(idx + 1);
            let between_digits = matches!((before, after), (Some(b), Some(a)) if b.is_ascii_digit() && a.is_ascii_digit());
            if !between_digits {
                continue;
            }
        }
        out.push(c);
    }
    out
}

fn trailing_punctuation(raw: &str) -> Option<Punctuation> {
    let mut found = None;
    for c in raw.chars().rev() {
        if is_word_char(c) {
            break;
        }
        match c {
            '.' | '!' | '?' => return Some(Punctuation::Period),
            ',' | ';' | ':' => found = Some(Punctuation::Comma),
            _ => {}
        }
    }
    found
}

fn stronger(current: Option<Punctuation>, incoming: Punctuation) -> Punctuation {
    match (current, incoming) {
        (Some(Punctuation::Period), _) | (_, Punctuation::Period) => Punctuation::Period,
        _ => Punctuation::Comma,
    }
}

fn rejoin_line_break_hyphens(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '-' {
            let mut j = i + 1;
            while j < chars.len() && chars[j].is_whitespace() && chars[j] != '\n' {
                j += 1;
            }
            if j < chars.len() && chars[j] == '\n' {
                j += 1;
                while j < chars.len() && chars[j].is_whitespace() {
                    j += 1;
                }
                i = j;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn lowercases_and_strips_edge_punctuation() {
        let tokens = normalize("The DOG, \"ran\" home!");
        assert_eq!(texts(&tokens), vec!["the", "dog", "ran", "home"]);
        assert_eq!(tokens[1].punctuation, Some(Punctuation::Comma));
        assert_eq!(tokens[3].punctuation, Some(Punctuation::Period));
        assert_eq!(tokens[0].punctuation, None);
    }

    #[test]
    fn closing_quote_does_not_hide_sentence_end() {
        let tokens = normalize("he said \"stop.\"");
        assert_eq!(tokens[2].text, "stop");
        assert_eq!(tokens[2].punctuation, Some(Punctuation::Period));
    }

    #[test]
    fn keeps_internal_apostrophes_but_strips_quotes() {
        let tokens = normalize("'you'll' can't");
        assert_eq!(texts(&tokens), vec!["you'll", "can't"]);
    }

    #[test]
    fn removes_internal_periods_except_decimals() {
        let tokens = normalize("e.g. U.S. 3.5 miles");
        assert_eq!(texts(&tokens), vec!["eg", "us", "3.5", "miles"]);
    }

    #[test]
    fn rejoins_line_break_hyphens() {
        let tokens = normalize("spread-\n  sheet works");
        assert_eq!(texts(&tokens), vec!["spreadsheet", "works"]);
    }

    #[test]
    fn merges_dangling_hyphen_with_next_token() {
        let tokens = normalize("spread- sheet");
        assert_eq!(texts(&tokens), vec!["spreadsheet"]);
    }

    #[test]
    fn splits_internal_hyphens_except_single_letter_prefix() {
        let tokens = normalize("soft-on-skin e-mail well-known.");
        assert_eq!(
            texts(&tokens),
            vec!["soft", "on", "skin", "email", "well", "known"]
        );
        assert_eq!(tokens[5].punctuation, Some(Punctuation::Period));
    }

    #[test]
    fn empty_and_punctuation_only_input() {
        assert!(normalize("").is_empty());
        assert!(normalize("  ... -- ").is_empty());
    }

    #[test]
    fn detached_punctuation_marks_previous_word() {
        let tokens = normalize("wait , then go .");
        assert_eq!(texts(&tokens), vec!["wait", "then", "go"]);
        assert_eq!(tokens[0].punctuation, Some(Punctuation::Comma));
        assert_eq!(tokens[2].punctuation, Some(Punctuation::Period));
    }

    #[test]
    fn filler_detection_ignores_case_and_punctuation() {
        assert!(is_filler("Um,"));
        assert!(is_filler("uh-huh"));
        assert!(!is_filler("umbrella"));
    }
}
