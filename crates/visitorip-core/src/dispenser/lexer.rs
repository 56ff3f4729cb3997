//! Tokenizer for the textual configuration format
//!
//! Tokens are separated by whitespace. A `#` that starts a token comments
//! out the rest of the line. Double quotes group whitespace into a single
//! token and accept `\"` as an escaped quote.

use crate::error::ConfigError;

/// A single configuration token and the line it started on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub line: usize,
}

/// Split `input` into tokens
pub fn tokenize(file: &str, input: &str) -> Result<Vec<Token>, ConfigError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    let mut line = 1;

    while let Some(&c) = chars.peek() {
        if c == '\n' {
            line += 1;
            chars.next();
            continue;
        }
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '#' {
            while let Some(&c) = chars.peek() {
                if c == '\n' {
                    break;
                }
                chars.next();
            }
            continue;
        }

        let start_line = line;
        let mut text = String::new();

        if c == '"' {
            chars.next();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '\\' if chars.peek() == Some(&'"') => {
                        chars.next();
                        text.push('"');
                    }
                    '"' => {
                        closed = true;
                        break;
                    }
                    '\n' => {
                        line += 1;
                        text.push(c);
                    }
                    _ => text.push(c),
                }
            }
            if !closed {
                return Err(ConfigError::Syntax {
                    file: file.to_string(),
                    line: start_line,
                    message: "unterminated quoted token".to_string(),
                });
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                text.push(c);
                chars.next();
            }
        }

        tokens.push(Token {
            text,
            line: start_line,
        });
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<(&str, usize)> {
        tokens.iter().map(|t| (t.text.as_str(), t.line)).collect()
    }

    #[test]
    fn splits_on_whitespace_and_tracks_lines() {
        let tokens = tokenize("f", "visitor_ip stdout\n\n  visitor_ip\tstderr\n").unwrap();
        assert_eq!(
            texts(&tokens),
            vec![
                ("visitor_ip", 1),
                ("stdout", 1),
                ("visitor_ip", 3),
                ("stderr", 3)
            ]
        );
    }

    #[test]
    fn comments_run_to_end_of_line() {
        let tokens = tokenize("f", "# header\nvisitor_ip stdout # trailing\n").unwrap();
        assert_eq!(texts(&tokens), vec![("visitor_ip", 2), ("stdout", 2)]);
    }

    #[test]
    fn quoted_tokens_keep_spaces_and_escapes() {
        let tokens = tokenize("f", r#"respond "hello \"there\" world""#).unwrap();
        assert_eq!(tokens[1].text, r#"hello "there" world"#);
    }

    #[test]
    fn unterminated_quote_is_a_syntax_error() {
        let err = tokenize("Caddyfile", "visitor_ip \"stdout").unwrap_err();
        assert!(matches!(err, ConfigError::Syntax { line: 1, .. }));
    }
}
