//! Textual configuration reading
//!
//! A configuration file is a sequence of directives. Each directive starts
//! on its own line with a keyword, followed by arguments on the same line
//! and optionally a `{ ... }` block:
//!
//! ```text
//! visitor_ip stdout
//! ```
//!
//! The host splits a file into per-directive [`Dispenser`]s and hands each one,
//! wrapped in a [`Helper`], to the parser registered for that keyword.

mod lexer;

pub use lexer::{tokenize, Token};

use crate::error::ConfigError;

/// Cursor over configuration tokens with positional error reporting
#[derive(Debug, Clone)]
pub struct Dispenser {
    file: String,
    tokens: Vec<Token>,
    cursor: Option<usize>,
}

impl Dispenser {
    /// Tokenize `input` read from `file`
    pub fn new(file: impl Into<String>, input: &str) -> Result<Self, ConfigError> {
        let file = file.into();
        let tokens = tokenize(&file, input)?;
        Ok(Self::from_tokens(file, tokens))
    }

    /// Build a dispenser over already-lexed tokens
    pub fn from_tokens(file: impl Into<String>, tokens: Vec<Token>) -> Self {
        Self {
            file: file.into(),
            tokens,
            cursor: None,
        }
    }

    /// Name of the file the tokens came from
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Advance to the next token, on any line
    pub fn next_token(&mut self) -> bool {
        let next = self.cursor.map_or(0, |c| c + 1);
        if next < self.tokens.len() {
            self.cursor = Some(next);
            true
        } else {
            false
        }
    }

    /// Advance to the next token only if it is on the current line
    pub fn next_arg(&mut self) -> bool {
        let Some(current) = self.cursor else {
            return false;
        };
        match self.tokens.get(current + 1) {
            Some(next) if next.line == self.tokens[current].line && next.text != "{" => {
                self.cursor = Some(current + 1);
                true
            }
            _ => false,
        }
    }

    /// Text of the current token, or `""` before the first `next_token()`
    pub fn val(&self) -> &str {
        self.current().map_or("", |t| t.text.as_str())
    }

    /// Line of the current token, or `0` before the first `next_token()`
    pub fn line(&self) -> usize {
        self.current().map_or(0, |t| t.line)
    }

    /// Load the following arguments on this line into `targets`
    ///
    /// Returns false without touching any target if there are fewer
    /// arguments than targets.
    pub fn args(&mut self, targets: &mut [&mut String]) -> bool {
        let saved = self.cursor;
        let mut values = Vec::with_capacity(targets.len());
        for _ in 0..targets.len() {
            if !self.next_arg() {
                self.cursor = saved;
                return false;
            }
            values.push(self.val().to_string());
        }
        for (target, value) in targets.iter_mut().zip(values) {
            **target = value;
        }
        true
    }

    /// Consume and return every remaining argument on this line
    pub fn remaining_args(&mut self) -> Vec<String> {
        let mut args = Vec::new();
        while self.next_arg() {
            args.push(self.val().to_string());
        }
        args
    }

    /// Move back to before the first token
    pub fn reset(&mut self) {
        self.cursor = None;
    }

    /// Argument-count error at the current position
    pub fn arg_err(&self) -> ConfigError {
        ConfigError::ArgCount {
            file: self.file.clone(),
            line: self.line(),
            token: self.val().to_string(),
        }
    }

    /// Generic parse error at the current position
    pub fn err(&self, message: impl Into<String>) -> ConfigError {
        ConfigError::Syntax {
            file: self.file.clone(),
            line: self.line(),
            message: message.into(),
        }
    }

    /// Split into one dispenser per top-level directive
    ///
    /// A directive starts at the first token of a line that is not inside a
    /// `{ ... }` block.
    pub fn segments(&self) -> Result<Vec<Dispenser>, ConfigError> {
        let mut segments: Vec<Vec<Token>> = Vec::new();
        let mut depth = 0usize;
        let mut last_line = 0;

        for token in &self.tokens {
            let starts_line = token.line != last_line;
            last_line = token.line;

            if depth == 0 && starts_line && token.text != "}" {
                segments.push(Vec::new());
            }

            match token.text.as_str() {
                "{" => depth += 1,
                "}" => {
                    depth = depth.checked_sub(1).ok_or_else(|| ConfigError::Syntax {
                        file: self.file.clone(),
                        line: token.line,
                        message: "unexpected '}'".to_string(),
                    })?;
                }
                _ => {}
            }

            if let Some(segment) = segments.last_mut() {
                segment.push(token.clone());
            }
        }

        if depth != 0 {
            return Err(ConfigError::Syntax {
                file: self.file.clone(),
                line: last_line,
                message: "unclosed '{' block".to_string(),
            });
        }

        Ok(segments
            .into_iter()
            .map(|tokens| Dispenser::from_tokens(self.file.clone(), tokens))
            .collect())
    }

    fn current(&self) -> Option<&Token> {
        self.cursor.and_then(|c| self.tokens.get(c))
    }
}

/// Parsing context handed to a directive's parser
///
/// Wraps the dispenser for a single directive occurrence.
#[derive(Debug)]
pub struct Helper {
    directive: String,
    dispenser: Dispenser,
}

impl Helper {
    /// Create a helper for one directive occurrence
    pub fn new(directive: impl Into<String>, dispenser: Dispenser) -> Self {
        Self {
            directive: directive.into(),
            dispenser,
        }
    }

    /// The directive keyword being parsed
    pub fn directive(&self) -> &str {
        &self.directive
    }

    /// The dispenser positioned before the directive keyword
    pub fn dispenser(&mut self) -> &mut Dispenser {
        &mut self.dispenser
    }

    /// Parse error at the dispenser's current position
    pub fn err(&self, message: impl Into<String>) -> ConfigError {
        self.dispenser.err(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_arg_stops_at_end_of_line() {
        let mut d = Dispenser::new("f", "visitor_ip stdout\nnext").unwrap();
        assert!(d.next_token());
        assert_eq!(d.val(), "visitor_ip");
        assert!(d.next_arg());
        assert_eq!(d.val(), "stdout");
        assert!(!d.next_arg());
        assert!(d.next_token());
        assert_eq!(d.val(), "next");
        assert_eq!(d.line(), 2);
    }

    #[test]
    fn args_leaves_targets_untouched_when_short() {
        let mut d = Dispenser::new("f", "visitor_ip").unwrap();
        d.next_token();
        let mut out = String::from("keep");
        assert!(!d.args(&mut [&mut out]));
        assert_eq!(out, "keep");
        assert_eq!(d.val(), "visitor_ip");
    }

    #[test]
    fn arg_err_points_at_current_token() {
        let mut d = Dispenser::new("Caddyfile", "\n\nvisitor_ip").unwrap();
        d.next_token();
        match d.arg_err() {
            ConfigError::ArgCount { file, line, token } => {
                assert_eq!(file, "Caddyfile");
                assert_eq!(line, 3);
                assert_eq!(token, "visitor_ip");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn segments_split_on_directive_lines_and_keep_blocks() {
        let input = "visitor_ip stdout\nroute {\n  visitor_ip stderr\n}\nvisitor_ip stderr\n";
        let d = Dispenser::new("f", input).unwrap();
        let segments = d.segments().unwrap();

        assert_eq!(segments.len(), 3);
        let mut block = segments[1].clone();
        assert!(block.next_token());
        assert_eq!(block.val(), "route");
        assert!(!block.next_arg());
        assert_eq!(block.remaining_args(), Vec::<String>::new());
    }

    #[test]
    fn unbalanced_braces_are_rejected() {
        let d = Dispenser::new("f", "route {\n").unwrap();
        assert!(matches!(d.segments(), Err(ConfigError::Syntax { .. })));

        let d = Dispenser::new("f", "}\n").unwrap();
        assert!(matches!(d.segments(), Err(ConfigError::Syntax { .. })));
    }

    #[test]
    fn helper_exposes_directive_and_dispenser() {
        let d = Dispenser::new("f", "visitor_ip stdout").unwrap();
        let mut h = Helper::new("visitor_ip", d);
        assert_eq!(h.directive(), "visitor_ip");
        assert!(h.dispenser().next_token());
        assert_eq!(h.dispenser().remaining_args(), vec!["stdout".to_string()]);
    }
}
