//! Tokenizer for SCIM path and filter syntax.
//!
//! Splits an input string into the token stream the compiler consumes.
//! Attribute names absorb dots, colons, `$` and dashes so URN-qualified
//! paths (`urn:…:2.0:User:manager.displayName`) arrive as single tokens;
//! the compiler splits them into steps.

use crate::error::{ScimError, ScimResult};

/// One lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Attribute path or operator word; splitting happens in the compiler
    Word(String),
    /// Double-quoted string literal, unescaped
    Str(String),
    /// Numeric literal, sign included
    Number(String),
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `.` between a `]` and the following sub-path
    Dot,
}

/// Tokenize `input`, failing with the supplied error constructor on bad
/// lexical structure (`invalidPath` for paths, `invalidFilter` for filters).
pub fn tokenize(input: &str, err: fn(String) -> ScimError) -> ScimResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();
    while let Some(&(start, ch)) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '[' => {
                chars.next();
                tokens.push(Token::LBracket);
            }
            ']' => {
                chars.next();
                tokens.push(Token::RBracket);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '.' => {
                chars.next();
                tokens.push(Token::Dot);
            }
            '"' => {
                chars.next();
                tokens.push(Token::Str(lex_string(input, start, &mut chars, err)?));
            }
            c if c.is_ascii_digit() || c == '-' || c == '+' => {
                let mut end = start;
                while let Some(&(idx, c)) = chars.peek() {
                    if c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E') {
                        end = idx + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Number(input[start..end].to_string()));
            }
            c if c.is_alphabetic() || c == '$' || c == '_' => {
                let mut end = start;
                while let Some(&(idx, c)) = chars.peek() {
                    if c.is_alphanumeric() || matches!(c, '.' | ':' | '$' | '_' | '-') {
                        end = idx + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Word(input[start..end].to_string()));
            }
            other => {
                return Err(err(format!("unexpected character '{other}'")));
            }
        }
    }
    Ok(tokens)
}

fn lex_string(
    input: &str,
    start: usize,
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    err: fn(String) -> ScimError,
) -> ScimResult<String> {
    let mut out = String::new();
    loop {
        let Some((_, ch)) = chars.next() else {
            return Err(err(format!(
                "unterminated string starting at offset {start} in '{input}'"
            )));
        };
        match ch {
            '"' => return Ok(out),
            '\\' => {
                let Some((_, escaped)) = chars.next() else {
                    return Err(err("dangling escape in string literal".to_string()));
                };
                match escaped {
                    '"' => out.push('"'),
                    '\\' => out.push('\\'),
                    '/' => out.push('/'),
                    'n' => out.push('\n'),
                    'r' => out.push('\r'),
                    't' => out.push('\t'),
                    'b' => out.push('\u{0008}'),
                    'f' => out.push('\u{000C}'),
                    other => {
                        return Err(err(format!("unsupported escape '\\{other}'")));
                    }
                }
            }
            other => out.push(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScimError;

    #[test]
    fn tokenizes_filter_with_path_and_literal() {
        let tokens = tokenize(r#"emails[type eq "work"].value"#, ScimError::invalid_path).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Word("emails".into()),
                Token::LBracket,
                Token::Word("type".into()),
                Token::Word("eq".into()),
                Token::Str("work".into()),
                Token::RBracket,
                Token::Dot,
                Token::Word("value".into()),
            ]
        );
    }

    #[test]
    fn urn_qualified_path_is_one_word() {
        let tokens = tokenize(
            "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User:manager.displayName",
            ScimError::invalid_path,
        )
        .unwrap();
        assert_eq!(tokens.len(), 1);
    }

    #[test]
    fn escaped_quotes_unescape() {
        let tokens = tokenize(r#"name eq "a \"b\"""#, ScimError::invalid_filter).unwrap();
        assert_eq!(tokens[2], Token::Str(r#"a "b""#.into()));
    }

    #[test]
    fn rejects_stray_characters() {
        assert!(tokenize("userName eq #", ScimError::invalid_filter).is_err());
    }
}
