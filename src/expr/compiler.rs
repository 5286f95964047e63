//! Recursive-descent compiler for SCIM paths and filters.
//!
//! Grammar precedence is `not` over `and` over `or`, with parentheses
//! overriding. A filter step may appear inside a path; a filter's own
//! left-hand paths may not carry further filter steps.
//!
//! URN-qualified words (`urn:…:User:manager.displayName`) compile as one
//! opaque step; the property layer expands them against the schema, because
//! only the schema knows where the URN ends and the sub-path begins.

use super::token::{Token, tokenize};
use super::{CompareOp, FilterExpr, Literal, Path, Step};
use crate::error::{ScimError, ScimResult};
use std::sync::Arc;

/// Compile a SCIM path (`emails[type eq "work"].value`).
pub fn compile_path(source: &str) -> ScimResult<Path> {
    let tokens = tokenize(source, ScimError::invalid_path)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let path = parser.parse_path(ScimError::invalid_path)?;
    if !parser.at_end() {
        return Err(ScimError::invalid_path(format!(
            "trailing input after path in '{source}'"
        )));
    }
    if path.is_empty() {
        return Err(ScimError::invalid_path("empty path"));
    }
    Ok(path)
}

/// Compile a SCIM filter (`userName eq "u" and not (active eq false)`).
pub fn compile_filter(source: &str) -> ScimResult<FilterExpr> {
    let tokens = tokenize(source, ScimError::invalid_filter)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let filter = parser.parse_or()?;
    if !parser.at_end() {
        return Err(ScimError::invalid_filter(format!(
            "trailing input after filter in '{source}'"
        )));
    }
    Ok(filter)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Bracket nesting; filter steps are only legal at depth 0.
    depth: usize,
}

impl Parser {
    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn peek_word(&self) -> Option<&str> {
        match self.peek() {
            Some(Token::Word(word)) => Some(word.as_str()),
            _ => None,
        }
    }

    /// `or_expr := and_expr (OR and_expr)*`
    fn parse_or(&mut self) -> ScimResult<FilterExpr> {
        let mut left = self.parse_and()?;
        while self
            .peek_word()
            .is_some_and(|word| word.eq_ignore_ascii_case("or"))
        {
            self.next();
            let right = self.parse_and()?;
            left = FilterExpr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    /// `and_expr := not_expr (AND not_expr)*`
    fn parse_and(&mut self) -> ScimResult<FilterExpr> {
        let mut left = self.parse_not()?;
        while self
            .peek_word()
            .is_some_and(|word| word.eq_ignore_ascii_case("and"))
        {
            self.next();
            let right = self.parse_not()?;
            left = FilterExpr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    /// `not_expr := NOT group | group | comparison`
    fn parse_not(&mut self) -> ScimResult<FilterExpr> {
        if self
            .peek_word()
            .is_some_and(|word| word.eq_ignore_ascii_case("not"))
        {
            self.next();
            if !matches!(self.peek(), Some(Token::LParen)) {
                return Err(ScimError::invalid_filter("'not' requires a parenthesized group"));
            }
            let inner = self.parse_not()?;
            return Ok(FilterExpr::Not(Box::new(inner)));
        }
        if matches!(self.peek(), Some(Token::LParen)) {
            self.next();
            let inner = self.parse_or()?;
            match self.next() {
                Some(Token::RParen) => return Ok(inner),
                _ => return Err(ScimError::invalid_filter("unbalanced parentheses")),
            }
        }
        self.parse_comparison()
    }

    /// `comparison := path ('pr' | op literal)`
    fn parse_comparison(&mut self) -> ScimResult<FilterExpr> {
        let path = self.parse_path(ScimError::invalid_filter)?;
        if path.is_empty() {
            return Err(ScimError::invalid_filter("expected attribute path"));
        }
        let Some(Token::Word(word)) = self.next() else {
            return Err(ScimError::invalid_filter("expected relational operator"));
        };
        let op = CompareOp::from_word(&word)
            .ok_or_else(|| ScimError::invalid_filter(format!("unknown operator '{word}'")))?;
        if op == CompareOp::Pr {
            return Ok(FilterExpr::Compare {
                path,
                op,
                literal: None,
            });
        }
        let literal = self.parse_literal()?;
        Ok(FilterExpr::Compare {
            path,
            op,
            literal: Some(literal),
        })
    }

    fn parse_literal(&mut self) -> ScimResult<Literal> {
        match self.next() {
            Some(Token::Str(text)) => Ok(Literal::Str(text)),
            Some(Token::Number(text)) => {
                if text.contains(['.', 'e', 'E']) {
                    text.parse::<f64>()
                        .map(Literal::Dec)
                        .map_err(|_| ScimError::invalid_filter(format!("bad number '{text}'")))
                } else {
                    text.parse::<i64>()
                        .map(Literal::Int)
                        .map_err(|_| ScimError::invalid_filter(format!("bad number '{text}'")))
                }
            }
            Some(Token::Word(word)) if word.eq_ignore_ascii_case("true") => {
                Ok(Literal::Bool(true))
            }
            Some(Token::Word(word)) if word.eq_ignore_ascii_case("false") => {
                Ok(Literal::Bool(false))
            }
            Some(Token::Word(word)) if word.eq_ignore_ascii_case("null") => Ok(Literal::Null),
            Some(Token::Word(word)) => Err(ScimError::invalid_filter(format!(
                "unquoted string '{word}' on right-hand side"
            ))),
            _ => Err(ScimError::invalid_filter("expected literal")),
        }
    }

    /// Parse a (possibly filter-qualified) path. A filter step is only
    /// legal outside brackets; filters do not nest.
    fn parse_path(&mut self, err: fn(String) -> ScimError) -> ScimResult<Path> {
        let mut steps = Vec::new();
        loop {
            match self.peek() {
                Some(Token::Word(_)) => {
                    let Some(Token::Word(word)) = self.next() else {
                        unreachable!()
                    };
                    push_word_steps(&mut steps, &word, err)?;
                }
                _ => break,
            }
            if matches!(self.peek(), Some(Token::LBracket)) {
                if self.depth > 0 {
                    return Err(ScimError::invalid_filter(
                        "filter steps may not nest inside a filter",
                    ));
                }
                self.next();
                self.depth += 1;
                let inner = self.parse_or()?;
                self.depth -= 1;
                match self.next() {
                    Some(Token::RBracket) => {}
                    _ => return Err(err("missing ']' after filter step".to_string())),
                }
                steps.push(Step::Filter(Arc::new(inner)));
            }
            if matches!(self.peek(), Some(Token::Dot)) {
                self.next();
                if !matches!(self.peek(), Some(Token::Word(_))) {
                    return Err(err("expected attribute name after '.'".to_string()));
                }
                continue;
            }
            break;
        }
        Ok(Path { steps })
    }
}

/// Split a word token into attribute steps. URN-qualified words stay whole;
/// the property layer expands them against the schema.
fn push_word_steps(
    steps: &mut Vec<Step>,
    word: &str,
    err: fn(String) -> ScimError,
) -> ScimResult<()> {
    if word.to_ascii_lowercase().starts_with("urn:") {
        steps.push(Step::Attr(word.to_string()));
        return Ok(());
    }
    for segment in word.split('.') {
        if segment.is_empty() {
            return Err(err(format!("empty segment in path '{word}'")));
        }
        steps.push(Step::Attr(segment.to_string()));
    }
    Ok(())
}
