// SPDX-License-Identifier: Apache-2.0

//! The class guard expression language: `!`, `&`, `|`, `.` (alias for `&`),
//! parentheses, and the constants `any`/`true`/`false`.

use cfagent_common::error::AgentError;
use std::fmt;

/// A parsed class guard expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassExpr {
    /// The `any`/`true` constant.
    Any,
    /// The `false` constant.
    False,
    /// A bare class name.
    Name(String),
    Not(Box<ClassExpr>),
    And(Box<ClassExpr>, Box<ClassExpr>),
    Or(Box<ClassExpr>, Box<ClassExpr>),
}

/// A malformed class guard expression.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
#[error("malformed class expression {expr:?}: {reason}")]
pub struct ClassExprError {
    pub expr: String,
    pub reason: String,
}

impl AgentError for ClassExprError {
    fn compound(errors: Vec<Self>) -> Self {
        Self {
            expr: String::new(),
            reason: errors.into_iter().map(|e| e.reason).collect::<Vec<_>>().join("; "),
        }
    }
}

/// Parses a class guard expression.
pub fn parse(expr: &str) -> Result<ClassExpr, ClassExprError> {
    let tokens = tokenize(expr).map_err(|reason| ClassExprError { expr: expr.to_owned(), reason })?;
    let mut parser = Parser { tokens: &tokens, pos: 0 };
    let ast = parser
        .parse_or()
        .map_err(|reason| ClassExprError { expr: expr.to_owned(), reason })?;
    if parser.pos != parser.tokens.len() {
        return Err(ClassExprError {
            expr: expr.to_owned(),
            reason: "trailing tokens after expression".to_owned(),
        });
    }
    Ok(ast)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Not,
    And,
    Or,
    LParen,
    RParen,
    Ident(String),
}

fn tokenize(expr: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = expr.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '!' => {
                chars.next();
                tokens.push(Token::Not);
            }
            '&' => {
                chars.next();
                tokens.push(Token::And);
            }
            '|' => {
                chars.next();
                tokens.push(Token::Or);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            c if c.is_alphanumeric() || c == '_' || c == '.' || c == ':' => {
                let mut ident = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' || c == ':' {
                        ident.push(c);
                        chars.next();
                    } else if c == '.' {
                        // `.` between two identifier characters is the AND
                        // alias; a lone `.` is invalid.
                        chars.next();
                        tokens.push(Token::Ident(std::mem::take(&mut ident)));
                        tokens.push(Token::And);
                    } else {
                        break;
                    }
                }
                if !ident.is_empty() {
                    tokens.push(Token::Ident(ident));
                }
            }
            other => return Err(format!("unexpected character {other:?}")),
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<&Token> {
        let t = self.tokens.get(self.pos);
        self.pos += 1;
        t
    }

    // or := and ('|' and)*
    fn parse_or(&mut self) -> Result<ClassExpr, String> {
        let mut lhs = self.parse_and()?;
        while matches!(self.peek(), Some(Token::Or)) {
            self.bump();
            let rhs = self.parse_and()?;
            lhs = ClassExpr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    // and := unary ('&' unary)*
    fn parse_and(&mut self) -> Result<ClassExpr, String> {
        let mut lhs = self.parse_unary()?;
        while matches!(self.peek(), Some(Token::And)) {
            self.bump();
            let rhs = self.parse_unary()?;
            lhs = ClassExpr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    // unary := '!' unary | atom
    fn parse_unary(&mut self) -> Result<ClassExpr, String> {
        if matches!(self.peek(), Some(Token::Not)) {
            self.bump();
            return Ok(ClassExpr::Not(Box::new(self.parse_unary()?)));
        }
        self.parse_atom()
    }

    // atom := '(' or ')' | ident
    fn parse_atom(&mut self) -> Result<ClassExpr, String> {
        match self.bump().cloned() {
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                match self.bump() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err("expected closing parenthesis".to_owned()),
                }
            }
            Some(Token::Ident(name)) => Ok(match name.as_str() {
                "any" | "true" => ClassExpr::Any,
                "false" => ClassExpr::False,
                _ => ClassExpr::Name(name),
            }),
            other => Err(format!("expected an expression, found {other:?}")),
        }
    }
}

impl fmt::Display for ClassExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassExpr::Any => write!(f, "any"),
            ClassExpr::False => write!(f, "false"),
            ClassExpr::Name(n) => write!(f, "{n}"),
            ClassExpr::Not(e) => write!(f, "!({e})"),
            ClassExpr::And(a, b) => write!(f, "({a})&({b})"),
            ClassExpr::Or(a, b) => write!(f, "({a})|({b})"),
        }
    }
}

/// Anything that can answer "is this class name currently defined".
/// Implemented by [`crate::classes::ClassHeap`]; kept as a trait so the
/// evaluator doesn't need to know about heap layering.
pub trait ClassLookup {
    fn is_defined(&self, name: &str) -> bool;
}

/// Evaluates a parsed expression against a [`ClassLookup`]. Negated classes
/// override positive matches because `ClassLookup::is_defined` already
/// folds negation in.
pub fn eval(expr: &ClassExpr, lookup: &dyn ClassLookup) -> bool {
    match expr {
        ClassExpr::Any => true,
        ClassExpr::False => false,
        ClassExpr::Name(name) => lookup.is_defined(name),
        ClassExpr::Not(e) => !eval(e, lookup),
        ClassExpr::And(a, b) => eval(a, lookup) && eval(b, lookup),
        ClassExpr::Or(a, b) => eval(a, lookup) || eval(b, lookup),
    }
}

/// Parses and evaluates `expr` in one step — the `IsDefinedClass`
/// primitive.
pub fn is_defined_class(expr: &str, lookup: &dyn ClassLookup) -> Result<bool, ClassExprError> {
    Ok(eval(&parse(expr)?, lookup))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct SetLookup(HashSet<&'static str>);
    impl ClassLookup for SetLookup {
        fn is_defined(&self, name: &str) -> bool {
            self.0.contains(name)
        }
    }

    #[test]
    fn any_and_true_are_always_defined() {
        let lookup = SetLookup(HashSet::new());
        assert!(is_defined_class("any", &lookup).unwrap());
        assert!(is_defined_class("true", &lookup).unwrap());
        assert!(!is_defined_class("false", &lookup).unwrap());
    }

    #[test]
    fn dot_is_an_and_alias() {
        let lookup = SetLookup(HashSet::from(["linux", "debian"]));
        assert!(is_defined_class("linux.debian", &lookup).unwrap());
        assert!(!is_defined_class("linux.redhat", &lookup).unwrap());
    }

    #[test]
    fn negation_and_parens_and_or() {
        let lookup = SetLookup(HashSet::from(["linux"]));
        assert!(is_defined_class("!(windows)", &lookup).unwrap());
        assert!(is_defined_class("(linux|windows)&!macos", &lookup).unwrap());
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(parse("linux)").is_err());
        assert!(parse("&linux").is_err());
    }
}
