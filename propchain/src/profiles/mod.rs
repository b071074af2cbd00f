//! Profile expressions.
//!
//! A profile expression is a boolean formula over profile labels:
//!
//! ```text
//! Or    := And ('|' And)*
//! And   := Unary ('&' Unary)*
//! Unary := '!' Unary | '(' Or ')' | Literal
//! ```
//!
//! Several expressions can be given at once; [`Profiles`] matches when any
//! of them does. Which labels count as active is up to the caller, usually
//! [`Environment::is_profile_active`](crate::Environment::is_profile_active).
//!
//! # Examples
//!
//! ```
//! use propchain::profiles::Profiles;
//!
//! let profiles = Profiles::parse(&["(cloud | onprem) & !test"]).unwrap();
//! assert!(profiles.matches(|label| label == "cloud"));
//! assert!(!profiles.matches(|label| label == "cloud" || label == "test"));
//! ```

#[cfg(all(test, feature = "property-tests"))]
mod proptests;

use std::fmt;

use thiserror::Error;

use crate::error::{Error as CrateError, Result};

/// Prefix marking a negated label.
pub const NOT_PREFIX: char = '!';

/// Errors produced while parsing a profile expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileParseError {
    /// A token appeared where it is not allowed.
    #[error("unexpected token '{token}'")]
    UnexpectedToken {
        /// The offending token.
        token: String,
    },

    /// The expression ended while more input was required.
    #[error("unexpected end of expression")]
    UnexpectedEnd,

    /// An opening parenthesis was never closed.
    #[error("missing closing parenthesis")]
    MissingCloseParen,

    /// No expression was given, or an expression had no content.
    #[error("profile expression must contain text")]
    Empty,
}

/// A parsed profile expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileExpr {
    /// A single profile label.
    Literal(String),
    /// Negation.
    Not(Box<ProfileExpr>),
    /// Conjunction; evaluation stops at the first false operand.
    And(Vec<ProfileExpr>),
    /// Disjunction; evaluation stops at the first true operand.
    Or(Vec<ProfileExpr>),
}

impl ProfileExpr {
    /// Parses a single expression.
    ///
    /// # Errors
    ///
    /// Returns a [`ProfileParseError`] if the text is empty or malformed.
    pub fn parse(text: &str) -> std::result::Result<Self, ProfileParseError> {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return Err(ProfileParseError::Empty);
        }
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.parse_or()?;
        match parser.peek() {
            None => Ok(expr),
            Some(token) => Err(ProfileParseError::UnexpectedToken {
                token: token.to_string(),
            }),
        }
    }

    /// Evaluates the expression, asking `is_active` about each label it
    /// needs.
    pub fn eval(&self, is_active: &dyn Fn(&str) -> bool) -> bool {
        match self {
            Self::Literal(label) => is_active(label),
            Self::Not(inner) => !inner.eval(is_active),
            Self::And(operands) => operands.iter().all(|op| op.eval(is_active)),
            Self::Or(operands) => operands.iter().any(|op| op.eval(is_active)),
        }
    }

    /// Labels mentioned anywhere in the expression, in order of appearance.
    #[must_use]
    pub fn labels(&self) -> Vec<&str> {
        let mut labels = Vec::new();
        self.collect_labels(&mut labels);
        labels
    }

    fn collect_labels<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Literal(label) => out.push(label),
            Self::Not(inner) => inner.collect_labels(out),
            Self::And(operands) | Self::Or(operands) => {
                for op in operands {
                    op.collect_labels(out);
                }
            }
        }
    }
}

impl fmt::Display for ProfileExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(label) => write!(f, "{label}"),
            Self::Not(inner) => write!(f, "!{inner}"),
            Self::And(operands) => write_joined(f, operands, " & "),
            Self::Or(operands) => write_joined(f, operands, " | "),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, operands: &[ProfileExpr], op: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, operand) in operands.iter().enumerate() {
        if i > 0 {
            write!(f, "{op}")?;
        }
        write!(f, "{operand}")?;
    }
    write!(f, ")")
}

/// One or more profile expressions, OR-combined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profiles {
    expressions: Vec<ProfileExpr>,
}

impl Profiles {
    /// Parses each expression in `expressions`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProfileParse`](CrateError::ProfileParse) if no
    /// expressions are given or any of them fails to parse.
    pub fn parse<S: AsRef<str>>(expressions: &[S]) -> Result<Self> {
        if expressions.is_empty() {
            return Err(ProfileParseError::Empty.into());
        }
        let expressions = expressions
            .iter()
            .map(|text| ProfileExpr::parse(text.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { expressions })
    }

    /// Whether any expression holds under `is_active`.
    pub fn matches<F: Fn(&str) -> bool>(&self, is_active: F) -> bool {
        self.expressions.iter().any(|expr| expr.eval(&is_active))
    }

    /// The parsed expressions.
    #[must_use]
    pub fn expressions(&self) -> &[ProfileExpr] {
        &self.expressions
    }
}

impl fmt::Display for Profiles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, expr) in self.expressions.iter().enumerate() {
            if i > 0 {
                write!(f, " or ")?;
            }
            write!(f, "{expr}")?;
        }
        Ok(())
    }
}

/// Checks that `label` can name a profile.
///
/// # Errors
///
/// Returns [`Error::IllegalArgument`](CrateError::IllegalArgument) for empty
/// or blank labels and labels starting with `!`.
pub fn validate_label(label: &str) -> Result<()> {
    if label.trim().is_empty() {
        return Err(CrateError::illegal("profile label must contain text"));
    }
    if label.starts_with(NOT_PREFIX) {
        return Err(CrateError::illegal(format!(
            "invalid profile '{label}': must not begin with {NOT_PREFIX}"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    Not,
    And,
    Or,
    Literal(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "("),
            Self::Close => write!(f, ")"),
            Self::Not => write!(f, "!"),
            Self::And => write!(f, "&"),
            Self::Or => write!(f, "|"),
            Self::Literal(label) => write!(f, "{label}"),
        }
    }
}

fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut literal = String::new();

    let flush = |literal: &mut String, tokens: &mut Vec<Token>| {
        let trimmed = literal.trim();
        if !trimmed.is_empty() {
            tokens.push(Token::Literal(trimmed.to_string()));
        }
        literal.clear();
    };

    for ch in text.chars() {
        let operator = match ch {
            '(' => Token::Open,
            ')' => Token::Close,
            '!' => Token::Not,
            '&' => Token::And,
            '|' => Token::Or,
            _ => {
                literal.push(ch);
                continue;
            }
        };
        flush(&mut literal, &mut tokens);
        tokens.push(operator);
    }
    flush(&mut literal, &mut tokens);
    tokens
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
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

    fn parse_or(&mut self) -> std::result::Result<ProfileExpr, ProfileParseError> {
        let mut operands = vec![self.parse_and()?];
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            operands.push(self.parse_and()?);
        }
        Ok(collapse(operands, ProfileExpr::Or))
    }

    fn parse_and(&mut self) -> std::result::Result<ProfileExpr, ProfileParseError> {
        let mut operands = vec![self.parse_unary()?];
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            operands.push(self.parse_unary()?);
        }
        Ok(collapse(operands, ProfileExpr::And))
    }

    fn parse_unary(&mut self) -> std::result::Result<ProfileExpr, ProfileParseError> {
        match self.next() {
            None => Err(ProfileParseError::UnexpectedEnd),
            Some(Token::Not) => Ok(ProfileExpr::Not(Box::new(self.parse_unary()?))),
            Some(Token::Open) => {
                let inner = self.parse_or()?;
                match self.next() {
                    Some(Token::Close) => Ok(inner),
                    None => Err(ProfileParseError::MissingCloseParen),
                    Some(token) => Err(ProfileParseError::UnexpectedToken {
                        token: token.to_string(),
                    }),
                }
            }
            Some(Token::Literal(label)) => Ok(ProfileExpr::Literal(label)),
            Some(token) => Err(ProfileParseError::UnexpectedToken {
                token: token.to_string(),
            }),
        }
    }
}

fn collapse(mut operands: Vec<ProfileExpr>, build: fn(Vec<ProfileExpr>) -> ProfileExpr) -> ProfileExpr {
    if operands.len() == 1 {
        operands.remove(0)
    } else {
        build(operands)
    }
}
