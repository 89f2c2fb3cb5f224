//! Token types produced by the query scanner.

use std::fmt;

/// Boolean operator keywords recognised in free-text expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    And,
    Or,
    Not,
}

impl Operator {
    /// Match an operator keyword. Keywords are upper-case only, so `and` stays a word.
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "AND" => Some(Self::And),
            "OR" => Some(Self::Or),
            "NOT" => Some(Self::Not),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A lexical unit of a query expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A bare word. Hyphens, apostrophes, `+` and `*` stay inside the word.
    Word(String),
    /// A quoted phrase; its words must appear adjacent to each other.
    Phrase(Vec<String>),
    Operator(Operator),
    GroupStart,
    GroupEnd,
}

impl Token {
    /// True for tokens that can close an operand (`word`, `"phrase"`, `)`).
    pub(crate) fn ends_operand(&self) -> bool {
        matches!(self, Token::Word(_) | Token::Phrase(_) | Token::GroupEnd)
    }

    /// True for tokens that can open an operand (`word`, `"phrase"`, `(`).
    pub(crate) fn starts_operand(&self) -> bool {
        matches!(self, Token::Word(_) | Token::Phrase(_) | Token::GroupStart)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(w) => f.write_str(w),
            Token::Phrase(words) => write!(f, "\"{}\"", words.join(" ")),
            Token::Operator(op) => write!(f, "{op}"),
            Token::GroupStart => f.write_str("("),
            Token::GroupEnd => f.write_str(")"),
        }
    }
}
