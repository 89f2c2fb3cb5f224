//! Query scanner - tokenizes free-text search expressions
//!
//! The scanner is a small `Copy` value (input + cursor). Every lexing step takes a
//! scanner and returns the advanced scanner next to what it recognised, so no
//! function holds hidden cursor state.
//!
//! Lexing never fails: characters that cannot start a token are skipped, and
//! unterminated phrases end at end-of-input.

use crate::token::{Operator, Token};

/// Cursor over a query expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn bump(self) -> Self {
        match self.peek() {
            Some(c) => Self {
                input: self.input,
                pos: self.pos + c.len_utf8(),
            },
            None => self,
        }
    }

    fn skip_while(self, pred: impl Fn(char) -> bool) -> Self {
        let len = self
            .remaining()
            .char_indices()
            .find(|(_, c)| !pred(*c))
            .map(|(i, _)| i)
            .unwrap_or_else(|| self.remaining().len());
        Self {
            input: self.input,
            pos: self.pos + len,
        }
    }
}

/// Characters allowed inside a word.
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '\'' | '+' | '-' | '*')
}

/// Characters allowed after an operator keyword (besides end-of-input).
fn is_operator_boundary(c: char) -> bool {
    c.is_whitespace() || c == '(' || c == '"'
}

/// Tokenize an expression without inserting implicit conjunctions.
pub fn tokenize_raw(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut scanner = Scanner::new(input);
    while !scanner.is_at_end() {
        let (token, next) = next_token(scanner);
        scanner = next;
        if let Some(token) = token {
            tokens.push(token);
        }
    }
    tokens
}

/// Tokenize an expression and insert implicit `AND` operators.
pub fn tokenize(input: &str) -> Vec<Token> {
    insert_implicit_and(tokenize_raw(input))
}

/// Insert `AND` between two adjacent operands that have no operator between them.
///
/// A `NOT` is never preceded by an implicit `AND`; it attaches to the operand on
/// its left without a conjunction marker.
pub fn insert_implicit_and(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len() * 2);
    for token in tokens {
        if let Some(prev) = out.last() {
            if prev.ends_operand() && token.starts_operand() {
                out.push(Token::Operator(Operator::And));
            }
        }
        out.push(token);
    }
    out
}

/// Scan the next token. Returns `None` when only skippable input was consumed.
pub fn next_token(scanner: Scanner<'_>) -> (Option<Token>, Scanner<'_>) {
    let scanner = scanner.skip_while(|c| !starts_token(c));
    match scanner.peek() {
        None => (None, scanner),
        Some('(') => (Some(Token::GroupStart), scanner.bump()),
        Some(')') => (Some(Token::GroupEnd), scanner.bump()),
        Some('"') => lex_phrase(scanner.bump()),
        Some(_) => lex_word_or_operator(scanner),
    }
}

fn starts_token(c: char) -> bool {
    c == '(' || c == ')' || c == '"' || is_word_char(c)
}

fn lex_word(scanner: Scanner<'_>) -> (Option<String>, Scanner<'_>) {
    let start = scanner.position();
    let end = scanner.skip_while(is_word_char);
    let word = &scanner.input[start..end.position()];
    // A run of only `-`, `+`, `*` or `'` carries nothing searchable.
    if word.chars().any(char::is_alphanumeric) {
        (Some(word.to_string()), end)
    } else {
        (None, end)
    }
}

fn lex_word_or_operator(scanner: Scanner<'_>) -> (Option<Token>, Scanner<'_>) {
    let (word, next) = lex_word(scanner);
    let Some(word) = word else {
        return (None, next);
    };
    if let Some(op) = Operator::from_keyword(&word) {
        if next.peek().map_or(true, is_operator_boundary) {
            return (Some(Token::Operator(op)), next);
        }
    }
    (Some(Token::Word(word)), next)
}

/// Lex the body of a quoted phrase; the opening quote is already consumed.
fn lex_phrase(mut scanner: Scanner<'_>) -> (Option<Token>, Scanner<'_>) {
    let mut words = Vec::new();
    loop {
        scanner = scanner.skip_while(|c| c != '"' && !is_word_char(c));
        match scanner.peek() {
            None => break,
            Some('"') => {
                scanner = scanner.bump();
                break;
            }
            Some(_) => {
                let (word, next) = lex_word(scanner);
                scanner = next;
                words.extend(word);
            }
        }
    }

    if words.is_empty() {
        (None, scanner)
    } else {
        (Some(Token::Phrase(words)), scanner)
    }
}
