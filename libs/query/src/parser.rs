//! Query parser - builds a [`QueryNode`] tree from the token stream
//!
//! Operators are applied strictly left to right; parentheses are the only way
//! to change association. `aa OR bb AND cc` therefore means `(aa OR bb) AND cc`.
//!
//! Parsing never fails. Dangling operators are dropped, unterminated groups are
//! closed at end-of-input and stray `)` tokens are skipped.

use crate::ast::{BinaryOperator, QueryNode};
use crate::lexer::{insert_implicit_and, tokenize_raw};
use crate::token::{Operator, Token};

/// Facts about the input collected while parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseState {
    pub has_explicit_operator: bool,
    pub has_group: bool,
    pub has_phrase: bool,
    /// Bare words in input order.
    pub terms: Vec<String>,
}

impl ParseState {
    fn from_tokens(tokens: &[Token]) -> Self {
        let mut state = ParseState::default();
        for token in tokens {
            match token {
                Token::Word(w) => state.terms.push(w.clone()),
                Token::Phrase(_) => state.has_phrase = true,
                Token::Operator(_) => state.has_explicit_operator = true,
                Token::GroupStart | Token::GroupEnd => state.has_group = true,
            }
        }
        state
    }

    /// A flat run of at least two words joined only by implicit conjunctions.
    pub fn is_simple(&self) -> bool {
        !self.has_explicit_operator && !self.has_group && !self.has_phrase && self.terms.len() >= 2
    }

    /// True when the input used parentheses or quotes.
    pub fn is_structured(&self) -> bool {
        self.has_group || self.has_phrase
    }
}

/// Parser output: the tree (absent for empty input) plus the collected state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    pub root: Option<QueryNode>,
    pub state: ParseState,
}

impl ParsedQuery {
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }
}

/// Parse a free-text expression.
pub fn parse(expression: &str) -> ParsedQuery {
    let raw = tokenize_raw(expression);
    let state = ParseState::from_tokens(&raw);
    let tokens = insert_implicit_and(raw);
    let (root, _) = parse_sequence(&tokens, 0, 0);
    ParsedQuery { root, state }
}

/// Parse operands and operators until `)` (when nested) or end of tokens.
///
/// Returns the combined node and the index of the first unconsumed token.
fn parse_sequence(tokens: &[Token], mut pos: usize, depth: usize) -> (Option<QueryNode>, usize) {
    let mut acc: Option<QueryNode> = None;
    let mut pending: Option<BinaryOperator> = None;

    while let Some(token) = tokens.get(pos) {
        match token {
            Token::GroupEnd => {
                pos += 1;
                if depth > 0 {
                    break;
                }
            }
            Token::Operator(Operator::And) => {
                pending = Some(BinaryOperator::And);
                pos += 1;
            }
            Token::Operator(Operator::Or) => {
                pending = Some(BinaryOperator::Or);
                pos += 1;
            }
            _ => {
                let (operand, next) = parse_operand(tokens, pos, depth);
                pos = next;
                let Some(operand) = operand else {
                    continue;
                };
                acc = Some(match acc {
                    None => operand,
                    // A NOT directly after an operand has no marker; it conjoins.
                    Some(left) => QueryNode::binary(
                        pending.unwrap_or(BinaryOperator::And),
                        left,
                        operand,
                    ),
                });
                pending = None;
            }
        }
    }

    (acc, pos)
}

fn parse_operand(tokens: &[Token], pos: usize, depth: usize) -> (Option<QueryNode>, usize) {
    let Some(token) = tokens.get(pos) else {
        return (None, pos);
    };
    match token {
        Token::Word(w) => (Some(QueryNode::Term(w.clone())), pos + 1),
        Token::Phrase(words) => (Some(QueryNode::Phrase(words.clone())), pos + 1),
        Token::GroupStart => {
            let (inner, next) = parse_sequence(tokens, pos + 1, depth + 1);
            (inner.map(QueryNode::group), next)
        }
        Token::Operator(Operator::Not) => {
            let (inner, next) = parse_operand(tokens, pos + 1, depth);
            (inner.map(QueryNode::negate), next)
        }
        // Left for the enclosing sequence to handle.
        Token::Operator(_) | Token::GroupEnd => (None, pos),
    }
}
