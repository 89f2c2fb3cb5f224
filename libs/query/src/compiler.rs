//! Query compiler - renders a [`QueryNode`] tree for a full-text backend
//!
//! [`TsQueryCompiler`] targets PostgreSQL `to_tsquery` syntax:
//!
//! | node                  | output            |
//! |-----------------------|-------------------|
//! | `Term`                | `word`            |
//! | `Phrase`              | `a<->b`           |
//! | `SynonymSet` (n > 1)  | `(x\|y\|z)`       |
//! | `BinaryOp(And)`       | `l & r`           |
//! | `BinaryOp(Or)`        | `l \| r`          |
//! | `Not`                 | `! c`             |
//! | `Group`               | `(c)`             |
//!
//! Other backends implement [`QueryCompiler`]; the parser and resolver never see
//! backend syntax.

use crate::ast::{Alternative, AlternativeKind, BinaryOperator, QueryNode};
use crate::parser::ParseState;

/// Renders a query tree into a backend's native query string.
pub trait QueryCompiler {
    fn compile(&self, node: &QueryNode) -> String;
}

/// Operator spacing in the rendered query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderStyle {
    /// `aa&bb|!cc`
    Compact,
    /// `aa & (bb | ! cc)`
    #[default]
    Spaced,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TsQueryCompiler {
    style: RenderStyle,
}

impl TsQueryCompiler {
    pub fn new(style: RenderStyle) -> Self {
        Self { style }
    }

    /// Compact output for flat input; spaced output once the input used
    /// parentheses or quotes.
    pub fn for_state(state: &ParseState) -> Self {
        if state.is_structured() {
            Self::new(RenderStyle::Spaced)
        } else {
            Self::new(RenderStyle::Compact)
        }
    }

    fn separator(&self, symbol: &str) -> String {
        match self.style {
            RenderStyle::Compact => symbol.to_string(),
            RenderStyle::Spaced => format!(" {symbol} "),
        }
    }

    fn render(&self, node: &QueryNode, out: &mut String) {
        match node {
            QueryNode::Term(term) => out.push_str(term),
            QueryNode::Phrase(words) => out.push_str(&words.join(ADJACENCY)),
            QueryNode::SynonymSet(alternatives) => self.render_synonyms(alternatives, out),
            QueryNode::BinaryOp { op, left, right } => {
                self.render(left, out);
                out.push_str(&self.separator(match op {
                    BinaryOperator::And => "&",
                    BinaryOperator::Or => "|",
                }));
                self.render(right, out);
            }
            QueryNode::Not(child) => {
                out.push('!');
                if self.style == RenderStyle::Spaced {
                    out.push(' ');
                }
                self.render(child, out);
            }
            QueryNode::Group(child) => {
                out.push('(');
                self.render(child, out);
                out.push(')');
            }
        }
    }

    fn render_synonyms(&self, alternatives: &[Alternative], out: &mut String) {
        match alternatives {
            [] => {}
            // A single alternative reads exactly like the bare term.
            [only] => out.push_str(&only.words.join(ADJACENCY)),
            _ => {
                let sep = self.separator("|");
                let rendered: Vec<String> = alternatives.iter().map(render_alternative).collect();
                out.push('(');
                out.push_str(&rendered.join(&sep));
                out.push(')');
            }
        }
    }
}

impl QueryCompiler for TsQueryCompiler {
    fn compile(&self, node: &QueryNode) -> String {
        let mut out = String::new();
        self.render(node, &mut out);
        out
    }
}

const ADJACENCY: &str = "<->";

fn render_alternative(alt: &Alternative) -> String {
    match alt.kind {
        AlternativeKind::Literal => alt.words.join(ADJACENCY),
        AlternativeKind::Concept => alt
            .words
            .iter()
            .map(|w| quote_lexeme(w))
            .collect::<Vec<_>>()
            .join(ADJACENCY),
    }
}

/// Quote a lexeme for `to_tsquery`; backslashes are escaped and embedded
/// quotes doubled.
fn quote_lexeme(word: &str) -> String {
    format!("'{}'", word.replace('\\', "\\\\").replace('\'', "''"))
}

/// Render with the default (spaced) style.
pub fn compile(node: &QueryNode) -> String {
    TsQueryCompiler::default().compile(node)
}
