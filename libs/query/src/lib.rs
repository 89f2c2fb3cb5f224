//! Citation query language
//!
//! Turns free-text search expressions into full-text backend queries:
//!
//! ```text
//! expression --scanner--> tokens --parser--> QueryNode (+ ParseState)
//!            --SynonymResolver + ConceptIndex--> expanded QueryNode
//!            --QueryCompiler--> backend query string
//! ```
//!
//! Grammar (operators apply left to right, parentheses group):
//!
//! - words: letters, digits, `'`, `+`, `-`, `*` (`aa-cc`, `crohn's`, `canc*`)
//! - phrases: `"lung cancer"` (adjacent words)
//! - operators: `AND`, `OR`, `NOT` (upper case, followed by space, `(`, `"` or end)
//! - implicit `AND` between adjacent operands
//!
//! # Example
//!
//! ```
//! use citeline_query::{to_postgres_query, ConceptIndex, StopWords};
//!
//! let stop_words = StopWords::english();
//! let query = to_postgres_query("aa AND bb OR NOT cc", &stop_words, &ConceptIndex::empty());
//! assert_eq!(query, "aa&bb|!cc");
//! ```

pub mod ast;
pub mod compiler;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod stopwords;
pub mod synonyms;
pub mod token;

pub use ast::{Alternative, AlternativeKind, BinaryOperator, QueryNode};
pub use compiler::{compile, QueryCompiler, RenderStyle, TsQueryCompiler};
pub use error::{QueryError, Result};
pub use lexer::{tokenize, Scanner};
pub use parser::{parse, ParseState, ParsedQuery};
pub use stopwords::StopWords;
pub use synonyms::{lookup_key, Concept, ConceptCode, ConceptIndex, SynonymResolver};
pub use token::{Operator, Token};

/// Parse, expand and compile an expression to PostgreSQL `tsquery` syntax.
///
/// Returns an empty string when the expression holds nothing searchable.
pub fn to_postgres_query(expression: &str, stop_words: &StopWords, concepts: &ConceptIndex) -> String {
    let parsed = parse(expression);
    compile_parsed(&parsed, stop_words, concepts)
}

/// Expand and compile an already parsed expression.
pub fn compile_parsed(parsed: &ParsedQuery, stop_words: &StopWords, concepts: &ConceptIndex) -> String {
    match SynonymResolver::new(stop_words).resolve(parsed, concepts) {
        Some(root) => TsQueryCompiler::for_state(&parsed.state).compile(&root),
        None => String::new(),
    }
}
