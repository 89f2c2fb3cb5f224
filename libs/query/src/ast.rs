//! Backend-agnostic query tree.
//!
//! The tree carries no search-engine syntax. Rendering to a concrete backend
//! happens in [`crate::compiler`].

/// Binary boolean operators. `NOT` is unary and has its own node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    And,
    Or,
}

/// Where a synonym alternative came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlternativeKind {
    /// A spelling derived from the user's own input (e.g. a hyphen variant).
    Literal,
    /// A synonym taken from a matching concept.
    Concept,
}

/// One member of a synonym set: a word or a sequence of adjacent words.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Alternative {
    pub words: Vec<String>,
    pub kind: AlternativeKind,
}

impl Alternative {
    pub fn literal(words: Vec<String>) -> Self {
        Self {
            words,
            kind: AlternativeKind::Literal,
        }
    }

    pub fn concept(words: Vec<String>) -> Self {
        Self {
            words,
            kind: AlternativeKind::Concept,
        }
    }

    /// Case-insensitive identity used for de-duplication.
    pub fn key(&self) -> String {
        self.words
            .iter()
            .map(|w| w.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryNode {
    Term(String),
    /// Words that must appear adjacent to each other, in order.
    Phrase(Vec<String>),
    /// Alternative spellings of one term or phrase. Never empty.
    SynonymSet(Vec<Alternative>),
    BinaryOp {
        op: BinaryOperator,
        left: Box<QueryNode>,
        right: Box<QueryNode>,
    },
    Not(Box<QueryNode>),
    /// A parenthesised sub-expression from the input.
    Group(Box<QueryNode>),
}

impl QueryNode {
    pub fn term(value: impl Into<String>) -> Self {
        Self::Term(value.into())
    }

    pub fn and(left: QueryNode, right: QueryNode) -> Self {
        Self::binary(BinaryOperator::And, left, right)
    }

    pub fn or(left: QueryNode, right: QueryNode) -> Self {
        Self::binary(BinaryOperator::Or, left, right)
    }

    pub fn binary(op: BinaryOperator, left: QueryNode, right: QueryNode) -> Self {
        Self::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn negate(child: QueryNode) -> Self {
        Self::Not(Box::new(child))
    }

    pub fn group(child: QueryNode) -> Self {
        Self::Group(Box::new(child))
    }

    /// Number of leaf operands (terms, phrases and synonym sets) in the tree.
    pub fn leaf_count(&self) -> usize {
        match self {
            QueryNode::Term(_) | QueryNode::Phrase(_) | QueryNode::SynonymSet(_) => 1,
            QueryNode::BinaryOp { left, right, .. } => left.leaf_count() + right.leaf_count(),
            QueryNode::Not(child) | QueryNode::Group(child) => child.leaf_count(),
        }
    }
}
