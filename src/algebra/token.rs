// The postfix relational-algebra IR.
//
// Each token is a sum type, and a condition's referenced attributes are
// tracked structurally, so the escape-scanning in
// `collect_condition_attributes` (see `attrs.rs`) is only ever needed once,
// at parse time rather than on every access.

use std::fmt;

use crate::common::{ATTR_LIST_SEPARATOR, CONDITION_ATTR_ESCAPE};

/// An operator symbol from the algebra. Payloads use a single-letter wire
/// encoding (`p`, `s`, `u`, `n`, `e`, `j`, `t`, `r`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// π — projection.
    Projection,
    /// σ — selection.
    Selection,
    /// ∪ — union.
    Union,
    /// ∩ — intersection.
    Intersect,
    /// \ — except.
    Except,
    /// ⋈ — natural join.
    NaturalJoin,
    /// ⋈θ — theta join.
    ThetaJoin,
    /// ρ — rename.
    Rename,
}

impl OpKind {
    pub fn symbol(self) -> char {
        match self {
            OpKind::Projection => 'p',
            OpKind::Selection => 's',
            OpKind::Union => 'u',
            OpKind::Intersect => 'n',
            OpKind::Except => 'e',
            OpKind::NaturalJoin => 'j',
            OpKind::ThetaJoin => 't',
            OpKind::Rename => 'r',
        }
    }

    pub fn from_symbol(c: char) -> Option<Self> {
        Some(match c {
            'p' => OpKind::Projection,
            's' => OpKind::Selection,
            'u' => OpKind::Union,
            'n' => OpKind::Intersect,
            'e' => OpKind::Except,
            'j' => OpKind::NaturalJoin,
            't' => OpKind::ThetaJoin,
            'r' => OpKind::Rename,
            _ => return None,
        })
    }

    /// Operators that take two operand subtrees beneath them.
    pub fn is_binary(self) -> bool {
        matches!(
            self,
            OpKind::Union | OpKind::Intersect | OpKind::Except | OpKind::NaturalJoin | OpKind::ThetaJoin
        )
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A condition carried by a selection or theta-join, in postfix form. The
/// raw text is kept (so expressions can be rendered back to wire format),
/// alongside the attribute names it references, extracted once at
/// construction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostfixExpr {
    raw: String,
    attributes: Vec<String>,
}

impl PostfixExpr {
    /// Parses a postfix condition string, extracting every
    /// backtick-escaped attribute name it references.
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let attributes = extract_escaped(&raw, CONDITION_ATTR_ESCAPE);
        Self { raw, attributes }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Attribute names referenced by this condition, in first-seen order.
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }
}

impl fmt::Display for PostfixExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

fn extract_escaped(text: &str, escape: char) -> Vec<String> {
    let mut out = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == escape {
            let mut name = String::new();
            for c2 in chars.by_ref() {
                if c2 == escape {
                    break;
                }
                name.push(c2);
            }
            if !name.is_empty() {
                out.push(name);
            }
        }
    }
    out
}

/// A set of attribute names carried by a projection or used to describe a
/// table's schema, in the order they were listed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttributeSet(Vec<String>);

impl AttributeSet {
    pub fn new(attrs: Vec<String>) -> Self {
        Self(attrs)
    }

    /// Parses a `;`-delimited attribute list as used in the token payload
    /// format.
    pub fn parse(text: &str) -> Self {
        Self(
            text.split(ATTR_LIST_SEPARATOR)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|a| a == name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Deduplicated union of two attribute sets, preserving first-seen
    /// order from `self` then `other`.
    pub fn union(&self, other: &AttributeSet) -> AttributeSet {
        let mut out = self.0.clone();
        for a in &other.0 {
            if !out.contains(a) {
                out.push(a.clone());
            }
        }
        AttributeSet(out)
    }

    /// Intersection of two attribute sets, order follows `self`.
    pub fn intersect(&self, other: &AttributeSet) -> AttributeSet {
        AttributeSet(self.0.iter().filter(|a| other.contains(a)).cloned().collect())
    }

    /// Intersects `self` against a list of bare schema column names,
    /// matching each of `self`'s attributes by its bare name (the part
    /// after the last `.`) rather than requiring an exact match. Table-
    /// qualified attributes (`r.x`) are common in projections and join
    /// conditions even though schemas list bare column names, so a plain
    /// `intersect` would miss every qualified match.
    pub fn intersect_bare(&self, schema: &[String]) -> AttributeSet {
        AttributeSet(
            self.0
                .iter()
                .filter(|a| schema.iter().any(|s| s == Self::bare_name(a)))
                .map(|a| Self::bare_name(a).to_string())
                .collect(),
        )
    }

    /// The part of an attribute name after its last `.`, or the whole name
    /// if unqualified.
    pub fn bare_name(attr: &str) -> &str {
        attr.rsplit('.').next().unwrap_or(attr)
    }
}

impl fmt::Display for AttributeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(&ATTR_LIST_SEPARATOR.to_string()))
    }
}

/// A table name referenced by an operand token.
pub type TableName = String;

/// A single tagged token in the postfix IR stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlgebraToken {
    Operator(OpKind),
    Operand(TableName),
    Attributes(AttributeSet),
    Condition(PostfixExpr),
}

impl AlgebraToken {
    pub fn as_operator(&self) -> Option<OpKind> {
        match self {
            AlgebraToken::Operator(op) => Some(*op),
            _ => None,
        }
    }

    pub fn as_operand(&self) -> Option<&str> {
        match self {
            AlgebraToken::Operand(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_attributes(&self) -> Option<&AttributeSet> {
        match self {
            AlgebraToken::Attributes(attrs) => Some(attrs),
            _ => None,
        }
    }

    pub fn as_condition(&self) -> Option<&PostfixExpr> {
        match self {
            AlgebraToken::Condition(cond) => Some(cond),
            _ => None,
        }
    }
}
