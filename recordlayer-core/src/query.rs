//! Typed queries over a record's JSON field view.
//!
//! A [`Query`] pairs an optional [`Expr`] with an ordered list of [`SortField`]s. Field names
//! address the record as it serializes with `serde_json`; dotted names (`"owner.name"`) reach
//! into nested objects. Paging is kept out of the query and passed alongside it as
//! [`PagingParams`](crate::page::PagingParams), so the same query can drive a count, a full
//! list or any page of the result.
//!
//! ```ignore
//! use recordlayer_core::query::{Filter, Query, SortDirection};
//!
//! let drafts_by_key = Query::builder()
//!     .filter(Filter::starts_with("content", "Draft").and(Filter::exists("key")))
//!     .sort("key", SortDirection::Asc)
//!     .build();
//! ```
//!
//! Expressions are plain data. Stores evaluate them through a [`QueryVisitor`].

use serde_json::Value;

use crate::error::PersistenceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// One sort key. Earlier keys in a query take precedence over later ones.
#[derive(Debug, Clone, PartialEq)]
pub struct SortField {
    pub field: String,
    pub direction: SortDirection,
}

impl SortField {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self { field: field.into(), direction }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Desc)
    }
}

/// How a field value is compared with the operand of an [`Expr::Field`].
///
/// Ordering operators only hold between two numbers, two strings or two booleans.
/// `Contains` looks for a substring in a string field or an element in an array field.
/// `AnyOf`/`NoneOf` take an array operand; an array field matches `AnyOf` when the two
/// arrays share an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    AnyOf,
    NoneOf,
}

/// A boolean predicate over a record's fields.
///
/// An empty `And` matches every record and an empty `Or` matches none.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
    /// `Exists(field, true)` holds when the field is present and not `null`.
    Exists(String, bool),
    Field {
        field: String,
        op: FieldOp,
        value: Value,
    },
}

impl Expr {
    /// Builds a field comparison.
    pub fn compare(field: impl Into<String>, op: FieldOp, value: impl Into<Value>) -> Self {
        Expr::Field { field: field.into(), op, value: value.into() }
    }

    /// Conjunction with `other`; chained calls extend one flat `And`.
    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut terms) => {
                terms.push(other);
                Expr::And(terms)
            }
            single => Expr::And(vec![single, other]),
        }
    }

    /// Disjunction with `other`; chained calls extend one flat `Or`.
    pub fn or(self, other: Expr) -> Self {
        match self {
            Expr::Or(mut terms) => {
                terms.push(other);
                Expr::Or(terms)
            }
            single => Expr::Or(vec![single, other]),
        }
    }

    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }
}

/// A filter plus sort keys. The default query matches everything and keeps store order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Option<Expr>,
    pub sort: Vec<SortField>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }
}

/// Shorthand constructors for [`Expr`].
///
/// Operands accept anything convertible into a JSON value, so
/// `Filter::any_of("tags", vec!["red", "blue"])` and `Filter::gt("rank", 3)` both work.
pub struct Filter;

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::compare(field, FieldOp::Eq, value)
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::compare(field, FieldOp::Ne, value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::compare(field, FieldOp::Gt, value)
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::compare(field, FieldOp::Gte, value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::compare(field, FieldOp::Lt, value)
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::compare(field, FieldOp::Lte, value)
    }

    pub fn starts_with(field: impl Into<String>, prefix: impl Into<Value>) -> Expr {
        Expr::compare(field, FieldOp::StartsWith, prefix)
    }

    pub fn ends_with(field: impl Into<String>, suffix: impl Into<Value>) -> Expr {
        Expr::compare(field, FieldOp::EndsWith, suffix)
    }

    pub fn contains(field: impl Into<String>, needle: impl Into<Value>) -> Expr {
        Expr::compare(field, FieldOp::Contains, needle)
    }

    pub fn not_contains(field: impl Into<String>, needle: impl Into<Value>) -> Expr {
        Expr::compare(field, FieldOp::NotContains, needle)
    }

    pub fn any_of(field: impl Into<String>, values: impl Into<Value>) -> Expr {
        Expr::compare(field, FieldOp::AnyOf, values)
    }

    pub fn none_of(field: impl Into<String>, values: impl Into<Value>) -> Expr {
        Expr::compare(field, FieldOp::NoneOf, values)
    }

    pub fn exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), true)
    }

    /// Matches records where the field is missing or `null`.
    pub fn not_exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), false)
    }

    pub fn and(terms: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::And(terms.into_iter().collect())
    }

    pub fn or(terms: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::Or(terms.into_iter().collect())
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the filter.
    pub fn filter(mut self, filter: Expr) -> Self {
        self.query.filter = Some(filter);
        self
    }

    /// Appends a sort key after the ones already present.
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.query.sort.push(SortField::new(field, direction));
        self
    }

    pub fn build(self) -> Query {
        self.query
    }
}

/// Walks an [`Expr`] tree.
///
/// Implementors handle each node kind; [`QueryVisitor::visit_expr`] routes a node to the
/// matching method. Combinator methods are responsible for recursing into their children.
pub trait QueryVisitor {
    type Output;
    type Error: Into<PersistenceError>;

    fn visit_and(&mut self, terms: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_or(&mut self, terms: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_not(&mut self, inner: &Expr) -> Result<Self::Output, Self::Error>;
    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error>;
    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Value) -> Result<Self::Output, Self::Error>;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        match expr {
            Expr::And(terms) => self.visit_and(terms),
            Expr::Or(terms) => self.visit_or(terms),
            Expr::Not(inner) => self.visit_not(inner),
            Expr::Exists(field, should_exist) => self.visit_exists(field, *should_exist),
            Expr::Field { field, op, value } => self.visit_field(field, op, value),
        }
    }
}
