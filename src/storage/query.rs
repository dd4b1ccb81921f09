//! Query building blocks shared by the repositories
//!
//! Criteria are a conjunction of `(field, operator)` predicates evaluated
//! against any row type implementing [`Filterable`]. Pagination follows the
//! usual 1-indexed page/per-page contract and reports the total row count.

use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Ordering;

use crate::models::Money;

/// A single column value, used for comparisons and sorting
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Value {
    Id(u64),
    Int(i64),
    Text(String),
    Date(NaiveDate),
    Money(Money),
}

impl Value {
    /// Text form used by LIKE matching
    pub fn to_text(&self) -> String {
        match self {
            Value::Id(id) => id.to_string(),
            Value::Int(n) => n.to_string(),
            Value::Text(s) => s.clone(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::Money(m) => m.to_string(),
        }
    }
}

impl From<NaiveDate> for Value {
    fn from(date: NaiveDate) -> Self {
        Value::Date(date)
    }
}

impl From<Money> for Value {
    fn from(amount: Money) -> Self {
        Value::Money(amount)
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

/// Rows that can be filtered and sorted by column
pub trait Filterable {
    type Field: Copy;

    fn field_value(&self, field: Self::Field) -> Value;
}

/// Comparison operators
#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    /// Equal to the value
    Eq(Value),
    /// SQL LIKE pattern over the text form: `%` any run, `_` one character,
    /// `\` escapes. Case-sensitive.
    Like(String),
    /// Inclusive range
    Between(Value, Value),
    /// Greater than or equal
    Gte(Value),
    /// Less than or equal
    Lte(Value),
    /// Not any of the values. An empty list matches nothing.
    NotIn(Vec<Value>),
}

impl Operator {
    fn matches(&self, value: &Value) -> bool {
        match self {
            Operator::Eq(expected) => value == expected,
            Operator::Like(pattern) => like_match(pattern, &value.to_text()),
            Operator::Between(low, high) => value >= low && value <= high,
            Operator::Gte(low) => value >= low,
            Operator::Lte(high) => value <= high,
            Operator::NotIn(values) => !values.is_empty() && !values.contains(value),
        }
    }
}

/// One predicate of a criteria conjunction
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate<F> {
    pub field: F,
    pub op: Operator,
}

/// A conjunction of predicates; the empty criteria matches every row
#[derive(Debug, Clone, PartialEq)]
pub struct Criteria<F> {
    predicates: Vec<Predicate<F>>,
}

impl<F> Default for Criteria<F> {
    fn default() -> Self {
        Self {
            predicates: Vec::new(),
        }
    }
}

impl<F: Copy> Criteria<F> {
    /// Criteria matching every row
    pub fn all() -> Self {
        Self::default()
    }

    /// Add a predicate
    pub fn with(mut self, field: F, op: Operator) -> Self {
        self.predicates.push(Predicate { field, op });
        self
    }

    pub fn eq(self, field: F, value: impl Into<Value>) -> Self {
        self.with(field, Operator::Eq(value.into()))
    }

    pub fn like(self, field: F, pattern: impl Into<String>) -> Self {
        self.with(field, Operator::Like(pattern.into()))
    }

    /// Substring match; wildcard characters in `text` are taken literally
    pub fn contains(self, field: F, text: &str) -> Self {
        self.with(field, Operator::Like(format!("%{}%", escape_like(text))))
    }

    pub fn between(self, field: F, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        self.with(field, Operator::Between(low.into(), high.into()))
    }

    pub fn gte(self, field: F, value: impl Into<Value>) -> Self {
        self.with(field, Operator::Gte(value.into()))
    }

    pub fn lte(self, field: F, value: impl Into<Value>) -> Self {
        self.with(field, Operator::Lte(value.into()))
    }

    pub fn not_in(self, field: F, values: Vec<Value>) -> Self {
        self.with(field, Operator::NotIn(values))
    }

    /// The predicates, in insertion order
    pub fn predicates(&self) -> &[Predicate<F>] {
        &self.predicates
    }

    /// Check a row against every predicate
    pub fn matches<R>(&self, row: &R) -> bool
    where
        R: Filterable<Field = F>,
    {
        self.predicates
            .iter()
            .all(|p| p.op.matches(&row.field_value(p.field)))
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Requested ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort<F> {
    pub field: F,
    pub direction: Direction,
}

impl<F: Copy> Sort<F> {
    pub fn asc(field: F) -> Self {
        Self {
            field,
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: F) -> Self {
        Self {
            field,
            direction: Direction::Desc,
        }
    }

    /// Compare two rows by this sort
    pub fn compare<R>(&self, a: &R, b: &R) -> Ordering
    where
        R: Filterable<Field = F>,
    {
        let ordering = a.field_value(self.field).cmp(&b.field_value(self.field));
        match self.direction {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        }
    }
}

/// Page request, 1-indexed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: usize,
    per_page: usize,
}

impl Pagination {
    /// Page 0 is read as page 1 and a page size of 0 as 1
    pub fn new(page: usize, per_page: usize) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    /// The first `per_page` rows
    pub fn first(per_page: usize) -> Self {
        Self::new(1, per_page)
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    /// Number of rows skipped before this page
    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.per_page)
    }

    /// Cut this page out of a fully filtered and ordered row set
    pub fn apply<T>(&self, rows: Vec<T>) -> Paginated<T> {
        let total = rows.len();
        let items = rows
            .into_iter()
            .skip(self.offset())
            .take(self.per_page)
            .collect();
        Paginated::new(items, total, *self)
    }
}

/// One page of results with the metadata a client needs to page further
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub per_page: usize,
    pub current_page: usize,
    pub last_page: usize,
}

impl<T> Paginated<T> {
    fn new(items: Vec<T>, total: usize, page: Pagination) -> Self {
        Self {
            items,
            total,
            per_page: page.per_page,
            current_page: page.page,
            last_page: total.div_ceil(page.per_page).max(1),
        }
    }

    /// Transform the items, keeping the page metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            per_page: self.per_page,
            current_page: self.current_page,
            last_page: self.last_page,
        }
    }

    /// True when there is a page after this one
    pub fn has_more(&self) -> bool {
        self.current_page < self.last_page
    }
}

/// Escape LIKE wildcards so `text` matches literally
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    AnyRun,
    AnyOne,
    Literal(char),
}

fn tokenize(pattern: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        tokens.push(match c {
            '%' => Token::AnyRun,
            '_' => Token::AnyOne,
            // A trailing backslash matches itself
            '\\' => Token::Literal(chars.next().unwrap_or('\\')),
            other => Token::Literal(other),
        });
    }
    tokens
}

/// SQL LIKE matching with backtracking over the last `%`
pub fn like_match(pattern: &str, text: &str) -> bool {
    let tokens = tokenize(pattern);
    let text: Vec<char> = text.chars().collect();

    let (mut t, mut p) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match tokens.get(p) {
            Some(Token::AnyOne) => {
                t += 1;
                p += 1;
            }
            Some(Token::Literal(c)) if *c == text[t] => {
                t += 1;
                p += 1;
            }
            Some(Token::AnyRun) => {
                backtrack = Some((p, t));
                p += 1;
            }
            _ => match backtrack {
                Some((star, consumed)) => {
                    p = star + 1;
                    t = consumed + 1;
                    backtrack = Some((star, consumed + 1));
                }
                None => return false,
            },
        }
    }

    tokens[p..].iter().all(|token| *token == Token::AnyRun)
}
