//! Immutable request descriptors for PostgREST tables
//!
//! A [`Query`] is built by chaining consuming builder methods and then handed
//! to [`RestClient::execute`](super::RestClient::execute). Nothing is sent
//! until then, and a built query can be executed any number of times.
//!
//! ```
//! use whisperchain::rest::Query;
//!
//! let query = Query::from_table("whispers")
//!     .select("*")
//!     .eq("is_published", true)
//!     .eq("theme_id", None::<String>) // skipped
//!     .order("likes_count", false)
//!     .limit(50);
//!
//! assert_eq!(
//!     query.to_query_string(),
//!     "select=%2A&is_published=eq.true&order=likes_count.desc&limit=50"
//! );
//! ```

use serde_json::Value;

/// HTTP verb a query executes with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

/// PostgREST filter operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    Ilike,
    Is,
    In,
    Contains,
}

impl FilterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Neq => "neq",
            FilterOp::Gt => "gt",
            FilterOp::Gte => "gte",
            FilterOp::Lt => "lt",
            FilterOp::Lte => "lte",
            FilterOp::Like => "like",
            FilterOp::Ilike => "ilike",
            FilterOp::Is => "is",
            FilterOp::In => "in",
            FilterOp::Contains => "cs",
        }
    }
}

/// One `column=op.value` clause
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    /// Render the right-hand side of the clause, e.g. `eq.42` or `in.(a,b)`
    pub fn render(&self) -> String {
        let value = match self.op {
            FilterOp::In => match &self.value {
                Value::Array(items) => format!(
                    "({})",
                    items.iter().map(render_list_item).collect::<Vec<_>>().join(",")
                ),
                other => format!("({})", render_list_item(other)),
            },
            FilterOp::Contains => match &self.value {
                Value::Array(items) => format!(
                    "{{{}}}",
                    items.iter().map(render_list_item).collect::<Vec<_>>().join(",")
                ),
                other => other.to_string(),
            },
            _ => render_scalar(&self.value),
        };
        format!("{}.{}", self.op.as_str(), value)
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// Reserved characters inside list syntax need double quotes.
fn render_list_item(value: &Value) -> String {
    let raw = render_scalar(value);
    if raw.contains([',', '(', ')', '{', '}', '"', ' ']) {
        format!("\"{}\"", raw.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        raw
    }
}

/// Sort clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// How many rows the caller expects back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Many,
    /// Exactly one row; zero rows still yields `data: None` without an error
    Single,
    MaybeSingle,
}

/// What the query does once executed
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Select,
    Insert(Value),
    Upsert {
        values: Value,
        on_conflict: Option<String>,
    },
    Update(Value),
    Delete,
}

/// A complete, immutable description of one table request
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: String,
    pub columns: String,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub cardinality: Cardinality,
    pub operation: Operation,
}

impl Query {
    /// Start a select over all columns of `table`
    pub fn from_table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: "*".to_string(),
            filters: Vec::new(),
            order: None,
            limit: None,
            offset: None,
            cardinality: Cardinality::Many,
            operation: Operation::Select,
        }
    }

    /// Set the column projection (builder pattern)
    pub fn select(mut self, columns: impl Into<String>) -> Self {
        self.columns = columns.into();
        self
    }

    /// Append a filter clause
    ///
    /// A JSON `null` value, including `None`, adds nothing.
    pub fn filter(mut self, column: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        let value = value.into();
        if !value.is_null() {
            self.filters.push(Filter {
                column: column.into(),
                op,
                value,
            });
        }
        self
    }

    pub fn eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Eq, value)
    }

    pub fn neq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Neq, value)
    }

    pub fn gt(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Gt, value)
    }

    pub fn gte(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Gte, value)
    }

    pub fn lt(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Lt, value)
    }

    pub fn lte(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Lte, value)
    }

    pub fn like(self, column: impl Into<String>, pattern: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Like, pattern)
    }

    pub fn ilike(self, column: impl Into<String>, pattern: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Ilike, pattern)
    }

    /// `IS` comparison; pass `true`, `false` or `"null"`
    pub fn is(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Is, value)
    }

    /// `IN (...)` over the given values
    pub fn in_list<I, V>(self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.filter(column, FilterOp::In, Value::Array(values))
    }

    pub fn contains(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Contains, value)
    }

    /// Set the sort clause; a later call replaces an earlier one
    pub fn order(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.into(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, count: usize) -> Self {
        self.limit = Some(count);
        self
    }

    /// Restrict to rows `from..=to` (zero-based, inclusive)
    pub fn range(mut self, from: usize, to: usize) -> Self {
        self.offset = Some(from);
        self.limit = Some(to.saturating_sub(from) + 1);
        self
    }

    pub fn single(mut self) -> Self {
        self.cardinality = Cardinality::Single;
        self
    }

    pub fn maybe_single(mut self) -> Self {
        self.cardinality = Cardinality::MaybeSingle;
        self
    }

    /// Insert one row (JSON object) or many rows (JSON array)
    pub fn insert(mut self, values: impl Into<Value>) -> Self {
        self.operation = Operation::Insert(values.into());
        self
    }

    /// Insert, merging into existing rows that collide on `on_conflict`
    pub fn upsert(mut self, values: impl Into<Value>, on_conflict: Option<&str>) -> Self {
        self.operation = Operation::Upsert {
            values: values.into(),
            on_conflict: on_conflict.map(str::to_string),
        };
        self
    }

    /// Patch every row matched by the filters
    pub fn update(mut self, values: impl Into<Value>) -> Self {
        self.operation = Operation::Update(values.into());
        self
    }

    /// Delete every row matched by the filters
    pub fn delete(mut self) -> Self {
        self.operation = Operation::Delete;
        self
    }

    pub fn method(&self) -> Method {
        match self.operation {
            Operation::Select => Method::Get,
            Operation::Insert(_) | Operation::Upsert { .. } => Method::Post,
            Operation::Update(_) => Method::Patch,
            Operation::Delete => Method::Delete,
        }
    }

    /// JSON body sent with the request, if any
    pub fn body(&self) -> Option<&Value> {
        match &self.operation {
            Operation::Insert(values) | Operation::Update(values) => Some(values),
            Operation::Upsert { values, .. } => Some(values),
            Operation::Select | Operation::Delete => None,
        }
    }

    /// True when a single object was inserted, so the reply should be an object
    pub fn is_single_row_write(&self) -> bool {
        matches!(
            &self.operation,
            Operation::Insert(Value::Object(_)) | Operation::Upsert { values: Value::Object(_), .. }
        )
    }

    /// Unencoded query parameters in the order they are sent
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), self.columns.clone())];

        for filter in &self.filters {
            pairs.push((filter.column.clone(), filter.render()));
        }

        if let Some(order) = &self.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            pairs.push(("order".to_string(), format!("{}.{}", order.column, direction)));
        }

        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }

        if let Some(offset) = self.offset {
            pairs.push(("offset".to_string(), offset.to_string()));
        }

        if let Operation::Upsert {
            on_conflict: Some(columns),
            ..
        } = &self.operation
        {
            pairs.push(("on_conflict".to_string(), columns.clone()));
        }

        pairs
    }

    /// Percent-encoded query string (without the leading `?`)
    pub fn to_query_string(&self) -> String {
        self.to_query_pairs()
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}
