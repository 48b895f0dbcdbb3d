//! Batch loading for manual joins
//!
//! The datastore is queried one table at a time, so related rows are
//! fetched with a single `in.(...)` query per table and merged in memory.

use serde::de::DeserializeOwned;
use std::collections::{BTreeSet, HashMap};

use crate::models::{Theme, User};
use crate::rest::{RestClient, RestError};

/// A row that can be looked up by key
pub trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for Theme {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for User {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Distinct, non-empty ids in sorted order
pub fn distinct_ids<'a, I>(ids: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    ids.into_iter()
        .filter(|id| !id.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Load rows of `table` whose `column` is one of `ids`, keyed by [`Keyed::key`]
///
/// An empty id list returns an empty map without a request.
pub async fn load_by_ids<T>(
    client: &RestClient,
    table: &str,
    column: &str,
    ids: &[String],
) -> Result<HashMap<String, T>, RestError>
where
    T: Keyed + DeserializeOwned,
{
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let query = client.from(table).in_list(column, ids.iter().cloned());
    let rows: Vec<T> = client.execute(&query).await.rows()?;

    Ok(rows
        .into_iter()
        .map(|row| (row.key().to_string(), row))
        .collect())
}
