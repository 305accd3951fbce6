use chrono::{DateTime, TimeZone, Utc};
use sqlx::{
    Row, Sqlite, SqliteConnection,
    query::Query,
    sqlite::{SqliteArguments, SqliteRow},
};

use crate::db::error::{DbError, DbResult};

/// Placeholder expanded into a `?, ?, ...` list by the chunked helpers.
pub const IDS_PLACEHOLDER: &str = "{ids}";

/// Host parameter limit of older SQLite builds.
pub const MAX_BOUND_PARAMETERS: usize = 999;

/// Number of ids per partition so that a statement repeating the id list
/// `occurrences` times after `leading` values stays under the parameter limit.
pub fn partition_size(occurrences: usize, leading: usize) -> usize {
    (MAX_BOUND_PARAMETERS.saturating_sub(leading) / occurrences.max(1)).max(1)
}

/// Convert a timestamp to the epoch milliseconds stored in the schema
pub fn to_millis(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

/// Convert stored epoch milliseconds back to a timestamp
pub fn from_millis(ms: i64) -> DbResult<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| DbError::Internal(format!("Invalid timestamp in database: {}", ms)))
}

/// Replace every `{ids}` in `sql` with a list of `count` placeholders.
pub fn expand_ids(sql: &str, count: usize) -> String {
    let placeholders = vec!["?"; count].join(", ");
    sql.replace(IDS_PLACEHOLDER, &placeholders)
}

/// A statement with `{ids}` placeholders, split into partitions of `ids`.
///
/// `leading` values are bound before the id list on every partition, and the
/// id list is bound once per `{ids}` occurrence.
struct ChunkedStatement<'a> {
    sql: &'a str,
    leading: &'a [i64],
    ids: &'a [String],
    occurrences: usize,
}

impl<'a> ChunkedStatement<'a> {
    fn new(sql: &'a str, leading: &'a [i64], ids: &'a [String]) -> Self {
        Self {
            sql,
            leading,
            ids,
            occurrences: sql.matches(IDS_PLACEHOLDER).count(),
        }
    }

    /// Expanded SQL of each partition with the ids it binds. Empty `ids`
    /// yield no partition.
    fn partitions(&self) -> Vec<(String, &'a [String])> {
        self.ids
            .chunks(partition_size(self.occurrences, self.leading.len()))
            .map(|chunk| (expand_ids(self.sql, chunk.len()), chunk))
            .collect()
    }

    fn bind<'q>(
        &self,
        sql: &'q str,
        chunk: &'q [String],
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        let mut query = sqlx::query(sql);
        for value in self.leading {
            query = query.bind(*value);
        }
        for _ in 0..self.occurrences {
            for id in chunk {
                query = query.bind(id.as_str());
            }
        }
        query
    }
}

/// Run a set-based statement over `ids`, partitioned to respect parameter limits.
///
/// Returns the total rows affected.
pub async fn execute_chunked(
    conn: &mut SqliteConnection,
    sql: &str,
    leading: &[i64],
    ids: &[String],
) -> DbResult<u64> {
    let statement = ChunkedStatement::new(sql, leading, ids);
    let mut total = 0;
    for (expanded, chunk) in statement.partitions() {
        total += statement
            .bind(&expanded, chunk)
            .execute(&mut *conn)
            .await?
            .rows_affected();
    }
    Ok(total)
}

/// Fetch full rows for every partition of `ids` and concatenate the results.
pub async fn fetch_rows_chunked(
    conn: &mut SqliteConnection,
    sql: &str,
    leading: &[i64],
    ids: &[String],
) -> DbResult<Vec<SqliteRow>> {
    let statement = ChunkedStatement::new(sql, leading, ids);
    let mut rows = Vec::new();
    for (expanded, chunk) in statement.partitions() {
        rows.extend(statement.bind(&expanded, chunk).fetch_all(&mut *conn).await?);
    }
    Ok(rows)
}

/// Fetch the first column of every partition of `ids` as strings.
pub async fn fetch_strings_chunked(
    conn: &mut SqliteConnection,
    sql: &str,
    leading: &[i64],
    ids: &[String],
) -> DbResult<Vec<String>> {
    let rows = fetch_rows_chunked(conn, sql, leading, ids).await?;
    rows.iter()
        .map(|row| row.try_get::<String, _>(0).map_err(DbError::from))
        .collect()
}
