//! SQLite persistence for activities and category usage. Every
//! multi-statement mutation runs inside a transaction so a mid-operation
//! failure leaves prior state untouched.

pub mod entities;
pub mod migrations;

use std::path::Path;

use chrono::NaiveDateTime;
use rusqlite::{Connection, OptionalExtension, types::ValueRef};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{Result, TrackError};

use entities::{ActivitySnapshot, CategorySummary, format_timestamp, parse_timestamp};

pub struct ActivityStore {
    conn: Connection,
}

impl ActivityStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        migrations::run(&conn)?;
        Ok(Self { conn })
    }

    /// Inserts a new open row and returns its id. The caller is responsible
    /// for checking that no other activity is running first.
    pub fn begin_activity(&mut self, name: &str, start: NaiveDateTime) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO activities (name, start_time) VALUES (?1, ?2)",
            (name, format_timestamp(start)),
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Closes the row created by [Self::begin_activity] and counts one use
    /// of its category, atomically. Must be called at most once per id.
    pub fn complete_activity(
        &mut self,
        id: i64,
        end: NaiveDateTime,
        duration_secs: i64,
        category: &str,
    ) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "UPDATE activities SET end_time = ?1, duration = ?2, category = ?3 WHERE id = ?4",
            (format_timestamp(end), duration_secs, category, id),
        )?;
        tx.execute(
            "INSERT INTO categories (name, count) VALUES (?1, 1)
             ON CONFLICT(name) DO UPDATE SET count = count + 1",
            [category],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Whether the given id still refers to a row without an end time. Used
    /// to detect session tokens that outlived their row.
    pub fn has_open_activity(&self, id: i64) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM activities WHERE id = ?1 AND end_time IS NULL",
                [id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Existing vocabulary, most used first, for biasing the oracle toward
    /// reuse over proliferation.
    pub fn category_names_by_usage(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM categories ORDER BY count DESC")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }

    pub fn list_categories(&self) -> Result<Vec<CategorySummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.name,
                    c.count AS usage_count,
                    COUNT(a.id) AS activity_count,
                    COALESCE(SUM(a.duration), 0) AS total_duration
             FROM categories c
             LEFT JOIN activities a ON a.category = c.name
             GROUP BY c.name
             ORDER BY c.count DESC",
        )?;
        let summaries = stmt
            .query_map([], |row| {
                Ok(CategorySummary {
                    name: row.get(0)?,
                    usage_count: row.get(1)?,
                    activity_count: row.get(2)?,
                    total_duration: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(summaries)
    }

    /// Renames a category across both tables atomically. Returns false and
    /// leaves state unchanged when the transaction fails, e.g. when the
    /// destination name collides with an existing categories row.
    ///
    /// Note that when `old` has no categories row, activity rows labeled
    /// `old` are still relabeled to `new` and the call reports success.
    pub fn rename_category(&mut self, old: &str, new: &str) -> Result<bool> {
        let tx = self.conn.transaction()?;
        let result = (|| -> rusqlite::Result<()> {
            tx.execute(
                "UPDATE activities SET category = ?1 WHERE category = ?2",
                (new, old),
            )?;
            tx.execute(
                "UPDATE categories SET name = ?1 WHERE name = ?2",
                (new, old),
            )?;
            Ok(())
        })();
        match result {
            Ok(()) => {
                tx.commit()?;
                Ok(true)
            }
            Err(e) => {
                warn!("Error renaming category: {e}");
                tx.rollback()?;
                Ok(false)
            }
        }
    }

    /// Reassigns every activity under `from` to `into`, folds the usage
    /// count into `into`, and deletes `from`. The whole operation is one
    /// transaction.
    pub fn merge_category(&mut self, from: &str, into: &str) -> Result<bool> {
        let tx = self.conn.transaction()?;
        let from_count: Option<i64> = tx
            .query_row("SELECT count FROM categories WHERE name = ?1", [from], |row| {
                row.get(0)
            })
            .optional()?;
        let Some(from_count) = from_count else {
            return Err(TrackError::NotFound(from.to_string()));
        };
        let result = (|| -> rusqlite::Result<()> {
            tx.execute(
                "UPDATE activities SET category = ?1 WHERE category = ?2",
                (into, from),
            )?;
            tx.execute(
                "UPDATE categories SET count = count + ?1 WHERE name = ?2",
                (from_count, into),
            )?;
            tx.execute("DELETE FROM categories WHERE name = ?1", [from])?;
            Ok(())
        })();
        match result {
            Ok(()) => {
                tx.commit()?;
                Ok(true)
            }
            Err(e) => {
                warn!("Error merging categories: {e}");
                tx.rollback()?;
                Ok(false)
            }
        }
    }

    pub fn activities_in_category(&self, name: &str) -> Result<Vec<ActivitySnapshot>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, start_time, duration, end_time
             FROM activities
             WHERE category = ?1
             ORDER BY start_time DESC",
        )?;
        let snapshots = stmt
            .query_map([name], |row| {
                let start: String = row.get(1)?;
                let end: Option<String> = row.get(3)?;
                Ok(ActivitySnapshot {
                    name: row.get(0)?,
                    start_time: parse_timestamp(&start).unwrap_or(NaiveDateTime::MIN),
                    end_time: end.as_deref().and_then(parse_timestamp),
                    duration: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(snapshots)
    }

    /// Runs arbitrary SQL inside a transaction that is always rolled back,
    /// so oracle-generated text can never mutate stored data no matter what
    /// it says. Rows come back as column-name-to-value maps.
    pub fn execute_readonly(&mut self, sql: &str) -> Result<Vec<Map<String, Value>>> {
        let tx = self.conn.transaction()?;
        let rows = {
            let mut stmt = tx.prepare(sql)?;
            let columns: Vec<String> = stmt
                .column_names()
                .into_iter()
                .map(|name| name.to_string())
                .collect();
            let mut rows = stmt.query([])?;
            let mut collected = Vec::new();
            while let Some(row) = rows.next()? {
                let mut record = Map::new();
                for (index, column) in columns.iter().enumerate() {
                    record.insert(column.clone(), json_value(row.get_ref(index)?));
                }
                collected.push(record);
            }
            collected
        };
        tx.rollback()?;
        Ok(rows)
    }
}

fn json_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::from(v),
        ValueRef::Real(v) => serde_json::Number::from_f64(v)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(v) => Value::from(String::from_utf8_lossy(v).into_owned()),
        ValueRef::Blob(_) => Value::Null,
    }
}
