//! Turns a natural-language question into SQL via the oracle, validates the
//! candidate through the rollback-only execution path, and allows the oracle
//! exactly one correction before giving up.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{error::Result, oracle::Oracle};

use super::store::ActivityStore;

/// Illustrative query shapes included in every prompt. They are not binding;
/// they nudge the oracle toward patterns that work against our schema.
const EXAMPLE_TEMPLATES: &str = "\
-- Shows totals for a time period
SELECT category, SUM(duration) AS total_duration
FROM activities
WHERE date(start_time) = date('now', '-1 day', 'localtime')
GROUP BY category;

-- Compares two time periods
SELECT category,
    SUM(CASE WHEN date(start_time) = date('now', 'localtime') THEN duration ELSE 0 END) AS today,
    SUM(CASE WHEN date(start_time) = date('now', '-1 day', 'localtime') THEN duration ELSE 0 END) AS yesterday
FROM activities
GROUP BY category;

-- Lists activities with times
SELECT name, start_time, duration, category
FROM activities
WHERE date(start_time) >= date('now', '-7 days', 'localtime')
ORDER BY start_time DESC;";

const SCHEMA_DESCRIPTION: &str = "\
CREATE TABLE activities (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    start_time TIMESTAMP NOT NULL,
    end_time TIMESTAMP,
    duration INTEGER,
    category TEXT
);";

/// Answers `question` with rows from the store. Translation failures beyond
/// the single correction degrade to an empty result; this is a best-effort
/// feature, not a critical path. Oracle failures still propagate.
pub async fn answer(
    store: &mut ActivityStore,
    oracle: &dyn Oracle,
    question: &str,
) -> Result<Vec<Map<String, Value>>> {
    let mut sql = oracle
        .query(&translation_prompt(question))
        .await?
        .trim()
        .to_string();
    debug!("Generated SQL: {sql}");

    // Validation run. Both validation and the final execution go through the
    // rollback-only path, so the generated text can never mutate the store.
    if let Err(e) = store.execute_readonly(&sql) {
        debug!("SQL error: {e}");
        sql = oracle
            .query(&correction_prompt(&sql, &e.to_string()))
            .await?
            .trim()
            .to_string();
        debug!("Corrected SQL: {sql}");
    }

    match store.execute_readonly(&sql) {
        Ok(rows) => Ok(rows),
        Err(e) => {
            warn!("Error executing generated query: {e}");
            Ok(Vec::new())
        }
    }
}

fn translation_prompt(question: &str) -> String {
    format!(
        "Given this natural language query: \"{question}\"\n\n\
         Here are some example query patterns (but feel free to modify or write your own):\n\
         {EXAMPLE_TEMPLATES}\n\n\
         Database schema:\n\
         {SCHEMA_DESCRIPTION}\n\n\
         Write a SQL query that best answers the user's question.\n\
         Respond with just the SQL query, nothing else."
    )
}

fn correction_prompt(failed_sql: &str, error: &str) -> String {
    format!(
        "The SQL query:\n\
         {failed_sql}\n\
         Failed with error: {error}\n\n\
         Here are valid example patterns:\n\
         {EXAMPLE_TEMPLATES}\n\n\
         Please provide a corrected SQL query that will work."
    )
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
    use tempfile::tempdir;

    use crate::oracle::MockOracle;

    use super::*;

    const TEST_START: NaiveDateTime =
        NaiveDateTime::new(NaiveDate::from_ymd_opt(2018, 7, 4).unwrap(), NaiveTime::MIN);

    fn seeded_store(dir: &std::path::Path) -> ActivityStore {
        let mut store = ActivityStore::open(&dir.join("activities.db")).unwrap();
        let id = store.begin_activity("emails", TEST_START).unwrap();
        store
            .complete_activity(id, TEST_START + Duration::seconds(60), 60, "Work")
            .unwrap();
        store
    }

    #[tokio::test]
    async fn valid_first_candidate_needs_no_correction() -> Result<()> {
        let dir = tempdir()?;
        let mut store = seeded_store(dir.path());

        let mut oracle = MockOracle::new();
        oracle
            .expect_query()
            .withf(|prompt| prompt.contains("how long did I work"))
            .returning(|_| {
                Ok("SELECT category, SUM(duration) AS total_duration \
                    FROM activities GROUP BY category"
                    .into())
            })
            .times(1);

        let rows = answer(&mut store, &oracle, "how long did I work").await?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["category"], serde_json::json!("Work"));
        assert_eq!(rows[0]["total_duration"], serde_json::json!(60));
        Ok(())
    }

    #[tokio::test]
    async fn invalid_candidate_gets_exactly_one_correction() -> Result<()> {
        let dir = tempdir()?;
        let mut store = seeded_store(dir.path());

        let mut oracle = MockOracle::new();
        let mut sequence = mockall::Sequence::new();
        oracle
            .expect_query()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok("SELECT nope FROM nothing".into()));
        oracle
            .expect_query()
            .withf(|prompt| {
                prompt.contains("SELECT nope FROM nothing") && prompt.contains("Failed with error")
            })
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok("SELECT name FROM activities".into()));

        let rows = answer(&mut store, &oracle, "what did I do").await?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], serde_json::json!("emails"));
        Ok(())
    }

    #[tokio::test]
    async fn failing_correction_degrades_to_no_rows() -> Result<()> {
        let dir = tempdir()?;
        let mut store = seeded_store(dir.path());

        let mut oracle = MockOracle::new();
        // Two calls total, never a third: the correction is one-shot.
        oracle
            .expect_query()
            .times(2)
            .returning(|_| Ok("DROP TABLE missing_table".into()));

        let rows = answer(&mut store, &oracle, "what did I do").await?;
        assert!(rows.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn mutating_candidates_leave_the_store_unchanged() -> Result<()> {
        let dir = tempdir()?;
        let mut store = seeded_store(dir.path());

        let mut oracle = MockOracle::new();
        oracle
            .expect_query()
            .returning(|_| Ok("DELETE FROM activities".into()));

        let rows = answer(&mut store, &oracle, "forget everything").await?;
        assert!(rows.is_empty());

        let remaining = store.execute_readonly("SELECT COUNT(*) AS n FROM activities")?;
        assert_eq!(remaining[0]["n"], serde_json::json!(1));
        Ok(())
    }

    #[tokio::test]
    async fn oracle_failure_propagates() -> Result<()> {
        let dir = tempdir()?;
        let mut store = seeded_store(dir.path());

        let mut oracle = MockOracle::new();
        oracle.expect_query().returning(|_| {
            Err(crate::error::TrackError::Oracle {
                attempts: 3,
                message: "connection refused".into(),
            })
        });

        let result = answer(&mut store, &oracle, "what did I do").await;
        assert!(result.is_err());
        Ok(())
    }
}
