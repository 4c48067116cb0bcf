//! Core of the tool: ties the durable store, the session token, and the
//! oracle-backed categorizer/translator together behind one object the
//! command layer drives.

pub mod categorizer;
pub mod session;
pub mod store;
pub mod translator;

use chrono::Local;
use serde_json::{Map, Value};
use tracing::warn;

use crate::{
    config::AppContext,
    error::{Result, TrackError},
    oracle::Oracle,
};

use session::{ActiveSession, SessionFile};
use store::{
    ActivityStore,
    entities::{ActivitySnapshot, CategorySummary},
};

/// What `stop` reports back to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct StoppedActivity {
    pub name: String,
    pub duration_secs: i64,
    pub category: String,
}

pub struct ActivityTracker {
    store: ActivityStore,
    session: SessionFile,
    oracle: Box<dyn Oracle>,
}

impl ActivityTracker {
    pub fn new(context: &AppContext, oracle: Box<dyn Oracle>) -> Result<Self> {
        Ok(Self {
            store: ActivityStore::open(&context.db_path())?,
            session: SessionFile::new(context.token_path()),
            oracle,
        })
    }

    /// The running session, if any. The token is fast to read but only
    /// trusted after reconciling against the store: a token whose id no
    /// longer matches an open row is stale (crash between store commit and
    /// token cleanup) and is treated as absent.
    pub fn current(&self) -> Option<ActiveSession> {
        let session = self.session.current()?;
        match self.store.has_open_activity(session.activity_id) {
            Ok(true) => Some(session),
            Ok(false) => {
                warn!(
                    "Session token points at activity {} which is not open; discarding it",
                    session.activity_id
                );
                if let Err(e) = self.session.clear() {
                    warn!("Could not remove stale session token: {e}");
                }
                None
            }
            Err(e) => {
                warn!("Could not reconcile session token against the store: {e}");
                None
            }
        }
    }

    /// Starts tracking `name`. Fails with [TrackError::Conflict] while
    /// another activity is running; the command layer decides whether to
    /// prompt for a switch.
    pub fn start(&mut self, name: &str) -> Result<ActiveSession> {
        if let Some(current) = self.current() {
            return Err(TrackError::Conflict { name: current.name });
        }
        let now = Local::now();
        let activity_id = self.store.begin_activity(name, now.naive_local())?;
        let session = ActiveSession {
            activity_id,
            name: name.to_string(),
            started_at: now.timestamp(),
        };
        self.session
            .set(session.activity_id, &session.name, session.started_at)?;
        Ok(session)
    }

    /// Stops the running activity: categorize first (an oracle failure here
    /// leaves the store untouched), then complete the row and count the
    /// category in one transaction, then drop the token as a best-effort
    /// follow-up.
    pub async fn stop(&mut self) -> Result<Option<StoppedActivity>> {
        let Some(session) = self.current() else {
            return Ok(None);
        };

        let end = Local::now();
        let duration_secs = (end.timestamp() - session.started_at).max(0);

        let category =
            categorizer::categorize(&self.store, self.oracle.as_ref(), &session.name).await?;

        self.store.complete_activity(
            session.activity_id,
            end.naive_local(),
            duration_secs,
            &category,
        )?;

        if let Err(e) = self.session.clear() {
            // The orphaned token gets discarded by reconciliation next run.
            warn!("Could not remove session token after stopping: {e}");
        }

        Ok(Some(StoppedActivity {
            name: session.name,
            duration_secs,
            category,
        }))
    }

    pub async fn tell(&mut self, question: &str) -> Result<Vec<Map<String, Value>>> {
        translator::answer(&mut self.store, self.oracle.as_ref(), question).await
    }

    pub fn list_categories(&self) -> Result<Vec<CategorySummary>> {
        self.store.list_categories()
    }

    pub fn rename_category(&mut self, old: &str, new: &str) -> Result<bool> {
        self.store.rename_category(old, new)
    }

    pub fn merge_category(&mut self, from: &str, into: &str) -> Result<bool> {
        self.store.merge_category(from, into)
    }

    pub fn activities_in_category(&self, name: &str) -> Result<Vec<ActivitySnapshot>> {
        self.store.activities_in_category(name)
    }

    #[cfg(test)]
    fn store_mut(&mut self) -> &mut ActivityStore {
        &mut self.store
    }
}
