//! One-time upload of legacy local data to the remote store
//!
//! Earlier releases kept entity data in the local key-value store as JSON
//! blobs. Each blob is parsed and written through the store independently; a
//! blob that fails to parse is reported as [`SyncError::Malformed`] and the
//! remaining blobs are still migrated.

use crate::controller::SessionController;
use crate::error::SessionError;
use serde_json::{Map, Value};
use std::sync::Arc;
use studysync_store::{CollectionPath, DocumentStore, SyncError, UserId};

/// How a legacy blob maps onto the store
#[derive(Debug, Clone, Copy)]
enum Layout {
    /// JSON array of objects carrying their own `id`
    Array,
    /// One JSON object stored under the id found in `field`
    KeyedBy(&'static str),
    /// One JSON object stored under a fixed id
    Fixed(&'static str),
}

struct Source {
    key: String,
    collection: &'static str,
    layout: Layout,
}

fn sources(uid: &UserId) -> Vec<Source> {
    let source = |key: String, collection: &'static str, layout: Layout| Source {
        key,
        collection,
        layout,
    };
    vec![
        source(format!("grades_{uid}"), "grades", Layout::Array),
        source("eduorganize-tasks".into(), "tasks", Layout::Array),
        source("edunize-timetable".into(), "timetable", Layout::Array),
        source("edunize-subjects".into(), "subjects", Layout::Array),
        source(format!("achievements_{uid}"), "achievements", Layout::Array),
        source(format!("dailyStats_{uid}"), "dailyStats", Layout::KeyedBy("date")),
        source("notifications".into(), "notifications", Layout::Array),
        source(
            "notificationSettings".into(),
            "settings",
            Layout::Fixed("notificationSettings"),
        ),
    ]
}

/// Outcome of a migration run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Documents written per collection
    pub migrated: Vec<(String, usize)>,
    /// Per-blob failures; none of them stopped the run
    pub failures: Vec<SyncError>,
    /// The run was skipped because it already completed earlier
    pub skipped: bool,
}

impl MigrationReport {
    /// Total documents written
    #[must_use]
    pub fn documents(&self) -> usize {
        self.migrated.iter().map(|(_, n)| n).sum()
    }
}

impl SessionController {
    /// Move legacy local blobs of `uid` into the remote store
    ///
    /// Runs once per user; completion is recorded locally even when some
    /// blobs were malformed, since retrying cannot repair them.
    ///
    /// # Errors
    /// [`SessionError::NotSignedIn`] unless `uid` is the bound user. Store
    /// failures are collected in the report instead.
    pub async fn migrate_local_residue(
        &self,
        store: &Arc<dyn DocumentStore>,
        uid: &UserId,
    ) -> Result<MigrationReport, SessionError> {
        if !self.scope().is_bound_to(uid) {
            return Err(SessionError::NotSignedIn);
        }
        if self.is_migrated(uid) {
            return Ok(MigrationReport {
                skipped: true,
                ..MigrationReport::default()
            });
        }

        let mut report = MigrationReport::default();
        for source in sources(uid) {
            let Some(raw) = self.local().get(&source.key) else {
                continue;
            };
            let path = CollectionPath::new(uid.clone(), source.collection);
            match migrate_blob(store, &path, &source, &raw).await {
                Ok(count) => {
                    tracing::info!(collection = source.collection, count, "migrated legacy data");
                    report.migrated.push((source.collection.to_string(), count));
                }
                Err(e) => {
                    tracing::error!(collection = source.collection, error = %e, "legacy migration failed");
                    report.failures.push(e);
                }
            }
        }

        match migrate_settings(self, store, uid).await {
            Ok(0) => {}
            Ok(count) => report.migrated.push(("settings".to_string(), count)),
            Err(e) => report.failures.push(e),
        }
        match migrate_pomodoro(self, store, uid).await {
            Ok(0) => {}
            Ok(count) => report.migrated.push(("pomodoro".to_string(), count)),
            Err(e) => report.failures.push(e),
        }

        self.mark_migrated(uid);
        Ok(report)
    }
}

fn parse(key: &str, raw: &str) -> Result<Value, SyncError> {
    serde_json::from_str(raw).map_err(|e| SyncError::Malformed {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

fn malformed(key: &str, reason: &str) -> SyncError {
    SyncError::Malformed {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

async fn migrate_blob(
    store: &Arc<dyn DocumentStore>,
    path: &CollectionPath,
    source: &Source,
    raw: &str,
) -> Result<usize, SyncError> {
    let value = parse(&source.key, raw)?;
    match source.layout {
        Layout::Array => {
            let Value::Array(items) = value else {
                return Err(malformed(&source.key, "expected a JSON array"));
            };
            let mut written = 0;
            for item in items {
                let Value::Object(body) = item else {
                    continue;
                };
                // Entries without an id cannot be addressed and are skipped.
                let Some(id) = body.get("id").and_then(Value::as_str).map(str::to_string) else {
                    continue;
                };
                store.set_merge(&path.doc(id), body).await?;
                written += 1;
            }
            Ok(written)
        }
        Layout::KeyedBy(field) => {
            let Value::Object(body) = value else {
                return Err(malformed(&source.key, "expected a JSON object"));
            };
            let id = body
                .get(field)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| malformed(&source.key, "missing document key"))?;
            store.set_merge(&path.doc(id), body).await?;
            Ok(1)
        }
        Layout::Fixed(id) => {
            let Value::Object(body) = value else {
                return Err(malformed(&source.key, "expected a JSON object"));
            };
            store.set_merge(&path.doc(id), body).await?;
            Ok(1)
        }
    }
}

/// Grading preference is stored raw, not as JSON
async fn migrate_settings(
    ctl: &SessionController,
    store: &Arc<dyn DocumentStore>,
    uid: &UserId,
) -> Result<usize, SyncError> {
    let Some(system) = ctl.local().get(&format!("gradingSystem_{uid}")) else {
        return Ok(0);
    };
    let mut body = Map::new();
    body.insert("gradingSystem".into(), Value::String(system));
    let path = CollectionPath::new(uid.clone(), "settings").doc("preferences");
    store.set_merge(&path, body).await?;
    Ok(1)
}

/// Pomodoro durations are JSON; counters are plain numbers
async fn migrate_pomodoro(
    ctl: &SessionController,
    store: &Arc<dyn DocumentStore>,
    uid: &UserId,
) -> Result<usize, SyncError> {
    let local = ctl.local();
    let mut body = Map::new();
    if let Some(raw) = local.get("pomodoroDurations") {
        body.insert("durations".into(), parse("pomodoroDurations", &raw)?);
    }
    for (key, field) in [("pomodoroSessions", "sessions"), ("pomodoroTotalMinutes", "totalMinutes")] {
        if let Some(raw) = local.get(key) {
            body.insert(field.into(), Value::from(parse_count(key, &raw)?));
        }
    }
    if body.is_empty() {
        return Ok(0);
    }
    let path = CollectionPath::new(uid.clone(), "pomodoro").doc("settings");
    store.set_merge(&path, body).await?;
    Ok(1)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_count(key: &str, raw: &str) -> Result<u64, SyncError> {
    let raw = raw.trim();
    raw.parse::<u64>()
        .or_else(|_| raw.parse::<f64>().map(|f| f.max(0.0).trunc() as u64))
        .map_err(|_| malformed(key, "expected a number"))
}
