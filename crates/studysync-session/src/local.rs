//! Durable local key-value storage for session bookkeeping
//!
//! Only small counters and markers live here, never entity data. Keys owned by
//! this layer are namespaced `{namespace}:...`; legacy keys from earlier
//! releases are un-namespaced and listed in [`LEGACY_GLOBAL_KEYS`] and
//! [`LEGACY_USER_PREFIXES`].

use dashmap::DashMap;
use std::sync::Arc;
use studysync_store::UserId;

/// Port to the device's durable key-value store
pub trait LocalStore: Send + Sync + 'static {
    /// Read a value
    fn get(&self, key: &str) -> Option<String>;
    /// Write a value
    fn set(&self, key: &str, value: &str);
    /// Remove a value; absent keys are ignored
    fn remove(&self, key: &str);
    /// Every stored key
    fn keys(&self) -> Vec<String>;
}

/// In-memory [`LocalStore`]
#[derive(Debug, Default, Clone)]
pub struct MemoryLocalStore {
    entries: Arc<DashMap<String, String>>,
}

impl MemoryLocalStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LocalStore for MemoryLocalStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.value().clone())
    }

    fn set(&self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.remove(key);
    }

    fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.key().clone()).collect()
    }
}

/// Un-namespaced keys written by earlier releases regardless of user
pub const LEGACY_GLOBAL_KEYS: &[&str] = &[
    "currentUserId",
    "eduorganize-tasks",
    "edunize-subjects",
    "edunize-timetable",
    "notifications",
    "notificationSettings",
    "pomodoroDurations",
    "pomodoroSessions",
    "pomodoroTotalMinutes",
    "pomodoroTimerState",
    "pomodoroLastUpdate",
    "sampleNotificationsAdded",
];

/// Prefixes of legacy `{prefix}{uid}` keys
pub const LEGACY_USER_PREFIXES: &[&str] = &[
    "userData_",
    "hasCompletedProfileSetup_",
    "grades_",
    "gradingSystem_",
    "dailyStats_",
    "achievements_",
    "completedTasksCount_",
    "studyStreak_",
    "firestore_migrated_",
];

/// Lifetime completed tasks
pub const COMPLETED_TASKS: &str = "completed_tasks";
/// Current study streak in days
pub const STUDY_STREAK: &str = "study_streak";
/// Lifetime completed pomodoro work periods
pub const POMODORO_SESSIONS: &str = "pomodoro_sessions";
/// Marker set once legacy residue has been migrated
pub const MIGRATED: &str = "migrated";

/// Key layout under one namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalKeys {
    namespace: String,
}

impl LocalKeys {
    /// Keys under `namespace`
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    /// Namespace prefix
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Last user bound on this device
    #[must_use]
    pub fn current_user(&self) -> String {
        format!("{}:current_user", self.namespace)
    }

    /// Per-user key
    #[must_use]
    pub fn user(&self, uid: &UserId, name: &str) -> String {
        format!("{}:{}:{}", self.namespace, uid, name)
    }

    /// Per-user completion counter for one local date
    #[must_use]
    pub fn tasks_completed_on(&self, uid: &UserId, date: &str) -> String {
        self.user(uid, &format!("tasks_completed:{date}"))
    }

    /// Check if `key` belongs to this namespace
    #[must_use]
    pub fn owns(&self, key: &str) -> bool {
        key.strip_prefix(self.namespace.as_str())
            .is_some_and(|rest| rest.starts_with(':'))
    }

    /// Check if `key` is residue of any session: namespaced or legacy
    #[must_use]
    pub fn is_residue(&self, key: &str) -> bool {
        self.owns(key)
            || LEGACY_GLOBAL_KEYS.contains(&key)
            || LEGACY_USER_PREFIXES.iter().any(|p| key.starts_with(p))
    }
}

impl Default for LocalKeys {
    fn default() -> Self {
        Self::new("studysync")
    }
}

/// Typed integer counters over a [`LocalStore`]
#[derive(Clone)]
pub struct Counters {
    local: Arc<dyn LocalStore>,
    keys: LocalKeys,
}

impl std::fmt::Debug for Counters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Counters").field("keys", &self.keys).finish()
    }
}

impl Counters {
    /// Counters stored in `local` under `keys`
    pub fn new(local: Arc<dyn LocalStore>, keys: LocalKeys) -> Self {
        Self { local, keys }
    }

    /// Key layout
    #[must_use]
    pub fn keys(&self) -> &LocalKeys {
        &self.keys
    }

    /// Read a raw key as a counter; missing or unparsable is 0
    #[must_use]
    pub fn read(&self, key: &str) -> u32 {
        self.local
            .get(key)
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(0)
    }

    /// Overwrite a raw key
    pub fn write(&self, key: &str, value: u32) {
        self.local.set(key, &value.to_string());
    }

    /// Per-user counter
    #[must_use]
    pub fn get(&self, uid: &UserId, name: &str) -> u32 {
        self.read(&self.keys.user(uid, name))
    }

    /// Set a per-user counter
    pub fn set(&self, uid: &UserId, name: &str, value: u32) {
        self.write(&self.keys.user(uid, name), value);
    }

    /// Add one to a raw key; returns the new value
    pub fn increment_key(&self, key: &str) -> u32 {
        let next = self.read(key).saturating_add(1);
        self.write(key, next);
        next
    }

    /// Subtract one from a raw key, never below 0; returns the new value
    pub fn decrement_key(&self, key: &str) -> u32 {
        let next = self.read(key).saturating_sub(1);
        self.write(key, next);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_ownership_requires_separator() {
        let keys = LocalKeys::new("app");
        assert!(keys.owns("app:current_user"));
        assert!(!keys.owns("application:x"));
        assert!(keys.is_residue("grades_u1"));
        assert!(keys.is_residue("eduorganize-tasks"));
        assert!(!keys.is_residue("theme"));
    }

    #[test]
    fn counters_never_go_negative() {
        let counters = Counters::new(Arc::new(MemoryLocalStore::new()), LocalKeys::default());
        let uid = UserId::new("u");
        let key = counters.keys().user(&uid, COMPLETED_TASKS);
        assert_eq!(counters.decrement_key(&key), 0);
        assert_eq!(counters.increment_key(&key), 1);
        assert_eq!(counters.get(&uid, COMPLETED_TASKS), 1);
    }

    #[test]
    fn garbage_counter_reads_as_zero() {
        let local = Arc::new(MemoryLocalStore::new());
        local.set("studysync:u:study_streak", "many");
        let counters = Counters::new(local, LocalKeys::default());
        assert_eq!(counters.get(&UserId::new("u"), STUDY_STREAK), 0);
    }
}
