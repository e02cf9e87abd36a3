//! In-app notification synchronizer

use crate::binding::SyncState;
use crate::context::SyncContext;
use crate::mount::MountHandle;
use crate::synchronizer::{DocumentSync, Noun, Synchronizer};
use futures::future::join_all;
use serde_json::json;
use std::sync::Arc;
use studysync_model::{
    NewNotification, Notification, NotificationSettings, NotificationSettingsPatch,
    NOTIFICATION_SETTINGS_ID, SETTINGS_COLLECTION,
};
use studysync_store::SyncError;

/// Default number of notifications kept in the cache
pub const DEFAULT_NOTIFICATION_CAP: usize = 50;

/// Mirror of the `notifications` collection plus `settings/notificationSettings`
#[derive(Debug, Clone)]
pub struct NotificationSync {
    core: Synchronizer<Notification>,
    settings: DocumentSync<NotificationSettings>,
}

impl NotificationSync {
    /// Unbound synchronizer caching the newest `cap` notifications
    pub fn new(ctx: SyncContext, cap: usize) -> Self {
        let settings = DocumentSync::new(
            ctx.clone(),
            SETTINGS_COLLECTION,
            NOTIFICATION_SETTINGS_ID,
            "notification settings",
        );
        let core = Synchronizer::new(ctx, Noun::new("notification", "notifications"))
            .with_transform(move |mut items: Vec<Notification>| {
                items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
                items.truncate(cap);
                items
            });
        Self { core, settings }
    }

    /// Generic synchronizer underneath
    #[must_use]
    pub fn core(&self) -> &Synchronizer<Notification> {
        &self.core
    }

    /// Cached notifications, newest first
    #[must_use]
    pub fn notifications(&self) -> Arc<Vec<Notification>> {
        self.core.entities()
    }

    /// Lifecycle state of the notification cache
    #[must_use]
    pub fn state(&self) -> SyncState {
        self.core.state()
    }

    /// Unread cached notifications
    #[must_use]
    pub fn unread_count(&self) -> usize {
        self.notifications().iter().filter(|n| !n.read).count()
    }

    /// Delivery switches; all on until stored otherwise
    #[must_use]
    pub fn settings(&self) -> NotificationSettings {
        self.settings.value().unwrap_or_default()
    }

    /// Follow the session scope with both subscriptions
    pub fn mount(&self) -> MountHandle {
        MountHandle::group(vec![self.core.mount(), self.settings.mount()])
    }

    /// Store a notification unless its kind is switched off
    ///
    /// Returns the new id, or `None` when suppressed by the settings.
    ///
    /// # Errors
    /// See [`Synchronizer::insert_with`].
    pub async fn add(&self, draft: NewNotification) -> Result<Option<String>, SyncError> {
        if !self.settings().allows(draft.kind) {
            tracing::debug!(kind = ?draft.kind, "notification suppressed by settings");
            return Ok(None);
        }
        let timestamp = self.core.context().clock.now_millis();
        let id = self
            .core
            .insert_with(|id| draft.into_notification(id, timestamp))
            .await?;
        Ok(Some(id))
    }

    /// Mark one notification read
    ///
    /// # Errors
    /// See [`Synchronizer::update_fields`].
    pub async fn mark_as_read(&self, id: &str) -> Result<(), SyncError> {
        self.core.update_fields(id, &json!({ "read": true })).await
    }

    /// Mark every cached unread notification read
    ///
    /// # Errors
    /// `Unauthenticated` or the first store error among the writes.
    pub async fn mark_all_as_read(&self) -> Result<usize, SyncError> {
        let action = "mark notifications as read";
        let client = self.core.client_for(action)?;
        let unread: Vec<String> = self
            .notifications()
            .iter()
            .filter(|n| !n.read)
            .map(|n| n.id.clone())
            .collect();
        let body = json!({ "read": true });
        self.core
            .context()
            .guard(action, async {
                join_all(unread.iter().map(|id| client.update(id, &body)))
                    .await
                    .into_iter()
                    .collect::<Result<Vec<()>, SyncError>>()
            })
            .await?;
        Ok(unread.len())
    }

    /// Delete one notification
    ///
    /// # Errors
    /// See [`Synchronizer::remove`].
    pub async fn remove(&self, id: &str) -> Result<(), SyncError> {
        self.core.remove(id).await
    }

    /// Delete every cached notification
    ///
    /// # Errors
    /// `Unauthenticated` or the first store error among the deletes.
    pub async fn clear_all(&self) -> Result<usize, SyncError> {
        let action = "clear notifications";
        let client = self.core.client_for(action)?;
        let ids: Vec<String> = self.notifications().iter().map(|n| n.id.clone()).collect();
        self.core
            .context()
            .guard(action, async {
                join_all(ids.iter().map(|id| client.delete(id)))
                    .await
                    .into_iter()
                    .collect::<Result<Vec<()>, SyncError>>()
            })
            .await?;
        Ok(ids.len())
    }

    /// Change delivery switches
    ///
    /// # Errors
    /// `Unauthenticated` or the store error of the write.
    pub async fn update_settings(&self, patch: &NotificationSettingsPatch) -> Result<NotificationSettings, SyncError> {
        let next = patch.apply(self.settings());
        self.settings
            .merge("save notification settings", &next)
            .await?;
        Ok(next)
    }
}
