use std::sync::Arc;

use chrono::{Local, Utc};
use fwkit::OptimisticCell;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::contract::client::ReviewApi;
use crate::contract::model::{NewNotification, Notification, NotificationId, NotificationKind};
use crate::domain::error::{DomainError, DomainResult};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationsState {
    /// Newest first.
    pub items: Vec<Notification>,
    pub unread_count: u64,
}

impl NotificationsState {
    fn recount(&mut self) {
        self.unread_count = self.items.iter().filter(|n| !n.is_read).count() as u64;
    }
}

/// Notification inbox with optimistic edits.
pub struct NotificationCenter {
    api: Arc<dyn ReviewApi>,
    cell: OptimisticCell<NotificationsState>,
}

impl NotificationCenter {
    pub fn new(api: Arc<dyn ReviewApi>) -> Self {
        Self {
            api,
            cell: OptimisticCell::new(NotificationsState::default()),
        }
    }

    #[instrument(name = "product_reviews.notifications.load", skip(self))]
    pub async fn load(&self) -> DomainResult<Vec<Notification>> {
        let items = self.api.notifications().await?;
        let mut state = NotificationsState {
            items: items.clone(),
            unread_count: 0,
        };
        state.recount();
        info!(total = state.items.len(), unread = state.unread_count, "notifications loaded");
        self.cell.replace(state).await;
        Ok(items)
    }

    #[instrument(name = "product_reviews.notifications.refresh_unread_count", skip(self))]
    pub async fn refresh_unread_count(&self) -> DomainResult<u64> {
        let count = self.api.unread_count().await?;
        self.cell.update(|s| s.unread_count = count);
        Ok(count)
    }

    pub fn items(&self) -> Vec<Notification> {
        self.cell.read(|s| s.items.clone())
    }

    pub fn unread_count(&self) -> u64 {
        self.cell.read(|s| s.unread_count)
    }

    pub fn get(&self, id: NotificationId) -> Option<Notification> {
        self.cell.read(|s| s.items.iter().find(|n| n.id == id).cloned())
    }

    pub fn subscribe(&self) -> watch::Receiver<NotificationsState> {
        self.cell.subscribe()
    }

    /// Local entries are only marked on the device.
    #[instrument(name = "product_reviews.notifications.mark_as_read", skip(self), fields(notification_id = %id))]
    pub async fn mark_as_read(&self, id: NotificationId) -> DomainResult<()> {
        let apply = move |s: &mut NotificationsState| {
            if let Some(n) = s.items.iter_mut().find(|n| n.id == id && !n.is_read) {
                n.is_read = true;
                s.unread_count = s.unread_count.saturating_sub(1);
            }
        };
        let Some(server_id) = id.server_id() else {
            let tx = self.cell.begin().await;
            tx.apply(apply);
            tx.commit();
            return Ok(());
        };
        self.cell
            .mutate(apply, self.api.mark_notification_read(server_id))
            .await?;
        Ok(())
    }

    #[instrument(name = "product_reviews.notifications.mark_all_as_read", skip(self))]
    pub async fn mark_all_as_read(&self) -> DomainResult<()> {
        self.cell
            .mutate(
                |s| {
                    s.items.iter_mut().for_each(|n| n.is_read = true);
                    s.unread_count = 0;
                },
                self.api.mark_all_notifications_read(),
            )
            .await?;
        Ok(())
    }

    /// Show a `local-<millis>` entry at the top right away, create it on the
    /// server, then reload so the server's copy replaces the placeholder.
    #[instrument(name = "product_reviews.notifications.add", skip(self, body))]
    pub async fn add(
        &self,
        kind: NotificationKind,
        title: &str,
        body: &str,
        product_id: Option<u64>,
    ) -> DomainResult<Notification> {
        let title = title.trim();
        if title.is_empty() {
            return Err(DomainError::validation("title", "must not be empty"));
        }
        let local = Notification {
            id: NotificationId::Local(Utc::now().timestamp_millis()),
            title: title.to_string(),
            message: body.to_string(),
            is_read: false,
            created_at: Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
            product_id,
            kind,
        };
        let request = NewNotification {
            title: local.title.clone(),
            message: local.message.clone(),
            product_id,
        };

        let placeholder = local.clone();
        self.cell
            .mutate(
                move |s| {
                    s.items.insert(0, placeholder);
                    s.unread_count += 1;
                },
                self.api.create_notification(&request),
            )
            .await?;
        debug!(id = %local.id, "notification created on server");

        if let Err(e) = self.load().await {
            warn!(error = %e, "reload after create failed; keeping local entry");
        }
        Ok(local)
    }

    /// Local entries are removed without a network call.
    #[instrument(name = "product_reviews.notifications.delete", skip(self), fields(notification_id = %id))]
    pub async fn delete(&self, id: NotificationId) -> DomainResult<()> {
        let apply = move |s: &mut NotificationsState| {
            if let Some(pos) = s.items.iter().position(|n| n.id == id) {
                let removed = s.items.remove(pos);
                if !removed.is_read {
                    s.unread_count = s.unread_count.saturating_sub(1);
                }
            }
        };
        let Some(server_id) = id.server_id() else {
            let tx = self.cell.begin().await;
            tx.apply(apply);
            tx.commit();
            return Ok(());
        };
        self.cell
            .mutate(apply, self.api.delete_notification(server_id))
            .await?;
        Ok(())
    }

    #[instrument(name = "product_reviews.notifications.delete_all", skip(self))]
    pub async fn delete_all(&self) -> DomainResult<()> {
        self.cell
            .mutate(
                |s| {
                    s.items.clear();
                    s.unread_count = 0;
                },
                self.api.delete_all_notifications(),
            )
            .await?;
        Ok(())
    }
}
