//! Notification sink.
//!
//! Notifications are best-effort side effects: the owning operation has
//! already committed when one is emitted, a failed insert is logged and
//! swallowed, and delivery to connected clients happens over a broadcast
//! channel that drops events when nobody listens.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, DatabaseConnection, entity::prelude::*};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: String,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub data: Option<serde_json::Value>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Event published to connected clients when a notification is written.
#[derive(Clone, Debug, Serialize)]
pub struct NotificationEvent {
    pub user_id: String,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub data: Option<String>,
    pub read: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Notification {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("notification not exists".to_string()))?,
            user_id: model.user_id,
            kind: model.kind,
            title: model.title,
            message: model.message,
            data: model
                .data
                .as_deref()
                .and_then(|raw| serde_json::from_str(raw).ok()),
            read: model.read,
            created_at: model.created_at,
        })
    }
}

/// Fire-and-forget emitter backed by the notifications table and a broadcast
/// channel.
#[derive(Clone, Debug)]
pub struct Notifier {
    sender: broadcast::Sender<NotificationEvent>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(256)
    }
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.sender.subscribe()
    }

    /// Writes the notification row and publishes the live event.
    ///
    /// Never returns an error: persistence failures are logged at warn so
    /// the operation that triggered the notification is unaffected.
    pub async fn publish(&self, db: &DatabaseConnection, event: NotificationEvent) {
        let row = ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4().to_string()),
            user_id: ActiveValue::Set(event.user_id.clone()),
            kind: ActiveValue::Set(event.kind.clone()),
            title: ActiveValue::Set(event.title.clone()),
            message: ActiveValue::Set(event.message.clone()),
            data: ActiveValue::Set(event.data.as_ref().map(ToString::to_string)),
            read: ActiveValue::Set(false),
            created_at: ActiveValue::Set(Utc::now()),
        };
        if let Err(err) = row.insert(db).await {
            tracing::warn!("failed to persist notification: {err}");
        }

        // Errors only mean there is no subscriber right now.
        let _ = self.sender.send(event);
    }
}
