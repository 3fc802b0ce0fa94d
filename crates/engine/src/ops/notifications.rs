//! Stored-notification reads.

use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::{EngineError, Notification, ResultEngine, notifications};

use super::{Engine, with_tx};

impl Engine {
    /// The user's notifications, newest first.
    pub async fn list_notifications(
        &self,
        user_id: &str,
        limit: u64,
    ) -> ResultEngine<Vec<Notification>> {
        let models = notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user_id.to_string()))
            .order_by_desc(notifications::Column::CreatedAt)
            .limit(limit.clamp(1, 200))
            .all(&self.database)
            .await?;
        models.into_iter().map(Notification::try_from).collect()
    }

    /// Marks one of the user's notifications as read.
    pub async fn mark_notification_read(
        &self,
        notification_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = notifications::Entity::find_by_id(notification_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| {
                    EngineError::KeyNotFound("notification not exists".to_string())
                })?;
            if model.user_id != user_id {
                return Err(EngineError::KeyNotFound(
                    "notification not exists".to_string(),
                ));
            }

            let update = notifications::ActiveModel {
                id: ActiveValue::Set(model.id),
                read: ActiveValue::Set(true),
                ..Default::default()
            };
            update.update(&db_tx).await?;
            Ok(())
        })
    }
}
