//! Service catalog operations.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, Service, services, users::UserRole};

use super::{Engine, normalize_optional_text, normalize_required_name, with_tx};

impl Engine {
    /// Adds a catalog service owned by the acting provider.
    pub async fn new_service(
        &self,
        provider_id: &str,
        name: &str,
        description: Option<&str>,
        price_minor: i64,
        instant_booking: bool,
    ) -> ResultEngine<Service> {
        let name = normalize_required_name(name, "service name")?;
        if price_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "price_minor must be > 0".to_string(),
            ));
        }
        let description = normalize_optional_text(description);
        let now = Utc::now();

        with_tx!(self, |db_tx| {
            let provider = self.require_user(&db_tx, provider_id).await?;
            if !matches!(provider.role(), UserRole::Provider | UserRole::Admin) {
                return Err(EngineError::Forbidden(
                    "only providers can list services".to_string(),
                ));
            }

            let exists = services::Entity::find()
                .filter(services::Column::ProviderId.eq(provider_id.to_string()))
                .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(name));
            }

            let mut service =
                Service::new(provider_id.to_string(), name, price_minor, instant_booking, now);
            service.description = description;
            services::ActiveModel::from(&service).insert(&db_tx).await?;
            Ok(service)
        })
    }

    /// Activates or deactivates a service. Owner or admin only.
    pub async fn set_service_active(
        &self,
        service_id: Uuid,
        acting_user_id: &str,
        active: bool,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let acting = self.require_user(&db_tx, acting_user_id).await?;
            let model = services::Entity::find_by_id(service_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("service not exists".to_string()))?;
            if model.provider_id != acting.id && acting.role() != UserRole::Admin {
                return Err(EngineError::Forbidden(
                    "not the owner of this service".to_string(),
                ));
            }

            let update = services::ActiveModel {
                id: ActiveValue::Set(model.id),
                active: ActiveValue::Set(active),
                ..Default::default()
            };
            update.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Active catalog entries, newest first.
    pub async fn list_services(&self) -> ResultEngine<Vec<Service>> {
        let models = services::Entity::find()
            .filter(services::Column::Active.eq(true))
            .order_by_desc(services::Column::CreatedAt)
            .all(&self.database)
            .await?;
        models.into_iter().map(Service::try_from).collect()
    }
}
