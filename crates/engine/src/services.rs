//! Service catalog rows.
//!
//! A `Service` is a bookable offering owned by a provider. The booking
//! module reads the catalog; it never mutates it.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{Currency, EngineError};

#[derive(Clone, Debug)]
pub struct Service {
    pub id: Uuid,
    pub provider_id: String,
    pub name: String,
    pub description: Option<String>,
    pub price_minor: i64,
    pub currency: Currency,
    /// Whether bookings may skip the pending confirmation gate.
    pub instant_booking: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Service {
    pub fn new(
        provider_id: String,
        name: String,
        price_minor: i64,
        instant_booking: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            provider_id,
            name,
            description: None,
            price_minor,
            currency: Currency::default(),
            instant_booking,
            active: true,
            created_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "services")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub provider_id: String,
    pub name: String,
    pub description: Option<String>,
    pub price_minor: i64,
    pub currency: String,
    pub instant_booking: bool,
    pub active: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bookings::Entity")]
    Bookings,
}

impl Related<super::bookings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Service> for ActiveModel {
    fn from(value: &Service) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            provider_id: ActiveValue::Set(value.provider_id.clone()),
            name: ActiveValue::Set(value.name.clone()),
            description: ActiveValue::Set(value.description.clone()),
            price_minor: ActiveValue::Set(value.price_minor),
            currency: ActiveValue::Set(value.currency.code().to_string()),
            instant_booking: ActiveValue::Set(value.instant_booking),
            active: ActiveValue::Set(value.active),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl TryFrom<Model> for Service {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("service not exists".to_string()))?,
            provider_id: model.provider_id,
            name: model.name,
            description: model.description,
            price_minor: model.price_minor,
            currency: Currency::try_from(model.currency.as_str()).unwrap_or_default(),
            instant_booking: model.instant_booking,
            active: model.active,
            created_at: model.created_at,
        })
    }
}
