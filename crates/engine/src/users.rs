//! User accounts.
//!
//! Authentication itself lives at the HTTP layer; the engine only needs the
//! rows for recipient lookups (peer-to-peer send targets a phone number) and
//! for role checks on booking operations.

use sea_orm::entity::prelude::*;

use crate::EngineError;

/// Role of a user on the platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserRole {
    Customer,
    Provider,
    Admin,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Provider => "provider",
            Self::Admin => "admin",
        }
    }
}

impl TryFrom<&str> for UserRole {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "customer" => Ok(Self::Customer),
            "provider" => Ok(Self::Provider),
            "admin" => Ok(Self::Admin),
            other => Err(EngineError::InvalidState(format!(
                "invalid user role: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub username: String,
    pub password: String,
    pub phone: String,
    pub role: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn role(&self) -> UserRole {
        UserRole::try_from(self.role.as_str()).unwrap_or(UserRole::Customer)
    }
}
