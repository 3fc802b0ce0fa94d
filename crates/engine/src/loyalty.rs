//! Loyalty accounts.
//!
//! One row per user. `lifetime_points` only ever grows and derives the tier;
//! `points` is the spendable balance. Completing a booking awards a flat
//! amount; monetary activity awards amount-proportional points scaled by the
//! tier multiplier.

use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};

/// Points for completing a booking.
pub const COMPLETION_POINTS: i64 = 10;

/// One point per 100 KES of monetary activity, before the tier multiplier.
pub const MINOR_UNITS_PER_POINT: i64 = 10_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bronze => "bronze",
            Self::Silver => "silver",
            Self::Gold => "gold",
            Self::Platinum => "platinum",
        }
    }

    pub fn from_lifetime_points(lifetime: i64) -> Self {
        match lifetime {
            _ if lifetime >= 15_000 => Self::Platinum,
            _ if lifetime >= 5_000 => Self::Gold,
            _ if lifetime >= 1_000 => Self::Silver,
            _ => Self::Bronze,
        }
    }

    /// Scalar applied to points earned from monetary activity.
    pub fn multiplier(self) -> i64 {
        match self {
            Self::Bronze => 1,
            Self::Silver => 2,
            Self::Gold => 3,
            Self::Platinum => 4,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoyaltyAccount {
    pub user_id: String,
    pub points: i64,
    pub lifetime_points: i64,
}

impl LoyaltyAccount {
    pub fn tier(&self) -> Tier {
        Tier::from_lifetime_points(self.lifetime_points)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "loyalty_accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    pub points: i64,
    pub lifetime_points: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&LoyaltyAccount> for ActiveModel {
    fn from(value: &LoyaltyAccount) -> Self {
        Self {
            user_id: ActiveValue::Set(value.user_id.clone()),
            points: ActiveValue::Set(value.points),
            lifetime_points: ActiveValue::Set(value.lifetime_points),
        }
    }
}

impl From<Model> for LoyaltyAccount {
    fn from(model: Model) -> Self {
        Self {
            user_id: model.user_id,
            points: model.points,
            lifetime_points: model.lifetime_points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_thresholds() {
        assert_eq!(Tier::from_lifetime_points(0), Tier::Bronze);
        assert_eq!(Tier::from_lifetime_points(999), Tier::Bronze);
        assert_eq!(Tier::from_lifetime_points(1_000), Tier::Silver);
        assert_eq!(Tier::from_lifetime_points(4_999), Tier::Silver);
        assert_eq!(Tier::from_lifetime_points(5_000), Tier::Gold);
        assert_eq!(Tier::from_lifetime_points(15_000), Tier::Platinum);
    }

    #[test]
    fn multiplier_grows_with_tier() {
        assert_eq!(Tier::Bronze.multiplier(), 1);
        assert_eq!(Tier::Silver.multiplier(), 2);
        assert_eq!(Tier::Gold.multiplier(), 3);
        assert_eq!(Tier::Platinum.multiplier(), 4);
    }
}
