//! Loyalty account operations.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, sea_query::Expr,
};

use crate::{LoyaltyAccount, ResultEngine, Tier, loyalty};

use super::{Engine, with_tx};

impl Engine {
    /// Returns the user's loyalty account, creating an empty one on first
    /// access.
    pub async fn loyalty_account(&self, user_id: &str) -> ResultEngine<LoyaltyAccount> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let model = self.loyalty_model(&db_tx, user_id).await?;
            Ok(LoyaltyAccount::from(model))
        })
    }

    pub(crate) async fn loyalty_model<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: &str,
    ) -> ResultEngine<loyalty::Model> {
        let existing = loyalty::Entity::find_by_id(user_id.to_string())
            .one(db)
            .await?;
        if let Some(model) = existing {
            return Ok(model);
        }

        let account = LoyaltyAccount {
            user_id: user_id.to_string(),
            points: 0,
            lifetime_points: 0,
        };
        let model = loyalty::ActiveModel::from(&account).insert(db).await?;
        Ok(model)
    }

    pub(crate) async fn tier_multiplier<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: &str,
    ) -> ResultEngine<i64> {
        let model = self.loyalty_model(db, user_id).await?;
        Ok(Tier::from_lifetime_points(model.lifetime_points).multiplier())
    }

    /// Adds `points` to both the spendable and lifetime counters with the
    /// store's atomic column update.
    pub(crate) async fn award_points<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: &str,
        points: i64,
    ) -> ResultEngine<()> {
        // Ensure the row exists before the in-place increment.
        self.loyalty_model(db, user_id).await?;

        loyalty::Entity::update_many()
            .col_expr(
                loyalty::Column::Points,
                Expr::col(loyalty::Column::Points).add(points),
            )
            .col_expr(
                loyalty::Column::LifetimePoints,
                Expr::col(loyalty::Column::LifetimePoints).add(points),
            )
            .filter(loyalty::Column::UserId.eq(user_id.to_string()))
            .exec(db)
            .await?;
        Ok(())
    }
}
