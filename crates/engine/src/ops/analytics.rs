//! Provider analytics operations.

use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, sea_query::Expr,
};

use crate::{ProviderDailyStats, ResultEngine, analytics};

use super::Engine;

impl Engine {
    /// Daily counters for a provider; a day with no completions reads as
    /// zeros.
    pub async fn provider_stats(
        &self,
        provider_id: &str,
        day: NaiveDate,
    ) -> ResultEngine<ProviderDailyStats> {
        let model = analytics::Entity::find_by_id((provider_id.to_string(), day))
            .one(&self.database)
            .await?;

        Ok(model.map(ProviderDailyStats::from).unwrap_or(ProviderDailyStats {
            provider_id: provider_id.to_string(),
            day,
            completed_bookings: 0,
            earnings_minor: 0,
        }))
    }

    /// Upsert-with-increment for a completed booking. Runs inside the
    /// completing transaction; increments are atomic column updates so
    /// concurrent completions cannot lose counts.
    pub(crate) async fn record_completion<C: ConnectionTrait>(
        &self,
        db: &C,
        provider_id: &str,
        day: NaiveDate,
        earnings_minor: i64,
    ) -> ResultEngine<()> {
        let existing = analytics::Entity::find_by_id((provider_id.to_string(), day))
            .one(db)
            .await?;

        if existing.is_none() {
            let stats = ProviderDailyStats {
                provider_id: provider_id.to_string(),
                day,
                completed_bookings: 0,
                earnings_minor: 0,
            };
            analytics::ActiveModel::from(&stats).insert(db).await?;
        }

        analytics::Entity::update_many()
            .col_expr(
                analytics::Column::CompletedBookings,
                Expr::col(analytics::Column::CompletedBookings).add(1),
            )
            .col_expr(
                analytics::Column::EarningsMinor,
                Expr::col(analytics::Column::EarningsMinor).add(earnings_minor),
            )
            .filter(analytics::Column::ProviderId.eq(provider_id.to_string()))
            .filter(analytics::Column::Day.eq(day))
            .exec(db)
            .await?;
        Ok(())
    }
}
