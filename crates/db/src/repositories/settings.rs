//! Late-fee rate settings.
//!
//! The rate history is append-only: setting a rate inserts a row and the
//! newest row is the current rate. With no rows the configured default wins.

use lendshop_core::collection::LateFeeRate;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::late_fee_rates;

/// Settings repository.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    db: DatabaseConnection,
    default_rate: LateFeeRate,
}

impl SettingsRepository {
    /// Creates a settings repository falling back to `default_rate`.
    #[must_use]
    pub const fn new(db: DatabaseConnection, default_rate: LateFeeRate) -> Self {
        Self { db, default_rate }
    }

    /// Current late-fee rate.
    pub async fn late_fee_rate(&self) -> Result<LateFeeRate, DbErr> {
        current_rate(&self.db, self.default_rate).await
    }

    /// Appends a new late-fee rate to the history.
    pub async fn set_late_fee_rate(
        &self,
        rate: LateFeeRate,
        set_by: Option<String>,
    ) -> Result<late_fee_rates::Model, DbErr> {
        let row = late_fee_rates::ActiveModel {
            id: Set(Uuid::new_v4()),
            rate_percent: Set(rate.percent()),
            effective_from: Set(chrono::Utc::now().into()),
            set_by: Set(set_by),
        };
        let row = row.insert(&self.db).await?;
        tracing::info!(rate_percent = %row.rate_percent, "Late-fee rate updated");
        Ok(row)
    }

    /// Rate history, newest first.
    pub async fn history(&self) -> Result<Vec<late_fee_rates::Model>, DbErr> {
        late_fee_rates::Entity::find()
            .order_by_desc(late_fee_rates::Column::EffectiveFrom)
            .all(&self.db)
            .await
    }
}

/// Reads the newest rate on any connection, including an open transaction.
pub(crate) async fn current_rate<C: ConnectionTrait>(
    db: &C,
    default_rate: LateFeeRate,
) -> Result<LateFeeRate, DbErr> {
    let latest = late_fee_rates::Entity::find()
        .order_by_desc(late_fee_rates::Column::EffectiveFrom)
        .one(db)
        .await?;

    match latest {
        Some(row) => LateFeeRate::new(row.rate_percent).map_err(|e| DbErr::Custom(e.to_string())),
        None => Ok(default_rate),
    }
}
