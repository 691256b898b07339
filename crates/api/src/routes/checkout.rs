//! Shared checkout resolution for the online gateways.

use lendshop_core::collection::CollectionService;
use lendshop_db::entities::clients;
use lendshop_db::repositories::{ClientRepository, InstallmentRepository, SettingsRepository};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::AppState;
use crate::error::{ApiError, ApiResult};

/// Request body for starting an online checkout.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    /// Installment being paid.
    pub installment_id: Uuid,
    /// Amount to charge; defaults to the balance plus today's late fee.
    pub amount: Option<Decimal>,
    /// Payer email; defaults to the client's email.
    pub client_email: Option<String>,
}

/// What a checkout needs to know about the installment and its client.
#[derive(Debug)]
pub(crate) struct CheckoutTarget {
    pub installment_id: Uuid,
    pub sequence: i32,
    pub amount: Decimal,
    pub client: clients::Model,
    pub email: Option<String>,
}

impl CheckoutTarget {
    pub fn subject(&self) -> String {
        format!("Pago de cuota {} - {}", self.sequence, self.client.full_name)
    }
}

/// Loads the installment and its client and settles the amount to charge.
pub(crate) async fn resolve(state: &AppState, request: CheckoutRequest) -> ApiResult<CheckoutTarget> {
    let installment = InstallmentRepository::new((*state.db).clone())
        .get(request.installment_id)
        .await?;
    if installment.is_paid {
        return Err(ApiError::validation("Installment is already paid"));
    }

    let amount = match request.amount {
        Some(amount) if amount <= Decimal::ZERO => {
            return Err(ApiError::validation("Amount must be greater than zero"));
        }
        Some(amount) => amount,
        None => {
            let rate = SettingsRepository::new((*state.db).clone(), state.default_late_fee_rate())
                .late_fee_rate()
                .await?;
            CollectionService::quote(&installment.state(), state.today(), rate).total_due
        }
    };

    let client = ClientRepository::new((*state.db).clone())
        .get(installment.client_id)
        .await?;
    let email = request
        .client_email
        .filter(|e| !e.trim().is_empty())
        .or_else(|| client.email.clone());

    Ok(CheckoutTarget {
        installment_id: installment.id,
        sequence: installment.sequence,
        amount,
        client,
        email,
    })
}
