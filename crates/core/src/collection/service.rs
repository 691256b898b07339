//! Late-fee, allocation, and reversal rules.

use chrono::NaiveDate;
use lendshop_shared::types::{is_cents, round2};
use rust_decimal::Decimal;

use super::error::CollectionError;
use super::types::{
    InstallmentState, InstallmentStatus, LateFeeQuote, LateFeeRate, Reversal, Settlement,
    SettlementKind,
};

/// A payment this close to balance plus fee counts as a full settlement.
pub const FULL_SETTLEMENT_TOLERANCE: Decimal = Decimal::from_parts(50, 0, 0, false, 2);

/// A remaining balance at or below this is written off and the installment paid.
pub const PAID_TOLERANCE: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

/// Collection service for business logic.
pub struct CollectionService;

impl CollectionService {
    /// Late fee owed on an installment as of `today`.
    ///
    /// Zero when the installment is paid or not yet past due, otherwise
    /// `round2(balance * rate / 100)`.
    #[must_use]
    pub fn late_fee(installment: &InstallmentState, today: NaiveDate, rate: LateFeeRate) -> Decimal {
        if !installment.is_overdue(today) {
            return Decimal::ZERO;
        }
        round2(installment.balance * rate.percent() / Decimal::ONE_HUNDRED)
    }

    /// Balance, late fee, and total due as of `today`.
    #[must_use]
    pub fn quote(installment: &InstallmentState, today: NaiveDate, rate: LateFeeRate) -> LateFeeQuote {
        let is_overdue = installment.is_overdue(today);
        let late_fee = Self::late_fee(installment, today, rate);
        let days_overdue = if is_overdue {
            (today - installment.due_date).num_days()
        } else {
            0
        };

        LateFeeQuote {
            balance: installment.balance,
            late_fee,
            total_due: installment.balance + late_fee,
            is_overdue,
            days_overdue,
            rate_percent: rate.percent(),
        }
    }

    /// Checks that a payment amount is positive and in whole cents.
    ///
    /// # Errors
    ///
    /// Returns `CollectionError::NonPositiveAmount` or
    /// `CollectionError::SubCentAmount`.
    pub fn validate_amount(amount: Decimal) -> Result<(), CollectionError> {
        if amount <= Decimal::ZERO {
            return Err(CollectionError::NonPositiveAmount);
        }
        if !is_cents(amount) {
            return Err(CollectionError::SubCentAmount(amount));
        }
        Ok(())
    }

    /// Splits a received amount between late fee and principal.
    ///
    /// - Full settlement when `amount >= balance + fee - 0.50`: the fee is
    ///   collected first and the rest goes to principal, capped at the balance.
    /// - Partial settlement otherwise: the fee is waived and the amount goes
    ///   to principal, capped at the balance.
    ///
    /// A remaining balance at or below 0.10 is written off. Whatever is not
    /// collected comes back as change.
    ///
    /// # Errors
    ///
    /// Returns `CollectionError::NonPositiveAmount` for a zero or negative
    /// amount, `CollectionError::SubCentAmount` for fractions of a cent, and
    /// `CollectionError::AlreadyPaid` when there is no balance.
    pub fn allocate(
        amount_received: Decimal,
        balance: Decimal,
        fee: Decimal,
    ) -> Result<Settlement, CollectionError> {
        Self::validate_amount(amount_received)?;
        if balance <= Decimal::ZERO {
            return Err(CollectionError::AlreadyPaid);
        }
        let fee = fee.max(Decimal::ZERO);
        let total_due = balance + fee;

        let (kind, fee_applied, fee_waived, principal_applied) =
            if amount_received >= total_due - FULL_SETTLEMENT_TOLERANCE {
                let fee_applied = fee.min(amount_received);
                let principal = (amount_received - fee_applied).min(balance);
                (SettlementKind::Full, fee_applied, Decimal::ZERO, principal)
            } else {
                let principal = amount_received.min(balance);
                (SettlementKind::Partial, Decimal::ZERO, fee, principal)
            };

        let mut balance_after = round2((balance - principal_applied).max(Decimal::ZERO));
        let mut written_off = Decimal::ZERO;
        if balance_after <= PAID_TOLERANCE {
            written_off = balance_after;
            balance_after = Decimal::ZERO;
        }

        Ok(Settlement {
            kind,
            amount_received,
            fee_applied,
            fee_waived,
            principal_applied,
            change: amount_received - fee_applied - principal_applied,
            balance_before: balance,
            balance_after,
            written_off,
        })
    }

    /// Restores the balance taken by a voided payment.
    ///
    /// The restored balance is the current balance plus what the payment
    /// removed (`balance_before - balance_after`), so a tolerance write-off is
    /// restored too.
    ///
    /// # Errors
    ///
    /// Returns `CollectionError::ReversalOverflow` when the result would exceed
    /// the installment amount.
    pub fn reverse(
        installment_amount: Decimal,
        current_balance: Decimal,
        balance_before: Decimal,
        balance_after: Decimal,
    ) -> Result<Reversal, CollectionError> {
        let restored = current_balance + (balance_before - balance_after);
        if restored > installment_amount {
            return Err(CollectionError::ReversalOverflow {
                restored,
                amount: installment_amount,
            });
        }
        Ok(Reversal {
            restored_balance: restored,
            status: InstallmentStatus::derive(restored, installment_amount),
        })
    }
}
