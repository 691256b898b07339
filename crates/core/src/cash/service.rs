//! Cash drawer reconciliation.

use lendshop_shared::ClosePolicy;
use lendshop_shared::types::is_cents;
use rust_decimal::Decimal;

use super::error::CashError;
use super::types::{
    CloseOutcome, DrawerClose, DrawerSummary, ExcessSplit, MethodTotals, PaymentMethod,
};

/// Cash drawer service for business logic.
pub struct CashService;

impl CashService {
    /// Validates the float placed in the drawer at open.
    ///
    /// # Errors
    ///
    /// Returns `CashError::NegativeOpeningFloat` for a negative amount and
    /// `CashError::SubCentAmount` for fractions of a cent.
    pub fn validate_opening_float(opening_float: Decimal) -> Result<(), CashError> {
        if opening_float < Decimal::ZERO {
            return Err(CashError::NegativeOpeningFloat);
        }
        if !is_cents(opening_float) {
            return Err(CashError::SubCentAmount(opening_float));
        }
        Ok(())
    }

    /// Decides where the excess of a payment goes.
    ///
    /// Manual methods hand it back as change. Gateways cannot give change, so
    /// their excess stays with the shop as an overpayment and counts toward
    /// the method total.
    #[must_use]
    pub fn split_excess(method: PaymentMethod, excess: Decimal) -> ExcessSplit {
        if excess <= Decimal::ZERO {
            return ExcessSplit::default();
        }
        if method.is_manual() {
            ExcessSplit {
                change: excess,
                overpayment: Decimal::ZERO,
            }
        } else {
            ExcessSplit {
                change: Decimal::ZERO,
                overpayment: excess,
            }
        }
    }

    /// Summarizes the approved payments of a session.
    ///
    /// Each amount is what the method actually took in, gateway overpayments
    /// included. `expected_cash = opening_float + cash collections`.
    #[must_use]
    pub fn summarize<I>(opening_float: Decimal, payments: I) -> DrawerSummary
    where
        I: IntoIterator<Item = (PaymentMethod, Decimal)>,
    {
        let mut totals = MethodTotals::default();
        let mut payment_count = 0u64;
        for (method, amount) in payments {
            totals.add(method, amount);
            payment_count += 1;
        }

        DrawerSummary {
            opening_float,
            totals,
            expected_cash: opening_float + totals.cash,
            bank_total: totals.bank_total(),
            grand_total: totals.grand_total(),
            payment_count,
        }
    }

    /// Compares counted cash to the expected drawer cash.
    ///
    /// Under `ClosePolicy::Strict` any variance rejects the close. Under
    /// `ClosePolicy::Tolerant` the close is accepted and the variance reported.
    ///
    /// # Errors
    ///
    /// Returns `CashError::NegativeCount` for a negative count,
    /// `CashError::SubCentAmount` for fractions of a cent, and
    /// `CashError::VarianceNotZero` when a strict close does not balance.
    pub fn reconcile(
        summary: &DrawerSummary,
        counted_cash: Decimal,
        policy: ClosePolicy,
    ) -> Result<DrawerClose, CashError> {
        if counted_cash < Decimal::ZERO {
            return Err(CashError::NegativeCount);
        }
        if !is_cents(counted_cash) {
            return Err(CashError::SubCentAmount(counted_cash));
        }

        let variance = counted_cash - summary.expected_cash;
        let outcome = match variance.cmp(&Decimal::ZERO) {
            std::cmp::Ordering::Greater => CloseOutcome::Surplus,
            std::cmp::Ordering::Less => CloseOutcome::Shortfall,
            std::cmp::Ordering::Equal => CloseOutcome::Balanced,
        };

        if policy == ClosePolicy::Strict && outcome != CloseOutcome::Balanced {
            return Err(CashError::VarianceNotZero {
                expected: summary.expected_cash,
                counted: counted_cash,
                variance,
            });
        }

        Ok(DrawerClose {
            expected_cash: summary.expected_cash,
            counted_cash,
            variance,
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    #[test]
    fn test_expected_cash_counts_only_cash() {
        let summary = CashService::summarize(
            dec!(200),
            [
                (PaymentMethod::Cash, dec!(100)),
                (PaymentMethod::Cash, dec!(50)),
                (PaymentMethod::Yape, dec!(30)),
                (PaymentMethod::Flow, dec!(20)),
            ],
        );

        assert_eq!(summary.expected_cash, dec!(350));
        assert_eq!(summary.totals.cash, dec!(150));
        assert_eq!(summary.bank_total, dec!(50));
        assert_eq!(summary.grand_total, dec!(200));
        assert_eq!(summary.payment_count, 4);
    }

    #[test]
    fn test_strict_close_balanced() {
        let summary = CashService::summarize(dec!(200), [(PaymentMethod::Cash, dec!(150))]);
        let close = CashService::reconcile(&summary, dec!(350), ClosePolicy::Strict).unwrap();
        assert_eq!(close.variance, dec!(0));
        assert_eq!(close.outcome, CloseOutcome::Balanced);
    }

    #[test]
    fn test_strict_close_rejects_variance() {
        let summary = CashService::summarize(dec!(200), [(PaymentMethod::Cash, dec!(150))]);
        let err = CashService::reconcile(&summary, dec!(345), ClosePolicy::Strict).unwrap_err();
        assert_eq!(
            err,
            CashError::VarianceNotZero {
                expected: dec!(350),
                counted: dec!(345),
                variance: dec!(-5),
            }
        );
    }

    #[test]
    fn test_tolerant_close_reports_variance() {
        let summary = CashService::summarize(dec!(200), [(PaymentMethod::Cash, dec!(150))]);
        let short = CashService::reconcile(&summary, dec!(340), ClosePolicy::Tolerant).unwrap();
        assert_eq!(short.outcome, CloseOutcome::Shortfall);
        assert_eq!(short.variance, dec!(-10));

        let over = CashService::reconcile(&summary, dec!(360), ClosePolicy::Tolerant).unwrap();
        assert_eq!(over.outcome, CloseOutcome::Surplus);
    }

    #[test]
    fn test_negative_amounts_rejected() {
        assert_eq!(
            CashService::validate_opening_float(dec!(-1)),
            Err(CashError::NegativeOpeningFloat)
        );
        let summary = CashService::summarize(dec!(0), Vec::new());
        assert_eq!(
            CashService::reconcile(&summary, dec!(-1), ClosePolicy::Tolerant),
            Err(CashError::NegativeCount)
        );
    }

    #[test]
    fn test_sub_cent_amounts_rejected() {
        assert_eq!(
            CashService::validate_opening_float(dec!(100.005)),
            Err(CashError::SubCentAmount(dec!(100.005)))
        );
        assert!(CashService::validate_opening_float(dec!(100.50)).is_ok());
        let summary = CashService::summarize(dec!(100), Vec::new());
        assert_eq!(
            CashService::reconcile(&summary, dec!(99.999), ClosePolicy::Tolerant),
            Err(CashError::SubCentAmount(dec!(99.999)))
        );
    }

    #[test]
    fn test_gateway_excess_is_overpayment_not_change() {
        let flow = CashService::split_excess(PaymentMethod::Flow, dec!(0.60));
        assert_eq!(flow.change, dec!(0));
        assert_eq!(flow.overpayment, dec!(0.60));

        let cash = CashService::split_excess(PaymentMethod::Cash, dec!(20));
        assert_eq!(cash.change, dec!(20));
        assert_eq!(cash.overpayment, dec!(0));

        assert_eq!(
            CashService::split_excess(PaymentMethod::MercadoPago, dec!(0)),
            ExcessSplit::default()
        );
    }

    #[test]
    fn test_gateway_total_includes_overpayment() {
        let summary = CashService::summarize(
            dec!(0),
            [
                (PaymentMethod::Flow, dec!(100.40) + dec!(0.60)),
                (PaymentMethod::Cash, dec!(50)),
            ],
        );
        assert_eq!(summary.totals.flow, dec!(101.00));
        assert_eq!(summary.bank_total, dec!(101.00));
        assert_eq!(summary.expected_cash, dec!(50));
    }

    #[test]
    fn test_payment_method_names() {
        assert_eq!(PaymentMethod::from_str("YAPE").unwrap(), PaymentMethod::Yape);
        assert_eq!(
            PaymentMethod::from_str("mercadopago").unwrap(),
            PaymentMethod::MercadoPago
        );
        assert!(PaymentMethod::from_str("cheque").is_err());
        assert!(PaymentMethod::Plin.is_manual());
        assert!(!PaymentMethod::Flow.is_manual());
        assert!(PaymentMethod::Cash.is_cash());
    }
}
