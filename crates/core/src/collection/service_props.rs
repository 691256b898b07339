//! Property-based tests for CollectionService.
//!
//! - Late fee is zero when not past due or already paid
//! - Allocation conserves the amount received and never overdraws the balance
//! - Full settlement collects the whole fee, partial settlement collects none
//! - Reversal restores the pre-payment balance

use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::service::{CollectionService, FULL_SETTLEMENT_TOLERANCE, PAID_TOLERANCE};
use super::types::{InstallmentState, LateFeeRate, SettlementKind};

/// Strategy to generate positive amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate fees (0.00 to 100.00).
fn fee() -> impl Strategy<Value = Decimal> {
    (0i64..10_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate rates (0.00% to 10.00%).
fn rate() -> impl Strategy<Value = LateFeeRate> {
    (0i64..=1_000i64).prop_map(|v| LateFeeRate::new(Decimal::new(v, 2)).unwrap())
}

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, 15).unwrap()
}

proptest! {
    #[test]
    fn prop_no_fee_before_due_date(
        balance in positive_amount(),
        days_ahead in 0u64..400,
        rate in rate(),
    ) {
        let today = base_date();
        let installment = InstallmentState {
            amount: balance,
            balance,
            due_date: today.checked_add_days(Days::new(days_ahead)).unwrap(),
        };
        prop_assert_eq!(CollectionService::late_fee(&installment, today, rate), Decimal::ZERO);
    }

    #[test]
    fn prop_no_fee_when_paid(
        days_late in 1u64..400,
        rate in rate(),
    ) {
        let today = base_date();
        let installment = InstallmentState {
            amount: Decimal::ONE_HUNDRED,
            balance: Decimal::ZERO,
            due_date: today.checked_sub_days(Days::new(days_late)).unwrap(),
        };
        prop_assert_eq!(CollectionService::late_fee(&installment, today, rate), Decimal::ZERO);
    }

    #[test]
    fn prop_allocation_conserves_amount(
        amount in positive_amount(),
        balance in positive_amount(),
        fee in fee(),
    ) {
        let s = CollectionService::allocate(amount, balance, fee).unwrap();

        prop_assert_eq!(s.fee_applied + s.principal_applied + s.change, amount);
        prop_assert!(s.change >= Decimal::ZERO);
        prop_assert!(s.principal_applied <= balance);
        prop_assert!(s.balance_after >= Decimal::ZERO);
        prop_assert!(s.balance_after <= balance);
        prop_assert_eq!(s.balance_after + s.principal_applied + s.written_off, balance);
    }

    #[test]
    fn prop_settlement_kind_rules(
        amount in positive_amount(),
        balance in positive_amount(),
        fee in fee(),
    ) {
        let s = CollectionService::allocate(amount, balance, fee).unwrap();

        match s.kind {
            SettlementKind::Full => {
                prop_assert!(amount >= balance + fee - FULL_SETTLEMENT_TOLERANCE);
                prop_assert_eq!(s.fee_applied, fee.min(amount));
                prop_assert_eq!(s.fee_waived, Decimal::ZERO);
            }
            SettlementKind::Partial => {
                prop_assert_eq!(s.fee_applied, Decimal::ZERO);
                prop_assert_eq!(s.fee_waived, fee);
                prop_assert_eq!(s.principal_applied, amount.min(balance));
            }
        }
        prop_assert_eq!(s.is_paid(), balance - s.principal_applied <= PAID_TOLERANCE);
    }

    #[test]
    fn prop_reverse_restores_balance(
        amount in positive_amount(),
        balance in positive_amount(),
        fee in fee(),
    ) {
        let s = CollectionService::allocate(amount, balance, fee).unwrap();
        let r = CollectionService::reverse(balance, s.balance_after, s.balance_before, s.balance_after)
            .unwrap();
        prop_assert_eq!(r.restored_balance, balance);
    }
}
