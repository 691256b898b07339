//! Property-based tests for AmortizationService.
//!
//! - Installments add up to the loan total to the cent
//! - Due dates strictly increase
//! - Monthly schedules keep the start day except at month end

use chrono::{Datelike, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::service::AmortizationService;
use super::types::{Frequency, LoanLimits, LoanTerms};

/// Strategy to generate principals (100.00 to 20,000.00).
fn principal() -> impl Strategy<Value = Decimal> {
    (10_000i64..=2_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate interest percentages (0.00 to 50.00).
fn interest() -> impl Strategy<Value = Decimal> {
    (0i64..=5_000i64).prop_map(|v| Decimal::new(v, 2))
}

fn frequency() -> impl Strategy<Value = Frequency> {
    prop_oneof![
        Just(Frequency::Daily),
        Just(Frequency::Weekly),
        Just(Frequency::Biweekly),
        Just(Frequency::Monthly),
    ]
}

fn start_date() -> impl Strategy<Value = NaiveDate> {
    (2020i32..2035, 1u32..=12, 1u32..=31)
        .prop_filter_map("valid date", |(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
}

proptest! {
    #[test]
    fn prop_installments_sum_to_total(
        principal in principal(),
        interest in interest(),
        n in 1u32..=48,
        frequency in frequency(),
        start in start_date(),
    ) {
        let terms = LoanTerms { principal, interest_percent: interest, installments: n, frequency, start_date: start };
        let schedule = AmortizationService::generate_schedule(&terms, &LoanLimits::default()).unwrap();

        prop_assert_eq!(schedule.installments.len(), n as usize);
        prop_assert_eq!(schedule.sum(), schedule.total_amount);
        prop_assert!(schedule.installments.iter().all(|i| i.amount > Decimal::ZERO));
        prop_assert!(schedule.installments.iter().all(|i| i.amount.scale() <= 2));
    }

    #[test]
    fn prop_due_dates_strictly_increase(
        principal in principal(),
        n in 1u32..=48,
        frequency in frequency(),
        start in start_date(),
    ) {
        let terms = LoanTerms { principal, interest_percent: Decimal::ZERO, installments: n, frequency, start_date: start };
        let schedule = AmortizationService::generate_schedule(&terms, &LoanLimits::default()).unwrap();

        prop_assert!(schedule.installments[0].due_date > start);
        for pair in schedule.installments.windows(2) {
            prop_assert!(pair[0].due_date < pair[1].due_date);
        }
    }

    #[test]
    fn prop_monthly_keeps_start_day(
        n in 1u32..=48,
        start in start_date(),
    ) {
        let terms = LoanTerms {
            principal: Decimal::new(1000, 0),
            interest_percent: Decimal::ZERO,
            installments: n,
            frequency: Frequency::Monthly,
            start_date: start,
        };
        let schedule = AmortizationService::generate_schedule(&terms, &LoanLimits::default()).unwrap();

        for installment in &schedule.installments {
            let day = installment.due_date.day();
            if day != start.day() {
                // Clamped: the due date must be the last day of its month.
                let next = installment.due_date.succ_opt().unwrap();
                prop_assert!(day < start.day());
                prop_assert_eq!(next.day(), 1);
            }
        }
    }
}
