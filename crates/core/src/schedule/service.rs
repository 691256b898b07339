//! Amortization schedule generation.

use lendshop_shared::types::{is_cents, round2};
use rust_decimal::Decimal;

use super::error::ScheduleError;
use super::types::{LoanLimits, LoanTerms, Schedule, ScheduledInstallment};

/// Amortization service for business logic.
pub struct AmortizationService;

impl AmortizationService {
    /// Checks loan terms against the origination rules.
    ///
    /// # Errors
    ///
    /// Returns a `ScheduleError` describing the first rule that fails.
    pub fn validate_terms(terms: &LoanTerms, limits: &LoanLimits) -> Result<(), ScheduleError> {
        if terms.principal <= Decimal::ZERO {
            return Err(ScheduleError::NonPositivePrincipal);
        }
        if terms.interest_percent < Decimal::ZERO {
            return Err(ScheduleError::NegativeInterest);
        }
        for amount in [terms.principal, terms.interest_percent] {
            if !is_cents(amount) {
                return Err(ScheduleError::SubCentAmount(amount));
            }
        }
        if terms.installments == 0 {
            return Err(ScheduleError::NoInstallments);
        }
        if terms.principal > limits.max_principal {
            return Err(ScheduleError::PrincipalAboveLimit {
                max: limits.max_principal,
            });
        }
        if terms.installments > limits.max_installments {
            return Err(ScheduleError::TooManyInstallments {
                max: limits.max_installments,
            });
        }
        if terms.interest_percent > limits.max_interest_percent {
            return Err(ScheduleError::InterestAboveLimit {
                max: limits.max_interest_percent,
            });
        }
        Ok(())
    }

    /// Total amount owed: principal plus flat interest, rounded to cents.
    ///
    /// # Errors
    ///
    /// Returns `ScheduleError::AmountOverflow` when the total does not fit
    /// in a `Decimal`.
    pub fn total_amount(
        principal: Decimal,
        interest_percent: Decimal,
    ) -> Result<Decimal, ScheduleError> {
        let factor = Decimal::ONE
            .checked_add(interest_percent / Decimal::ONE_HUNDRED)
            .ok_or(ScheduleError::AmountOverflow)?;
        principal
            .checked_mul(factor)
            .map(round2)
            .ok_or(ScheduleError::AmountOverflow)
    }

    /// Builds the installment schedule for validated terms.
    ///
    /// Every installment carries `round2(total / n)` except the last, which
    /// takes whatever is left so that the amounts add up to the total.
    ///
    /// # Errors
    ///
    /// Returns a `ScheduleError` when the terms break an origination rule or
    /// the total cannot be split into positive installments.
    pub fn generate_schedule(
        terms: &LoanTerms,
        limits: &LoanLimits,
    ) -> Result<Schedule, ScheduleError> {
        Self::validate_terms(terms, limits)?;

        let total = Self::total_amount(terms.principal, terms.interest_percent)?;
        let count = Decimal::from(terms.installments);
        let regular = round2(total / count);
        let last = total - regular * (count - Decimal::ONE);

        if regular <= Decimal::ZERO || last <= Decimal::ZERO {
            return Err(ScheduleError::AmountTooSmall {
                total,
                installments: terms.installments,
            });
        }

        let mut installments = Vec::with_capacity(terms.installments as usize);
        for sequence in 1..=terms.installments {
            let due_date = terms
                .frequency
                .due_date(terms.start_date, sequence)
                .ok_or(ScheduleError::DateOutOfRange(sequence))?;
            let amount = if sequence == terms.installments {
                last
            } else {
                regular
            };
            installments.push(ScheduledInstallment {
                sequence,
                due_date,
                amount,
            });
        }

        Ok(Schedule {
            total_amount: total,
            installment_amount: regular,
            installments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::Frequency;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn terms(principal: Decimal, interest: Decimal, n: u32, frequency: Frequency) -> LoanTerms {
        LoanTerms {
            principal,
            interest_percent: interest,
            installments: n,
            frequency,
            start_date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
        }
    }

    #[test]
    fn test_even_monthly_schedule() {
        let schedule = AmortizationService::generate_schedule(
            &terms(dec!(1000), dec!(0), 10, Frequency::Monthly),
            &LoanLimits::default(),
        )
        .unwrap();

        assert_eq!(schedule.total_amount, dec!(1000));
        assert_eq!(schedule.installments.len(), 10);
        assert!(schedule.installments.iter().all(|i| i.amount == dec!(100.00)));
        assert_eq!(
            schedule.installments[0].due_date,
            NaiveDate::from_ymd_opt(2026, 2, 15).unwrap()
        );
        assert_eq!(
            schedule.installments[9].due_date,
            NaiveDate::from_ymd_opt(2026, 11, 15).unwrap()
        );
    }

    #[test]
    fn test_remainder_goes_to_last_installment() {
        let schedule = AmortizationService::generate_schedule(
            &terms(dec!(100), dec!(0), 3, Frequency::Weekly),
            &LoanLimits::default(),
        )
        .unwrap();

        assert_eq!(schedule.installment_amount, dec!(33.33));
        assert_eq!(schedule.installments[2].amount, dec!(33.34));
        assert_eq!(schedule.sum(), dec!(100));
    }

    #[test]
    fn test_interest_is_flat_over_total() {
        let schedule = AmortizationService::generate_schedule(
            &terms(dec!(1000), dec!(10), 4, Frequency::Biweekly),
            &LoanLimits::default(),
        )
        .unwrap();

        assert_eq!(schedule.total_amount, dec!(1100.00));
        assert_eq!(schedule.installment_amount, dec!(275.00));
    }

    #[test]
    fn test_rejects_limits() {
        let limits = LoanLimits::default();
        assert_eq!(
            AmortizationService::generate_schedule(
                &terms(dec!(20000.01), dec!(0), 10, Frequency::Monthly),
                &limits
            ),
            Err(ScheduleError::PrincipalAboveLimit { max: dec!(20000) })
        );
        assert_eq!(
            AmortizationService::generate_schedule(
                &terms(dec!(1000), dec!(0), 49, Frequency::Monthly),
                &limits
            ),
            Err(ScheduleError::TooManyInstallments { max: 48 })
        );
    }

    #[test]
    fn test_rejects_bad_terms() {
        let limits = LoanLimits::default();
        assert_eq!(
            AmortizationService::validate_terms(&terms(dec!(0), dec!(0), 1, Frequency::Daily), &limits),
            Err(ScheduleError::NonPositivePrincipal)
        );
        assert_eq!(
            AmortizationService::validate_terms(&terms(dec!(10), dec!(-1), 1, Frequency::Daily), &limits),
            Err(ScheduleError::NegativeInterest)
        );
        assert_eq!(
            AmortizationService::validate_terms(&terms(dec!(10), dec!(0), 0, Frequency::Daily), &limits),
            Err(ScheduleError::NoInstallments)
        );
    }

    #[test]
    fn test_rejects_interest_above_ceiling() {
        let limits = LoanLimits::default();
        assert_eq!(
            AmortizationService::validate_terms(&terms(dec!(1000), dec!(100.01), 4, Frequency::Weekly), &limits),
            Err(ScheduleError::InterestAboveLimit { max: dec!(100) })
        );
        let huge = Decimal::MAX;
        assert_eq!(
            AmortizationService::generate_schedule(&terms(dec!(20000), huge, 4, Frequency::Weekly), &limits),
            Err(ScheduleError::InterestAboveLimit { max: dec!(100) })
        );
        assert!(AmortizationService::validate_terms(&terms(dec!(1000), dec!(100), 4, Frequency::Weekly), &limits).is_ok());
    }

    #[test]
    fn test_total_amount_overflow_is_an_error() {
        assert_eq!(
            AmortizationService::total_amount(dec!(20000), Decimal::MAX),
            Err(ScheduleError::AmountOverflow)
        );
        assert_eq!(AmortizationService::total_amount(dec!(1000), dec!(20)), Ok(dec!(1200.00)));
    }

    #[test]
    fn test_rejects_sub_cent_terms() {
        let limits = LoanLimits::default();
        assert_eq!(
            AmortizationService::validate_terms(&terms(dec!(100.005), dec!(0), 1, Frequency::Daily), &limits),
            Err(ScheduleError::SubCentAmount(dec!(100.005)))
        );
        assert_eq!(
            AmortizationService::validate_terms(&terms(dec!(100), dec!(12.345), 1, Frequency::Daily), &limits),
            Err(ScheduleError::SubCentAmount(dec!(12.345)))
        );
    }

    #[test]
    fn test_rejects_amount_too_small_to_split() {
        let result = AmortizationService::generate_schedule(
            &terms(dec!(0.72), dec!(0), 48, Frequency::Daily),
            &LoanLimits::default(),
        );
        assert!(matches!(result, Err(ScheduleError::AmountTooSmall { .. })));
    }
}
