//! Loan and schedule domain types.

use chrono::{Days, Months, NaiveDate};
use lendshop_shared::LendingConfig;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How often installments fall due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Every day.
    Daily,
    /// Every 7 days.
    Weekly,
    /// Every 15 days.
    Biweekly,
    /// Every calendar month.
    Monthly,
}

impl Frequency {
    /// Due date of the installment with the given 1-based sequence.
    ///
    /// Dates are always computed from `start`, so monthly schedules keep the
    /// start day and only clamp it at month end.
    #[must_use]
    pub fn due_date(self, start: NaiveDate, sequence: u32) -> Option<NaiveDate> {
        let step = u64::from(sequence);
        match self {
            Self::Daily => start.checked_add_days(Days::new(step)),
            Self::Weekly => start.checked_add_days(Days::new(step * 7)),
            Self::Biweekly => start.checked_add_days(Days::new(step * 15)),
            Self::Monthly => start.checked_add_months(Months::new(sequence)),
        }
    }

    /// Lowercase name used in storage and JSON.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::Monthly => "monthly",
        }
    }
}

impl std::str::FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "biweekly" => Ok(Self::Biweekly),
            "monthly" => Ok(Self::Monthly),
            _ => Err(format!("Unknown frequency: {s}")),
        }
    }
}

/// Loan lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    /// At least one installment still has a balance.
    Active,
    /// Every installment is paid.
    Paid,
    /// Cancelled before any payment was collected.
    Cancelled,
}

impl LoanStatus {
    /// Status implied by the remaining balances of a non-cancelled loan.
    #[must_use]
    pub fn from_balances<I>(balances: I) -> Self
    where
        I: IntoIterator<Item = Decimal>,
    {
        let mut any = false;
        for balance in balances {
            any = true;
            if balance > Decimal::ZERO {
                return Self::Active;
            }
        }
        if any { Self::Paid } else { Self::Active }
    }
}

/// Origination ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoanLimits {
    /// Largest principal accepted.
    pub max_principal: Decimal,
    /// Largest installment count accepted.
    pub max_installments: u32,
    /// Largest flat interest percentage accepted.
    pub max_interest_percent: Decimal,
}

impl Default for LoanLimits {
    fn default() -> Self {
        Self {
            max_principal: Decimal::new(20_000, 0),
            max_installments: 48,
            max_interest_percent: Decimal::ONE_HUNDRED,
        }
    }
}

impl From<&LendingConfig> for LoanLimits {
    fn from(config: &LendingConfig) -> Self {
        Self {
            max_principal: config.max_principal,
            max_installments: config.max_installments,
            max_interest_percent: config.max_interest_percent,
        }
    }
}

/// Terms requested at origination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanTerms {
    /// Amount lent.
    pub principal: Decimal,
    /// Flat interest percentage over the whole loan.
    pub interest_percent: Decimal,
    /// Number of installments.
    pub installments: u32,
    /// Installment frequency.
    pub frequency: Frequency,
    /// Origination date; the first installment falls one step after it.
    pub start_date: NaiveDate,
}

/// One row of a generated schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledInstallment {
    /// 1-based position in the schedule.
    pub sequence: u32,
    /// Due date.
    pub due_date: NaiveDate,
    /// Nominal amount.
    pub amount: Decimal,
}

/// A generated amortization schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schedule {
    /// Principal plus interest, in cents.
    pub total_amount: Decimal,
    /// Regular installment amount; the last one absorbs the remainder.
    pub installment_amount: Decimal,
    /// Installments ordered by sequence.
    pub installments: Vec<ScheduledInstallment>,
}

impl Schedule {
    /// Sum of every installment amount.
    #[must_use]
    pub fn sum(&self) -> Decimal {
        self.installments.iter().map(|i| i.amount).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_fixed_day_steps() {
        let start = date(2026, 1, 1);
        assert_eq!(Frequency::Daily.due_date(start, 3), Some(date(2026, 1, 4)));
        assert_eq!(Frequency::Weekly.due_date(start, 2), Some(date(2026, 1, 15)));
        assert_eq!(Frequency::Biweekly.due_date(start, 2), Some(date(2026, 1, 31)));
    }

    #[test]
    fn test_monthly_clamps_to_month_end_without_drift() {
        let start = date(2026, 1, 31);
        assert_eq!(Frequency::Monthly.due_date(start, 1), Some(date(2026, 2, 28)));
        assert_eq!(Frequency::Monthly.due_date(start, 2), Some(date(2026, 3, 31)));
        assert_eq!(Frequency::Monthly.due_date(start, 3), Some(date(2026, 4, 30)));
    }

    #[test]
    fn test_frequency_from_str() {
        assert_eq!(Frequency::from_str("MONTHLY").unwrap(), Frequency::Monthly);
        assert_eq!(Frequency::from_str("biweekly").unwrap(), Frequency::Biweekly);
        assert!(Frequency::from_str("yearly").is_err());
    }

    #[test]
    fn test_loan_status_from_balances() {
        assert_eq!(
            LoanStatus::from_balances([dec!(0), dec!(0)]),
            LoanStatus::Paid
        );
        assert_eq!(
            LoanStatus::from_balances([dec!(0), dec!(12.50)]),
            LoanStatus::Active
        );
        assert_eq!(LoanStatus::from_balances(Vec::<Decimal>::new()), LoanStatus::Active);
    }

    #[test]
    fn test_limits_from_config() {
        let config = LendingConfig {
            max_principal: dec!(5000),
            max_installments: 12,
            max_interest_percent: dec!(35),
            ..LendingConfig::default()
        };
        let limits = LoanLimits::from(&config);
        assert_eq!(limits.max_principal, dec!(5000));
        assert_eq!(limits.max_installments, 12);
        assert_eq!(limits.max_interest_percent, dec!(35));
    }
}
