//! Cash drawer domain types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How a payment was collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Notes and coins into the drawer.
    Cash,
    /// Card terminal.
    Card,
    /// Yape wallet transfer.
    Yape,
    /// Plin wallet transfer.
    Plin,
    /// Flow checkout.
    Flow,
    /// MercadoPago checkout.
    #[serde(rename = "mercadopago")]
    MercadoPago,
}

impl PaymentMethod {
    /// Every method, in display order.
    pub const ALL: [Self; 6] = [
        Self::Cash,
        Self::Card,
        Self::Yape,
        Self::Plin,
        Self::Flow,
        Self::MercadoPago,
    ];

    /// Whether the money lands in the drawer.
    #[must_use]
    pub const fn is_cash(self) -> bool {
        matches!(self, Self::Cash)
    }

    /// Whether an operator may record this method by hand.
    #[must_use]
    pub const fn is_manual(self) -> bool {
        matches!(self, Self::Cash | Self::Card | Self::Yape | Self::Plin)
    }

    /// Lowercase name used in storage and JSON.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
            Self::Yape => "yape",
            Self::Plin => "plin",
            Self::Flow => "flow",
            Self::MercadoPago => "mercadopago",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown payment method: {s}"))
    }
}

/// Money received above the amount collected, split by where it ends up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExcessSplit {
    /// Handed back to the client at the counter.
    pub change: Decimal,
    /// Kept by a checkout gateway that charged more than was owed.
    pub overpayment: Decimal,
}

/// Collections per payment method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MethodTotals {
    /// Cash.
    pub cash: Decimal,
    /// Card.
    pub card: Decimal,
    /// Yape.
    pub yape: Decimal,
    /// Plin.
    pub plin: Decimal,
    /// Flow.
    pub flow: Decimal,
    /// MercadoPago.
    pub mercadopago: Decimal,
}

impl MethodTotals {
    /// Adds an amount to the bucket of its method.
    pub fn add(&mut self, method: PaymentMethod, amount: Decimal) {
        let bucket = match method {
            PaymentMethod::Cash => &mut self.cash,
            PaymentMethod::Card => &mut self.card,
            PaymentMethod::Yape => &mut self.yape,
            PaymentMethod::Plin => &mut self.plin,
            PaymentMethod::Flow => &mut self.flow,
            PaymentMethod::MercadoPago => &mut self.mercadopago,
        };
        *bucket += amount;
    }

    /// Everything that did not go into the drawer.
    #[must_use]
    pub fn bank_total(&self) -> Decimal {
        self.card + self.yape + self.plin + self.flow + self.mercadopago
    }

    /// Everything collected.
    #[must_use]
    pub fn grand_total(&self) -> Decimal {
        self.cash + self.bank_total()
    }
}

/// Drawer position for an open session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DrawerSummary {
    /// Cash placed in the drawer at open.
    pub opening_float: Decimal,
    /// Collections per method.
    pub totals: MethodTotals,
    /// Opening float plus cash collections.
    pub expected_cash: Decimal,
    /// Non-cash collections.
    pub bank_total: Decimal,
    /// All collections.
    pub grand_total: Decimal,
    /// Number of approved payments counted.
    pub payment_count: u64,
}

/// Result of comparing counted cash to the expected drawer cash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloseOutcome {
    /// Counted equals expected.
    Balanced,
    /// More cash than expected.
    Surplus,
    /// Less cash than expected.
    Shortfall,
}

/// An accepted drawer close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DrawerClose {
    /// Expected drawer cash.
    pub expected_cash: Decimal,
    /// Cash physically counted.
    pub counted_cash: Decimal,
    /// Counted minus expected.
    pub variance: Decimal,
    /// Classification of the variance.
    pub outcome: CloseOutcome,
}
