//! `SeaORM` active enums mirroring the Postgres enum types.
//!
//! Each enum converts to and from its `lendshop-core` counterpart so that
//! repositories can hand domain values to the core services.

use lendshop_core::{cash, client, collection, schedule};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "document_type")]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    #[sea_orm(string_value = "dni")]
    Dni,
    #[sea_orm(string_value = "ruc")]
    Ruc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "loan_frequency")]
#[serde(rename_all = "lowercase")]
pub enum LoanFrequency {
    #[sea_orm(string_value = "daily")]
    Daily,
    #[sea_orm(string_value = "weekly")]
    Weekly,
    #[sea_orm(string_value = "biweekly")]
    Biweekly,
    #[sea_orm(string_value = "monthly")]
    Monthly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "loan_status")]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "installment_status")]
#[serde(rename_all = "lowercase")]
pub enum InstallmentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "partial")]
    Partial,
    #[sea_orm(string_value = "paid")]
    Paid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_method")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "cash")]
    Cash,
    #[sea_orm(string_value = "card")]
    Card,
    #[sea_orm(string_value = "yape")]
    Yape,
    #[sea_orm(string_value = "plin")]
    Plin,
    #[sea_orm(string_value = "flow")]
    Flow,
    #[sea_orm(string_value = "mercadopago")]
    MercadoPago,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_status")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "voided")]
    Voided,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "settlement_kind")]
#[serde(rename_all = "lowercase")]
pub enum SettlementKind {
    #[sea_orm(string_value = "full")]
    Full,
    #[sea_orm(string_value = "partial")]
    Partial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "receipt_kind")]
#[serde(rename_all = "lowercase")]
pub enum ReceiptKind {
    #[sea_orm(string_value = "boleta")]
    Boleta,
    #[sea_orm(string_value = "factura")]
    Factura,
}

/// Implements `From` in both directions between a column enum and its
/// domain counterpart when the variants line up one to one.
macro_rules! mirror_enum {
    ($db:ident, $module:ident :: $domain:ident, [$($variant:ident),+ $(,)?]) => {
        impl From<$module::$domain> for $db {
            fn from(value: $module::$domain) -> Self {
                match value {
                    $($module::$domain::$variant => Self::$variant,)+
                }
            }
        }

        impl From<$db> for $module::$domain {
            fn from(value: $db) -> Self {
                match value {
                    $($db::$variant => Self::$variant,)+
                }
            }
        }
    };
}

mirror_enum!(DocumentType, client::DocumentType, [Dni, Ruc]);
mirror_enum!(LoanFrequency, schedule::Frequency, [Daily, Weekly, Biweekly, Monthly]);
mirror_enum!(LoanStatus, schedule::LoanStatus, [Active, Paid, Cancelled]);
mirror_enum!(InstallmentStatus, collection::InstallmentStatus, [Pending, Partial, Paid]);
mirror_enum!(
    PaymentMethod,
    cash::PaymentMethod,
    [Cash, Card, Yape, Plin, Flow, MercadoPago]
);
mirror_enum!(SettlementKind, collection::SettlementKind, [Full, Partial]);
mirror_enum!(ReceiptKind, client::ReceiptKind, [Boleta, Factura]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_method_round_trips_every_variant() {
        for method in cash::PaymentMethod::ALL {
            let column: PaymentMethod = method.into();
            assert_eq!(cash::PaymentMethod::from(column), method);
        }
    }

    #[test]
    fn test_column_values_match_domain_strings() {
        for method in cash::PaymentMethod::ALL {
            let column: PaymentMethod = method.into();
            assert_eq!(column.to_value(), method.as_str());
        }
        let frequency: LoanFrequency = schedule::Frequency::Biweekly.into();
        assert_eq!(frequency.to_value(), schedule::Frequency::Biweekly.as_str());
    }
}
