//! `SeaORM` Entity for payments table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{PaymentMethod, PaymentStatus, SettlementKind};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub installment_id: Uuid,
    pub loan_id: Uuid,
    pub client_id: Uuid,
    pub cash_session_id: Option<Uuid>,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub settlement: SettlementKind,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub amount_received: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub change_given: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub overpayment: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub principal_applied: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub fee_applied: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub fee_waived: Decimal,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub late_fee_rate: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub balance_before: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub balance_after: Decimal,
    pub external_reference: Option<String>,
    pub payer_email: Option<String>,
    pub paid_at: DateTimeWithTimeZone,
    pub voided_at: Option<DateTimeWithTimeZone>,
    pub void_reason: Option<String>,
    pub voided_by: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::installments::Entity",
        from = "Column::InstallmentId",
        to = "super::installments::Column::Id"
    )]
    Installments,
    #[sea_orm(
        belongs_to = "super::loans::Entity",
        from = "Column::LoanId",
        to = "super::loans::Column::Id"
    )]
    Loans,
    #[sea_orm(
        belongs_to = "super::clients::Entity",
        from = "Column::ClientId",
        to = "super::clients::Column::Id"
    )]
    Clients,
    #[sea_orm(
        belongs_to = "super::cash_sessions::Entity",
        from = "Column::CashSessionId",
        to = "super::cash_sessions::Column::Id"
    )]
    CashSessions,
    #[sea_orm(has_one = "super::receipts::Entity")]
    Receipts,
}

impl Related<super::installments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Installments.def()
    }
}

impl Related<super::loans::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Loans.def()
    }
}

impl Related<super::clients::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Clients.def()
    }
}

impl Related<super::cash_sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CashSessions.def()
    }
}

impl Related<super::receipts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Receipts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
