//! `SeaORM` Entity for receipts table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{DocumentType, PaymentMethod, ReceiptKind};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "receipts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub payment_id: Uuid,
    pub kind: ReceiptKind,
    pub series: String,
    pub number: i64,
    pub client_name: String,
    pub document_type: DocumentType,
    pub document_number: String,
    pub client_email: Option<String>,
    pub installment_sequence: i32,
    pub method: PaymentMethod,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub principal_applied: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub fee_applied: Decimal,
    pub issued_at: DateTimeWithTimeZone,
}

impl Model {
    /// Printed receipt number, e.g. `B001-00000042`.
    #[must_use]
    pub fn display_number(&self) -> String {
        format!("{}-{:08}", self.series, self.number)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::payments::Entity",
        from = "Column::PaymentId",
        to = "super::payments::Column::Id"
    )]
    Payments,
}

impl Related<super::payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
