//! `SeaORM` Entity for loans table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{LoanFrequency, LoanStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "loans")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub client_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub principal: Decimal,
    #[sea_orm(column_type = "Decimal(Some((7, 2)))")]
    pub interest_percent: Decimal,
    pub installment_count: i32,
    pub frequency: LoanFrequency,
    pub start_date: Date,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub total_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub installment_amount: Decimal,
    pub status: LoanStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub closed_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::clients::Entity",
        from = "Column::ClientId",
        to = "super::clients::Column::Id"
    )]
    Clients,
    #[sea_orm(has_many = "super::installments::Entity")]
    Installments,
    #[sea_orm(has_many = "super::payments::Entity")]
    Payments,
}

impl Related<super::clients::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Clients.def()
    }
}

impl Related<super::installments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Installments.def()
    }
}

impl Related<super::payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
