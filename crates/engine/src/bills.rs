//! The module contains the `Bill` aggregate root and its table.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{
    EngineError, ResultEngine,
    bill_payments::BillPayment,
    util::{storable_count, stored_count},
};

/// A one-off expense divided among a fixed number of people.
///
/// Invariant after every write: the payment values add up to `total_minor`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bill {
    pub id: i64,
    pub description: String,
    pub total_minor: i64,
    pub person_count: u32,
    pub payments: Vec<BillPayment>,
}

impl Bill {
    /// Sum of every payment value.
    pub fn allocated_minor(&self) -> i64 {
        self.payments.iter().map(|p| p.value_minor).sum()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bills")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub description: String,
    pub total_minor: i64,
    pub person_count: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bill_payments::Entity")]
    BillPayments,
}

impl Related<super::bill_payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BillPayments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<&Bill> for ActiveModel {
    type Error = EngineError;

    fn try_from(bill: &Bill) -> Result<Self, Self::Error> {
        Ok(Self {
            id: if bill.id == 0 {
                ActiveValue::NotSet
            } else {
                ActiveValue::Unchanged(bill.id)
            },
            description: ActiveValue::Set(bill.description.clone()),
            total_minor: ActiveValue::Set(bill.total_minor),
            person_count: ActiveValue::Set(storable_count(bill.person_count, "person_count")?),
        })
    }
}

impl Bill {
    /// Rebuild a bill from its stored row and payment rows.
    pub(crate) fn from_models(
        model: Model,
        payments: Vec<super::bill_payments::Model>,
    ) -> ResultEngine<Self> {
        Ok(Self {
            id: model.id,
            description: model.description,
            total_minor: model.total_minor,
            person_count: stored_count(model.person_count, "person_count")?,
            payments: payments.into_iter().map(BillPayment::from).collect(),
        })
    }
}
