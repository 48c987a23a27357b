//! The module contains `BillPayment`, the share of a bill owed by one person.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::reconcile::Identified;

/// One person's share of a [`Bill`](crate::Bill).
///
/// `id == 0` marks a payment that has not been stored yet. A custom payment
/// keeps its `value_minor` when the bill is recomputed; every other payment
/// receives an equal part of what the custom ones leave.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillPayment {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub bill_id: i64,
    #[serde(default)]
    pub person: String,
    #[serde(default)]
    pub value_minor: i64,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub is_custom: bool,
}

impl BillPayment {
    /// A new, proportional payment for `person`.
    pub fn new(person: impl Into<String>) -> Self {
        Self {
            person: person.into(),
            ..Default::default()
        }
    }

    /// A new payment with a value fixed by the caller.
    pub fn custom(person: impl Into<String>, value_minor: i64) -> Self {
        Self {
            person: person.into(),
            value_minor,
            is_custom: true,
            ..Default::default()
        }
    }

    /// Refer to an already stored payment.
    #[must_use]
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn paid(mut self, is_paid: bool) -> Self {
        self.is_paid = is_paid;
        self
    }
}

impl Identified for BillPayment {
    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bill_payments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub bill_id: i64,
    pub person: String,
    pub value_minor: i64,
    pub is_paid: bool,
    pub is_custom: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bills::Entity",
        from = "Column::BillId",
        to = "super::bills::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Bills,
}

impl Related<super::bills::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bills.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&BillPayment> for ActiveModel {
    fn from(payment: &BillPayment) -> Self {
        Self {
            id: if payment.id == 0 {
                ActiveValue::NotSet
            } else {
                ActiveValue::Unchanged(payment.id)
            },
            bill_id: ActiveValue::Set(payment.bill_id),
            person: ActiveValue::Set(payment.person.clone()),
            value_minor: ActiveValue::Set(payment.value_minor),
            is_paid: ActiveValue::Set(payment.is_paid),
            is_custom: ActiveValue::Set(payment.is_custom),
        }
    }
}

impl From<Model> for BillPayment {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            bill_id: model.bill_id,
            person: model.person,
            value_minor: model.value_minor,
            is_paid: model.is_paid,
            is_custom: model.is_custom,
        }
    }
}
