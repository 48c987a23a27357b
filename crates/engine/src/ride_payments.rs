//! The module contains `RidePayment`, one participant of a ride.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::reconcile::Identified;

/// One participant of a [`Ride`](crate::Ride).
///
/// `value_minor` is always derived from the presence rows; whatever the
/// caller sends in it is ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RidePayment {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub ride_id: i64,
    #[serde(default)]
    pub person: String,
    #[serde(default)]
    pub value_minor: i64,
    #[serde(default)]
    pub is_paid: bool,
}

impl RidePayment {
    pub fn new(person: impl Into<String>) -> Self {
        Self {
            person: person.into(),
            ..Default::default()
        }
    }

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

impl Identified for RidePayment {
    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ride_payments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub ride_id: i64,
    pub person: String,
    pub value_minor: i64,
    pub is_paid: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::rides::Entity",
        from = "Column::RideId",
        to = "super::rides::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Rides,
    #[sea_orm(has_many = "super::presences::Entity")]
    Presences,
}

impl Related<super::rides::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rides.def()
    }
}

impl Related<super::presences::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Presences.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for RidePayment {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            ride_id: model.ride_id,
            person: model.person,
            value_minor: model.value_minor,
            is_paid: model.is_paid,
        }
    }
}
