//! The module contains the `Ride` aggregate root and its table.
//!
//! A ride is a recurring cost: every active date between `start_date` and
//! `end_date` costs `unit_cost_minor * occurrence_count`, shared by the
//! people present that day.

use chrono::NaiveDate;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{
    EngineError, MoneyCents, ResultEngine,
    presences::GroupedPresence,
    ride_payments::RidePayment,
    util::{storable_count, stored_count},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ride {
    pub id: i64,
    pub description: String,
    pub unit_cost_minor: i64,
    pub occurrence_count: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub include_weekends: bool,
    pub payments: Vec<RidePayment>,
    /// Read-side projection of the presence rows, see [`GroupedPresence`].
    #[serde(default)]
    pub presence_groups: Vec<GroupedPresence>,
}

impl Ride {
    /// Cost of one active date.
    pub fn daily_cost_minor(&self) -> ResultEngine<i64> {
        daily_cost_minor(self.unit_cost_minor, self.occurrence_count)
    }

    /// Sum of every payment value.
    pub fn allocated_minor(&self) -> i64 {
        self.payments.iter().map(|p| p.value_minor).sum()
    }
}

pub(crate) fn daily_cost_minor(unit_cost_minor: i64, occurrence_count: u32) -> ResultEngine<i64> {
    MoneyCents::new(unit_cost_minor)
        .checked_mul(occurrence_count)
        .map(MoneyCents::cents)
        .ok_or_else(|| EngineError::Validation("daily ride cost overflows".to_string()))
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "rides")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub description: String,
    pub unit_cost_minor: i64,
    pub occurrence_count: i32,
    pub start_date: Date,
    pub end_date: Date,
    pub include_weekends: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ride_payments::Entity")]
    RidePayments,
}

impl Related<super::ride_payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RidePayments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<&Ride> for ActiveModel {
    type Error = EngineError;

    fn try_from(ride: &Ride) -> Result<Self, Self::Error> {
        Ok(Self {
            id: if ride.id == 0 {
                ActiveValue::NotSet
            } else {
                ActiveValue::Unchanged(ride.id)
            },
            description: ActiveValue::Set(ride.description.clone()),
            unit_cost_minor: ActiveValue::Set(ride.unit_cost_minor),
            occurrence_count: ActiveValue::Set(storable_count(
                ride.occurrence_count,
                "occurrence_count",
            )?),
            start_date: ActiveValue::Set(ride.start_date),
            end_date: ActiveValue::Set(ride.end_date),
            include_weekends: ActiveValue::Set(ride.include_weekends),
        })
    }
}

impl Ride {
    /// Rebuild a ride root from its stored row, without children.
    pub(crate) fn from_model(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: model.id,
            description: model.description,
            unit_cost_minor: model.unit_cost_minor,
            occurrence_count: stored_count(model.occurrence_count, "occurrence_count")?,
            start_date: model.start_date,
            end_date: model.end_date,
            include_weekends: model.include_weekends,
            payments: Vec::new(),
            presence_groups: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daily_cost_multiplies_occurrences() {
        assert_eq!(daily_cost_minor(1000, 2).unwrap(), 2000);
        assert_eq!(daily_cost_minor(1000, 0).unwrap(), 0);
        assert!(daily_cost_minor(i64::MAX, 2).is_err());
    }
}
