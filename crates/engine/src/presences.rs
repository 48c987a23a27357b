//! Presence rows: how many units of a participant rode on a given date.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{
    ResultEngine,
    util::{storable_count, stored_count},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presence {
    #[serde(default)]
    pub id: i64,
    pub ride_payment_id: i64,
    pub date: NaiveDate,
    pub attendance: u32,
}

impl Presence {
    pub fn new(ride_payment_id: i64, date: NaiveDate, attendance: u32) -> Self {
        Self {
            id: 0,
            ride_payment_id,
            date,
            attendance,
        }
    }
}

/// Presence rows sharing one date. Never stored as such.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupedPresence {
    pub date: NaiveDate,
    pub presences: Vec<Presence>,
}

/// Group presences by date (ascending), each group ordered by owning
/// payment id (ascending).
pub fn group_presences(presences: Vec<Presence>) -> Vec<GroupedPresence> {
    let mut by_date: BTreeMap<NaiveDate, Vec<Presence>> = BTreeMap::new();
    for presence in presences {
        by_date.entry(presence.date).or_default().push(presence);
    }
    by_date
        .into_iter()
        .map(|(date, mut presences)| {
            presences.sort_by_key(|p| (p.ride_payment_id, p.id));
            GroupedPresence { date, presences }
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "presences")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub ride_payment_id: i64,
    pub date: Date,
    pub attendance: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::ride_payments::Entity",
        from = "Column::RidePaymentId",
        to = "super::ride_payments::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    RidePayments,
}

impl Related<super::ride_payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RidePayments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<&Presence> for ActiveModel {
    type Error = crate::EngineError;

    fn try_from(presence: &Presence) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ActiveValue::NotSet,
            ride_payment_id: ActiveValue::Set(presence.ride_payment_id),
            date: ActiveValue::Set(presence.date),
            attendance: ActiveValue::Set(storable_count(presence.attendance, "attendance")?),
        })
    }
}

impl Presence {
    pub(crate) fn from_model(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: model.id,
            ride_payment_id: model.ride_payment_id,
            date: model.date,
            attendance: stored_count(model.attendance, "attendance")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn groups_sorted_by_date_then_payment() {
        let rows = vec![
            Presence::new(2, date(3), 1),
            Presence::new(1, date(2), 2),
            Presence::new(1, date(3), 0),
            Presence::new(2, date(2), 1),
        ];

        let groups = group_presences(rows);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].date, date(2));
        assert_eq!(groups[1].date, date(3));
        let owners: Vec<i64> = groups[1].presences.iter().map(|p| p.ride_payment_id).collect();
        assert_eq!(owners, vec![1, 2]);
        assert_eq!(groups[0].presences[0].attendance, 2);
    }

    #[test]
    fn no_rows_no_groups() {
        assert!(group_presences(Vec::new()).is_empty());
    }
}
