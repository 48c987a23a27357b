use std::collections::HashMap;

use chrono::NaiveDate;
use sea_orm::{ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    EngineError, NewRideCmd, Presence, ResultEngine, Ride, RidePayment, UpdateRideCmd,
    calendar::active_dates,
    distribution::{AttendanceIndex, attendance_index, distribute, presence_grid},
    presences::{self, group_presences},
    reconcile::reconcile,
    ride_payments, rides,
    rides::daily_cost_minor,
    util::{default_person_label, ensure_non_negative, normalize_label, normalize_required_text},
};

use super::{Engine, with_tx};

/// Root fields shared by create and update, checked before any write.
struct RideShape {
    description: String,
    daily_cost_minor: i64,
    dates: Vec<NaiveDate>,
}

impl Engine {
    fn ride_shape(
        &self,
        description: &str,
        unit_cost_minor: i64,
        occurrence_count: u32,
        start_date: NaiveDate,
        end_date: NaiveDate,
        include_weekends: bool,
    ) -> ResultEngine<RideShape> {
        let description = normalize_required_text(description, "ride description")?;
        ensure_non_negative(unit_cost_minor, "ride unit cost")?;
        let daily_cost = daily_cost_minor(unit_cost_minor, occurrence_count)?;
        let dates = active_dates(
            self.calendar.as_ref(),
            start_date,
            end_date,
            include_weekends,
        )?;
        Ok(RideShape {
            description,
            daily_cost_minor: daily_cost,
            dates,
        })
    }

    /// Return a ride with its payments and its presences grouped by date.
    pub async fn ride(&self, ride_id: i64) -> ResultEngine<Ride> {
        with_tx!(self, |db_tx| {
            let ride = load_ride(&db_tx, ride_id).await?;
            Ok(ride)
        })
    }

    /// Return every ride, newest first, with payments but without presences.
    pub async fn rides(&self) -> ResultEngine<Vec<Ride>> {
        with_tx!(self, |db_tx| {
            let models = rides::Entity::find()
                .order_by_desc(rides::Column::Id)
                .all(&db_tx)
                .await?;
            let mut payments_by_ride: HashMap<i64, Vec<RidePayment>> = HashMap::new();
            for payment in ride_payments::Entity::find()
                .order_by_asc(ride_payments::Column::Id)
                .all(&db_tx)
                .await?
            {
                payments_by_ride
                    .entry(payment.ride_id)
                    .or_default()
                    .push(payment.into());
            }

            let mut rides = Vec::with_capacity(models.len());
            for model in models {
                let mut ride = Ride::from_model(model)?;
                ride.payments = payments_by_ride.remove(&ride.id).unwrap_or_default();
                rides.push(ride);
            }
            Ok(rides)
        })
    }

    /// Create a ride, one zero-valued payment per participant and one
    /// zero-attendance presence per (active date, payment).
    pub async fn new_ride(&self, cmd: NewRideCmd) -> ResultEngine<Ride> {
        let shape = self.ride_shape(
            &cmd.description,
            cmd.unit_cost_minor,
            cmd.occurrence_count,
            cmd.start_date,
            cmd.end_date,
            cmd.include_weekends,
        )?;

        with_tx!(self, |db_tx| {
            let root = Ride {
                id: 0,
                description: shape.description,
                unit_cost_minor: cmd.unit_cost_minor,
                occurrence_count: cmd.occurrence_count,
                start_date: cmd.start_date,
                end_date: cmd.end_date,
                include_weekends: cmd.include_weekends,
                payments: Vec::new(),
                presence_groups: Vec::new(),
            };
            let ride_id = rides::ActiveModel::try_from(&root)?
                .insert(&db_tx)
                .await?
                .id;

            let mut payment_ids = Vec::with_capacity(cmd.participants.len());
            for (position, label) in cmd.participants.iter().enumerate() {
                let person =
                    normalize_label(label).unwrap_or_else(|| default_person_label(position + 1));
                let stored = ride_payments::ActiveModel {
                    id: ActiveValue::NotSet,
                    ride_id: ActiveValue::Set(ride_id),
                    person: ActiveValue::Set(person),
                    value_minor: ActiveValue::Set(0),
                    is_paid: ActiveValue::Set(false),
                }
                .insert(&db_tx)
                .await?;
                payment_ids.push(stored.id);
            }

            let grid = presence_grid(&shape.dates, &payment_ids, &AttendanceIndex::new());
            insert_presences(&db_tx, &grid).await?;

            tracing::info!(
                ride_id,
                payments = payment_ids.len(),
                active_dates = shape.dates.len(),
                "ride created"
            );
            load_ride(&db_tx, ride_id).await
        })
    }

    /// Replace a ride's root fields, reconcile its payments and rebuild its
    /// attendance calendar, then recompute every payment value.
    ///
    /// Matching payments only take label and paid flag from the caller; their
    /// value is always derived from attendance. Every presence row of the
    /// ride is regenerated from the (possibly reshaped) calendar, taking the
    /// attendance of `cmd.presence_groups` where a `(date, payment)` pair
    /// matches and 0 elsewhere.
    pub async fn update_ride(&self, cmd: UpdateRideCmd) -> ResultEngine<Ride> {
        let shape = self.ride_shape(
            &cmd.description,
            cmd.unit_cost_minor,
            cmd.occurrence_count,
            cmd.start_date,
            cmd.end_date,
            cmd.include_weekends,
        )?;
        let ride_id = cmd.ride_id;
        let policy = self.unknown_ids;
        let requested = attendance_index(&cmd.presence_groups);

        with_tx!(self, |db_tx| {
            rides::Entity::find_by_id(ride_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!("ride {ride_id}")))?;

            let persisted_ids: Vec<i64> = ride_payments::Entity::find()
                .filter(ride_payments::Column::RideId.eq(ride_id))
                .order_by_asc(ride_payments::Column::Id)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|model| model.id)
                .collect();

            let plan = reconcile(&persisted_ids, cmd.payments, policy)?;
            tracing::debug!(
                ride_id,
                deletes = plan.deletes.len(),
                updates = plan.updates.len(),
                inserts = plan.inserts.len(),
                active_dates = shape.dates.len(),
                "reconciling ride payments"
            );

            // The calendar may change shape, so every presence goes.
            if !persisted_ids.is_empty() {
                presences::Entity::delete_many()
                    .filter(presences::Column::RidePaymentId.is_in(persisted_ids))
                    .exec(&db_tx)
                    .await?;
            }
            if !plan.deletes.is_empty() {
                ride_payments::Entity::delete_many()
                    .filter(ride_payments::Column::Id.is_in(plan.deletes))
                    .exec(&db_tx)
                    .await?;
            }

            let root = Ride {
                id: ride_id,
                description: shape.description,
                unit_cost_minor: cmd.unit_cost_minor,
                occurrence_count: cmd.occurrence_count,
                start_date: cmd.start_date,
                end_date: cmd.end_date,
                include_weekends: cmd.include_weekends,
                payments: Vec::new(),
                presence_groups: Vec::new(),
            };
            rides::ActiveModel::try_from(&root)?.update(&db_tx).await?;

            let mut position = 0;
            let mut next_label = |label: &str| {
                position += 1;
                normalize_label(label).unwrap_or_else(|| default_person_label(position))
            };

            let mut payment_ids = Vec::with_capacity(plan.updates.len() + plan.inserts.len());
            for payment in &plan.updates {
                ride_payments::ActiveModel {
                    id: ActiveValue::Unchanged(payment.id),
                    person: ActiveValue::Set(next_label(&payment.person)),
                    is_paid: ActiveValue::Set(payment.is_paid),
                    ..Default::default()
                }
                .update(&db_tx)
                .await?;
                payment_ids.push(payment.id);
            }
            for payment in &plan.inserts {
                let stored = ride_payments::ActiveModel {
                    id: ActiveValue::NotSet,
                    ride_id: ActiveValue::Set(ride_id),
                    person: ActiveValue::Set(next_label(&payment.person)),
                    value_minor: ActiveValue::Set(0),
                    is_paid: ActiveValue::Set(payment.is_paid),
                }
                .insert(&db_tx)
                .await?;
                payment_ids.push(stored.id);
            }
            payment_ids.sort_unstable();

            let grid = presence_grid(&shape.dates, &payment_ids, &requested);
            insert_presences(&db_tx, &grid).await?;

            let totals = distribute(shape.daily_cost_minor, &payment_ids, &grid)?;
            for (payment_id, value_minor) in totals {
                ride_payments::ActiveModel {
                    id: ActiveValue::Unchanged(payment_id),
                    value_minor: ActiveValue::Set(value_minor),
                    ..Default::default()
                }
                .update(&db_tx)
                .await?;
            }

            tracing::info!(
                ride_id,
                payments = payment_ids.len(),
                presences = grid.len(),
                "ride updated"
            );
            load_ride(&db_tx, ride_id).await
        })
    }

    /// Delete a ride with its payments and presences.
    pub async fn delete_ride(&self, ride_id: i64) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            rides::Entity::find_by_id(ride_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!("ride {ride_id}")))?;

            let payment_ids: Vec<i64> = ride_payments::Entity::find()
                .filter(ride_payments::Column::RideId.eq(ride_id))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|model| model.id)
                .collect();

            if !payment_ids.is_empty() {
                presences::Entity::delete_many()
                    .filter(presences::Column::RidePaymentId.is_in(payment_ids))
                    .exec(&db_tx)
                    .await?;
            }
            ride_payments::Entity::delete_many()
                .filter(ride_payments::Column::RideId.eq(ride_id))
                .exec(&db_tx)
                .await?;
            rides::Entity::delete_by_id(ride_id).exec(&db_tx).await?;

            tracing::info!(ride_id, "ride deleted");
            Ok(())
        })
    }
}

/// Rows per multi-row insert, well under SQLite's bound-parameter limit.
const PRESENCE_BATCH: usize = 250;

async fn insert_presences<C: ConnectionTrait>(db: &C, grid: &[Presence]) -> ResultEngine<()> {
    for batch in grid.chunks(PRESENCE_BATCH) {
        let models = batch
            .iter()
            .map(presences::ActiveModel::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;
        presences::Entity::insert_many(models).exec(db).await?;
    }
    Ok(())
}

async fn load_ride<C: ConnectionTrait>(db: &C, ride_id: i64) -> ResultEngine<Ride> {
    let model = rides::Entity::find_by_id(ride_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound(format!("ride {ride_id}")))?;
    let mut ride = Ride::from_model(model)?;

    ride.payments = ride_payments::Entity::find()
        .filter(ride_payments::Column::RideId.eq(ride_id))
        .order_by_asc(ride_payments::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(RidePayment::from)
        .collect();

    let payment_ids: Vec<i64> = ride.payments.iter().map(|p| p.id).collect();
    let presence_rows = if payment_ids.is_empty() {
        Vec::new()
    } else {
        presences::Entity::find()
            .filter(presences::Column::RidePaymentId.is_in(payment_ids))
            .order_by_asc(presences::Column::Date)
            .order_by_asc(presences::Column::RidePaymentId)
            .all(db)
            .await?
    };
    let stored = presence_rows
        .into_iter()
        .map(Presence::from_model)
        .collect::<ResultEngine<Vec<_>>>()?;
    ride.presence_groups = group_presences(stored);

    Ok(ride)
}
