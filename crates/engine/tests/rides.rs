use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    ChronoCalendar, Engine, ErrorKind, NewRideCmd, Ride, RidePayment, UnknownIdPolicy,
    UpdateRideCmd, active_dates,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn count_rows(db: &DatabaseConnection, table: &str) -> i64 {
    let backend = db.get_database_backend();
    let row = db
        .query_one(Statement::from_string(
            backend,
            format!("SELECT COUNT(*) AS n FROM {table}"),
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get("", "n").unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// 2024-01-01 is a Monday.
fn monday() -> NaiveDate {
    date(2024, 1, 1)
}

fn values(ride: &Ride) -> Vec<i64> {
    ride.payments.iter().map(|p| p.value_minor).collect()
}

async fn two_person_ride(engine: &Engine, start: NaiveDate, end: NaiveDate) -> Ride {
    engine
        .new_ride(
            NewRideCmd::new("Commute", 1_000, 1, start, end)
                .participant("Alice")
                .participant("Bob"),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn new_ride_builds_empty_calendar() {
    let (engine, db) = engine_with_db().await;

    let ride = two_person_ride(&engine, monday(), date(2024, 1, 7)).await;

    assert_eq!(ride.payments.len(), 2);
    assert_eq!(values(&ride), vec![0, 0]);
    assert_eq!(ride.presence_groups.len(), 5);
    assert!(ride.presence_groups.iter().all(|g| g.presences.len() == 2));
    assert!(
        ride.presence_groups
            .iter()
            .flat_map(|g| &g.presences)
            .all(|p| p.attendance == 0)
    );
    assert_eq!(count_rows(&db, "presences").await, 10);
}

#[tokio::test]
async fn attendance_splits_daily_cost() {
    let (engine, _db) = engine_with_db().await;
    let ride = two_person_ride(&engine, monday(), monday()).await;
    let (alice, bob) = (ride.payments[0].id, ride.payments[1].id);

    let updated = engine
        .update_ride(
            UpdateRideCmd::from_ride(&ride)
                .attendance(alice, monday(), 1)
                .attendance(bob, monday(), 3),
        )
        .await
        .unwrap();

    assert_eq!(values(&updated), vec![250, 750]);
    assert_eq!(updated.allocated_minor(), 1_000);
    assert_eq!(engine.ride(ride.id).await.unwrap(), updated);
}

#[tokio::test]
async fn weekend_only_ride_costs_nothing() {
    let (engine, db) = engine_with_db().await;
    let saturday = date(2024, 1, 6);
    let sunday = date(2024, 1, 7);
    let ride = two_person_ride(&engine, saturday, sunday).await;
    assert!(ride.presence_groups.is_empty());

    let updated = engine
        .update_ride(
            UpdateRideCmd::from_ride(&ride).attendance(ride.payments[0].id, saturday, 2),
        )
        .await
        .unwrap();

    assert_eq!(values(&updated), vec![0, 0]);
    assert!(updated.presence_groups.is_empty());
    assert_eq!(count_rows(&db, "presences").await, 0);
}

#[tokio::test]
async fn every_attended_day_is_fully_shared() {
    let (engine, _db) = engine_with_db().await;
    let friday = date(2024, 1, 5);
    let ride = engine
        .new_ride(
            NewRideCmd::new("Carpool", 333, 2, monday(), friday)
                .participant("A")
                .participant("B")
                .participant("C"),
        )
        .await
        .unwrap();
    let ids: Vec<i64> = ride.payments.iter().map(|p| p.id).collect();

    let mut cmd = UpdateRideCmd::from_ride(&ride);
    let mut attended_days = 0;
    for (offset, group) in ride.presence_groups.iter().enumerate() {
        if offset == 2 {
            continue;
        }
        attended_days += 1;
        for (slot, id) in ids.iter().enumerate() {
            cmd = cmd.attendance(*id, group.date, ((offset + slot) % 3) as u32);
        }
    }
    let updated = engine.update_ride(cmd).await.unwrap();

    assert_eq!(updated.allocated_minor(), 666 * attended_days);
}

#[tokio::test]
async fn reshaped_calendar_keeps_matching_attendance() {
    let (engine, _db) = engine_with_db().await;
    let friday = date(2024, 1, 5);
    let next_monday = date(2024, 1, 8);
    let ride = two_person_ride(&engine, monday(), friday).await;
    let (alice, bob) = (ride.payments[0].id, ride.payments[1].id);

    let ride = engine
        .update_ride(
            UpdateRideCmd::from_ride(&ride)
                .attendance(alice, monday(), 1)
                .attendance(bob, friday, 1),
        )
        .await
        .unwrap();
    assert_eq!(values(&ride), vec![1_000, 1_000]);

    let mut cmd = UpdateRideCmd::from_ride(&ride);
    cmd.start_date = date(2024, 1, 2);
    cmd.end_date = next_monday;
    let ride = engine
        .update_ride(cmd.attendance(alice, next_monday, 1))
        .await
        .unwrap();

    let dates: Vec<NaiveDate> = ride.presence_groups.iter().map(|g| g.date).collect();
    assert_eq!(dates.first(), Some(&date(2024, 1, 2)));
    assert_eq!(dates.last(), Some(&next_monday));
    assert_eq!(dates.len(), 5);
    assert_eq!(values(&ride), vec![1_000, 1_000]);
}

#[tokio::test]
async fn participants_are_reconciled() {
    let (engine, db) = engine_with_db().await;
    let ride = two_person_ride(&engine, monday(), monday()).await;
    let (alice, bob) = (ride.payments[0].id, ride.payments[1].id);

    let mut cmd = UpdateRideCmd::from_ride(&ride);
    cmd.payments = vec![
        RidePayment::new("Alice").with_id(alice).paid(true),
        RidePayment::new("Carol"),
    ];
    let ride = engine.update_ride(cmd).await.unwrap();

    assert_eq!(ride.payments.len(), 2);
    assert_eq!(ride.payments[0].id, alice);
    assert!(ride.payments[0].is_paid);
    let carol = ride.payments[1].id;
    assert!(carol != alice && carol != bob);
    assert_eq!(ride.payments[1].person, "Carol");
    assert_eq!(count_rows(&db, "ride_payments").await, 2);
    assert_eq!(count_rows(&db, "presences").await, 2);

    let ride = engine
        .update_ride(UpdateRideCmd::from_ride(&ride).attendance(carol, monday(), 1))
        .await
        .unwrap();
    assert_eq!(values(&ride), vec![0, 1_000]);
}

#[tokio::test]
async fn updating_one_ride_leaves_another_alone() {
    let (engine, _db) = engine_with_db().await;
    let first = two_person_ride(&engine, monday(), monday()).await;
    let first = engine
        .update_ride(UpdateRideCmd::from_ride(&first).attendance(first.payments[0].id, monday(), 1))
        .await
        .unwrap();
    let second = two_person_ride(&engine, monday(), monday()).await;

    engine
        .update_ride(
            UpdateRideCmd::from_ride(&second).attendance(second.payments[1].id, monday(), 1),
        )
        .await
        .unwrap();

    assert_eq!(engine.ride(first.id).await.unwrap(), first);
}

#[tokio::test]
async fn invalid_rides_are_rejected() {
    let (engine, db) = engine_with_db().await;

    let err = engine
        .new_ride(NewRideCmd::new("Back", 100, 1, date(2024, 1, 5), monday()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailure);

    let err = engine
        .new_ride(NewRideCmd::new("Negative", -1, 1, monday(), monday()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailure);

    assert_eq!(count_rows(&db, "rides").await, 0);

    let ride = two_person_ride(&engine, monday(), monday()).await;
    let mut cmd = UpdateRideCmd::from_ride(&ride);
    cmd.description = "Edited".to_string();
    cmd.payments.push(ride.payments[0].clone());
    let err = engine.update_ride(cmd).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailure);
    assert_eq!(engine.ride(ride.id).await.unwrap(), ride);
}

#[tokio::test]
async fn failure_after_writes_rolls_everything_back() {
    let (engine, db) = engine_with_db().await;
    let friday = date(2024, 1, 5);
    let ride = two_person_ride(&engine, monday(), friday).await;
    let (alice, bob) = (ride.payments[0].id, ride.payments[1].id);
    let ride = engine
        .update_ride(
            UpdateRideCmd::from_ride(&ride)
                .attendance(alice, monday(), 1)
                .attendance(bob, friday, 2),
        )
        .await
        .unwrap();

    // Bob's row and every presence are deleted and the root is rewritten
    // before the oversized attendance fails to store.
    let mut cmd = UpdateRideCmd::from_ride(&ride);
    cmd.description = "Renamed".to_string();
    cmd.unit_cost_minor = 5_000;
    cmd.payments.retain(|p| p.id == alice);
    cmd.payments.push(RidePayment::new("Carol"));
    let err = engine
        .update_ride(cmd.attendance(alice, monday(), u32::MAX))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailure);

    assert_eq!(engine.ride(ride.id).await.unwrap(), ride);
    assert_eq!(count_rows(&db, "ride_payments").await, 2);
    assert_eq!(count_rows(&db, "presences").await, 10);
}

#[tokio::test]
async fn unknown_participant_rejected_when_configured() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .unknown_ids(UnknownIdPolicy::Reject)
        .build()
        .await
        .unwrap();
    let ride = two_person_ride(&engine, monday(), monday()).await;

    let mut cmd = UpdateRideCmd::from_ride(&ride);
    cmd.payments.push(RidePayment::new("Ghost").with_id(777));
    let err = engine.update_ride(cmd).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(count_rows(&db, "ride_payments").await, 2);
}

#[tokio::test]
async fn missing_ride_is_not_found() {
    let (engine, _db) = engine_with_db().await;

    assert_eq!(engine.ride(5).await.unwrap_err().kind(), ErrorKind::NotFound);
    let err = engine
        .update_ride(UpdateRideCmd {
            ride_id: 5,
            description: "Nope".to_string(),
            unit_cost_minor: 100,
            occurrence_count: 1,
            start_date: monday(),
            end_date: monday(),
            include_weekends: false,
            payments: Vec::new(),
            presence_groups: Vec::new(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn list_and_delete() {
    let (engine, db) = engine_with_db().await;
    let first = two_person_ride(&engine, monday(), date(2024, 1, 2)).await;
    let second = two_person_ride(&engine, monday(), monday()).await;

    let rides = engine.rides().await.unwrap();
    assert_eq!(
        rides.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![second.id, first.id]
    );
    assert!(rides.iter().all(|r| r.payments.len() == 2));

    engine.delete_ride(first.id).await.unwrap();
    assert_eq!(engine.ride(first.id).await.unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(count_rows(&db, "ride_payments").await, 2);
    assert_eq!(count_rows(&db, "presences").await, 2);
}

#[test]
fn active_dates_are_deterministic() {
    let start = monday();
    let end = date(2024, 3, 31);
    for include_weekends in [false, true] {
        let once = active_dates(&ChronoCalendar, start, end, include_weekends).unwrap();
        let twice = active_dates(&ChronoCalendar, start, end, include_weekends).unwrap();
        assert_eq!(once, twice);
    }
}
