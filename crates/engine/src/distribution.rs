//! Daily distribution of a ride's cost.
//!
//! Each active date costs the same amount. That amount is shared by the
//! participants present on the date, in proportion to their attendance. A
//! date nobody attended distributes nothing; its cost is not moved to other
//! dates.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;

use crate::{
    EngineError, ResultEngine,
    allocation::apportion,
    presences::{GroupedPresence, Presence},
};

/// Requested attendance keyed by `(date, ride payment id)`.
pub type AttendanceIndex = HashMap<(NaiveDate, i64), u32>;

/// Index the attendance a caller sent back, keyed by date and payment.
///
/// When the same pair appears twice the first occurrence wins.
pub fn attendance_index(groups: &[GroupedPresence]) -> AttendanceIndex {
    let mut index = AttendanceIndex::new();
    for group in groups {
        for presence in &group.presences {
            index
                .entry((group.date, presence.ride_payment_id))
                .or_insert(presence.attendance);
        }
    }
    index
}

/// One presence per `(active date, payment)`, ordered by date then by the
/// order of `payment_ids`. Pairs missing from `requested` get attendance 0.
pub fn presence_grid(
    dates: &[NaiveDate],
    payment_ids: &[i64],
    requested: &AttendanceIndex,
) -> Vec<Presence> {
    let mut grid = Vec::with_capacity(dates.len() * payment_ids.len());
    for date in dates {
        for payment_id in payment_ids {
            let attendance = requested.get(&(*date, *payment_id)).copied().unwrap_or(0);
            grid.push(Presence::new(*payment_id, *date, attendance));
        }
    }
    grid
}

/// Total owed by each payment in `payment_ids` given the presence rows.
///
/// Per date the daily cost is apportioned over attendance, so the shares of
/// a date with any attendance add up to exactly `daily_cost_minor`. Rows of
/// payments outside `payment_ids` are ignored.
pub fn distribute(
    daily_cost_minor: i64,
    payment_ids: &[i64],
    presences: &[Presence],
) -> ResultEngine<BTreeMap<i64, i64>> {
    let mut totals: BTreeMap<i64, i64> = payment_ids.iter().map(|id| (*id, 0)).collect();

    let mut by_date: BTreeMap<NaiveDate, Vec<&Presence>> = BTreeMap::new();
    for presence in presences
        .iter()
        .filter(|p| totals.contains_key(&p.ride_payment_id))
    {
        by_date.entry(presence.date).or_default().push(presence);
    }

    for (_, mut day) in by_date {
        day.sort_by_key(|p| p.ride_payment_id);
        let weights: Vec<u64> = day.iter().map(|p| u64::from(p.attendance)).collect();
        if weights.iter().all(|w| *w == 0) {
            continue;
        }

        let shares = apportion(daily_cost_minor, &weights)?;
        for (presence, share) in day.iter().zip(shares) {
            if let Some(total) = totals.get_mut(&presence.ride_payment_id) {
                *total = total.checked_add(share).ok_or_else(|| {
                    EngineError::Validation("ride payment total overflows".to_string())
                })?;
            }
        }
    }

    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn index(rows: &[(u32, i64, u32)]) -> AttendanceIndex {
        rows.iter()
            .map(|(d, id, att)| ((date(*d), *id), *att))
            .collect()
    }

    #[test]
    fn shares_follow_attendance() {
        let grid = presence_grid(&[date(1)], &[1, 2], &index(&[(1, 1, 1), (1, 2, 3)]));
        let totals = distribute(1000, &[1, 2], &grid).unwrap();

        assert_eq!(totals[&1], 250);
        assert_eq!(totals[&2], 750);
    }

    #[test]
    fn day_without_attendance_distributes_nothing() {
        let grid = presence_grid(
            &[date(1), date(2)],
            &[1, 2],
            &index(&[(1, 1, 1), (1, 2, 1)]),
        );
        let totals = distribute(1000, &[1, 2], &grid).unwrap();

        assert_eq!(totals[&1], 500);
        assert_eq!(totals[&2], 500);
    }

    #[test]
    fn no_dates_means_nothing_owed() {
        let totals = distribute(1000, &[1, 2], &[]).unwrap();
        assert_eq!(totals.values().copied().collect::<Vec<_>>(), vec![0, 0]);
    }

    #[test]
    fn every_attended_day_is_fully_distributed() {
        let dates: Vec<NaiveDate> = (1..=5).map(date).collect();
        let requested = index(&[
            (1, 1, 1),
            (1, 2, 1),
            (1, 3, 1),
            (2, 1, 2),
            (2, 3, 5),
            (4, 2, 7),
        ]);
        let grid = presence_grid(&dates, &[1, 2, 3], &requested);
        let totals = distribute(1001, &[1, 2, 3], &grid).unwrap();

        // Days 1, 2 and 4 had attendance.
        assert_eq!(totals.values().sum::<i64>(), 3 * 1001);
    }

    #[test]
    fn grid_defaults_missing_pairs_to_zero() {
        let grid = presence_grid(&[date(1), date(2)], &[5, 9], &index(&[(2, 9, 4)]));

        assert_eq!(grid.len(), 4);
        assert_eq!(grid[0], Presence::new(5, date(1), 0));
        assert_eq!(grid[3], Presence::new(9, date(2), 4));
    }

    #[test]
    fn first_requested_attendance_wins() {
        let groups = vec![
            GroupedPresence {
                date: date(1),
                presences: vec![Presence::new(1, date(1), 2)],
            },
            GroupedPresence {
                date: date(1),
                presences: vec![Presence::new(1, date(1), 9)],
            },
        ];
        assert_eq!(attendance_index(&groups)[&(date(1), 1)], 2);
    }

    #[test]
    fn unknown_payments_are_ignored() {
        let rows = vec![Presence::new(1, date(1), 1), Presence::new(42, date(1), 1)];
        let totals = distribute(1000, &[1], &rows).unwrap();
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[&1], 1000);
    }
}
