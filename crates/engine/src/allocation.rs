//! Integer apportionment shared by the bill and ride splitters.
//!
//! Amounts are cents, so an exact division is not always possible. The
//! largest-remainder method hands out the leftover cents one at a time,
//! which keeps `sum(shares) == total` for every input.

use std::cmp::Reverse;

use crate::{EngineError, ResultEngine};

/// Split `total_minor` proportionally to `weights`.
///
/// Every share is first floored; the cents lost to flooring go to the
/// entries with the largest fractional remainder. Ties are broken by
/// position, so earlier entries win. Entries with a zero weight always
/// receive zero.
///
/// Fails with [`EngineError::InvalidAllocation`] when all weights are zero
/// and with [`EngineError::Validation`] on a negative total.
pub fn apportion(total_minor: i64, weights: &[u64]) -> ResultEngine<Vec<i64>> {
    if total_minor < 0 {
        return Err(EngineError::Validation(format!(
            "cannot apportion a negative amount ({total_minor})"
        )));
    }
    let weight_sum: u128 = weights.iter().map(|w| u128::from(*w)).sum();
    if weight_sum == 0 {
        return Err(EngineError::InvalidAllocation(
            "no weight to divide the amount by".to_string(),
        ));
    }

    let total = total_minor as u128;
    let mut shares = Vec::with_capacity(weights.len());
    let mut remainders = Vec::with_capacity(weights.len());
    let mut assigned: u128 = 0;
    for (index, weight) in weights.iter().enumerate() {
        let scaled = total * u128::from(*weight);
        let share = scaled / weight_sum;
        assigned += share;
        shares.push(share as i64);
        remainders.push((index, scaled % weight_sum));
    }

    // Strictly less than `weights.len()` by construction.
    let leftover = (total - assigned) as usize;
    remainders.sort_by_key(|(index, remainder)| (Reverse(*remainder), *index));
    for (index, _) in remainders.into_iter().take(leftover) {
        shares[index] += 1;
    }

    Ok(shares)
}

/// Split `total_minor` in equal parts over `slots` entries.
pub fn split_evenly(total_minor: i64, slots: usize) -> ResultEngine<Vec<i64>> {
    apportion(total_minor, &vec![1; slots])
}
