//! Bill splitting: custom payments keep their value, the rest of the total
//! is shared equally by the proportional ones.

use crate::{
    BillPayment, EngineError, ResultEngine,
    allocation::split_evenly,
    util::{default_person_label, ensure_non_negative, normalize_label},
};

/// Most people a single bill can be split among.
pub const MAX_PERSON_COUNT: u32 = 10_000;

/// Reject a head-count above [`MAX_PERSON_COUNT`] before any slot is built.
pub(crate) fn ensure_person_count(person_count: u32) -> ResultEngine<()> {
    if person_count > MAX_PERSON_COUNT {
        return Err(EngineError::Validation(format!(
            "person_count {person_count} exceeds the limit of {MAX_PERSON_COUNT}"
        )));
    }
    Ok(())
}

/// Build the `person_count` payment slots of a new bill.
///
/// Slot `i` takes its label and value from `explicit[i]` when present. A
/// non-zero value makes the slot custom; a blank label becomes
/// `"Person {i+1}"`. Explicit payments past `person_count` are ignored.
pub fn plan_bill_payments(
    total_minor: i64,
    person_count: u32,
    explicit: &[BillPayment],
) -> ResultEngine<Vec<BillPayment>> {
    if person_count == 0 {
        return Err(EngineError::InvalidAllocation(
            "a bill needs at least one person".to_string(),
        ));
    }
    ensure_person_count(person_count)?;

    let mut payments: Vec<BillPayment> = (0..person_count as usize)
        .map(|i| match explicit.get(i) {
            Some(given) => BillPayment {
                id: 0,
                bill_id: 0,
                person: normalize_label(&given.person)
                    .unwrap_or_else(|| default_person_label(i + 1)),
                value_minor: given.value_minor,
                is_paid: given.is_paid,
                is_custom: given.value_minor != 0,
            },
            None => BillPayment::new(default_person_label(i + 1)),
        })
        .collect();

    recompute_shares(total_minor, &mut payments)?;
    Ok(payments)
}

/// Reassign the value of every non-custom payment.
///
/// The amount left by the custom payments is split evenly over the
/// non-custom ones in slice order; the first slots absorb the leftover
/// cents. Custom values are never touched.
pub fn recompute_shares(total_minor: i64, payments: &mut [BillPayment]) -> ResultEngine<()> {
    ensure_non_negative(total_minor, "bill total")?;

    let mut custom_minor: i64 = 0;
    for payment in payments.iter().filter(|p| p.is_custom) {
        ensure_non_negative(payment.value_minor, "custom payment")?;
        custom_minor = custom_minor
            .checked_add(payment.value_minor)
            .ok_or_else(|| EngineError::Validation("custom payments overflow".to_string()))?;
    }
    if custom_minor > total_minor {
        return Err(EngineError::Validation(format!(
            "custom payments ({custom_minor}) exceed the bill total ({total_minor})"
        )));
    }

    let proportional = payments.iter().filter(|p| !p.is_custom).count();
    if proportional == 0 {
        return Err(EngineError::InvalidAllocation(
            "every payment is custom, nothing can absorb the remainder".to_string(),
        ));
    }

    let shares = split_evenly(total_minor - custom_minor, proportional)?;
    for (payment, share) in payments.iter_mut().filter(|p| !p.is_custom).zip(shares) {
        payment.value_minor = share;
    }
    Ok(())
}
