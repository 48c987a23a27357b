use std::collections::HashMap;

use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    Bill, BillPayment, EngineError, NewBillCmd, ResultEngine, UpdateBillCmd, bill_payments,
    bills,
    reconcile::reconcile,
    split::{ensure_person_count, plan_bill_payments, recompute_shares},
    util::{default_person_label, ensure_non_negative, normalize_label, normalize_required_text},
};

use super::{Engine, with_tx};

impl Engine {
    /// Return a bill with its payments, ordered by id.
    pub async fn bill(&self, bill_id: i64) -> ResultEngine<Bill> {
        with_tx!(self, |db_tx| {
            let bill = load_bill(&db_tx, bill_id).await?;
            Ok(bill)
        })
    }

    /// Return every bill, newest first, each with its payments.
    pub async fn bills(&self) -> ResultEngine<Vec<Bill>> {
        with_tx!(self, |db_tx| {
            let models = bills::Entity::find()
                .order_by_desc(bills::Column::Id)
                .all(&db_tx)
                .await?;
            let mut payments_by_bill: HashMap<i64, Vec<bill_payments::Model>> = HashMap::new();
            for payment in bill_payments::Entity::find()
                .order_by_asc(bill_payments::Column::Id)
                .all(&db_tx)
                .await?
            {
                payments_by_bill
                    .entry(payment.bill_id)
                    .or_default()
                    .push(payment);
            }

            let mut bills = Vec::with_capacity(models.len());
            for model in models {
                let payments = payments_by_bill.remove(&model.id).unwrap_or_default();
                bills.push(Bill::from_models(model, payments)?);
            }
            Ok(bills)
        })
    }

    /// Create a bill and its `person_count` payments.
    ///
    /// Slot `i` takes label and value from `cmd.payments[i]` when given; a
    /// non-zero value makes it custom. The rest of the total is split evenly
    /// over the other slots.
    pub async fn new_bill(&self, cmd: NewBillCmd) -> ResultEngine<Bill> {
        let description = normalize_required_text(&cmd.description, "bill description")?;
        let mut payments = plan_bill_payments(cmd.total_minor, cmd.person_count, &cmd.payments)?;

        with_tx!(self, |db_tx| {
            let mut bill = Bill {
                id: 0,
                description,
                total_minor: cmd.total_minor,
                person_count: cmd.person_count,
                payments: Vec::new(),
            };
            let model = bills::ActiveModel::try_from(&bill)?
                .insert(&db_tx)
                .await?;
            bill.id = model.id;

            for payment in &mut payments {
                payment.bill_id = bill.id;
                let stored = bill_payments::ActiveModel::from(&*payment)
                    .insert(&db_tx)
                    .await?;
                payment.id = stored.id;
            }
            bill.payments = payments;

            tracing::info!(
                bill_id = bill.id,
                payments = bill.payments.len(),
                total_minor = bill.total_minor,
                "bill created"
            );
            Ok(bill)
        })
    }

    /// Replace a bill's root fields and reconcile its payments.
    ///
    /// Stored payments missing from `cmd.payments` are deleted, matching
    /// ones are overwritten in place and id-0 ones are inserted. The list is
    /// then padded with `"Person {n}"` slots up to `person_count` (raised to
    /// the payment count when more payments than people are sent) and every
    /// non-custom value is recomputed.
    pub async fn update_bill(&self, cmd: UpdateBillCmd) -> ResultEngine<Bill> {
        let description = normalize_required_text(&cmd.description, "bill description")?;
        ensure_non_negative(cmd.total_minor, "bill total")?;
        let bill_id = cmd.bill_id;
        let policy = self.unknown_ids;

        with_tx!(self, |db_tx| {
            bills::Entity::find_by_id(bill_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!("bill {bill_id}")))?;

            let persisted_ids: Vec<i64> = bill_payments::Entity::find()
                .filter(bill_payments::Column::BillId.eq(bill_id))
                .order_by_asc(bill_payments::Column::Id)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|model| model.id)
                .collect();

            let mut plan = reconcile(&persisted_ids, cmd.payments, policy)?;
            tracing::debug!(
                bill_id,
                deletes = plan.deletes.len(),
                updates = plan.updates.len(),
                inserts = plan.inserts.len(),
                "reconciling bill payments"
            );

            plan.updates.sort_by_key(|p| p.id);
            let matched = plan.updates.len();
            let mut payments: Vec<BillPayment> = plan.updates;
            payments.extend(plan.inserts.into_iter().map(|payment| BillPayment {
                id: 0,
                ..payment
            }));

            let person_count = cmd
                .person_count
                .max(u32::try_from(payments.len()).unwrap_or(u32::MAX));
            ensure_person_count(person_count)?;
            for position in payments.len()..person_count as usize {
                payments.push(BillPayment::new(default_person_label(position + 1)));
            }
            for (position, payment) in payments.iter_mut().enumerate() {
                payment.bill_id = bill_id;
                payment.person = normalize_label(&payment.person)
                    .unwrap_or_else(|| default_person_label(position + 1));
            }
            recompute_shares(cmd.total_minor, &mut payments)?;

            if !plan.deletes.is_empty() {
                bill_payments::Entity::delete_many()
                    .filter(bill_payments::Column::Id.is_in(plan.deletes))
                    .exec(&db_tx)
                    .await?;
            }

            let mut bill = Bill {
                id: bill_id,
                description,
                total_minor: cmd.total_minor,
                person_count,
                payments: Vec::new(),
            };
            bills::ActiveModel::try_from(&bill)?.update(&db_tx).await?;

            for payment in &payments[..matched] {
                bill_payments::ActiveModel::from(payment)
                    .update(&db_tx)
                    .await?;
            }
            for payment in &mut payments[matched..] {
                let stored = bill_payments::ActiveModel::from(&*payment)
                    .insert(&db_tx)
                    .await?;
                payment.id = stored.id;
            }

            payments.sort_by_key(|p| p.id);
            bill.payments = payments;

            tracing::info!(
                bill_id,
                payments = bill.payments.len(),
                total_minor = bill.total_minor,
                "bill updated"
            );
            Ok(bill)
        })
    }

    /// Delete a bill and its payments.
    pub async fn delete_bill(&self, bill_id: i64) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            bills::Entity::find_by_id(bill_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!("bill {bill_id}")))?;

            bill_payments::Entity::delete_many()
                .filter(bill_payments::Column::BillId.eq(bill_id))
                .exec(&db_tx)
                .await?;
            bills::Entity::delete_by_id(bill_id).exec(&db_tx).await?;

            tracing::info!(bill_id, "bill deleted");
            Ok(())
        })
    }
}

async fn load_bill<C: ConnectionTrait>(db: &C, bill_id: i64) -> ResultEngine<Bill> {
    let model = bills::Entity::find_by_id(bill_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound(format!("bill {bill_id}")))?;
    let payments = bill_payments::Entity::find()
        .filter(bill_payments::Column::BillId.eq(bill_id))
        .order_by_asc(bill_payments::Column::Id)
        .all(db)
        .await?;
    Bill::from_models(model, payments)
}
