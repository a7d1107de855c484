use chrono::{DateTime, Utc};
use sea_orm::{
    DatabaseConnection, DbErr, EntityTrait, Set, TransactionTrait,
    sea_query::{Expr, OnConflict},
};
use uuid::Uuid;

use crate::entity::invoice_counters::{
    ActiveModel as CounterActive, Column as CounterCol, Entity as InvoiceCounters,
};

/// Next invoice number for `owner`.
///
/// The per-owner counter makes numbers unique within an owner's invoices.
/// If the counter cannot be advanced the time-based fallback is returned
/// instead, which is only probabilistically unique.
pub async fn next_invoice_number(db: &DatabaseConnection, owner: Uuid) -> String {
    let now = Utc::now();
    match next_sequence(db, owner).await {
        Ok(seq) => format_invoice_number(now, seq),
        Err(err) => {
            let fallback = fallback_invoice_number(now);
            tracing::warn!(
                error = %err,
                owner = %owner,
                invoice_number = %fallback,
                "invoice counter unavailable, using time-based invoice number"
            );
            fallback
        }
    }
}

/// `INV-{YYYYMM}-{seq}`, sequence zero-padded to four digits.
pub fn format_invoice_number(now: DateTime<Utc>, seq: i64) -> String {
    format!("INV-{}-{:04}", now.format("%Y%m"), seq)
}

/// `INV-{last five digits of epoch millis}`.
pub fn fallback_invoice_number(now: DateTime<Utc>) -> String {
    format!("INV-{:05}", now.timestamp_millis().rem_euclid(100_000))
}

async fn next_sequence(db: &DatabaseConnection, owner: Uuid) -> Result<i64, DbErr> {
    let now = Utc::now().fixed_offset();
    let txn = db.begin().await?;

    // Insert-or-increment in one statement; concurrent creates for an owner
    // queue on the counter row.
    InvoiceCounters::insert(CounterActive {
        user_id: Set(owner),
        last_value: Set(1),
        updated_at: Set(now),
    })
    .on_conflict(
        OnConflict::column(CounterCol::UserId)
            .value(
                CounterCol::LastValue,
                Expr::col((InvoiceCounters, CounterCol::LastValue)).add(1),
            )
            .value(CounterCol::UpdatedAt, Expr::value(now))
            .to_owned(),
    )
    .exec(&txn)
    .await?;

    let value = InvoiceCounters::find_by_id(owner)
        .one(&txn)
        .await?
        .map(|counter| counter.last_value)
        .ok_or_else(|| DbErr::RecordNotFound(format!("invoice counter for {owner}")))?;

    txn.commit().await?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn sequenced_numbers_carry_year_and_month() {
        let now = Utc.with_ymd_and_hms(2025, 3, 9, 12, 0, 0).unwrap();
        assert_eq!(format_invoice_number(now, 7), "INV-202503-0007");
        assert_eq!(format_invoice_number(now, 12345), "INV-202503-12345");
    }

    #[test]
    fn fallback_keeps_five_trailing_millis_digits() {
        let now = Utc.timestamp_millis_opt(1_700_000_001_234).unwrap();
        assert_eq!(fallback_invoice_number(now), "INV-01234");
    }
}
