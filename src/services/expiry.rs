//! Expiry tracking.
//!
//! The checks are read-time projections and never write to the store. Only
//! [`mark_expired_documents`] persists `expired`, and only when called.

use chrono::{Days, NaiveDate, Utc};
use tracing::info;

use crate::db::{DbPool, documents};
use crate::error::AppResult;
use crate::models::DocumentStatus;

/// Expired when the stored status says so or the date is strictly before `today`.
pub fn is_expired(status: DocumentStatus, expiry_date: Option<NaiveDate>, today: NaiveDate) -> bool {
    status == DocumentStatus::Expired || expiry_date.is_some_and(|date| date < today)
}

/// Expiry date falls between `today` and `today + window_days`, inclusive.
///
/// Already-expired dates are not "expiring soon".
pub fn is_expiring_soon(expiry_date: Option<NaiveDate>, today: NaiveDate, window_days: u32) -> bool {
    let Some(date) = expiry_date else {
        return false;
    };
    let horizon = today
        .checked_add_days(Days::new(u64::from(window_days)))
        .unwrap_or(NaiveDate::MAX);
    date >= today && date <= horizon
}

/// Status shown to readers: a past expiry date overrides the stored status.
pub fn effective_status(
    status: DocumentStatus,
    expiry_date: Option<NaiveDate>,
    today: NaiveDate,
) -> DocumentStatus {
    if is_expired(status, expiry_date, today) {
        DocumentStatus::Expired
    } else {
        status
    }
}

/// Today's date in UTC.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Persist `expired` on every record whose expiry date is before `today`.
pub async fn mark_expired_documents(pool: &DbPool, today: NaiveDate) -> AppResult<u64> {
    let updated = documents::mark_expired(pool.connection(), today).await?;
    if updated > 0 {
        info!("Marked {} documents expired (as of {})", updated, today);
    }
    Ok(updated)
}
