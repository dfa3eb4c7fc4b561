//! Validity calculator
//!
//! Field windows run from the signed timestamp for the retention period.
//! The record window starts now and ends at the earliest of the revalidation
//! deadline and every present field's expiry, so a caller is never told to
//! trust data longer than its shortest-lived part.

use chrono::{DateTime, Duration, Utc};
use swan_core::{Result, Validity};

/// Window of a field signed at `created`.
pub fn field_validity(created: DateTime<Utc>, retention: Duration) -> Result<Validity> {
    Validity::lasting(created, retention)
}

/// Window of a whole record assembled at `now`.
///
/// `field_expiries` holds the expiry of every present signed field. With no
/// fields the window is `now + revalidate`.
pub fn record_validity<I>(
    now: DateTime<Utc>,
    revalidate: Duration,
    field_expiries: I,
) -> Result<Validity>
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let deadline = swan_core::offset(now, revalidate)?;
    let expires = field_expiries
        .into_iter()
        .fold(deadline, |earliest, expires| earliest.min(expires));
    Ok(Validity::new(now, expires))
}

/// Expiry shared by a secondary identifier and the email and salt it came
/// from: the earlier of the two inputs.
pub fn combined_expiry(email: &Validity, salt: &Validity) -> DateTime<Utc> {
    email.expires.min(salt.expires)
}
