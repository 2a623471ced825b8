//! Custom types shared across crates

use chrono::{DateTime as ChronoDateTime, Utc};

/// Database DateTime type used across all Mailroom crates
///
/// This is the canonical datetime type for database TIMESTAMPTZ columns and
/// API responses (serializes as ISO 8601).
///
/// # Example
/// ```rust
/// use mailroom_core::DBDateTime;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// pub struct Response {
///     pub created_at: DBDateTime,
/// }
/// ```
pub type DBDateTime = ChronoDateTime<Utc>;
