pub mod blocks;
pub mod error;
pub mod groups;

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

pub use blocks::BlockStore;
pub use error::StoreError;
pub use groups::GroupRegistry;

/// SQLite writes timestamps as "YYYY-MM-DD HH:MM:SS" without a
/// timezone; accept both that and RFC 3339.
pub(crate) fn parse_timestamp(raw: &str, context: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on {}: {}", raw, context, e);
            DateTime::default()
        })
}
