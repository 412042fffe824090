use thiserror::Error;

/// Failures surfaced by the block store and the group registry.
///
/// Read paths never produce these: they log and return empty
/// collections so callers always have a renderable state. Mutations
/// return them so callers can retry or show an error instead of
/// silently losing a write. None of these are process-fatal.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying persistence is unreachable; nothing was written.
    #[error("persistence unavailable")]
    Unavailable(#[source] anyhow::Error),

    /// A mutation was attempted by someone other than the row's owner.
    /// State is unchanged.
    #[error("block {id} is not owned by user {user_id}")]
    NotAuthorized { id: String, user_id: String },

    /// The addressed block or member does not exist. State is
    /// unchanged; for block mutations this is the typed form of the
    /// "mutating an absent id is a no-op" rule.
    #[error("not found")]
    NotFound,

    /// The interval's end does not come strictly after its start (or a
    /// field is out of range). Rejected before anything reaches the
    /// store.
    #[error("invalid interval: end must come after start")]
    InvalidInterval,

    /// Strict group creation found the code already taken; the caller
    /// should join instead.
    #[error("group code {0} is already taken")]
    GroupExists(String),
}

impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        Self::Unavailable(err)
    }
}
