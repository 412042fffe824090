use serde::{Deserialize, Serialize};

use crate::models::TimeInterval;

// -- Groups --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinGroupRequest {
    /// Optional: when absent the server derives a deterministic id
    /// from the display name.
    pub user_id: Option<String>,
    pub user_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateGroupRequest {
    pub code: String,
    pub user_id: Option<String>,
    pub user_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RenameMemberRequest {
    pub user_name: String,
}

// -- Blocks --

/// Input for creating a busy block. The store assigns the id and
/// defaults the label to "Busy".
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBusyBlock {
    pub user_id: String,
    pub user_name: String,
    #[serde(flatten)]
    pub interval: TimeInterval,
    pub label: Option<String>,
    #[serde(default)]
    pub recurring: bool,
}

/// Partial update for a busy block; only present fields are applied.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockPatch {
    pub label: Option<String>,
    pub recurring: Option<bool>,
    pub day: Option<u8>,
    pub start_hour: Option<u8>,
    pub start_minute: Option<u8>,
    pub end_hour: Option<u8>,
    pub end_minute: Option<u8>,
}

impl BlockPatch {
    pub fn is_empty(&self) -> bool {
        self.label.is_none()
            && self.recurring.is_none()
            && self.day.is_none()
            && self.start_hour.is_none()
            && self.start_minute.is_none()
            && self.end_hour.is_none()
            && self.end_minute.is_none()
    }

    /// The stored interval with this patch's interval fields applied.
    pub fn apply_to(&self, interval: TimeInterval) -> TimeInterval {
        TimeInterval {
            day: self.day.unwrap_or(interval.day),
            start_hour: self.start_hour.unwrap_or(interval.start_hour),
            start_minute: self.start_minute.unwrap_or(interval.start_minute),
            end_hour: self.end_hour.unwrap_or(interval.end_hour),
            end_minute: self.end_minute.unwrap_or(interval.end_minute),
        }
    }
}

/// Update request as received over HTTP: the acting identity plus the
/// fields to change. Ownership is checked against `user_id` by the
/// store, not the caller.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBlockRequest {
    pub user_id: String,
    #[serde(flatten)]
    pub patch: BlockPatch,
}
