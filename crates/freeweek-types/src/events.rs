use serde::{Deserialize, Serialize};

use crate::models::{BusyBlock, GroupMember};

/// Change events emitted by the stores and fanned out to group
/// observers. Consumers treat every event as a "something changed"
/// signal and re-fetch the full snapshot; the payloads exist for
/// logging and for clients that want to show what happened.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ScheduleEvent {
    /// A busy block was created
    BlockCreated { group_code: String, block: BusyBlock },

    /// A busy block was partially updated
    BlockUpdated { group_code: String, id: String },

    /// A busy block was deleted
    BlockRemoved { group_code: String, id: String },

    /// A member joined the group (first join only; rejoins are silent)
    MemberJoined {
        group_code: String,
        member: GroupMember,
    },

    /// A member changed their display name
    MemberRenamed {
        group_code: String,
        user_id: String,
        user_name: String,
    },
}

impl ScheduleEvent {
    /// Every event is scoped to exactly one group; observers filter on
    /// this before re-fetching.
    pub fn group_code(&self) -> &str {
        match self {
            Self::BlockCreated { group_code, .. }
            | Self::BlockUpdated { group_code, .. }
            | Self::BlockRemoved { group_code, .. }
            | Self::MemberJoined { group_code, .. }
            | Self::MemberRenamed { group_code, .. } => group_code,
        }
    }

    /// True when the event affects the busy-block set (as opposed to
    /// the member roster).
    pub fn touches_blocks(&self) -> bool {
        matches!(
            self,
            Self::BlockCreated { .. } | Self::BlockUpdated { .. } | Self::BlockRemoved { .. }
        )
    }
}
