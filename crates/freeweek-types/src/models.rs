use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DAYS_PER_WEEK: u8 = 7;
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// One interval within a single day of the week. Day 0 is Monday,
/// day 6 is Sunday. The UI snaps minutes to the :00/:30 grid, but
/// nothing here depends on that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeInterval {
    pub day: u8,
    pub start_hour: u8,
    pub start_minute: u8,
    pub end_hour: u8,
    pub end_minute: u8,
}

impl TimeInterval {
    /// Minute-of-day of the (inclusive) start, 0..1439.
    pub fn start_minute_of_day(&self) -> u32 {
        minute_of_day(self.start_hour, self.start_minute)
    }

    /// Minute-of-day of the (exclusive) end.
    pub fn end_minute_of_day(&self) -> u32 {
        minute_of_day(self.end_hour, self.end_minute)
    }

    /// An interval is valid when all fields are in range and the end
    /// strictly follows the start. End-of-day never rolls into the
    /// next day; 23:59 is the last representable minute.
    pub fn is_valid(&self) -> bool {
        self.day < DAYS_PER_WEEK
            && self.start_hour < 24
            && self.end_hour < 24
            && self.start_minute < 60
            && self.end_minute < 60
            && self.end_minute_of_day() > self.start_minute_of_day()
    }
}

/// Converts an hour/minute pair to a minute-of-day integer.
///
/// Precondition: `hour` in 0..=23 and `minute` in 0..=59. Out-of-range
/// input is not checked and produces values outside 0..1439, with
/// undefined ordering relative to in-range intervals.
pub fn minute_of_day(hour: u8, minute: u8) -> u32 {
    hour as u32 * 60 + minute as u32
}

/// Inverse of [`minute_of_day`] for values in 0..1440.
pub fn hour_minute(minute_of_day: u32) -> (u8, u8) {
    ((minute_of_day / 60) as u8, (minute_of_day % 60) as u8)
}

/// One member's self-reported unavailable interval, scoped to a group.
/// `user_name` is a snapshot taken at creation time and is not rewritten
/// when the member renames themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusyBlock {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub group_code: String,
    #[serde(flatten)]
    pub interval: TimeInterval,
    pub label: String,
    /// Informational only: a recurring block is not expanded across
    /// weeks, it is simply tagged as such for display.
    pub recurring: bool,
}

/// A derived interval where no group member is busy. Never persisted;
/// recomputed from the block set on every query. Minimum length is
/// 30 minutes, and the end minute is the last *included* minute
/// (23:59 for a slot running to end of day).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeSlot {
    pub day: u8,
    pub start_hour: u8,
    pub start_minute: u8,
    pub end_hour: u8,
    pub end_minute: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMember {
    pub user_id: String,
    pub user_name: String,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub code: String,
    pub created_at: DateTime<Utc>,
}

/// A group together with its roster, ordered by join time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupData {
    pub code: String,
    pub members: Vec<GroupMember>,
    pub created_at: DateTime<Utc>,
}

/// Validated group code: exactly four ASCII letters, stored uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GroupCode(String);

#[derive(Debug, Error)]
#[error("group code must be exactly four letters, got {0:?}")]
pub struct InvalidGroupCode(pub String);

impl GroupCode {
    pub fn parse(raw: &str) -> Result<Self, InvalidGroupCode> {
        let trimmed = raw.trim();
        if trimmed.len() == 4 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(trimmed.to_ascii_uppercase()))
        } else {
            Err(InvalidGroupCode(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GroupCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for GroupCode {
    type Error = InvalidGroupCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<GroupCode> for String {
    fn from(code: GroupCode) -> Self {
        code.0
    }
}
