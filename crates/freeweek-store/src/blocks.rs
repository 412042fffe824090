use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, warn};
use uuid::Uuid;

use freeweek_db::Database;
use freeweek_db::models::BlockRow;
use freeweek_gateway::dispatcher::Dispatcher;
use freeweek_types::api::{BlockPatch, NewBusyBlock};
use freeweek_types::events::ScheduleEvent;
use freeweek_types::models::{BusyBlock, GroupCode, TimeInterval};

use crate::error::StoreError;

/// Busy-block collection for all groups. Mutations are single-row
/// statements scoped by `(group_code, id)`, and update/delete are
/// additionally scoped by owner, so the authorization check and the
/// write happen in one atomic statement.
#[derive(Clone)]
pub struct BlockStore {
    db: Arc<Database>,
    dispatcher: Dispatcher,
}

impl BlockStore {
    pub fn new(db: Arc<Database>, dispatcher: Dispatcher) -> Self {
        Self { db, dispatcher }
    }

    /// Validates the interval, assigns an id, persists the block and
    /// notifies group observers. Nothing is written on failure.
    pub fn add_block(
        &self,
        group: &GroupCode,
        input: NewBusyBlock,
    ) -> Result<BusyBlock, StoreError> {
        if !input.interval.is_valid() {
            return Err(StoreError::InvalidInterval);
        }

        let label = input
            .label
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| "Busy".to_string());

        let row = BlockRow {
            id: Uuid::new_v4().to_string(),
            group_code: group.as_str().to_string(),
            user_id: input.user_id,
            user_name: input.user_name,
            day: input.interval.day,
            start_hour: input.interval.start_hour,
            start_minute: input.interval.start_minute,
            end_hour: input.interval.end_hour,
            end_minute: input.interval.end_minute,
            label,
            recurring: input.recurring,
        };

        self.db.insert_block(&row)?;
        debug!("block {} added to group {}", row.id, group);

        let block = block_from_row(row);
        self.dispatcher.broadcast(ScheduleEvent::BlockCreated {
            group_code: group.as_str().to_string(),
            block: block.clone(),
        });

        Ok(block)
    }

    /// Applies only the provided fields. The merged interval is
    /// re-validated before writing, and only the owner may mutate.
    pub fn update_block(
        &self,
        group: &GroupCode,
        id: &str,
        acting_user: &str,
        patch: &BlockPatch,
    ) -> Result<(), StoreError> {
        if patch.is_empty() {
            return Ok(());
        }

        let existing = self
            .db
            .get_block(group.as_str(), id)?
            .ok_or(StoreError::NotFound)?;

        if existing.user_id != acting_user {
            return Err(StoreError::NotAuthorized {
                id: id.to_string(),
                user_id: acting_user.to_string(),
            });
        }

        let merged = patch.apply_to(interval_of(&existing));
        if !merged.is_valid() {
            return Err(StoreError::InvalidInterval);
        }

        let row = BlockRow {
            id: existing.id,
            group_code: existing.group_code,
            user_id: existing.user_id,
            user_name: existing.user_name,
            day: merged.day,
            start_hour: merged.start_hour,
            start_minute: merged.start_minute,
            end_hour: merged.end_hour,
            end_minute: merged.end_minute,
            label: patch.label.clone().unwrap_or(existing.label),
            recurring: patch.recurring.unwrap_or(existing.recurring),
        };

        // The owner scope in the WHERE clause re-checks ownership at
        // write time; zero rows means the block vanished since the read
        let changed = self.db.update_block_owned(acting_user, &row)?;
        if changed == 0 {
            return Err(StoreError::NotFound);
        }

        self.dispatcher.broadcast(ScheduleEvent::BlockUpdated {
            group_code: group.as_str().to_string(),
            id: id.to_string(),
        });

        Ok(())
    }

    /// Deletes the block; same authorization policy as update.
    pub fn remove_block(
        &self,
        group: &GroupCode,
        id: &str,
        acting_user: &str,
    ) -> Result<(), StoreError> {
        let changed = self.db.delete_block_owned(group.as_str(), id, acting_user)?;
        if changed == 0 {
            // Absent id or foreign owner; one read tells them apart
            return match self.db.get_block(group.as_str(), id)? {
                None => Err(StoreError::NotFound),
                Some(_) => Err(StoreError::NotAuthorized {
                    id: id.to_string(),
                    user_id: acting_user.to_string(),
                }),
            };
        }

        self.dispatcher.broadcast(ScheduleEvent::BlockRemoved {
            group_code: group.as_str().to_string(),
            id: id.to_string(),
        });

        Ok(())
    }

    /// All blocks for the group, ordered by day then start time.
    /// Returns empty (and logs) when the store is unreachable so
    /// observers always have a renderable state.
    pub fn get_blocks(&self, group: &GroupCode) -> Vec<BusyBlock> {
        match self.db.get_blocks(group.as_str()) {
            Ok(rows) => rows.into_iter().map(block_from_row).collect(),
            Err(e) => {
                warn!("Error fetching blocks for group {}: {}", group, e);
                Vec::new()
            }
        }
    }

    /// Same ordering as [`BlockStore::get_blocks`], filtered to one user.
    pub fn get_blocks_by_user(&self, group: &GroupCode, user_id: &str) -> Vec<BusyBlock> {
        match self.db.get_blocks_by_user(group.as_str(), user_id) {
            Ok(rows) => rows.into_iter().map(block_from_row).collect(),
            Err(e) => {
                warn!("Error fetching blocks for user {} in {}: {}", user_id, group, e);
                Vec::new()
            }
        }
    }

    /// Blocks are week-independent: a block is busy in every week it
    /// is queried in. The parameter exists for interface symmetry with
    /// week-scoped callers.
    pub fn get_blocks_for_week(&self, group: &GroupCode, _week_start: NaiveDate) -> Vec<BusyBlock> {
        self.get_blocks(group)
    }
}

fn interval_of(row: &BlockRow) -> TimeInterval {
    TimeInterval {
        day: row.day,
        start_hour: row.start_hour,
        start_minute: row.start_minute,
        end_hour: row.end_hour,
        end_minute: row.end_minute,
    }
}

fn block_from_row(row: BlockRow) -> BusyBlock {
    let interval = interval_of(&row);
    BusyBlock {
        id: row.id,
        user_id: row.user_id,
        user_name: row.user_name,
        group_code: row.group_code,
        interval,
        label: row.label,
        recurring: row.recurring,
    }
}
