use std::sync::Arc;

use anyhow::anyhow;
use tracing::{debug, warn};

use freeweek_db::Database;
use freeweek_db::models::MemberRow;
use freeweek_gateway::dispatcher::Dispatcher;
use freeweek_types::events::ScheduleEvent;
use freeweek_types::models::{GroupCode, GroupData, GroupMember};

use crate::error::StoreError;
use crate::parse_timestamp;

/// Group rosters, keyed by the four-letter group code. Joining an
/// unknown code creates the group: there is no pre-provisioning step
/// and no "group not found" surfaced to a joiner.
#[derive(Clone)]
pub struct GroupRegistry {
    db: Arc<Database>,
    dispatcher: Dispatcher,
}

impl GroupRegistry {
    pub fn new(db: Arc<Database>, dispatcher: Dispatcher) -> Self {
        Self { db, dispatcher }
    }

    /// Strict creation: fails with [`StoreError::GroupExists`] when the
    /// code is taken. The creator becomes the first member.
    pub fn create_group(
        &self,
        code: &GroupCode,
        user_id: &str,
        user_name: &str,
    ) -> Result<GroupData, StoreError> {
        let inserted = self.db.insert_group(code.as_str())?;
        if !inserted {
            return Err(StoreError::GroupExists(code.to_string()));
        }

        debug!("group {} created by {}", code, user_id);
        self.add_member(code, user_id, user_name)?;
        self.fetch_created(code)
    }

    /// Join-or-create: both the group row and the membership row are
    /// insert-if-absent, so a joiner racing a creator (or another
    /// joiner with the same id) converges on the same state. Rejoining
    /// is idempotent and emits no event.
    pub fn join_group(
        &self,
        code: &GroupCode,
        user_id: &str,
        user_name: &str,
    ) -> Result<GroupData, StoreError> {
        if self.db.insert_group(code.as_str())? {
            debug!("group {} created implicitly by joiner {}", code, user_id);
        }
        self.add_member(code, user_id, user_name)?;
        self.fetch_created(code)
    }

    pub fn get_group(&self, code: &GroupCode) -> Option<GroupData> {
        match self.fetch_group(code) {
            Ok(group) => group,
            Err(e) => {
                warn!("Error fetching group {}: {}", code, e);
                None
            }
        }
    }

    /// Roster ordered by join time; empty (and logged) on store errors.
    pub fn get_group_members(&self, code: &GroupCode) -> Vec<GroupMember> {
        match self.db.get_members(code.as_str()) {
            Ok(rows) => rows.into_iter().map(member_from_row).collect(),
            Err(e) => {
                warn!("Error fetching members of {}: {}", code, e);
                Vec::new()
            }
        }
    }

    /// Forward-only rename: the member row changes, but user_name
    /// snapshots on existing busy blocks are deliberately left alone.
    pub fn update_member_name(
        &self,
        code: &GroupCode,
        user_id: &str,
        new_name: &str,
    ) -> Result<(), StoreError> {
        let changed = self.db.update_member_name(code.as_str(), user_id, new_name)?;
        if changed == 0 {
            return Err(StoreError::NotFound);
        }

        self.dispatcher.broadcast(ScheduleEvent::MemberRenamed {
            group_code: code.as_str().to_string(),
            user_id: user_id.to_string(),
            user_name: new_name.to_string(),
        });

        Ok(())
    }

    fn add_member(&self, code: &GroupCode, user_id: &str, user_name: &str) -> Result<(), StoreError> {
        let joined = self.db.insert_member(code.as_str(), user_id, user_name)?;
        if !joined {
            return Ok(());
        }

        if let Some(row) = self.db.get_member(code.as_str(), user_id)? {
            self.dispatcher.broadcast(ScheduleEvent::MemberJoined {
                group_code: code.as_str().to_string(),
                member: member_from_row(row),
            });
        }

        Ok(())
    }

    fn fetch_group(&self, code: &GroupCode) -> anyhow::Result<Option<GroupData>> {
        let Some(group) = self.db.get_group(code.as_str())? else {
            return Ok(None);
        };
        let members = self.db.get_members(code.as_str())?;

        Ok(Some(GroupData {
            created_at: parse_timestamp(&group.created_at, &format!("group '{}'", group.code)),
            code: group.code,
            members: members.into_iter().map(member_from_row).collect(),
        }))
    }

    fn fetch_created(&self, code: &GroupCode) -> Result<GroupData, StoreError> {
        self.fetch_group(code)?
            .ok_or_else(|| StoreError::Unavailable(anyhow!("group {} vanished after insert", code)))
    }
}

fn member_from_row(row: MemberRow) -> GroupMember {
    GroupMember {
        joined_at: parse_timestamp(
            &row.joined_at,
            &format!("member '{}' of '{}'", row.user_id, row.group_code),
        ),
        user_id: row.user_id,
        user_name: row.user_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::BlockStore;
    use freeweek_types::api::NewBusyBlock;
    use freeweek_types::models::TimeInterval;

    fn registry() -> (GroupRegistry, Arc<Database>) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        (GroupRegistry::new(Arc::clone(&db), Dispatcher::new()), db)
    }

    fn code(raw: &str) -> GroupCode {
        GroupCode::parse(raw).unwrap()
    }

    #[test]
    fn joining_an_unknown_code_creates_the_group() {
        // Scenario: first join creates, second join is idempotent
        let (registry, _db) = registry();
        let abcd = code("ABCD");

        let group = registry.join_group(&abcd, "u1", "Alice").unwrap();
        assert_eq!(group.code, "ABCD");
        assert_eq!(group.members.len(), 1);
        assert_eq!(group.members[0].user_name, "Alice");

        let again = registry.join_group(&abcd, "u1", "Alice").unwrap();
        assert_eq!(again.members.len(), 1);
    }

    #[test]
    fn strict_create_fails_on_taken_code() {
        let (registry, _db) = registry();
        let abcd = code("ABCD");

        registry.create_group(&abcd, "u1", "Alice").unwrap();
        let result = registry.create_group(&abcd, "u2", "Bob");
        assert!(matches!(result, Err(StoreError::GroupExists(_))));

        // The failed create added nobody
        assert_eq!(registry.get_group_members(&abcd).len(), 1);
    }

    #[test]
    fn second_member_joins_existing_group() {
        let (registry, _db) = registry();
        let abcd = code("ABCD");

        registry.join_group(&abcd, "u1", "Alice").unwrap();
        let group = registry.join_group(&abcd, "u2", "Bob").unwrap();

        let names: Vec<_> = group.members.iter().map(|m| m.user_name.as_str()).collect();
        assert_eq!(group.members.len(), 2);
        assert!(names.contains(&"Alice") && names.contains(&"Bob"));
    }

    #[test]
    fn groups_are_isolated_by_code() {
        let (registry, _db) = registry();
        registry.join_group(&code("ABCD"), "u1", "Alice").unwrap();
        registry.join_group(&code("WXYZ"), "u2", "Bob").unwrap();

        assert_eq!(registry.get_group_members(&code("ABCD")).len(), 1);
        assert_eq!(registry.get_group_members(&code("WXYZ")).len(), 1);
    }

    #[test]
    fn unknown_group_reads_as_absent_and_empty() {
        let (registry, _db) = registry();
        assert!(registry.get_group(&code("QQQQ")).is_none());
        assert!(registry.get_group_members(&code("QQQQ")).is_empty());
    }

    #[test]
    fn rename_updates_roster_only() {
        let (registry, db) = registry();
        let abcd = code("ABCD");
        registry.join_group(&abcd, "u1", "Alice").unwrap();

        // Block created before the rename keeps its name snapshot
        let blocks = BlockStore::new(Arc::clone(&db), Dispatcher::new());
        blocks
            .add_block(
                &abcd,
                NewBusyBlock {
                    user_id: "u1".to_string(),
                    user_name: "Alice".to_string(),
                    interval: TimeInterval {
                        day: 0,
                        start_hour: 9,
                        start_minute: 0,
                        end_hour: 10,
                        end_minute: 0,
                    },
                    label: None,
                    recurring: false,
                },
            )
            .unwrap();

        registry.update_member_name(&abcd, "u1", "Alicia").unwrap();

        assert_eq!(registry.get_group_members(&abcd)[0].user_name, "Alicia");
        assert_eq!(blocks.get_blocks(&abcd)[0].user_name, "Alice");
    }

    #[test]
    fn renaming_a_non_member_is_not_found() {
        let (registry, _db) = registry();
        let abcd = code("ABCD");
        registry.join_group(&abcd, "u1", "Alice").unwrap();

        let result = registry.update_member_name(&abcd, "u9", "Ghost");
        assert!(matches!(result, Err(StoreError::NotFound)));
    }
}
