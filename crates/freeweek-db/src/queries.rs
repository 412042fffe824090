use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};

use crate::Database;
use crate::models::{BlockRow, GroupRow, MemberRow};

impl Database {
    // -- Groups --

    /// Inserts the group row if the code is free. Returns true when a
    /// new row was created, false when the code was already taken.
    pub fn insert_group(&self, code: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO groups (code) VALUES (?1)",
                [code],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn get_group(&self, code: &str) -> Result<Option<GroupRow>> {
        self.with_conn(|conn| query_group(conn, code))
    }

    // -- Members --

    /// Inserts the membership row for `(group_code, user_id)` if it
    /// does not exist yet. Returns true when the member is new.
    pub fn insert_member(&self, code: &str, user_id: &str, user_name: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO members (group_code, user_id, user_name) VALUES (?1, ?2, ?3)",
                (code, user_id, user_name),
            )?;
            Ok(changed > 0)
        })
    }

    pub fn get_members(&self, code: &str) -> Result<Vec<MemberRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT group_code, user_id, user_name, joined_at
                 FROM members
                 WHERE group_code = ?1
                 ORDER BY joined_at ASC",
            )?;

            let rows = stmt
                .query_map([code], |row| {
                    Ok(MemberRow {
                        group_code: row.get(0)?,
                        user_id: row.get(1)?,
                        user_name: row.get(2)?,
                        joined_at: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn get_member(&self, code: &str, user_id: &str) -> Result<Option<MemberRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT group_code, user_id, user_name, joined_at
                     FROM members
                     WHERE group_code = ?1 AND user_id = ?2",
                    (code, user_id),
                    |row| {
                        Ok(MemberRow {
                            group_code: row.get(0)?,
                            user_id: row.get(1)?,
                            user_name: row.get(2)?,
                            joined_at: row.get(3)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Forward-only rename: block user_name snapshots are untouched.
    pub fn update_member_name(&self, code: &str, user_id: &str, user_name: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE members SET user_name = ?3 WHERE group_code = ?1 AND user_id = ?2",
                (code, user_id, user_name),
            )?;
            Ok(changed)
        })
    }

    // -- Blocks --

    pub fn insert_block(&self, block: &BlockRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO blocks
                     (id, group_code, user_id, user_name, day,
                      start_hour, start_minute, end_hour, end_minute,
                      label, recurring)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                rusqlite::params![
                    block.id,
                    block.group_code,
                    block.user_id,
                    block.user_name,
                    block.day,
                    block.start_hour,
                    block.start_minute,
                    block.end_hour,
                    block.end_minute,
                    block.label,
                    block.recurring,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_blocks(&self, code: &str) -> Result<Vec<BlockRow>> {
        self.with_conn(|conn| query_blocks(conn, code, None))
    }

    pub fn get_blocks_by_user(&self, code: &str, user_id: &str) -> Result<Vec<BlockRow>> {
        self.with_conn(|conn| query_blocks(conn, code, Some(user_id)))
    }

    pub fn get_block(&self, code: &str, id: &str) -> Result<Option<BlockRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("{BLOCK_SELECT} WHERE group_code = ?1 AND id = ?2"),
                    (code, id),
                    map_block_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Rewrites a block's mutable fields, scoped to the owning user so
    /// the ownership check and the write are one atomic statement.
    /// Returns the number of rows changed (0 = absent id or foreign
    /// owner; the caller disambiguates).
    pub fn update_block_owned(&self, owner_id: &str, block: &BlockRow) -> Result<usize> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE blocks
                 SET day = ?4, start_hour = ?5, start_minute = ?6,
                     end_hour = ?7, end_minute = ?8, label = ?9, recurring = ?10
                 WHERE group_code = ?1 AND id = ?2 AND user_id = ?3",
                rusqlite::params![
                    block.group_code,
                    block.id,
                    owner_id,
                    block.day,
                    block.start_hour,
                    block.start_minute,
                    block.end_hour,
                    block.end_minute,
                    block.label,
                    block.recurring,
                ],
            )?;
            Ok(changed)
        })
    }

    /// Same contract as [`Database::update_block_owned`].
    pub fn delete_block_owned(&self, code: &str, id: &str, owner_id: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "DELETE FROM blocks WHERE group_code = ?1 AND id = ?2 AND user_id = ?3",
                (code, id, owner_id),
            )?;
            Ok(changed)
        })
    }
}

const BLOCK_SELECT: &str = "SELECT id, group_code, user_id, user_name, day,
        start_hour, start_minute, end_hour, end_minute, label, recurring
 FROM blocks";

fn query_blocks(conn: &Connection, code: &str, user_id: Option<&str>) -> Result<Vec<BlockRow>> {
    let (sql, params): (String, Vec<&dyn rusqlite::types::ToSql>) = match &user_id {
        Some(uid) => (
            format!(
                "{BLOCK_SELECT} WHERE group_code = ?1 AND user_id = ?2
                 ORDER BY day ASC, start_hour ASC, start_minute ASC"
            ),
            vec![&code as &dyn rusqlite::types::ToSql, uid as &dyn rusqlite::types::ToSql],
        ),
        None => (
            format!(
                "{BLOCK_SELECT} WHERE group_code = ?1
                 ORDER BY day ASC, start_hour ASC, start_minute ASC"
            ),
            vec![&code as &dyn rusqlite::types::ToSql],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params.as_slice(), map_block_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn map_block_row(row: &rusqlite::Row<'_>) -> std::result::Result<BlockRow, rusqlite::Error> {
    Ok(BlockRow {
        id: row.get(0)?,
        group_code: row.get(1)?,
        user_id: row.get(2)?,
        user_name: row.get(3)?,
        day: row.get(4)?,
        start_hour: row.get(5)?,
        start_minute: row.get(6)?,
        end_hour: row.get(7)?,
        end_minute: row.get(8)?,
        label: row.get(9)?,
        recurring: row.get(10)?,
    })
}

fn query_group(conn: &Connection, code: &str) -> Result<Option<GroupRow>> {
    let row = conn
        .query_row(
            "SELECT code, created_at FROM groups WHERE code = ?1",
            [code],
            |row| {
                Ok(GroupRow {
                    code: row.get(0)?,
                    created_at: row.get(1)?,
                })
            },
        )
        .optional()?;

    Ok(row)
}
