use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS groups (
            code        TEXT PRIMARY KEY,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS members (
            group_code  TEXT NOT NULL REFERENCES groups(code),
            user_id     TEXT NOT NULL,
            user_name   TEXT NOT NULL,
            joined_at   TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (group_code, user_id)
        );

        CREATE INDEX IF NOT EXISTS idx_members_group
            ON members(group_code, joined_at);

        CREATE TABLE IF NOT EXISTS blocks (
            id           TEXT PRIMARY KEY,
            group_code   TEXT NOT NULL REFERENCES groups(code),
            user_id      TEXT NOT NULL,
            user_name    TEXT NOT NULL,
            day          INTEGER NOT NULL,
            start_hour   INTEGER NOT NULL,
            start_minute INTEGER NOT NULL,
            end_hour     INTEGER NOT NULL,
            end_minute   INTEGER NOT NULL,
            label        TEXT NOT NULL DEFAULT 'Busy',
            recurring    INTEGER NOT NULL DEFAULT 0,
            created_at   TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_blocks_group
            ON blocks(group_code, day, start_hour, start_minute);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
