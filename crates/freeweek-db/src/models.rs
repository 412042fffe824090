/// Raw rows as stored in SQLite. Timestamps stay as the TEXT SQLite
/// writes them; the store layer parses them into chrono types.

#[derive(Debug, Clone)]
pub struct GroupRow {
    pub code: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct MemberRow {
    pub group_code: String,
    pub user_id: String,
    pub user_name: String,
    pub joined_at: String,
}

#[derive(Debug, Clone)]
pub struct BlockRow {
    pub id: String,
    pub group_code: String,
    pub user_id: String,
    pub user_name: String,
    pub day: u8,
    pub start_hour: u8,
    pub start_minute: u8,
    pub end_hour: u8,
    pub end_minute: u8,
    pub label: String,
    pub recurring: bool,
}
