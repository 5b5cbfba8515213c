/// Database row types — these map directly to SQLite rows.
/// Distinct from lockebox-types API models to keep the DB layer independent.
///
/// A run row is one document: the encounter lists and name lists are stored
/// as JSON text columns and only ever read or written whole.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct RunRow {
    pub id: String,
    pub user_id: String,
    pub game_version: Option<String>,
    pub run_name: Option<String>,
    pub current_route: Option<String>,
    pub encounters: String,
    pub box_pokemon: String,
    pub grave_pokemon: String,
    pub badges: String,
    pub rivals_defeated: String,
    pub bosses_defeated: String,
    pub created_at: String,
    pub updated_at: String,
}
