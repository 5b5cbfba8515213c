use crate::Database;
use crate::models::{RunRow, UserRow};
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, username: &str, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password) VALUES (?1, ?2, ?3)",
                (id, username, password_hash),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    // -- Runs --

    pub fn insert_run(&self, run: &RunRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO runs (id, user_id, game_version, run_name, current_route,
                                   encounters, box_pokemon, grave_pokemon,
                                   badges, rivals_defeated, bosses_defeated,
                                   created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                rusqlite::params![
                    run.id,
                    run.user_id,
                    run.game_version,
                    run.run_name,
                    run.current_route,
                    run.encounters,
                    run.box_pokemon,
                    run.grave_pokemon,
                    run.badges,
                    run.rivals_defeated,
                    run.bosses_defeated,
                    run.created_at,
                    run.updated_at,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_run_by_id(&self, id: &str) -> Result<Option<RunRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{RUN_COLUMNS} WHERE id = ?1"))?;
            let row = stmt.query_row([id], map_run_row).optional()?;
            Ok(row)
        })
    }

    pub fn get_runs_for_user(&self, user_id: &str) -> Result<Vec<RunRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("{RUN_COLUMNS} WHERE user_id = ?1 ORDER BY created_at DESC"))?;

            let rows = stmt
                .query_map([user_id], map_run_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Write the client-writable columns of a run. `user_id` and `created_at`
    /// are deliberately absent from the SET list.
    pub fn update_run(&self, run: &RunRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE runs SET game_version = ?2, run_name = ?3, current_route = ?4,
                                 encounters = ?5, box_pokemon = ?6, grave_pokemon = ?7,
                                 badges = ?8, rivals_defeated = ?9, bosses_defeated = ?10,
                                 updated_at = ?11
                 WHERE id = ?1",
                rusqlite::params![
                    run.id,
                    run.game_version,
                    run.run_name,
                    run.current_route,
                    run.encounters,
                    run.box_pokemon,
                    run.grave_pokemon,
                    run.badges,
                    run.rivals_defeated,
                    run.bosses_defeated,
                    run.updated_at,
                ],
            )?;
            Ok(())
        })
    }

    /// Returns false when no row with that id existed.
    pub fn delete_run(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM runs WHERE id = ?1", [id])?;
            Ok(deleted > 0)
        })
    }
}

const RUN_COLUMNS: &str = "SELECT id, user_id, game_version, run_name, current_route,
        encounters, box_pokemon, grave_pokemon,
        badges, rivals_defeated, bosses_defeated,
        created_at, updated_at
 FROM runs";

fn map_run_row(row: &rusqlite::Row<'_>) -> std::result::Result<RunRow, rusqlite::Error> {
    Ok(RunRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        game_version: row.get(2)?,
        run_name: row.get(3)?,
        current_route: row.get(4)?,
        encounters: row.get(5)?,
        box_pokemon: row.get(6)?,
        grave_pokemon: row.get(7)?,
        badges: row.get(8)?,
        rivals_defeated: row.get(9)?,
        bosses_defeated: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, username, password, created_at FROM users WHERE username = ?1")?;

    let row = stmt
        .query_row([username], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_user_by_id(conn: &Connection, id: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, username, password, created_at FROM users WHERE id = ?1")?;

    let row = stmt
        .query_row([id], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
