use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS runs (
            id               TEXT PRIMARY KEY,
            user_id          TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            game_version     TEXT,
            run_name         TEXT,
            current_route    TEXT,
            encounters       TEXT NOT NULL DEFAULT '[]',
            box_pokemon      TEXT NOT NULL DEFAULT '[]',
            grave_pokemon    TEXT NOT NULL DEFAULT '[]',
            badges           TEXT NOT NULL DEFAULT '[]',
            rivals_defeated  TEXT NOT NULL DEFAULT '[]',
            bosses_defeated  TEXT NOT NULL DEFAULT '[]',
            created_at       TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at       TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_runs_user
            ON runs(user_id, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
