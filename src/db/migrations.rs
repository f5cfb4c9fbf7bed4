use anyhow::Context;
use rusqlite::{params, Connection};

// Migrations are compiled in so `:memory:` databases pick up the schema too.
const MIGRATIONS: &[(&str, &str)] = &[(
    "001_initial",
    "CREATE TABLE IF NOT EXISTS users (
         id INTEGER PRIMARY KEY AUTOINCREMENT,
         name TEXT NOT NULL,
         timezone TEXT NOT NULL
     );
     CREATE TABLE IF NOT EXISTS weekly_availability (
         id INTEGER PRIMARY KEY AUTOINCREMENT,
         user_id INTEGER NOT NULL REFERENCES users(id),
         day_of_week TEXT NOT NULL,
         start_time TEXT NOT NULL,
         end_time TEXT NOT NULL
     );
     CREATE INDEX IF NOT EXISTS idx_weekly_user_day
         ON weekly_availability(user_id, day_of_week);
     CREATE TABLE IF NOT EXISTS date_overrides (
         id INTEGER PRIMARY KEY AUTOINCREMENT,
         user_id INTEGER NOT NULL REFERENCES users(id),
         date TEXT NOT NULL,
         start_time TEXT NOT NULL,
         end_time TEXT NOT NULL
     );
     CREATE INDEX IF NOT EXISTS idx_overrides_user_date
         ON date_overrides(user_id, date);
     CREATE TABLE IF NOT EXISTS events (
         id INTEGER PRIMARY KEY AUTOINCREMENT,
         user_id INTEGER NOT NULL REFERENCES users(id),
         date TEXT NOT NULL,
         start_time TEXT NOT NULL,
         end_time TEXT NOT NULL
     );
     CREATE INDEX IF NOT EXISTS idx_events_user_date
         ON events(user_id, date);",
)];

pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .context("failed to create migrations table")?;

    for (name, sql) in MIGRATIONS {
        let already_applied: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM _migrations WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .context("failed to check migration status")?;

        if already_applied {
            continue;
        }

        conn.execute_batch(sql)
            .with_context(|| format!("failed to apply migration: {name}"))?;

        conn.execute("INSERT INTO _migrations (name) VALUES (?1)", params![name])
            .with_context(|| format!("failed to record migration: {name}"))?;

        tracing::info!("applied migration: {name}");
    }

    Ok(())
}
