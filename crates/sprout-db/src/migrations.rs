//! Database migration system.
//!
//! Schema version stored in `PRAGMA user_version`. Migrations are
//! forward-only. A fresh database also gets the level and rank tables
//! seeded, since the progression ledger cannot run without them.

use rusqlite::Connection;

use crate::{schema, DbError, Result, SCHEMA_VERSION};

/// Run all pending migrations.
pub fn run(conn: &Connection) -> Result<()> {
    let current_version: u32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(DbError::Sqlite)?;

    if current_version == 0 {
        // Fresh database — apply initial schema
        tracing::info!("Initializing database schema v{SCHEMA_VERSION}");
        conn.execute_batch(schema::SCHEMA_V1)
            .map_err(DbError::Sqlite)?;

        seed_levels(conn)?;
        seed_ranks(conn)?;

        conn.pragma_update(None, "user_version", SCHEMA_VERSION)
            .map_err(DbError::Sqlite)?;
    } else if current_version < SCHEMA_VERSION {
        for version in (current_version + 1)..=SCHEMA_VERSION {
            tracing::info!("Running migration to v{version}");
            run_migration(conn, version)?;
            conn.pragma_update(None, "user_version", version)
                .map_err(DbError::Sqlite)?;
        }
    } else if current_version > SCHEMA_VERSION {
        return Err(DbError::Migration(format!(
            "Database version {current_version} is newer than supported {SCHEMA_VERSION}"
        )));
    }

    Ok(())
}

/// Level thresholds and level-up coin bonuses.
fn seed_levels(conn: &Connection) -> Result<()> {
    let levels: [(i64, i64, i64); 16] = [
        (1, 0, 0),
        (2, 100, 50),
        (3, 250, 75),
        (4, 450, 100),
        (5, 700, 125),
        (6, 1000, 150),
        (7, 1350, 175),
        (8, 1750, 200),
        (9, 2200, 225),
        (10, 2700, 250),
        (15, 5000, 400),
        (20, 10_000, 600),
        (25, 18_000, 800),
        (30, 28_000, 1000),
        (40, 50_000, 1500),
        (50, 100_000, 2500),
    ];

    let mut stmt = conn
        .prepare(
            "INSERT OR IGNORE INTO levels (level, experience_required, coins_reward)
             VALUES (?1, ?2, ?3)",
        )
        .map_err(DbError::Sqlite)?;

    for (level, xp, coins) in &levels {
        stmt.execute(rusqlite::params![level, xp, coins])
            .map_err(DbError::Sqlite)?;
    }

    Ok(())
}

/// Rank tiers, ordered from entry to endgame.
fn seed_ranks(conn: &Connection) -> Result<()> {
    let ranks: [(&str, &str, i64, i64, &str, &str); 9] = [
        ("Seed", "🌱", 1, 0, "#8BC34A", "Your eco journey is just beginning"),
        ("Sprout", "🌿", 3, 5, "#4CAF50", "Your first habits are taking root"),
        ("Plant", "🪴", 6, 15, "#2E7D32", "Your actions are blossoming"),
        ("Bush", "🌳", 10, 30, "#1B5E20", "Your impact is spreading"),
        ("Tree", "🌲", 15, 60, "#004D40", "A pillar of environmental change"),
        ("Forest", "🌲🌲", 20, 100, "#00695C", "Your influence is vast as a forest"),
        ("Forest Guardian", "🌲👑", 30, 200, "#00897B", "You protect and guide others on the green path"),
        ("Eco Master", "🌍✨", 40, 400, "#26A69A", "Your environmental wisdom inspires many"),
        ("Green Legend", "🌟🌿", 50, 1000, "#4DB6AC", "Your ecological legacy is legendary"),
    ];

    let mut stmt = conn
        .prepare(
            "INSERT INTO ranks (name, icon, min_level, min_missions, color, description)
             SELECT ?1, ?2, ?3, ?4, ?5, ?6
             WHERE NOT EXISTS (SELECT 1 FROM ranks WHERE name = ?1)",
        )
        .map_err(DbError::Sqlite)?;

    for (name, icon, min_level, min_missions, color, description) in &ranks {
        stmt.execute(rusqlite::params![
            name,
            icon,
            min_level,
            min_missions,
            color,
            description
        ])
        .map_err(DbError::Sqlite)?;
    }

    Ok(())
}

/// Run a specific migration.
fn run_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        // Future migrations go here:
        // 2 => migration_v2(conn),
        _ => Err(DbError::Migration(format!(
            "Unknown migration version: {version}"
        ))),
    }
}
