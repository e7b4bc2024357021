//! Mission catalog query functions. The engine only reads this table;
//! writes happen through seeding and catalog administration.

use rusqlite::{Connection, Row};

use sprout_types::catalog::{Cadence, Category, Difficulty, MissionKind, MissionTemplate};
use sprout_types::TemplateId;

use crate::{DbError, Result};

const TEMPLATE_COLUMNS: &str = "id, title, description, category, kind, difficulty, \
     duration_days, cadence, xp_reward, coins_reward, co2_impact, is_active";

/// A catalog entry to insert.
#[derive(Clone, Debug)]
pub struct NewTemplate {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub kind: MissionKind,
    pub difficulty: Difficulty,
    pub duration_days: i64,
    pub cadence: Cadence,
    pub xp_reward: i64,
    pub coins_reward: i64,
    pub co2_impact: f64,
}

fn template_from_row(row: &Row) -> rusqlite::Result<MissionTemplate> {
    Ok(MissionTemplate {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        category: super::parse_category(3, &row.get::<_, String>(3)?)?,
        kind: super::parse_kind(4, &row.get::<_, String>(4)?)?,
        difficulty: super::parse_difficulty(5, &row.get::<_, String>(5)?)?,
        duration_days: row.get(6)?,
        cadence: super::parse_cadence(7, &row.get::<_, String>(7)?)?,
        xp_reward: row.get(8)?,
        coins_reward: row.get(9)?,
        co2_impact: row.get(10)?,
        is_active: row.get(11)?,
    })
}

/// Insert a catalog entry.
pub fn insert(conn: &Connection, template: &NewTemplate, now: i64) -> Result<TemplateId> {
    conn.execute(
        "INSERT INTO challenges
         (title, description, category, kind, difficulty, duration_days,
          cadence, xp_reward, coins_reward, co2_impact, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        rusqlite::params![
            template.title,
            template.description,
            template.category.as_str(),
            template.kind.as_str(),
            template.difficulty.as_str(),
            template.duration_days,
            template.cadence.as_str(),
            template.xp_reward,
            template.coins_reward,
            template.co2_impact,
            now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Fetch one template by id.
pub fn get(conn: &Connection, id: TemplateId) -> Result<MissionTemplate> {
    let sql = format!("SELECT {TEMPLATE_COLUMNS} FROM challenges WHERE id = ?1");
    conn.query_row(&sql, [id], template_from_row)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                DbError::NotFound(format!("template {id}"))
            }
            other => DbError::Sqlite(other),
        })
}

/// All active templates for a cadence. Category/difficulty/recency
/// filtering happens in the engine so selection stays deterministic
/// under an injected random source.
pub fn active_templates(conn: &Connection, cadence: Cadence) -> Result<Vec<MissionTemplate>> {
    let sql = format!(
        "SELECT {TEMPLATE_COLUMNS} FROM challenges
         WHERE cadence = ?1 AND is_active = 1
         ORDER BY id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([cadence.as_str()], template_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Soft-delete a template.
pub fn deactivate(conn: &Connection, id: TemplateId) -> Result<()> {
    let updated = conn.execute(
        "UPDATE challenges SET is_active = 0 WHERE id = ?1",
        [id],
    )?;
    if updated == 0 {
        return Err(DbError::NotFound(format!("template {id}")));
    }
    Ok(())
}

/// Number of catalog entries (active or not).
pub fn count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM challenges", [], |row| row.get(0))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Connection {
        crate::open_memory().expect("open test db")
    }

    fn sample(category: Category, difficulty: Difficulty, cadence: Cadence) -> NewTemplate {
        NewTemplate {
            title: "Short shower".into(),
            description: "Keep it under five minutes".into(),
            category,
            kind: MissionKind::RealAction,
            difficulty,
            duration_days: if cadence == Cadence::Weekly { 7 } else { 1 },
            cadence,
            xp_reward: 10,
            coins_reward: 5,
            co2_impact: 0.3,
        }
    }

    #[test]
    fn test_insert_and_get() {
        let conn = test_db();
        let id = insert(
            &conn,
            &sample(Category::Water, Difficulty::Easy, Cadence::Daily),
            100,
        )
        .expect("insert");

        let template = get(&conn, id).expect("get");
        assert_eq!(template.category, Category::Water);
        assert_eq!(template.difficulty, Difficulty::Easy);
        assert!(template.is_active);
    }

    #[test]
    fn test_get_missing() {
        let conn = test_db();
        assert!(matches!(get(&conn, 42), Err(DbError::NotFound(_))));
    }

    #[test]
    fn test_active_templates_filters_cadence_and_flag() {
        let conn = test_db();
        insert(
            &conn,
            &sample(Category::Energy, Difficulty::Easy, Cadence::Daily),
            100,
        )
        .expect("daily");
        insert(
            &conn,
            &sample(Category::Food, Difficulty::Hard, Cadence::Weekly),
            100,
        )
        .expect("weekly");
        let dead = insert(
            &conn,
            &sample(Category::Waste, Difficulty::Easy, Cadence::Daily),
            100,
        )
        .expect("to deactivate");
        deactivate(&conn, dead).expect("deactivate");

        let daily = active_templates(&conn, Cadence::Daily).expect("daily list");
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].category, Category::Energy);

        let weekly = active_templates(&conn, Cadence::Weekly).expect("weekly list");
        assert_eq!(weekly.len(), 1);
        assert_eq!(weekly[0].duration_days, 7);
    }
}
