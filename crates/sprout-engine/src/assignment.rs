//! Assignment engine: picks which catalog templates to instantiate for
//! a user and period.
//!
//! Selection is biased three ways: difficulty is sampled from the
//! user's completion rate, categories are ranked ascending by
//! historical completions, and recently seen templates are excluded.
//! Every constraint is best-effort — when filtering empties the
//! candidate set, the engine relaxes rather than failing to assign.

use std::collections::HashSet;

use chrono::Duration;
use rand::seq::SliceRandom;
use rand::Rng;
use rusqlite::Connection;
use tracing::{debug, info};

use sprout_db::queries::{catalog, missions, preferences};
use sprout_types::catalog::{Cadence, Category, Difficulty, MissionTemplate};
use sprout_types::mission::MissionStatus;
use sprout_types::progression::UserPreference;
use sprout_types::{
    TemplateId, UserId, DAILY_POOL_SIZE, MANDATORY_LOOKBACK_DAYS, NEW_USER_COMPLETION_THRESHOLD,
    POOL_LOOKBACK_DAYS, WEEKLY_LOOKBACK_DAYS,
};

use crate::calendar::Calendar;
use crate::Result;

/// Sample a difficulty from the user's track record. Re-rolled on
/// every call, never cached.
pub fn select_difficulty(prefs: &UserPreference, rng: &mut impl Rng) -> Difficulty {
    if prefs.total_completed < NEW_USER_COMPLETION_THRESHOLD {
        return Difficulty::Easy;
    }
    if prefs.completion_rate >= 0.7 {
        if rng.gen_bool(0.5) {
            Difficulty::Medium
        } else {
            Difficulty::Hard
        }
    } else if prefs.completion_rate >= 0.4 {
        if rng.gen_bool(0.5) {
            Difficulty::Easy
        } else {
            Difficulty::Medium
        }
    } else {
        Difficulty::Easy
    }
}

/// Categories ranked ascending by completion count, ties shuffled, so
/// under-served categories come first.
pub fn category_priority(prefs: &UserPreference, rng: &mut impl Rng) -> Vec<Category> {
    let mut ranked: Vec<(Category, i64)> = Category::ALL
        .iter()
        .map(|&c| (c, prefs.completed_in(c)))
        .collect();
    ranked.shuffle(rng);
    // Stable sort preserves the shuffled order within equal counts.
    ranked.sort_by_key(|&(_, count)| count);
    ranked.into_iter().map(|(c, _)| c).collect()
}

fn pick_in<'a>(
    templates: &'a [MissionTemplate],
    rng: &mut impl Rng,
    predicate: impl Fn(&MissionTemplate) -> bool,
) -> Option<&'a MissionTemplate> {
    let matching: Vec<&MissionTemplate> = templates.iter().filter(|t| predicate(t)).collect();
    matching.choose(rng).copied()
}

/// Pick the mandatory daily template: least-completed category at the
/// sampled difficulty, relaxing difficulty and then recency until
/// something matches.
fn pick_mandatory<'a>(
    templates: &'a [MissionTemplate],
    priority: &[Category],
    difficulty: Difficulty,
    excluded: &HashSet<TemplateId>,
    rng: &mut impl Rng,
) -> Option<&'a MissionTemplate> {
    for &category in priority {
        if let Some(t) = pick_in(templates, rng, |t| {
            t.category == category && t.difficulty == difficulty && !excluded.contains(&t.id)
        }) {
            return Some(t);
        }
        if let Some(t) = pick_in(templates, rng, |t| {
            t.category == category && !excluded.contains(&t.id)
        }) {
            return Some(t);
        }
    }
    // Recency exclusion emptied everything; ignore it.
    for &category in priority {
        if let Some(t) = pick_in(templates, rng, |t| t.category == category) {
            return Some(t);
        }
    }
    None
}

/// Pick one pool template not already chosen: category+difficulty
/// first, then any fresh template, then any template at all.
fn pick_pool_slot<'a>(
    templates: &'a [MissionTemplate],
    priority: &[Category],
    difficulty: Difficulty,
    excluded: &HashSet<TemplateId>,
    chosen: &HashSet<TemplateId>,
    rng: &mut impl Rng,
) -> Option<&'a MissionTemplate> {
    for &category in priority {
        if let Some(t) = pick_in(templates, rng, |t| {
            t.category == category
                && t.difficulty == difficulty
                && !chosen.contains(&t.id)
                && !excluded.contains(&t.id)
        }) {
            return Some(t);
        }
    }
    if let Some(t) = pick_in(templates, rng, |t| {
        !chosen.contains(&t.id) && !excluded.contains(&t.id)
    }) {
        return Some(t);
    }
    pick_in(templates, rng, |t| !chosen.contains(&t.id))
}

fn recent_ids(
    conn: &Connection,
    user_id: UserId,
    today: chrono::NaiveDate,
    lookback_days: i64,
) -> Result<HashSet<TemplateId>> {
    let since = today - Duration::days(lookback_days);
    Ok(missions::recent_template_ids(conn, user_id, since)?
        .into_iter()
        .collect())
}

/// Top up today's optional daily pool to its target size. Returns how
/// many instances were inserted. Shared between first assignment and
/// the paid refresh.
pub fn fill_daily_pool(
    conn: &Connection,
    user_id: UserId,
    cal: &impl Calendar,
    rng: &mut impl Rng,
) -> Result<usize> {
    let today = cal.today();
    let templates = catalog::active_templates(conn, Cadence::Daily)?;
    if templates.is_empty() {
        return Ok(0);
    }

    let prefs = preferences::get_or_create(conn, user_id, cal.now())?;
    let difficulty = select_difficulty(&prefs, rng);
    let priority = category_priority(&prefs, rng);
    let excluded = recent_ids(conn, user_id, today, POOL_LOOKBACK_DAYS)?;

    // Whatever already sits on today's board (mandatory, accepted,
    // even completed) must not repeat in the pool.
    let board = missions::for_pool_date(conn, user_id, today, Cadence::Daily)?;
    let mut chosen: HashSet<TemplateId> =
        board.iter().map(|m| m.instance.template_id).collect();
    let mut open_slots = DAILY_POOL_SIZE.saturating_sub(
        board
            .iter()
            .filter(|m| !m.instance.is_mandatory && m.instance.status == MissionStatus::Active)
            .count(),
    );

    let mut added = 0;
    while open_slots > 0 {
        let Some(template) =
            pick_pool_slot(&templates, &priority, difficulty, &excluded, &chosen, rng)
        else {
            debug!(user = user_id, added, "daily catalog exhausted");
            break;
        };
        chosen.insert(template.id);
        let inserted = missions::insert(
            conn,
            &missions::NewInstance {
                user_id,
                template_id: template.id,
                cadence: Cadence::Daily,
                is_mandatory: false,
                pool_date: today,
                max_progress: template.duration_days.max(1),
                assigned_at: cal.now(),
                expires_at: cal.day_end(),
            },
        )?;
        if inserted.is_some() {
            added += 1;
            open_slots -= 1;
        }
    }
    Ok(added)
}

/// Generate today's daily board if it does not exist yet: one
/// mandatory mission plus the optional pool. Idempotent per
/// (user, day); a concurrent generator losing the mandatory-slot
/// insert backs off entirely.
pub fn ensure_daily(
    conn: &Connection,
    user_id: UserId,
    cal: &impl Calendar,
    rng: &mut impl Rng,
) -> Result<()> {
    let today = cal.today();
    if missions::count_for_pool_date(conn, user_id, today, Cadence::Daily)? > 0 {
        return Ok(());
    }

    let templates = catalog::active_templates(conn, Cadence::Daily)?;
    if templates.is_empty() {
        debug!(user = user_id, "no active daily templates to assign");
        return Ok(());
    }

    let prefs = preferences::get_or_create(conn, user_id, cal.now())?;
    let difficulty = select_difficulty(&prefs, rng);
    let priority = category_priority(&prefs, rng);
    let excluded = recent_ids(conn, user_id, today, MANDATORY_LOOKBACK_DAYS)?;

    let Some(template) = pick_mandatory(&templates, &priority, difficulty, &excluded, rng) else {
        return Ok(());
    };
    let inserted = missions::insert(
        conn,
        &missions::NewInstance {
            user_id,
            template_id: template.id,
            cadence: Cadence::Daily,
            is_mandatory: true,
            pool_date: today,
            max_progress: template.duration_days.max(1),
            assigned_at: cal.now(),
            expires_at: cal.day_end(),
        },
    )?;
    if inserted.is_none() {
        // A concurrent assignment holds the mandatory slot; it owns
        // pool generation too.
        return Ok(());
    }
    preferences::set_last_assigned(conn, user_id, template.category, template.difficulty, cal.now())?;

    let added = fill_daily_pool(conn, user_id, cal, rng)?;
    preferences::record_assignment(conn, user_id, 1 + added as i64, cal.now())?;
    info!(
        user = user_id,
        mandatory = template.id,
        pool = added,
        %today,
        "assigned daily missions"
    );
    Ok(())
}

/// Generate this week's mission if it does not exist yet: one randomly
/// selected weekly template, avoiding ones seen in the last 30 days.
pub fn ensure_weekly(
    conn: &Connection,
    user_id: UserId,
    cal: &impl Calendar,
    rng: &mut impl Rng,
) -> Result<()> {
    let week = cal.week_start();
    if missions::count_for_pool_date(conn, user_id, week, Cadence::Weekly)? > 0 {
        return Ok(());
    }

    let templates = catalog::active_templates(conn, Cadence::Weekly)?;
    if templates.is_empty() {
        debug!(user = user_id, "no active weekly templates to assign");
        return Ok(());
    }

    let excluded = recent_ids(conn, user_id, cal.today(), WEEKLY_LOOKBACK_DAYS)?;
    let fresh: Vec<&MissionTemplate> =
        templates.iter().filter(|t| !excluded.contains(&t.id)).collect();
    let Some(template) = fresh.choose(rng).copied().or_else(|| templates.choose(rng)) else {
        return Ok(());
    };

    let inserted = missions::insert(
        conn,
        &missions::NewInstance {
            user_id,
            template_id: template.id,
            cadence: Cadence::Weekly,
            is_mandatory: false,
            pool_date: week,
            max_progress: template.duration_days.max(1),
            assigned_at: cal.now(),
            expires_at: cal.week_end(),
        },
    )?;
    if inserted.is_some() {
        preferences::record_assignment(conn, user_id, 1, cal.now())?;
        info!(user = user_id, template = template.id, week = %week, "assigned weekly mission");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use sprout_db::queries::profile;
    use sprout_db::seed;
    use sprout_types::catalog::MissionKind;

    use crate::calendar::FixedCalendar;

    fn day(s: &str) -> chrono::NaiveDate {
        s.parse().expect("date literal")
    }

    fn setup() -> (Connection, UserId, FixedCalendar) {
        let conn = sprout_db::open_memory().expect("open");
        seed::install_defaults(&conn, 100).expect("seed");
        let user_id = profile::create_user(&conn, "alex", 100).expect("user");
        (conn, user_id, FixedCalendar::at(day("2025-03-12")))
    }

    fn prefs_with(total_completed: i64, completion_rate: f64) -> UserPreference {
        UserPreference {
            user_id: 1,
            total_assigned: 10,
            total_completed,
            completion_rate,
            energy_completed: 0,
            water_completed: 0,
            transport_completed: 0,
            food_completed: 0,
            waste_completed: 0,
            preferred_difficulty: Difficulty::Easy,
            last_assigned_category: None,
        }
    }

    #[test]
    fn test_new_user_always_easy() {
        // Regardless of seed or completion rate below the threshold.
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let d = select_difficulty(&prefs_with(4, 1.0), &mut rng);
            assert_eq!(d, Difficulty::Easy);
        }
    }

    #[test]
    fn test_difficulty_buckets() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let d = select_difficulty(&prefs_with(20, 0.9), &mut rng);
            assert_ne!(d, Difficulty::Easy);

            let d = select_difficulty(&prefs_with(20, 0.5), &mut rng);
            assert_ne!(d, Difficulty::Hard);

            let d = select_difficulty(&prefs_with(20, 0.1), &mut rng);
            assert_eq!(d, Difficulty::Easy);
        }
    }

    #[test]
    fn test_category_priority_ascending() {
        let mut prefs = prefs_with(10, 0.5);
        prefs.water_completed = 5;
        prefs.energy_completed = 2;

        let mut rng = StdRng::seed_from_u64(3);
        let priority = category_priority(&prefs, &mut rng);
        assert_eq!(priority.len(), 5);
        // Zero-count categories first, water last.
        assert_eq!(priority[4], Category::Water);
        assert_eq!(priority[3], Category::Energy);
    }

    #[test]
    fn test_ensure_daily_is_idempotent() {
        let (conn, user_id, cal) = setup();
        let mut rng = StdRng::seed_from_u64(1);

        ensure_daily(&conn, user_id, &cal, &mut rng).expect("first");
        let first = missions::for_pool_date(&conn, user_id, cal.today(), Cadence::Daily)
            .expect("board");
        assert_eq!(first.len(), 1 + DAILY_POOL_SIZE);

        ensure_daily(&conn, user_id, &cal, &mut rng).expect("second");
        let second = missions::for_pool_date(&conn, user_id, cal.today(), Cadence::Daily)
            .expect("board");
        assert_eq!(second.len(), first.len());
        let first_ids: Vec<_> = first.iter().map(|m| m.instance.id).collect();
        let second_ids: Vec<_> = second.iter().map(|m| m.instance.id).collect();
        assert_eq!(first_ids, second_ids);
    }

    #[test]
    fn test_daily_board_shape() {
        let (conn, user_id, cal) = setup();
        let mut rng = StdRng::seed_from_u64(2);

        ensure_daily(&conn, user_id, &cal, &mut rng).expect("assign");
        let board = missions::for_pool_date(&conn, user_id, cal.today(), Cadence::Daily)
            .expect("board");

        let mandatory: Vec<_> = board.iter().filter(|m| m.instance.is_mandatory).collect();
        assert_eq!(mandatory.len(), 1);
        // New user: the mandatory slot must be easy.
        assert_eq!(mandatory[0].template.difficulty, Difficulty::Easy);

        // No duplicate template anywhere on the board.
        let mut ids: Vec<_> = board.iter().map(|m| m.instance.template_id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), board.len());
    }

    #[test]
    fn test_mandatory_easy_across_seeds() {
        for seed in 0..20 {
            let (conn, user_id, cal) = setup();
            let mut rng = StdRng::seed_from_u64(seed);
            ensure_daily(&conn, user_id, &cal, &mut rng).expect("assign");

            let board = missions::for_pool_date(&conn, user_id, cal.today(), Cadence::Daily)
                .expect("board");
            let mandatory = board
                .iter()
                .find(|m| m.instance.is_mandatory)
                .expect("mandatory");
            assert_eq!(mandatory.template.difficulty, Difficulty::Easy);
        }
    }

    #[test]
    fn test_pool_stops_when_catalog_exhausted() {
        let conn = sprout_db::open_memory().expect("open");
        let user_id = profile::create_user(&conn, "alex", 100).expect("user");
        // Only two daily templates in the whole catalog.
        for title in ["One", "Two"] {
            catalog::insert(
                &conn,
                &catalog::NewTemplate {
                    title: title.into(),
                    description: "small catalog".into(),
                    category: Category::Energy,
                    kind: MissionKind::RealAction,
                    difficulty: Difficulty::Easy,
                    duration_days: 1,
                    cadence: Cadence::Daily,
                    xp_reward: 10,
                    coins_reward: 5,
                    co2_impact: 0.1,
                },
                100,
            )
            .expect("template");
        }

        let cal = FixedCalendar::at(day("2025-03-12"));
        let mut rng = StdRng::seed_from_u64(4);
        ensure_daily(&conn, user_id, &cal, &mut rng).expect("assign");

        let board = missions::for_pool_date(&conn, user_id, cal.today(), Cadence::Daily)
            .expect("board");
        // Mandatory plus one pool mission; no errors, no duplicates.
        assert_eq!(board.len(), 2);
    }

    #[test]
    fn test_ensure_weekly_assigns_one() {
        let (conn, user_id, cal) = setup();
        let mut rng = StdRng::seed_from_u64(5);

        ensure_weekly(&conn, user_id, &cal, &mut rng).expect("first");
        ensure_weekly(&conn, user_id, &cal, &mut rng).expect("second");

        let board = missions::for_pool_date(&conn, user_id, cal.week_start(), Cadence::Weekly)
            .expect("board");
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].instance.max_progress, 7);
        assert_eq!(board[0].instance.pool_date, day("2025-03-09"));
    }
}
