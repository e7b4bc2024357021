//! SQL schema definitions.

/// Complete schema for the sprout v1 database.
pub const SCHEMA_V1: &str = r#"
-- ============================================================
-- Users & Profiles
-- ============================================================

CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    display_name TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS user_profile (
    user_id INTEGER PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
    level INTEGER NOT NULL DEFAULT 1,
    experience INTEGER NOT NULL DEFAULT 0,
    coins INTEGER NOT NULL DEFAULT 0,
    rank TEXT NOT NULL DEFAULT 'Seed',
    rank_icon TEXT NOT NULL DEFAULT '🌱',
    total_missions_completed INTEGER NOT NULL DEFAULT 0,
    streak_days INTEGER NOT NULL DEFAULT 0,
    last_activity_date TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

-- ============================================================
-- Mission Catalog
-- ============================================================

CREATE TABLE IF NOT EXISTS challenges (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    category TEXT NOT NULL,
    kind TEXT NOT NULL DEFAULT 'real_action',
    difficulty TEXT NOT NULL DEFAULT 'easy',
    duration_days INTEGER NOT NULL DEFAULT 1,
    cadence TEXT NOT NULL DEFAULT 'daily',
    xp_reward INTEGER NOT NULL,
    coins_reward INTEGER NOT NULL,
    co2_impact REAL NOT NULL DEFAULT 0,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_challenges_active
    ON challenges(cadence, is_active);

-- ============================================================
-- Mission Instances
-- ============================================================

CREATE TABLE IF NOT EXISTS user_missions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    challenge_id INTEGER NOT NULL REFERENCES challenges(id),
    cadence TEXT NOT NULL DEFAULT 'daily',
    is_mandatory INTEGER NOT NULL DEFAULT 0,
    pool_date TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'active',
    progress INTEGER NOT NULL DEFAULT 0,
    max_progress INTEGER NOT NULL DEFAULT 1,
    assigned_at INTEGER NOT NULL,
    accepted_at INTEGER,
    completed_at INTEGER,
    expires_at INTEGER NOT NULL,
    last_check_in TEXT,
    xp_earned INTEGER NOT NULL DEFAULT 0,
    coins_earned INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_missions_pool
    ON user_missions(user_id, pool_date, cadence);

-- At most one mandatory instance per (user, pool date). Racing lazy
-- assignments hit this constraint and are ignored.
CREATE UNIQUE INDEX IF NOT EXISTS idx_missions_mandatory
    ON user_missions(user_id, pool_date) WHERE is_mandatory = 1;

-- ============================================================
-- Preferences
-- ============================================================

CREATE TABLE IF NOT EXISTS user_mission_preferences (
    user_id INTEGER PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
    total_assigned INTEGER NOT NULL DEFAULT 0,
    total_completed INTEGER NOT NULL DEFAULT 0,
    completion_rate REAL NOT NULL DEFAULT 0,
    energy_completed INTEGER NOT NULL DEFAULT 0,
    water_completed INTEGER NOT NULL DEFAULT 0,
    transport_completed INTEGER NOT NULL DEFAULT 0,
    food_completed INTEGER NOT NULL DEFAULT 0,
    waste_completed INTEGER NOT NULL DEFAULT 0,
    preferred_difficulty TEXT NOT NULL DEFAULT 'easy',
    last_assigned_category TEXT,
    updated_at INTEGER NOT NULL
);

-- ============================================================
-- History & Reward Ledger (append-only)
-- ============================================================

CREATE TABLE IF NOT EXISTS mission_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    challenge_id INTEGER NOT NULL REFERENCES challenges(id),
    completed_at INTEGER NOT NULL,
    xp_earned INTEGER NOT NULL,
    coins_earned INTEGER NOT NULL,
    co2_saved REAL NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_history_user
    ON mission_history(user_id, completed_at);

CREATE TABLE IF NOT EXISTS rewards_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    reward_type TEXT NOT NULL,
    reward_source TEXT NOT NULL,
    amount INTEGER NOT NULL,
    description TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_rewards_user
    ON rewards_history(user_id, created_at);

CREATE TABLE IF NOT EXISTS questionnaire_results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    total_footprint REAL NOT NULL,
    created_at INTEGER NOT NULL
);

-- ============================================================
-- Progression Configuration
-- ============================================================

CREATE TABLE IF NOT EXISTS levels (
    level INTEGER PRIMARY KEY,
    experience_required INTEGER NOT NULL,
    coins_reward INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS ranks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    icon TEXT NOT NULL,
    min_level INTEGER NOT NULL,
    min_missions INTEGER NOT NULL DEFAULT 0,
    color TEXT NOT NULL,
    description TEXT NOT NULL
);

-- ============================================================
-- Badges
-- ============================================================

CREATE TABLE IF NOT EXISTS badges (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    icon TEXT NOT NULL,
    category TEXT NOT NULL,
    unlock_condition TEXT NOT NULL,
    xp_bonus INTEGER NOT NULL DEFAULT 0,
    coins_bonus INTEGER NOT NULL DEFAULT 0,
    rarity TEXT NOT NULL DEFAULT 'common',
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS user_badges (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    badge_id INTEGER NOT NULL REFERENCES badges(id),
    unlocked_at INTEGER NOT NULL,
    is_equipped INTEGER NOT NULL DEFAULT 0,
    UNIQUE(user_id, badge_id)
);
"#;
