//! Default mission catalog and badge set.
//!
//! Installed on first start so a fresh database is immediately
//! playable. Each installer is a no-op when its table already has
//! rows, so operator edits survive restarts.

use rusqlite::Connection;
use tracing::info;

use sprout_types::badge::UnlockCondition;
use sprout_types::catalog::{Cadence, Category, Difficulty, MissionKind};

use crate::queries::{badges, catalog};
use crate::Result;

/// Install the default catalog and badges if the tables are empty.
pub fn install_defaults(conn: &Connection, now: i64) -> Result<()> {
    install_default_catalog(conn, now)?;
    install_default_badges(conn)?;
    Ok(())
}

struct SeedTemplate {
    title: &'static str,
    description: &'static str,
    category: Category,
    kind: MissionKind,
    difficulty: Difficulty,
    xp: i64,
    coins: i64,
    co2: f64,
}

// One template per (category, difficulty) so every assignment path has
// a candidate, plus a handful of extras in the most common categories.
const DAILY_TEMPLATES: &[SeedTemplate] = &[
    // Energy
    SeedTemplate {
        title: "Lights out",
        description: "Turn off all lights in rooms you are not using for the whole day",
        category: Category::Energy,
        kind: MissionKind::RealAction,
        difficulty: Difficulty::Easy,
        xp: 10,
        coins: 5,
        co2: 0.5,
    },
    SeedTemplate {
        title: "Unplug standby devices",
        description: "Unplug chargers, TVs and consoles that are on standby",
        category: Category::Energy,
        kind: MissionKind::RealAction,
        difficulty: Difficulty::Medium,
        xp: 20,
        coins: 12,
        co2: 1.2,
    },
    SeedTemplate {
        title: "Screen-free evening",
        description: "Spend the evening without screens or powered entertainment",
        category: Category::Energy,
        kind: MissionKind::RealAction,
        difficulty: Difficulty::Hard,
        xp: 35,
        coins: 20,
        co2: 2.0,
    },
    // Water
    SeedTemplate {
        title: "Two-minute tap check",
        description: "Close the tap while brushing your teeth and soaping your hands",
        category: Category::Water,
        kind: MissionKind::RealAction,
        difficulty: Difficulty::Easy,
        xp: 10,
        coins: 5,
        co2: 0.3,
    },
    SeedTemplate {
        title: "Five-minute shower",
        description: "Keep your shower under five minutes today",
        category: Category::Water,
        kind: MissionKind::RealAction,
        difficulty: Difficulty::Medium,
        xp: 20,
        coins: 12,
        co2: 1.0,
    },
    SeedTemplate {
        title: "Reuse greywater",
        description: "Collect rinse water and reuse it for plants or cleaning",
        category: Category::Water,
        kind: MissionKind::RealAction,
        difficulty: Difficulty::Hard,
        xp: 35,
        coins: 20,
        co2: 1.8,
    },
    // Transport
    SeedTemplate {
        title: "Walk a short trip",
        description: "Walk instead of driving for one trip under one kilometer",
        category: Category::Transport,
        kind: MissionKind::RealAction,
        difficulty: Difficulty::Easy,
        xp: 10,
        coins: 5,
        co2: 0.8,
    },
    SeedTemplate {
        title: "Take public transit",
        description: "Replace one car trip with bus, train or metro",
        category: Category::Transport,
        kind: MissionKind::RealAction,
        difficulty: Difficulty::Medium,
        xp: 20,
        coins: 12,
        co2: 2.5,
    },
    SeedTemplate {
        title: "Car-free day",
        description: "Go the whole day without using a car",
        category: Category::Transport,
        kind: MissionKind::RealAction,
        difficulty: Difficulty::Hard,
        xp: 35,
        coins: 20,
        co2: 4.0,
    },
    // Food
    SeedTemplate {
        title: "Local produce pick",
        description: "Choose one locally grown item for a meal today",
        category: Category::Food,
        kind: MissionKind::RealAction,
        difficulty: Difficulty::Easy,
        xp: 10,
        coins: 5,
        co2: 0.6,
    },
    SeedTemplate {
        title: "Meat-free day",
        description: "Eat vegetarian for the whole day",
        category: Category::Food,
        kind: MissionKind::RealAction,
        difficulty: Difficulty::Medium,
        xp: 20,
        coins: 15,
        co2: 2.5,
    },
    SeedTemplate {
        title: "Zero food waste",
        description: "Plan portions so nothing edible is thrown away today",
        category: Category::Food,
        kind: MissionKind::RealAction,
        difficulty: Difficulty::Hard,
        xp: 35,
        coins: 20,
        co2: 3.0,
    },
    // Waste
    SeedTemplate {
        title: "Sort your recycling",
        description: "Separate paper, plastic and glass from today's waste",
        category: Category::Waste,
        kind: MissionKind::RealAction,
        difficulty: Difficulty::Easy,
        xp: 10,
        coins: 5,
        co2: 0.4,
    },
    SeedTemplate {
        title: "Refuse single-use plastic",
        description: "Get through the day without accepting any single-use plastic",
        category: Category::Waste,
        kind: MissionKind::RealAction,
        difficulty: Difficulty::Medium,
        xp: 20,
        coins: 12,
        co2: 1.5,
    },
    SeedTemplate {
        title: "Zero-waste day",
        description: "Produce no landfill waste for the whole day",
        category: Category::Waste,
        kind: MissionKind::RealAction,
        difficulty: Difficulty::Hard,
        xp: 35,
        coins: 20,
        co2: 2.8,
    },
    // Educational
    SeedTemplate {
        title: "Energy label check",
        description: "Read the energy label of one appliance and note its class",
        category: Category::Energy,
        kind: MissionKind::Educational,
        difficulty: Difficulty::Easy,
        xp: 10,
        coins: 5,
        co2: 0.0,
    },
    SeedTemplate {
        title: "Learn your water footprint",
        description: "Look up the water footprint of a food you eat often",
        category: Category::Water,
        kind: MissionKind::Educational,
        difficulty: Difficulty::Easy,
        xp: 10,
        coins: 5,
        co2: 0.0,
    },
];

const WEEKLY_TEMPLATES: &[SeedTemplate] = &[
    SeedTemplate {
        title: "Bike to work week",
        description: "Cycle or walk your commute every day this week",
        category: Category::Transport,
        kind: MissionKind::RealAction,
        difficulty: Difficulty::Hard,
        xp: 150,
        coins: 80,
        co2: 15.0,
    },
    SeedTemplate {
        title: "Plant-based week",
        description: "Eat at least one fully plant-based meal every day this week",
        category: Category::Food,
        kind: MissionKind::RealAction,
        difficulty: Difficulty::Hard,
        xp: 150,
        coins: 80,
        co2: 12.0,
    },
    SeedTemplate {
        title: "Plastic audit week",
        description: "Log every piece of plastic you discard each day for a week",
        category: Category::Waste,
        kind: MissionKind::RealAction,
        difficulty: Difficulty::Hard,
        xp: 150,
        coins: 80,
        co2: 8.0,
    },
];

/// Seed the challenge catalog when it is empty.
pub fn install_default_catalog(conn: &Connection, now: i64) -> Result<()> {
    if catalog::count(conn)? > 0 {
        return Ok(());
    }

    for seed in DAILY_TEMPLATES {
        catalog::insert(
            conn,
            &catalog::NewTemplate {
                title: seed.title.into(),
                description: seed.description.into(),
                category: seed.category,
                kind: seed.kind,
                difficulty: seed.difficulty,
                duration_days: 1,
                cadence: Cadence::Daily,
                xp_reward: seed.xp,
                coins_reward: seed.coins,
                co2_impact: seed.co2,
            },
            now,
        )?;
    }
    for seed in WEEKLY_TEMPLATES {
        catalog::insert(
            conn,
            &catalog::NewTemplate {
                title: seed.title.into(),
                description: seed.description.into(),
                category: seed.category,
                kind: seed.kind,
                difficulty: seed.difficulty,
                duration_days: 7,
                cadence: Cadence::Weekly,
                xp_reward: seed.xp,
                coins_reward: seed.coins,
                co2_impact: seed.co2,
            },
            now,
        )?;
    }

    info!(
        daily = DAILY_TEMPLATES.len(),
        weekly = WEEKLY_TEMPLATES.len(),
        "seeded default mission catalog"
    );
    Ok(())
}

struct SeedBadge {
    name: &'static str,
    description: &'static str,
    icon: &'static str,
    category: &'static str,
    condition: UnlockCondition,
    xp: i64,
    coins: i64,
    rarity: &'static str,
}

const BADGES: &[SeedBadge] = &[
    SeedBadge {
        name: "First Step",
        description: "Complete your first mission",
        icon: "👣",
        category: "missions",
        condition: UnlockCondition::MissionsCompleted(1),
        xp: 10,
        coins: 5,
        rarity: "common",
    },
    SeedBadge {
        name: "Getting Started",
        description: "Complete 5 missions",
        icon: "🌿",
        category: "missions",
        condition: UnlockCondition::MissionsCompleted(5),
        xp: 25,
        coins: 10,
        rarity: "common",
    },
    SeedBadge {
        name: "Eco Apprentice",
        description: "Complete 10 missions",
        icon: "🍃",
        category: "missions",
        condition: UnlockCondition::MissionsCompleted(10),
        xp: 50,
        coins: 20,
        rarity: "common",
    },
    SeedBadge {
        name: "Mission Veteran",
        description: "Complete 25 missions",
        icon: "🏅",
        category: "missions",
        condition: UnlockCondition::MissionsCompleted(25),
        xp: 100,
        coins: 40,
        rarity: "rare",
    },
    SeedBadge {
        name: "Half Century",
        description: "Complete 50 missions",
        icon: "🏆",
        category: "missions",
        condition: UnlockCondition::MissionsCompleted(50),
        xp: 200,
        coins: 75,
        rarity: "rare",
    },
    SeedBadge {
        name: "Centurion",
        description: "Complete 100 missions",
        icon: "💎",
        category: "missions",
        condition: UnlockCondition::MissionsCompleted(100),
        xp: 400,
        coins: 150,
        rarity: "epic",
    },
    SeedBadge {
        name: "Rising Sprout",
        description: "Reach level 3",
        icon: "🌱",
        category: "level",
        condition: UnlockCondition::Level(3),
        xp: 30,
        coins: 15,
        rarity: "common",
    },
    SeedBadge {
        name: "Growing Strong",
        description: "Reach level 5",
        icon: "🌳",
        category: "level",
        condition: UnlockCondition::Level(5),
        xp: 60,
        coins: 25,
        rarity: "common",
    },
    SeedBadge {
        name: "Seasoned Grower",
        description: "Reach level 10",
        icon: "⭐",
        category: "level",
        condition: UnlockCondition::Level(10),
        xp: 120,
        coins: 50,
        rarity: "rare",
    },
    SeedBadge {
        name: "Canopy Climber",
        description: "Reach level 20",
        icon: "🌟",
        category: "level",
        condition: UnlockCondition::Level(20),
        xp: 250,
        coins: 100,
        rarity: "epic",
    },
    SeedBadge {
        name: "Three in a Row",
        description: "Keep a 3-day streak",
        icon: "🔥",
        category: "streak",
        condition: UnlockCondition::StreakDays(3),
        xp: 20,
        coins: 10,
        rarity: "common",
    },
    SeedBadge {
        name: "Green Week",
        description: "Keep a 7-day streak",
        icon: "📅",
        category: "streak",
        condition: UnlockCondition::StreakDays(7),
        xp: 50,
        coins: 25,
        rarity: "common",
    },
    SeedBadge {
        name: "Fortnight of Habit",
        description: "Keep a 14-day streak",
        icon: "⚡",
        category: "streak",
        condition: UnlockCondition::StreakDays(14),
        xp: 120,
        coins: 50,
        rarity: "rare",
    },
    SeedBadge {
        name: "Unbroken Month",
        description: "Keep a 30-day streak",
        icon: "🌋",
        category: "streak",
        condition: UnlockCondition::StreakDays(30),
        xp: 300,
        coins: 120,
        rarity: "epic",
    },
    SeedBadge {
        name: "Self Surveyor",
        description: "Complete your first footprint questionnaire",
        icon: "📋",
        category: "questionnaire",
        condition: UnlockCondition::QuestionnaireCompleted(1),
        xp: 15,
        coins: 5,
        rarity: "common",
    },
    SeedBadge {
        name: "Trend Tracker",
        description: "Complete 3 footprint questionnaires",
        icon: "📈",
        category: "questionnaire",
        condition: UnlockCondition::QuestionnaireCompleted(3),
        xp: 50,
        coins: 20,
        rarity: "rare",
    },
];

/// Seed the badge catalog when it is empty.
pub fn install_default_badges(conn: &Connection) -> Result<()> {
    let existing: i64 = conn.query_row("SELECT COUNT(*) FROM badges", [], |row| row.get(0))?;
    if existing > 0 {
        return Ok(());
    }

    for seed in BADGES {
        badges::insert(
            conn,
            seed.name,
            seed.description,
            seed.icon,
            seed.category,
            seed.condition,
            seed.xp,
            seed.coins,
            seed.rarity,
        )?;
    }

    info!(count = BADGES.len(), "seeded default badge set");
    Ok(())
}
