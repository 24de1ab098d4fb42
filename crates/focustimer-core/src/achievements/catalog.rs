//! Achievement catalog and unlock evaluation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::TimerSession;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub unlocked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlocked_at: Option<DateTime<Utc>>,
}

/// Unlock predicate attached to a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockRule {
    FocusSessions(usize),
    Streak(u32),
    FocusSeconds(u64),
}

struct CatalogEntry {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    icon: &'static str,
    rule: UnlockRule,
}

const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        id: "first_focus",
        title: "First Focus",
        description: "Complete your first focus session",
        icon: "award",
        rule: UnlockRule::FocusSessions(1),
    },
    CatalogEntry {
        id: "focus_streak_3",
        title: "Focus Streak",
        description: "Complete focus sessions 3 days in a row",
        icon: "flame",
        rule: UnlockRule::Streak(3),
    },
    CatalogEntry {
        id: "five_sessions",
        title: "Getting Productive",
        description: "Complete 5 focus sessions",
        icon: "star",
        rule: UnlockRule::FocusSessions(5),
    },
    CatalogEntry {
        id: "ten_sessions",
        title: "Productivity Master",
        description: "Complete 10 focus sessions",
        icon: "trophy",
        rule: UnlockRule::FocusSessions(10),
    },
    CatalogEntry {
        id: "one_hour_focus",
        title: "Deep Worker",
        description: "Accumulate 1 hour of focus time",
        icon: "target",
        rule: UnlockRule::FocusSeconds(3600),
    },
];

/// The full catalog, all locked, in canonical order.
pub fn default_achievements() -> Vec<Achievement> {
    CATALOG
        .iter()
        .map(|entry| Achievement {
            id: entry.id.to_string(),
            title: entry.title.to_string(),
            description: entry.description.to_string(),
            icon: entry.icon.to_string(),
            unlocked: false,
            unlocked_at: None,
        })
        .collect()
}

pub fn unlock_rule(id: &str) -> Option<UnlockRule> {
    CATALOG.iter().find(|entry| entry.id == id).map(|entry| entry.rule)
}

/// Rebuild a persisted list in catalog order, keeping unlock state by id.
/// Unknown ids are dropped; missing ids come back locked.
pub fn normalize(persisted: Vec<Achievement>) -> Vec<Achievement> {
    let mut achievements = default_achievements();
    for achievement in &mut achievements {
        if let Some(saved) = persisted.iter().find(|a| a.id == achievement.id) {
            achievement.unlocked = saved.unlocked;
            achievement.unlocked_at = if saved.unlocked { saved.unlocked_at } else { None };
        }
    }
    achievements
}

struct Progress {
    focus_sessions: usize,
    focus_secs: u64,
    streak: u32,
}

impl UnlockRule {
    fn satisfied(self, progress: &Progress) -> bool {
        match self {
            UnlockRule::FocusSessions(n) => progress.focus_sessions >= n,
            UnlockRule::Streak(days) => progress.streak >= days,
            UnlockRule::FocusSeconds(secs) => progress.focus_secs >= secs,
        }
    }
}

/// Return `achievements` with every newly satisfied entry unlocked at `now`.
///
/// Already unlocked entries are copied untouched. Order and length are
/// preserved so callers can diff by index.
pub fn evaluate_achievements(
    sessions: &[TimerSession],
    current_streak: u32,
    achievements: &[Achievement],
    now: DateTime<Utc>,
) -> Vec<Achievement> {
    let focus: Vec<&TimerSession> = sessions.iter().filter(|s| s.is_completed_focus()).collect();
    let progress = Progress {
        focus_sessions: focus.len(),
        focus_secs: focus.iter().map(|s| s.duration).sum(),
        streak: current_streak,
    };

    achievements
        .iter()
        .map(|achievement| {
            if achievement.unlocked {
                return achievement.clone();
            }
            match unlock_rule(&achievement.id) {
                Some(rule) if rule.satisfied(&progress) => Achievement {
                    unlocked: true,
                    unlocked_at: Some(now),
                    ..achievement.clone()
                },
                _ => achievement.clone(),
            }
        })
        .collect()
}

/// Entries locked in `before` and unlocked in `after`, compared by position.
pub fn newly_unlocked<'a>(before: &[Achievement], after: &'a [Achievement]) -> Vec<&'a Achievement> {
    before
        .iter()
        .zip(after)
        .filter(|(old, new)| old.id == new.id && !old.unlocked && new.unlocked)
        .map(|(_, new)| new)
        .collect()
}
