//! Writing goals tracked against [`TextStatistics`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::stats::TextStatistics;

/// Statistic a goal tracks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum GoalKind {
    WordCount,
    ReadingTime,
    Sentences,
}

impl GoalKind {
    pub fn metric(self, stats: &TextStatistics) -> usize {
        match self {
            GoalKind::WordCount => stats.word_count,
            GoalKind::ReadingTime => stats.reading_time_minutes,
            GoalKind::Sentences => stats.sentence_count,
        }
    }
}

impl fmt::Display for GoalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoalKind::WordCount => f.write_str("word-count"),
            GoalKind::ReadingTime => f.write_str("reading-time"),
            GoalKind::Sentences => f.write_str("sentences"),
        }
    }
}

impl FromStr for GoalKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "word-count" | "wordcount" | "words" => Ok(GoalKind::WordCount),
            "reading-time" | "readingtime" | "minutes" => Ok(GoalKind::ReadingTime),
            "sentences" | "sentence-count" => Ok(GoalKind::Sentences),
            other => Err(format!(
                "unknown goal type `{other}` (expected word-count, reading-time or sentences)"
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WritingGoal {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: GoalKind,
    pub target: usize,
    pub current: usize,
    pub completed: bool,
}

impl WritingGoal {
    /// Progress towards the target as a percentage, capped at 100.
    pub fn percent(&self) -> u32 {
        if self.target == 0 {
            return 100;
        }
        let ratio = self.current as f64 / self.target as f64;
        (ratio * 100.0).min(100.0).round() as u32
    }
}

pub fn create_goal(kind: GoalKind, target: usize) -> WritingGoal {
    WritingGoal {
        id: Uuid::new_v4(),
        kind,
        target,
        current: 0,
        completed: false,
    }
}

/// Recompute progress from a fresh statistics snapshot.
///
/// `completed` mirrors the snapshot: a goal whose metric drops back below the
/// target is no longer completed. The target never changes.
pub fn update_goal_progress(goal: &WritingGoal, stats: &TextStatistics) -> WritingGoal {
    let current = goal.kind.metric(stats);
    WritingGoal {
        current,
        completed: current >= goal.target,
        ..goal.clone()
    }
}
