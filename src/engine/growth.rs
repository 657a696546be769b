// Daily growth math for the chat-scoped game.

use rand::Rng;
use serde::{Deserialize, Serialize};

// First draw range. Draws below 1 are replaced by a loss redraw.
const DRAW_MIN: i64 = -2;
const DRAW_MAX: i64 = 19;
const LOSS_MIN: i64 = -20;
const LOSS_MAX: i64 = -1;

/// Direction of a growth action as reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Gained,
    Lost,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Gained => "gained",
            Direction::Lost => "lost",
        }
    }
}

/// Result of applying one daily delta to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedDelta {
    pub new_weight: i64,
    /// Magnitude shown to the user; diverges from the arithmetic delta
    /// when the weight floor fires.
    pub reported: i64,
    pub direction: Direction,
}

/// Draw the daily delta: uniform in [-2, 19], but a draw below 1 is
/// discarded for a second uniform draw in [-20, -1]. A day is never
/// a wash: the result is a gain in [1, 19] or a loss in [-20, -1].
pub fn draw_delta<R: Rng + ?Sized>(rng: &mut R) -> i64 {
    let first = rng.gen_range(DRAW_MIN..=DRAW_MAX);
    if first < 1 {
        rng.gen_range(LOSS_MIN..=LOSS_MAX)
    } else {
        first
    }
}

/// Apply a delta to the current weight (`None` when no record exists yet).
///
/// The stored weight never drops below 1 on this path. When the floor
/// fires the action reports as a loss of exactly 1.
pub fn apply_delta(current: Option<i64>, delta: i64) -> AppliedDelta {
    let base = current.unwrap_or(0);
    let candidate = base + delta;
    if candidate < 1 {
        return AppliedDelta {
            new_weight: 1,
            reported: 1,
            direction: Direction::Lost,
        };
    }
    AppliedDelta {
        new_weight: candidate,
        reported: delta.abs(),
        direction: if delta < 0 {
            Direction::Lost
        } else {
            Direction::Gained
        },
    }
}
