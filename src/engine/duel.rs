// Duel combat math for the global game.
//
// Pure resolution only: rolls, outcome tier and damage figure. Persisting
// the result is the engine's job.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Weight-ratio cap: a side more than 5x heavier has its opponent's roll
/// ceiling raised to heavy/5.
const RATIO_CAP: i64 = 5;
const CRITICAL_PCT: i64 = 95;
const KNOCKOUT_PCT: i64 = 99;

const PLAIN_DIVISOR: i64 = 8;
const CRITICAL_DIVISOR: i64 = 3;
const KNOCKOUT_DIVISOR: f64 = 1.5;

/// Severity of a decided duel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuelTier {
    Plain,
    Critical,
    Knockout,
}

impl DuelTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            DuelTier::Plain => "plain",
            DuelTier::Critical => "critical",
            DuelTier::Knockout => "knockout",
        }
    }
}

/// Which of the two weights won the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    First,
    Second,
}

/// Raw resolution before persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawOutcome {
    Win {
        winner: Side,
        tier: DuelTier,
        damage: i64,
    },
    /// Tied rolls: both sides gain `amount`.
    Draw { amount: i64 },
}

/// Roll ceilings for the two random draws.
///
/// The clamp shapes the rolls only; true weights always stay in storage.
/// Weights at or below 0 (possible after heavy duel losses) roll with a
/// ceiling of 1, i.e. always roll 0.
pub fn effective_bounds(w1: i64, w2: i64) -> (i64, i64) {
    let mut b1 = w1;
    let mut b2 = w2;
    if b2 > 0 && b1 / b2 > RATIO_CAP {
        b2 = b1 / RATIO_CAP;
    } else if b1 > 0 && b2 / b1 > RATIO_CAP {
        b1 = b2 / RATIO_CAP;
    }
    (b1.max(1), b2.max(1))
}

/// Tier of a winning roll measured against the winner's own true weight.
fn classify(roll: i64, own_weight: i64) -> DuelTier {
    if roll >= own_weight * KNOCKOUT_PCT / 100 {
        DuelTier::Knockout
    } else if roll >= own_weight * CRITICAL_PCT / 100 {
        DuelTier::Critical
    } else {
        DuelTier::Plain
    }
}

/// Weight transferred from loser to winner for a given tier.
pub fn damage(tier: DuelTier, loser_weight: i64) -> i64 {
    match tier {
        DuelTier::Plain => loser_weight / PLAIN_DIVISOR,
        DuelTier::Critical => loser_weight / CRITICAL_DIVISOR,
        // Truncates toward zero, like the integer divisions above.
        DuelTier::Knockout => (loser_weight as f64 / KNOCKOUT_DIVISOR) as i64,
    }
}

/// Resolve one duel between two current weights.
pub fn resolve<R: Rng + ?Sized>(w1: i64, w2: i64, rng: &mut R) -> RawOutcome {
    let (b1, b2) = effective_bounds(w1, w2);
    let roll1 = rng.gen_range(0..b1);
    let roll2 = rng.gen_range(0..b2);

    if roll1 == roll2 {
        // Both gain the heavier side's plain damage figure.
        return RawOutcome::Draw {
            amount: w1.max(w2) / PLAIN_DIVISOR,
        };
    }

    let (winner, roll, own, other) = if roll1 > roll2 {
        (Side::First, roll1, w1, w2)
    } else {
        (Side::Second, roll2, w2, w1)
    };
    let tier = classify(roll, own);
    RawOutcome::Win {
        winner,
        tier,
        damage: damage(tier, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_bounds_unclamped_for_close_weights() {
        assert_eq!(effective_bounds(10, 10), (10, 10));
        assert_eq!(effective_bounds(100, 30), (100, 30));
        // Exactly 5x is not "more than 5x".
        assert_eq!(effective_bounds(500, 100), (500, 100));
    }

    #[test]
    fn test_bounds_clamp_heavy_first_side() {
        assert_eq!(effective_bounds(1000, 10), (1000, 200));
        assert_eq!(effective_bounds(800, 100), (800, 160));
    }

    #[test]
    fn test_bounds_clamp_heavy_second_side() {
        assert_eq!(effective_bounds(10, 1000), (200, 1000));
        assert_eq!(effective_bounds(100, 800), (160, 800));
    }

    #[test]
    fn test_bounds_floor_nonpositive_weights() {
        assert_eq!(effective_bounds(0, 0), (1, 1));
        assert_eq!(effective_bounds(-25, 100), (1, 100));
        assert_eq!(effective_bounds(100, -25), (100, 1));
    }

    #[test]
    fn test_classify_thresholds() {
        assert_eq!(classify(94, 100), DuelTier::Plain);
        assert_eq!(classify(95, 100), DuelTier::Critical);
        assert_eq!(classify(98, 100), DuelTier::Critical);
        assert_eq!(classify(99, 100), DuelTier::Knockout);
        // Tiny winners always hit the knockout threshold: 2 * 99 / 100 = 1.
        assert_eq!(classify(1, 2), DuelTier::Knockout);
    }

    #[test]
    fn test_damage_figures() {
        assert_eq!(damage(DuelTier::Plain, 80), 10);
        assert_eq!(damage(DuelTier::Critical, 80), 26);
        assert_eq!(damage(DuelTier::Knockout, 80), 53); // 80 / 1.5 = 53.33
        assert_eq!(damage(DuelTier::Knockout, 9), 6);
        // Truncation toward zero on negative loser weights.
        assert_eq!(damage(DuelTier::Plain, -10), -1);
        assert_eq!(damage(DuelTier::Knockout, -10), -6);
    }

    #[test]
    fn test_resolve_damage_matches_tier() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..500 {
            match resolve(500, 500, &mut rng) {
                RawOutcome::Win { tier, damage, .. } => match tier {
                    DuelTier::Plain => assert_eq!(damage, 62),
                    DuelTier::Critical => assert_eq!(damage, 166),
                    DuelTier::Knockout => assert_eq!(damage, 333),
                },
                RawOutcome::Draw { amount } => assert_eq!(amount, 62),
            }
        }
    }

    #[test]
    fn test_resolve_equal_tiny_weights_always_draw() {
        // Both ceilings are 1, so both rolls are always 0.
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..50 {
            assert_eq!(resolve(1, 1, &mut rng), RawOutcome::Draw { amount: 0 });
        }
    }

    #[test]
    fn test_resolve_nonpositive_weight_never_wins() {
        // A ruined pig rolls 0 every time; it can tie but never beat a
        // positive roll.
        let mut rng = StdRng::seed_from_u64(17);
        for _ in 0..500 {
            if let RawOutcome::Win { winner, .. } = resolve(-5, 100, &mut rng) {
                assert_eq!(winner, Side::Second);
            }
        }
    }

    #[test]
    fn test_resolve_featherweight_win_is_knockout() {
        // (1, 1000): the ratio cap raises the light side's ceiling to 200,
        // and any winning roll clears 1 * 99 / 100 = 0.
        let mut rng = StdRng::seed_from_u64(31);
        let mut light_side_won = false;
        for _ in 0..2_000 {
            if let RawOutcome::Win {
                winner: Side::First,
                tier,
                damage,
            } = resolve(1, 1000, &mut rng)
            {
                light_side_won = true;
                assert_eq!(tier, DuelTier::Knockout);
                assert_eq!(damage, 666);
            }
        }
        assert!(light_side_won, "expected at least one upset in 2000 duels");
    }

    #[test]
    fn test_draw_amount_uses_heavier_side() {
        let mut rng = StdRng::seed_from_u64(11);
        // Force draws by pairing two ruined pigs: both roll 0.
        for _ in 0..20 {
            match resolve(-16, -8, &mut rng) {
                RawOutcome::Draw { amount } => assert_eq!(amount, -1),
                other => panic!("expected draw, got {other:?}"),
            }
        }
    }
}
