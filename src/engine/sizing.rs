// Deterministic initial pig sizing.
//
// Seeds brand-new (or daily re-seeded) global records so a user sees a
// stable size all day without any stored random state. The divisors are
// inherited game-balance constants; they look arbitrary because they are.

use chrono::{Datelike, NaiveDate};

use crate::clock;

const CATEGORY_MODULO: f64 = 25.0;
const CATEGORY_DIVISOR: f64 = 5527.0;
const SIZE_DIVISOR: f64 = 1009.0;
const SIZE_MODULO_BASE: f64 = 4049.0;

/// Bucket the raw category figure into one of six divisor tiers.
fn category_tier(raw: f64) -> f64 {
    if raw < 0.05 {
        0.39
    } else if raw < 0.3 {
        1.0
    } else if raw < 6.0 {
        2.0
    } else if raw < 12.0 {
        3.0
    } else if raw < 21.0 {
        5.0
    } else {
        7.0
    }
}

/// Compute the deterministic initial weight for a global record.
///
/// Stable for a given (user_id, day, month): repeated calls on the same
/// game date return the same value. May return 0; callers clamp to 1
/// before persisting.
pub fn compute_initial_size(user_id: i64, date: NaiveDate) -> i64 {
    let day = date.day() as f64;
    let month = date.month() as f64;
    let ts = clock::seed_timestamp(date) as f64;
    let uid = user_id as f64;

    let raw = (ts / CATEGORY_DIVISOR * day / month + uid / (day * month))
        .rem_euclid(CATEGORY_MODULO);
    let category = category_tier(raw);

    let modulo = SIZE_MODULO_BASE + 10.0 * (day + (month - 8.0) * 30.0);
    ((ts / day * month / SIZE_DIVISOR + uid).rem_euclid(modulo) / category).floor() as i64
}
