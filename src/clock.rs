// Game calendar helpers. The whole game runs on a fixed UTC+3 clock,
// regardless of user locale.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};

/// Offset of the game calendar from UTC, in seconds.
pub const GAME_OFFSET_SECS: i32 = 3 * 3600;

// Time-of-day (UTC) of the reference instant used by deterministic sizing.
const SEED_HOUR: u32 = 12;
const SEED_MINUTE: u32 = 36;

fn game_offset() -> FixedOffset {
    FixedOffset::east_opt(GAME_OFFSET_SECS).unwrap()
}

/// Current calendar date on the game clock.
pub fn game_date(now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&game_offset()).date_naive()
}

/// Unix timestamp of the fixed per-day reference instant used by the
/// sizing formula: `SEED_HOUR:SEED_MINUTE` UTC on the given date.
pub fn seed_timestamp(date: NaiveDate) -> i64 {
    let tod = NaiveTime::from_hms_opt(SEED_HOUR, SEED_MINUTE, 0).unwrap();
    date.and_time(tod).and_utc().timestamp()
}

/// Time left until the next game-clock midnight, as (hours, minutes).
/// Used for the "next feeding in H hours M minutes" reply.
pub fn time_until_next_day(now: DateTime<Utc>) -> (i64, i64) {
    let local = now.with_timezone(&game_offset());
    let next_midnight = (local.date_naive() + Duration::days(1)).and_time(NaiveTime::MIN);
    let remaining = next_midnight - local.naive_local();
    (remaining.num_hours(), remaining.num_minutes() % 60)
}
