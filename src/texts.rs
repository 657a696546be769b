// English response texts and string helpers for game replies.

use crate::db::PigRecord;
use crate::engine::duel::DuelTier;
use crate::engine::LeaderboardPage;

/// Shown when neither an override nor a platform name exists.
pub const DEFAULT_PIG_NAME: &str = "Piggy";

/// Longest accepted pig name after sanitizing.
pub const MAX_NAME_LEN: usize = 64;

/// Three-tier name resolution: override, then platform first name, then
/// the literal default.
pub fn resolve_name(record: &PigRecord) -> &str {
    if !record.display_name.is_empty() {
        &record.display_name
    } else if !record.first_name.is_empty() {
        &record.first_name
    } else {
        DEFAULT_PIG_NAME
    }
}

/// Strip markup-hostile characters and newlines from a requested name,
/// trim it, and cap the length.
pub fn sanitize_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '"' | '\'' | '@' | '\n' | '\r'))
        .collect();
    cleaned.trim().chars().take(MAX_NAME_LEN).collect()
}

/// Emoji for a pig of the given weight. The ladder has its oddities:
/// exactly 1 kg rates a plate while 2-9 kg rate only bones, and 666
/// and 777 get icons of their own.
pub fn pig_emoji(weight: i64) -> &'static str {
    match weight {
        10_000.. => "🪐",
        8_000.. => "☄",
        7_000.. => "💫",
        6_000.. => "🌠",
        5_000.. => "🌍",
        4_000.. => "🌋",
        3_000.. => "💥",
        2_000.. => "☢️",
        1_000.. => "☣️",
        800.. => "🚷",
        777 => "🎰",
        666 => "👹",
        500.. => "🐖💨",
        300.. => "🐖",
        100.. => "🐽",
        20.. => "🐷",
        18 => "🔞",
        10.. => "🍖",
        1 => "🍽",
        _ => "🦴",
    }
}

fn plural<'a>(n: i64, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 {
        one
    } else {
        many
    }
}

/// "H hours M minutes", or just the minutes when no whole hour remains.
pub fn countdown(hours: i64, minutes: i64) -> String {
    if hours == 0 {
        format!("{minutes} {}", plural(minutes, "minute", "minutes"))
    } else {
        format!(
            "{hours} {} {minutes} {}",
            plural(hours, "hour", "hours"),
            plural(minutes, "minute", "minutes")
        )
    }
}

// ── Growth replies ─────────────────────────────────────────────────────

pub fn grow_gained_message(record: &PigRecord, reported: i64) -> String {
    format!(
        "Your pig {} gained {} kg today. It now weighs {} kg {}",
        resolve_name(record),
        reported,
        record.weight,
        pig_emoji(record.weight)
    )
}

pub fn grow_lost_message(record: &PigRecord, reported: i64) -> String {
    format!(
        "Your pig {} slimmed down by {} kg today. It now weighs {} kg {}",
        resolve_name(record),
        reported,
        record.weight,
        pig_emoji(record.weight)
    )
}

pub fn already_grown_message(hours: i64, minutes: i64) -> String {
    format!(
        "You already fed your pig today. Next feeding in {}.",
        countdown(hours, minutes)
    )
}

// ── Record views ───────────────────────────────────────────────────────

pub fn my_pig_message(record: &PigRecord) -> String {
    format!(
        "Your pig {} weighs {} kg {}",
        resolve_name(record),
        record.weight,
        pig_emoji(record.weight)
    )
}

pub fn no_pig_message() -> &'static str {
    "You have no pig yet. Send \"grow\" to get one!"
}

pub fn pig_card_message(record: &PigRecord) -> String {
    format!(
        "{} {}\nWeight: {} kg\nDuels: {} won, {} lost\nTap the button to challenge this pig!",
        pig_emoji(record.weight),
        resolve_name(record),
        record.weight,
        record.wins,
        record.losses
    )
}

// ── Naming replies ─────────────────────────────────────────────────────

pub fn name_set_message(record: &PigRecord) -> String {
    format!("Done! Your pig answers to {} now.", resolve_name(record))
}

pub fn name_current_message(record: &PigRecord) -> String {
    format!("Your pig's name is {}.", resolve_name(record))
}

pub fn name_unusable_message() -> &'static str {
    "That name has nothing usable in it. Try another one."
}

// ── Leaderboard replies ────────────────────────────────────────────────

fn board_line(rank: i64, record: &PigRecord) -> String {
    format!(
        "{rank}. {}: {} kg {}",
        resolve_name(record),
        record.weight,
        pig_emoji(record.weight)
    )
}

pub fn chat_top_message(page: &LeaderboardPage) -> String {
    if page.rows.is_empty() {
        return "No pigs on this board yet. Send \"grow\" to start one!".to_string();
    }
    let mut out = String::from("Heaviest pigs in this chat:\n");
    for (i, rec) in page.rows.iter().enumerate() {
        out.push_str(&board_line(page.offset + i as i64 + 1, rec));
        out.push('\n');
    }
    out.push_str(&format!(
        "\n{} {} on the board.",
        page.total,
        plural(page.total, "pig", "pigs")
    ));
    out
}

pub fn global_top_message(rows: &[PigRecord]) -> String {
    if rows.is_empty() {
        return "No pigs seeded today yet. Be the first!".to_string();
    }
    let mut out = String::from("Today's heaviest pigs:\n");
    for (i, rec) in rows.iter().enumerate() {
        out.push_str(&board_line(i as i64 + 1, rec));
        out.push('\n');
    }
    out.trim_end().to_string()
}

pub fn wins_top_message(rows: &[PigRecord]) -> String {
    if rows.is_empty() {
        return "Nobody has dueled yet.".to_string();
    }
    let mut out = String::from("Most duel wins:\n");
    for (i, rec) in rows.iter().enumerate() {
        out.push_str(&format!(
            "{}. {}: {} {}\n",
            i as i64 + 1,
            resolve_name(rec),
            rec.wins,
            plural(rec.wins, "win", "wins")
        ));
    }
    out.trim_end().to_string()
}

// ── Duel replies ───────────────────────────────────────────────────────

pub fn duel_win_message(
    winner: &PigRecord,
    loser: &PigRecord,
    tier: DuelTier,
    damage: i64,
) -> String {
    let prefix = match tier {
        DuelTier::Plain => "",
        DuelTier::Critical => "Critical blow! ",
        DuelTier::Knockout => "Knockout! ",
    };
    format!(
        "{}{} defeats {} and takes {} kg!\n{}: {} kg {}\n{}: {} kg {}",
        prefix,
        resolve_name(winner),
        resolve_name(loser),
        damage,
        resolve_name(winner),
        winner.weight,
        pig_emoji(winner.weight),
        resolve_name(loser),
        loser.weight,
        pig_emoji(loser.weight)
    )
}

pub fn duel_draw_message(first: &PigRecord, second: &PigRecord, amount: i64) -> String {
    format!(
        "It's a draw! Both pigs leave with {amount:+} kg.\n{}: {} kg {}\n{}: {} kg {}",
        resolve_name(first),
        first.weight,
        pig_emoji(first.weight),
        resolve_name(second),
        second.weight,
        pig_emoji(second.weight)
    )
}

pub fn self_duel_message() -> &'static str {
    "Your pig refuses to fight itself."
}

pub fn duel_needs_target_message() -> &'static str {
    "Open someone's pig card and tap the fight button to duel them."
}

pub fn no_opponent_message() -> &'static str {
    "Couldn't get your opponent's pig ready. Try again in a bit."
}

// ── Misc replies ───────────────────────────────────────────────────────

pub fn failure_message() -> &'static str {
    "Something went wrong on the farm. Try again in a bit."
}

pub fn group_only_message() -> &'static str {
    "That one only works in group chats."
}

pub fn unknown_action_message() -> &'static str {
    "I don't know that one. Send \"help\" for the list."
}

pub fn help_message() -> &'static str {
    "Pig game commands:\n\
     grow - feed your pig (once a day)\n\
     my - show your chat pig\n\
     name <new name> - rename your chat pig\n\
     top - chat leaderboard\n\
     pig - your duel pig card\n\
     global_top - today's heaviest pigs\n\
     wins_top - most duel wins\n\
     help - this message"
}
