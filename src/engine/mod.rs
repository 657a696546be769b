// Game engine: daily growth, deterministic sizing, duels, leaderboards.

pub mod duel;
pub mod growth;
pub mod sizing;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, warn};

use crate::clock;
use crate::db::{Database, PigRecord, Scope};
use crate::error::GameError;
use crate::locks::RecordLocks;
use crate::metrics;

/// Chat leaderboards paginate in pages of this many rows.
pub const PAGE_SIZE: i64 = 50;
/// The global daily and wins boards show this many rows.
pub const SHORT_TOP_LIMIT: i64 = 10;

/// Outcome of the daily growth action.
#[derive(Debug, Clone)]
pub enum GrowOutcome {
    Grown {
        record: PigRecord,
        /// Magnitude for the reply text (always positive).
        reported: i64,
        direction: growth::Direction,
    },
    /// Already fed today; carries the time left until the next game day.
    AlreadyGrown { hours: i64, minutes: i64 },
}

/// Outcome of a resolved duel, with both records as committed.
#[derive(Debug, Clone)]
pub enum DuelVerdict {
    Win {
        winner: PigRecord,
        loser: PigRecord,
        tier: duel::DuelTier,
        damage: i64,
    },
    Draw {
        first: PigRecord,
        second: PigRecord,
        amount: i64,
    },
}

/// One leaderboard page plus enough context to build paging buttons.
#[derive(Debug, Clone)]
pub struct LeaderboardPage {
    pub rows: Vec<PigRecord>,
    pub total: i64,
    pub offset: i64,
}

impl LeaderboardPage {
    pub fn has_prev(&self) -> bool {
        self.offset > 0
    }

    pub fn has_next(&self) -> bool {
        self.offset + (self.rows.len() as i64) < self.total
    }
}

/// Core game operations over the pig record store. All read-modify-write
/// paths take the affected records' locks first, so concurrent actions on
/// the same pig serialize instead of losing updates.
#[derive(Clone)]
pub struct GameEngine {
    db: Arc<Database>,
    locks: RecordLocks,
    store_timeout: Duration,
}

impl GameEngine {
    pub fn new(db: Arc<Database>, store_timeout: Duration) -> Self {
        Self {
            db,
            locks: RecordLocks::new(),
            store_timeout,
        }
    }

    /// Run one store call under the engine's time budget.
    async fn timed<T, F>(&self, fut: F) -> Result<T, GameError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        let _timer = metrics::STORE_SECONDS.start_timer();
        match tokio::time::timeout(self.store_timeout, fut).await {
            Ok(res) => Ok(res?),
            Err(_) => Err(GameError::StoreTimeout(
                self.store_timeout.as_millis() as u64
            )),
        }
    }

    // ── Daily growth ──────────────────────────────────────────────────

    /// Grow the chat-scoped pig once per game day.
    pub async fn grow_pig(
        &self,
        chat_id: i64,
        user_id: i64,
        first_name: &str,
        now: DateTime<Utc>,
    ) -> Result<GrowOutcome, GameError> {
        let scope = Scope::Chat(chat_id);
        let today = clock::game_date(now);
        let _guard = self.locks.lock(&scope, user_id).await;

        let existing = self.timed(self.db.get_record(&scope, user_id)).await?;
        if let Some(rec) = &existing {
            if rec.last_action_date == today {
                let (hours, minutes) = clock::time_until_next_day(now);
                metrics::GROWTH_OUTCOMES.with_label_values(&["already"]).inc();
                return Ok(GrowOutcome::AlreadyGrown { hours, minutes });
            }
        }

        let delta = growth::draw_delta(&mut rand::thread_rng());
        let applied = growth::apply_delta(existing.as_ref().map(|r| r.weight), delta);
        let name = pick_name(first_name, existing.as_ref());

        let record = match &existing {
            None => {
                self.timed(self.db.insert_record(
                    &scope,
                    user_id,
                    applied.new_weight,
                    &name,
                    today,
                ))
                .await?
            }
            Some(_) => {
                let updated = self
                    .timed(self.db.apply_growth(
                        &scope,
                        user_id,
                        applied.new_weight,
                        &name,
                        today,
                    ))
                    .await?;
                match updated {
                    Some(rec) => rec,
                    // The date guard fired under us; treat as already fed.
                    None => {
                        let (hours, minutes) = clock::time_until_next_day(now);
                        metrics::GROWTH_OUTCOMES.with_label_values(&["already"]).inc();
                        return Ok(GrowOutcome::AlreadyGrown { hours, minutes });
                    }
                }
            }
        };

        metrics::GROWTH_OUTCOMES
            .with_label_values(&[applied.direction.as_str()])
            .inc();
        info!(
            chat_id,
            user_id,
            delta = applied.reported,
            weight = record.weight,
            "pig grown"
        );
        Ok(GrowOutcome::Grown {
            record,
            reported: applied.reported,
            direction: applied.direction,
        })
    }

    // ── Global records ────────────────────────────────────────────────

    /// Fetch the user's global record, creating or re-seeding it for
    /// `today`. Fresh weights come from the sizing formula; a re-seed
    /// adds the subscription bonus and burns one-shot tiers. Callers must
    /// hold the record's lock.
    pub async fn ensure_global_today(
        &self,
        user_id: i64,
        first_name: &str,
        today: NaiveDate,
    ) -> Result<PigRecord, GameError> {
        let scope = Scope::Global;
        let existing = self.timed(self.db.get_record(&scope, user_id)).await?;

        let record = match existing {
            Some(rec) if rec.last_action_date == today => rec,
            Some(rec) => {
                let tier = rec.subscription();
                let weight =
                    sizing::compute_initial_size(user_id, today).max(1) + tier.seed_bonus();
                let name = pick_name(first_name, Some(&rec));
                let reseeded = self
                    .timed(self.db.reseed_record(
                        &scope,
                        user_id,
                        weight,
                        tier.after_seed().as_str(),
                        &name,
                        today,
                    ))
                    .await?;
                match reseeded {
                    Some(updated) => updated,
                    // A concurrent action re-seeded first; its row stands.
                    None => self
                        .timed(self.db.get_record(&scope, user_id))
                        .await?
                        .ok_or_else(|| {
                            GameError::Invariant(format!(
                                "global record for user {user_id} vanished during re-seed"
                            ))
                        })?,
                }
            }
            None => {
                let weight = sizing::compute_initial_size(user_id, today).max(1);
                let inserted = self
                    .timed(self.db.insert_record(&scope, user_id, weight, first_name, today))
                    .await;
                match inserted {
                    Ok(rec) => rec,
                    // Lost an insert race; the retry fetch must find the row.
                    Err(GameError::Store(e)) if is_unique_violation(&e) => self
                        .timed(self.db.get_record(&scope, user_id))
                        .await?
                        .ok_or_else(|| {
                            GameError::Invariant(format!(
                                "global record for user {user_id} missing after insert retry"
                            ))
                        })?,
                    Err(e) => return Err(e),
                }
            }
        };
        Ok(record)
    }

    /// Global pig card for inline views, materializing today's record.
    pub async fn pig_card(
        &self,
        user_id: i64,
        first_name: &str,
        now: DateTime<Utc>,
    ) -> Result<PigRecord, GameError> {
        let today = clock::game_date(now);
        let _guard = self.locks.lock(&Scope::Global, user_id).await;
        self.ensure_global_today(user_id, first_name, today).await
    }

    // ── Duels ─────────────────────────────────────────────────────────

    /// Resolve a duel between two users' global records, committing both
    /// sides atomically.
    pub async fn resolve_duel(
        &self,
        initiator: i64,
        initiator_name: &str,
        opponent: i64,
        opponent_name: &str,
        now: DateTime<Utc>,
    ) -> Result<DuelVerdict, GameError> {
        if initiator == opponent {
            return Err(GameError::Invariant(
                "duel against self reached the engine".to_string(),
            ));
        }
        let scope = Scope::Global;
        let today = clock::game_date(now);
        let _guards = self.locks.lock_pair(&scope, initiator, opponent).await;

        let first = self.establish_duelist(initiator, initiator_name, today).await?;
        let second = self.establish_duelist(opponent, opponent_name, today).await?;

        let raw = duel::resolve(first.weight, second.weight, &mut rand::thread_rng());

        let verdict = match raw {
            duel::RawOutcome::Win { winner, tier, damage } => {
                let (winner_id, loser_id) = match winner {
                    duel::Side::First => (first.user_id, second.user_id),
                    duel::Side::Second => (second.user_id, first.user_id),
                };
                let committed = self
                    .timed(self.db.apply_duel(&scope, winner_id, loser_id, damage, today))
                    .await?;
                let (w, l) = committed.ok_or_else(|| {
                    GameError::Invariant(format!(
                        "duel commit lost records for users {initiator} and {opponent}"
                    ))
                })?;
                metrics::DUELS_TOTAL.with_label_values(&[tier.as_str()]).inc();
                info!(
                    winner = w.user_id,
                    loser = l.user_id,
                    tier = tier.as_str(),
                    damage,
                    "duel resolved"
                );
                DuelVerdict::Win {
                    winner: w,
                    loser: l,
                    tier,
                    damage,
                }
            }
            duel::RawOutcome::Draw { amount } => {
                let committed = self
                    .timed(self.db.apply_duel_draw(&scope, initiator, opponent, amount, today))
                    .await?;
                let (f, s) = committed.ok_or_else(|| {
                    GameError::Invariant(format!(
                        "drawn duel commit lost records for users {initiator} and {opponent}"
                    ))
                })?;
                metrics::DUELS_TOTAL.with_label_values(&["draw"]).inc();
                info!(first = f.user_id, second = s.user_id, amount, "duel drawn");
                DuelVerdict::Draw {
                    first: f,
                    second: s,
                    amount,
                }
            }
        };
        Ok(verdict)
    }

    /// Establish one duelist's record for today. Store faults degrade to
    /// `NoOpponentRecord`; invariant breaks keep their severity.
    async fn establish_duelist(
        &self,
        user_id: i64,
        first_name: &str,
        today: NaiveDate,
    ) -> Result<PigRecord, GameError> {
        match self.ensure_global_today(user_id, first_name, today).await {
            Ok(rec) => Ok(rec),
            Err(err @ GameError::Invariant(_)) => Err(err),
            Err(err) => {
                warn!(user_id, error = %err, "duelist record could not be established");
                Err(GameError::NoOpponentRecord)
            }
        }
    }

    // ── Views ─────────────────────────────────────────────────────────

    /// The caller's chat-scoped pig, if they have one.
    pub async fn my_pig(&self, chat_id: i64, user_id: i64) -> Result<PigRecord, GameError> {
        self.timed(self.db.get_record(&Scope::Chat(chat_id), user_id))
            .await?
            .ok_or(GameError::NoRecordFound)
    }

    /// Rename the caller's chat-scoped pig. The name must already be
    /// sanitized.
    pub async fn set_name(
        &self,
        chat_id: i64,
        user_id: i64,
        name: &str,
    ) -> Result<PigRecord, GameError> {
        let scope = Scope::Chat(chat_id);
        let updated = self
            .timed(self.db.set_display_name(&scope, user_id, name))
            .await?;
        if !updated {
            return Err(GameError::NoRecordFound);
        }
        self.timed(self.db.get_record(&scope, user_id))
            .await?
            .ok_or(GameError::NoRecordFound)
    }

    /// One page of the chat leaderboard, honoring the chat's minimum
    /// weight setting.
    pub async fn chat_top(&self, chat_id: i64, offset: i64) -> Result<LeaderboardPage, GameError> {
        let scope = Scope::Chat(chat_id);
        let offset = offset.max(0);
        let min_weight = self.timed(self.db.min_top_weight(&scope)).await?;
        let (rows, total) = self
            .timed(self.db.top_by_weight(&scope, min_weight, PAGE_SIZE, offset))
            .await?;
        metrics::LEADERBOARD_PAGES.inc();
        Ok(LeaderboardPage { rows, total, offset })
    }

    /// Heaviest global pigs seeded today.
    pub async fn global_top_today(&self, now: DateTime<Utc>) -> Result<Vec<PigRecord>, GameError> {
        let today = clock::game_date(now);
        self.timed(self.db.top_today(today, SHORT_TOP_LIMIT)).await
    }

    /// Global pigs with the most duel wins.
    pub async fn wins_top(&self) -> Result<Vec<PigRecord>, GameError> {
        self.timed(self.db.top_by_wins(SHORT_TOP_LIMIT)).await
    }
}

/// Platform names can arrive empty; fall back to what the record holds.
fn pick_name(provided: &str, existing: Option<&PigRecord>) -> String {
    if provided.is_empty() {
        existing.map(|r| r.first_name.clone()).unwrap_or_default()
    } else {
        provided.to_string()
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
