// Pig record store (SQLite via sqlx).

use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

/// Partition key for a pig record: one specific chat, or the global
/// namespace used by the duel game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Chat(i64),
    Global,
}

impl Scope {
    /// Storage key. Chat scopes store the chat id in decimal.
    pub fn key(&self) -> String {
        match self {
            Scope::Chat(id) => id.to_string(),
            Scope::Global => "global".to_string(),
        }
    }

    pub fn parse(s: &str) -> Option<Scope> {
        if s == "global" {
            return Some(Scope::Global);
        }
        s.parse().ok().map(Scope::Chat)
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Subscription state of a user, granting weight bonuses when the global
/// record re-seeds for a new day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    None,
    Subscribed,
    Gifted,
}

impl SubscriptionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::None => "none",
            SubscriptionTier::Subscribed => "subscribed",
            SubscriptionTier::Gifted => "gifted",
        }
    }

    pub fn from_str_name(s: &str) -> Option<SubscriptionTier> {
        match s {
            "none" => Some(SubscriptionTier::None),
            "subscribed" => Some(SubscriptionTier::Subscribed),
            "gifted" => Some(SubscriptionTier::Gifted),
            _ => None,
        }
    }

    /// Weight bonus applied at re-seed time.
    pub fn seed_bonus(&self) -> i64 {
        match self {
            SubscriptionTier::None => 0,
            SubscriptionTier::Subscribed => 100,
            SubscriptionTier::Gifted => 500,
        }
    }

    /// Tier stored back after the bonus is granted. A gift is one-shot;
    /// a subscription keeps paying out daily.
    pub fn after_seed(&self) -> SubscriptionTier {
        match self {
            SubscriptionTier::Gifted => SubscriptionTier::None,
            other => *other,
        }
    }
}

/// One pig record per (scope, user). Weights are kilograms and may go
/// negative through duel losses; the growth path floors at 1.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PigRecord {
    pub id: i64,
    pub scope: String,
    pub user_id: i64,
    pub weight: i64,
    /// User-chosen name override; empty means unset.
    pub display_name: String,
    /// Last platform-provided first name, refreshed on actions.
    pub first_name: String,
    pub last_action_date: chrono::NaiveDate,
    pub wins: i64,
    pub losses: i64,
    pub tier: String,
    pub created_at: String,
    pub updated_at: String,
}

impl PigRecord {
    pub fn subscription(&self) -> SubscriptionTier {
        SubscriptionTier::from_str_name(&self.tier).unwrap_or(SubscriptionTier::None)
    }
}

const PIG_COLUMNS: &str = "id, scope, user_id, weight, display_name, first_name, last_action_date, wins, losses, tier, created_at, updated_at";

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS pigs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                scope TEXT NOT NULL,
                user_id INTEGER NOT NULL,
                weight INTEGER NOT NULL,
                display_name TEXT NOT NULL DEFAULT '',
                first_name TEXT NOT NULL DEFAULT '',
                last_action_date TEXT NOT NULL,
                wins INTEGER NOT NULL DEFAULT 0,
                losses INTEGER NOT NULL DEFAULT 0,
                tier TEXT NOT NULL DEFAULT 'none',
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(scope, user_id)
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_pigs_scope_weight ON pigs(scope, weight DESC)
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chat_settings (
                scope TEXT PRIMARY KEY,
                min_top_weight INTEGER NOT NULL DEFAULT 0
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ── Record reads ──────────────────────────────────────────────────

    pub async fn get_record(
        &self,
        scope: &Scope,
        user_id: i64,
    ) -> Result<Option<PigRecord>, sqlx::Error> {
        let row = sqlx::query_as::<_, PigRecord>(&format!(
            "SELECT {PIG_COLUMNS} FROM pigs WHERE scope = ? AND user_id = ?"
        ))
        .bind(scope.key())
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    // ── Record writes ─────────────────────────────────────────────────

    pub async fn insert_record(
        &self,
        scope: &Scope,
        user_id: i64,
        weight: i64,
        first_name: &str,
        date: chrono::NaiveDate,
    ) -> Result<PigRecord, sqlx::Error> {
        let row = sqlx::query_as::<_, PigRecord>(&format!(
            "INSERT INTO pigs (scope, user_id, weight, first_name, last_action_date) VALUES (?, ?, ?, ?, ?) RETURNING {PIG_COLUMNS}"
        ))
        .bind(scope.key())
        .bind(user_id)
        .bind(weight)
        .bind(first_name)
        .bind(date)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Apply a daily growth as one conditional update: the stored date
    /// must still differ from `today`, so a racing same-day call cannot
    /// double-apply. Returns `None` when the guard rejects the write.
    pub async fn apply_growth(
        &self,
        scope: &Scope,
        user_id: i64,
        new_weight: i64,
        first_name: &str,
        today: chrono::NaiveDate,
    ) -> Result<Option<PigRecord>, sqlx::Error> {
        let row = sqlx::query_as::<_, PigRecord>(&format!(
            "UPDATE pigs SET weight = ?, first_name = ?, last_action_date = ?, updated_at = datetime('now') WHERE scope = ? AND user_id = ? AND last_action_date <> ? RETURNING {PIG_COLUMNS}"
        ))
        .bind(new_weight)
        .bind(first_name)
        .bind(today)
        .bind(scope.key())
        .bind(user_id)
        .bind(today)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Replace a stale record's weight for a new day (same date guard as
    /// `apply_growth`). Also stores the post-bonus subscription tier.
    pub async fn reseed_record(
        &self,
        scope: &Scope,
        user_id: i64,
        weight: i64,
        tier: &str,
        first_name: &str,
        today: chrono::NaiveDate,
    ) -> Result<Option<PigRecord>, sqlx::Error> {
        let row = sqlx::query_as::<_, PigRecord>(&format!(
            "UPDATE pigs SET weight = ?, tier = ?, first_name = ?, last_action_date = ?, updated_at = datetime('now') WHERE scope = ? AND user_id = ? AND last_action_date <> ? RETURNING {PIG_COLUMNS}"
        ))
        .bind(weight)
        .bind(tier)
        .bind(first_name)
        .bind(today)
        .bind(scope.key())
        .bind(user_id)
        .bind(today)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    // ── Duel commits ──────────────────────────────────────────────────

    /// Commit a decided duel: winner gains `amount` and a win, loser drops
    /// `amount` and takes a loss. Both updates land in one transaction and
    /// both rows must exist with today's date, otherwise nothing is
    /// persisted and `None` comes back.
    pub async fn apply_duel(
        &self,
        scope: &Scope,
        winner_id: i64,
        loser_id: i64,
        amount: i64,
        today: chrono::NaiveDate,
    ) -> Result<Option<(PigRecord, PigRecord)>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let winner = sqlx::query_as::<_, PigRecord>(&format!(
            "UPDATE pigs SET weight = weight + ?, wins = wins + 1, updated_at = datetime('now') WHERE scope = ? AND user_id = ? AND last_action_date = ? RETURNING {PIG_COLUMNS}"
        ))
        .bind(amount)
        .bind(scope.key())
        .bind(winner_id)
        .bind(today)
        .fetch_optional(&mut *tx)
        .await?;

        let loser = sqlx::query_as::<_, PigRecord>(&format!(
            "UPDATE pigs SET weight = weight - ?, losses = losses + 1, updated_at = datetime('now') WHERE scope = ? AND user_id = ? AND last_action_date = ? RETURNING {PIG_COLUMNS}"
        ))
        .bind(amount)
        .bind(scope.key())
        .bind(loser_id)
        .bind(today)
        .fetch_optional(&mut *tx)
        .await?;

        match (winner, loser) {
            (Some(w), Some(l)) => {
                tx.commit().await?;
                Ok(Some((w, l)))
            }
            _ => {
                tx.rollback().await?;
                Ok(None)
            }
        }
    }

    /// Commit a drawn duel: both records gain `amount` and a win.
    pub async fn apply_duel_draw(
        &self,
        scope: &Scope,
        first_id: i64,
        second_id: i64,
        amount: i64,
        today: chrono::NaiveDate,
    ) -> Result<Option<(PigRecord, PigRecord)>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query_as::<_, PigRecord>(&format!(
            "UPDATE pigs SET weight = weight + ?, wins = wins + 1, updated_at = datetime('now') WHERE scope = ? AND user_id IN (?, ?) AND last_action_date = ? RETURNING {PIG_COLUMNS}"
        ))
        .bind(amount)
        .bind(scope.key())
        .bind(first_id)
        .bind(second_id)
        .bind(today)
        .fetch_all(&mut *tx)
        .await?;

        if rows.len() != 2 {
            tx.rollback().await?;
            return Ok(None);
        }
        tx.commit().await?;

        let first = rows.iter().find(|r| r.user_id == first_id).cloned();
        let second = rows.iter().find(|r| r.user_id == second_id).cloned();
        match (first, second) {
            (Some(f), Some(s)) => Ok(Some((f, s))),
            _ => Ok(None),
        }
    }

    // ── Leaderboards ──────────────────────────────────────────────────

    /// One leaderboard page ordered by weight, plus the total count of
    /// qualifying records. Ties stay in insertion order.
    pub async fn top_by_weight(
        &self,
        scope: &Scope,
        min_weight: i64,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<PigRecord>, i64), sqlx::Error> {
        let rows = sqlx::query_as::<_, PigRecord>(&format!(
            "SELECT {PIG_COLUMNS} FROM pigs WHERE scope = ? AND weight > ? ORDER BY weight DESC, id ASC LIMIT ? OFFSET ?"
        ))
        .bind(scope.key())
        .bind(min_weight)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM pigs WHERE scope = ? AND weight > ?")
                .bind(scope.key())
                .bind(min_weight)
                .fetch_one(&self.pool)
                .await?;

        Ok((rows, total))
    }

    /// Heaviest global pigs seeded today.
    pub async fn top_today(
        &self,
        date: chrono::NaiveDate,
        limit: i64,
    ) -> Result<Vec<PigRecord>, sqlx::Error> {
        let rows = sqlx::query_as::<_, PigRecord>(&format!(
            "SELECT {PIG_COLUMNS} FROM pigs WHERE scope = ? AND last_action_date = ? ORDER BY weight DESC, id ASC LIMIT ?"
        ))
        .bind(Scope::Global.key())
        .bind(date)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Global pigs with the most duel wins.
    pub async fn top_by_wins(&self, limit: i64) -> Result<Vec<PigRecord>, sqlx::Error> {
        let rows = sqlx::query_as::<_, PigRecord>(&format!(
            "SELECT {PIG_COLUMNS} FROM pigs WHERE scope = ? ORDER BY wins DESC, id ASC LIMIT ?"
        ))
        .bind(Scope::Global.key())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // ── Names, tiers, settings ────────────────────────────────────────

    pub async fn set_display_name(
        &self,
        scope: &Scope,
        user_id: i64,
        name: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE pigs SET display_name = ?, updated_at = datetime('now') WHERE scope = ? AND user_id = ?",
        )
        .bind(name)
        .bind(scope.key())
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Update the subscription tier on the user's global record.
    pub async fn set_tier(&self, user_id: i64, tier: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE pigs SET tier = ?, updated_at = datetime('now') WHERE scope = ? AND user_id = ?",
        )
        .bind(tier)
        .bind(Scope::Global.key())
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Minimum weight required to show on this chat's leaderboard (0 when
    /// the chat never set one).
    pub async fn min_top_weight(&self, scope: &Scope) -> Result<i64, sqlx::Error> {
        let value: Option<i64> =
            sqlx::query_scalar("SELECT min_top_weight FROM chat_settings WHERE scope = ?")
                .bind(scope.key())
                .fetch_optional(&self.pool)
                .await?;
        Ok(value.unwrap_or(0))
    }

    pub async fn set_min_top_weight(
        &self,
        scope: &Scope,
        value: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO chat_settings (scope, min_top_weight) VALUES (?, ?) ON CONFLICT(scope) DO UPDATE SET min_top_weight = excluded.min_top_weight",
        )
        .bind(scope.key())
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    async fn test_db() -> Database {
        Database::new("sqlite::memory:").await.unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_scope_keys() {
        assert_eq!(Scope::Global.key(), "global");
        assert_eq!(Scope::Chat(-1001234).key(), "-1001234");
        assert_eq!(Scope::parse("global"), Some(Scope::Global));
        assert_eq!(Scope::parse("-42"), Some(Scope::Chat(-42)));
        assert_eq!(Scope::parse("pigsty"), None);
    }

    #[test]
    fn test_tier_round_trip_and_bonus() {
        assert_eq!(SubscriptionTier::from_str_name("gifted"), Some(SubscriptionTier::Gifted));
        assert_eq!(SubscriptionTier::from_str_name("nope"), None);
        assert_eq!(SubscriptionTier::Subscribed.seed_bonus(), 100);
        assert_eq!(SubscriptionTier::Gifted.seed_bonus(), 500);
        assert_eq!(SubscriptionTier::None.seed_bonus(), 0);
        assert_eq!(SubscriptionTier::Gifted.after_seed(), SubscriptionTier::None);
        assert_eq!(
            SubscriptionTier::Subscribed.after_seed(),
            SubscriptionTier::Subscribed
        );
    }

    #[tokio::test]
    async fn test_insert_and_get_record() {
        let db = test_db().await;
        let scope = Scope::Chat(-100);

        let rec = db.insert_record(&scope, 7, 15, "Ann", day(1)).await.unwrap();
        assert_eq!(rec.weight, 15);
        assert_eq!(rec.first_name, "Ann");
        assert_eq!(rec.display_name, "");
        assert_eq!(rec.tier, "none");
        assert_eq!(rec.wins, 0);
        assert_eq!(rec.last_action_date, day(1));

        let fetched = db.get_record(&scope, 7).await.unwrap().unwrap();
        assert_eq!(fetched.id, rec.id);

        assert!(db.get_record(&Scope::Global, 7).await.unwrap().is_none());
        assert!(db.get_record(&scope, 8).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unique_per_scope_and_user() {
        let db = test_db().await;
        let scope = Scope::Chat(-100);

        db.insert_record(&scope, 7, 15, "Ann", day(1)).await.unwrap();
        // Same user in another scope is a separate record.
        db.insert_record(&Scope::Global, 7, 300, "Ann", day(1)).await.unwrap();
        // Same (scope, user) again violates the unique index.
        let dup = db.insert_record(&scope, 7, 10, "Ann", day(1)).await;
        assert!(dup.is_err());
    }

    #[tokio::test]
    async fn test_apply_growth_date_guard() {
        let db = test_db().await;
        let scope = Scope::Chat(-5);
        db.insert_record(&scope, 1, 10, "Bo", day(1)).await.unwrap();

        let updated = db.apply_growth(&scope, 1, 25, "Bo", day(2)).await.unwrap();
        assert_eq!(updated.unwrap().weight, 25);

        // Second write on the same day is rejected and changes nothing.
        let raced = db.apply_growth(&scope, 1, 99, "Bo", day(2)).await.unwrap();
        assert!(raced.is_none());
        let rec = db.get_record(&scope, 1).await.unwrap().unwrap();
        assert_eq!(rec.weight, 25);
        assert_eq!(rec.last_action_date, day(2));
    }

    #[tokio::test]
    async fn test_reseed_record_guard_and_tier() {
        let db = test_db().await;
        let scope = Scope::Global;
        db.insert_record(&scope, 3, 120, "Cy", day(1)).await.unwrap();

        let reseeded = db
            .reseed_record(&scope, 3, 777, "none", "Cy", day(2))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reseeded.weight, 777);
        assert_eq!(reseeded.tier, "none");
        assert_eq!(reseeded.last_action_date, day(2));

        let again = db.reseed_record(&scope, 3, 1, "none", "Cy", day(2)).await.unwrap();
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn test_apply_duel_moves_both_rows() {
        let db = test_db().await;
        let scope = Scope::Global;
        db.insert_record(&scope, 10, 400, "A", day(3)).await.unwrap();
        db.insert_record(&scope, 20, 100, "B", day(3)).await.unwrap();

        let (w, l) = db
            .apply_duel(&scope, 10, 20, 12, day(3))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(w.user_id, 10);
        assert_eq!(w.weight, 412);
        assert_eq!(w.wins, 1);
        assert_eq!(w.losses, 0);
        assert_eq!(l.user_id, 20);
        assert_eq!(l.weight, 88);
        assert_eq!(l.wins, 0);
        assert_eq!(l.losses, 1);
    }

    #[tokio::test]
    async fn test_apply_duel_rolls_back_when_one_side_missing() {
        let db = test_db().await;
        let scope = Scope::Global;
        db.insert_record(&scope, 10, 400, "A", day(3)).await.unwrap();

        let res = db.apply_duel(&scope, 10, 999, 12, day(3)).await.unwrap();
        assert!(res.is_none());

        // The winner side must not have been half-applied.
        let rec = db.get_record(&scope, 10).await.unwrap().unwrap();
        assert_eq!(rec.weight, 400);
        assert_eq!(rec.wins, 0);
    }

    #[tokio::test]
    async fn test_apply_duel_requires_today_date() {
        let db = test_db().await;
        let scope = Scope::Global;
        db.insert_record(&scope, 10, 400, "A", day(3)).await.unwrap();
        db.insert_record(&scope, 20, 100, "B", day(4)).await.unwrap();

        // User 10's record is stale relative to day 4.
        let res = db.apply_duel(&scope, 10, 20, 12, day(4)).await.unwrap();
        assert!(res.is_none());
    }

    #[tokio::test]
    async fn test_apply_duel_draw_updates_both() {
        let db = test_db().await;
        let scope = Scope::Global;
        db.insert_record(&scope, 10, 500, "A", day(3)).await.unwrap();
        db.insert_record(&scope, 20, 500, "B", day(3)).await.unwrap();

        let (f, s) = db
            .apply_duel_draw(&scope, 10, 20, 62, day(3))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(f.user_id, 10);
        assert_eq!(s.user_id, 20);
        assert_eq!(f.weight, 562);
        assert_eq!(s.weight, 562);
        assert_eq!(f.wins, 1);
        assert_eq!(s.wins, 1);
        assert_eq!(f.losses, 0);
        assert_eq!(s.losses, 0);
    }

    #[tokio::test]
    async fn test_apply_duel_draw_rolls_back_on_missing_row() {
        let db = test_db().await;
        let scope = Scope::Global;
        db.insert_record(&scope, 10, 500, "A", day(3)).await.unwrap();

        let res = db.apply_duel_draw(&scope, 10, 999, 62, day(3)).await.unwrap();
        assert!(res.is_none());
        let rec = db.get_record(&scope, 10).await.unwrap().unwrap();
        assert_eq!(rec.weight, 500);
        assert_eq!(rec.wins, 0);
    }

    #[tokio::test]
    async fn test_top_by_weight_ordering_and_count() {
        let db = test_db().await;
        let scope = Scope::Chat(-9);
        db.insert_record(&scope, 1, 50, "A", day(1)).await.unwrap();
        db.insert_record(&scope, 2, 200, "B", day(1)).await.unwrap();
        db.insert_record(&scope, 3, 120, "C", day(1)).await.unwrap();
        db.insert_record(&scope, 4, 200, "D", day(1)).await.unwrap();
        // Another scope must not leak in.
        db.insert_record(&Scope::Chat(-8), 5, 999, "E", day(1)).await.unwrap();

        let (rows, total) = db.top_by_weight(&scope, 0, 50, 0).await.unwrap();
        assert_eq!(total, 4);
        let ids: Vec<i64> = rows.iter().map(|r| r.user_id).collect();
        // Equal weights keep insertion order: B before D.
        assert_eq!(ids, vec![2, 4, 3, 1]);
    }

    #[tokio::test]
    async fn test_top_by_weight_pagination_and_min_filter() {
        let db = test_db().await;
        let scope = Scope::Chat(-9);
        for i in 1..=7 {
            db.insert_record(&scope, i, i * 10, "P", day(1)).await.unwrap();
        }

        let (page, total) = db.top_by_weight(&scope, 0, 3, 0).await.unwrap();
        assert_eq!(total, 7);
        assert_eq!(page.len(), 3);
        assert_eq!(page[0].weight, 70);

        let (page2, _) = db.top_by_weight(&scope, 0, 3, 3).await.unwrap();
        assert_eq!(page2[0].weight, 40);

        // Strict minimum filter: weight must exceed the setting.
        let (filtered, ftotal) = db.top_by_weight(&scope, 40, 50, 0).await.unwrap();
        assert_eq!(ftotal, 3);
        assert!(filtered.iter().all(|r| r.weight > 40));
    }

    #[tokio::test]
    async fn test_top_today_filters_by_date_and_scope() {
        let db = test_db().await;
        db.insert_record(&Scope::Global, 1, 300, "A", day(5)).await.unwrap();
        db.insert_record(&Scope::Global, 2, 700, "B", day(5)).await.unwrap();
        db.insert_record(&Scope::Global, 3, 900, "C", day(4)).await.unwrap();
        db.insert_record(&Scope::Chat(-1), 4, 9999, "D", day(5)).await.unwrap();

        let rows = db.top_today(day(5), 10).await.unwrap();
        let ids: Vec<i64> = rows.iter().map(|r| r.user_id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[tokio::test]
    async fn test_top_by_wins() {
        let db = test_db().await;
        db.insert_record(&Scope::Global, 1, 100, "A", day(5)).await.unwrap();
        db.insert_record(&Scope::Global, 2, 100, "B", day(5)).await.unwrap();
        db.apply_duel(&Scope::Global, 2, 1, 5, day(5)).await.unwrap();
        db.apply_duel(&Scope::Global, 2, 1, 5, day(5)).await.unwrap();
        db.apply_duel(&Scope::Global, 1, 2, 5, day(5)).await.unwrap();

        let rows = db.top_by_wins(10).await.unwrap();
        assert_eq!(rows[0].user_id, 2);
        assert_eq!(rows[0].wins, 2);
        assert_eq!(rows[1].wins, 1);
    }

    #[tokio::test]
    async fn test_set_display_name() {
        let db = test_db().await;
        let scope = Scope::Chat(-3);
        db.insert_record(&scope, 1, 10, "Eve", day(1)).await.unwrap();

        assert!(db.set_display_name(&scope, 1, "Napoleon").await.unwrap());
        let rec = db.get_record(&scope, 1).await.unwrap().unwrap();
        assert_eq!(rec.display_name, "Napoleon");

        assert!(!db.set_display_name(&scope, 999, "Ghost").await.unwrap());
    }

    #[tokio::test]
    async fn test_set_tier_targets_global_record() {
        let db = test_db().await;
        db.insert_record(&Scope::Global, 1, 10, "A", day(1)).await.unwrap();
        db.insert_record(&Scope::Chat(-1), 1, 10, "A", day(1)).await.unwrap();

        assert!(db.set_tier(1, "subscribed").await.unwrap());
        let g = db.get_record(&Scope::Global, 1).await.unwrap().unwrap();
        assert_eq!(g.subscription(), SubscriptionTier::Subscribed);
        let c = db.get_record(&Scope::Chat(-1), 1).await.unwrap().unwrap();
        assert_eq!(c.subscription(), SubscriptionTier::None);

        assert!(!db.set_tier(999, "gifted").await.unwrap());
    }

    #[tokio::test]
    async fn test_chat_settings_round_trip() {
        let db = test_db().await;
        let scope = Scope::Chat(-77);

        assert_eq!(db.min_top_weight(&scope).await.unwrap(), 0);
        db.set_min_top_weight(&scope, 150).await.unwrap();
        assert_eq!(db.min_top_weight(&scope).await.unwrap(), 150);
        db.set_min_top_weight(&scope, 20).await.unwrap();
        assert_eq!(db.min_top_weight(&scope).await.unwrap(), 20);
    }
}
