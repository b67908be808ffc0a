use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::debug;

use shared::domain::{ReviewId, Semester, Tier, UserId};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSubject {
    pub shortcut: String,
    pub name: String,
    /// Subject category: `P`, `PVT`, `PVA` or `V`.
    pub kind: String,
    pub semester: Semester,
    pub degree: Option<String>,
    pub year: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StoredReview {
    pub review_id: ReviewId,
    pub member_id: UserId,
    pub author_name: String,
    pub subject: String,
    pub tier: Tier,
    pub anonymous: bool,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub likes: i64,
    pub dislikes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierboardFilter {
    pub kind: String,
    pub semester: Semester,
    pub degree: Option<String>,
    pub year: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TierboardRow {
    pub shortcut: String,
    pub avg_tier: f64,
}

const REVIEW_COLUMNS: &str = "
    SELECT r.id, r.member_id, r.author_name, r.subject, r.tier, r.anonymous, r.text_review,
           r.created_at,
           COALESCE(SUM(CASE WHEN v.vote = 1 THEN 1 ELSE 0 END), 0) AS likes,
           COALESCE(SUM(CASE WHEN v.vote = 0 THEN 1 ELSE 0 END), 0) AS dislikes
    FROM reviews r
    LEFT JOIN review_votes v ON v.review_id = r.id";

const TIERBOARD_FILTER: &str = "
    FROM subjects s
    INNER JOIN reviews r ON r.subject = s.shortcut
    WHERE s.kind = ?1 AND s.semester = ?2
      AND (?3 IS NULL OR s.degree = ?3)
      AND (?4 IS NULL OR s.year = ?4)
    GROUP BY s.shortcut";

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        // every connection to an in-memory url opens its own database
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        debug!(%database_url, "review storage ready");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn upsert_subject(&self, subject: &StoredSubject) -> Result<()> {
        sqlx::query(
            "INSERT INTO subjects (shortcut, name, kind, semester, degree, year)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(shortcut) DO UPDATE SET
                name = excluded.name,
                kind = excluded.kind,
                semester = excluded.semester,
                degree = excluded.degree,
                year = excluded.year",
        )
        .bind(subject.shortcut.to_lowercase())
        .bind(&subject.name)
        .bind(&subject.kind)
        .bind(subject.semester.code())
        .bind(&subject.degree)
        .bind(&subject.year)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to upsert subject '{}'", subject.shortcut))?;
        Ok(())
    }

    pub async fn subject(&self, shortcut: &str) -> Result<Option<StoredSubject>> {
        let row = sqlx::query(
            "SELECT shortcut, name, kind, semester, degree, year FROM subjects WHERE shortcut = ?",
        )
        .bind(shortcut.to_lowercase())
        .fetch_optional(&self.pool)
        .await?;
        row.map(|row| -> Result<StoredSubject> {
            let semester: String = row.try_get("semester")?;
            Ok(StoredSubject {
                shortcut: row.try_get("shortcut")?,
                name: row.try_get("name")?,
                kind: row.try_get("kind")?,
                semester: Semester::from_code(&semester)
                    .ok_or_else(|| anyhow!("invalid semester code '{semester}'"))?,
                degree: row.try_get("degree")?,
                year: row.try_get("year")?,
            })
        })
        .transpose()
    }

    /// Inserts or replaces the member's review of `subject`. Returns `None` when the subject is
    /// unknown.
    pub async fn add_review(
        &self,
        member_id: UserId,
        author_name: &str,
        subject: &str,
        tier: Tier,
        anonymous: bool,
        text: &str,
    ) -> Result<Option<ReviewId>> {
        if self.subject(subject).await?.is_none() {
            return Ok(None);
        }
        let rec = sqlx::query(
            "INSERT INTO reviews (member_id, author_name, subject, tier, anonymous, text_review, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(member_id, subject) DO UPDATE SET
                author_name = excluded.author_name,
                tier = excluded.tier,
                anonymous = excluded.anonymous,
                text_review = excluded.text_review,
                created_at = excluded.created_at
             RETURNING id",
        )
        .bind(member_id.0)
        .bind(author_name)
        .bind(subject.to_lowercase())
        .bind(tier.ordinal())
        .bind(anonymous)
        .bind(text)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .context("failed to store review")?;
        Ok(Some(ReviewId(rec.get::<i64, _>(0))))
    }

    pub async fn remove_review(&self, member_id: UserId, subject: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM reviews WHERE member_id = ? AND subject = ?")
            .bind(member_id.0)
            .bind(subject.to_lowercase())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn remove_review_by_id(&self, review_id: ReviewId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = ?")
            .bind(review_id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn review_by_id(&self, review_id: ReviewId) -> Result<Option<StoredReview>> {
        let row = sqlx::query(&format!("{REVIEW_COLUMNS} WHERE r.id = ? GROUP BY r.id"))
            .bind(review_id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(review_from_row).transpose()
    }

    /// Reviews of a subject, best rated first.
    pub async fn reviews_for_subject(&self, subject: &str) -> Result<Vec<StoredReview>> {
        let rows = sqlx::query(&format!(
            "{REVIEW_COLUMNS} WHERE r.subject = ? GROUP BY r.id
             ORDER BY (likes - dislikes) DESC, r.created_at DESC"
        ))
        .bind(subject.to_lowercase())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(review_from_row).collect()
    }

    pub async fn reviews_by_member(&self, member_id: UserId) -> Result<Vec<StoredReview>> {
        let rows = sqlx::query(&format!(
            "{REVIEW_COLUMNS} WHERE r.member_id = ? GROUP BY r.id ORDER BY r.subject"
        ))
        .bind(member_id.0)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(review_from_row).collect()
    }

    pub async fn vote_of(&self, review_id: ReviewId, member_id: UserId) -> Result<Option<bool>> {
        let row = sqlx::query("SELECT vote FROM review_votes WHERE review_id = ? AND member_id = ?")
            .bind(review_id.0)
            .bind(member_id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get::<bool, _>(0)))
    }

    pub async fn set_vote(&self, review_id: ReviewId, member_id: UserId, vote: bool) -> Result<()> {
        sqlx::query(
            "INSERT INTO review_votes (review_id, member_id, vote) VALUES (?, ?, ?)
             ON CONFLICT(review_id, member_id) DO UPDATE SET vote = excluded.vote",
        )
        .bind(review_id.0)
        .bind(member_id.0)
        .bind(vote)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to store vote on review {review_id}"))?;
        Ok(())
    }

    pub async fn remove_vote(&self, review_id: ReviewId, member_id: UserId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM review_votes WHERE review_id = ? AND member_id = ?")
            .bind(review_id.0)
            .bind(member_id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Number of reviewed subjects matching the filter.
    pub async fn tierboard_count(&self, filter: &TierboardFilter) -> Result<usize> {
        let count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM (SELECT s.shortcut {TIERBOARD_FILTER})"
        ))
        .bind(&filter.kind)
        .bind(filter.semester.code())
        .bind(&filter.degree)
        .bind(&filter.year)
        .fetch_one(&self.pool)
        .await?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Reviewed subjects ordered by average tier, best first.
    pub async fn tierboard(
        &self,
        filter: &TierboardFilter,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<TierboardRow>> {
        let rows = sqlx::query(&format!(
            "SELECT s.shortcut, AVG(r.tier) AS avg_tier {TIERBOARD_FILTER}
             ORDER BY avg_tier ASC, s.shortcut ASC
             LIMIT ?5 OFFSET ?6"
        ))
        .bind(&filter.kind)
        .bind(filter.semester.code())
        .bind(&filter.degree)
        .bind(&filter.year)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|row| -> Result<TierboardRow> {
                Ok(TierboardRow {
                    shortcut: row.try_get("shortcut")?,
                    avg_tier: row.try_get("avg_tier")?,
                })
            })
            .collect()
    }
}

fn review_from_row(row: &SqliteRow) -> Result<StoredReview> {
    let tier: i64 = row.try_get("tier")?;
    Ok(StoredReview {
        review_id: ReviewId(row.try_get("id")?),
        member_id: UserId(row.try_get("member_id")?),
        author_name: row.try_get("author_name")?,
        subject: row.try_get("subject")?,
        tier: Tier::from_ordinal(tier).ok_or_else(|| anyhow!("invalid stored tier {tier}"))?,
        anonymous: row.try_get("anonymous")?,
        text: row.try_get("text_review")?,
        created_at: row.try_get("created_at")?,
        likes: row.try_get("likes")?,
        dislikes: row.try_get("dislikes")?,
    })
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.contains(":memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
