use sqlx::SqlitePool;

use crate::forms::{LearningData, DATE_FORMAT};
use crate::models::entry::now_timestamp;
use crate::models::{LearningEntry, User};

/// Newest entries shown on the journal index.
pub const INDEX_LIMIT: i64 = 100;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("user with that email already exists")]
    DuplicateEmail,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Handle to the journal tables.
///
/// Every call checks a connection out of the pool and returns it when the
/// query finishes, whether or not it succeeded.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a user whose password has already been hashed.
    pub async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, StoreError> {
        let joined_at = chrono::Utc::now().to_rfc3339();

        let result: Result<User, sqlx::Error> = sqlx::query_as(
            r#"
            INSERT INTO users (email, password, joined_at, is_admin)
            VALUES (?, ?, ?, 0)
            RETURNING *
            "#
        )
        .bind(email)
        .bind(password_hash)
        .bind(&joined_at)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(StoreError::DuplicateEmail),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn user_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0 > 0)
    }

    pub async fn entries_for_user(&self, user_id: i64, limit: i64) -> Result<Vec<LearningEntry>, StoreError> {
        let entries: Vec<LearningEntry> = sqlx::query_as(
            r#"
            SELECT * FROM learning_entries
            WHERE user_id = ?
            ORDER BY date DESC, timestamp_of_entry DESC
            LIMIT ?
            "#
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    /// Entries owned by `user_id` whose normalized tag string contains `tag`.
    pub async fn entries_tagged(&self, user_id: i64, tag: &str) -> Result<Vec<LearningEntry>, StoreError> {
        let entries: Vec<LearningEntry> = sqlx::query_as(
            r#"
            SELECT * FROM learning_entries
            WHERE user_id = ? AND instr(tags, ?) > 0
            ORDER BY date DESC, timestamp_of_entry DESC
            "#
        )
        .bind(user_id)
        .bind(tag)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    pub async fn entry_by_timestamp(
        &self,
        user_id: i64,
        timestamp: &str,
    ) -> Result<Option<LearningEntry>, StoreError> {
        let entry: Option<LearningEntry> = sqlx::query_as(
            "SELECT * FROM learning_entries WHERE timestamp_of_entry = ? AND user_id = ?"
        )
        .bind(timestamp)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry)
    }

    pub async fn insert_entry(&self, user_id: i64, data: &LearningData) -> Result<LearningEntry, StoreError> {
        let entry: LearningEntry = sqlx::query_as(
            r#"
            INSERT INTO learning_entries
                (user_id, timestamp_of_entry, title, learnt, date, time_spent, resources_to_remember, tags)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#
        )
        .bind(user_id)
        .bind(now_timestamp())
        .bind(&data.title)
        .bind(&data.learnt)
        .bind(data.date.format(DATE_FORMAT).to_string())
        .bind(data.time_spent)
        .bind(&data.resources_to_remember)
        .bind(&data.tags)
        .fetch_one(&self.pool)
        .await?;
        Ok(entry)
    }

    /// Returns the number of rows updated.
    pub async fn update_entry(
        &self,
        user_id: i64,
        timestamp: &str,
        data: &LearningData,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE learning_entries
            SET title = ?, learnt = ?, date = ?, time_spent = ?, resources_to_remember = ?, tags = ?
            WHERE timestamp_of_entry = ? AND user_id = ?
            "#
        )
        .bind(&data.title)
        .bind(&data.learnt)
        .bind(data.date.format(DATE_FORMAT).to_string())
        .bind(data.time_spent)
        .bind(&data.resources_to_remember)
        .bind(&data.tags)
        .bind(timestamp)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_entry(&self, user_id: i64, timestamp: &str) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM learning_entries WHERE timestamp_of_entry = ? AND user_id = ?")
            .bind(timestamp)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
