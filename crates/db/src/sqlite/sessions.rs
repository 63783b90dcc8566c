//! SQLite-Implementierung des SessionRepository

use sqlx::Row;
use thw_core::{Persistenz, UserId};

use crate::error::DbError;
use crate::models::{NeueSession, SessionRecord};
use crate::repository::{DbResult, SessionRepository};
use crate::sqlite::pool::SqliteDb;
use crate::sqlite::zeit::{format_zeit, jetzt, parse_datetime};

impl SessionRepository for SqliteDb {
    async fn create(&self, data: NeueSession<'_>) -> DbResult<SessionRecord> {
        sqlx::query(
            "INSERT INTO sessions (token_hash, user_id, persistence, issued_at, expires_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(data.token_hash)
        .bind(data.user_id.inner())
        .bind(data.persistenz.als_str())
        .bind(format_zeit(&data.erstellt_am))
        .bind(format_zeit(&data.laeuft_ab_am))
        .execute(&self.pool)
        .await?;

        Ok(SessionRecord {
            token_hash: data.token_hash.to_string(),
            user_id: data.user_id,
            persistenz: data.persistenz,
            erstellt_am: data.erstellt_am,
            laeuft_ab_am: data.laeuft_ab_am,
        })
    }

    async fn get(&self, token_hash: &str) -> DbResult<Option<SessionRecord>> {
        let row = sqlx::query(
            "SELECT token_hash, user_id, persistence, issued_at, expires_at
             FROM sessions WHERE token_hash = ?",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_session(&r)).transpose()
    }

    async fn delete(&self, token_hash: &str) -> DbResult<bool> {
        let affected = sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(token_hash)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }

    async fn delete_for_user(&self, user_id: UserId) -> DbResult<u64> {
        let affected = sqlx::query("DELETE FROM sessions WHERE user_id = ?")
            .bind(user_id.inner())
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected)
    }

    async fn cleanup_expired(&self) -> DbResult<u64> {
        let (_, now_str) = jetzt();
        let affected = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(&now_str)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected)
    }
}

fn row_to_session(row: &sqlx::sqlite::SqliteRow) -> DbResult<SessionRecord> {
    let persistenz_str: String = row.try_get("persistence")?;
    let persistenz: Persistenz = persistenz_str
        .parse()
        .map_err(DbError::UngueltigeDaten)?;
    let user_id: i64 = row.try_get("user_id")?;

    Ok(SessionRecord {
        token_hash: row.try_get("token_hash")?,
        user_id: UserId(user_id),
        persistenz,
        erstellt_am: parse_datetime(row, "issued_at")?,
        laeuft_ab_am: parse_datetime(row, "expires_at")?,
    })
}
