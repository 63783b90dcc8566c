//! SQLite-Implementierung des InviteRepository

use sqlx::Row;
use thw_core::UserId;

use crate::error::DbError;
use crate::models::{EinladungRecord, NeueEinladung, UNBEGRENZT};
use crate::repository::{DbResult, InviteRepository};
use crate::sqlite::pool::SqliteDb;
use crate::sqlite::zeit::{jetzt, parse_datetime};

impl InviteRepository for SqliteDb {
    async fn create(&self, data: NeueEinladung<'_>) -> DbResult<EinladungRecord> {
        if data.uses_left < UNBEGRENZT {
            return Err(DbError::UngueltigeDaten(format!(
                "uses_left muss >= {UNBEGRENZT} sein, ist {}",
                data.uses_left
            )));
        }

        let (now, now_str) = jetzt();

        sqlx::query(
            "INSERT INTO invite_codes (code, uses_left, created_by, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(data.code)
        .bind(data.uses_left)
        .bind(data.created_by.map(|u| u.inner()))
        .bind(&now_str)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::Eindeutigkeit(_) => {
                DbError::Eindeutigkeit(format!("Einladungscode '{}' bereits vergeben", data.code))
            }
            andere => andere,
        })?;

        Ok(EinladungRecord {
            code: data.code.to_string(),
            uses_left: data.uses_left,
            created_by: data.created_by,
            created_at: now,
        })
    }

    async fn get_by_code(&self, code: &str) -> DbResult<Option<EinladungRecord>> {
        let row = sqlx::query(
            "SELECT code, uses_left, created_by, created_at
             FROM invite_codes WHERE code = ?",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_invite(&r)).transpose()
    }

    async fn list(&self) -> DbResult<Vec<EinladungRecord>> {
        let rows = sqlx::query(
            "SELECT code, uses_left, created_by, created_at
             FROM invite_codes ORDER BY created_at DESC, code",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_invite).collect()
    }
}

fn row_to_invite(row: &sqlx::sqlite::SqliteRow) -> DbResult<EinladungRecord> {
    let created_by: Option<i64> = row.try_get("created_by")?;

    Ok(EinladungRecord {
        code: row.try_get("code")?,
        uses_left: row.try_get("uses_left")?,
        created_by: created_by.map(UserId),
        created_at: parse_datetime(row, "created_at")?,
    })
}
