//! SQLite-Implementierung des ShoutRepository

use sqlx::Row;
use thw_core::{Rolle, UserId};

use crate::error::DbError;
use crate::models::{NeuerShout, ShoutRecord};
use crate::repository::{DbResult, ShoutRepository};
use crate::sqlite::pool::SqliteDb;
use crate::sqlite::zeit::{jetzt, parse_datetime};

const SHOUT_SELECT: &str = "SELECT s.id, s.user_id, s.message, s.time,
        u.username, u.role, u.avatar_url, u.avatar_color
     FROM shouts s
     JOIN users u ON u.id = s.user_id";

impl ShoutRepository for SqliteDb {
    async fn create(&self, data: NeuerShout<'_>) -> DbResult<ShoutRecord> {
        let (_, now_str) = jetzt();

        let id = sqlx::query("INSERT INTO shouts (user_id, message, time) VALUES (?, ?, ?)")
            .bind(data.user_id.inner())
            .bind(data.message)
            .bind(&now_str)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        let sql = format!("{SHOUT_SELECT} WHERE s.id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::intern("Shout nach Insert nicht gefunden"))?;

        row_to_shout(&row)
    }

    async fn recent(&self, limit: i64) -> DbResult<Vec<ShoutRecord>> {
        let sql = format!("{SHOUT_SELECT} ORDER BY s.time DESC, s.id DESC LIMIT ?");
        let rows = sqlx::query(&sql).bind(limit).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_shout).collect()
    }
}

fn row_to_shout(row: &sqlx::sqlite::SqliteRow) -> DbResult<ShoutRecord> {
    let rolle_str: String = row.try_get("role")?;
    let rolle: Rolle = rolle_str
        .parse()
        .map_err(DbError::UngueltigeDaten)?;
    let user_id: i64 = row.try_get("user_id")?;

    Ok(ShoutRecord {
        id: row.try_get("id")?,
        user_id: UserId(user_id),
        username: row.try_get("username")?,
        rolle,
        avatar_url: row.try_get("avatar_url")?,
        avatar_color: row.try_get("avatar_color")?,
        message: row.try_get("message")?,
        time: parse_datetime(row, "time")?,
    })
}
