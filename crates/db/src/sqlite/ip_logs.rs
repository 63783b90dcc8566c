//! SQLite-Implementierung des IpLogRepository

use sqlx::Row;
use thw_core::UserId;

use crate::models::IpLogRecord;
use crate::repository::{DbResult, IpLogRepository};
use crate::sqlite::pool::SqliteDb;
use crate::sqlite::zeit::{jetzt, parse_datetime};

impl IpLogRepository for SqliteDb {
    async fn record(&self, user_id: UserId, ip: &str) -> DbResult<()> {
        let (_, now_str) = jetzt();
        sqlx::query(
            "INSERT INTO ip_logs (user_id, ip_address, count, first_seen, last_seen)
             VALUES (?, ?, 1, ?, ?)
             ON CONFLICT (user_id, ip_address)
             DO UPDATE SET count = count + 1, last_seen = excluded.last_seen",
        )
        .bind(user_id.inner())
        .bind(ip)
        .bind(&now_str)
        .bind(&now_str)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_for_user(&self, user_id: UserId) -> DbResult<Vec<IpLogRecord>> {
        let rows = sqlx::query(
            "SELECT ip_address, count, first_seen, last_seen
             FROM ip_logs WHERE user_id = ?
             ORDER BY last_seen DESC",
        )
        .bind(user_id.inner())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_iplog).collect()
    }
}

fn row_to_iplog(row: &sqlx::sqlite::SqliteRow) -> DbResult<IpLogRecord> {
    Ok(IpLogRecord {
        ip: row.try_get("ip_address")?,
        total: row.try_get("count")?,
        earliest: parse_datetime(row, "first_seen")?,
        latest: parse_datetime(row, "last_seen")?,
    })
}
