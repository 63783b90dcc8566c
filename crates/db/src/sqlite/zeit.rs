//! Zeitstempel-Hilfen fuer TEXT-Spalten
//!
//! Alle Zeitstempel werden in genau einem Format geschrieben (RFC3339, UTC,
//! Mikrosekunden, `Z`-Suffix). Dadurch sind sie lexikographisch in SQL
//! vergleichbar, z.B. `expires_at <= ?`.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::Row;

use crate::error::DbError;
use crate::repository::DbResult;

pub(crate) fn format_zeit(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn jetzt() -> (DateTime<Utc>, String) {
    let now = Utc::now();
    let s = format_zeit(&now);
    (now, s)
}

pub(crate) fn parse_datetime(row: &sqlx::sqlite::SqliteRow, col: &str) -> DbResult<DateTime<Utc>> {
    let s: String = row.try_get(col)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::intern(format!("Ungueltige DateTime in '{col}': {e}")))
}

pub(crate) fn parse_opt_datetime(
    row: &sqlx::sqlite::SqliteRow,
    col: &str,
) -> DbResult<Option<DateTime<Utc>>> {
    let s: Option<String> = row.try_get(col)?;
    s.as_deref()
        .map(|v| {
            DateTime::parse_from_rfc3339(v)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| DbError::intern(format!("Ungueltige DateTime in '{col}': {e}")))
        })
        .transpose()
}
