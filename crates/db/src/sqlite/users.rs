//! SQLite-Implementierung des UserRepository (Credential Store)

use sqlx::Row;
use thw_core::{Rolle, UserId};

use crate::error::DbError;
use crate::models::{
    BenutzerProfil, BenutzerRecord, NeuerBenutzer, ProfilUpdate, StandUpdate, UNBEGRENZT,
};
use crate::repository::{DbResult, UserRepository};
use crate::sqlite::pool::SqliteDb;
use crate::sqlite::zeit::{jetzt, parse_datetime, parse_opt_datetime};

const BENUTZER_SPALTEN: &str = "id, username, email, password_hash, role, is_banned, is_muted,
     ban_reason, mute_reason, registration_date, last_login, avatar_url, avatar_color,
     location, website, about, dob_day, dob_month, dob_year, show_dob_date, show_dob_year,
     receive_emails";

impl UserRepository for SqliteDb {
    async fn create(
        &self,
        data: NeuerBenutzer<'_>,
        einladungscode: &str,
    ) -> DbResult<BenutzerRecord> {
        // Alles in einer Transaktion; jedes fruehe `return` verwirft sie (Rollback beim Drop).
        // IMMEDIATE nimmt die Schreibsperre vor den Lesezugriffen, parallele
        // Registrierungen warten so im busy_timeout statt beim Upgrade zu scheitern.
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        let uses_left: Option<i64> =
            sqlx::query_scalar("SELECT uses_left FROM invite_codes WHERE code = ?")
                .bind(einladungscode)
                .fetch_optional(&mut *tx)
                .await?;

        let uses_left = uses_left.ok_or(DbError::EinladungUngueltig)?;
        if uses_left != UNBEGRENZT && uses_left <= 0 {
            return Err(DbError::EinladungErschoepft);
        }

        let duplikat: Option<i64> =
            sqlx::query_scalar("SELECT id FROM users WHERE username = ? OR email = ? LIMIT 1")
                .bind(data.username)
                .bind(data.email)
                .fetch_optional(&mut *tx)
                .await?;
        if duplikat.is_some() {
            return Err(DbError::Eindeutigkeit(
                "Benutzername oder E-Mail bereits vergeben".into(),
            ));
        }

        let (_, now_str) = jetzt();
        let id = sqlx::query(
            "INSERT INTO users (username, email, password_hash, role, registration_date, avatar_url)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(data.username)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(Rolle::User.als_str())
        .bind(&now_str)
        .bind(data.avatar_url)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        if uses_left != UNBEGRENZT {
            let affected = sqlx::query(
                "UPDATE invite_codes SET uses_left = uses_left - 1
                 WHERE code = ? AND uses_left > 0",
            )
            .bind(einladungscode)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            // Parallel verbraucht
            if affected == 0 {
                return Err(DbError::EinladungErschoepft);
            }
        }

        let sql = format!("SELECT {BENUTZER_SPALTEN} FROM users WHERE id = ?");
        let row = sqlx::query(&sql).bind(id).fetch_one(&mut *tx).await?;
        let record = row_to_benutzer(&row)?;

        tx.commit().await?;

        tracing::debug!(user_id = id, "Benutzer angelegt");
        Ok(record)
    }

    async fn get_by_id(&self, id: UserId) -> DbResult<Option<BenutzerRecord>> {
        let sql = format!("SELECT {BENUTZER_SPALTEN} FROM users WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id.inner())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_benutzer(&r)).transpose()
    }

    async fn find_by_identifier(&self, identifier: &str) -> DbResult<Option<BenutzerRecord>> {
        // Spalten sind COLLATE NOCASE, `=` vergleicht daher ohne Gross-/Kleinschreibung
        let sql = format!(
            "SELECT {BENUTZER_SPALTEN} FROM users
             WHERE username = ? OR email = ?
             ORDER BY id LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(identifier)
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_benutzer(&r)).transpose()
    }

    async fn list(&self) -> DbResult<Vec<BenutzerRecord>> {
        let sql = format!(
            "SELECT {BENUTZER_SPALTEN} FROM users ORDER BY id DESC"
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_benutzer).collect()
    }

    async fn list_staff(&self) -> DbResult<Vec<BenutzerRecord>> {
        let sql = format!(
            "SELECT {BENUTZER_SPALTEN} FROM users
             WHERE lower(role) IN ('admin', 'moderator')
             ORDER BY id"
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_benutzer).collect()
    }

    async fn update_profile(&self, id: UserId, data: ProfilUpdate) -> DbResult<BenutzerRecord> {
        // Dynamisches UPDATE – nur gesetzte Felder aendern
        let mut sets: Vec<&str> = Vec::new();
        if data.avatar_url.is_some() {
            sets.push("avatar_url = ?");
        }
        if data.avatar_color.is_some() {
            sets.push("avatar_color = ?");
        }
        if data.location.is_some() {
            sets.push("location = ?");
        }
        if data.website.is_some() {
            sets.push("website = ?");
        }
        if data.about.is_some() {
            sets.push("about = ?");
        }
        if data.dob_day.is_some() {
            sets.push("dob_day = ?");
        }
        if data.dob_month.is_some() {
            sets.push("dob_month = ?");
        }
        if data.dob_year.is_some() {
            sets.push("dob_year = ?");
        }
        if data.show_dob_date.is_some() {
            sets.push("show_dob_date = ?");
        }
        if data.show_dob_year.is_some() {
            sets.push("show_dob_year = ?");
        }
        if data.receive_emails.is_some() {
            sets.push("receive_emails = ?");
        }

        if sets.is_empty() {
            return self
                .get_by_id(id)
                .await?
                .ok_or_else(|| DbError::nicht_gefunden(format!("User {id}")));
        }

        let sql = format!("UPDATE users SET {} WHERE id = ?", sets.join(", "));
        let mut q = sqlx::query(&sql);

        if let Some(ref v) = data.avatar_url {
            q = q.bind(v);
        }
        if let Some(ref v) = data.avatar_color {
            q = q.bind(v);
        }
        if let Some(ref v) = data.location {
            q = q.bind(v);
        }
        if let Some(ref v) = data.website {
            q = q.bind(v);
        }
        if let Some(ref v) = data.about {
            q = q.bind(v);
        }
        if let Some(v) = data.dob_day {
            q = q.bind(v);
        }
        if let Some(v) = data.dob_month {
            q = q.bind(v);
        }
        if let Some(v) = data.dob_year {
            q = q.bind(v);
        }
        if let Some(v) = data.show_dob_date {
            q = q.bind(v as i64);
        }
        if let Some(v) = data.show_dob_year {
            q = q.bind(v as i64);
        }
        if let Some(v) = data.receive_emails {
            q = q.bind(v as i64);
        }
        q = q.bind(id.inner());

        let affected = q.execute(&self.pool).await?.rows_affected();
        if affected == 0 {
            return Err(DbError::nicht_gefunden(format!("User {id}")));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::intern("User nach Update nicht gefunden"))
    }

    async fn update_secret(&self, id: UserId, password_hash: &str) -> DbResult<()> {
        let affected = sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(id.inner())
            .execute(&self.pool)
            .await?
            .rows_affected();
        if affected == 0 {
            return Err(DbError::nicht_gefunden(format!("User {id}")));
        }
        Ok(())
    }

    async fn update_standing(&self, id: UserId, stand: StandUpdate) -> DbResult<BenutzerRecord> {
        let affected = sqlx::query(
            "UPDATE users
             SET role = ?, is_banned = ?, is_muted = ?, ban_reason = ?, mute_reason = ?
             WHERE id = ?",
        )
        .bind(stand.rolle.als_str())
        .bind(stand.is_banned as i64)
        .bind(stand.is_muted as i64)
        .bind(&stand.ban_reason)
        .bind(&stand.mute_reason)
        .bind(id.inner())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(DbError::nicht_gefunden(format!("User {id}")));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::intern("User nach Update nicht gefunden"))
    }

    async fn update_last_login(&self, id: UserId) -> DbResult<()> {
        let (_, now_str) = jetzt();
        sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
            .bind(&now_str)
            .bind(id.inner())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn row_to_benutzer(row: &sqlx::sqlite::SqliteRow) -> DbResult<BenutzerRecord> {
    let id: i64 = row.try_get("id")?;

    let rolle_str: String = row.try_get("role")?;
    let rolle: Rolle = rolle_str
        .parse()
        .map_err(|e: String| DbError::UngueltigeDaten(format!("User {id}: {e}")))?;

    let is_banned: i64 = row.try_get("is_banned")?;
    let is_muted: i64 = row.try_get("is_muted")?;
    let show_dob_date: i64 = row.try_get("show_dob_date")?;
    let show_dob_year: i64 = row.try_get("show_dob_year")?;
    let receive_emails: i64 = row.try_get("receive_emails")?;

    Ok(BenutzerRecord {
        id: UserId(id),
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        rolle,
        is_banned: is_banned != 0,
        is_muted: is_muted != 0,
        ban_reason: row.try_get("ban_reason")?,
        mute_reason: row.try_get("mute_reason")?,
        registriert_am: parse_datetime(row, "registration_date")?,
        last_login: parse_opt_datetime(row, "last_login")?,
        profil: BenutzerProfil {
            avatar_url: row.try_get("avatar_url")?,
            avatar_color: row.try_get("avatar_color")?,
            location: row.try_get("location")?,
            website: row.try_get("website")?,
            about: row.try_get("about")?,
            dob_day: row.try_get("dob_day")?,
            dob_month: row.try_get("dob_month")?,
            dob_year: row.try_get("dob_year")?,
            show_dob_date: show_dob_date != 0,
            show_dob_year: show_dob_year != 0,
            receive_emails: receive_emails != 0,
        },
    })
}
