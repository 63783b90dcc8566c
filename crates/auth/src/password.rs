//! Passwort-Hashing mit Argon2id
//!
//! Geheimnisse werden ausschliesslich als PHC-String gespeichert
//! (Algorithmus, Parameter, Salt, Hash). Die Verifikation vergleicht in
//! konstanter Zeit.

use std::sync::OnceLock;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params, Version,
};

use crate::error::AuthError;

/// Mindestlaenge fuer neue Passwoerter
pub const MIN_PASSWORT_LAENGE: usize = 6;

/// Argon2id-Parameter
///
/// - Speicher: 19 MiB
/// - Iterationen: 2
/// - Parallelismus: 1
fn argon2_instanz() -> Result<Argon2<'static>, AuthError> {
    let params = Params::new(19 * 1024, 2, 1, None)
        .map_err(|e| AuthError::PasswortHashing(format!("Argon2-Parameter ungueltig: {e}")))?;

    Ok(Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params))
}

/// Hasht ein Passwort mit Argon2id und einem zufaelligen Salt
pub fn passwort_hashen(passwort: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    argon2_instanz()?
        .hash_password(passwort.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswortHashing(e.to_string()))
}

/// Verifiziert ein Passwort gegen einen gespeicherten PHC-Hash
///
/// Gibt `true` zurueck wenn das Passwort korrekt ist. Die Parameter werden
/// aus dem PHC-String gelesen, aeltere Hashes bleiben daher gueltig.
pub fn passwort_verifizieren(passwort: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AuthError::PasswortHashing(format!("Ungueltiges Hash-Format: {e}")))?;

    match argon2_instanz()?.verify_password(passwort.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::PasswortHashing(e.to_string())),
    }
}

/// Vergleichs-Hash fuer unbekannte Kennungen, mit denselben Parametern wie
/// echte Konten erzeugt. Einmal pro Prozess berechnet.
pub(crate) fn platzhalter_hash() -> Option<&'static str> {
    static HASH: OnceLock<Option<String>> = OnceLock::new();
    HASH.get_or_init(|| passwort_hashen("thw-platzhalter").ok()).as_deref()
}

/// Verifiziert gegen den Platzhalter-Hash und verwirft das Ergebnis.
///
/// Ein Login mit unbekannter Kennung kostet so dieselbe Argon2-Arbeit wie
/// ein falsches Passwort.
pub fn passwort_blind_verifizieren(passwort: &str) {
    if let Some(hash) = platzhalter_hash() {
        let _ = passwort_verifizieren(passwort, hash);
    }
}

/// Prueft die Mindestanforderungen an ein neues Passwort
pub fn passwort_pruefen(passwort: &str) -> Result<(), AuthError> {
    if passwort.chars().count() < MIN_PASSWORT_LAENGE {
        return Err(AuthError::validierung(format!(
            "Passwort muss mindestens {MIN_PASSWORT_LAENGE} Zeichen lang sein"
        )));
    }
    Ok(())
}
