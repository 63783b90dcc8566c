//! Rate Limiter fuer Login und Registrierung
//!
//! Token-Bucket pro Client-IP, getrennt nach Vorgang. Der Zustand ist rein
//! prozesslokal und fuer die Korrektheit ohne Bedeutung.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use parking_lot::Mutex;
use serde::Deserialize;

/// Konfiguration fuer den Rate Limiter
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitKonfig {
    /// Maximale Login-Versuche pro Minute pro IP
    pub login_pro_minute: u32,
    /// Maximale Registrierungen pro Minute pro IP
    pub registrierung_pro_minute: u32,
}

impl Default for RateLimitKonfig {
    fn default() -> Self {
        Self {
            login_pro_minute: 10,
            registrierung_pro_minute: 5,
        }
    }
}

/// Geschuetzte Vorgaenge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vorgang {
    Login,
    Registrierung,
}

/// Ein Token-Bucket fuer eine einzelne IP
#[derive(Debug)]
struct TokenBucket {
    /// Aktuelle Token-Anzahl (als f64 fuer Bruchteil-Auffuellung)
    token: f64,
    /// Maximale Token-Anzahl (= Burst-Limit)
    max_token: f64,
    /// Auffuellrate in Token pro Sekunde
    fuellrate: f64,
    letzte_auffuellung: Instant,
}

impl TokenBucket {
    fn neu(max_anfragen_pro_minute: u32) -> Self {
        let max = f64::from(max_anfragen_pro_minute.max(1));
        Self {
            token: max,
            max_token: max,
            fuellrate: max / 60.0,
            letzte_auffuellung: Instant::now(),
        }
    }

    /// Versucht ein Token zu verbrauchen. Gibt `true` zurueck wenn erlaubt.
    fn verbrauchen(&mut self) -> bool {
        self.auffuellen();
        if self.token >= 1.0 {
            self.token -= 1.0;
            true
        } else {
            false
        }
    }

    /// Sekunden bis zum naechsten verfuegbaren Token
    fn retry_after_secs(&mut self) -> u64 {
        self.auffuellen();
        let fehlend = 1.0 - self.token;
        if fehlend <= 0.0 {
            return 0;
        }
        (fehlend / self.fuellrate).ceil() as u64
    }

    fn auffuellen(&mut self) {
        let jetzt = Instant::now();
        let vergangen = jetzt.duration_since(self.letzte_auffuellung).as_secs_f64();
        self.token = (self.token + vergangen * self.fuellrate).min(self.max_token);
        self.letzte_auffuellung = jetzt;
    }
}

/// Rate Limiter mit Token-Bucket-Algorithmus
pub struct RateLimiter {
    konfig: RateLimitKonfig,
    buckets: Mutex<HashMap<(Vorgang, String), TokenBucket>>,
}

impl RateLimiter {
    pub fn neu(konfig: RateLimitKonfig) -> Arc<Self> {
        Arc::new(Self {
            konfig,
            buckets: Mutex::new(HashMap::new()),
        })
    }

    /// Prueft und verbraucht ein Token fuer Vorgang und IP.
    ///
    /// Gibt `Ok(())` zurueck wenn erlaubt, `Err(retry_after_secs)` sonst.
    pub fn pruefen(&self, vorgang: Vorgang, ip: &str) -> Result<(), u64> {
        let limit = match vorgang {
            Vorgang::Login => self.konfig.login_pro_minute,
            Vorgang::Registrierung => self.konfig.registrierung_pro_minute,
        };
        let mut buckets = self.buckets.lock();
        let bucket = buckets
            .entry((vorgang, ip.to_string()))
            .or_insert_with(|| TokenBucket::neu(limit));
        if bucket.verbrauchen() {
            Ok(())
        } else {
            Err(bucket.retry_after_secs().max(1))
        }
    }

    /// Bereinigt Buckets die seit mehr als 5 Minuten inaktiv sind
    pub fn cleanup(&self) {
        let schwellwert = Duration::from_secs(5 * 60);
        let jetzt = Instant::now();
        self.buckets
            .lock()
            .retain(|_, b| jetzt.duration_since(b.letzte_auffuellung) < schwellwert);
    }
}
