//! HTTP-Tests gegen den vollstaendigen Router mit In-Memory-SQLite

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use thw_api::{router, AppState, RateLimitKonfig, RateLimiter};
use thw_auth::SessionKonfig;
use thw_db::{models::NeueEinladung, InviteRepository, SqliteDb};
use thw_observability::ForumMetriken;
use tower::ServiceExt;

async fn test_state(limits: RateLimitKonfig) -> AppState {
    let db = Arc::new(SqliteDb::in_memory().await.expect("In-Memory-DB"));
    for (code, uses_left) in [("START", -1), ("VIP1", 1)] {
        InviteRepository::create(
            db.as_ref(),
            NeueEinladung {
                code,
                uses_left,
                created_by: None,
            },
        )
        .await
        .expect("Einladung anlegen");
    }
    AppState::neu(
        db,
        SessionKonfig::default(),
        RateLimiter::neu(limits),
        ForumMetriken::neu().expect("Metriken"),
        false,
    )
}

fn grosszuegig() -> RateLimitKonfig {
    RateLimitKonfig {
        login_pro_minute: 1000,
        registrierung_pro_minute: 1000,
    }
}

async fn anfrage(
    app: &Router,
    methode: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, HeaderMap, Value) {
    let mut builder = Request::builder().method(methode).uri(uri);
    if let Some(t) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let request = match body {
        Some(b) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let antwort = app.clone().oneshot(request).await.unwrap();
    let status = antwort.status();
    let headers = antwort.headers().clone();
    let bytes = axum::body::to_bytes(antwort.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, headers, json)
}

async fn registrieren(app: &Router, name: &str, code: &str, bleiben: bool) -> (StatusCode, Value) {
    let (status, _, json) = anfrage(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "username": name,
            "email": format!("{}@example.com", name.to_lowercase()),
            "password": "geheim123",
            "inviteCode": code,
            "rememberMe": bleiben,
        })),
    )
    .await;
    (status, json)
}

async fn login(app: &Router, kennung: &str, passwort: &str) -> (StatusCode, Value) {
    let (status, _, json) = anfrage(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "identifier": kennung, "password": passwort })),
    )
    .await;
    (status, json)
}

fn token(json: &Value) -> String {
    json["token"].as_str().expect("token im Body").to_string()
}

/// Registriert `root` und ernennt ihn zum Admin
async fn admin_anlegen(state: &AppState, app: &Router) -> String {
    let (status, _) = registrieren(app, "root", "START", false).await;
    assert_eq!(status, StatusCode::CREATED);
    state.auth.admin_ernennen("root").await.unwrap();
    let (status, json) = login(app, "root", "geheim123").await;
    assert_eq!(status, StatusCode::OK);
    token(&json)
}

#[tokio::test]
async fn health_und_metrics() {
    let state = test_state(grosszuegig()).await;
    let app = router(state);

    let (status, _, json) = anfrage(&app, Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["db_connected"], true);

    registrieren(&app, "alice", "START", false).await;

    let antwort = app
        .clone()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(antwort.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(antwort.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("thw_registrierungen_total 1"));
    assert!(text.contains("thw_http_requests_total"));
}

#[tokio::test]
async fn registrierung_meldet_an_und_setzt_cookie() {
    let state = test_state(grosszuegig()).await;
    let app = router(state);

    let (status, headers, json) = anfrage(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "username": "Alice",
            "email": "alice@example.com",
            "password": "geheim123",
            "inviteCode": "START",
            "rememberMe": true,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["user"]["username"], "Alice");
    assert_eq!(json["user"]["role"], "User");
    assert_eq!(json["persistence"], "durable");
    assert!(json["user"].get("passwordHash").is_none());

    let cookie = headers[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("thw_session="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Max-Age="));

    // Session per Cookie
    let t = token(&json);
    let antwort = app
        .clone()
        .oneshot(
            Request::get("/api/auth/me")
                .header(header::COOKIE, format!("thw_session={t}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(antwort.status(), StatusCode::OK);
}

#[tokio::test]
async fn ephemeral_cookie_ohne_max_age() {
    let state = test_state(grosszuegig()).await;
    let app = router(state);
    registrieren(&app, "bob", "START", false).await;

    let (_, headers, json) = anfrage(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": "BOB", "password": "geheim123" })),
    )
    .await;
    assert_eq!(json["persistence"], "ephemeral");
    let cookie = headers[header::SET_COOKIE].to_str().unwrap();
    assert!(!cookie.contains("Max-Age"));
}

#[tokio::test]
async fn falsche_anmeldedaten_gleiche_antwort() {
    let state = test_state(grosszuegig()).await;
    let app = router(state);
    registrieren(&app, "carol", "START", false).await;

    let (s1, j1) = login(&app, "carol", "falsch!").await;
    let (s2, j2) = login(&app, "niemand", "geheim123").await;
    assert_eq!(s1, StatusCode::UNAUTHORIZED);
    assert_eq!(s2, StatusCode::UNAUTHORIZED);
    assert_eq!(j1["error"]["code"], "invalid_credentials");
    assert_eq!(j1["error"]["message"], j2["error"]["message"]);
}

#[tokio::test]
async fn vip1_und_duplikat() {
    let state = test_state(grosszuegig()).await;
    let app = router(state);

    let (status, _) = registrieren(&app, "erste", "VIP1", false).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) = registrieren(&app, "zweite", "VIP1", false).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "invalid_invite");

    let (status, json) = registrieren(&app, "ERSTE", "START", false).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["code"], "duplicate_identity");
}

#[tokio::test]
async fn ohne_session_401() {
    let state = test_state(grosszuegig()).await;
    let app = router(state);

    for (methode, uri) in [
        (Method::GET, "/api/auth/me"),
        (Method::GET, "/api/admin/users"),
        (Method::GET, "/api/users/me/ip"),
    ] {
        let (status, _, json) = anfrage(&app, methode, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(json["error"]["code"], "not_authenticated");
    }

    let (status, _, json) =
        anfrage(&app, Method::GET, "/api/auth/me", Some("erfunden"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"]["code"], "session_not_found");
}

#[tokio::test]
async fn dave_bann_und_entbannung() {
    let state = test_state(grosszuegig()).await;
    let app = router(state.clone());
    let admin = admin_anlegen(&state, &app).await;

    let (_, json) = registrieren(&app, "dave", "START", true).await;
    let dave_token = token(&json);
    let dave_id = json["user"]["id"].as_i64().unwrap();

    // Bann ueber die Rolle, Grund im eigenen Feld
    let (status, _, json) = anfrage(
        &app,
        Method::PUT,
        &format!("/api/admin/users/{dave_id}"),
        Some(&admin),
        Some(json!({ "role": "Banned", "banReason": "Spam" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["isBanned"], true);
    assert_eq!(json["role"], "Banned");
    assert_eq!(json["banReason"], "Spam");

    // Bestehende Session ist widerrufen
    let (status, _, _) = anfrage(&app, Method::GET, "/api/auth/me", Some(&dave_token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Richtiges Passwort: verweigert mit Grund
    let (status, json) = login(&app, "dave", "geheim123").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["error"]["code"], "denied");
    assert_eq!(json["error"]["reason"]["grund"], "gebannt");
    assert_eq!(json["error"]["reason"]["begruendung"], "Spam");

    // Entbannen ueber das Flag setzt die Rolle zurueck
    let (status, _, json) = anfrage(
        &app,
        Method::PUT,
        &format!("/api/admin/users/{dave_id}"),
        Some(&admin),
        Some(json!({ "isBanned": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["isBanned"], false);
    assert_eq!(json["role"], "User");
    assert!(json["banReason"].is_null());

    let (status, _) = login(&app, "dave", "geheim123").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn stummgeschaltet_postet_nicht() {
    let state = test_state(grosszuegig()).await;
    let app = router(state.clone());
    let admin = admin_anlegen(&state, &app).await;

    let (_, json) = registrieren(&app, "erin", "START", false).await;
    let erin = token(&json);
    let erin_id = json["user"]["id"].as_i64().unwrap();

    let (status, _, json) = anfrage(
        &app,
        Method::POST,
        "/api/shouts",
        Some(&erin),
        Some(json!({ "message": "Moin!" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["username"], "erin");

    let (status, _, _) = anfrage(
        &app,
        Method::PUT,
        &format!("/api/admin/users/{erin_id}"),
        Some(&admin),
        Some(json!({ "isMuted": true, "reason": "Laut" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Session bleibt gueltig, Posten nicht
    let (status, _, json) = anfrage(
        &app,
        Method::POST,
        "/api/shouts",
        Some(&erin),
        Some(json!({ "message": "Hallo?" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["error"]["reason"]["grund"], "stummgeschaltet");
    assert_eq!(json["error"]["reason"]["begruendung"], "Laut");

    let (status, _) = login(&app, "erin", "geheim123").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, json) = anfrage(&app, Method::GET, "/api/shouts?limit=10", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn mitglied_ohne_admin_zugang() {
    let state = test_state(grosszuegig()).await;
    let app = router(state.clone());
    let (_, json) = registrieren(&app, "frank", "START", false).await;
    let frank = token(&json);
    let frank_id = json["user"]["id"].as_i64().unwrap();

    let (status, _, json) = anfrage(&app, Method::GET, "/api/admin/users", Some(&frank), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["error"]["code"], "not_authorized");

    // Selbstbefoerderung ist nicht moeglich
    let (status, _, _) = anfrage(
        &app,
        Method::PUT,
        &format!("/api/admin/users/{frank_id}"),
        Some(&frank),
        Some(json!({ "role": "Admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = anfrage(
        &app,
        Method::POST,
        "/api/admin/invites",
        Some(&frank),
        Some(json!({ "usesLeft": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_verwaltet_einladungen() {
    let state = test_state(grosszuegig()).await;
    let app = router(state.clone());
    let admin = admin_anlegen(&state, &app).await;

    let (status, _, json) = anfrage(
        &app,
        Method::POST,
        "/api/admin/invites",
        Some(&admin),
        Some(json!({ "code": "SOMMER24", "usesLeft": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["code"], "SOMMER24");
    assert_eq!(json["usesLeft"], 2);

    let (status, _, json) = anfrage(&app, Method::GET, "/api/admin/invites", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 3);

    let (status, _, json) = anfrage(&app, Method::GET, "/api/admin/users", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0]["username"], "root");
    assert_eq!(json[0]["role"], "Admin");
}

#[tokio::test]
async fn profil_und_oeffentliche_ansicht() {
    let state = test_state(grosszuegig()).await;
    let app = router(state);
    let (_, json) = registrieren(&app, "grace", "START", false).await;
    let grace = token(&json);
    let id = json["user"]["id"].as_i64().unwrap();

    let (status, _, json) = anfrage(
        &app,
        Method::PUT,
        "/api/users/me",
        Some(&grace),
        Some(json!({ "location": "Bremen", "dobYear": 1990, "showDobYear": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["location"], "Bremen");
    assert_eq!(json["dobYear"], 1990);

    let (status, _, json) =
        anfrage(&app, Method::GET, &format!("/api/users/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["location"], "Bremen");
    assert!(json["dobYear"].is_null());
    assert!(json.get("email").is_none());

    let (status, _, _) = anfrage(&app, Method::GET, "/api/users/9999", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, json) = anfrage(&app, Method::GET, "/api/users", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn passwort_wechsel_beendet_sessions() {
    let state = test_state(grosszuegig()).await;
    let app = router(state);
    let (_, json) = registrieren(&app, "heidi", "START", false).await;
    let heidi = token(&json);

    let (status, headers, _) = anfrage(
        &app,
        Method::PUT,
        "/api/users/me/password",
        Some(&heidi),
        Some(json!({ "oldPassword": "geheim123", "newPassword": "neues_pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(headers[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .contains("Max-Age=0"));

    let (status, _, _) = anfrage(&app, Method::GET, "/api/auth/me", Some(&heidi), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = login(&app, "heidi", "neues_pw").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn logout_und_ip_protokoll_hinter_proxy() {
    let state = test_state(grosszuegig()).await.mit_trusted_proxy(true);
    let app = router(state);
    let (_, json) = registrieren(&app, "ivan", "START", false).await;
    let ivan = token(&json);

    let antwort = app
        .clone()
        .oneshot(
            Request::post("/api/users/me/ip")
                .header(header::AUTHORIZATION, format!("Bearer {ivan}"))
                .header("x-forwarded-for", "203.0.113.7")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(antwort.status(), StatusCode::NO_CONTENT);

    let (status, _, json) = anfrage(&app, Method::GET, "/api/users/me/ip", Some(&ivan), None).await;
    assert_eq!(status, StatusCode::OK);
    let ips: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["ip"].as_str())
        .collect();
    assert!(ips.contains(&"203.0.113.7"));

    let (status, _, _) = anfrage(&app, Method::POST, "/api/auth/logout", Some(&ivan), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _, _) = anfrage(&app, Method::GET, "/api/auth/me", Some(&ivan), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_rate_limit() {
    let state = test_state(RateLimitKonfig {
        login_pro_minute: 2,
        registrierung_pro_minute: 10,
    })
    .await;
    let app = router(state);

    for _ in 0..2 {
        let (status, _) = login(&app, "niemand", "x").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    let (status, headers, json) = anfrage(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "identifier": "niemand", "password": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["error"]["code"], "rate_limited");
    assert!(headers.contains_key(header::RETRY_AFTER));
}

/// Anfrage mit Verbindungsadresse und frei gewaehltem `X-Forwarded-For`
fn mit_verbindung(
    mut request: Request<Body>,
    verbindung: &str,
    weitergeleitet: &str,
) -> Request<Body> {
    let addr: SocketAddr = format!("{verbindung}:40000").parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));
    request
        .headers_mut()
        .insert("x-forwarded-for", weitergeleitet.parse().unwrap());
    request
}

#[tokio::test]
async fn ohne_proxy_zaehlt_verbindungsadresse() {
    let state = test_state(grosszuegig()).await;
    let app = router(state);
    let (_, json) = registrieren(&app, "judy", "START", false).await;
    let judy = token(&json);

    let request = Request::post("/api/users/me/ip")
        .header(header::AUTHORIZATION, format!("Bearer {judy}"))
        .body(Body::empty())
        .unwrap();
    let antwort = app
        .clone()
        .oneshot(mit_verbindung(request, "198.51.100.4", "203.0.113.99"))
        .await
        .unwrap();
    assert_eq!(antwort.status(), StatusCode::NO_CONTENT);

    let (_, _, json) = anfrage(&app, Method::GET, "/api/users/me/ip", Some(&judy), None).await;
    let ips: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["ip"].as_str())
        .collect();
    assert!(ips.contains(&"198.51.100.4"));
    assert!(!ips.contains(&"203.0.113.99"));
}

#[tokio::test]
async fn wechselnder_header_umgeht_login_limit_nicht() {
    let state = test_state(RateLimitKonfig {
        login_pro_minute: 2,
        registrierung_pro_minute: 10,
    })
    .await;
    let app = router(state);

    let mut stati = Vec::new();
    for i in 0..3 {
        let request = Request::post("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "identifier": "niemand", "password": "x" }).to_string(),
            ))
            .unwrap();
        let antwort = app
            .clone()
            .oneshot(mit_verbindung(request, "198.51.100.7", &format!("10.0.0.{i}")))
            .await
            .unwrap();
        stati.push(antwort.status());
    }
    assert_eq!(
        stati,
        vec![
            StatusCode::UNAUTHORIZED,
            StatusCode::UNAUTHORIZED,
            StatusCode::TOO_MANY_REQUESTS
        ]
    );
}

#[tokio::test]
async fn hinter_proxy_zaehlt_weitergeleitete_adresse() {
    let state = test_state(RateLimitKonfig {
        login_pro_minute: 1,
        registrierung_pro_minute: 10,
    })
    .await
    .mit_trusted_proxy(true);
    let app = router(state);

    // Zwei Clients hinter demselben Proxy haben getrennte Buckets
    for client in ["10.0.0.1", "10.0.0.2"] {
        let request = Request::post("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "identifier": "niemand", "password": "x" }).to_string(),
            ))
            .unwrap();
        let antwort = app
            .clone()
            .oneshot(mit_verbindung(request, "127.0.0.1", client))
            .await
            .unwrap();
        assert_eq!(antwort.status(), StatusCode::UNAUTHORIZED, "{client}");
    }
}
