//! Unit-Tests fuer den ShoutService

use std::sync::Arc;

use thw_auth::{AuthError, AuthorizationGate, Verweigerung};
use thw_core::{Rolle, UserId};
use thw_db::models::{NeueEinladung, NeuerBenutzer, StandUpdate};
use thw_db::{InviteRepository, SqliteDb, UserRepository};

use crate::{error::ShoutError, service::ShoutService};

async fn test_db() -> Arc<SqliteDb> {
    Arc::new(
        SqliteDb::in_memory()
            .await
            .expect("In-Memory-DB konnte nicht geoeffnet werden"),
    )
}

async fn setup(db: &Arc<SqliteDb>) -> (Arc<ShoutService<SqliteDb, SqliteDb>>, UserId) {
    InviteRepository::create(
        db.as_ref(),
        NeueEinladung {
            code: "OFFEN",
            uses_left: -1,
            created_by: None,
        },
    )
    .await
    .expect("Einladung anlegen fehlgeschlagen");

    let user = UserRepository::create(
        db.as_ref(),
        NeuerBenutzer {
            username: "shouter",
            email: "shouter@example.com",
            password_hash: "hash",
            avatar_url: "https://example.com/a.png",
        },
        "OFFEN",
    )
    .await
    .expect("User anlegen fehlgeschlagen");

    let gate = AuthorizationGate::neu(Arc::clone(db));
    (ShoutService::neu(Arc::clone(db), gate), user.id)
}

async fn stand_setzen(db: &SqliteDb, id: UserId, rolle: Rolle, gebannt: bool, stumm: bool) {
    UserRepository::update_standing(
        db,
        id,
        StandUpdate {
            rolle,
            is_banned: gebannt,
            is_muted: stumm,
            ban_reason: gebannt.then(|| "Spam".to_string()),
            mute_reason: stumm.then(|| "Ton".to_string()),
        },
    )
    .await
    .expect("Stand setzen fehlgeschlagen");
}

#[tokio::test]
async fn test_shout_posten_erfolgreich() {
    let db = test_db().await;
    let (service, user_id) = setup(&db).await;

    let shout = service
        .posten(user_id, "  Moin zusammen!  ")
        .await
        .expect("Shout posten fehlgeschlagen");

    assert_eq!(shout.message, "Moin zusammen!");
    assert_eq!(shout.user_id, user_id);
    assert_eq!(shout.username, "shouter");
    assert_eq!(shout.role, Rolle::User);
}

#[tokio::test]
async fn test_leerer_shout_abgelehnt() {
    let db = test_db().await;
    let (service, user_id) = setup(&db).await;

    let e = service.posten(user_id, "   ").await.unwrap_err();
    assert!(matches!(e, ShoutError::UngueltigeEingabe(_)));
}

#[tokio::test]
async fn test_zu_langer_shout_abgelehnt() {
    let db = test_db().await;
    let (service, user_id) = setup(&db).await;

    // 500 Zeichen sind erlaubt, auch mehrbytige
    let grenze = "ä".repeat(500);
    assert!(service.posten(user_id, &grenze).await.is_ok());

    let zu_lang = "x".repeat(501);
    let e = service.posten(user_id, &zu_lang).await.unwrap_err();
    assert!(matches!(e, ShoutError::UngueltigeEingabe(_)));
}

#[tokio::test]
async fn test_stummgeschaltet_darf_nicht_posten() {
    let db = test_db().await;
    let (service, user_id) = setup(&db).await;
    stand_setzen(&db, user_id, Rolle::User, false, true).await;

    let e = service.posten(user_id, "Hallo?").await.unwrap_err();
    match e {
        ShoutError::Auth(AuthError::Verweigert(Verweigerung::Stummgeschaltet { begruendung })) => {
            assert_eq!(begruendung.as_deref(), Some("Ton"));
        }
        andere => panic!("Unerwarteter Fehler: {andere:?}"),
    }
    assert!(service.neueste(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_gebannt_darf_nicht_posten() {
    let db = test_db().await;
    let (service, user_id) = setup(&db).await;
    stand_setzen(&db, user_id, Rolle::Banned, true, false).await;

    let e = service.posten(user_id, "Hallo?").await.unwrap_err();
    assert!(matches!(
        e,
        ShoutError::Auth(AuthError::Verweigert(Verweigerung::Gebannt { .. }))
    ));
}

#[tokio::test]
async fn test_neueste_zuerst_und_limit() {
    let db = test_db().await;
    let (service, user_id) = setup(&db).await;

    for i in 0..5 {
        service.posten(user_id, &format!("Shout {i}")).await.unwrap();
    }

    let alle = service.neueste(None).await.unwrap();
    assert_eq!(alle.len(), 5);
    assert_eq!(alle[0].message, "Shout 4");
    assert_eq!(alle[4].message, "Shout 0");

    let zwei = service.neueste(Some(2)).await.unwrap();
    assert_eq!(zwei.len(), 2);
    assert_eq!(zwei[0].message, "Shout 4");

    // Werte unter 1 werden auf 1 angehoben
    assert_eq!(service.neueste(Some(0)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_shout_json_camel_case() {
    let db = test_db().await;
    let (service, user_id) = setup(&db).await;
    let shout = service.posten(user_id, "json").await.unwrap();

    let json = serde_json::to_value(&shout).unwrap();
    assert_eq!(json["userId"], user_id.inner());
    assert_eq!(json["avatarUrl"], "https://example.com/a.png");
    assert_eq!(json["role"], "User");
}
