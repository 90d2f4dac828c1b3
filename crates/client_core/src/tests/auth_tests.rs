use serde_json::json;
use shared::error::FailureKind;
use tokio::sync::broadcast::error::TryRecvError;

use super::support::{client_for, signed_in_client, spawn_backend, FakeBackend};
use crate::{
    auth::{SIGN_IN_PATH, SIGN_OUT_PATH},
    entities::admin_controller,
    AuthService, ClientError, SessionEvent,
};

#[tokio::test]
async fn sign_in_with_access_token_authorizes_later_requests() {
    let backend = FakeBackend::default();
    backend
        .respond(
            "POST",
            SIGN_IN_PATH,
            200,
            json!({
                "accessToken": "abc",
                "data": {"user": {"first_name": "Aziz", "email": "aziz@x.uz", "role": "Super Admin"}}
            }),
        )
        .respond("GET", "/api/staff/all-admins", 200, json!({"admins": []}));
    let base_url = spawn_backend(backend.clone()).await;
    let client = client_for(&base_url);
    let mut events = client.subscribe_session_events();
    let auth = AuthService::new(client.clone());

    let user = auth
        .sign_in(" aziz@x.uz ", "secret")
        .await
        .expect("sign in")
        .expect("profile");
    assert_eq!(user.display_name(), "Aziz");
    assert_eq!(client.session().get_token().as_deref(), Some("abc"));
    assert!(matches!(
        events.try_recv().expect("event"),
        SessionEvent::SignedIn { user: Some(_) }
    ));

    admin_controller(client).load().await.expect("load");

    let sign_in = &backend.requests_to("POST", SIGN_IN_PATH)[0];
    assert_eq!(sign_in.authorization, None);
    assert_eq!(sign_in.body, json!({"email": "aziz@x.uz", "password": "secret"}));
    let list = &backend.requests_to("GET", "/api/staff/all-admins")[0];
    assert_eq!(list.authorization.as_deref(), Some("Bearer abc"));
}

#[tokio::test]
async fn sign_in_without_token_is_a_format_failure() {
    let backend = FakeBackend::default();
    backend.respond("POST", SIGN_IN_PATH, 200, json!({"message": "ok"}));
    let base_url = spawn_backend(backend).await;
    let client = client_for(&base_url);
    let auth = AuthService::new(client.clone());

    let err = auth.sign_in("a@x.uz", "pw").await.expect_err("no token");

    assert_eq!(err.kind(), FailureKind::Format);
    assert!(!client.session().is_authenticated());
}

#[tokio::test]
async fn rejected_credentials_do_not_disturb_an_existing_session() {
    let backend = FakeBackend::default();
    backend.respond(
        "POST",
        SIGN_IN_PATH,
        401,
        json!({"message": "Email yoki parol noto'g'ri"}),
    );
    let base_url = spawn_backend(backend).await;
    let client = signed_in_client(&base_url, "current");
    let mut events = client.subscribe_session_events();
    let auth = AuthService::new(client.clone());

    let err = auth.sign_in("a@x.uz", "wrong").await.expect_err("401");

    assert!(matches!(err, ClientError::Auth { .. }));
    assert_eq!(err.server_message(), Some("Email yoki parol noto'g'ri"));
    assert_eq!(client.session().get_token().as_deref(), Some("current"));
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn sign_out_clears_locally_even_when_backend_fails() {
    let backend = FakeBackend::default();
    backend.respond("POST", SIGN_OUT_PATH, 500, json!({}));
    let base_url = spawn_backend(backend.clone()).await;
    let client = signed_in_client(&base_url, "abc");
    let mut events = client.subscribe_session_events();
    let auth = AuthService::new(client.clone());

    auth.sign_out().await;

    assert!(!client.session().is_authenticated());
    assert_eq!(events.try_recv().expect("event"), SessionEvent::SignedOut);
    assert_eq!(
        backend.requests_to("POST", SIGN_OUT_PATH)[0]
            .authorization
            .as_deref(),
        Some("Bearer abc")
    );
    assert!(matches!(
        auth.require_session(),
        Err(ClientError::Auth { message: None })
    ));

    // Signing out twice is quiet and does not reach the backend again.
    auth.sign_out().await;
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    assert_eq!(backend.requests_to("POST", SIGN_OUT_PATH).len(), 1);
}
