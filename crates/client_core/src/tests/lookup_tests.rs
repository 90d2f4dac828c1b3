use std::{sync::Arc, time::Duration};

use serde_json::json;
use shared::{domain::ResourceId, error::FailureKind};

use super::support::{signed_in_client, spawn_backend, FakeBackend};
use crate::{
    lookup::{student_lookup, teacher_lookup},
    LookupOutcome,
};

const SEARCH_TEACHER: &str = "/api/group/search-teacher";

#[tokio::test]
async fn short_queries_clear_without_a_request() {
    let backend = FakeBackend::default();
    backend.respond(
        "GET",
        SEARCH_TEACHER,
        200,
        json!([{"_id": "t1", "first_name": "Jamshid"}]),
    );
    let base_url = spawn_backend(backend.clone()).await;
    let lookup = teacher_lookup(signed_in_client(&base_url, "abc"));

    assert_eq!(lookup.search("jam").await, LookupOutcome::Applied(1));
    assert_eq!(lookup.results().len(), 1);

    assert_eq!(lookup.search("j").await, LookupOutcome::Cleared);
    assert!(lookup.results().is_empty());
    assert_eq!(backend.requests().len(), 1);
    assert_eq!(backend.requests()[0].query.as_deref(), Some("name=jam"));
}

#[tokio::test]
async fn only_the_latest_query_is_applied() {
    let backend = FakeBackend::default();
    backend
        .respond_after(
            "GET",
            &format!("{SEARCH_TEACHER}?name=jo"),
            Duration::from_millis(300),
            200,
            json!([
                {"_id": "a", "first_name": "Jonibek"},
                {"_id": "b", "first_name": "Jobir"},
            ]),
        )
        .respond(
            "GET",
            &format!("{SEARCH_TEACHER}?name=john"),
            200,
            json!({"data": [{"_id": "c", "first_name": "John", "last_name": "Doe"}]}),
        );
    let base_url = spawn_backend(backend).await;
    let lookup = Arc::new(teacher_lookup(signed_in_client(&base_url, "abc")));

    let slow = {
        let lookup = lookup.clone();
        tokio::spawn(async move { lookup.search("jo").await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(lookup.search("john").await, LookupOutcome::Applied(1));
    assert_eq!(slow.await.expect("join"), LookupOutcome::Stale);

    let results = lookup.results();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, ResourceId::from("c"));
    assert_eq!(results[0].label(), "John Doe");
    assert_eq!(lookup.query(), "john");
}

#[tokio::test]
async fn failed_lookup_clears_suggestions() {
    let backend = FakeBackend::default();
    backend
        .respond(
            "GET",
            "/api/payment/search-student",
            200,
            json!([{"_id": "s1", "first_name": "Dilshod"}]),
        )
        .respond("GET", "/api/payment/search-student", 500, json!({}));
    let base_url = spawn_backend(backend).await;
    let lookup = student_lookup(signed_in_client(&base_url, "abc"));

    assert_eq!(lookup.search("dil").await, LookupOutcome::Applied(1));
    assert_eq!(
        lookup.search("dilsh").await,
        LookupOutcome::Failed(FailureKind::Server)
    );
    assert!(lookup.results().is_empty());
}
