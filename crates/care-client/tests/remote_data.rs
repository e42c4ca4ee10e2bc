#![allow(non_snake_case)]

//! Typed reads and mutations against a mocked PlanetCare backend.

use std::time::Duration;

use care_client::{
    ApiClient, ApiConfig, ApiError, DataClient, QueryClient, QueryStatus, ReadOptions, keys,
    queries,
};
use care_types::{AuthToken, EventDraft, NewDonation, Role};
use rstest::rstest;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn data_client(server: &MockServer) -> DataClient {
    let api = ApiClient::new(&ApiConfig::new(server.uri()));
    DataClient::new(api, QueryClient::new())
}

fn signed_in(server: &MockServer) -> DataClient {
    let data = data_client(server);
    data.api().set_token(Some(AuthToken("tok-1".into())));
    data
}

fn event_json(id: &str, volunteers: &[&str]) -> serde_json::Value {
    json!({
        "_id": id,
        "title": "River cleanup",
        "description": "Bring boots",
        "location": "Dhaka",
        "date": "2025-05-01",
        "volunteers": volunteers
    })
}

#[tokio::test]
async fn concurrent_event_reads_hit_the_network_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([event_json("e1", &[])]))
                .set_delay(Duration::from_millis(50)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let data = data_client(&server);
    let (a, b, c) = tokio::join!(data.events(), data.events(), data.events());

    assert_eq!(a, b);
    assert_eq!(b, c);
    let events = a.data.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, "e1");
}

#[tokio::test]
async fn secure_reads_send_the_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/role/rin@planet.care"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"role": "Admin"})))
        .expect(1)
        .mount(&server)
        .await;

    let data = signed_in(&server);
    let result = data.user_role(Some("rin@planet.care")).await;

    assert_eq!(result.status, QueryStatus::Fresh);
    assert_eq!(result.data.and_then(|r| r.role), Some(Role::Admin));
}

#[tokio::test]
async fn secure_read_without_token_fails_locally() {
    let server = MockServer::start().await;
    let data = data_client(&server);

    let result = data.donations().await;

    assert_eq!(result.status, QueryStatus::Error);
    assert!(matches!(result.error, Some(ApiError::AuthRequired { .. })));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn disabled_read_stays_idle() {
    let server = MockServer::start().await;
    let data = signed_in(&server);

    let result = data.my_donations(None).await;

    assert_eq!(result.status, QueryStatus::Idle);
    assert!(result.data.is_none());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[rstest]
#[case(401, "AuthRequired")]
#[case(403, "Forbidden")]
#[case(422, "ValidationFailure")]
#[case(404, "ValidationFailure")]
#[case(500, "ServerFailure")]
#[tokio::test]
async fn failed_reads_are_classified(#[case] status: u16, #[case] expected: &str) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({"message": "nope"})))
        .mount(&server)
        .await;

    let data = signed_in(&server);
    let result = data.users().await;

    assert_eq!(result.status, QueryStatus::Error);
    let error = result.error.unwrap();
    let kind = match &error {
        ApiError::AuthRequired { .. } => "AuthRequired",
        ApiError::Forbidden { .. } => "Forbidden",
        ApiError::ValidationFailure { .. } => "ValidationFailure",
        ApiError::ServerFailure { .. } => "ServerFailure",
        ApiError::NetworkFailure(_) | ApiError::Parse(_) => "other",
    };
    assert_eq!(kind, expected);
    assert_eq!(error.status(), Some(status));
    assert_eq!(error.body(), Some(&json!({"message": "nope"})));
}

#[tokio::test]
async fn unexpected_payload_is_a_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events/leaderboard/top"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"top": []})))
        .mount(&server)
        .await;

    let data = data_client(&server);
    let result = data.leaderboard().await;

    assert_eq!(result.status, QueryStatus::Error);
    assert!(matches!(result.error, Some(ApiError::Parse(_))));
}

#[tokio::test]
async fn unreachable_backend_is_a_network_failure() {
    let data = DataClient::new(
        ApiClient::new(&ApiConfig::new("http://127.0.0.1:9")),
        QueryClient::new(),
    );
    let result = data.events().await;
    assert!(matches!(result.error, Some(ApiError::NetworkFailure(_))));
}

#[tokio::test]
async fn volunteering_refreshes_events_and_leaderboard() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([event_json("e1", &[])])))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([event_json("e1", &["rin@planet.care"])])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/events/volunteer/e1"))
        .and(body_json(json!({"email": "rin@planet.care"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"modifiedCount": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let data = data_client(&server);
    let before = data.events().await.data.unwrap();
    assert!(!before[0].has_volunteer("rin@planet.care"));

    data.cache().set_data(&keys::leaderboard(), json!([]));
    data.volunteer("e1", "rin@planet.care").await.unwrap();
    assert_eq!(
        data.cache().snapshot(&keys::leaderboard()).status,
        QueryStatus::Stale
    );

    let after = data.events().await.data.unwrap();
    assert!(after[0].has_volunteer("rin@planet.care"));
}

#[tokio::test]
async fn rejected_mutation_keeps_cache_and_surfaces_message() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/events/volunteer/e1"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"message": "Already volunteered"})),
        )
        .mount(&server)
        .await;

    let data = data_client(&server);
    data.cache().set_data(&keys::events(), json!([event_json("e1", &[])]));

    let error = data.volunteer("e1", "rin@planet.care").await.unwrap_err();

    assert_eq!(error.user_message(), "Already volunteered");
    assert_eq!(data.cache().snapshot(&keys::events()).status, QueryStatus::Fresh);
}

#[tokio::test]
async fn editing_an_event_sends_its_fields_and_leaves_volunteers_alone() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([event_json("e1", &["rin@planet.care"])])),
        )
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/events/e1"))
        .and(header("authorization", "Bearer tok-1"))
        .and(body_json(json!({
            "title": "River cleanup",
            "description": "Bring boots",
            "location": "Chittagong",
            "date": "2025-05-01"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"modifiedCount": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let data = signed_in(&server);
    let events = data.events().await.data.unwrap();
    let mut draft = EventDraft::from_event(&events[0]);
    draft.location = "Chittagong".into();

    data.update_event("e1", &draft).await.unwrap();

    assert_eq!(data.cache().snapshot(&keys::events()).status, QueryStatus::Stale);
}

#[tokio::test]
async fn donating_invalidates_every_donation_view() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/donations"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"insertedId": "d9"})))
        .expect(1)
        .mount(&server)
        .await;

    let data = signed_in(&server);
    for key in [
        keys::donations(),
        keys::my_donations("rin@planet.care"),
        keys::donor_wall(),
        keys::events(),
    ] {
        data.cache().set_data(&key, json!([]));
    }

    let donation = NewDonation {
        donor_email: "rin@planet.care".into(),
        donor_name: Some("Rin".into()),
        amount: 250.0,
        message: None,
    };
    data.donate(&donation).await.unwrap();

    let cache = data.cache();
    assert_eq!(cache.snapshot(&keys::donations()).status, QueryStatus::Stale);
    assert_eq!(
        cache.snapshot(&keys::my_donations("rin@planet.care")).status,
        QueryStatus::Stale
    );
    assert_eq!(cache.snapshot(&keys::donor_wall()).status, QueryStatus::Stale);
    assert_eq!(cache.snapshot(&keys::events()).status, QueryStatus::Fresh);
}

#[tokio::test]
async fn refetch_bypasses_a_fresh_entry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/donations/public/wall"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server)
        .await;

    let data = data_client(&server);
    let query = queries::donor_wall();
    data.read(&query, ReadOptions::default()).await;
    data.read(&query, ReadOptions::default()).await;
    let state = data.refetch(&query).await;

    assert_eq!(state.status, QueryStatus::Fresh);
}
