//! Integration tests for the request gateway using a wiremock fixture API.

use core::time::Duration;
use gyre::crawl::{Client, Gateway, Governor, RunStats, UserId};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Build a gateway pointed at the fixture server, with a short cooldown.
fn gateway_for(uri: &str) -> (Gateway, Arc<RunStats>, Arc<Governor>) {
    let client = Client::new(None, uri).expect("client builds");
    let governor = Governor::new(Duration::from_millis(25));
    let stats = Arc::new(RunStats::default());
    let gateway = Gateway::new(client, Arc::clone(&governor), Arc::clone(&stats));
    (gateway, stats, governor)
}

fn profile_json(id: &str, name: &str, tweets: u64) -> serde_json::Value {
    json!({
        "id_str": id,
        "screen_name": name,
        "friends_count": 1,
        "followers_count": 1,
        "statuses_count": tweets,
        "favourites_count": 0,
        "protected": false
    })
}

#[tokio::test]
async fn rate_limit_is_transparent_to_the_caller() {
    let server = MockServer::start().await;

    // First attempt is rate limited; the retry succeeds.
    Mock::given(method("GET"))
        .and(path("/users/show.json"))
        .and(query_param("screen_name", "alice"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/show.json"))
        .and(query_param("screen_name", "alice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json("1", "alice", 50)))
        .mount(&server)
        .await;

    let (gateway, stats, governor) = gateway_for(&server.uri());

    let profile = gateway.user_by_name("alice").await.expect("call succeeds").expect("profile present");
    assert_eq!(profile.screen_name, "alice");

    // Two attempts were issued, but only the clean one counts as
    // outside-cooldown, and the call resolved exactly once.
    assert_eq!(stats.issued(), 2);
    assert_eq!(stats.without_cooldown(), 1);
    assert_eq!(stats.resolved(), 1);
    assert_eq!(governor.cooldowns_started(), 1);
}

#[tokio::test]
async fn restricted_single_lookup_resolves_to_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/show.json"))
        .and(query_param("user_id", "9"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let (gateway, stats, _) = gateway_for(&server.uri());

    let profile = gateway.user_by_id(&UserId::new("9")).await.expect("call succeeds");
    assert!(profile.is_none());
    assert_eq!(stats.resolved(), 1);
}

#[tokio::test]
async fn restricted_batch_is_split_into_singles() {
    let server = MockServer::start().await;

    // The whole batch is poisoned by one restricted member.
    Mock::given(method("GET"))
        .and(path("/users/lookup.json"))
        .and(query_param("user_id", "1,2,3,4,5"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    for id in ["1", "2", "4", "5"] {
        Mock::given(method("GET"))
            .and(path("/users/lookup.json"))
            .and(query_param("user_id", id))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([profile_json(id, &format!("user{id}"), 10)])))
            .mount(&server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path("/users/lookup.json"))
        .and(query_param("user_id", "3"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let (gateway, _, _) = gateway_for(&server.uri());

    let ids: Vec<UserId> = ["1", "2", "3", "4", "5"].iter().map(UserId::new).collect();
    let profiles = gateway.users_by_ids(&ids).await.expect("call succeeds");

    let names: Vec<&str> = profiles.iter().map(|p| p.screen_name.as_str()).collect();
    assert_eq!(names, vec!["user1", "user2", "user4", "user5"]);
}

#[tokio::test]
async fn batches_are_chunked_at_the_api_boundary() {
    let server = MockServer::start().await;

    let ids: Vec<UserId> = (1..=150).map(|i| UserId::new(i.to_string())).collect();
    let first_chunk = (1..=99).map(|i| i.to_string()).collect::<Vec<_>>().join(",");
    let second_chunk = (100..=150).map(|i| i.to_string()).collect::<Vec<_>>().join(",");

    Mock::given(method("GET"))
        .and(path("/users/lookup.json"))
        .and(query_param("user_id", first_chunk.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([profile_json("1", "first", 10)])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/lookup.json"))
        .and(query_param("user_id", second_chunk.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([profile_json("100", "second", 10)])))
        .mount(&server)
        .await;

    let (gateway, stats, _) = gateway_for(&server.uri());

    let profiles = gateway.users_by_ids(&ids).await.expect("call succeeds");
    assert_eq!(profiles.len(), 2);
    assert_eq!(stats.issued(), 2);
}

#[tokio::test]
async fn vanished_resource_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/show.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (gateway, _, _) = gateway_for(&server.uri());
    assert!(gateway.user_by_name("ghost").await.is_err());
}

#[tokio::test]
async fn unclassified_failure_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/show.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (gateway, _, _) = gateway_for(&server.uri());
    assert!(gateway.user_by_name("flaky").await.is_err());
}
