use std::time::Duration;

use dejavu::{
    BodyMatcher, BodyShape, Config, Decision, Deduplicator, MethodMatcher, RequestDescriptor,
    RouteMatcher, Rule,
};
use dejavu_backend::mock::MockBackend;
use http::Method;
use serde_json::{Value, json};

fn home_config(ttl: Duration) -> Config {
    Config::builder()
        .rule(
            Rule::new()
                .method("get".parse::<MethodMatcher>().unwrap())
                .route(RouteMatcher::exact("/home")),
        )
        .ttl(ttl)
        .marker(true)
        .build()
}

fn get(path: &str) -> RequestDescriptor {
    RequestDescriptor::new(Method::GET, path, None)
}

fn post(path: &str, body: Value) -> RequestDescriptor {
    RequestDescriptor::new(Method::POST, path, Some(body))
}

#[tokio::test]
async fn test_home_scenario() {
    let dedup = Deduplicator::new(home_config(Duration::from_millis(60_000)));

    let first = dedup.process(&get("/home")).await.unwrap();
    assert_eq!(
        first,
        Decision {
            matched: true,
            duplicate: false
        }
    );

    let second = dedup.process(&get("/home")).await.unwrap();
    assert_eq!(
        second,
        Decision {
            matched: true,
            duplicate: true
        }
    );

    let other = dedup.process(&get("/other-path")).await.unwrap();
    assert_eq!(other, Decision::UNMATCHED);
}

#[tokio::test]
async fn test_duplicate_window_expires() {
    let dedup =
        Deduplicator::with_backend(home_config(Duration::from_millis(50)), MockBackend::new());

    assert!(!dedup.process(&get("/home")).await.unwrap().duplicate);
    assert!(dedup.process(&get("/home")).await.unwrap().duplicate);

    tokio::time::sleep(Duration::from_millis(120)).await;

    assert!(!dedup.process(&get("/home")).await.unwrap().duplicate);
    assert!(dedup.process(&get("/home")).await.unwrap().duplicate);
}

#[tokio::test]
async fn test_duplicate_window_expires_with_moka() {
    let dedup = Deduplicator::new(home_config(Duration::from_millis(50)));

    assert!(!dedup.process(&get("/home")).await.unwrap().duplicate);
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert!(!dedup.process(&get("/home")).await.unwrap().duplicate);
}

#[tokio::test]
async fn test_repeats_extend_the_window() {
    let dedup =
        Deduplicator::with_backend(home_config(Duration::from_millis(150)), MockBackend::new());

    assert!(!dedup.process(&get("/home")).await.unwrap().duplicate);
    for _ in 0..3 {
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(dedup.process(&get("/home")).await.unwrap().duplicate);
    }
}

#[tokio::test]
async fn test_unmatched_requests_do_not_touch_store() {
    let backend = MockBackend::new();
    let dedup = Deduplicator::with_backend(home_config(Duration::from_secs(60)), backend.clone());

    for request in [
        get("/other-path"),
        get("/home?x=1"),
        RequestDescriptor::new(Method::POST, "/home", None),
    ] {
        assert_eq!(dedup.process(&request).await.unwrap(), Decision::UNMATCHED);
    }

    assert_eq!(backend.call_count(), 0);
    assert_eq!(backend.entry_count(), 0);
}

#[tokio::test]
async fn test_empty_rule_set_does_not_touch_store() {
    let backend = MockBackend::new();
    let dedup = Deduplicator::with_backend(Config::default(), backend.clone());

    assert_eq!(
        dedup.process(&get("/home")).await.unwrap(),
        Decision::UNMATCHED
    );
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_matched_request_reads_and_writes_once() {
    let backend = MockBackend::new();
    let dedup = Deduplicator::with_backend(home_config(Duration::from_secs(60)), backend.clone());

    dedup.process(&get("/home")).await.unwrap();
    assert_eq!(backend.counters().read_count(), 1);
    assert_eq!(backend.counters().write_count(), 1);

    dedup.process(&get("/home")).await.unwrap();
    assert_eq!(backend.counters().read_count(), 2);
    assert_eq!(backend.counters().read_hit_count(), 1);
    assert_eq!(backend.counters().write_count(), 2);
}

#[tokio::test]
async fn test_body_fingerprints_are_independent() {
    let config = Config::builder()
        .rule(
            Rule::new()
                .method(MethodMatcher::Any)
                .route(RouteMatcher::Any)
                .body(BodyMatcher::Any),
        )
        .build();
    let dedup = Deduplicator::with_backend(config, MockBackend::new());

    let id_only = json!({"id": 11});
    let id_and_name = json!({"id": 11, "name": "Alice"});

    assert!(!dedup.process(&post("/update", id_only.clone())).await.unwrap().duplicate);
    assert!(!dedup.process(&post("/update", id_and_name.clone())).await.unwrap().duplicate);
    assert!(dedup.process(&post("/update", id_only)).await.unwrap().duplicate);
    assert!(dedup.process(&post("/update", id_and_name)).await.unwrap().duplicate);
}

#[tokio::test]
async fn test_shape_rule_deduplicates_on_inspected_fields() {
    let config = Config::builder()
        .rule(
            Rule::new()
                .method(MethodMatcher::Any)
                .route(RouteMatcher::exact("/update/user"))
                .body(BodyShape::new().present("id")),
        )
        .build();
    let dedup = Deduplicator::with_backend(config, MockBackend::new());

    assert!(!dedup.process(&post("/update/user", json!({"id": 9}))).await.unwrap().duplicate);
    assert!(dedup.process(&post("/update/user", json!({"id": 9}))).await.unwrap().duplicate);
    assert!(!dedup.process(&post("/update/user", json!({"id": 10}))).await.unwrap().duplicate);

    let unmatched = dedup
        .process(&post("/update/user", json!({"name": "Alice"})))
        .await
        .unwrap();
    assert_eq!(unmatched, Decision::UNMATCHED);
}

#[tokio::test]
async fn test_store_unavailable_is_surfaced() {
    let backend = MockBackend::new();
    let dedup = Deduplicator::with_backend(home_config(Duration::from_secs(60)), backend.clone());
    backend.set_unavailable(true);

    let error = dedup.process(&get("/home")).await.unwrap_err();
    assert!(error.is_store_unavailable());
    // A failed read is not followed by a write.
    assert_eq!(backend.counters().write_count(), 0);

    backend.set_unavailable(false);
    assert!(!dedup.process(&get("/home")).await.unwrap().duplicate);
}

#[tokio::test]
async fn test_out_of_range_ttl_is_a_store_error() {
    let ttl = Duration::from_secs(10_000_000_000_000);
    let with_mock = Deduplicator::with_backend(home_config(ttl), MockBackend::new());
    let error = with_mock.process(&get("/home")).await.unwrap_err();
    assert!(!error.is_store_unavailable());

    let with_moka = Deduplicator::new(home_config(ttl));
    assert!(with_moka.process(&get("/home")).await.is_err());
    assert_eq!(with_moka.backend().entry_count(), 0);
}

#[tokio::test]
async fn test_failing_predicate_falls_through_to_next_rule() {
    let backend = MockBackend::new();
    let config = Config::builder()
        .rule(Rule::new().route(RouteMatcher::try_predicate(|_| {
            Err::<bool, _>("lookup table missing")
        })))
        .rule(Rule::new().route(RouteMatcher::exact("/home")))
        .build();
    let dedup = Deduplicator::with_backend(config, backend.clone());

    let decision = dedup.process(&get("/home")).await.unwrap();
    assert!(decision.matched);
    assert_eq!(backend.call_count(), 2);
}

#[tokio::test]
async fn test_concurrent_requests_share_state() {
    let dedup = Deduplicator::new(home_config(Duration::from_secs(60)));
    dedup.process(&get("/home")).await.unwrap();

    let tasks = (0..16).map(|_| {
        let dedup = dedup.clone();
        tokio::spawn(async move { dedup.process(&get("/home")).await })
    });

    for result in futures::future::join_all(tasks).await {
        assert!(result.unwrap().unwrap().duplicate);
    }
}
