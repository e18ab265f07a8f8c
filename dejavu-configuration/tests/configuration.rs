use std::time::Duration;

use dejavu::{Decision, MAX_TTL, RequestDescriptor, RuleError};
use dejavu_configuration::{
    Backend, BodyOperation, ConfigError, DedupConfig, MethodOperation, Moka, RouteOperation,
    RuleConfig,
};
use http::Method;
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn test_yaml_deserialize() {
    let yaml = r#"
marker: true
ttl: 500ms
backend:
  type: Moka
  max_capacity: 10000
  label: dedup
rules:
  - method: get
    route: /home
  - method: "*"
    route:
      pattern: "users|guest"
"#;

    let config = DedupConfig::from_yaml(yaml).expect("failed to deserialize");

    assert_eq!(
        config,
        DedupConfig {
            marker: true,
            ttl: Duration::from_millis(500),
            backend: Backend::Moka(Moka {
                max_capacity: 10000,
                label: Some("dedup".to_owned()),
            }),
            rules: vec![
                RuleConfig {
                    method: Some(MethodOperation::Single("get".to_owned())),
                    route: Some(RouteOperation::Exact("/home".to_owned())),
                    body: None,
                },
                RuleConfig {
                    method: Some(MethodOperation::Single("*".to_owned())),
                    route: Some(RouteOperation::Pattern {
                        pattern: "users|guest".to_owned()
                    }),
                    body: None,
                },
            ],
        }
    );
}

#[test]
fn test_defaults() {
    let config = DedupConfig::from_yaml("rules: []\n").expect("failed to deserialize");
    assert_eq!(config, DedupConfig::default());
    assert_eq!(config.ttl, Duration::from_secs(60));
    assert!(!config.marker);
}

#[test]
fn test_json_deserialize() {
    let json = r#"{
        "ttl": "2m",
        "rules": [{ "method": "post", "route": true, "body": { "id": true } }]
    }"#;

    let config = DedupConfig::from_json(json).expect("failed to deserialize");

    assert_eq!(config.ttl, Duration::from_secs(120));
    assert!(matches!(
        config.rules[0].body,
        Some(BodyOperation::Shape(ref fields)) if fields.get("id") == Some(&json!(true))
    ));
}

#[test]
fn test_unknown_field_rejected() {
    let error = DedupConfig::from_yaml("rulez: []\n").unwrap_err();
    assert!(matches!(error, ConfigError::Yaml(_)));
}

#[test]
fn test_invalid_rule_reports_index() {
    let yaml = r#"
rules:
  - route: /ok
  - method: get
  - method: [get, post]
"#;

    let error = DedupConfig::from_yaml(yaml)
        .expect("failed to deserialize")
        .into_config()
        .unwrap_err();

    match error {
        ConfigError::InvalidRule { index, source } => {
            assert_eq!(index, 2);
            assert!(matches!(source, RuleError::UnsupportedMatcher { .. }));
        }
        other => panic!("expected invalid rule, got {other:?}"),
    }
}

#[test]
fn test_invalid_pattern_reports_index() {
    let yaml = r#"
rules:
  - route:
      pattern: "(unclosed"
"#;

    let error = DedupConfig::from_yaml(yaml)
        .expect("failed to deserialize")
        .into_config()
        .unwrap_err();

    assert!(error.to_string().starts_with("invalid rule #0: invalid route pattern"));
}

#[test]
fn test_zero_ttl_rejected() {
    let error = DedupConfig::from_yaml("ttl: 0s\n")
        .expect("failed to deserialize")
        .into_config()
        .unwrap_err();
    assert!(matches!(error, ConfigError::ZeroTtl));
}

#[test]
fn test_ttl_above_maximum_rejected() {
    let error = DedupConfig::from_yaml("ttl: 400000years
")
        .expect("failed to deserialize")
        .into_config()
        .unwrap_err();
    assert!(matches!(error, ConfigError::TtlTooLong { max, .. } if max == MAX_TTL));

    let config = DedupConfig::from_yaml("ttl: 100years
")
        .expect("failed to deserialize")
        .into_config()
        .expect("long ttl below the maximum is accepted");
    assert!(config.ttl() <= MAX_TTL);
}

#[tokio::test]
async fn test_into_deduplicator() {
    let yaml = r#"
rules:
  - method: get
    route: /home
  - method: "*"
    route: /update/user
    body:
      id: true
      name: "Mimì"
"#;

    let dedup = DedupConfig::from_yaml(yaml)
        .expect("failed to deserialize")
        .into_deduplicator()
        .expect("failed to build deduplicator");

    let home = RequestDescriptor::new(Method::GET, "/home", None);
    assert!(!dedup.process(&home).await.unwrap().duplicate);
    assert!(dedup.process(&home).await.unwrap().duplicate);

    let mimi = RequestDescriptor::new(
        Method::POST,
        "/update/user",
        Some(json!({"id": 8, "name": "Mimì"})),
    );
    assert!(!dedup.process(&mimi).await.unwrap().duplicate);
    assert!(dedup.process(&mimi).await.unwrap().duplicate);

    let id_only = RequestDescriptor::new(Method::POST, "/update/user", Some(json!({"id": 8})));
    assert_eq!(dedup.process(&id_only).await.unwrap(), Decision::UNMATCHED);

    let other = RequestDescriptor::new(Method::GET, "/other-path", None);
    assert_eq!(dedup.process(&other).await.unwrap(), Decision::UNMATCHED);
}
