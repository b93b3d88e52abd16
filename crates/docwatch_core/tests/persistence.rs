use chrono::{TimeZone, Utc};
use docwatch_core::{OwnerId, RequestStatus, Token, TrackingRequest};

#[test]
fn persisted_request_keeps_creation_time() {
    let created_at = Utc.with_ymd_and_hms(2023, 11, 5, 17, 45, 12).unwrap();
    let request = TrackingRequest::pending(OwnerId(7), Token::new("555").unwrap(), created_at);

    let text = ron::to_string(&request).unwrap();
    let restored: TrackingRequest = ron::from_str(&text).unwrap();

    assert_eq!(restored.created_at, created_at);
    assert_eq!(restored.owner, OwnerId(7));
    assert_eq!(restored.token.as_str(), "555");
}

#[test]
fn missing_status_defaults_to_pending() {
    let text = r#"(owner: 3, token: " 42 ", created_at: "2024-01-01T00:00:00Z")"#;
    let restored: TrackingRequest = ron::from_str(text).unwrap();
    assert_eq!(restored.status, RequestStatus::Pending);
    assert_eq!(restored.token.as_str(), "42");
}

#[test]
fn empty_persisted_token_is_rejected() {
    let text = r#"(owner: 3, token: "  ", created_at: "2024-01-01T00:00:00Z")"#;
    assert!(ron::from_str::<TrackingRequest>(text).is_err());
}
