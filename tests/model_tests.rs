use adboard::models::{
    Ad, AdResponse, CreateAdRequest, CreateResponseRequest, UpdateAdRequest, User,
};
use chrono::{TimeZone, Utc};

// --- Wire Shape Tests ---

#[test]
fn test_ad_serializes_camel_case_keys() {
    let ad = Ad {
        id: 5,
        title: "Bike".to_string(),
        description: None,
        price: Some(120.0),
        category_id: Some(2),
        author_id: 7,
        created_at: Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap(),
    };

    let json = serde_json::to_value(&ad).unwrap();

    assert_eq!(json["categoryId"], 2);
    assert_eq!(json["authorId"], 7);
    assert!(json.get("createdAt").is_some());
    // No snake_case leftovers on the wire.
    assert!(json.get("category_id").is_none());
    assert!(json.get("author_id").is_none());
}

#[test]
fn test_response_serializes_camel_case_keys() {
    let response = AdResponse {
        id: 3,
        ad_id: 5,
        user_id: 7,
        message: "Still available?".to_string(),
    };

    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["adId"], 5);
    assert_eq!(json["userId"], 7);
}

#[test]
fn test_user_password_never_serialized() {
    let user = User {
        id: 1,
        email: "alice@example.com".to_string(),
        name: Some("Alice".to_string()),
        password: "$argon2id$secret-hash".to_string(),
        role: "USER".to_string(),
    };

    let json = serde_json::to_string(&user).unwrap();

    assert!(!json.contains("password"));
    assert!(!json.contains("secret-hash"));
}

// --- Payload Deserialization Tests ---

#[test]
fn test_create_ad_request_ignores_smuggled_author() {
    // authorId in the body has no matching field; the caller's identity is
    // the only author an ad can get.
    let payload: CreateAdRequest =
        serde_json::from_str(r#"{"title": "Bike", "authorId": 999}"#).unwrap();

    assert_eq!(payload.title.as_deref(), Some("Bike"));
    assert!(payload.category_id.is_none());
}

#[test]
fn test_create_ad_request_tolerates_missing_fields() {
    // Required-field enforcement lives in the handler, which turns a None
    // into a 400 with a descriptive message.
    let payload: CreateAdRequest = serde_json::from_str("{}").unwrap();

    assert!(payload.title.is_none());
    assert!(payload.price.is_none());
}

#[test]
fn test_update_ad_request_distinguishes_absent_fields() {
    let payload: UpdateAdRequest =
        serde_json::from_str(r#"{"price": 75.0, "categoryId": 2}"#).unwrap();

    assert_eq!(payload.price, Some(75.0));
    assert_eq!(payload.category_id, Some(2));
    // Absent means "leave unchanged", and it stays absent when re-serialized.
    assert!(payload.title.is_none());
    let json = serde_json::to_value(&payload).unwrap();
    assert!(json.get("title").is_none());
}

#[test]
fn test_create_response_request_reads_camel_case() {
    let payload: CreateResponseRequest =
        serde_json::from_str(r#"{"adId": 5, "message": "Still available?"}"#).unwrap();

    assert_eq!(payload.ad_id, Some(5));
    assert_eq!(payload.message.as_deref(), Some("Still available?"));
}
