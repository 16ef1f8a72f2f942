use super::*;

fn payload(identity: serde_json::Value) -> serde_json::Value {
    let mut value = serde_json::json!({
        "title": "Standup",
        "date": "2024-01-01",
        "time": "09:00",
        "category": "Work",
        "archived": false,
        "createdAt": "2024-01-01T08:00:00Z",
        "updatedAt": "2024-01-01T08:00:00Z",
    });
    let object = value.as_object_mut().expect("object");
    for (key, id) in identity.as_object().expect("identity object") {
        object.insert(key.clone(), id.clone());
    }
    value
}

#[test]
fn decodes_legacy_underscore_identity_into_id() {
    let event: Event =
        serde_json::from_value(payload(serde_json::json!({ "_id": "abc" }))).expect("event");
    assert_eq!(event.id, EventId::from("abc"));
    assert_eq!(event.category, Category::Work);
}

#[test]
fn prefers_canonical_id_when_both_aliases_present() {
    let event: Event = serde_json::from_value(payload(
        serde_json::json!({ "_id": "legacy", "id": "canonical" }),
    ))
    .expect("event");
    assert_eq!(event.id.as_str(), "canonical");
}

#[test]
fn rejects_payload_without_identity() {
    let err = serde_json::from_value::<Event>(payload(serde_json::json!({})))
        .expect_err("identity is required");
    assert!(err.to_string().contains("neither"), "unexpected error: {err}");
}

#[test]
fn missing_date_and_time_decode_as_empty_strings() {
    let mut value = payload(serde_json::json!({ "id": "x" }));
    let object = value.as_object_mut().expect("object");
    object.remove("date");
    object.remove("time");
    let event: Event = serde_json::from_value(value).expect("event");
    assert!(event.date.is_empty());
    assert!(event.time.is_empty());
}

#[test]
fn serializes_with_camel_case_and_canonical_id() {
    let event: Event =
        serde_json::from_value(payload(serde_json::json!({ "_id": "abc" }))).expect("event");
    let value = serde_json::to_value(&event).expect("json");
    assert_eq!(value["id"], "abc");
    assert!(value.get("_id").is_none());
    assert!(value.get("createdAt").is_some());
    assert!(value.get("notes").is_none());
}

#[test]
fn category_parses_case_insensitively() {
    assert_eq!("personal".parse::<Category>(), Ok(Category::Personal));
    let err = "Leisure".parse::<Category>().expect_err("unknown");
    assert_eq!(err.to_string(), "unknown event category 'Leisure'");
}
