use super::*;
use std::str::FromStr;
use uuid::Uuid;

#[test]
fn test_typed_id_from_uuid() {
    let uuid = Uuid::new_v4();
    let id = CustomerId::from_uuid(uuid);
    assert_eq!(id.into_inner(), uuid);
    assert_eq!(id.to_string(), uuid.to_string());
}

#[test]
fn test_typed_id_from_str() {
    let uuid = Uuid::new_v4();
    let id = CustomerId::from_str(&uuid.to_string()).unwrap();
    assert_eq!(id.0, uuid);
    assert!(CustomerId::from_str("not-a-uuid").is_err());
}

#[test]
fn test_key_id_round_trips_through_json() {
    let id = ProductId::new("FILM-001");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"FILM-001\"");
    let back: ProductId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
}

#[test]
fn test_key_id_display_and_conversions() {
    let id = OrderId::from("202501030007");
    assert_eq!(id.to_string(), "202501030007");
    assert_eq!(id.as_str(), "202501030007");
    assert_eq!(id.into_inner(), "202501030007".to_string());
}
