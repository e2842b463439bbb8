use super::*;

#[test]
fn test_page_request_default() {
    let request = PageRequest::default();
    assert_eq!(request.skip, 0);
    assert_eq!(request.limit, 100);
}

#[test]
fn test_page_request_offset() {
    let request = PageRequest { skip: 40, limit: 20 };
    assert_eq!(request.offset(), 40);
}

#[test]
fn test_page_request_limit_is_clamped() {
    assert_eq!(PageRequest { skip: 0, limit: 0 }.limit(), 1);
    assert_eq!(PageRequest { skip: 0, limit: 50 }.limit(), 50);
    assert_eq!(PageRequest { skip: 0, limit: 10_000 }.limit(), MAX_LIMIT);
}

#[test]
fn test_page_request_deserializes_with_defaults() {
    let request: PageRequest = serde_json::from_str(r#"{"skip": 5}"#).unwrap();
    assert_eq!(request.skip, 5);
    assert_eq!(request.limit, 100);
}

#[test]
fn test_list_response_shape() {
    let response = ListResponse::new(vec![1, 2, 3], 42);
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["count"], 42);
    assert_eq!(json["data"].as_array().unwrap().len(), 3);
}
