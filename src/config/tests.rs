use super::*;

#[test]
fn test_defaults() {
    let config = GatewayConfig::default();
    assert_eq!(config.connect_timeout_secs, 8);
    assert_eq!(config.max_page_size, 200);
    assert_eq!(config.export_page_size, 1000);
    assert_eq!(config.export_max_pages, 5000);
    assert_eq!(config.query_row_cap, 500);
    assert!(config.validate().is_ok());
}

#[test]
fn test_partial_json_keeps_defaults() {
    let config = GatewayConfig::from_json_str(r#"{"queryRowCap": 100, "connectTimeoutSecs": 3}"#)
        .unwrap();
    assert_eq!(config.query_row_cap, 100);
    assert_eq!(config.connect_timeout(), Duration::from_secs(3));
    assert_eq!(config.default_page_size, 25);
}

#[test]
fn test_rejects_default_page_above_max() {
    let err = GatewayConfig::from_json_str(r#"{"defaultPageSize": 300}"#).unwrap_err();
    assert_eq!(err.kind(), crate::error::ErrorKind::InvalidInput);
}

#[test]
fn test_rejects_max_page_above_ceiling() {
    let err = GatewayConfig::from_json_str(r#"{"maxPageSize": 500}"#).unwrap_err();
    assert_eq!(err.kind(), crate::error::ErrorKind::InvalidInput);
    assert!(err.detail().contains("200"));

    let config = GatewayConfig::from_json_str(r#"{"maxPageSize": 200, "defaultPageSize": 200}"#)
        .unwrap();
    assert_eq!(config.max_page_size, PAGE_SIZE_CEILING);
}

#[test]
fn test_rejects_malformed_json() {
    assert!(GatewayConfig::from_json_str("{not json").is_err());
}

#[test]
fn test_missing_file_uses_defaults() {
    let path = std::env::temp_dir().join(format!("rowgate-missing-{}.json", uuid::Uuid::new_v4()));
    let config = GatewayConfig::load_from_path(&path).unwrap();
    assert_eq!(config, GatewayConfig::default());
}

#[test]
fn test_load_from_file() {
    let path = std::env::temp_dir().join(format!("rowgate-config-{}.json", uuid::Uuid::new_v4()));
    std::fs::write(&path, r#"{"exportPageSize": 250}"#).unwrap();
    let config = GatewayConfig::load_from_path(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(config.export_page_size, 250);
}
