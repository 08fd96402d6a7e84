use super::*;
use crate::test_support::test_state;

#[test]
fn test_default_config() {
    let config = ApiConfig::default();
    assert_eq!(config.port, DEFAULT_PORT);
    assert_eq!(config.host, "0.0.0.0");
}

#[test]
fn test_config_from_service_config() {
    let service_config = ServiceConfig::from_lookup(|name| match name {
        "MIGRATOR_SECRET" => Some("s3cret".to_string()),
        "GITHUB_TOKEN" => Some("ghp_token".to_string()),
        "API_HOST" => Some("127.0.0.1".to_string()),
        "API_PORT" => Some("9090".to_string()),
        _ => None,
    })
    .unwrap();

    let config = ApiConfig::from(&service_config);

    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.port, 9090);
}

#[test]
fn test_server_creation() {
    let server = ApiServer::new(ApiConfig::default(), test_state());
    let _router = server.router();
}

#[tokio::test]
async fn test_serve_rejects_invalid_host() {
    let config = ApiConfig {
        port: 0,
        host: "not-an-address".to_string(),
    };

    let result = ApiServer::new(config, test_state()).serve().await;

    assert!(result.is_err());
}

#[test]
fn test_socket_addr() {
    let config = ApiConfig {
        port: 8081,
        host: "127.0.0.1".to_string(),
    };

    assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:8081");
}
