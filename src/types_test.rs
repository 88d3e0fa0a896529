// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for types module

use super::types::*;
use crate::config::Config;
use crate::resolver::ResolveError;
use crate::serial::SerialError;
use crate::zones::ZoneError;
use axum::body::to_bytes;
use axum::http::StatusCode;
use axum::response::IntoResponse;

async fn body_json(error: ApiError) -> (StatusCode, serde_json::Value) {
    let response = error.into_response();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[test]
fn test_app_state_clone() {
    let mut config = Config::default();
    config.domain = "zig.zag".to_string();
    config.updater.params.zone_file = "/test/dir/zig.zag.zone".into();

    let state = AppState::new(config);
    let cloned = state.clone();

    assert_eq!(cloned.config.domain, "zig.zag");
    assert_eq!(cloned.updater.domain(), "zig.zag");
    assert_eq!(
        cloned.updater.zone_file(),
        std::path::Path::new("/test/dir/zig.zag.zone")
    );
}

#[test]
fn test_error_response_serialization() {
    let response = ErrorResponse {
        error: "Test error".to_string(),
        details: Some("Details here".to_string()),
    };

    let json = serde_json::to_string(&response).unwrap();
    assert!(json.contains("Test error"));
    assert!(json.contains("Details here"));
}

#[test]
fn test_error_response_without_details() {
    let response = ErrorResponse {
        error: "Test error".to_string(),
        details: None,
    };

    let json = serde_json::to_string(&response).unwrap();
    assert_eq!(json, r#"{"error":"Test error"}"#);
}

#[tokio::test]
async fn test_api_error_invalid_hostname() {
    let (status, body) = body_json(ApiError::InvalidHostname).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        serde_json::json!({ "error": "missing or invalid hostname" })
    );
}

#[tokio::test]
async fn test_api_error_no_address() {
    let (status, body) = body_json(ApiError::NoAddress).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, serde_json::json!({ "error": "no valid ip address" }));
}

#[tokio::test]
async fn test_api_error_zone_file_error() {
    let error = ApiError::ZoneFileError("permission denied".to_string());
    assert_eq!(error.to_string(), "Zone file error: permission denied");

    let (status, body) = body_json(error).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "zone file error");
    assert_eq!(body["details"], "permission denied");
}

#[tokio::test]
async fn test_api_error_internal_error() {
    let (status, body) = body_json(ApiError::InternalError("boom".to_string())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal server error");
}

#[test]
fn test_api_error_from_resolve_error() {
    assert!(matches!(
        ApiError::from(ResolveError::InvalidHostname),
        ApiError::InvalidHostname
    ));
    assert!(matches!(
        ApiError::from(ResolveError::NoAddress),
        ApiError::NoAddress
    ));
}

#[test]
fn test_api_error_from_zone_error() {
    let io = ZoneError::Io {
        path: "/zones/zig.zag.zone".to_string(),
        source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
    };
    match ApiError::from(io) {
        ApiError::ZoneFileError(details) => assert!(details.contains("/zones/zig.zag.zone")),
        other => panic!("unexpected error: {:?}", other),
    }

    assert!(matches!(
        ApiError::from(ZoneError::MissingSoa("zig.zag.".to_string())),
        ApiError::ZoneIntegrityError(_)
    ));

    assert!(matches!(
        ApiError::from(ZoneError::Serial(SerialError::OutOfRange("x".to_string()))),
        ApiError::InternalError(_)
    ));
}

#[tokio::test]
async fn test_api_error_zone_integrity_status() {
    let error = ApiError::from(ZoneError::MissingSoa("zig.zag.".to_string()));
    let (status, body) = body_json(error).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["details"].as_str().unwrap().contains("no SOA record"));
}
