// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common types and errors used throughout dyndnsd

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{config::Config, resolver::ResolveError, updater::ZoneFileUpdater, zones::ZoneError};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<Config>,
    /// Updater for the managed zone file
    pub updater: Arc<ZoneFileUpdater>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let updater = ZoneFileUpdater::new(&config.domain, config.updater.params.clone());
        Self {
            config: Arc::new(config),
            updater: Arc::new(updater),
        }
    }
}

/// Error response
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("missing or invalid hostname")]
    InvalidHostname,

    #[error("no valid ip address")]
    NoAddress,

    #[error("Zone file error: {0}")]
    ZoneFileError(String),

    #[error("Zone integrity error: {0}")]
    ZoneIntegrityError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl From<ResolveError> for ApiError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::InvalidHostname => ApiError::InvalidHostname,
            ResolveError::NoAddress => ApiError::NoAddress,
        }
    }
}

impl From<ZoneError> for ApiError {
    fn from(e: ZoneError) -> Self {
        match e {
            ZoneError::Io { .. } => ApiError::ZoneFileError(e.to_string()),
            ZoneError::MissingSoa(_) => ApiError::ZoneIntegrityError(e.to_string()),
            ZoneError::Serial(_) => ApiError::InternalError(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = match self {
            err @ (ApiError::InvalidHostname | ApiError::NoAddress) => {
                (StatusCode::BAD_REQUEST, err.to_string(), None)
            }
            ApiError::ZoneFileError(details) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "zone file error".to_string(),
                Some(details),
            ),
            ApiError::ZoneIntegrityError(details) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "zone integrity error".to_string(),
                Some(details),
            ),
            ApiError::InternalError(details) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
                Some(details),
            ),
        };

        let body = Json(ErrorResponse {
            error: error_message,
            details,
        });

        (status, body).into_response()
    }
}
