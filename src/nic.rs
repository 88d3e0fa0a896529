// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Dynamic DNS update endpoint
//!
//! Implements the `GET /nic/update` protocol used by dyndns2-style clients:
//!
//! ```text
//! GET /nic/update?hostname=home.dyn.example.com&myip=198.51.100.7&myip6=2001:db8::7
//! ```
//!
//! When neither `myip` nor `myip6` carries a valid address, the client
//! address is taken from `X-Forwarded-For` or the connection itself.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Query, Request, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::{
    resolver,
    types::{ApiError, AppState, ErrorResponse},
};

/// Successful update response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResponse {
    pub success: bool,
    /// Fully-qualified hostname that was updated
    pub hostname: String,
    /// IPv4 address now published, if one was part of the update
    pub ip4: Option<String>,
    /// IPv6 address now published, if one was part of the update
    pub ip6: Option<String>,
    /// SOA serial after the update
    pub serial: u32,
    /// False when the serial could not be advanced
    pub serial_advanced: bool,
    /// True when the zone file was created by this update
    pub created: bool,
}

/// Update a hostname's addresses
#[utoipa::path(
    get,
    path = "/nic/update",
    params(
        ("hostname" = String, Query, description = "Hostname to update, under the managed domain"),
        ("myip" = Option<String>, Query, description = "New IPv4 address"),
        ("myip6" = Option<String>, Query, description = "New IPv6 address")
    ),
    responses(
        (status = 200, description = "Zone updated", body = UpdateResponse),
        (status = 400, description = "Missing or invalid hostname, or no usable address", body = ErrorResponse),
        (status = 500, description = "Zone file could not be updated", body = ErrorResponse)
    ),
    tag = "nic"
)]
pub async fn update_zone(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
    request: Request,
) -> Result<Json<UpdateResponse>, ApiError> {
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    debug!("update request from {:?}: {:?}", remote, params);

    let update = resolver::resolve(&params, request.headers(), remote, &state.config.domain)
        .map_err(|e| {
            warn!("rejecting update request from {:?}: {}", remote, e);
            ApiError::from(e)
        })?;

    info!(
        hostname = %update.hostname,
        "updating {} (ip4: {:?}, ip6: {:?})",
        update.hostname,
        update.ip4,
        update.ip6
    );

    let outcome = state.updater.apply(&update).await?;

    Ok(Json(UpdateResponse {
        success: true,
        hostname: update.hostname,
        ip4: update.ip4.map(|ip| ip.to_string()),
        ip6: update.ip6.map(|ip| ip.to_string()),
        serial: outcome.serial,
        serial_advanced: outcome.serial_advanced,
        created: outcome.created,
    }))
}
