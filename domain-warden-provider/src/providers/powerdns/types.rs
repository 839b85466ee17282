//! PowerDNS request/response bodies

use serde::{Deserialize, Serialize};

use crate::types::{RrsetChange, ZoneKind};

/// `POST /zones` body.
#[derive(Debug, Serialize)]
pub struct CreateZoneBody<'a> {
    pub name: &'a str,
    pub kind: ZoneKind,
    pub nameservers: Vec<String>,
}

/// `PATCH /zones/{zone}` body.
#[derive(Debug, Serialize)]
pub struct PatchZoneBody<'a> {
    pub rrsets: &'a [RrsetChange],
}

/// Error body: `{"error": "..."}`.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: Option<String>,
}
