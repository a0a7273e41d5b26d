//! # Response Model
//!
//! The shape in which the HTTP pipeline hands completed requests to the
//! cache. Payloads are decoded upstream into an explicit variant so the
//! cacher dispatches on the discriminant instead of probing types.

use crate::error::{CacheError, Result};
use bytes::Bytes;
use core_library::models::{ArtistWithCounts, ShowWithSources};
use serde::{Deserialize, Serialize};

/// Decoding hint attached to a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    Show,
    Artists,
    Other,
}

impl PayloadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadKind::Show => "show",
            PayloadKind::Artists => "artists",
            PayloadKind::Other => "other",
        }
    }
}

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A single show with all of its sources
    Show(ShowWithSources),
    /// A list of artists
    Artists(Vec<ArtistWithCounts>),
    /// Any other JSON document
    Json(serde_json::Value),
    /// A body that is not JSON
    Raw(Bytes),
}

impl Payload {
    /// Decode `body` according to the route's `kind`.
    ///
    /// `Other` bodies never fail: they become `Json` when they parse and
    /// `Raw` otherwise.
    pub fn decode(kind: PayloadKind, body: &[u8]) -> Result<Self> {
        let decode_error = |source| CacheError::Decode {
            kind: kind.as_str(),
            source,
        };

        match kind {
            PayloadKind::Show => serde_json::from_slice(body)
                .map(Payload::Show)
                .map_err(decode_error),
            PayloadKind::Artists => serde_json::from_slice(body)
                .map(Payload::Artists)
                .map_err(decode_error),
            PayloadKind::Other => Ok(serde_json::from_slice(body)
                .map(Payload::Json)
                .unwrap_or_else(|_| Payload::Raw(Bytes::copy_from_slice(body)))),
        }
    }

    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::Show(_) => PayloadKind::Show,
            Payload::Artists(_) => PayloadKind::Artists,
            Payload::Json(_) | Payload::Raw(_) => PayloadKind::Other,
        }
    }
}

/// A successful response with its decoded body.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub url: String,
    pub status: u16,
    pub payload: Payload,
}

impl Entity {
    pub fn new(url: impl Into<String>, payload: Payload) -> Self {
        Self {
            url: url.into(),
            status: 200,
            payload,
        }
    }
}

/// Why a request did not produce an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFailure {
    /// HTTP status, if the server answered at all
    pub status: Option<u16>,
    pub message: String,
}

/// Outcome of a completed request.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Success(Entity),
    NotModified,
    Failure(RequestFailure),
}

impl Response {
    pub fn success(url: impl Into<String>, payload: Payload) -> Self {
        Response::Success(Entity::new(url, payload))
    }

    pub fn failure(status: Option<u16>, message: impl Into<String>) -> Self {
        Response::Failure(RequestFailure {
            status,
            message: message.into(),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success(_))
    }

    pub fn payload(&self) -> Option<&Payload> {
        match self {
            Response::Success(entity) => Some(&entity.payload),
            _ => None,
        }
    }
}

/// Post-processing hook run on every completed request.
///
/// The returned value replaces the original response. Implementations must
/// return without waiting on any side effects they start.
pub trait ResponseTransformer: Send + Sync {
    fn process(&self, response: Response) -> Response;
}
