//! Classification of server replies into domain outcomes.
//!
//! The import endpoints answer with a small integer embedded in the response
//! body, distinct from the HTTP status. Those sentinel values are pinned to
//! the server contract and must never be derived.

use crate::connection::ConnectionDescriptor;
use crate::rest::ServerReply;

/// Body sentinel for a rejected import.
pub const PUBLISH_FAILED: i32 = 2;
/// Body sentinel for a successful import.
pub const PUBLISH_SUCCESS: i32 = 3;
/// Body sentinel the schema import path answers when the catalog is already
/// present and overwrite was not requested.
pub const PUBLISH_CATALOG_EXISTS: i32 = 8;

/// Terminal outcome of a schema, metadata, or DSW publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Success,
    Failed,
    CatalogExists,
}

/// Result of probing the server for a connection by name.
///
/// The plain `Option` view collapses `NotFound` and `TransportError`; this
/// tagged form keeps them apart for callers that care.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionLookup {
    Found(ConnectionDescriptor),
    NotFound,
    TransportError,
}

impl ConnectionLookup {
    /// The original lookup contract: absent and indeterminate are the same.
    pub fn into_option(self) -> Option<ConnectionDescriptor> {
        match self {
            ConnectionLookup::Found(descriptor) => Some(descriptor),
            ConnectionLookup::NotFound | ConnectionLookup::TransportError => None,
        }
    }
}

/// Classify an import reply. Every path lands on a terminal state; nothing
/// here propagates an error.
pub fn classify(reply: Option<&ServerReply>) -> PublishOutcome {
    let Some(reply) = reply else {
        return PublishOutcome::Failed;
    };
    if reply.status != 200 && reply.status != 201 {
        return PublishOutcome::Failed;
    }
    let sentinel = reply
        .body
        .as_deref()
        .and_then(|body| body.trim().parse::<i32>().ok());
    match sentinel {
        Some(PUBLISH_SUCCESS) => PublishOutcome::Success,
        Some(PUBLISH_CATALOG_EXISTS) => PublishOutcome::CatalogExists,
        _ => PublishOutcome::Failed,
    }
}
