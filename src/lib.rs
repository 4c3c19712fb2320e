//! Publishing client for a BI server's data-access API.
//!
//! Pushes data-source connections, Mondrian (OLAP) schemas, metadata
//! domains, and data-source-wizard models to a remote server, probing for
//! existing resources and translating the server's HTTP status plus body
//! sentinel codes into a small closed set of outcomes.

mod acl;
mod connection;
pub mod consts;
pub mod logging;
mod outcome;
mod publish;
mod rest;

use serde::Deserialize;

pub use acl::DataSourceAcl;
pub use connection::{
    database_type_by_plugin_id, translate, AccessType, ConnectionDescriptor, DatabaseType,
    SourceConnection,
};
pub use outcome::{
    classify, ConnectionLookup, PublishOutcome, PUBLISH_CATALOG_EXISTS, PUBLISH_FAILED,
    PUBLISH_SUCCESS,
};
pub use publish::{ImportPart, PublishTarget};
pub use rest::{form_encode, percent_encode, RestTransport, ServerReply, Transport};

/// Location and credentials of the target server.
///
/// Credentials are passed through as HTTP basic auth on every request; this
/// crate does not manage them beyond that.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BiServerConnection {
    pub url: String,
    pub user_id: String,
    pub password: String,
}

impl BiServerConnection {
    pub fn new(
        url: impl Into<String>,
        user_id: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        BiServerConnection {
            url: url.into(),
            user_id: user_id.into(),
            password: password.into(),
        }
    }

    /// Join a server-relative path onto the base URL. Trailing slashes on
    /// the base are trimmed so the join is deterministic.
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.url.trim_end_matches('/'), path)
    }
}

/// Client for one server. Owns its transport; the underlying HTTP client
/// handle is created lazily on first use and reused for every call on this
/// instance. Safe for sequential reuse, not for concurrent sharing.
pub struct PublishClient {
    server: BiServerConnection,
    transport: Box<dyn Transport>,
    force_overwrite: bool,
    acl: Option<DataSourceAcl>,
}

impl PublishClient {
    pub fn new(server: BiServerConnection) -> Self {
        Self::with_transport(server, Box::new(RestTransport::new()))
    }

    /// Build a client over a caller-supplied transport. Tests substitute a
    /// fake here instead of intercepting calls on the real one.
    pub fn with_transport(server: BiServerConnection, transport: Box<dyn Transport>) -> Self {
        PublishClient {
            server,
            transport,
            force_overwrite: false,
            acl: None,
        }
    }

    /// Overwrite existing metadata/DSW domains instead of failing fast.
    pub fn set_force_overwrite(&mut self, force_overwrite: bool) {
        self.force_overwrite = force_overwrite;
    }

    /// Attach an ACL to ride along with subsequent metadata publishes.
    pub fn set_acl(&mut self, acl: Option<DataSourceAcl>) {
        self.acl = acl;
    }

    pub fn server(&self) -> &BiServerConnection {
        &self.server
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub(crate) fn force_overwrite(&self) -> bool {
        self.force_overwrite
    }

    pub(crate) fn acl(&self) -> Option<&DataSourceAcl> {
        self.acl.as_ref()
    }
}
