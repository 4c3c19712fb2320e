//! The publish operations: connection find/upsert/delete, data-source
//! publish via the attribute translator, and the three multipart import
//! flows (Mondrian schema, metadata domain, DSW model).

use anyhow::{bail, Result};
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde_json::json;
use tracing::debug;

use crate::connection::{translate, ConnectionDescriptor, SourceConnection};
use crate::consts;
use crate::outcome::{classify, ConnectionLookup, PublishOutcome};
use crate::rest::{form_encode, percent_encode};
use crate::PublishClient;

/// The five body parts of an import request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportPart {
    Parameters,
    Payload,
    TargetId,
    Overwrite,
    XmlaEnabled,
}

impl ImportPart {
    /// Wire order is a server contract. The form builder iterates this
    /// sequence, so the order cannot drift silently.
    pub const WIRE_ORDER: [ImportPart; 5] = [
        ImportPart::Parameters,
        ImportPart::Payload,
        ImportPart::TargetId,
        ImportPart::Overwrite,
        ImportPart::XmlaEnabled,
    ];
}

/// Which import endpoint family the form is for; the payload and target-id
/// field names differ between them.
#[derive(Debug, Clone, Copy)]
enum ImportKind {
    Schema,
    Metadata,
}

impl ImportKind {
    fn payload_field(self) -> &'static str {
        match self {
            ImportKind::Schema => consts::SCHEMA_PAYLOAD_FIELD,
            ImportKind::Metadata => consts::METADATA_PAYLOAD_FIELD,
        }
    }

    fn target_field(self) -> &'static str {
        match self {
            ImportKind::Schema => consts::SCHEMA_TARGET_FIELD,
            ImportKind::Metadata => consts::METADATA_TARGET_FIELD,
        }
    }
}

struct ImportRequest {
    kind: ImportKind,
    parameters: String,
    payload: Vec<u8>,
    file_name: String,
    target_id: String,
    overwrite: bool,
    xmla_enabled: bool,
    acl: Option<String>,
}

fn import_form(request: ImportRequest) -> Form {
    // The payload is consumed by its slot in the wire order; everything else
    // is cheap to clone.
    let mut payload = Some(Part::bytes(request.payload).file_name(request.file_name));
    let mut form = Form::new();
    for part in ImportPart::WIRE_ORDER {
        form = match part {
            ImportPart::Parameters => form.text(consts::PARAMETERS_FIELD, request.parameters.clone()),
            ImportPart::Payload => match payload.take() {
                Some(payload) => form.part(request.kind.payload_field(), payload),
                None => form,
            },
            ImportPart::TargetId => form.text(request.kind.target_field(), request.target_id.clone()),
            ImportPart::Overwrite => form.text(consts::OVERWRITE_FIELD, request.overwrite.to_string()),
            ImportPart::XmlaEnabled => {
                form.text(consts::XMLA_ENABLED_FIELD, request.xmla_enabled.to_string())
            }
        };
    }
    // The ACL rides behind the enumerated five when present.
    if let Some(acl) = request.acl {
        form = form.text(consts::ACL_FIELD, acl);
    }
    form
}

/// One publishable artifact, with its kind-specific metadata.
pub enum PublishTarget<'a> {
    DataSource {
        source: &'a dyn SourceConnection,
        connection_id: String,
        overwrite_allowed: bool,
    },
    MondrianSchema {
        schema: Vec<u8>,
        catalog_name: String,
        datasource_info: String,
        overwrite_in_repository: bool,
        xmla_enabled: bool,
    },
    MetadataFile {
        payload: Vec<u8>,
        domain_id: String,
        domain_exists: bool,
    },
    DswModel {
        payload: Vec<u8>,
        domain_id: String,
        domain_exists: bool,
    },
}

impl PublishClient {
    /// Absolute URL of the connection probe for `connection_name`.
    pub fn construct_absolute_url(&self, connection_name: &str) -> String {
        format!(
            "{}?{}={}",
            self.server().endpoint(consts::CONNECTION_GET_PATH),
            consts::NAME_QUERY_PARAM,
            percent_encode(connection_name),
        )
    }

    fn authed(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        self.transport()
            .request(method, url)
            .basic_auth(&self.server().user_id, Some(&self.server().password))
    }

    /// Probe the server for a connection by name, keeping "absent" and
    /// "unreachable" apart.
    pub async fn lookup_connection(&self, name: &str) -> ConnectionLookup {
        if name.is_empty() {
            return ConnectionLookup::NotFound;
        }
        let url = self.construct_absolute_url(name);
        let request = self.authed(Method::GET, &url);
        let Some(reply) = self.transport().send(request).await else {
            return ConnectionLookup::TransportError;
        };
        if reply.status != 200 {
            return ConnectionLookup::NotFound;
        }
        let descriptor = reply
            .body
            .as_deref()
            .and_then(|body| serde_json::from_str::<ConnectionDescriptor>(body).ok());
        match descriptor {
            Some(descriptor) => ConnectionLookup::Found(descriptor),
            None => ConnectionLookup::NotFound,
        }
    }

    /// The original probe contract: absent, unreachable, and unparseable
    /// all collapse to `None`.
    pub async fn find_connection_by_name(&self, name: &str) -> Option<ConnectionDescriptor> {
        self.lookup_connection(name).await.into_option()
    }

    /// Create or update a connection. `true` iff the server acknowledged
    /// with 200; ordinary rejection is not an error.
    pub async fn update_connection(
        &self,
        descriptor: &ConnectionDescriptor,
        overwrite_allowed: bool,
    ) -> bool {
        let url = format!(
            "{}?{}={}",
            self.server().endpoint(consts::CONNECTION_UPDATE_PATH),
            consts::OVERWRITE_QUERY_PARAM,
            overwrite_allowed,
        );
        let request = self.authed(Method::POST, &url).json(descriptor);
        match self.transport().send(request).await {
            Some(reply) if reply.status == 200 => true,
            Some(reply) => {
                debug!(
                    "connection update for {} rejected with status {}",
                    descriptor.name, reply.status
                );
                false
            }
            None => false,
        }
    }

    /// Delete a connection by name. The endpoint expects form-style
    /// encoding, spaces as `+`.
    pub async fn delete_connection(&self, name: &str) -> bool {
        let url = format!(
            "{}?{}={}",
            self.server().endpoint(consts::CONNECTION_DELETE_PATH),
            consts::NAME_QUERY_PARAM,
            form_encode(name),
        );
        let request = self.authed(Method::GET, &url);
        matches!(self.transport().send(request).await, Some(reply) if reply.status == 200)
    }

    /// Translate a source connection and push it. Driver errors during
    /// translation propagate; server rejection is a plain `false`.
    pub async fn publish_data_source(
        &self,
        source: &dyn SourceConnection,
        connection_id: &str,
        overwrite_allowed: bool,
    ) -> Result<bool> {
        let descriptor = translate(source, connection_id)?;
        Ok(self.update_connection(&descriptor, overwrite_allowed).await)
    }

    /// Push a Mondrian schema into the server's analysis catalog.
    pub async fn publish_mondrian_schema(
        &self,
        schema: Vec<u8>,
        catalog_name: &str,
        datasource_info: &str,
        overwrite_in_repository: bool,
        xmla_enabled: bool,
    ) -> PublishOutcome {
        let parameters = json!({
            "Datasource": datasource_info,
            "overwrite": overwrite_in_repository,
        })
        .to_string();
        let form = import_form(ImportRequest {
            kind: ImportKind::Schema,
            parameters,
            payload: schema,
            file_name: format!("{catalog_name}.mondrian.xml"),
            target_id: catalog_name.to_owned(),
            overwrite: overwrite_in_repository,
            xmla_enabled,
            acl: None,
        });
        let url = self.server().endpoint(consts::SCHEMA_IMPORT_PATH);
        let request = self.authed(Method::POST, &url).multipart(form);
        classify(self.transport().send(request).await.as_ref())
    }

    /// Push a metadata domain. When overwrite is not forced and the caller
    /// found the domain already present, no request is issued.
    pub async fn publish_metadata_file(
        &self,
        payload: Vec<u8>,
        domain_id: &str,
        domain_exists: bool,
    ) -> PublishOutcome {
        if !self.force_overwrite() && domain_exists {
            debug!("domain {domain_id} already present and overwrite is not forced");
            return PublishOutcome::Failed;
        }
        let parameters = json!({ "domainId": domain_id }).to_string();
        let form = import_form(ImportRequest {
            kind: ImportKind::Metadata,
            parameters,
            payload,
            file_name: domain_id.to_owned(),
            target_id: domain_id.to_owned(),
            overwrite: self.force_overwrite(),
            xmla_enabled: false,
            acl: self.acl().and_then(|acl| acl.to_xml()),
        });
        let url = self.server().endpoint(consts::METADATA_IMPORT_PATH);
        let request = self.authed(Method::PUT, &url).multipart(form);
        classify(self.transport().send(request).await.as_ref())
    }

    /// Push a data-source-wizard model. Domain ids carrying the reserved
    /// extension are refused before any request goes out.
    pub async fn publish_dsw(
        &self,
        payload: Vec<u8>,
        domain_id: &str,
        domain_exists: bool,
    ) -> Result<PublishOutcome> {
        if domain_id.ends_with(consts::RESERVED_DSW_SUFFIX) {
            bail!(
                "domain id must not carry the reserved {} extension: {domain_id}",
                consts::RESERVED_DSW_SUFFIX,
            );
        }
        if !self.force_overwrite() && domain_exists {
            debug!("domain {domain_id} already present and overwrite is not forced");
            return Ok(PublishOutcome::Failed);
        }
        let parameters = json!({ "domainId": domain_id }).to_string();
        let form = import_form(ImportRequest {
            kind: ImportKind::Metadata,
            parameters,
            payload,
            file_name: domain_id.to_owned(),
            target_id: domain_id.to_owned(),
            overwrite: self.force_overwrite(),
            xmla_enabled: false,
            acl: None,
        });
        let url = self.server().endpoint(consts::DSW_IMPORT_PATH);
        let request = self.authed(Method::PUT, &url).multipart(form);
        Ok(classify(self.transport().send(request).await.as_ref()))
    }

    /// Publish any target kind. Data-source results map onto the outcome
    /// codes: accepted is `Success`, rejected is `Failed`.
    pub async fn publish(&self, target: PublishTarget<'_>) -> Result<PublishOutcome> {
        match target {
            PublishTarget::DataSource {
                source,
                connection_id,
                overwrite_allowed,
            } => {
                let accepted = self
                    .publish_data_source(source, &connection_id, overwrite_allowed)
                    .await?;
                Ok(if accepted {
                    PublishOutcome::Success
                } else {
                    PublishOutcome::Failed
                })
            }
            PublishTarget::MondrianSchema {
                schema,
                catalog_name,
                datasource_info,
                overwrite_in_repository,
                xmla_enabled,
            } => Ok(self
                .publish_mondrian_schema(
                    schema,
                    &catalog_name,
                    &datasource_info,
                    overwrite_in_repository,
                    xmla_enabled,
                )
                .await),
            PublishTarget::MetadataFile {
                payload,
                domain_id,
                domain_exists,
            } => Ok(self
                .publish_metadata_file(payload, &domain_id, domain_exists)
                .await),
            PublishTarget::DswModel {
                payload,
                domain_id,
                domain_exists,
            } => self.publish_dsw(payload, &domain_id, domain_exists).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::connection::tests::FakeSource;
    use crate::rest::{ServerReply, Transport};
    use crate::BiServerConnection;

    type RequestLog = Arc<Mutex<Vec<(Method, String)>>>;

    /// Canned-reply transport that records what would have gone out.
    struct FakeTransport {
        client: reqwest::Client,
        reply: Option<ServerReply>,
        seen: RequestLog,
    }

    impl FakeTransport {
        fn replying(reply: Option<ServerReply>) -> Self {
            FakeTransport {
                client: reqwest::Client::new(),
                reply,
                seen: Arc::default(),
            }
        }

        fn status(status: u16, body: &str) -> Self {
            Self::replying(Some(ServerReply {
                status,
                body: Some(body.to_owned()),
            }))
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
            self.client.request(method, url)
        }

        async fn send(&self, request: reqwest::RequestBuilder) -> Option<ServerReply> {
            let built = request.build().unwrap();
            self.seen
                .lock()
                .unwrap()
                .push((built.method().clone(), built.url().to_string()));
            self.reply.clone()
        }
    }

    fn server() -> BiServerConnection {
        BiServerConnection::new("http://localhost:8080/pentaho", "admin", "password")
    }

    fn client_with(transport: FakeTransport) -> (PublishClient, RequestLog) {
        let log = transport.seen.clone();
        (
            PublishClient::with_transport(server(), Box::new(transport)),
            log,
        )
    }

    fn seen(log: &RequestLog) -> Vec<(Method, String)> {
        log.lock().unwrap().clone()
    }

    #[test]
    fn constructs_the_probe_url_with_strict_encoding() {
        let client = PublishClient::new(server());
        assert_eq!(
            client.construct_absolute_url("local pentaho"),
            "http://localhost:8080/pentaho/plugin/data-access/api/connection/getresponse?name=local%20pentaho",
        );
    }

    #[tokio::test]
    async fn empty_name_is_not_found_without_a_request() {
        let (client, log) = client_with(FakeTransport::status(200, "{}"));
        assert_eq!(client.lookup_connection("").await, ConnectionLookup::NotFound);
        assert!(seen(&log).is_empty());
    }

    #[tokio::test]
    async fn lookup_keeps_absent_and_unreachable_apart() {
        let (client, _) = client_with(FakeTransport::replying(None));
        assert_eq!(
            client.lookup_connection("test").await,
            ConnectionLookup::TransportError
        );

        let (client, _) = client_with(FakeTransport::status(404, ""));
        assert_eq!(
            client.lookup_connection("test").await,
            ConnectionLookup::NotFound
        );

        let (client, _) = client_with(FakeTransport::status(200, "not json"));
        assert_eq!(
            client.lookup_connection("test").await,
            ConnectionLookup::NotFound
        );
    }

    #[tokio::test]
    async fn find_by_name_collapses_the_tags() {
        let (client, _) = client_with(FakeTransport::replying(None));
        assert!(client.find_connection_by_name("test").await.is_none());

        let (client, _) = client_with(FakeTransport::status(200, r#"{"name":"test"}"#));
        let found = client.find_connection_by_name("test").await.unwrap();
        assert_eq!(found.name, "test");
    }

    #[tokio::test]
    async fn update_connection_is_true_only_on_200() {
        let descriptor = ConnectionDescriptor {
            name: "test".to_owned(),
            ..Default::default()
        };

        let (client, _) = client_with(FakeTransport::replying(None));
        assert!(!client.update_connection(&descriptor, false).await);

        let (client, _) = client_with(FakeTransport::status(404, ""));
        assert!(!client.update_connection(&descriptor, false).await);

        let (client, log) = client_with(FakeTransport::status(200, ""));
        assert!(client.update_connection(&descriptor, true).await);
        let requests = seen(&log);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, Method::POST);
        assert!(requests[0]
            .1
            .ends_with("/plugin/data-access/api/connection/update?overwrite=true"));
    }

    #[tokio::test]
    async fn delete_targets_the_form_encoded_name() {
        let (client, log) = client_with(FakeTransport::status(200, ""));
        assert!(client.delete_connection("some name").await);
        let requests = seen(&log);
        assert_eq!(
            requests[0].1,
            "http://localhost:8080/pentaho/plugin/data-access/api/connection/deletebyname?name=some+name",
        );
    }

    #[tokio::test]
    async fn data_source_publish_propagates_translation_errors() {
        let source = FakeSource {
            attributes_unavailable: true,
            ..Default::default()
        };
        let (client, log) = client_with(FakeTransport::status(200, ""));
        let err = client.publish_data_source(&source, "id", true).await;
        assert!(err.is_err());
        assert!(seen(&log).is_empty());
    }

    #[tokio::test]
    async fn data_source_publish_pushes_the_translated_descriptor() {
        let source = FakeSource {
            name: "warehouse".to_owned(),
            plugin_id: "MYSQL".to_owned(),
            ..Default::default()
        };
        let (client, log) = client_with(FakeTransport::status(200, ""));
        assert!(client.publish_data_source(&source, "id", false).await.unwrap());
        let requests = seen(&log);
        assert!(requests[0].1.ends_with("overwrite=false"));
    }

    #[tokio::test]
    async fn reserved_suffix_is_rejected_before_any_request() {
        let (client, log) = client_with(FakeTransport::status(200, "3"));
        let err = client
            .publish_dsw(b"model".to_vec(), "Test.xmi", false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains(".xmi"));
        assert!(seen(&log).is_empty());
    }

    #[tokio::test]
    async fn existing_domain_fails_fast_unless_overwrite_is_forced() {
        let (client, log) = client_with(FakeTransport::status(200, "3"));
        assert_eq!(
            client.publish_metadata_file(b"m".to_vec(), "Test", true).await,
            PublishOutcome::Failed
        );
        assert!(seen(&log).is_empty());

        let (mut client, log) = client_with(FakeTransport::status(200, "3"));
        client.set_force_overwrite(true);
        assert_eq!(
            client.publish_metadata_file(b"m".to_vec(), "Test", true).await,
            PublishOutcome::Success
        );
        assert_eq!(seen(&log).len(), 1);
    }

    #[tokio::test]
    async fn dsw_publish_with_clean_domain_id_succeeds() {
        let (client, log) = client_with(FakeTransport::status(200, "3"));
        assert_eq!(
            client.publish_dsw(b"model".to_vec(), "Test", false).await.unwrap(),
            PublishOutcome::Success
        );
        let requests = seen(&log);
        assert_eq!(requests[0].0, Method::PUT);
        assert!(requests[0]
            .1
            .ends_with("/plugin/data-access/api/datasource/dsw/import"));
    }

    #[tokio::test]
    async fn target_dispatch_maps_data_source_acceptance_onto_outcomes() {
        let source = FakeSource::default();
        let (client, _) = client_with(FakeTransport::status(200, ""));
        let outcome = client
            .publish(PublishTarget::DataSource {
                source: &source,
                connection_id: "id".to_owned(),
                overwrite_allowed: true,
            })
            .await
            .unwrap();
        assert_eq!(outcome, PublishOutcome::Success);

        let (client, _) = client_with(FakeTransport::replying(None));
        let outcome = client
            .publish(PublishTarget::MondrianSchema {
                schema: b"<Schema/>".to_vec(),
                catalog_name: "Catalog".to_owned(),
                datasource_info: "Test".to_owned(),
                overwrite_in_repository: true,
                xmla_enabled: true,
            })
            .await
            .unwrap();
        assert_eq!(outcome, PublishOutcome::Failed);
    }
}
