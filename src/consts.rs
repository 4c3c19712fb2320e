//! Server-relative endpoint paths and wire field names.
//!
//! The paths and the multipart field names are part of the server contract;
//! changing any of them breaks wire compatibility with deployed servers.

pub const CONNECTION_GET_PATH: &str = "/plugin/data-access/api/connection/getresponse";
pub const CONNECTION_UPDATE_PATH: &str = "/plugin/data-access/api/connection/update";
pub const CONNECTION_DELETE_PATH: &str = "/plugin/data-access/api/connection/deletebyname";
pub const SCHEMA_IMPORT_PATH: &str = "/plugin/data-access/api/mondrian/postAnalysis";
pub const METADATA_IMPORT_PATH: &str = "/plugin/data-access/api/metadata/import";
pub const DSW_IMPORT_PATH: &str = "/plugin/data-access/api/datasource/dsw/import";

pub const NAME_QUERY_PARAM: &str = "name";
pub const OVERWRITE_QUERY_PARAM: &str = "overwrite";

// Multipart field names shared by the import endpoints.
pub const PARAMETERS_FIELD: &str = "parameters";
pub const OVERWRITE_FIELD: &str = "overwrite";
pub const XMLA_ENABLED_FIELD: &str = "xmlaEnabledFlag";
pub const ACL_FIELD: &str = "acl";

// Field names that differ between the schema and the metadata/DSW endpoints.
pub const SCHEMA_PAYLOAD_FIELD: &str = "uploadAnalysis";
pub const SCHEMA_TARGET_FIELD: &str = "catalogName";
pub const METADATA_PAYLOAD_FIELD: &str = "metadataFile";
pub const METADATA_TARGET_FIELD: &str = "domainId";

/// Domain ids carrying this extension are refused by the DSW import path.
pub const RESERVED_DSW_SUFFIX: &str = ".xmi";

// Vendor attribute keys read by the attribute translator.
pub const PORT_NUMBER_ATTR: &str = "PORT_NUMBER";
pub const FORCE_LOWERCASE_ATTR: &str = "FORCE_IDENTIFIERS_TO_LOWERCASE";
pub const QUOTE_ALL_FIELDS_ATTR: &str = "QUOTE_ALL_FIELDS";
