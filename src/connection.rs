//! Connection wire model and the attribute translator.
//!
//! [`translate`] maps a locally-defined relational connection into the
//! representation the server's connection endpoints accept. Variable
//! substitution stays with the source collaborator; this module only decides
//! which fields get substituted and how vendor attributes map onto the
//! descriptor.

use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::consts;

/// How the server reaches the database. This translation path only ever
/// produces `Native`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccessType {
    #[default]
    Native,
    Odbc,
    Jndi,
}

/// A database type known to the server, resolved by plugin id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseType {
    pub short_name: String,
    pub name: String,
}

// The server ships with a fixed catalog of database types; resolution works
// whether or not the matching driver is loadable here.
const DATABASE_TYPES: &[(&str, &str)] = &[
    ("ORACLE", "Oracle"),
    ("MYSQL", "MySQL"),
    ("MSSQL", "MS SQL Server"),
    ("MSSQLNATIVE", "MS SQL Server (Native)"),
    ("POSTGRESQL", "PostgreSQL"),
    ("HYPERSONIC", "Hypersonic"),
    ("H2", "H2"),
    ("MONETDB", "MonetDB"),
    ("GENERIC", "Generic database"),
];

/// Resolve a database type by plugin id. Unknown and empty ids resolve to
/// `None`; the publish then fails server-side with a classified error
/// instead of failing here.
pub fn database_type_by_plugin_id(plugin_id: &str) -> Option<DatabaseType> {
    DATABASE_TYPES
        .iter()
        .find(|(id, _)| *id == plugin_id)
        .map(|(id, name)| DatabaseType {
            short_name: (*id).to_owned(),
            name: (*name).to_owned(),
        })
}

/// Translated representation of a database connection, ready for
/// transmission. Built fresh per publish call and never mutated after
/// handoff to the transport.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDescriptor {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub database_name: String,
    #[serde(default)]
    pub database_port: String,
    #[serde(default)]
    pub database_type: Option<DatabaseType>,
    #[serde(default)]
    pub access_type: AccessType,
    #[serde(default)]
    pub force_identifiers_to_lowercase: bool,
    #[serde(default)]
    pub quote_all_fields: bool,
    #[serde(default)]
    pub extra_options: HashMap<String, String>,
}

/// A locally-defined relational connection, as the surrounding tool exposes
/// it. Substitution of `${VAR}` placeholders belongs to the implementor.
pub trait SourceConnection {
    fn name(&self) -> String;
    fn username(&self) -> String;
    fn password(&self) -> String;
    fn hostname(&self) -> String;
    fn database_name(&self) -> String;
    /// Plugin id of the database driver, used to resolve the server-side
    /// database type.
    fn plugin_id(&self) -> String;
    /// Driver-specific attribute map. Reading it may hit the backing driver
    /// plugin, so it is the one fallible call on this seam.
    fn vendor_attributes(&self) -> Result<HashMap<String, String>>;
    fn extra_options(&self) -> HashMap<String, String>;
    /// Resolve `${VAR}` placeholders in a field value.
    fn substitute(&self, value: &str) -> String;
}

fn attribute_flag(attributes: &HashMap<String, String>, key: &str) -> bool {
    // "Y" exactly; anything else, including absence, is false.
    attributes.get(key).map(String::as_str) == Some("Y")
}

/// Build a [`ConnectionDescriptor`] from a source connection.
///
/// Vendor-attribute errors propagate to the caller; everything else is
/// infallible by construction.
pub fn translate(
    source: &dyn SourceConnection,
    connection_id: &str,
) -> Result<ConnectionDescriptor> {
    let attributes = source
        .vendor_attributes()
        .context("reading vendor attributes from the database driver")?;

    let database_port = attributes
        .get(consts::PORT_NUMBER_ATTR)
        .map(|port| source.substitute(port))
        .unwrap_or_default();

    Ok(ConnectionDescriptor {
        id: connection_id.to_owned(),
        name: source.name(),
        username: source.substitute(&source.username()),
        password: source.substitute(&source.password()),
        hostname: source.substitute(&source.hostname()),
        database_name: source.substitute(&source.database_name()),
        database_port,
        database_type: database_type_by_plugin_id(&source.plugin_id()),
        access_type: AccessType::Native,
        force_identifiers_to_lowercase: attribute_flag(&attributes, consts::FORCE_LOWERCASE_ATTR),
        quote_all_fields: attribute_flag(&attributes, consts::QUOTE_ALL_FIELDS_ATTR),
        extra_options: source.extra_options(),
    })
}
