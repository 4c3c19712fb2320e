//! Access-control model optionally attached to a metadata publish.

/// Set of user names granted access to a published metadata data source.
/// Attach one to a [`crate::PublishClient`] before publishing; it rides
/// along as an extra part of the import request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataSourceAcl {
    users: Vec<String>,
}

impl DataSourceAcl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&mut self, user: impl Into<String>) {
        self.users.push(user.into());
    }

    pub fn users(&self) -> &[String] {
        &self.users
    }

    /// Serialize to the server's `repositoryFileAclDto` form. An ACL with no
    /// users yields `None`; the import endpoints reject empty ACL parts.
    pub fn to_xml(&self) -> Option<String> {
        if self.users.is_empty() {
            return None;
        }
        let mut xml = String::from("<repositoryFileAclDto>");
        for user in &self.users {
            xml.push_str("<aces><recipient>");
            xml.push_str(user);
            xml.push_str(
                "</recipient><recipientType>0</recipientType><permissions>4</permissions></aces>",
            );
        }
        xml.push_str("<entriesInheriting>false</entriesInheriting></repositoryFileAclDto>");
        Some(xml)
    }
}
