//! Account model types.

use serde::{Deserialize, Serialize};

/// Identifier of an account: its file name in the store directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Create a new account ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Security/encryption mode for connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionSecurity {
    /// No encryption.
    #[serde(rename = "none")]
    None,
    /// Implicit TLS.
    #[serde(rename = "SSL/TLS")]
    SslTls,
    /// STARTTLS upgrade after plaintext connect.
    #[serde(rename = "STARTTLS")]
    StartTls,
}

/// How the client authenticates against a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthenticationMethod {
    /// No authentication.
    None,
    /// Plain password.
    Normal,
    /// Encrypted password.
    Encrypted,
    /// Kerberos / GSSAPI.
    Kerberos,
    /// NTLM.
    #[serde(rename = "NTLM")]
    Ntlm,
    /// Client certificate.
    #[serde(rename = "TLS certificate")]
    TlsCertificate,
}

/// Mail retrieval protocol of an incoming server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncomingProtocol {
    /// IMAP.
    Imap,
    /// POP3.
    Pop,
}

/// SMTP server profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingServer {
    /// Server hostname.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,
    /// Server port (25 plain, 465 SSL/TLS when unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_port: Option<u16>,
    /// Username for authentication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Password for authentication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Security mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_security: Option<ConnectionSecurity>,
    /// Authentication method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication_method: Option<AuthenticationMethod>,
}

/// IMAP or POP server profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingServer {
    /// Retrieval protocol.
    #[serde(rename = "type")]
    pub protocol: IncomingProtocol,
    /// Server hostname.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,
    /// Server port (143/993 for IMAP, 110/995 for POP when unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_port: Option<u16>,
    /// Username for authentication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Password for authentication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Security mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_security: Option<ConnectionSecurity>,
    /// Authentication method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication_method: Option<AuthenticationMethod>,
    /// Check for new messages every this many seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_timeout: Option<u64>,
    /// Leave messages on the server until deleted locally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leave_message: Option<bool>,
}

/// Email account record as stored in the account directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Storage key; equals `name` at creation.
    pub id: AccountId,
    /// Account name.
    pub name: String,
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "email_address")]
    pub email_address: Option<String>,
    /// SMTP profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outgoing_server: Option<OutgoingServer>,
    /// IMAP/POP profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incoming_server: Option<IncomingServer>,
}

impl Account {
    /// Create an account whose id is its name.
    #[must_use]
    pub fn new(id: AccountId) -> Self {
        Self {
            name: id.as_str().to_owned(),
            id,
            email_address: None,
            outgoing_server: None,
            incoming_server: None,
        }
    }
}
