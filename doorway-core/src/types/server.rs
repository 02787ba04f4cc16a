use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A web server domains are pointed at.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    pub id: String,
    pub name: String,
    /// IPv4 address written into `@` / `www` A records.
    pub ip_address: String,
    /// At most one server is primary; it is the default target for new domains.
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Server {
    pub fn new(name: impl Into<String>, ip_address: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            ip_address: ip_address.into(),
            is_primary: false,
            created_at: now,
            updated_at: now,
        }
    }
}
