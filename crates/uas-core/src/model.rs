//! # Site and Client Records
//!
//! Plain records handed to the sync engine by a controller implementation.
//! The engine never mutates them; applied aliases take effect on the next run.

use serde::{Deserialize, Serialize};

use crate::mac::MacAddress;

/// Name of the controller's built-in site. It ranks right after any
/// explicitly prioritized sites.
pub const DEFAULT_SITE_NAME: &str = "default";

/// An independently managed site on the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    /// Controller-assigned identifier.
    pub id: String,
    /// Internal site name (e.g. `"default"`). Used as the ordering and merge
    /// key, and as the site segment of controller API paths.
    pub name: String,
    /// Human-facing description shown in the controller UI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Site {
    /// Create a site record without a description.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
        }
    }

    /// Attach the human-facing description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Whether this is the controller's built-in site.
    pub fn is_default(&self) -> bool {
        self.name == DEFAULT_SITE_NAME
    }
}

/// A network client as known to one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    /// Hardware address; unique within a site.
    pub mac: MacAddress,
    /// Operator-assigned display name, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Controller-assigned identifier used when applying an alias.
    pub internal_id: String,
}

impl Client {
    /// Create an unaliased client.
    pub fn new(mac: MacAddress, internal_id: impl Into<String>) -> Self {
        Self {
            mac,
            alias: None,
            internal_id: internal_id.into(),
        }
    }

    /// Attach an alias.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// The alias, when present and non-empty.
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref().filter(|a| !a.is_empty())
    }

    /// Whether the client carries a non-empty alias.
    pub fn is_aliased(&self) -> bool {
        self.alias().is_some()
    }
}
