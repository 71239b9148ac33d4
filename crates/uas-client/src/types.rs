//! Wire types of the controller API.
//!
//! Every response is wrapped in an envelope:
//!
//! ```json
//! {"meta": {"rc": "ok"}, "data": [ ... ]}
//! {"meta": {"rc": "error", "msg": "api.err.NoSiteContext"}, "data": []}
//! ```
//!
//! Records use `#[serde(default)]` liberally; the controller returns many
//! more fields than modeled here and omits unset ones.

use serde::{Deserialize, Serialize};
use uas_core::{Client, MacAddress, Site, ValidationError};

/// `meta.rc` value of a successful call.
pub const RC_OK: &str = "ok";

/// Message returned when a site name is unknown to the controller.
pub const NO_SITE_CONTEXT: &str = "api.err.NoSiteContext";

/// Message returned when the session cookie is missing or expired.
pub const LOGIN_REQUIRED: &str = "api.err.LoginRequired";

/// Response metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct Meta {
    pub rc: String,
    #[serde(default)]
    pub msg: Option<String>,
}

impl Meta {
    pub fn is_ok(&self) -> bool {
        self.rc == RC_OK
    }
}

/// Response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub meta: Meta,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

// -- Requests ----------------------------------------------------------------

/// Body of `POST /api/login`.
#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub remember: bool,
}

/// Body of `POST /api/s/{site}/stat/alluser`.
#[derive(Debug, Clone, Serialize)]
pub struct ClientQuery {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub conn: &'static str,
    /// Look-back window in hours.
    pub within: u32,
}

impl Default for ClientQuery {
    /// Every client seen in the past year, connected or not.
    fn default() -> Self {
        Self {
            kind: "all",
            conn: "all",
            within: 8760,
        }
    }
}

/// Body of `POST /api/s/{site}/upd/user/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct SetAliasRequest<'a> {
    pub name: &'a str,
}

// -- Records -----------------------------------------------------------------

/// Site as returned by `GET /api/self/sites`.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteRecord {
    /// Empty when the controller omits it; such sites are dropped downstream.
    #[serde(rename = "_id", default)]
    pub id: String,
    /// Internal site name used in API paths.
    #[serde(default)]
    pub name: String,
    /// Human-facing description.
    #[serde(default)]
    pub desc: Option<String>,
}

impl From<SiteRecord> for Site {
    fn from(record: SiteRecord) -> Self {
        let site = Site::new(record.id, record.name);
        match record.desc {
            Some(desc) => site.with_description(desc),
            None => site,
        }
    }
}

/// Client (user) as returned by `POST /api/s/{site}/stat/alluser`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub mac: String,
    /// Operator-assigned alias.
    #[serde(default)]
    pub name: Option<String>,
    /// Name the device announced for itself; never used as an alias.
    #[serde(default)]
    pub hostname: Option<String>,
}

impl TryFrom<ClientRecord> for Client {
    type Error = ValidationError;

    fn try_from(record: ClientRecord) -> Result<Self, Self::Error> {
        let client = Client::new(MacAddress::new(&record.mac)?, record.id);
        Ok(match record.name {
            Some(name) => client.with_alias(name),
            None => client,
        })
    }
}
