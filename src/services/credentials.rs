//! Credential file handling.
//!
//! The credentials file is a JSON map from connection name to connection
//! parameters. Host and API path are normalized on load so the rest of the
//! crate can concatenate them blindly.

use crate::domain::error::SyncError;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthKind {
    #[default]
    OAuth2,
    Basic,
    Digest,
}

/// One entry of the credentials file, as stored on disk.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Connection {
    pub host_url: String,
    pub rest_api: String,
    #[serde(default)]
    pub auth_type: AuthKind,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// A connection after normalization, ready to construct a client from.
#[derive(Debug, Clone)]
pub struct ResolvedConnection {
    pub host_url: String,
    pub base_url: String,
    pub token_url: String,
    pub auth_type: AuthKind,
    pub client_id: String,
    pub client_secret: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

pub fn load_connection(
    cred_file: &str,
    connection: &str,
    verbosity: u8,
) -> anyhow::Result<ResolvedConnection> {
    let raw = std::fs::read_to_string(cred_file)
        .with_context(|| format!("reading credentials file {cred_file}"))?;
    let credentials: BTreeMap<String, Connection> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing credentials file {cred_file}"))?;
    let entry = credentials
        .get(connection)
        .ok_or_else(|| {
            SyncError::UnknownConnection(connection.to_string(), cred_file.to_string())
        })?;
    Ok(resolve(entry, verbosity))
}

fn resolve(entry: &Connection, verbosity: u8) -> ResolvedConnection {
    let mut host_url = entry.host_url.trim().to_string();
    if !host_url.starts_with("http") {
        host_url = format!("https://{host_url}");
    }
    while host_url.ends_with('/') {
        host_url.pop();
    }
    let mut rest_api = entry.rest_api.trim().to_string();
    if !rest_api.starts_with('/') {
        rest_api = format!("/{rest_api}");
    }
    while rest_api.ends_with('/') {
        rest_api.pop();
    }
    let base_url = format!("{host_url}{rest_api}");
    let token_url = entry
        .token_url
        .clone()
        .unwrap_or_else(|| format!("{base_url}/authentication/oauth2/token"));
    if verbosity > 2 {
        println!("using host {host_url}");
        println!("using api {rest_api}");
        println!("using base url {base_url}");
        println!("using token url {token_url}");
    }
    ResolvedConnection {
        host_url,
        base_url,
        token_url,
        auth_type: entry.auth_type,
        client_id: entry.client_id.clone(),
        client_secret: entry.client_secret.clone(),
        username: entry.username.clone(),
        password: entry.password.clone(),
    }
}

/// Write an example credentials file the user can fill in.
pub fn write_scaffold(path: &Path) -> anyhow::Result<()> {
    let credentials = serde_json::json!({
        "odoo-16_demo": {
            "host_url": "https://odoo-16.example.com",
            "rest_api": "/api/v2",
            "client_id": "{put client id/key here}",
            "client_secret": "{put client secret here}"
        },
        "odoo-15_demo": {
            "host_url": "https://odoo-15.example.com",
            "rest_api": "/api/v1",
            "client_id": "{put client id/key here}",
            "client_secret": "{put client secret here}"
        },
        "odoo-14_demo": {
            "host_url": "https://odoo-14.example.com",
            "rest_api": "/api/v1",
            "client_id": "{put client id/key here}",
            "client_secret": "{put client secret here}"
        },
        "odoo-13_demo": {
            "host_url": "https://odoo-13.example.com",
            "rest_api": "/api",
            "client_id": "{put client id/key here}",
            "client_secret": "{put client secret here}"
        },
        "odoo-xy_demo": {
            "host_url": "https://odoo-xy.example.com",
            "rest_api": "/api",
            "token_url": "https://odoo-xy.example.com/api/authentication/oauth2/token",
            "client_id": "{put client id/key here}",
            "client_secret": "{put client secret here}"
        }
    });
    std::fs::write(path, serde_json::to_string_pretty(&credentials)?)
        .with_context(|| format!("writing scaffold credentials to {}", path.display()))?;
    Ok(())
}
