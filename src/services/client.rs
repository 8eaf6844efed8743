//! REST client for the MuK REST API.
//!
//! Every remote operation funnels through [`RemoteApi::execute`]; the
//! higher-level `search_read`/`create` helpers only assemble the form
//! payloads. The production [`RestClient`] carries exactly one authentication
//! strategy for its lifetime and never retries beyond the single
//! re-authentication allowed on an expired OAuth2 token.

use crate::services::credentials::{AuthKind, ResolvedConnection};
use anyhow::{anyhow, Context};
use reqwest::blocking::RequestBuilder;
use reqwest::{header, StatusCode};
use serde_json::Value;
use std::cell::{Cell, RefCell};

/// Fixed side file that receives the body of the last failing response.
pub const ERROR_ARTIFACT: &str = "request_error.txt";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    pub fn is_mutating(self) -> bool {
        !matches!(self, Self::Get)
    }
}

/// Provenance of a connection, recorded in exported documents.
#[derive(Debug, Clone, Default)]
pub struct RemoteInfo {
    pub host: String,
    pub api: Option<String>,
    pub user: Option<String>,
}

impl RemoteInfo {
    /// Major Odoo series parsed from the reported version, e.g. `"15.0"` -> 15.
    pub fn series(&self) -> Option<u32> {
        self.api.as_deref()?.split('.').next()?.trim().parse().ok()
    }
}

/// The single seam between the sync logic and the network.
pub trait RemoteApi {
    fn execute(
        &self,
        endpoint: &str,
        method: Method,
        payload: &[(&str, String)],
    ) -> anyhow::Result<Option<Value>>;

    fn info(&self) -> RemoteInfo;

    fn search_read(
        &self,
        model: &str,
        domain: &Value,
        fields: &[&str],
        limit: Option<u32>,
    ) -> anyhow::Result<Vec<Value>> {
        let mut payload = vec![
            ("model", model.to_string()),
            ("domain", domain.to_string()),
            ("fields", serde_json::to_string(fields)?),
        ];
        if let Some(limit) = limit {
            payload.push(("limit", limit.to_string()));
        }
        match self.execute("search_read", Method::Get, &payload)? {
            Some(Value::Array(rows)) => Ok(rows),
            Some(_) | None => Ok(Vec::new()),
        }
    }

    fn create(&self, model: &str, values: &Value) -> anyhow::Result<Option<i64>> {
        let payload = [("model", model.to_string()), ("values", values.to_string())];
        match self.execute("create", Method::Post, &payload)? {
            Some(Value::Number(id)) => Ok(id.as_i64()),
            Some(Value::Array(ids)) => Ok(ids.first().and_then(Value::as_i64)),
            Some(_) | None => Ok(None),
        }
    }
}

enum AuthStrategy {
    OAuth2 {
        token_url: String,
        client_id: String,
        client_secret: String,
    },
    Basic {
        username: String,
        password: String,
    },
    Digest {
        username: String,
        password: String,
    },
}

pub struct RestClient {
    http: reqwest::blocking::Client,
    base_url: String,
    auth: AuthStrategy,
    token: RefCell<Option<String>>,
    readonly: bool,
    verbosity: u8,
    calls: Cell<u64>,
    info: RefCell<RemoteInfo>,
}

impl RestClient {
    pub fn new(conn: &ResolvedConnection, readonly: bool, verbosity: u8) -> anyhow::Result<Self> {
        let auth = match conn.auth_type {
            AuthKind::OAuth2 => AuthStrategy::OAuth2 {
                token_url: conn.token_url.clone(),
                client_id: conn.client_id.clone(),
                client_secret: conn.client_secret.clone(),
            },
            AuthKind::Basic => AuthStrategy::Basic {
                username: conn.username.clone().unwrap_or_default(),
                password: conn.password.clone().unwrap_or_default(),
            },
            AuthKind::Digest => AuthStrategy::Digest {
                username: conn.username.clone().unwrap_or_default(),
                password: conn.password.clone().unwrap_or_default(),
            },
        };
        Ok(Self {
            http: reqwest::blocking::Client::builder()
                .build()
                .context("building the http client")?,
            base_url: conn.base_url.clone(),
            auth,
            token: RefCell::new(None),
            readonly,
            verbosity,
            calls: Cell::new(0),
            info: RefCell::new(RemoteInfo {
                host: conn.host_url.clone(),
                api: None,
                user: None,
            }),
        })
    }

    /// Requests issued by this instance so far.
    pub fn calls(&self) -> u64 {
        self.calls.get()
    }

    fn route(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http") {
            endpoint.to_string()
        } else if endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        }
    }

    /// For OAuth2 connections, fetch a client-credentials token. Basic and
    /// digest authentication carry their secrets per request instead.
    pub fn authenticate(&self) -> anyhow::Result<()> {
        let AuthStrategy::OAuth2 {
            token_url,
            client_id,
            client_secret,
        } = &self.auth
        else {
            return Ok(());
        };
        let url = self.route(token_url);
        if self.verbosity > 2 {
            println!("trying to get a token from {url}");
        }
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret.as_str()),
            ("scope", "data/all"),
        ];
        let response = self
            .http
            .post(&url)
            .form(&params)
            .send()
            .with_context(|| format!("connecting to the token endpoint {url}"))?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("attempt to retrieve a token from {url} failed with status {status}");
        }
        let body: Value = response.json().context("decoding the token response")?;
        let token = body
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("token response from {url} carried no access_token"))?;
        *self.token.borrow_mut() = Some(token.to_string());
        if self.verbosity > 2 {
            println!("got a token");
        }
        Ok(())
    }

    /// Fetch version and user metadata for export provenance, best-effort.
    pub fn probe(&self) {
        let api = self
            .execute("", Method::Get, &[])
            .ok()
            .flatten()
            .and_then(|v| first_string(&v, &["api_version", "server_version", "version"]));
        let user = self
            .execute("user", Method::Get, &[])
            .ok()
            .flatten()
            .and_then(|v| first_string(&v, &["name", "login", "username"]));
        let mut info = self.info.borrow_mut();
        info.api = api;
        info.user = user;
    }

    fn request(
        &self,
        url: &str,
        method: Method,
        payload: &[(&str, String)],
        authorization: Option<String>,
    ) -> RequestBuilder {
        let builder = match method {
            Method::Get => self.http.get(url),
            Method::Post => self.http.post(url),
            Method::Put => self.http.put(url),
            Method::Delete => self.http.delete(url),
        };
        let builder = if payload.is_empty() {
            builder
        } else {
            builder.form(payload)
        };
        let builder = match &self.auth {
            AuthStrategy::OAuth2 { .. } => match self.token.borrow().as_deref() {
                Some(token) => builder.bearer_auth(token),
                None => builder,
            },
            AuthStrategy::Basic { username, password } => {
                builder.basic_auth(username, Some(password))
            }
            AuthStrategy::Digest { .. } => builder,
        };
        match authorization {
            Some(value) => builder.header(header::AUTHORIZATION, value),
            None => builder,
        }
    }

    fn send(
        &self,
        url: &str,
        method: Method,
        payload: &[(&str, String)],
    ) -> anyhow::Result<reqwest::blocking::Response> {
        let response = self
            .request(url, method, payload, None)
            .send()
            .with_context(|| format!("sending {} {url}", method.as_str()))?;
        // digest answers the server challenge and resends once
        if let AuthStrategy::Digest { username, password } = &self.auth {
            if response.status() == StatusCode::UNAUTHORIZED {
                if let Some(challenge) = response
                    .headers()
                    .get(header::WWW_AUTHENTICATE)
                    .and_then(|h| h.to_str().ok())
                {
                    let answer = digest_answer(challenge, username, password, url, method)?;
                    return self
                        .request(url, method, payload, Some(answer))
                        .send()
                        .with_context(|| format!("sending {} {url}", method.as_str()));
                }
            }
        }
        Ok(response)
    }
}

impl RemoteApi for RestClient {
    fn execute(
        &self,
        endpoint: &str,
        method: Method,
        payload: &[(&str, String)],
    ) -> anyhow::Result<Option<Value>> {
        let url = self.route(endpoint);
        if method.is_mutating() && self.readonly {
            println!(
                "INFO: not sending {} requests to {url} in read-only mode",
                method.as_str()
            );
            return Ok(None);
        }
        self.calls.set(self.calls.get() + 1);
        if self.verbosity > 2 {
            println!("query: {} {url}", method.as_str());
            if !payload.is_empty() {
                println!("payload: {payload:?}");
            }
        }
        let mut response = self.send(&url, method, payload)?;
        if response.status() == StatusCode::UNAUTHORIZED
            && matches!(self.auth, AuthStrategy::OAuth2 { .. })
        {
            if self.verbosity > 0 {
                println!("INFO: token expired, re-authenticating and re-submitting the request");
            }
            self.authenticate()?;
            response = self.send(&url, method, payload)?;
            if response.status() == StatusCode::UNAUTHORIZED {
                anyhow::bail!("request to {url} still unauthorized after re-authentication");
            }
        }
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            if self.verbosity > 0 {
                println!("status code: {}", status.as_u16());
                println!("reason: {}", status.canonical_reason().unwrap_or("unknown"));
                if self.verbosity > 1 {
                    println!("content:\n{body}");
                }
            }
            if std::fs::write(ERROR_ARTIFACT, &body).is_ok() && self.verbosity > 0 {
                println!("wrote the response content to {ERROR_ARTIFACT}");
            }
            return Ok(None);
        }
        let body: Value = response
            .json()
            .with_context(|| format!("decoding the response from {url}"))?;
        if self.verbosity > 2 {
            println!(
                "response:\n{}",
                serde_json::to_string_pretty(&body).unwrap_or_default()
            );
        }
        Ok(Some(body))
    }

    fn info(&self) -> RemoteInfo {
        self.info.borrow().clone()
    }
}

fn first_string(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| value.get(k).and_then(Value::as_str).map(str::to_string))
}

fn digest_answer(
    challenge: &str,
    username: &str,
    password: &str,
    url: &str,
    method: Method,
) -> anyhow::Result<String> {
    let uri = reqwest::Url::parse(url)
        .with_context(|| format!("parsing request url {url}"))?
        .path()
        .to_string();
    let mut prompt = digest_auth::parse(challenge).context("parsing the digest challenge")?;
    let context = digest_auth::AuthContext::new_with_method(
        username,
        password,
        uri.as_str(),
        Option::<std::borrow::Cow<'_, [u8]>>::None,
        digest_auth::HttpMethod::from(method.as_str()),
    );
    let answer = prompt
        .respond(&context)
        .context("answering the digest challenge")?;
    Ok(answer.to_header_string())
}
