// Controller HTTP client
//
// Wraps `reqwest::Client` with controller URL construction, request
// headers, and the hash-protocol interpretation of response codes.
// Endpoint groups (networks, routers, cluster) are inherent methods in
// sibling modules so this file stays focused on transport mechanics.

use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::Error;
use crate::session::{EndpointConfig, HashToken, SessionState};

/// Base path of the controller's network service.
pub const BASE_PATH: [&str; 2] = ["networkService", "v1.1"];

/// Request and response header carrying the topology token.
pub const HASH_MATCH_HEADER: &str = "X-BSN-BVS-HASH-MATCH";

/// Identifies the calling orchestrator instance and zone.
pub const INSTANCE_ID_HEADER: &str = "Instance-ID";

/// Outcome of one accepted (or sentinel-producing) call.
#[derive(Debug)]
pub(crate) struct Reply {
    pub hash: HashToken,
    pub body: String,
}

impl Reply {
    fn sentinel(hash: HashToken) -> Self {
        Self {
            hash,
            body: String::new(),
        }
    }
}

/// HTTP client for a single controller endpoint.
///
/// Stateless apart from the endpoint description: the hash token and
/// master flag are held by the caller in a [`SessionState`] and passed
/// to every call, which updates it according to the controller's answer.
pub struct BcfClient {
    http: reqwest::Client,
    config: EndpointConfig,
}

impl BcfClient {
    /// Build a client (and its `reqwest::Client`) from the endpoint config.
    pub fn new(config: EndpointConfig) -> Result<Self, Error> {
        let http = config.transport().build_client()?;
        Ok(Self { http, config })
    }

    /// Wrap a pre-built `reqwest::Client`.
    ///
    /// The caller is responsible for disabling redirects: a 303 must
    /// reach the protocol layer rather than be followed.
    pub fn with_client(http: reqwest::Client, config: EndpointConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    pub fn host(&self) -> &str {
        &self.config.host
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// `{scheme}://{host}:{port}/networkService/v1.1/{segments...}`
    pub(crate) fn url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = Url::parse(&format!(
            "{}://{}:{}/",
            self.config.scheme.as_str(),
            self.config.host,
            self.config.port
        ))?;
        url.path_segments_mut()
            .map_err(|()| Error::controller(format!("invalid controller host: {}", self.config.host)))?
            .clear()
            .extend(BASE_PATH)
            .extend(segments);
        Ok(url)
    }

    fn check_config(&self) -> Result<(), Error> {
        let password = self.config.password.expose_secret();
        if self.config.host.trim().is_empty() {
            return Err(Error::controller("controller hostname is not configured"));
        }
        if self.config.username.is_empty() || password.is_empty() {
            return Err(Error::controller(format!(
                "controller {} is missing a username or password",
                self.config.host
            )));
        }
        Ok(())
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// POST a JSON body. Returns the new token.
    pub(crate) async fn create(
        &self,
        session: &mut SessionState,
        segments: &[&str],
        body: &serde_json::Value,
    ) -> Result<HashToken, Error> {
        let reply = self
            .execute(session, Method::POST, segments, Some(body))
            .await?;
        Ok(reply.hash)
    }

    /// PUT a JSON body. Returns the new token.
    pub(crate) async fn modify(
        &self,
        session: &mut SessionState,
        segments: &[&str],
        body: &serde_json::Value,
    ) -> Result<HashToken, Error> {
        let reply = self
            .execute(session, Method::PUT, segments, Some(body))
            .await?;
        Ok(reply.hash)
    }

    /// DELETE a resource. A 404 counts as success.
    pub(crate) async fn delete(
        &self,
        session: &mut SessionState,
        segments: &[&str],
    ) -> Result<HashToken, Error> {
        let reply = self.execute(session, Method::DELETE, segments, None).await?;
        Ok(reply.hash)
    }

    /// GET a resource. The payload is `None` when the call produced a
    /// protocol sentinel (303 or 409) instead of a document.
    pub(crate) async fn get<T: DeserializeOwned + Default>(
        &self,
        session: &mut SessionState,
        segments: &[&str],
    ) -> Result<(HashToken, Option<T>), Error> {
        let reply = self.execute(session, Method::GET, segments, None).await?;
        if reply.hash.is_sentinel() {
            return Ok((reply.hash, None));
        }
        if reply.body.trim().is_empty() {
            return Ok((reply.hash, Some(T::default())));
        }
        let value = serde_json::from_str(&reply.body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&reply.body)),
            body: reply.body.clone(),
        })?;
        Ok((reply.hash, Some(value)))
    }

    async fn execute(
        &self,
        session: &mut SessionState,
        method: Method,
        segments: &[&str],
        body: Option<&serde_json::Value>,
    ) -> Result<Reply, Error> {
        self.check_config()?;
        let url = self.url(segments)?;
        debug!(host = %self.config.host, "{method} {url}");

        let mut builder = self
            .http
            .request(method.clone(), url)
            .header(INSTANCE_ID_HEADER, self.config.instance_id())
            .basic_auth(
                &self.config.username,
                Some(self.config.password.expose_secret()),
            );
        if let Some(hash) = session.hash.header_value() {
            builder = builder.header(HASH_MATCH_HEADER, hash);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let text = if status.is_success() {
            resp.text().await?
        } else {
            resp.text().await.unwrap_or_default()
        };

        self.interpret(session, &method, status, &headers, text)
    }

    /// Apply the hash protocol to a response.
    fn interpret(
        &self,
        session: &mut SessionState,
        method: &Method,
        status: StatusCode,
        headers: &HeaderMap,
        body: String,
    ) -> Result<Reply, Error> {
        let host = &self.config.host;

        if status.is_success() {
            let hash = headers
                .get(HASH_MATCH_HEADER)
                .and_then(|v| v.to_str().ok())
                .map_or(HashToken::Empty, HashToken::parse);
            session.hash = hash.clone();
            return Ok(Reply { hash, body });
        }

        match status {
            StatusCode::SEE_OTHER => {
                if session.is_master {
                    info!(host, "controller is no longer master");
                }
                session.is_master = false;
                session.hash = HashToken::Ignore;
                Ok(Reply::sentinel(HashToken::Ignore))
            }
            StatusCode::CONFLICT if *method == Method::GET => {
                debug!(host, "stale read, controller reported hash conflict");
                Ok(Reply::sentinel(HashToken::Conflict))
            }
            StatusCode::CONFLICT => {
                warn!(host, %method, "write rejected with hash conflict, topology sync required");
                Err(Error::ControllerApi {
                    message: format!("{host}: hash conflict, topology sync required"),
                    status: Some(status.as_u16()),
                    topology_sync_required: true,
                })
            }
            StatusCode::NOT_FOUND if *method == Method::DELETE => {
                debug!(host, "delete target already absent");
                Ok(Reply::sentinel(HashToken::Empty))
            }
            StatusCode::BAD_REQUEST => Err(Error::MalformedRequest {
                message: format!("{host}: {}", preview(&body)),
            }),
            _ => {
                warn!(host, %method, status = status.as_u16(), body = preview(&body), "controller request failed");
                Err(Error::ControllerApi {
                    message: body,
                    status: Some(status.as_u16()),
                    topology_sync_required: false,
                })
            }
        }
    }
}

fn preview(body: &str) -> &str {
    let end = body
        .char_indices()
        .nth(200)
        .map_or(body.len(), |(idx, _)| idx);
    &body[..end]
}
