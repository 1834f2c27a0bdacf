// Gateway HTTP client
//
// Wraps `reqwest::Client` with scope-aware URL construction and status
// mapping. The service exposes three shapes: submit a mutation, read an
// operation's status, and read a whole collection.

use serde::Serialize;
use serde::de::DeserializeOwned;
use secrecy::SecretString;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::{ErrorBody, ItemResponse, ItemsResponse, MutationBody, OperationResponse};

/// Raw HTTP client for the remote configuration service.
///
/// All methods return decoded payloads; non-2xx responses are mapped to
/// [`Error`] variants before the caller sees them.
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: Url,
}

impl GatewayClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// When `token` is present it is sent as a bearer credential on every
    /// request.
    pub fn new(
        base_url: Url,
        token: Option<&SecretString>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = match token {
            Some(token) => transport.build_authenticated_client(token)?,
            None => transport.build_client()?,
        };
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Url::parse(base_url)?;
        Ok(Self { http, base_url })
    }

    /// The service base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        let full = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Ok(Url::parse(&full)?)
    }

    /// `operations/<id>`, with the id escaped as a single path segment.
    fn operation_url(&self, id: &str) -> Result<Url, Error> {
        let mut url = self.url("operations")?;
        url.path_segments_mut()
            .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }

    fn scope_url(&self, scope: &str, tail: &str) -> Result<Url, Error> {
        self.url(&format!("scopes/{}/{tail}", scope.trim_matches('/')))
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Submit a mutation for asynchronous application.
    ///
    /// The service answers `202 Accepted` with the operation's initial
    /// status; a refused payload surfaces as [`Error::Rejected`].
    pub async fn submit_mutation(
        &self,
        scope: &str,
        body: &MutationBody,
    ) -> Result<OperationResponse, Error> {
        let url = self.scope_url(scope, "mutations")?;
        self.post(url, body).await
    }

    /// Fetch the current status of an accepted mutation.
    pub async fn get_operation(&self, id: &str) -> Result<OperationResponse, Error> {
        let url = self.operation_url(id)?;
        self.get(url).await
    }

    /// Fetch every member of a collection, in the service's order.
    pub async fn list_items(&self, scope: &str) -> Result<Vec<ItemResponse>, Error> {
        let url = self.scope_url(scope, "items")?;
        let page: ItemsResponse = self.get(url).await?;
        Ok(page.items)
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(Error::Transport)?;

        Self::parse_response(resp).await
    }

    async fn post<T: DeserializeOwned>(&self, url: Url, body: &impl Serialize) -> Result<T, Error> {
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;

        Self::parse_response(resp).await
    }

    /// Decode a 2xx body, or map the status to an [`Error`].
    async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        let path = resp.url().path().to_owned();
        let retry_after = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        let body = resp.text().await.map_err(Error::Transport)?;

        if status.is_success() {
            return serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body,
            });
        }

        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(ErrorBody::into_message)
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    status.to_string()
                } else {
                    body.clone()
                }
            });

        Err(match status.as_u16() {
            401 | 403 => Error::Authentication { message },
            404 => Error::NotFound { path },
            429 => Error::RateLimited {
                retry_after_secs: retry_after.unwrap_or(60),
            },
            code @ 400..=499 => Error::Rejected {
                status: code,
                message,
            },
            code => Error::Server {
                status: code,
                message,
            },
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn scope_urls_tolerate_slashes() {
        let client =
            GatewayClient::from_reqwest("https://api.example.com/v1/", reqwest::Client::new())
                .unwrap();
        let url = client
            .scope_url("/gtm/example.akadns.net/asmaps/map1/", "items")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/v1/scopes/gtm/example.akadns.net/asmaps/map1/items"
        );
    }

    #[test]
    fn operation_urls_escape_the_handle() {
        let client =
            GatewayClient::from_reqwest("https://api.example.com/v1", reqwest::Client::new())
                .unwrap();
        assert_eq!(
            client.operation_url("42").unwrap().as_str(),
            "https://api.example.com/v1/operations/42"
        );
        assert_eq!(
            client.operation_url("a/b?c#d").unwrap().as_str(),
            "https://api.example.com/v1/operations/a%2Fb%3Fc%23d"
        );
    }
}
