// HTTP-backed gateway over `convergent_api::GatewayClient`.

use async_trait::async_trait;
use convergent_api::types::MutationBody;
use convergent_api::{GatewayClient, TlsMode, TransportConfig};
use tracing::debug;

use super::{MutationRequest, RemoteGateway, StatusFetcher};
use crate::config::{GatewayConfig, TlsVerification};
use crate::error::CoreError;
use crate::model::{CollectionScope, OperationHandle, RemoteItem, StatusReport, Submission};

/// The remote service reached over HTTPS.
pub struct HttpGateway {
    client: GatewayClient,
}

impl HttpGateway {
    pub fn new(client: GatewayClient) -> Self {
        Self { client }
    }

    /// Build the underlying HTTP client from connection settings.
    pub fn connect(config: &GatewayConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            tls: tls_to_transport(&config.tls),
            timeout: config.timeout,
        };
        let client = GatewayClient::new(config.endpoint.clone(), config.token.as_ref(), &transport)?;
        debug!(endpoint = %config.endpoint, "gateway client ready");
        Ok(Self { client })
    }

    pub fn client(&self) -> &GatewayClient {
        &self.client
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}

#[async_trait]
impl StatusFetcher for HttpGateway {
    async fn fetch_status(&self, handle: &OperationHandle) -> Result<StatusReport, CoreError> {
        let resp = self.client.get_operation(handle.as_str()).await?;
        Ok(resp.into())
    }
}

#[async_trait]
impl RemoteGateway for HttpGateway {
    async fn submit_mutation(&self, request: &MutationRequest) -> Result<Submission, CoreError> {
        let body = MutationBody::from(request);
        let resp = self
            .client
            .submit_mutation(request.scope.as_str(), &body)
            .await?;
        Ok(resp.into())
    }

    async fn fetch_collection(&self, scope: &CollectionScope) -> Result<Vec<RemoteItem>, CoreError> {
        let items = self.client.list_items(scope.as_str()).await?;
        Ok(items.into_iter().map(RemoteItem::from).collect())
    }
}
