use async_trait::async_trait;
use futures::{Stream, StreamExt};
use gomote_core::{CreationRequest, CreationUpdate};
use gomote_proto::v1;
use gomote_proto::v1::gomote_service_client::GomoteServiceClient;
use std::pin::Pin;
use thiserror::Error;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use tracing::debug;

#[derive(Debug, Clone, Error)]
pub enum ProvisioningError {
    #[error("connecting to provisioning service: {0}")]
    Connection(String),
    #[error("{0}")]
    Rpc(String),
    #[error("malformed update: {0}")]
    Protocol(String),
}

impl From<tonic::Status> for ProvisioningError {
    fn from(status: tonic::Status) -> Self {
        ProvisioningError::Rpc(format!(
            "rpc error: code = {:?} desc = {}",
            status.code(),
            status.message()
        ))
    }
}

/// Progress updates for a single creation request, in server order.
pub type UpdateStream =
    Pin<Box<dyn Stream<Item = Result<CreationUpdate, ProvisioningError>> + Send>>;

/// Source of instance creation streams.
///
/// Implementations must be callable from many tasks at once.
#[async_trait]
pub trait ProvisioningRepository: Send + Sync {
    async fn create_instance(
        &self,
        request: CreationRequest,
    ) -> Result<UpdateStream, ProvisioningError>;
}

/// Provisioning over the gomote gRPC service.
#[derive(Debug, Clone)]
pub struct GrpcProvisioningRepository {
    client: GomoteServiceClient<Channel>,
}

impl GrpcProvisioningRepository {
    pub fn new(client: GomoteServiceClient<Channel>) -> Self {
        Self { client }
    }

    /// Lazily connects to `addr`, enabling TLS for `https` endpoints.
    pub fn connect(addr: &str) -> Result<Self, ProvisioningError> {
        let mut endpoint = Endpoint::from_shared(addr.to_string())
            .map_err(|e| ProvisioningError::Connection(format!("{addr}: {e}")))?;
        if addr.starts_with("https://") {
            endpoint = endpoint
                .tls_config(ClientTlsConfig::new())
                .map_err(|e| ProvisioningError::Connection(format!("{addr}: {e}")))?;
        }
        let channel = endpoint.connect_lazy();
        debug!(addr, "Configured provisioning channel");
        Ok(Self::new(GomoteServiceClient::new(channel)))
    }
}

#[async_trait]
impl ProvisioningRepository for GrpcProvisioningRepository {
    async fn create_instance(
        &self,
        request: CreationRequest,
    ) -> Result<UpdateStream, ProvisioningError> {
        let mut client = self.client.clone();
        let response = client
            .create_instance(v1::CreateInstanceRequest::from(request))
            .await?;

        Ok(into_updates(response.into_inner()))
    }
}

/// Maps the server's response stream onto creation updates.
fn into_updates<S>(responses: S) -> UpdateStream
where
    S: Stream<Item = Result<v1::CreateInstanceResponse, tonic::Status>> + Send + 'static,
{
    Box::pin(responses.map(|item| match item {
        Ok(message) => CreationUpdate::try_from(message).map_err(ProvisioningError::Protocol),
        Err(status) => Err(ProvisioningError::from(status)),
    }))
}
