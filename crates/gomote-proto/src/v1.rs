// Messages for the gomote provisioning service.
// Defined by hand with prost derives so the crate builds without protoc.

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateInstanceRequest {
    #[prost(string, tag = "1")]
    pub builder_type: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Instance {
    #[prost(string, tag = "1")]
    pub gomote_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub builder_type: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateInstanceResponse {
    #[prost(enumeration = "create_instance_response::Status", tag = "1")]
    pub status: i32,
    #[prost(int64, tag = "2")]
    pub waiters_ahead: i64,
    #[prost(message, optional, tag = "3")]
    pub instance: ::core::option::Option<Instance>,
}

pub mod create_instance_response {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Status {
        Unknown = 0,
        Waiting = 1,
        Complete = 2,
    }
}

pub mod gomote_service_client {
    use tonic::codegen::*;

    use super::{CreateInstanceRequest, CreateInstanceResponse};

    const SERVICE: &str = "protos.GomoteService";

    /// Streaming client for the provisioning service.
    ///
    /// Cloning is cheap; clones share the underlying channel and may be used
    /// from concurrent tasks.
    #[derive(Debug, Clone)]
    pub struct GomoteServiceClient<T> {
        inner: tonic::client::Grpc<T>,
    }

    impl GomoteServiceClient<tonic::transport::Channel> {
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }

    impl<T> GomoteServiceClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::Error: Into<StdError>,
        T::ResponseBody: Body<Data = Bytes> + Send + 'static,
        <T::ResponseBody as Body>::Error: Into<StdError> + Send,
    {
        pub fn new(inner: T) -> Self {
            Self {
                inner: tonic::client::Grpc::new(inner),
            }
        }

        /// Requests one instance and returns its progress stream. The stream
        /// yields WAITING updates while queued, then a COMPLETE update, then ends.
        pub async fn create_instance(
            &mut self,
            request: impl tonic::IntoRequest<CreateInstanceRequest>,
        ) -> Result<tonic::Response<tonic::codec::Streaming<CreateInstanceResponse>>, tonic::Status>
        {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/protos.GomoteService/CreateInstance");
            let mut req = request.into_request();
            req.extensions_mut()
                .insert(GrpcMethod::new(SERVICE, "CreateInstance"));
            self.inner.server_streaming(req, path, codec).await
        }
    }
}
