#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Artifact {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub location: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RunCompletionEvent {
    #[prost(enumeration = "Status", tag = "1")]
    pub status: i32,
    /// Formatted as `namespace/name`.
    #[prost(string, tag = "2")]
    pub pipeline_name: ::prost::alloc::string::String,
    /// Formatted as `namespace/name`, empty when the run was not triggered by a run configuration.
    #[prost(string, tag = "3")]
    pub run_configuration_name: ::prost::alloc::string::String,
    /// Formatted as `namespace/name`, empty when the run was not triggered by a run resource.
    #[prost(string, tag = "4")]
    pub run_name: ::prost::alloc::string::String,
    #[prost(string, tag = "5")]
    pub run_id: ::prost::alloc::string::String,
    #[prost(message, repeated, tag = "6")]
    pub serving_model_artifacts: ::prost::alloc::vec::Vec<Artifact>,
    #[prost(message, repeated, tag = "7")]
    pub artifacts: ::prost::alloc::vec::Vec<Artifact>,
    #[prost(string, tag = "8")]
    pub provider: ::prost::alloc::string::String,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Status {
    Succeeded = 0,
    Failed = 1,
}
#[doc = r" Generated client implementations."]
pub mod run_completion_event_trigger_client {
    #![allow(unused_variables, dead_code, missing_docs, clippy::let_unit_value)]
    use tonic::codegen::*;
    #[derive(Debug, Clone)]
    pub struct RunCompletionEventTriggerClient<T> {
        inner: tonic::client::Grpc<T>,
    }
    impl RunCompletionEventTriggerClient<tonic::transport::Channel> {
        #[doc = r" Attempt to create a new client by connecting to a given endpoint."]
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: std::convert::TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }
    impl<T> RunCompletionEventTriggerClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::ResponseBody: Body + Send + Sync + 'static,
        T::Error: Into<StdError>,
        <T::ResponseBody as Body>::Error: Into<StdError> + Send,
    {
        pub fn new(inner: T) -> Self {
            let inner = tonic::client::Grpc::new(inner);
            Self { inner }
        }
        pub async fn process_event_feed(&mut self, request: impl tonic::IntoRequest<super::RunCompletionEvent>) -> Result<tonic::Response<()>, tonic::Status> {
            self.inner
                .ready()
                .await
                .map_err(|e| tonic::Status::new(tonic::Code::Unknown, format!("Service was not ready: {}", e.into())))?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/run_completion_event_trigger.RunCompletionEventTrigger/ProcessEventFeed");
            self.inner.unary(request.into_request(), path, codec).await
        }
    }
}
