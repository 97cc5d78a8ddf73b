/// A value in properties.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Value {
    #[prost(oneof = "value::Value", tags = "1, 2, 3, 6")]
    pub value: ::core::option::Option<value::Value>,
}
/// Nested message and enum types in `Value`.
pub mod value {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Value {
        #[prost(int64, tag = "1")]
        IntValue(i64),
        #[prost(double, tag = "2")]
        DoubleValue(f64),
        #[prost(string, tag = "3")]
        StringValue(::prost::alloc::string::String),
        #[prost(bool, tag = "6")]
        BoolValue(bool),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Artifact {
    /// The id of the artifact.
    #[prost(int64, optional, tag = "1")]
    pub id: ::core::option::Option<i64>,
    /// The id of an ArtifactType.
    #[prost(int64, optional, tag = "2")]
    pub type_id: ::core::option::Option<i64>,
    /// The uniform resource identifier of the physical artifact.
    #[prost(string, optional, tag = "3")]
    pub uri: ::core::option::Option<::prost::alloc::string::String>,
    /// Properties of the Artifact, as declared by its type.
    #[prost(map = "string, message", tag = "4")]
    pub properties: ::std::collections::HashMap<::prost::alloc::string::String, Value>,
    /// User provided custom properties which are not defined by its type.
    #[prost(map = "string, message", tag = "5")]
    pub custom_properties: ::std::collections::HashMap<::prost::alloc::string::String, Value>,
    /// The client provided name of the artifact.
    #[prost(string, optional, tag = "7")]
    pub name: ::core::option::Option<::prost::alloc::string::String>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ArtifactType {
    /// The id of the type.
    #[prost(int64, optional, tag = "1")]
    pub id: ::core::option::Option<i64>,
    /// The name of the type.
    #[prost(string, optional, tag = "2")]
    pub name: ::core::option::Option<::prost::alloc::string::String>,
}
/// An event represents a relationship between an artifact and an execution.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Event {
    /// The artifact id is required for an event.
    #[prost(int64, optional, tag = "1")]
    pub artifact_id: ::core::option::Option<i64>,
    /// The execution id is required for an event.
    #[prost(int64, optional, tag = "2")]
    pub execution_id: ::core::option::Option<i64>,
    /// The type of an event.
    #[prost(enumeration = "event::Type", optional, tag = "4")]
    pub r#type: ::core::option::Option<i32>,
}
/// Nested message and enum types in `Event`.
pub mod event {
    /// Events distinguish between an artifact that is written by the execution
    /// (possibly as a cache), versus artifacts that are part of the declared
    /// output of the Execution.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Type {
        Unknown = 0,
        DeclaredOutput = 1,
        DeclaredInput = 2,
        Input = 3,
        Output = 4,
        InternalInput = 5,
        InternalOutput = 6,
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Execution {
    /// The id of the execution.
    #[prost(int64, optional, tag = "1")]
    pub id: ::core::option::Option<i64>,
    /// The id of an ExecutionType.
    #[prost(int64, optional, tag = "2")]
    pub type_id: ::core::option::Option<i64>,
    /// Properties of the Execution, as declared by its type.
    #[prost(map = "string, message", tag = "4")]
    pub properties: ::std::collections::HashMap<::prost::alloc::string::String, Value>,
    /// User provided custom properties which are not defined by its type.
    #[prost(map = "string, message", tag = "5")]
    pub custom_properties: ::std::collections::HashMap<::prost::alloc::string::String, Value>,
    /// The client provided name of the execution.
    #[prost(string, optional, tag = "9")]
    pub name: ::core::option::Option<::prost::alloc::string::String>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Context {
    /// The id of the context.
    #[prost(int64, optional, tag = "1")]
    pub id: ::core::option::Option<i64>,
    /// The id of a ContextType.
    #[prost(int64, optional, tag = "2")]
    pub type_id: ::core::option::Option<i64>,
    /// The name of the context. It must be unique within a database and type.
    #[prost(string, optional, tag = "3")]
    pub name: ::core::option::Option<::prost::alloc::string::String>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetArtifactTypeRequest {
    #[prost(string, optional, tag = "1")]
    pub type_name: ::core::option::Option<::prost::alloc::string::String>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetArtifactTypeResponse {
    /// Gets an artifact type, or None if it does not exist.
    #[prost(message, optional, tag = "1")]
    pub artifact_type: ::core::option::Option<ArtifactType>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetContextByTypeAndNameRequest {
    #[prost(string, optional, tag = "1")]
    pub type_name: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(string, optional, tag = "2")]
    pub context_name: ::core::option::Option<::prost::alloc::string::String>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetContextByTypeAndNameResponse {
    #[prost(message, optional, tag = "1")]
    pub context: ::core::option::Option<Context>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetArtifactsByContextRequest {
    #[prost(int64, optional, tag = "1")]
    pub context_id: ::core::option::Option<i64>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetArtifactsByContextResponse {
    #[prost(message, repeated, tag = "1")]
    pub artifacts: ::prost::alloc::vec::Vec<Artifact>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetExecutionsByContextRequest {
    #[prost(int64, optional, tag = "1")]
    pub context_id: ::core::option::Option<i64>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetExecutionsByContextResponse {
    #[prost(message, repeated, tag = "1")]
    pub executions: ::prost::alloc::vec::Vec<Execution>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetEventsByExecutionIDsRequest {
    #[prost(int64, repeated, packed = "false", tag = "1")]
    pub execution_ids: ::prost::alloc::vec::Vec<i64>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetEventsByExecutionIDsResponse {
    #[prost(message, repeated, tag = "1")]
    pub events: ::prost::alloc::vec::Vec<Event>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetArtifactsByIdRequest {
    /// A list of artifact ids to retrieve.
    #[prost(int64, repeated, packed = "false", tag = "1")]
    pub artifact_ids: ::prost::alloc::vec::Vec<i64>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetArtifactsByIdResponse {
    /// Artifacts with matching ids.
    #[prost(message, repeated, tag = "1")]
    pub artifacts: ::prost::alloc::vec::Vec<Artifact>,
}
#[doc = r" Generated client implementations."]
pub mod metadata_store_service_client {
    #![allow(unused_variables, dead_code, missing_docs, clippy::let_unit_value)]
    use tonic::codegen::*;
    #[doc = " A read-only subset of the ML metadata store service."]
    #[derive(Debug, Clone)]
    pub struct MetadataStoreServiceClient<T> {
        inner: tonic::client::Grpc<T>,
    }
    impl MetadataStoreServiceClient<tonic::transport::Channel> {
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
    impl<T> MetadataStoreServiceClient<T>
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
        #[doc = " Gets an artifact type by name."]
        pub async fn get_artifact_type(&mut self, request: impl tonic::IntoRequest<super::GetArtifactTypeRequest>) -> Result<tonic::Response<super::GetArtifactTypeResponse>, tonic::Status> {
            self.inner
                .ready()
                .await
                .map_err(|e| tonic::Status::new(tonic::Code::Unknown, format!("Service was not ready: {}", e.into())))?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/ml_metadata.MetadataStoreService/GetArtifactType");
            self.inner.unary(request.into_request(), path, codec).await
        }
        #[doc = " Gets the context of the given type and name."]
        pub async fn get_context_by_type_and_name(
            &mut self, request: impl tonic::IntoRequest<super::GetContextByTypeAndNameRequest>,
        ) -> Result<tonic::Response<super::GetContextByTypeAndNameResponse>, tonic::Status> {
            self.inner
                .ready()
                .await
                .map_err(|e| tonic::Status::new(tonic::Code::Unknown, format!("Service was not ready: {}", e.into())))?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/ml_metadata.MetadataStoreService/GetContextByTypeAndName");
            self.inner.unary(request.into_request(), path, codec).await
        }
        #[doc = " Gets all direct artifacts of a context."]
        pub async fn get_artifacts_by_context(
            &mut self, request: impl tonic::IntoRequest<super::GetArtifactsByContextRequest>,
        ) -> Result<tonic::Response<super::GetArtifactsByContextResponse>, tonic::Status> {
            self.inner
                .ready()
                .await
                .map_err(|e| tonic::Status::new(tonic::Code::Unknown, format!("Service was not ready: {}", e.into())))?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/ml_metadata.MetadataStoreService/GetArtifactsByContext");
            self.inner.unary(request.into_request(), path, codec).await
        }
        #[doc = " Gets all direct executions of a context."]
        pub async fn get_executions_by_context(
            &mut self, request: impl tonic::IntoRequest<super::GetExecutionsByContextRequest>,
        ) -> Result<tonic::Response<super::GetExecutionsByContextResponse>, tonic::Status> {
            self.inner
                .ready()
                .await
                .map_err(|e| tonic::Status::new(tonic::Code::Unknown, format!("Service was not ready: {}", e.into())))?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/ml_metadata.MetadataStoreService/GetExecutionsByContext");
            self.inner.unary(request.into_request(), path, codec).await
        }
        #[doc = " Gets all events with matching execution ids."]
        pub async fn get_events_by_execution_i_ds(
            &mut self, request: impl tonic::IntoRequest<super::GetEventsByExecutionIDsRequest>,
        ) -> Result<tonic::Response<super::GetEventsByExecutionIDsResponse>, tonic::Status> {
            self.inner
                .ready()
                .await
                .map_err(|e| tonic::Status::new(tonic::Code::Unknown, format!("Service was not ready: {}", e.into())))?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/ml_metadata.MetadataStoreService/GetEventsByExecutionIDs");
            self.inner.unary(request.into_request(), path, codec).await
        }
        #[doc = " Retrieves artifacts using a list of artifact ids."]
        pub async fn get_artifacts_by_id(&mut self, request: impl tonic::IntoRequest<super::GetArtifactsByIdRequest>) -> Result<tonic::Response<super::GetArtifactsByIdResponse>, tonic::Status> {
            self.inner
                .ready()
                .await
                .map_err(|e| tonic::Status::new(tonic::Code::Unknown, format!("Service was not ready: {}", e.into())))?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/ml_metadata.MetadataStoreService/GetArtifactsByID");
            self.inner.unary(request.into_request(), path, codec).await
        }
    }
}
