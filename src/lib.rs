//! Flare Organization
//!
//! Multi-tenant organization propagation for gRPC services: extracts the
//! `X-Organization` tenant label from call metadata, validates it through an
//! ordered validator chain, and injects it into an immutable request-scoped
//! context for unary and streaming handlers. An HTTP bridge layer and gateway
//! header matcher carry the label from HTTP requests into gRPC metadata.

pub mod config;
pub mod context;
pub mod error;
pub mod gateway;
pub mod interceptor;
pub mod middleware;
pub mod observability;
pub mod organization;
pub mod server;
pub mod stream;
pub mod validator;

// Re-exports
pub use config::{Config, LoggingConfig, OrganizationConfig};
pub use context::{Context, ContextKey};
pub use error::{ContextBindingAbsent, ErrorCode, OrganizationError, Result};
pub use observability::init_tracing;
pub use organization::{
    API_PATH_MARKER, ORGANIZATION_HEADER, ORGANIZATION_METADATA_KEY, Organization,
    extract_organization, organization, organization_from_metadata, try_organization,
    with_organization,
};
pub use validator::{AllowedOrganizations, OrganizationRequired, OrganizationValidator, ValidatorChain};

// gRPC 相关 re-exports
pub use interceptor::{
    LoggingInterceptor, OrganizationInterceptor, OrganizationStreamInterceptor,
    OrganizationUnaryInterceptor, RecoveryInterceptor, RequestContextExt, StreamChain,
    StreamHandler, StreamInterceptor, StreamNext, StreamServerInfo, UnaryChain, UnaryHandler,
    UnaryInterceptor, UnaryNext, UnaryServerInfo,
};
pub use server::{DEFAULT_STREAM_BUFFER, serve_streaming, serve_unary};
pub use stream::{GrpcServerStream, ServerStream, StreamContextOverride};

// HTTP 相关 re-exports
pub use gateway::{DefaultHeaderMatcher, HeaderMatcher, OrganizationHeaderMatcher, forward_headers};
pub use middleware::{OrganizationHeaderLayer, OrganizationHeaderService};
