//! HTTP 中间件模块
//!
//! 提供 HTTP 到 gRPC 网关之前的组织请求头桥接层

pub mod organization;

pub use organization::{
    OrganizationHeaderLayer, OrganizationHeaderService, bridge_request, organization_header_name,
    split_organization_path,
};
