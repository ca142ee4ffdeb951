//! 组织请求头桥接中间件
//!
//! 位于协议转换网关之前，保证转换成 gRPC 调用前请求带有组织头：
//! 1. 已有非空的 `X-Organization` 头：原样放行
//! 2. 否则在路径中查找 `/api` 段；找不到或其前面为空：原样放行（下游必填校验会拒绝）
//! 3. 否则把 `/api` 前面的部分百分号解码后作为组织头，并从转发路径中去掉原始前缀
//!
//! 请求头总是优先于路径。

use std::task::{Context, Poll};

use http::uri::PathAndQuery;
use http::{HeaderName, HeaderValue, Request, Uri};
use percent_encoding::percent_decode_str;
use tower::{Layer, Service};
use tracing::{debug, warn};

use crate::organization::{API_PATH_MARKER, ORGANIZATION_METADATA_KEY};

/// 组织请求头名称（HTTP 头名称不区分大小写）
pub fn organization_header_name() -> HeaderName {
    HeaderName::from_static(ORGANIZATION_METADATA_KEY)
}

/// 在路径中定位 `/api` 段，返回 `(前缀, 组织)`
///
/// `/acme/api/x` 返回 `("/acme", "acme")`；路径以 `/api` 开头、没有 `/api` 段、
/// 或前缀去掉开头的 `/` 后为空时返回 `None`。
pub fn split_organization_path(path: &str) -> Option<(&str, &str)> {
    let index = path.match_indices(API_PATH_MARKER).find_map(|(index, _)| {
        let end = index + API_PATH_MARKER.len();
        match path.as_bytes().get(end) {
            None | Some(b'/') => Some(index),
            Some(_) => None,
        }
    })?;

    let prefix = &path[..index];
    let organization = prefix.strip_prefix('/').unwrap_or(prefix);
    if organization.is_empty() {
        return None;
    }
    Some((prefix, organization))
}

/// 去掉 URI 路径的前缀，保留查询串
fn strip_path_prefix(uri: &Uri, prefix: &str) -> Result<Uri, http::Error> {
    let path = &uri.path()[prefix.len()..];
    let path_and_query = match uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(path_and_query)?);
    Ok(Uri::from_parts(parts)?)
}

/// 补齐组织头并改写路径
pub fn bridge_request<B>(mut req: Request<B>) -> Request<B> {
    let header = organization_header_name();
    if req.headers().get(&header).is_some_and(|v| !v.is_empty()) {
        return req;
    }

    let Some((prefix, organization)) = split_organization_path(req.uri().path()) else {
        return req;
    };

    let organization = match percent_decode_str(organization).decode_utf8() {
        Ok(organization) => organization,
        Err(err) => {
            warn!(path = %req.uri().path(), error = %err, "Organization path segment is not valid UTF-8");
            return req;
        }
    };

    let value = match HeaderValue::from_str(&organization) {
        Ok(value) => value,
        Err(err) => {
            warn!(path = %req.uri().path(), error = %err, "Organization path segment is not a valid header value");
            return req;
        }
    };

    let uri = match strip_path_prefix(req.uri(), prefix) {
        Ok(uri) => uri,
        Err(err) => {
            warn!(path = %req.uri().path(), error = %err, "Failed to strip organization path prefix");
            return req;
        }
    };

    debug!(organization = %organization, from = %req.uri().path(), to = %uri.path(), "Organization taken from path");
    req.headers_mut().insert(header, value);
    *req.uri_mut() = uri;
    req
}

/// 组织请求头桥接层
#[derive(Debug, Clone, Copy, Default)]
pub struct OrganizationHeaderLayer;

impl OrganizationHeaderLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for OrganizationHeaderLayer {
    type Service = OrganizationHeaderService<S>;

    fn layer(&self, service: S) -> Self::Service {
        OrganizationHeaderService::new(service)
    }
}

/// 组织请求头桥接服务
#[derive(Debug, Clone)]
pub struct OrganizationHeaderService<S> {
    inner: S,
}

impl<S> OrganizationHeaderService<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S, B> Service<Request<B>> for OrganizationHeaderService<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        self.inner.call(bridge_request(req))
    }
}
