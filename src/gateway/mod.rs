//! HTTP 网关请求头白名单
//!
//! HTTP 请求转换为 gRPC 调用时，只有匹配器接受的请求头会成为 gRPC metadata。
//! 默认策略与 grpc-gateway 一致：
//! - 永久 HTTP 请求头以 `grpcgateway-<name>` 转发
//! - `Grpc-Metadata-<name>` 去掉前缀后以 `<name>` 转发
//! - 其它请求头丢弃
//!
//! [`OrganizationHeaderMatcher`] 在默认策略之上额外放行组织请求头。

use http::HeaderMap;
use tonic::metadata::{AsciiMetadataKey, AsciiMetadataValue, MetadataMap};
use tracing::debug;

use crate::organization::{ORGANIZATION_HEADER, ORGANIZATION_METADATA_KEY};

/// 网关转发的永久请求头使用的 metadata 前缀
pub const METADATA_HEADER_PREFIX: &str = "grpcgateway-";

/// 直接映射为 metadata 的请求头前缀
pub const METADATA_PREFIX: &str = "Grpc-Metadata-";

const PERMANENT_HTTP_HEADERS: &[&str] = &[
    "Accept",
    "Accept-Charset",
    "Accept-Language",
    "Accept-Ranges",
    "Authorization",
    "Cache-Control",
    "Content-Type",
    "Cookie",
    "Date",
    "Expect",
    "From",
    "Host",
    "If-Match",
    "If-Modified-Since",
    "If-None-Match",
    "If-Schedule-Tag-Match",
    "If-Unmodified-Since",
    "Max-Forwards",
    "Origin",
    "Pragma",
    "Referer",
    "User-Agent",
    "Via",
    "Warning",
];

/// 请求头匹配器
///
/// 返回 `Some(metadata_key)` 表示转发，`None` 表示丢弃。
pub trait HeaderMatcher: Send + Sync {
    fn matches(&self, header: &str) -> Option<String>;
}

impl<F> HeaderMatcher for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn matches(&self, header: &str) -> Option<String> {
        self(header)
    }
}

/// 是否为永久 HTTP 请求头
pub fn is_permanent_http_header(header: &str) -> bool {
    PERMANENT_HTTP_HEADERS
        .iter()
        .any(|permanent| permanent.eq_ignore_ascii_case(header))
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &value[prefix.len()..])
}

/// 网关默认请求头策略
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHeaderMatcher;

impl HeaderMatcher for DefaultHeaderMatcher {
    fn matches(&self, header: &str) -> Option<String> {
        if is_permanent_http_header(header) {
            return Some(format!(
                "{METADATA_HEADER_PREFIX}{}",
                header.to_ascii_lowercase()
            ));
        }
        strip_prefix_ignore_case(header, METADATA_PREFIX)
            .filter(|name| !name.is_empty())
            .map(str::to_ascii_lowercase)
    }
}

/// 放行组织请求头的匹配器，其它请求头交给 `fallback`
#[derive(Debug, Clone, Default)]
pub struct OrganizationHeaderMatcher<M = DefaultHeaderMatcher> {
    fallback: M,
}

impl OrganizationHeaderMatcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<M: HeaderMatcher> OrganizationHeaderMatcher<M> {
    pub fn with_fallback(fallback: M) -> Self {
        Self { fallback }
    }
}

impl<M: HeaderMatcher> HeaderMatcher for OrganizationHeaderMatcher<M> {
    fn matches(&self, header: &str) -> Option<String> {
        if header.eq_ignore_ascii_case(ORGANIZATION_HEADER) {
            return Some(ORGANIZATION_METADATA_KEY.to_string());
        }
        self.fallback.matches(header)
    }
}

/// 把匹配器接受的 HTTP 请求头转换为 gRPC metadata
///
/// 无法表示为 ASCII metadata 的键或值（包括 `-bin` 键）被丢弃。
pub fn forward_headers<M>(headers: &HeaderMap, matcher: &M) -> MetadataMap
where
    M: HeaderMatcher + ?Sized,
{
    let mut metadata = MetadataMap::new();
    for (name, value) in headers {
        let Some(key) = matcher.matches(name.as_str()) else {
            continue;
        };

        let key = match AsciiMetadataKey::from_bytes(key.as_bytes()) {
            Ok(key) => key,
            Err(_) => {
                debug!(header = %name, metadata_key = %key, "Dropping header with invalid metadata key");
                continue;
            }
        };
        let value = match value.to_str().ok().map(str::parse::<AsciiMetadataValue>) {
            Some(Ok(value)) => value,
            _ => {
                debug!(header = %name, "Dropping header with non-ASCII value");
                continue;
            }
        };

        metadata.append(key, value);
    }
    metadata
}
