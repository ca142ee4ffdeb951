//! 组织标识
//!
//! 提供组织标识类型、上下文存取以及从 gRPC metadata 中提取组织标识的函数。

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use tonic::metadata::MetadataMap;

use crate::context::{Context, ContextKey};
use crate::error::ContextBindingAbsent;

/// 组织标识 HTTP 头名称
pub const ORGANIZATION_HEADER: &str = "X-Organization";

/// 组织标识 gRPC metadata 键（HTTP 头名称的小写形式）
pub const ORGANIZATION_METADATA_KEY: &str = "x-organization";

/// URL 路径中标记业务路由起点的段
pub const API_PATH_MARKER: &str = "/api";

/// 组织标识（租户）
///
/// 不透明、区分大小写的字符串。空值表示"未提供"，不是合法的组织。
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Organization(String);

impl Organization {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// 空组织标识
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Organization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Organization {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Organization {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for Organization {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Organization {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// 上下文中组织槽位的键，仅本模块可写
struct OrganizationKey;

impl ContextKey for OrganizationKey {
    type Value = Organization;
}

/// 派生一个绑定了组织标识的新上下文，原上下文不变
pub fn with_organization(ctx: &Context, organization: Organization) -> Context {
    ctx.with_value::<OrganizationKey>(organization)
}

/// 读取上下文中已校验的组织标识
///
/// # Panics
///
/// 上下文中没有组织绑定时 panic（[`ContextBindingAbsent`]）。
/// 组织只会由组织拦截器写入，绑定缺失说明拦截器链配置错误或被绕过，
/// 属于程序缺陷而不是客户端请求错误。需要自行处理该情况时使用 [`try_organization`]。
pub fn organization(ctx: &Context) -> &Organization {
    match try_organization(ctx) {
        Ok(organization) => organization,
        Err(err) => panic!("{err}"),
    }
}

/// 读取上下文中的组织标识，绑定缺失时返回 [`ContextBindingAbsent`]
///
/// 该错误不能转换为 `tonic::Status`，调用方需要自行决定如何终止。
pub fn try_organization(ctx: &Context) -> Result<&Organization, ContextBindingAbsent> {
    ctx.value::<OrganizationKey>().ok_or(ContextBindingAbsent)
}

/// 从调用上下文的入站 metadata 中提取组织标识
///
/// 取 `x-organization` 的第一个值；键不存在、没有值或值不是可见 ASCII 时返回空组织。
pub fn extract_organization(ctx: &Context) -> Organization {
    organization_from_metadata(ctx.metadata())
}

/// 从 metadata 中提取组织标识
pub fn organization_from_metadata(metadata: &MetadataMap) -> Organization {
    metadata
        .get(ORGANIZATION_METADATA_KEY)
        .and_then(|v| v.to_str().ok())
        .map(Organization::from)
        .unwrap_or_default()
}
