//! 组织标识错误处理模块
//!
//! 区分两类失败：
//! - 客户端导致、可恢复的校验拒绝（缺失组织、组织不被允许）
//! - 程序员导致、不可恢复的上下文绑定缺失（拦截器链配置错误或被绕过）

pub mod code;
pub mod grpc;

pub use code::ErrorCode;

use thiserror::Error;
use tonic::Status;

/// 组织标识错误
#[derive(Error, Debug, Clone)]
pub enum OrganizationError {
    /// 请求未携带组织标识（或为空）
    #[error("organization is required")]
    MissingOrganization,

    /// 组织标识不在允许列表中
    #[error("organization not allowed: {organization}")]
    OrganizationNotPermitted { organization: String },

    /// 自定义校验器直接给出的 gRPC 状态，原样返回给调用方
    #[error("organization rejected: {}", .0.message())]
    Rejected(Status),
}

impl OrganizationError {
    /// 创建组织不被允许错误
    pub fn not_permitted(organization: impl Into<String>) -> Self {
        OrganizationError::OrganizationNotPermitted {
            organization: organization.into(),
        }
    }

    /// 获取错误代码
    pub fn code(&self) -> ErrorCode {
        match self {
            OrganizationError::MissingOrganization => ErrorCode::OrganizationRequired,
            OrganizationError::OrganizationNotPermitted { .. } => {
                ErrorCode::OrganizationNotPermitted
            }
            OrganizationError::Rejected(_) => ErrorCode::ValidationRejected,
        }
    }
}

/// 在注入之前读取了上下文中的组织绑定
///
/// 说明拦截器链配置错误或被绕过。没有到 `tonic::Status` 的转换，
/// 处理器不能用 `?` 把它当作普通的调用失败返回给客户端。
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("organization not found in context")]
pub struct ContextBindingAbsent;

/// 组织校验结果类型
pub type Result<T> = std::result::Result<T, OrganizationError>;
