//! 错误代码定义
//!
//! 与 flare-server-core 的错误代码分段保持一致：
//! - 2000-2999: 认证/授权相关错误（组织标识校验归入此段）
//! - 9000-9999: 通用错误

use serde::{Deserialize, Serialize};
use std::fmt;

/// 组织标识相关的错误代码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u32)]
pub enum ErrorCode {
    // ============================================================
    // 组织校验相关错误 (2100-2199)
    // ============================================================
    OrganizationRequired = 2100,
    OrganizationNotPermitted = 2101,

    // ============================================================
    // 通用错误 (9000-9999)
    // ============================================================
    ValidationRejected = 9005,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ErrorCode {
    /// 获取错误代码的数字值
    #[inline]
    pub fn as_u32(&self) -> u32 {
        *self as u32
    }

    /// 从数字值创建错误代码
    pub fn from_u32(code: u32) -> Option<Self> {
        match code {
            2100 => Some(ErrorCode::OrganizationRequired),
            2101 => Some(ErrorCode::OrganizationNotPermitted),
            9005 => Some(ErrorCode::ValidationRejected),
            _ => None,
        }
    }

    /// 获取错误代码的英文标识符
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::OrganizationRequired => "ORGANIZATION_REQUIRED",
            ErrorCode::OrganizationNotPermitted => "ORGANIZATION_NOT_PERMITTED",
            ErrorCode::ValidationRejected => "VALIDATION_REJECTED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_codes_resolve_back() {
        for code in [
            ErrorCode::OrganizationRequired,
            ErrorCode::OrganizationNotPermitted,
            ErrorCode::ValidationRejected,
        ] {
            assert_eq!(ErrorCode::from_u32(code.as_u32()), Some(code));
        }
        assert_eq!(ErrorCode::from_u32(1), None);
    }

    #[test]
    fn display_uses_identifier() {
        assert_eq!(
            ErrorCode::OrganizationNotPermitted.to_string(),
            "ORGANIZATION_NOT_PERMITTED"
        );
    }
}
