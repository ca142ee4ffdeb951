//! gRPC 错误处理
//!
//! 提供 OrganizationError 到 tonic::Status 的转换

use super::{ErrorCode, OrganizationError};
use tonic::{Code, Status};

/// Status metadata 中携带错误代码的键
pub const ERROR_CODE_METADATA_KEY: &str = "error-code";

impl From<OrganizationError> for Status {
    fn from(err: OrganizationError) -> Self {
        let code = err.code();
        let message = match err {
            OrganizationError::MissingOrganization => "organization is required",
            OrganizationError::OrganizationNotPermitted { .. } => "organization not allowed",
            OrganizationError::Rejected(status) => return status,
        };

        let mut status = Status::new(map_error_code_to_grpc(code), message);
        if let Ok(value) = code.as_u32().to_string().parse() {
            status.metadata_mut().insert(ERROR_CODE_METADATA_KEY, value);
        }
        status
    }
}

/// 将错误代码映射到 gRPC 状态码
pub fn map_error_code_to_grpc(code: ErrorCode) -> Code {
    match code {
        ErrorCode::OrganizationRequired => Code::InvalidArgument,
        ErrorCode::OrganizationNotPermitted => Code::PermissionDenied,
        ErrorCode::ValidationRejected => Code::Unknown,
    }
}

/// 从 Status 的 metadata 中读取错误代码
pub fn error_code_from_status(status: &Status) -> Option<ErrorCode> {
    status
        .metadata()
        .get(ERROR_CODE_METADATA_KEY)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u32>().ok())
        .and_then(ErrorCode::from_u32)
}
