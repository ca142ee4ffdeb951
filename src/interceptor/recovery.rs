//! 恢复拦截器：把后续阶段中的 panic 转换为 `Internal` 状态

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use tonic::Status;
use tracing::error;

use super::{
    StreamInterceptor, StreamNext, StreamServerInfo, UnaryInterceptor, UnaryNext,
    UnaryServerInfo,
};
use crate::context::Context;
use crate::stream::ServerStream;

/// 恢复拦截器
#[derive(Debug, Clone, Copy, Default)]
pub struct RecoveryInterceptor;

impl RecoveryInterceptor {
    pub fn new() -> Self {
        Self
    }

    fn recover(method: &str, panic: Box<dyn Any + Send>) -> Status {
        let message = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());

        error!(method, panic = %message, "Recovered from panic in gRPC call");
        Status::internal(format!("panic: {message}"))
    }
}

#[async_trait]
impl<Req, Resp> UnaryInterceptor<Req, Resp> for RecoveryInterceptor
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    async fn intercept(
        &self,
        ctx: Context,
        request: Req,
        info: &UnaryServerInfo,
        next: UnaryNext<'_, Req, Resp>,
    ) -> Result<Resp, Status> {
        match AssertUnwindSafe(next.run(ctx, request)).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(Self::recover(&info.full_method, panic)),
        }
    }
}

#[async_trait]
impl<Req, Resp> StreamInterceptor<Req, Resp> for RecoveryInterceptor
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    async fn intercept(
        &self,
        stream: Arc<dyn ServerStream<Req, Resp>>,
        info: &StreamServerInfo,
        next: StreamNext<'_, Req, Resp>,
    ) -> Result<(), Status> {
        match AssertUnwindSafe(next.run(stream)).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(Self::recover(&info.full_method, panic)),
        }
    }
}
