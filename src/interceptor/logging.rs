use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tonic::Status;
use tracing::{info, warn};

use super::{
    StreamInterceptor, StreamNext, StreamServerInfo, UnaryInterceptor, UnaryNext,
    UnaryServerInfo,
};
use crate::context::Context;
use crate::error::grpc::error_code_from_status;
use crate::stream::ServerStream;

/// 日志拦截器
///
/// 记录调用开始与结束（状态码、耗时），不改变调用结果。
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingInterceptor;

impl LoggingInterceptor {
    pub fn new() -> Self {
        Self
    }

    fn finish<T>(method: &str, start: Instant, result: &Result<T, Status>) {
        let elapsed_ms = start.elapsed().as_millis() as u64;
        match result {
            Ok(_) => info!(method, elapsed_ms, code = "OK", "gRPC call finished"),
            Err(status) => warn!(
                method,
                elapsed_ms,
                code = ?status.code(),
                error_code = error_code_from_status(status).map(|code| code.as_str()),
                message = status.message(),
                "gRPC call failed"
            ),
        }
    }
}

#[async_trait]
impl<Req, Resp> UnaryInterceptor<Req, Resp> for LoggingInterceptor
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
        let start = Instant::now();
        info!(method = %info.full_method, "gRPC request");

        let result = next.run(ctx, request).await;
        Self::finish(&info.full_method, start, &result);
        result
    }
}

#[async_trait]
impl<Req, Resp> StreamInterceptor<Req, Resp> for LoggingInterceptor
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
        let start = Instant::now();
        info!(
            method = %info.full_method,
            client_stream = info.is_client_stream,
            server_stream = info.is_server_stream,
            "gRPC stream started"
        );

        let result = next.run(stream).await;
        Self::finish(&info.full_method, start, &result);
        result
    }
}
