//! gRPC 服务端入口
//!
//! 把 tonic 请求接入拦截器链：构建根上下文、执行链、把结果转换回 tonic 响应。

use std::sync::Arc;

use futures::Stream;
use tokio_util::sync::CancellationToken;
use tonic::{Request, Response, Status};
use tracing::debug;

use crate::context::Context;
use crate::interceptor::{
    StreamChain, StreamHandler, StreamServerInfo, UnaryChain, UnaryHandler, UnaryServerInfo,
};
use crate::stream::grpc::ResponseStream;
use crate::stream::{GrpcServerStream, ServerStream};

/// 流式响应的默认通道容量
pub const DEFAULT_STREAM_BUFFER: usize = 32;

/// 处理一元 tonic 请求
pub async fn serve_unary<Req, Resp>(
    chain: &UnaryChain<Req, Resp>,
    handler: &dyn UnaryHandler<Req, Resp>,
    info: &UnaryServerInfo,
    request: Request<Req>,
) -> Result<Response<Resp>, Status>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    let ctx = Context::from_request(&request);
    chain
        .serve(ctx, request.into_inner(), info, handler)
        .await
        .map(Response::new)
}

/// 处理流式 tonic 请求
///
/// 拦截器链与处理器在独立任务中执行，立即返回响应流。
/// 链返回的错误（包括组织校验拒绝）作为响应流的最后一项发送，终止调用。
/// 客户端丢弃响应流时取消调用上下文并停止处理器。
pub fn serve_streaming<S, Req, Resp>(
    chain: StreamChain<Req, Resp>,
    handler: Arc<dyn StreamHandler<Req, Resp>>,
    info: StreamServerInfo,
    request: Request<S>,
    buffer: usize,
) -> Result<Response<ResponseStream<Resp>>, Status>
where
    S: Stream<Item = Result<Req, Status>> + Send + 'static,
    Req: Send + 'static,
    Resp: Send + 'static,
{
    let token = CancellationToken::new();
    let ctx = Context::from_request(&request).with_cancellation(token.clone());
    let (stream, outbound) = GrpcServerStream::new(ctx, request.into_inner(), buffer);
    let stream = Arc::new(stream);

    tokio::spawn(async move {
        let handle: Arc<dyn ServerStream<Req, Resp>> = Arc::clone(&stream) as _;
        let result = tokio::select! {
            result = chain.serve(handle, &info, handler.as_ref()) => result,
            _ = stream.closed() => {
                token.cancel();
                debug!(method = %info.full_method, "Client closed stream");
                return;
            }
        };

        if let Err(status) = result {
            let _ = stream.send_status(status).await;
        }
    });

    Ok(Response::new(outbound))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interceptor::OrganizationUnaryInterceptor;
    use crate::organization::{ORGANIZATION_METADATA_KEY, organization};
    use crate::validator::ValidatorChain;

    #[tokio::test]
    async fn unary_request_metadata_reaches_handler() {
        let chain = UnaryChain::<String, String>::new()
            .with(OrganizationUnaryInterceptor::new(ValidatorChain::standard(["acme"])));
        let handler = |ctx: Context, value: String| async move {
            Ok::<_, Status>(format!("{}, {}", organization(&ctx), value))
        };

        let mut request = Request::new("world".to_string());
        request
            .metadata_mut()
            .insert(ORGANIZATION_METADATA_KEY, "acme".parse().unwrap());

        let response = serve_unary(&chain, &handler, &UnaryServerInfo::new("/t/Get"), request)
            .await
            .unwrap();
        assert_eq!(response.into_inner(), "acme, world");
    }
}
