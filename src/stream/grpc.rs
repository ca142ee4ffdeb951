//! 基于 tonic 的流句柄实现
//!
//! 入站为任意 `Stream<Item = Result<Req, Status>>`（例如 `tonic::Streaming<Req>`），
//! 出站写入 mpsc 通道，接收端以 `ReceiverStream` 形式作为 tonic 的响应流返回。

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use tokio::sync::{Mutex, mpsc};
use tokio_stream::wrappers::ReceiverStream;
use tonic::metadata::MetadataMap;
use tonic::{Request, Status};

use super::ServerStream;
use crate::context::Context;

/// 出站响应流类型
pub type ResponseStream<Resp> = ReceiverStream<Result<Resp, Status>>;

/// tonic 流句柄
pub struct GrpcServerStream<Req, Resp> {
    context: Context,
    inbound: Mutex<BoxStream<'static, Result<Req, Status>>>,
    outbound: mpsc::Sender<Result<Resp, Status>>,
}

impl<Req, Resp> GrpcServerStream<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    /// 创建流句柄，返回句柄与出站响应流
    pub fn new<S>(context: Context, inbound: S, buffer: usize) -> (Self, ResponseStream<Resp>)
    where
        S: Stream<Item = Result<Req, Status>> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let stream = Self {
            context,
            inbound: Mutex::new(inbound.boxed()),
            outbound: tx,
        };
        (stream, ReceiverStream::new(rx))
    }

    /// 从 tonic 流式请求创建句柄，根上下文取自请求 metadata
    pub fn from_request<S>(request: Request<S>, buffer: usize) -> (Self, ResponseStream<Resp>)
    where
        S: Stream<Item = Result<Req, Status>> + Send + 'static,
    {
        let context = Context::from_request(&request);
        Self::new(context, request.into_inner(), buffer)
    }

    /// 以错误状态终止出站流
    pub async fn send_status(&self, status: Status) -> Result<(), Status> {
        self.outbound
            .send(Err(status))
            .await
            .map_err(|_| Status::cancelled("client disconnected"))
    }

    /// 等待客户端关闭出站流
    pub async fn closed(&self) {
        self.outbound.closed().await
    }

    pub fn is_closed(&self) -> bool {
        self.outbound.is_closed()
    }
}

#[async_trait]
impl<Req, Resp> ServerStream<Req, Resp> for GrpcServerStream<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    fn context(&self) -> &Context {
        &self.context
    }

    fn metadata(&self) -> &MetadataMap {
        self.context.metadata()
    }

    async fn send_message(&self, message: Resp) -> Result<(), Status> {
        self.outbound
            .send(Ok(message))
            .await
            .map_err(|_| Status::cancelled("client disconnected"))
    }

    async fn recv_message(&self) -> Result<Option<Req>, Status> {
        let mut inbound = self.inbound.lock().await;
        inbound.next().await.transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn context_comes_from_request_metadata() {
        let mut request = Request::new(futures::stream::empty::<Result<String, Status>>());
        request
            .metadata_mut()
            .insert("x-organization", "acme".parse().unwrap());

        let (stream, _outbound) = GrpcServerStream::<String, String>::from_request(request, 1);
        assert_eq!(
            stream.metadata().get("x-organization").unwrap().to_str().unwrap(),
            "acme"
        );
        assert_eq!(assert_ok!(stream.recv_message().await), None);
    }

    #[tokio::test]
    async fn send_after_client_disconnect_is_cancelled() {
        let (stream, outbound) =
            GrpcServerStream::<(), u8>::new(Context::new(), futures::stream::empty(), 1);
        drop(outbound);

        assert!(stream.is_closed());
        let err = assert_err!(stream.send_message(1).await);
        assert_eq!(err.code(), tonic::Code::Cancelled);
    }

    #[tokio::test]
    async fn concurrent_send_and_receive() {
        let inbound = futures::stream::iter((0..16u32).map(Ok));
        let (stream, outbound) = GrpcServerStream::<u32, u32>::new(Context::new(), inbound, 4);
        let stream = Arc::new(stream);

        let reader = {
            let stream = Arc::clone(&stream);
            tokio::spawn(async move {
                let mut sum = 0;
                while let Some(value) = stream.recv_message().await.unwrap() {
                    sum += value;
                }
                sum
            })
        };
        let writer = {
            let stream = Arc::clone(&stream);
            tokio::spawn(async move {
                for value in 0..8u32 {
                    stream.send_message(value).await.unwrap();
                }
            })
        };

        let received: Vec<u32> = outbound.take(8).map(|item| item.unwrap()).collect().await;
        writer.await.unwrap();
        assert_eq!(reader.await.unwrap(), (0..16).sum::<u32>());
        assert_eq!(received, (0..8).collect::<Vec<_>>());
    }
}
