//! 服务端流式调用句柄
//!
//! [`ServerStream`] 抽象一次流式调用：读取上下文与入站 metadata、收发消息。
//! 所有方法都取 `&self`，处理器可以把同一个 `Arc` 句柄分给独立的读写任务。

pub mod context_override;
pub mod grpc;

pub use context_override::StreamContextOverride;
pub use grpc::GrpcServerStream;

use async_trait::async_trait;
use tonic::Status;
use tonic::metadata::MetadataMap;

use crate::context::Context;

/// 服务端流式调用句柄
#[async_trait]
pub trait ServerStream<Req, Resp>: Send + Sync
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    /// 调用上下文
    fn context(&self) -> &Context;

    /// 入站请求 metadata
    fn metadata(&self) -> &MetadataMap;

    /// 向客户端发送一条消息
    async fn send_message(&self, message: Resp) -> Result<(), Status>;

    /// 接收客户端的下一条消息，流结束时返回 `None`
    async fn recv_message(&self) -> Result<Option<Req>, Status>;
}
