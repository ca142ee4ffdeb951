//! gRPC 拦截器模块
//!
//! 提供一元与流式两种调用形态的拦截器抽象、拦截器链，以及组织、日志、恢复拦截器。
//!
//! 拦截器通过 `next.run(...)` 把调用交给链上的下一个阶段；不调用即短路整个调用，
//! 处理器不会被执行。

pub mod composite;
pub mod logging;
pub mod organization;
pub mod recovery;

pub use composite::{StreamChain, UnaryChain};
pub use logging::LoggingInterceptor;
pub use organization::{
    OrganizationInterceptor, OrganizationStreamInterceptor, OrganizationUnaryInterceptor,
    RequestContextExt,
};
pub use recovery::RecoveryInterceptor;

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tonic::Status;

use crate::context::Context;
use crate::stream::ServerStream;

/// 一元调用信息
#[derive(Debug, Clone, Default)]
pub struct UnaryServerInfo {
    /// 完整方法名，例如 `/dummy.v1.DummyService/GetDummy`
    pub full_method: String,
}

impl UnaryServerInfo {
    pub fn new(full_method: impl Into<String>) -> Self {
        Self {
            full_method: full_method.into(),
        }
    }
}

/// 流式调用信息
#[derive(Debug, Clone, Default)]
pub struct StreamServerInfo {
    pub full_method: String,
    pub is_client_stream: bool,
    pub is_server_stream: bool,
}

impl StreamServerInfo {
    pub fn new(full_method: impl Into<String>, is_client_stream: bool, is_server_stream: bool) -> Self {
        Self {
            full_method: full_method.into(),
            is_client_stream,
            is_server_stream,
        }
    }

    /// 双向流
    pub fn bidi(full_method: impl Into<String>) -> Self {
        Self::new(full_method, true, true)
    }
}

/// 一元业务处理器
#[async_trait]
pub trait UnaryHandler<Req, Resp>: Send + Sync
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    async fn call(&self, ctx: Context, request: Req) -> Result<Resp, Status>;
}

#[async_trait]
impl<F, Fut, Req, Resp> UnaryHandler<Req, Resp> for F
where
    F: Fn(Context, Req) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Resp, Status>> + Send,
    Req: Send + 'static,
    Resp: Send + 'static,
{
    async fn call(&self, ctx: Context, request: Req) -> Result<Resp, Status> {
        self(ctx, request).await
    }
}

/// 流式业务处理器
#[async_trait]
pub trait StreamHandler<Req, Resp>: Send + Sync
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    async fn call(&self, stream: Arc<dyn ServerStream<Req, Resp>>) -> Result<(), Status>;
}

#[async_trait]
impl<F, Fut, Req, Resp> StreamHandler<Req, Resp> for F
where
    F: Fn(Arc<dyn ServerStream<Req, Resp>>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), Status>> + Send,
    Req: Send + 'static,
    Resp: Send + 'static,
{
    async fn call(&self, stream: Arc<dyn ServerStream<Req, Resp>>) -> Result<(), Status> {
        self(stream).await
    }
}

/// 一元拦截器
#[async_trait]
pub trait UnaryInterceptor<Req, Resp>: Send + Sync
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
    ) -> Result<Resp, Status>;
}

/// 流式拦截器
#[async_trait]
pub trait StreamInterceptor<Req, Resp>: Send + Sync
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    async fn intercept(
        &self,
        stream: Arc<dyn ServerStream<Req, Resp>>,
        info: &StreamServerInfo,
        next: StreamNext<'_, Req, Resp>,
    ) -> Result<(), Status>;
}

/// 一元调用链的剩余部分
pub struct UnaryNext<'a, Req: Send + 'static, Resp: Send + 'static> {
    interceptors: &'a [Arc<dyn UnaryInterceptor<Req, Resp>>],
    handler: &'a dyn UnaryHandler<Req, Resp>,
    info: &'a UnaryServerInfo,
}

impl<'a, Req, Resp> UnaryNext<'a, Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    pub(crate) fn new(
        interceptors: &'a [Arc<dyn UnaryInterceptor<Req, Resp>>],
        handler: &'a dyn UnaryHandler<Req, Resp>,
        info: &'a UnaryServerInfo,
    ) -> Self {
        Self {
            interceptors,
            handler,
            info,
        }
    }

    /// 以给定上下文继续执行后续拦截器与处理器
    pub async fn run(self, ctx: Context, request: Req) -> Result<Resp, Status> {
        match self.interceptors.split_first() {
            Some((first, rest)) => {
                let next = UnaryNext::new(rest, self.handler, self.info);
                first.intercept(ctx, request, self.info, next).await
            }
            None => self.handler.call(ctx, request).await,
        }
    }
}

/// 流式调用链的剩余部分
pub struct StreamNext<'a, Req: Send + 'static, Resp: Send + 'static> {
    interceptors: &'a [Arc<dyn StreamInterceptor<Req, Resp>>],
    handler: &'a dyn StreamHandler<Req, Resp>,
    info: &'a StreamServerInfo,
}

impl<'a, Req, Resp> StreamNext<'a, Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    pub(crate) fn new(
        interceptors: &'a [Arc<dyn StreamInterceptor<Req, Resp>>],
        handler: &'a dyn StreamHandler<Req, Resp>,
        info: &'a StreamServerInfo,
    ) -> Self {
        Self {
            interceptors,
            handler,
            info,
        }
    }

    /// 以给定句柄继续执行后续拦截器与处理器
    pub async fn run(self, stream: Arc<dyn ServerStream<Req, Resp>>) -> Result<(), Status> {
        match self.interceptors.split_first() {
            Some((first, rest)) => {
                let next = StreamNext::new(rest, self.handler, self.info);
                first.intercept(stream, self.info, next).await
            }
            None => self.handler.call(stream).await,
        }
    }
}
