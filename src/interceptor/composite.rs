use std::sync::Arc;

use tonic::Status;

use super::{
    StreamHandler, StreamInterceptor, StreamNext, StreamServerInfo, UnaryHandler,
    UnaryInterceptor, UnaryNext, UnaryServerInfo,
};
use crate::context::Context;
use crate::stream::ServerStream;

/// 一元拦截器链
///
/// 按添加顺序执行拦截器，最后调用处理器。
pub struct UnaryChain<Req: Send + 'static, Resp: Send + 'static> {
    interceptors: Vec<Arc<dyn UnaryInterceptor<Req, Resp>>>,
}

impl<Req, Resp> UnaryChain<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    pub fn new() -> Self {
        Self {
            interceptors: Vec::new(),
        }
    }

    pub fn with(mut self, interceptor: impl UnaryInterceptor<Req, Resp> + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    pub fn with_shared(mut self, interceptor: Arc<dyn UnaryInterceptor<Req, Resp>>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    pub async fn serve(
        &self,
        ctx: Context,
        request: Req,
        info: &UnaryServerInfo,
        handler: &dyn UnaryHandler<Req, Resp>,
    ) -> Result<Resp, Status> {
        UnaryNext::new(&self.interceptors, handler, info)
            .run(ctx, request)
            .await
    }
}

impl<Req, Resp> Default for UnaryChain<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<Req, Resp> Clone for UnaryChain<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    fn clone(&self) -> Self {
        Self {
            interceptors: self.interceptors.clone(),
        }
    }
}

/// 流式拦截器链
pub struct StreamChain<Req: Send + 'static, Resp: Send + 'static> {
    interceptors: Vec<Arc<dyn StreamInterceptor<Req, Resp>>>,
}

impl<Req, Resp> StreamChain<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    pub fn new() -> Self {
        Self {
            interceptors: Vec::new(),
        }
    }

    pub fn with(mut self, interceptor: impl StreamInterceptor<Req, Resp> + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    pub fn with_shared(mut self, interceptor: Arc<dyn StreamInterceptor<Req, Resp>>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    pub async fn serve(
        &self,
        stream: Arc<dyn ServerStream<Req, Resp>>,
        info: &StreamServerInfo,
        handler: &dyn StreamHandler<Req, Resp>,
    ) -> Result<(), Status> {
        StreamNext::new(&self.interceptors, handler, info)
            .run(stream)
            .await
    }
}

impl<Req, Resp> Default for StreamChain<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<Req, Resp> Clone for StreamChain<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    fn clone(&self) -> Self {
        Self {
            interceptors: self.interceptors.clone(),
        }
    }
}
