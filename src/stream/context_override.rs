//! 流上下文覆盖
//!
//! 流式调用的上下文在句柄生命周期内固定，拦截器无法直接替换。
//! `StreamContextOverride` 包装原句柄，只改写 `context()`，其余操作原样转发，
//! 使拦截器注入的值对处理器可见而不改动底层传输对象。

use std::sync::Arc;

use async_trait::async_trait;
use tonic::Status;
use tonic::metadata::MetadataMap;

use super::ServerStream;
use crate::context::Context;

/// 覆盖上下文的流句柄
pub struct StreamContextOverride<Req: Send + 'static, Resp: Send + 'static> {
    inner: Arc<dyn ServerStream<Req, Resp>>,
    context: Context,
}

impl<Req, Resp> StreamContextOverride<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    pub fn new(inner: Arc<dyn ServerStream<Req, Resp>>, context: Context) -> Self {
        Self { inner, context }
    }

    /// 被包装的原始句柄
    pub fn inner(&self) -> &Arc<dyn ServerStream<Req, Resp>> {
        &self.inner
    }
}

#[async_trait]
impl<Req, Resp> ServerStream<Req, Resp> for StreamContextOverride<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    fn context(&self) -> &Context {
        &self.context
    }

    fn metadata(&self) -> &MetadataMap {
        self.inner.metadata()
    }

    async fn send_message(&self, message: Resp) -> Result<(), Status> {
        self.inner.send_message(message).await
    }

    async fn recv_message(&self) -> Result<Option<Req>, Status> {
        self.inner.recv_message().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::organization::{Organization, organization, try_organization, with_organization};
    use crate::stream::GrpcServerStream;
    use futures::StreamExt;

    #[tokio::test]
    async fn overrides_context_and_forwards_messages() {
        let inbound = futures::stream::iter(vec![Ok::<_, Status>(1u32), Ok(2)]);
        let (stream, mut outbound) = GrpcServerStream::<u32, u32>::new(Context::new(), inbound, 4);
        let inner: Arc<dyn ServerStream<u32, u32>> = Arc::new(stream);

        let ctx = with_organization(inner.context(), Organization::from("acme"));
        let wrapped = StreamContextOverride::new(Arc::clone(&inner), ctx);

        assert_eq!(organization(wrapped.context()).as_str(), "acme");
        assert!(try_organization(wrapped.inner().context()).is_err());

        assert_eq!(wrapped.recv_message().await.unwrap(), Some(1));
        wrapped.send_message(10).await.unwrap();
        assert_eq!(wrapped.recv_message().await.unwrap(), Some(2));
        assert_eq!(wrapped.recv_message().await.unwrap(), None);

        assert_eq!(outbound.next().await.unwrap().unwrap(), 10);
    }
}
