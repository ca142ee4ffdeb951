//! 组织拦截器
//!
//! 一元与流式调用执行相同的流程：
//! 1. 从入站 metadata 提取组织标识
//! 2. 执行校验器链
//! 3. 拒绝时直接返回分类后的状态，不调用处理器
//! 4. 接受时派生注入了组织的新上下文，交给后续阶段
//!
//! 流式调用的上下文不能直接替换，因此第 4 步用 [`StreamContextOverride`] 包装原句柄。

use std::sync::Arc;

use async_trait::async_trait;
use tonic::service::Interceptor;
use tonic::{Request, Status};
use tracing::{debug, warn};

use super::{
    StreamInterceptor, StreamNext, StreamServerInfo, UnaryInterceptor, UnaryNext,
    UnaryServerInfo,
};
use crate::context::Context;
use crate::error::ContextBindingAbsent;
use crate::organization::{Organization, extract_organization, organization, with_organization};
use crate::stream::{ServerStream, StreamContextOverride};
use crate::validator::ValidatorChain;

/// 提取、校验并注入组织标识，返回派生后的上下文
///
/// `method` 未知时（tonic 原生拦截器拿不到请求路径）日志中不记录该字段。
fn admit(
    validators: &ValidatorChain,
    ctx: &Context,
    method: Option<&str>,
) -> Result<Context, Status> {
    let organization = extract_organization(ctx);

    if let Err(err) = validators.evaluate(ctx, &organization) {
        warn!(method, organization = %organization, error = %err, "Organization rejected");
        return Err(err.into());
    }

    if ctx.is_cancelled() {
        debug!(method, "Call cancelled before organization injection");
        return Err(Status::cancelled("request cancelled"));
    }

    debug!(method, organization = %organization, "Organization accepted");
    Ok(with_organization(ctx, organization))
}

/// 一元组织拦截器
#[derive(Clone, Default)]
pub struct OrganizationUnaryInterceptor {
    validators: ValidatorChain,
}

impl OrganizationUnaryInterceptor {
    pub fn new(validators: ValidatorChain) -> Self {
        Self { validators }
    }

    pub fn validators(&self) -> &ValidatorChain {
        &self.validators
    }
}

#[async_trait]
impl<Req, Resp> UnaryInterceptor<Req, Resp> for OrganizationUnaryInterceptor
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
        let ctx = admit(&self.validators, &ctx, Some(info.full_method.as_str()))?;
        next.run(ctx, request).await
    }
}

/// 流式组织拦截器
#[derive(Clone, Default)]
pub struct OrganizationStreamInterceptor {
    validators: ValidatorChain,
}

impl OrganizationStreamInterceptor {
    pub fn new(validators: ValidatorChain) -> Self {
        Self { validators }
    }

    pub fn validators(&self) -> &ValidatorChain {
        &self.validators
    }
}

#[async_trait]
impl<Req, Resp> StreamInterceptor<Req, Resp> for OrganizationStreamInterceptor
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
        let ctx = admit(&self.validators, stream.context(), Some(info.full_method.as_str()))?;
        let wrapped: Arc<dyn ServerStream<Req, Resp>> =
            Arc::new(StreamContextOverride::new(stream, ctx));
        next.run(wrapped).await
    }
}

/// tonic 原生组织拦截器
///
/// 用于 `InterceptedService` / `with_interceptor`，一元和流式方法共用。
/// 校验通过后把派生的 [`Context`] 放入请求扩展，处理器通过 [`RequestContextExt`] 读取。
#[derive(Clone, Default)]
pub struct OrganizationInterceptor {
    validators: ValidatorChain,
}

impl OrganizationInterceptor {
    pub fn new(validators: ValidatorChain) -> Self {
        Self { validators }
    }
}

impl Interceptor for OrganizationInterceptor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        let ctx = Context::from_request(&request);
        let ctx = admit(&self.validators, &ctx, None)?;
        request.extensions_mut().insert(ctx);
        Ok(request)
    }
}

/// 从 tonic 请求中读取组织拦截器写入的上下文
pub trait RequestContextExt {
    /// 组织拦截器派生的上下文
    fn context(&self) -> Option<&Context>;

    /// 请求的组织标识
    ///
    /// # Panics
    ///
    /// 请求未经过 [`OrganizationInterceptor`] 时 panic（上下文绑定缺失）。
    fn organization(&self) -> &Organization;
}

impl<T> RequestContextExt for Request<T> {
    fn context(&self) -> Option<&Context> {
        self.extensions().get::<Context>()
    }

    fn organization(&self) -> &Organization {
        match self.context() {
            Some(ctx) => organization(ctx),
            None => panic!("{}", ContextBindingAbsent),
        }
    }
}
