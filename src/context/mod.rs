//! 请求级上下文
//!
//! `Context` 是一次调用生命周期内的不可变、分层键值关联：
//! - 通过 [`Context::with_value`] 派生子层，父上下文永远不会被修改
//! - 查找时由近及远逐层匹配，最近的绑定生效
//! - 键是实现 [`ContextKey`] 的类型而不是字符串，模块把键类型设为私有即可独占该槽位
//!
//! 上下文同时携带调用的入站 gRPC metadata 与取消令牌。

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tonic::Request;
use tonic::metadata::MetadataMap;

/// 上下文槽位的键类型
///
/// 每个槽位由一个 `'static` 类型标识，`Value` 为该槽位存放的值类型。
pub trait ContextKey: 'static {
    type Value: Send + Sync + 'static;
}

/// 单个值层
struct Layer {
    key: TypeId,
    value: Arc<dyn Any + Send + Sync>,
    parent: Option<Arc<Layer>>,
}

/// 请求级上下文
#[derive(Clone)]
pub struct Context {
    metadata: Arc<MetadataMap>,
    cancellation: CancellationToken,
    values: Option<Arc<Layer>>,
}

impl Context {
    /// 创建空的根上下文
    pub fn new() -> Self {
        Self::from_metadata(MetadataMap::new())
    }

    /// 以入站 metadata 创建根上下文
    pub fn from_metadata(metadata: MetadataMap) -> Self {
        Self {
            metadata: Arc::new(metadata),
            cancellation: CancellationToken::new(),
            values: None,
        }
    }

    /// 以 tonic 请求的 metadata 创建根上下文
    pub fn from_request<T>(req: &Request<T>) -> Self {
        Self::from_metadata(req.metadata().clone())
    }

    /// 替换取消令牌（由传输层在建立调用时设置）
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// 派生一个绑定了 `K` 槽位的新上下文
    pub fn with_value<K: ContextKey>(&self, value: K::Value) -> Self {
        Self {
            metadata: Arc::clone(&self.metadata),
            cancellation: self.cancellation.clone(),
            values: Some(Arc::new(Layer {
                key: TypeId::of::<K>(),
                value: Arc::new(value),
                parent: self.values.clone(),
            })),
        }
    }

    /// 读取 `K` 槽位的值
    pub fn value<K: ContextKey>(&self) -> Option<&K::Value> {
        let key = TypeId::of::<K>();
        let mut layer = self.values.as_deref();
        while let Some(current) = layer {
            if current.key == key {
                return current.value.downcast_ref::<K::Value>();
            }
            layer = current.parent.as_deref();
        }
        None
    }

    /// 入站 metadata
    pub fn metadata(&self) -> &MetadataMap {
        &self.metadata
    }

    /// 调用的取消令牌
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// 调用是否已被取消
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    fn depth(&self) -> usize {
        let mut depth = 0;
        let mut layer = self.values.as_deref();
        while let Some(current) = layer {
            depth += 1;
            layer = current.parent.as_deref();
        }
        depth
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("metadata", &self.metadata)
            .field("cancelled", &self.is_cancelled())
            .field("layers", &self.depth())
            .finish()
    }
}
