//! 组织校验器
//!
//! 校验器是一个单方法的谓词：给定调用上下文与组织标识，接受或给出分类的拒绝。
//! 校验器链按调用方指定的顺序依次执行，遇到第一个拒绝即停止。

pub mod builtin;

pub use builtin::{AllowedOrganizations, OrganizationRequired};

use std::sync::Arc;

use crate::context::Context;
use crate::error::OrganizationError;
use crate::organization::Organization;

/// 组织校验器
pub trait OrganizationValidator: Send + Sync {
    fn validate(&self, ctx: &Context, organization: &Organization) -> Result<(), OrganizationError>;
}

impl<F> OrganizationValidator for F
where
    F: Fn(&Context, &Organization) -> Result<(), OrganizationError> + Send + Sync,
{
    fn validate(&self, ctx: &Context, organization: &Organization) -> Result<(), OrganizationError> {
        self(ctx, organization)
    }
}

/// 依次执行校验器，返回第一个拒绝；空序列总是接受
pub fn evaluate(
    ctx: &Context,
    organization: &Organization,
    validators: &[Arc<dyn OrganizationValidator>],
) -> Result<(), OrganizationError> {
    for validator in validators {
        validator.validate(ctx, organization)?;
    }
    Ok(())
}

/// 有序校验器链
#[derive(Clone, Default)]
pub struct ValidatorChain {
    validators: Vec<Arc<dyn OrganizationValidator>>,
}

impl ValidatorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// 必填 + 允许列表的标准链，必填校验在前
    pub fn standard<I, O>(allowed: I) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Into<Organization>,
    {
        Self::new()
            .with(OrganizationRequired)
            .with(AllowedOrganizations::new(allowed))
    }

    pub fn with(mut self, validator: impl OrganizationValidator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    pub fn push(&mut self, validator: Arc<dyn OrganizationValidator>) {
        self.validators.push(validator);
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    pub fn evaluate(&self, ctx: &Context, organization: &Organization) -> Result<(), OrganizationError> {
        evaluate(ctx, organization, &self.validators)
    }
}

impl FromIterator<Arc<dyn OrganizationValidator>> for ValidatorChain {
    fn from_iter<T: IntoIterator<Item = Arc<dyn OrganizationValidator>>>(iter: T) -> Self {
        Self {
            validators: iter.into_iter().collect(),
        }
    }
}
