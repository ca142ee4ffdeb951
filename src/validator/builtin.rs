//! 内置校验器

use std::collections::HashSet;

use tracing::debug;

use super::OrganizationValidator;
use crate::context::Context;
use crate::error::OrganizationError;
use crate::organization::Organization;

/// 必填校验：组织为空时拒绝
#[derive(Debug, Clone, Copy, Default)]
pub struct OrganizationRequired;

impl OrganizationValidator for OrganizationRequired {
    fn validate(&self, _ctx: &Context, organization: &Organization) -> Result<(), OrganizationError> {
        if organization.is_empty() {
            return Err(OrganizationError::MissingOrganization);
        }
        Ok(())
    }
}

/// 允许列表校验：精确匹配，不做大小写折叠或通配
#[derive(Debug, Clone, Default)]
pub struct AllowedOrganizations {
    allowed: HashSet<Organization>,
}

impl AllowedOrganizations {
    pub fn new<I, O>(organizations: I) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Into<Organization>,
    {
        Self {
            allowed: organizations.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, organization: &str) -> bool {
        self.allowed.contains(organization)
    }

    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}

impl OrganizationValidator for AllowedOrganizations {
    fn validate(&self, _ctx: &Context, organization: &Organization) -> Result<(), OrganizationError> {
        if self.contains(organization.as_str()) {
            return Ok(());
        }
        debug!(organization = %organization, "Organization not in allowlist");
        Err(OrganizationError::not_permitted(organization.as_str()))
    }
}
