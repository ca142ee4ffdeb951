use std::path::Path;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::observability::init_tracing;
use crate::validator::{AllowedOrganizations, OrganizationRequired, ValidatorChain};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub organization: OrganizationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 组织校验配置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrganizationConfig {
    /// 是否拒绝缺少组织标识的调用
    #[serde(default = "default_require_organization")]
    pub require_organization: bool,
    /// 允许的组织；为空时不做允许列表校验
    #[serde(default)]
    pub allowed_organizations: Vec<String>,
}

fn default_require_organization() -> bool {
    true
}

impl Default for OrganizationConfig {
    fn default() -> Self {
        Self {
            require_organization: default_require_organization(),
            allowed_organizations: Vec::new(),
        }
    }
}

impl OrganizationConfig {
    /// 按配置构建校验器链（必填在前，允许列表在后）
    pub fn validator_chain(&self) -> ValidatorChain {
        let mut chain = ValidatorChain::new();
        if self.require_organization {
            chain = chain.with(OrganizationRequired);
        }
        if !self.allowed_organizations.is_empty() {
            chain = chain.with(AllowedOrganizations::new(
                self.allowed_organizations.iter().map(String::as_str),
            ));
        }
        chain
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl LoggingConfig {
    pub fn init(&self) -> anyhow::Result<()> {
        init_tracing(&self.level, self.json)
    }
}

impl Config {
    pub fn load_from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::error::OrganizationError;
    use crate::organization::Organization;

    #[test]
    fn parses_organization_section() {
        let config = Config::from_toml(
            r#"
            [organization]
            allowed_organizations = ["acme", "foo", "bar"]

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert!(config.organization.require_organization);
        assert_eq!(config.organization.allowed_organizations, ["acme", "foo", "bar"]);
        assert_eq!(config.logging.level, "debug");
        assert!(!config.logging.json);

        let chain = config.organization.validator_chain();
        assert_eq!(chain.len(), 2);
        let ctx = Context::new();
        assert!(chain.evaluate(&ctx, &Organization::from("foo")).is_ok());
        assert!(matches!(
            chain.evaluate(&ctx, &Organization::empty()),
            Err(OrganizationError::MissingOrganization)
        ));
        assert!(matches!(
            chain.evaluate(&ctx, &Organization::from("Foo")),
            Err(OrganizationError::OrganizationNotPermitted { .. })
        ));
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert!(config.organization.require_organization);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.organization.validator_chain().len(), 1);
    }

    #[test]
    fn optional_organization_without_allowlist_accepts_everything() {
        let config = Config::from_toml(
            r#"
            [organization]
            require_organization = false
            "#,
        )
        .unwrap();
        let chain = config.organization.validator_chain();
        assert!(chain.is_empty());
        assert!(chain.evaluate(&Context::new(), &Organization::empty()).is_ok());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = Config::load_from_file("/nonexistent/organization.toml").unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }
}
