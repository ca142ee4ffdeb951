//! 日志初始化

use anyhow::Context as _;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// 安装全局 tracing subscriber
///
/// 优先使用 `RUST_LOG`，未设置时使用 `level`。`json` 为 true 时输出扁平化的 JSON 日志。
/// 已经存在全局 subscriber 时返回错误。
pub fn init_tracing(level: &str, json: bool) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("invalid log level: {level}"))?;

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(
                fmt::layer()
                    .with_file(true)
                    .with_line_number(true)
                    .json()
                    .flatten_event(true),
            )
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    }
    .context("global tracing subscriber already installed")
}
