//! 日志
//!
//! 容器本身只通过 `tracing` 宏输出调试信息；没有安装订阅者时这些调用不产生任何输出。
//! 应用可以用 [`init_logging`] 安装一个格式化订阅者。

use std::time::{Duration, Instant};

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::reflect::TypeName;

/// 覆盖日志过滤规则的环境变量，语法同 `RUST_LOG`
pub const LOG_ENV_VAR: &str = "AUTOWIRE_LOG";

/// 日志格式配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// 人类可读格式
    Pretty,
    /// 紧凑格式
    Compact,
}

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: Level,
    /// 输出格式
    pub format: LogFormat,
    /// 过滤规则，优先于 `level`
    pub directives: Option<String>,
    /// 是否显示目标模块
    pub show_target: bool,
    /// 是否显示线程ID
    pub show_thread_ids: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Compact,
            directives: None,
            show_target: true,
            show_thread_ids: false,
        }
    }
}

impl LoggingConfig {
    /// 开发环境：输出容器的全部决策过程
    pub fn development() -> Self {
        Self {
            level: Level::DEBUG,
            format: LogFormat::Pretty,
            directives: None,
            show_target: true,
            show_thread_ids: true,
        }
    }

    /// 测试环境
    pub fn testing() -> Self {
        Self {
            level: Level::ERROR,
            format: LogFormat::Compact,
            directives: None,
            show_target: false,
            show_thread_ids: false,
        }
    }

    pub fn production() -> Self {
        Self {
            level: Level::WARN,
            format: LogFormat::Compact,
            directives: None,
            show_target: false,
            show_thread_ids: false,
        }
    }

    /// 在默认配置基础上读取 `AUTOWIRE_LOG`
    pub fn from_env() -> Self {
        Self {
            directives: std::env::var(LOG_ENV_VAR).ok().filter(|value| !value.trim().is_empty()),
            ..Self::default()
        }
    }

    fn filter(&self) -> Result<EnvFilter, Box<dyn std::error::Error + Send + Sync>> {
        match &self.directives {
            Some(directives) => Ok(EnvFilter::try_new(directives)?),
            None => Ok(EnvFilter::new(self.level.as_str().to_ascii_lowercase())),
        }
    }
}

/// 初始化日志系统
///
/// 全局订阅者只能安装一次，重复调用返回错误。
pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = config.filter()?;

    match config.format {
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .pretty()
                .with_target(config.show_target)
                .with_thread_ids(config.show_thread_ids);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()?;
        }
        LogFormat::Compact => {
            let fmt_layer = fmt::layer()
                .compact()
                .with_target(config.show_target)
                .with_thread_ids(config.show_thread_ids);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()?;
        }
    }

    tracing::info!(
        level = ?config.level,
        format = ?config.format,
        "Logging system initialized"
    );

    Ok(())
}

/// 解析计时器
///
/// 记录一次解析从开始到结束的耗时。
pub struct OperationTimer {
    start: Instant,
    operation: &'static str,
    subject: TypeName,
}

impl OperationTimer {
    pub fn new(operation: &'static str, subject: &TypeName) -> Self {
        Self {
            start: Instant::now(),
            operation,
            subject: subject.clone(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// 完成计时并记录日志
    pub fn finish(self, succeeded: bool) {
        tracing::debug!(
            operation = self.operation,
            subject = %self.subject,
            duration_us = self.start.elapsed().as_micros() as u64,
            succeeded,
            "Operation completed"
        );
    }
}
