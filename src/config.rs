use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{AppResult, ConfigError};

/// 默认配置文件名
pub const CONFIG_FILE: &str = "autofill.toml";

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 浏览器调试端口
    pub browser_debug_port: u16,
    /// 表格视图的 URL 前缀
    pub source_url_prefix: String,
    /// 出品表单 URL
    pub form_url: String,
    /// 出品表单 URL 前缀（离开此前缀视为已提交）
    pub form_url_prefix: String,
    /// 每次运行最多提取的行数
    pub max_jobs: usize,
    /// 表单页加载后的稳定等待
    pub settle_delay_ms: u64,
    /// 填写前等待表单 DOM 渲染
    pub form_dom_wait_ms: u64,
    /// 每个字段之间的等待
    pub field_step_ms: u64,
    /// 点击预览前的等待
    pub preview_pause_ms: u64,
    /// 一件完成或失败后，开始下一件前的等待
    pub next_item_delay_ms: u64,
    /// 跨视图请求的最大尝试次数
    pub message_retries: usize,
    /// 跨视图请求的重试间隔
    pub message_backoff_ms: u64,
    /// 双击单元格后等待编辑框出现的上限
    pub editor_wait_ms: u64,
    /// 输出日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 启动后自动开始
    pub auto_start: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_debug_port: 9222,
            source_url_prefix: "https://docs.google.com/spreadsheets/".to_string(),
            form_url: "https://www.buyma.com/my/sell/new?tab=b".to_string(),
            form_url_prefix: "https://www.buyma.com/my/sell/".to_string(),
            max_jobs: 20,
            settle_delay_ms: 2000,
            form_dom_wait_ms: 2000,
            field_step_ms: 500,
            preview_pause_ms: 1000,
            next_item_delay_ms: 1000,
            message_retries: 3,
            message_backoff_ms: 500,
            editor_wait_ms: 1500,
            output_log_file: "autofill.log".to_string(),
            verbose_logging: false,
            auto_start: false,
        }
    }
}

impl Config {
    /// 加载配置：配置文件（如存在）+ 环境变量覆盖
    pub fn load() -> AppResult<Self> {
        let base = if Path::new(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };
        base.apply_env()
    }

    /// 从 TOML 文件读取配置
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// 解析 TOML 文本，缺失字段使用默认值
    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// 用环境变量覆盖已有配置
    pub fn apply_env(self) -> AppResult<Self> {
        Ok(Self {
            browser_debug_port: env_parse("BROWSER_DEBUG_PORT", self.browser_debug_port)?,
            source_url_prefix: std::env::var("SOURCE_URL_PREFIX").unwrap_or(self.source_url_prefix),
            form_url: std::env::var("FORM_URL").unwrap_or(self.form_url),
            form_url_prefix: std::env::var("FORM_URL_PREFIX").unwrap_or(self.form_url_prefix),
            max_jobs: env_parse("MAX_JOBS", self.max_jobs)?,
            settle_delay_ms: env_parse("SETTLE_DELAY_MS", self.settle_delay_ms)?,
            form_dom_wait_ms: env_parse("FORM_DOM_WAIT_MS", self.form_dom_wait_ms)?,
            field_step_ms: env_parse("FIELD_STEP_MS", self.field_step_ms)?,
            preview_pause_ms: env_parse("PREVIEW_PAUSE_MS", self.preview_pause_ms)?,
            next_item_delay_ms: env_parse("NEXT_ITEM_DELAY_MS", self.next_item_delay_ms)?,
            message_retries: env_parse("MESSAGE_RETRIES", self.message_retries)?,
            message_backoff_ms: env_parse("MESSAGE_BACKOFF_MS", self.message_backoff_ms)?,
            editor_wait_ms: env_parse("EDITOR_WAIT_MS", self.editor_wait_ms)?,
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(self.output_log_file),
            verbose_logging: env_parse("VERBOSE_LOGGING", self.verbose_logging)?,
            auto_start: env_parse("AUTO_START", self.auto_start)?,
        })
    }

    /// 所有等待时间归零（测试用）
    pub fn without_delays(self) -> Self {
        Self {
            settle_delay_ms: 0,
            form_dom_wait_ms: 0,
            field_step_ms: 0,
            preview_pause_ms: 0,
            next_item_delay_ms: 0,
            message_backoff_ms: 0,
            editor_wait_ms: 0,
            ..self
        }
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn form_dom_wait(&self) -> Duration {
        Duration::from_millis(self.form_dom_wait_ms)
    }

    pub fn field_step(&self) -> Duration {
        Duration::from_millis(self.field_step_ms)
    }

    pub fn preview_pause(&self) -> Duration {
        Duration::from_millis(self.preview_pause_ms)
    }

    pub fn next_item_delay(&self) -> Duration {
        Duration::from_millis(self.next_item_delay_ms)
    }

    pub fn message_backoff(&self) -> Duration {
        Duration::from_millis(self.message_backoff_ms)
    }

    pub fn editor_wait(&self) -> Duration {
        Duration::from_millis(self.editor_wait_ms)
    }
}

/// 读取并解析环境变量；不存在时返回默认值，存在但无法解析时报错
fn env_parse<T: std::str::FromStr>(var_name: &str, default: T) -> AppResult<T> {
    match std::env::var(var_name) {
        Ok(value) => value.parse().map_err(|_| {
            ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: std::any::type_name::<T>().to_string(),
            }
            .into()
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str("max_jobs = 5\nform_url_prefix = \"https://example.com/sell/\"")
            .unwrap();
        assert_eq!(config.max_jobs, 5);
        assert_eq!(config.form_url_prefix, "https://example.com/sell/");
        assert_eq!(config.browser_debug_port, 9222);
        assert_eq!(config.next_item_delay(), Duration::from_millis(1000));
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let err = Config::from_toml_str("max_jobs = \"many\"").unwrap_err();
        assert!(matches!(err, crate::error::AppError::Config(_)));
    }

    #[test]
    fn test_without_delays() {
        let config = Config::default().without_delays();
        assert_eq!(config.settle_delay(), Duration::ZERO);
        assert_eq!(config.editor_wait(), Duration::ZERO);
        assert_eq!(config.max_jobs, 20);
    }
}
