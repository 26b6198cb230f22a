use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// 表格读取错误
    #[error("行提取错误: {0}")]
    Extract(#[from] ExtractError),
    /// 表单填写错误
    #[error("表单填写错误: {0}")]
    Fill(#[from] FillError),
    /// 状态回写错误
    #[error("状态回写错误: {0}")]
    StatusWrite(#[from] StatusWriteError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 连接浏览器失败
    #[error("无法连接到浏览器 (端口: {port}): {source}")]
    ConnectionFailed {
        port: u16,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 打开视图失败
    #[error("打开页面 {url} 失败: {source}")]
    OpenFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 执行脚本失败
    #[error("执行脚本失败: {source}")]
    ScriptExecutionFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 脚本返回值无法解析
    #[error("脚本返回值无法解析: {source}")]
    BadScriptResult {
        #[source]
        source: serde_json::Error,
    },
}

/// 表格读取错误（前置条件失败）
#[derive(Debug, Error)]
pub enum ExtractError {
    /// 找不到表格结构
    #[error("找不到表格: {0}")]
    TableNotFound(String),
}

/// 表单填写错误
#[derive(Debug, Error)]
pub enum FillError {
    /// 商品名面板不存在
    #[error("商品名面板不存在")]
    NamePanelMissing,
    /// 商品名输入框不存在
    #[error("商品名输入框不存在")]
    NameInputMissing,
}

/// 状态回写错误
#[derive(Debug, Error)]
pub enum StatusWriteError {
    /// 单元格不存在
    #[error("单元格不存在 (行 {row}, 列 {column})")]
    CellNotFound { row: usize, column: usize },
    /// 编辑框未出现
    #[error("双击后编辑框未出现 (行 {row})")]
    EditorNotFound { row: usize },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置文件读取失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 配置文件解析失败
    #[error("配置文件解析失败: {0}")]
    TomlParseFailed(#[from] toml::de::Error),
}

// ========== 从常见错误类型转换 ==========

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Browser(BrowserError::ScriptExecutionFailed {
            source: Box::new(err),
        })
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Browser(BrowserError::BadScriptResult { source: err })
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Config(ConfigError::TomlParseFailed(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Other(err.to_string())
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建浏览器连接错误
    pub fn browser_connection_failed(
        port: u16,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Browser(BrowserError::ConnectionFailed {
            port,
            source: Box::new(source),
        })
    }

    /// 创建打开页面失败错误
    pub fn open_failed(
        url: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Browser(BrowserError::OpenFailed {
            url: url.into(),
            source: Box::new(source),
        })
    }

    /// 创建通用错误
    pub fn other(msg: impl Into<String>) -> Self {
        AppError::Other(msg.into())
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_error_display() {
        let err: AppError = FillError::NamePanelMissing.into();
        assert_eq!(err.to_string(), "表单填写错误: 商品名面板不存在");

        let err: AppError = StatusWriteError::EditorNotFound { row: 4 }.into();
        assert!(err.to_string().contains("行 4"));
    }
}
