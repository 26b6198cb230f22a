//! JS 执行器 - 基础设施层
//!
//! 持有一个 page 资源，只暴露"执行 JS"的能力

use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::AppResult;

/// JS 执行器
///
/// 职责：
/// - 持有一个视图的 Page
/// - 暴露 eval() 能力
/// - 不认识 WorkItem / 表格结构
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    ///
    /// # 参数
    /// - `page`: 表格页或表单页，执行器之后独占它
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用（用于导航等其他操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 代码并返回 JSON 结果
    ///
    /// # 参数
    /// - `js_code`: 要执行的脚本，最后一个表达式的值作为结果
    ///
    /// # 返回
    /// 返回脚本结果的 JSON 值；脚本抛错或结果无法序列化时返回 CDP 错误
    pub async fn eval(&self, js_code: impl Into<String>) -> AppResult<JsonValue> {
        let js_code = js_code.into();
        debug!("执行脚本 ({} 字节)", js_code.len());
        let result = self.page.evaluate(js_code).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    ///
    /// # 参数
    /// - `js_code`: 要执行的脚本
    ///
    /// # 返回
    /// 返回反序列化后的 `T`；结构对不上时返回 JSON 错误
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> AppResult<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }
}
