//! 视图能力接口
//!
//! 编排器和各服务只依赖这里的 trait；具体网页的选择器只出现在
//! `sheets`（表格视图）和 `listing_form`（出品表单视图）两个适配器里。
//! 更换目标网站时只需重新实现这些定位器。

pub mod chrome;
pub mod listing_form;
pub mod sheets;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::AppResult;
use crate::models::TableSnapshot;

pub use chrome::ChromeWorkspace;
pub use listing_form::ListingFormView;
pub use sheets::SheetsView;

/// 视图 id（对应浏览器的 target id）
pub type ViewId = String;

/// 视图生命周期事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    /// 主框架导航到新 URL
    Navigated { view: ViewId, url: String },
    /// 视图被关闭
    Closed { view: ViewId },
}

/// 表格单元格的编辑面
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorSurface {
    /// 独立的公式栏 / 编辑栏
    EditBar,
    /// 覆盖在单元格上的 contenteditable
    Overlay,
}

/// 表格视图（数据来源）
#[async_trait]
pub trait SourceView: Send + Sync {
    fn id(&self) -> ViewId;

    /// 读取当前渲染出的整张表；找不到表格结构时返回错误
    async fn fetch_table(&self) -> AppResult<TableSnapshot>;

    /// 在单元格上执行激活手势（双击）；单元格不存在返回 false
    async fn activate_cell(&self, row: usize, column: usize) -> AppResult<bool>;

    /// 探测当前出现的编辑面
    async fn probe_editor(&self) -> AppResult<Option<EditorSurface>>;

    /// 清空编辑面并写入新值
    async fn replace_editor_text(&self, surface: EditorSurface, value: &str) -> AppResult<()>;

    /// 提交编辑（回车）
    async fn commit_edit(&self, surface: EditorSurface) -> AppResult<()>;
}

/// 表单上的逻辑字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    ProductName,
    Comment,
    ColorTone,
    Size,
    PurchaseLocation,
    ShopName,
    Price,
}

/// 单个字段操作的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldOutcome {
    /// 已写入 / 已选中
    Applied,
    /// 字段所在面板不存在
    PanelMissing,
    /// 面板存在，但输入控件不存在
    ControlMissing,
    /// 下拉选项里没有匹配项（已关闭下拉）
    NoMatch,
}

/// 表单定位器：每个逻辑字段一个窄能力
#[async_trait]
pub trait FormLocator: Send + Sync {
    /// 写入文本框（宿主框架能感知到变化）
    async fn set_text(&self, field: FormField, value: &str) -> AppResult<FieldOutcome>;

    /// 打开下拉、按子串匹配选项并点击；无匹配时关闭下拉
    async fn select_option(&self, field: FormField, value: &str) -> AppResult<FieldOutcome>;

    /// 选中单选项
    async fn choose_radio(&self, field: FormField, value: &str) -> AppResult<FieldOutcome>;

    /// 点击「确认输入内容」进入预览；按钮不存在返回 false
    async fn click_preview(&self) -> AppResult<bool>;
}

/// 出品表单视图
#[async_trait]
pub trait TargetView: FormLocator {
    fn id(&self) -> ViewId;

    /// 等待页面加载完成
    async fn wait_loaded(&self) -> AppResult<()>;
}

/// 浏览器工作区：定位 / 打开视图，并提供视图事件
#[async_trait]
pub trait Workspace: Send + Sync {
    /// 所有打开着的表格视图
    async fn find_source_views(&self) -> AppResult<Vec<Arc<dyn SourceView>>>;

    /// 打开一个新的表单视图
    async fn open_target_view(&self, url: &str) -> AppResult<Arc<dyn TargetView>>;

    /// 订阅视图生命周期事件
    fn subscribe_events(&self) -> broadcast::Receiver<ViewEvent>;
}
