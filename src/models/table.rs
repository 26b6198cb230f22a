//! 表格结构
//!
//! 列顺序固定，表头在第 0 行。

use serde::{Deserialize, Serialize};

/// 列索引（从 0 开始，不含行号列偏移）
pub mod col {
    /// A: 标记（●为处理对象）
    pub const MARKER: usize = 0;
    /// B: 品牌
    pub const BRAND: usize = 1;
    /// C: 参考买手
    pub const REF_SHOPPER: usize = 2;
    /// D: 商品名
    pub const PRODUCT_NAME: usize = 3;
    /// E: 官方网站
    pub const OFFICIAL_SITE: usize = 4;
    /// F: 买付地
    pub const PURCHASE_LOCATION: usize = 5;
    /// G: 主图
    pub const TOP_IMAGE: usize = 6;
    /// H: 其他图片
    pub const OTHER_IMAGES: usize = 7;
    /// I: 色系
    pub const COLOR_TONE: usize = 8;
    /// J: 尺码
    pub const SIZE: usize = 9;
    /// K: 出品图片
    pub const LISTING_IMAGE: usize = 10;
    /// L: 欧元
    pub const EURO: usize = 11;
    /// M: 日元
    pub const YEN: usize = 12;
    /// N: 汇率（未使用）
    pub const RATE: usize = 13;
    /// O: 草稿 / 已出品
    pub const SAVE_STATUS: usize = 14;
    /// P: 出品完成日
    pub const COMPLETION_DATE: usize = 15;
    /// Q: 作业者完成日
    pub const WORKER_DATE: usize = 16;
}

/// 处理对象标记
pub const MARKER_TARGET: &str = "●";

/// 状态列：草稿
pub const STATUS_DRAFT: &str = "下書き";

/// 状态列：已出品（回写值）
pub const STATUS_LISTED: &str = "出品済み";

/// 渲染出来的一行
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedRow {
    /// 各单元格的文本（已 trim）
    pub cells: Vec<String>,
    /// 首个单元格是否是宿主注入的行号列
    #[serde(default)]
    pub row_header: bool,
}

impl RenderedRow {
    pub fn new<S: Into<String>>(cells: impl IntoIterator<Item = S>) -> Self {
        Self {
            cells: cells.into_iter().map(Into::into).collect(),
            row_header: false,
        }
    }

    /// 取单元格文本，越界返回空串
    pub fn cell(&self, index: usize) -> &str {
        self.cells.get(index).map(String::as_str).unwrap_or("")
    }
}

/// 表格的一次渲染快照
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub rows: Vec<RenderedRow>,
}
