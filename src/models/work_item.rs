use serde::{Deserialize, Serialize};

/// 一行待出品的数据
///
/// 由行提取器在构建队列时创建，之后只读。
/// `row_index` 是该行在渲染表格中的位置（表头为 0），用于回写状态。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    pub row_index: usize,
    /// 品牌
    pub brand: String,
    /// 参考买手
    pub ref_shopper: String,
    /// 商品名
    pub product_name: String,
    /// 官方网站（买付先）
    pub official_site: String,
    /// 买付地
    pub purchase_location: String,
    /// 色系
    pub color_tone: String,
    /// 尺码
    pub size: String,
    /// 欧元价格
    pub euro: String,
    /// 日元价格（填入表单的价格）
    pub yen: String,
}

impl WorkItem {
    /// 面向人的行号（从 1 开始）
    pub fn display_row(&self) -> usize {
        self.row_index + 1
    }
}
