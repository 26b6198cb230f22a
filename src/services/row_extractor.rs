//! 行提取服务 - 业务能力层
//!
//! 从表格快照中挑出待处理的行，生成有序的 `WorkItem` 队列。
//! 纯函数，不接触浏览器。

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::models::table::{col, MARKER_TARGET, STATUS_DRAFT, STATUS_LISTED};
use crate::models::{RenderedRow, TableSnapshot, WorkItem};

static NUMERIC_ONLY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").expect("valid regex"));

/// 一次提取的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub items: Vec<WorkItem>,
    /// 本次检测到的列偏移（0 或 1）
    pub column_offset: usize,
}

/// 检测行号列偏移
///
/// 首个数据行的第一个单元格是纯数字，或者被标记为行号列时，
/// 说明宿主在数据前面注入了一列，所有列索引需要右移一位。
pub fn detect_column_offset(first_data_row: &RenderedRow) -> usize {
    let leading = first_data_row.cell(0);
    if first_data_row.row_header || NUMERIC_ONLY.is_match(leading) {
        1
    } else {
        0
    }
}

/// 提取待处理的行
///
/// 行 0 为表头。满足以下条件的行按原顺序入队：
/// - 标记列恰好为 `●`
/// - 状态列不是「下書き」或「出品済み」
/// - 商品名非空
///
/// 达到 `max_jobs` 后立即停止。
pub fn extract_work_items(table: &TableSnapshot, max_jobs: usize) -> Extraction {
    let column_offset = table
        .rows
        .get(1)
        .map(detect_column_offset)
        .unwrap_or(0);

    let mut items = Vec::new();

    for (row_index, row) in table.rows.iter().enumerate().skip(1) {
        if items.len() >= max_jobs {
            debug!("已达到上限 {}，停止提取", max_jobs);
            break;
        }

        let cell = |column: usize| row.cell(column + column_offset).trim();

        // 列数不够到状态列的行跳过
        if row.cells.len() <= col::SAVE_STATUS + column_offset {
            continue;
        }

        if cell(col::MARKER) != MARKER_TARGET {
            continue;
        }

        let status = cell(col::SAVE_STATUS);
        if status == STATUS_DRAFT || status == STATUS_LISTED {
            continue;
        }

        let product_name = cell(col::PRODUCT_NAME);
        if product_name.is_empty() {
            debug!("行 {} 商品名为空，跳过", row_index + 1);
            continue;
        }

        items.push(WorkItem {
            row_index,
            brand: cell(col::BRAND).to_string(),
            ref_shopper: cell(col::REF_SHOPPER).to_string(),
            product_name: product_name.to_string(),
            official_site: cell(col::OFFICIAL_SITE).to_string(),
            purchase_location: cell(col::PURCHASE_LOCATION).to_string(),
            color_tone: cell(col::COLOR_TONE).to_string(),
            size: cell(col::SIZE).to_string(),
            euro: cell(col::EURO).to_string(),
            yen: cell(col::YEN).to_string(),
        });
    }

    Extraction {
        items,
        column_offset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: [&str; 17] = [
        "", "ブランド", "参考ショッパー", "商品名", "公式サイト", "買付地", "TOP画像", "その他画像",
        "色の系統", "サイズ", "出品画像", "ユーロ", "エン", "181.8435", "下書きor出品済み",
        "出品完了日", "作業者完了日",
    ];

    fn row(marker: &str, name: &str, status: &str) -> Vec<String> {
        let mut cells = vec![String::new(); 17];
        cells[col::MARKER] = marker.to_string();
        cells[col::BRAND] = "CELINE".to_string();
        cells[col::PRODUCT_NAME] = name.to_string();
        cells[col::OFFICIAL_SITE] = "celine.com".to_string();
        cells[col::PURCHASE_LOCATION] = "フランス".to_string();
        cells[col::YEN] = "¥98,000".to_string();
        cells[col::SAVE_STATUS] = status.to_string();
        cells
    }

    fn table(rows: Vec<Vec<String>>) -> TableSnapshot {
        let mut all = vec![RenderedRow::new(HEADER)];
        all.extend(rows.into_iter().map(RenderedRow::new));
        TableSnapshot { rows: all }
    }

    fn with_gutter(mut snapshot: TableSnapshot, flagged: bool) -> TableSnapshot {
        for (i, row) in snapshot.rows.iter_mut().enumerate() {
            let label = if flagged { String::new() } else { (i + 1).to_string() };
            row.cells.insert(0, label);
            row.row_header = flagged;
        }
        snapshot
    }

    #[test]
    fn test_extracts_qualifying_rows_in_order() {
        let snapshot = table(vec![
            row("●", "バッグA", ""),
            row("", "対象外", ""),
            row("●", "下書き済み", STATUS_DRAFT),
            row("●", "出品済み品", STATUS_LISTED),
            row("●", "   ", ""),
            row("●", "バッグB", "作業中"),
        ]);

        let extraction = extract_work_items(&snapshot, 20);
        let names: Vec<_> = extraction
            .items
            .iter()
            .map(|i| (i.row_index, i.product_name.as_str()))
            .collect();
        assert_eq!(names, vec![(1, "バッグA"), (6, "バッグB")]);
        assert_eq!(extraction.column_offset, 0);
        assert_eq!(extraction.items[0].yen, "¥98,000");
        assert_eq!(extraction.items[0].brand, "CELINE");
    }

    #[test]
    fn test_marker_must_match_exactly() {
        let snapshot = table(vec![row("○", "バッグ", ""), row("●●", "バッグ", "")]);
        assert!(extract_work_items(&snapshot, 20).items.is_empty());
    }

    #[test]
    fn test_stops_at_cap() {
        let rows = (0..30).map(|i| row("●", &format!("item {i}"), "")).collect();
        let extraction = extract_work_items(&table(rows), 20);
        assert_eq!(extraction.items.len(), 20);
        assert_eq!(extraction.items.last().unwrap().row_index, 20);
    }

    #[test]
    fn test_short_rows_are_skipped() {
        let mut short = row("●", "短い行", "");
        short.truncate(col::SAVE_STATUS);
        let snapshot = table(vec![short, row("●", "普通", "")]);
        let extraction = extract_work_items(&snapshot, 20);
        assert_eq!(extraction.items.len(), 1);
        assert_eq!(extraction.items[0].product_name, "普通");
    }

    #[test]
    fn test_numeric_gutter_shifts_columns() {
        let snapshot = with_gutter(table(vec![row("●", "バッグ", ""), row("●", "靴", STATUS_LISTED)]), false);
        let extraction = extract_work_items(&snapshot, 20);
        assert_eq!(extraction.column_offset, 1);
        assert_eq!(extraction.items.len(), 1);
        assert_eq!(extraction.items[0].product_name, "バッグ");
        assert_eq!(extraction.items[0].official_site, "celine.com");
    }

    #[test]
    fn test_flagged_row_header_shifts_columns() {
        let snapshot = with_gutter(table(vec![row("●", "バッグ", "")]), true);
        let extraction = extract_work_items(&snapshot, 20);
        assert_eq!(extraction.column_offset, 1);
        assert_eq!(extraction.items[0].product_name, "バッグ");
    }

    #[test]
    fn test_detect_offset_on_plain_marker() {
        assert_eq!(detect_column_offset(&RenderedRow::new(["●", "CELINE"])), 0);
        assert_eq!(detect_column_offset(&RenderedRow::new(["", "CELINE"])), 0);
        assert_eq!(detect_column_offset(&RenderedRow::new(["12", "●"])), 1);
        assert_eq!(detect_column_offset(&RenderedRow::new(["1a", "●"])), 0);
    }

    #[test]
    fn test_header_only_table() {
        let extraction = extract_work_items(&table(vec![]), 20);
        assert!(extraction.items.is_empty());
        assert_eq!(extraction.column_offset, 0);
    }
}
