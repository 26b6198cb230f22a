//! 表格视图适配器
//!
//! 只有这里认识电子表格页面的 DOM 结构。

use async_trait::async_trait;
use chromiumoxide::Page;
use serde::Deserialize;
use tracing::debug;

use crate::error::{AppError, AppResult, ExtractError};
use crate::infrastructure::JsExecutor;
use crate::models::{RenderedRow, TableSnapshot};
use crate::views::{EditorSurface, SourceView, ViewId};

/// 读取整张表；宿主注入的行号列以 TH 或 row-header 类名出现
const FETCH_TABLE_JS: &str = r#"
(() => {
    const table = document.querySelector('.waffle');
    if (!table) return { error: '页面中没有 .waffle 表格' };
    const tbody = table.querySelector('tbody');
    if (!tbody) return { error: '表格没有 tbody' };
    const rows = Array.from(tbody.querySelectorAll('tr')).map((tr) => {
        const cells = Array.from(tr.querySelectorAll('th, td'));
        const first = cells[0];
        const rowHeader = !!first && (
            first.tagName === 'TH' ||
            first.classList.contains('row-headers-background') ||
            first.classList.contains('row-header-wrapper')
        );
        return { cells: cells.map((c) => (c.textContent || '').trim()), rowHeader };
    });
    return { rows };
})()
"#;

/// 两种编辑面的查找函数
const EDITOR_LOOKUP_JS: &str = r#"
const findEditBar = () => document.querySelector('.cell-input')
    || document.getElementById('t-formula-bar-input')
    || document.querySelector('.input-box textarea')
    || document.querySelector('#waffle-rich-text-editor');
const findOverlay = () => document.querySelector('.cell_overlay_editor_input')
    || document.querySelector('[contenteditable="true"]');
"#;

#[derive(Debug, Deserialize)]
struct TableScriptResult {
    #[serde(default)]
    rows: Option<Vec<RenderedRow>>,
    #[serde(default)]
    error: Option<String>,
}

fn finder(surface: EditorSurface) -> &'static str {
    match surface {
        EditorSurface::EditBar => "findEditBar",
        EditorSurface::Overlay => "findOverlay",
    }
}

/// 电子表格视图
pub struct SheetsView {
    id: ViewId,
    executor: JsExecutor,
}

impl SheetsView {
    pub fn new(page: Page) -> Self {
        let id = page.target_id().inner().clone();
        Self {
            id,
            executor: JsExecutor::new(page),
        }
    }
}

#[async_trait]
impl SourceView for SheetsView {
    fn id(&self) -> ViewId {
        self.id.clone()
    }

    async fn fetch_table(&self) -> AppResult<TableSnapshot> {
        let result: TableScriptResult = self.executor.eval_as(FETCH_TABLE_JS).await?;
        match (result.rows, result.error) {
            (_, Some(error)) => Err(ExtractError::TableNotFound(error).into()),
            (Some(rows), None) => {
                debug!("表格共 {} 行（含表头）", rows.len());
                Ok(TableSnapshot { rows })
            }
            (None, None) => Err(ExtractError::TableNotFound("脚本没有返回行".to_string()).into()),
        }
    }

    async fn activate_cell(&self, row: usize, column: usize) -> AppResult<bool> {
        let js_code = format!(
            r#"
            (() => {{
                const tbody = document.querySelector('.waffle tbody');
                if (!tbody) return false;
                const row = tbody.querySelectorAll('tr')[{row}];
                if (!row) return false;
                const cell = row.querySelectorAll('th, td')[{column}];
                if (!cell) return false;
                cell.dispatchEvent(new MouseEvent('dblclick', {{ bubbles: true, cancelable: true }}));
                return true;
            }})()
            "#,
            row = row,
            column = column,
        );
        self.executor.eval_as(js_code).await
    }

    async fn probe_editor(&self) -> AppResult<Option<EditorSurface>> {
        let js_code = format!(
            r#"
            (() => {{
                {lookup}
                if (findEditBar()) return 'edit_bar';
                if (findOverlay()) return 'overlay';
                return 'none';
            }})()
            "#,
            lookup = EDITOR_LOOKUP_JS,
        );
        let probe: String = self.executor.eval_as(js_code).await?;
        Ok(match probe.as_str() {
            "edit_bar" => Some(EditorSurface::EditBar),
            "overlay" => Some(EditorSurface::Overlay),
            _ => None,
        })
    }

    async fn replace_editor_text(&self, surface: EditorSurface, value: &str) -> AppResult<()> {
        let js_code = format!(
            r#"
            (() => {{
                {lookup}
                const editor = {finder}();
                if (!editor) return false;
                if (editor.tagName === 'TEXTAREA' || editor.tagName === 'INPUT') {{
                    editor.value = '';
                    editor.value = {value};
                }} else {{
                    editor.textContent = '';
                    editor.textContent = {value};
                }}
                editor.dispatchEvent(new Event('input', {{ bubbles: true }}));
                return true;
            }})()
            "#,
            lookup = EDITOR_LOOKUP_JS,
            finder = finder(surface),
            value = serde_json::to_string(value)?,
        );
        if self.executor.eval_as::<bool>(js_code).await? {
            Ok(())
        } else {
            Err(AppError::other(format!("编辑面 {:?} 已消失", surface)))
        }
    }

    async fn commit_edit(&self, surface: EditorSurface) -> AppResult<()> {
        // 编辑栏需要同时向编辑框和 document 发送回车；覆盖层只向 document 发送
        let target_editor = surface == EditorSurface::EditBar;
        let js_code = format!(
            r#"
            (() => {{
                {lookup}
                const enter = () => new KeyboardEvent('keydown', {{
                    key: 'Enter', code: 'Enter', keyCode: 13, which: 13, bubbles: true,
                }});
                const editor = {finder}();
                if ({target_editor} && editor) editor.dispatchEvent(enter());
                document.dispatchEvent(enter());
                return true;
            }})()
            "#,
            lookup = EDITOR_LOOKUP_JS,
            finder = finder(surface),
            target_editor = target_editor,
        );
        self.executor.eval(js_code).await?;
        Ok(())
    }
}
