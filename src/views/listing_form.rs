//! 出品表单视图适配器
//!
//! 每个逻辑字段对应：面板标题、（可选）标签页、输入框 / 下拉 / 单选的候选选择器。
//! 面板按标题文字查找，选择器按顺序尝试，第一个命中的生效。

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::Page;
use tokio::time::sleep;
use tracing::debug;

use crate::error::AppResult;
use crate::infrastructure::JsExecutor;
use crate::views::{FieldOutcome, FormField, FormLocator, TargetView, ViewId};

/// 页面内的公共函数：按标题找面板、按候选选择器找控件、让宿主框架感知到的赋值
const FORM_HELPERS_JS: &str = r#"
const findPanel = (title) => {
    for (const panel of document.querySelectorAll('.bmm-c-panel__item')) {
        const ttl = panel.querySelector('.bmm-c-summary__ttl');
        if (ttl && ttl.textContent.trim().includes(title)) return panel;
    }
    return null;
};
const firstMatch = (root, selectors) => {
    for (const selector of selectors) {
        const el = root.querySelector(selector);
        if (el) return el;
    }
    return null;
};
const setInputValue = (element, value) => {
    const tag = element.tagName.toLowerCase();
    if (tag === 'input' || tag === 'textarea') {
        const proto = tag === 'input'
            ? window.HTMLInputElement.prototype
            : window.HTMLTextAreaElement.prototype;
        const setter = Object.getOwnPropertyDescriptor(proto, 'value')?.set;
        if (setter) {
            setter.call(element, value);
        } else {
            element.value = value;
        }
    } else {
        element.textContent = value;
    }
    for (const type of ['input', 'change', 'blur']) {
        element.dispatchEvent(new Event(type, { bubbles: true }));
    }
};
"#;

const PREVIEW_BUTTON_TEXT: &str = "入力内容を確認する";

/// 字段的定位信息
struct FieldLocator {
    panel: &'static str,
    tab: Option<&'static str>,
    inputs: &'static [&'static str],
    selects: &'static [&'static str],
    radio: &'static str,
}

fn locator(field: FormField) -> FieldLocator {
    let base = FieldLocator {
        panel: "",
        tab: None,
        inputs: &[],
        selects: &[],
        radio: "",
    };
    match field {
        FormField::ProductName => FieldLocator {
            panel: "商品名",
            inputs: &["input.bmm-c-text-field"],
            ..base
        },
        FormField::Comment => FieldLocator {
            panel: "商品コメント",
            inputs: &["textarea.bmm-c-textarea"],
            ..base
        },
        FormField::ColorTone => FieldLocator {
            panel: "色・サイズ",
            tab: Some("色"),
            selects: &[".sell-color-table .Select-control", ".Select-control"],
            ..base
        },
        FormField::Size => FieldLocator {
            panel: "色・サイズ",
            tab: Some("サイズ"),
            inputs: &[".sell-size-table input.bmm-c-text-field", "[class*=\"size\"] input"],
            selects: &[".sell-size-table .Select-control", "[class*=\"size\"] .Select-control"],
            ..base
        },
        FormField::PurchaseLocation => FieldLocator {
            panel: "買付地",
            radio: "input.bmm-c-radio__input",
            ..base
        },
        FormField::ShopName => FieldLocator {
            panel: "買付先ショップ名",
            inputs: &["input.bmm-c-text-field"],
            ..base
        },
        FormField::Price => FieldLocator {
            panel: "商品価格",
            inputs: &["input.bmm-c-text-field--half-size-char", "input.bmm-c-text-field"],
            ..base
        },
    }
}

/// 出品表单视图
pub struct ListingFormView {
    id: ViewId,
    executor: JsExecutor,
    /// 点击标签页 / 打开下拉后等待渲染
    option_wait: Duration,
}

impl ListingFormView {
    pub fn new(page: Page, option_wait: Duration) -> Self {
        let id = page.target_id().inner().clone();
        Self {
            id,
            executor: JsExecutor::new(page),
            option_wait,
        }
    }

    /// 在字段面板内执行一段脚本；面板不存在时返回 panel_missing
    async fn in_panel(&self, field: FormField, body: &str) -> AppResult<FieldOutcome> {
        let js_code = format!(
            r#"
            (() => {{
                {helpers}
                const panel = findPanel({title});
                if (!panel) return 'panel_missing';
                {body}
            }})()
            "#,
            helpers = FORM_HELPERS_JS,
            title = serde_json::to_string(locator(field).panel)?,
            body = body,
        );
        let outcome: FieldOutcome = self.executor.eval_as(js_code).await?;
        debug!("{:?} -> {:?}", field, outcome);
        Ok(outcome)
    }
}

#[async_trait]
impl FormLocator for ListingFormView {
    async fn set_text(&self, field: FormField, value: &str) -> AppResult<FieldOutcome> {
        let body = format!(
            r#"
            const input = firstMatch(panel, {selectors});
            if (!input) return 'control_missing';
            setInputValue(input, {value});
            return 'applied';
            "#,
            selectors = serde_json::to_string(locator(field).inputs)?,
            value = serde_json::to_string(value)?,
        );
        self.in_panel(field, &body).await
    }

    async fn select_option(&self, field: FormField, value: &str) -> AppResult<FieldOutcome> {
        let field_locator = locator(field);

        // 1. 切换到字段所在的标签页
        if let Some(tab) = field_locator.tab {
            let body = format!(
                r#"
                for (const tab of panel.querySelectorAll('.sell-variation__tab-item, [role="tab"]')) {{
                    if (tab.textContent.includes({tab})) {{
                        tab.click();
                        break;
                    }}
                }}
                return 'applied';
                "#,
                tab = serde_json::to_string(tab)?,
            );
            if self.in_panel(field, &body).await? == FieldOutcome::PanelMissing {
                return Ok(FieldOutcome::PanelMissing);
            }
            sleep(self.option_wait).await;
        }

        // 2. 打开下拉
        let body = format!(
            r#"
            const control = firstMatch(panel, {selectors});
            if (!control) return 'control_missing';
            control.click();
            return 'applied';
            "#,
            selectors = serde_json::to_string(field_locator.selects)?,
        );
        let opened = self.in_panel(field, &body).await?;
        if opened != FieldOutcome::Applied {
            return Ok(opened);
        }
        sleep(self.option_wait).await;

        // 3. 按子串匹配选项；没有匹配时按 Escape 关闭下拉
        let js_code = format!(
            r#"
            (() => {{
                const wanted = {value};
                for (const option of document.querySelectorAll('.Select-menu-outer .Select-option')) {{
                    if (option.textContent.trim().includes(wanted)) {{
                        option.click();
                        return 'applied';
                    }}
                }}
                document.dispatchEvent(new KeyboardEvent('keydown', {{
                    key: 'Escape', code: 'Escape', keyCode: 27, bubbles: true,
                }}));
                return 'no_match';
            }})()
            "#,
            value = serde_json::to_string(value)?,
        );
        self.executor.eval_as(js_code).await
    }

    async fn choose_radio(&self, field: FormField, value: &str) -> AppResult<FieldOutcome> {
        let selector = format!("{}[value=\"{}\"]", locator(field).radio, value);
        let body = format!(
            r#"
            const radio = panel.querySelector({selector});
            if (!radio) return 'control_missing';
            radio.click();
            radio.dispatchEvent(new Event('change', {{ bubbles: true }}));
            return 'applied';
            "#,
            selector = serde_json::to_string(&selector)?,
        );
        self.in_panel(field, &body).await
    }

    async fn click_preview(&self) -> AppResult<bool> {
        let js_code = format!(
            r#"
            (() => {{
                const bar = document.querySelector('.sell-btnbar');
                if (!bar) return false;
                for (const btn of bar.querySelectorAll('button')) {{
                    if (btn.textContent.trim().includes({label})) {{
                        btn.click();
                        return true;
                    }}
                }}
                return false;
            }})()
            "#,
            label = serde_json::to_string(PREVIEW_BUTTON_TEXT)?,
        );
        self.executor.eval_as(js_code).await
    }
}

#[async_trait]
impl TargetView for ListingFormView {
    fn id(&self) -> ViewId {
        self.id.clone()
    }

    async fn wait_loaded(&self) -> AppResult<()> {
        self.executor.page().wait_for_navigation().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_field_has_a_panel() {
        for field in [
            FormField::ProductName,
            FormField::Comment,
            FormField::ColorTone,
            FormField::Size,
            FormField::PurchaseLocation,
            FormField::ShopName,
            FormField::Price,
        ] {
            assert!(!locator(field).panel.is_empty(), "{:?}", field);
        }
    }

    #[test]
    fn test_size_has_select_and_text_fallback() {
        let size = locator(FormField::Size);
        assert!(!size.selects.is_empty());
        assert!(!size.inputs.is_empty());
        assert_eq!(size.tab, Some("サイズ"));
    }
}
