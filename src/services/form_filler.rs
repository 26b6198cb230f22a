//! 表单填写服务 - 业务能力层
//!
//! 按固定顺序把一个 `WorkItem` 填进出品表单，最后点击预览。
//!
//! 字段顺序：商品名 → 商品说明 → 色系 → 尺码 → 买付地 → 买付先店铺名 → 价格
//!
//! 只有商品名的面板或输入框找不到才算失败；其余字段找不到控件时
//! 只记录警告并继续，部分填写是正常情况。

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppResult, FillError};
use crate::models::WorkItem;
use crate::views::{FieldOutcome, FormField, FormLocator};

static NON_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^0-9]").expect("valid regex"));

/// 商品说明里官方网站行的前缀
pub const SITE_LINE_PREFIX: &str = "公式サイト: ";

/// 买付地
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseLocation {
    Domestic,
    Overseas,
}

impl PurchaseLocation {
    /// 从自由文本推断：含「国内」或 domestic（不区分大小写）为国内，其余一律海外
    pub fn classify(text: &str) -> Self {
        if text.contains("国内") || text.to_lowercase().contains("domestic") {
            PurchaseLocation::Domestic
        } else {
            PurchaseLocation::Overseas
        }
    }

    /// 单选框的 value
    pub fn radio_value(self) -> &'static str {
        match self {
            PurchaseLocation::Domestic => "domestic",
            PurchaseLocation::Overseas => "overseas",
        }
    }
}

/// 价格只保留数字
pub fn normalize_price(raw: &str) -> String {
    NON_DIGITS.replace_all(raw, "").into_owned()
}

/// 商品说明：商品名 + 官方网站，一行一个
pub fn build_comment(item: &WorkItem) -> String {
    let mut lines = Vec::new();
    if !item.product_name.is_empty() {
        lines.push(item.product_name.clone());
    }
    if !item.official_site.is_empty() {
        lines.push(format!("{}{}", SITE_LINE_PREFIX, item.official_site));
    }
    lines.join("\n")
}

/// 表单填写服务
pub struct FormFiller {
    dom_wait: Duration,
    field_step: Duration,
    preview_pause: Duration,
}

impl FormFiller {
    pub fn new(config: &Config) -> Self {
        Self {
            dom_wait: config.form_dom_wait(),
            field_step: config.field_step(),
            preview_pause: config.preview_pause(),
        }
    }

    /// 填写整张表单并进入预览
    pub async fn fill<F>(&self, form: &F, item: &WorkItem) -> AppResult<()>
    where
        F: FormLocator + ?Sized,
    {
        info!("📝 开始填写表单: {}", item.product_name);

        // 等待 DOM 稳定
        sleep(self.dom_wait).await;

        // 1. 商品名（必填）
        if !item.product_name.is_empty() {
            match form.set_text(FormField::ProductName, &item.product_name).await? {
                FieldOutcome::Applied => info!("✓ 商品名: {}", item.product_name),
                FieldOutcome::PanelMissing => return Err(FillError::NamePanelMissing.into()),
                _ => return Err(FillError::NameInputMissing.into()),
            }
            self.step().await;
        }

        // 2. 商品说明
        let comment = build_comment(item);
        if !comment.is_empty() {
            let outcome = form.set_text(FormField::Comment, &comment).await;
            self.report(FormField::Comment, "商品说明", outcome);
            self.step().await;
        }

        // 3. 色系
        if !item.color_tone.is_empty() {
            let outcome = form.select_option(FormField::ColorTone, &item.color_tone).await;
            self.report(FormField::ColorTone, &item.color_tone, outcome);
            self.step().await;
        }

        // 4. 尺码（没有下拉时退回文本输入）
        if !item.size.is_empty() {
            let outcome = match form.select_option(FormField::Size, &item.size).await {
                Ok(FieldOutcome::ControlMissing) => {
                    info!("尺码没有下拉控件，改用文本输入");
                    form.set_text(FormField::Size, &item.size).await
                }
                other => other,
            };
            self.report(FormField::Size, &item.size, outcome);
            self.step().await;
        }

        // 5. 买付地
        if !item.purchase_location.is_empty() {
            let location = PurchaseLocation::classify(&item.purchase_location);
            let outcome = form
                .choose_radio(FormField::PurchaseLocation, location.radio_value())
                .await;
            self.report(FormField::PurchaseLocation, location.radio_value(), outcome);
            self.step().await;
        }

        // 6. 买付先店铺名
        if !item.official_site.is_empty() {
            let outcome = form.set_text(FormField::ShopName, &item.official_site).await;
            self.report(FormField::ShopName, &item.official_site, outcome);
            self.step().await;
        }

        // 7. 价格（日元列）
        if !item.yen.is_empty() {
            let price = normalize_price(&item.yen);
            if price.is_empty() {
                warn!("⚠️ 价格 '{}' 不含数字（跳过）", item.yen);
            } else {
                let outcome = form.set_text(FormField::Price, &price).await;
                self.report(FormField::Price, &price, outcome);
                self.step().await;
            }
        }

        // 8. 无论前面是否有跳过，都进入预览
        sleep(self.preview_pause).await;
        match form.click_preview().await {
            Ok(true) => info!("✓ 已点击预览按钮"),
            Ok(false) => warn!("⚠️ 找不到预览按钮"),
            Err(e) => warn!("⚠️ 点击预览按钮失败: {}", e),
        }

        info!("✅ 表单填写完成: {}", item.product_name);
        Ok(())
    }

    async fn step(&self) {
        sleep(self.field_step).await;
    }

    /// 可选字段的结果只记录，不中断
    fn report(&self, field: FormField, value: &str, outcome: AppResult<FieldOutcome>) {
        match outcome {
            Ok(FieldOutcome::Applied) => info!("✓ {:?}: {}", field, value),
            Ok(FieldOutcome::PanelMissing) => warn!("⚠️ {:?} 面板不存在（跳过）", field),
            Ok(FieldOutcome::ControlMissing) => warn!("⚠️ {:?} 输入控件不存在（跳过）", field),
            Ok(FieldOutcome::NoMatch) => warn!("⚠️ {:?} 没有匹配 '{}' 的选项（跳过）", field, value),
            Err(e) => warn!("⚠️ {:?} 填写出错（跳过）: {}", field, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// 记录调用的假表单
    #[derive(Default)]
    struct RecordingForm {
        calls: Mutex<Vec<(FormField, String)>>,
        outcomes: HashMap<FormField, FieldOutcome>,
        broken: Option<FormField>,
        preview_clicked: Mutex<bool>,
    }

    impl RecordingForm {
        fn with(mut self, field: FormField, outcome: FieldOutcome) -> Self {
            self.outcomes.insert(field, outcome);
            self
        }

        fn record(&self, field: FormField, value: &str) -> AppResult<FieldOutcome> {
            self.calls.lock().unwrap().push((field, value.to_string()));
            if self.broken == Some(field) {
                return Err(AppError::other("script threw"));
            }
            Ok(self.outcomes.get(&field).copied().unwrap_or(FieldOutcome::Applied))
        }

        fn calls(&self) -> Vec<(FormField, String)> {
            self.calls.lock().unwrap().clone()
        }

        fn fields(&self) -> Vec<FormField> {
            self.calls().into_iter().map(|(f, _)| f).collect()
        }
    }

    #[async_trait]
    impl FormLocator for RecordingForm {
        async fn set_text(&self, field: FormField, value: &str) -> AppResult<FieldOutcome> {
            self.record(field, value)
        }

        async fn select_option(&self, field: FormField, value: &str) -> AppResult<FieldOutcome> {
            self.record(field, value)
        }

        async fn choose_radio(&self, field: FormField, value: &str) -> AppResult<FieldOutcome> {
            self.record(field, value)
        }

        async fn click_preview(&self) -> AppResult<bool> {
            *self.preview_clicked.lock().unwrap() = true;
            Ok(true)
        }
    }

    fn filler() -> FormFiller {
        FormFiller::new(&Config::default().without_delays())
    }

    fn full_item() -> WorkItem {
        WorkItem {
            row_index: 2,
            brand: "CELINE".to_string(),
            product_name: "トリオンフ バッグ".to_string(),
            official_site: "celine.com".to_string(),
            purchase_location: "フランス".to_string(),
            color_tone: "ブラック".to_string(),
            size: "M".to_string(),
            yen: "¥12,345".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_fills_fields_in_order() {
        let form = RecordingForm::default();
        tokio_test::assert_ok!(filler().fill(&form, &full_item()).await);

        assert_eq!(
            form.fields(),
            vec![
                FormField::ProductName,
                FormField::Comment,
                FormField::ColorTone,
                FormField::Size,
                FormField::PurchaseLocation,
                FormField::ShopName,
                FormField::Price,
            ]
        );
        let calls = form.calls();
        assert_eq!(calls[1].1, "トリオンフ バッグ\n公式サイト: celine.com");
        assert_eq!(calls[4].1, "overseas");
        assert_eq!(calls[6].1, "12345");
        assert!(*form.preview_clicked.lock().unwrap());
    }

    #[tokio::test]
    async fn test_empty_optional_fields_are_not_touched() {
        let item = WorkItem {
            product_name: "スニーカー".to_string(),
            ..Default::default()
        };
        let form = RecordingForm::default();
        tokio_test::assert_ok!(filler().fill(&form, &item).await);

        assert_eq!(form.fields(), vec![FormField::ProductName, FormField::Comment]);
        assert_eq!(form.calls()[1].1, "スニーカー");
        assert!(*form.preview_clicked.lock().unwrap());
    }

    #[tokio::test]
    async fn test_missing_name_panel_is_fatal() {
        let form = RecordingForm::default().with(FormField::ProductName, FieldOutcome::PanelMissing);
        let err = tokio_test::assert_err!(filler().fill(&form, &full_item()).await);
        assert!(matches!(err, AppError::Fill(FillError::NamePanelMissing)));
        assert_eq!(form.fields(), vec![FormField::ProductName]);
        assert!(!*form.preview_clicked.lock().unwrap());
    }

    #[tokio::test]
    async fn test_missing_name_input_is_fatal() {
        let form = RecordingForm::default().with(FormField::ProductName, FieldOutcome::ControlMissing);
        let err = tokio_test::assert_err!(filler().fill(&form, &full_item()).await);
        assert!(matches!(err, AppError::Fill(FillError::NameInputMissing)));
    }

    #[tokio::test]
    async fn test_missing_optional_controls_still_preview() {
        let form = RecordingForm::default()
            .with(FormField::Comment, FieldOutcome::PanelMissing)
            .with(FormField::ColorTone, FieldOutcome::NoMatch)
            .with(FormField::PurchaseLocation, FieldOutcome::ControlMissing);
        let form = RecordingForm {
            broken: Some(FormField::ShopName),
            ..form
        };

        tokio_test::assert_ok!(filler().fill(&form, &full_item()).await);
        assert_eq!(form.fields().len(), 7);
        assert!(*form.preview_clicked.lock().unwrap());
    }

    #[tokio::test]
    async fn test_size_falls_back_to_text_input() {
        let form = RecordingForm::default().with(FormField::Size, FieldOutcome::ControlMissing);
        tokio_test::assert_ok!(filler().fill(&form, &full_item()).await);

        let sizes: Vec<_> = form
            .calls()
            .into_iter()
            .filter(|(f, _)| *f == FormField::Size)
            .collect();
        assert_eq!(sizes.len(), 2);
    }

    #[tokio::test]
    async fn test_price_without_digits_is_skipped() {
        let item = WorkItem {
            yen: "未定".to_string(),
            ..full_item()
        };
        let form = RecordingForm::default();
        tokio_test::assert_ok!(filler().fill(&form, &item).await);
        assert!(!form.fields().contains(&FormField::Price));
    }

    #[test]
    fn test_normalize_price() {
        assert_eq!(normalize_price("¥12,345"), "12345");
        assert_eq!(normalize_price("12 345 円"), "12345");
        assert_eq!(normalize_price("98000"), "98000");
    }

    #[test]
    fn test_classify_purchase_location() {
        assert_eq!(PurchaseLocation::classify("国内"), PurchaseLocation::Domestic);
        assert_eq!(PurchaseLocation::classify("日本国内発送"), PurchaseLocation::Domestic);
        assert_eq!(PurchaseLocation::classify("Domestic"), PurchaseLocation::Domestic);
        assert_eq!(PurchaseLocation::classify("海外"), PurchaseLocation::Overseas);
        assert_eq!(PurchaseLocation::classify("イタリア"), PurchaseLocation::Overseas);
        assert_eq!(PurchaseLocation::classify("???"), PurchaseLocation::Overseas);
    }

    #[test]
    fn test_build_comment_without_site() {
        let item = WorkItem {
            product_name: "ローファー".to_string(),
            ..Default::default()
        };
        assert_eq!(build_comment(&item), "ローファー");
    }
}
