//! 基于 CDP 的浏览器工作区
//!
//! - 按 URL 前缀找到表格视图
//! - 打开出品表单视图，并监听其主框架导航
//! - 监听 target 销毁，转换为视图关闭事件

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::{EventFrameNavigated, EventNavigatedWithinDocument};
use chromiumoxide::cdp::browser_protocol::target::EventTargetDestroyed;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::browser::connect_to_browser;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::views::{
    ListingFormView, SheetsView, SourceView, TargetView, ViewEvent, ViewId, Workspace,
};

const EVENT_CAPACITY: usize = 64;

/// 浏览器工作区
pub struct ChromeWorkspace {
    browser: Arc<Browser>,
    source_url_prefix: String,
    option_wait: Duration,
    events: broadcast::Sender<ViewEvent>,
}

impl ChromeWorkspace {
    /// 连接浏览器并开始监听视图关闭
    pub async fn connect(config: &Config) -> AppResult<Self> {
        let browser = connect_to_browser(config.browser_debug_port).await?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let mut destroyed = browser.event_listener::<EventTargetDestroyed>().await?;
        let closed_tx = events.clone();
        tokio::spawn(async move {
            while let Some(event) = destroyed.next().await {
                let view = event.target_id.inner().clone();
                debug!("视图已关闭: {}", view);
                let _ = closed_tx.send(ViewEvent::Closed { view });
            }
        });

        Ok(Self {
            browser: Arc::new(browser),
            source_url_prefix: config.source_url_prefix.clone(),
            option_wait: config.field_step(),
            events,
        })
    }

    /// 转发页面主框架的导航事件
    async fn watch_navigation(&self, page: &Page, view: ViewId) -> AppResult<()> {
        let mut navigated = page.event_listener::<EventFrameNavigated>().await?;
        let mut within_document = page.event_listener::<EventNavigatedWithinDocument>().await?;
        let main_frame = page.mainframe().await?;
        let tx = self.events.clone();

        tokio::spawn(async move {
            loop {
                let url = tokio::select! {
                    Some(event) = navigated.next() => {
                        if event.frame.parent_id.is_some() {
                            continue;
                        }
                        event.frame.url.clone()
                    }
                    Some(event) = within_document.next() => {
                        if main_frame.as_ref() != Some(&event.frame_id) {
                            continue;
                        }
                        event.url.clone()
                    }
                    else => break,
                };
                debug!("视图 {} 导航到 {}", view, url);
                let _ = tx.send(ViewEvent::Navigated {
                    view: view.clone(),
                    url,
                });
            }
        });

        Ok(())
    }
}

#[async_trait]
impl Workspace for ChromeWorkspace {
    async fn find_source_views(&self) -> AppResult<Vec<Arc<dyn SourceView>>> {
        let mut views: Vec<Arc<dyn SourceView>> = Vec::new();
        for page in self.browser.pages().await? {
            if let Some(url) = page.url().await? {
                if url.starts_with(&self.source_url_prefix) {
                    debug!("找到表格视图: {}", url);
                    views.push(Arc::new(SheetsView::new(page)));
                }
            }
        }
        Ok(views)
    }

    async fn open_target_view(&self, url: &str) -> AppResult<Arc<dyn TargetView>> {
        let page = self
            .browser
            .new_page(url)
            .await
            .map_err(|e| AppError::open_failed(url, e))?;

        let view = ListingFormView::new(page.clone(), self.option_wait);
        self.watch_navigation(&page, view.id()).await?;
        info!("已打开出品页面: {}", url);
        Ok(Arc::new(view))
    }

    fn subscribe_events(&self) -> broadcast::Receiver<ViewEvent> {
        self.events.subscribe()
    }
}
