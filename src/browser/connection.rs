use std::time::Duration;

use chromiumoxide::Browser;
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::{AppError, AppResult};

/// 连接到已经打开调试端口的浏览器
///
/// 操作员自己的浏览器：表格和出品页面都在里面，预览确认也由操作员完成。
pub async fn connect_to_browser(port: u16) -> AppResult<Browser> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);

    let (browser, mut handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("连接浏览器失败: {}", e);
        AppError::browser_connection_failed(port, e)
    })?;
    debug!("浏览器连接成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
        debug!("浏览器事件循环结束");
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(Duration::from_millis(300)).await;

    Ok(browser)
}
