//! 应用入口 - 编排层
//!
//! 1. **初始化**：日志文件、启动信息、连接浏览器、启动编排器
//! 2. **输出**：每一次 STATE_UPDATE 以一行 JSON 打印到标准输出
//! 3. **输入**：从标准输入读取控制命令（JSON 信封或 start / stop / state / quit）
//! 4. **退出**：Ctrl-C 或标准输入关闭

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::models::Message;
use crate::orchestrator::{job_sequencer, OrchestratorHandle};
use crate::services::RunJournal;
use crate::utils::logging::{init_log_file, log_startup, truncate_text};
use crate::views::ChromeWorkspace;

/// 控制命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(Message),
    Quit,
}

/// 解析一行输入；无法识别时返回 None
pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.starts_with('{') {
        return serde_json::from_str::<Message>(line).ok().map(Command::Send);
    }
    match line.to_lowercase().as_str() {
        "start" => Some(Command::Send(Message::Start)),
        "stop" => Some(Command::Send(Message::Stop)),
        "state" => Some(Command::Send(Message::GetState)),
        "quit" | "exit" => Some(Command::Quit),
        _ => None,
    }
}

/// 应用主结构
pub struct App {
    config: Config,
    _workspace: Arc<ChromeWorkspace>,
    handle: OrchestratorHandle,
    task: JoinHandle<()>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        // 初始化日志文件
        init_log_file(&config.output_log_file)
            .with_context(|| format!("初始化日志文件失败: {}", config.output_log_file))?;

        log_startup(&config);

        // 连接浏览器
        let workspace = Arc::new(
            ChromeWorkspace::connect(&config)
                .await
                .context("连接浏览器失败")?,
        );

        let (handle, task) = job_sequencer::spawn(config.clone(), workspace.clone());

        Ok(Self {
            config,
            _workspace: workspace,
            handle,
            task,
        })
    }

    /// 运行应用主逻辑，直到退出
    pub async fn run(self) -> Result<()> {
        let shutdown = CancellationToken::new();

        let token = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("收到 Ctrl-C，准备退出");
                token.cancel();
            }
        });

        tokio::spawn(RunJournal::with_path(&self.config.output_log_file).follow(self.handle.subscribe()));
        tokio::spawn(print_updates(self.handle.subscribe(), shutdown.clone()));

        if self.config.auto_start {
            info!("⚡ 自动开始");
            self.handle.start();
        }
        info!("💡 输入 start / stop / state / quit，或 JSON 消息");

        let result = self.read_commands(&shutdown).await;
        shutdown.cancel();

        let final_state = self.handle.get_state();
        self.handle.shutdown();
        if let Err(e) = self.task.await {
            warn!("编排器任务异常结束: {}", e);
        }

        info!("{}", "=".repeat(60));
        info!(
            "📊 最终状态: {} {}/{}",
            final_state.status.label(),
            final_state.current_index,
            final_state.total
        );
        info!("日志已保存至: {}", self.config.output_log_file);
        info!("{}", "=".repeat(60));

        result
    }

    /// 读取标准输入的控制命令
    async fn read_commands(&self, shutdown: &CancellationToken) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            let line = tokio::select! {
                _ = shutdown.cancelled() => break,
                line = lines.next_line() => line?,
            };
            let Some(line) = line else {
                info!("标准输入已关闭");
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            match parse_command(&line) {
                Some(Command::Quit) => break,
                Some(Command::Send(message)) => {
                    if let Some(state) = self.handle.dispatch(message) {
                        println!("{}", serde_json::to_string(&state)?);
                    }
                }
                None => warn!("无法识别的命令: {}", truncate_text(&line, 80)),
            }
        }

        Ok(())
    }
}

/// 把每一次 STATE_UPDATE 打印为一行 JSON
async fn print_updates(mut updates: broadcast::Receiver<Message>, shutdown: CancellationToken) {
    loop {
        let message = tokio::select! {
            _ = shutdown.cancelled() => break,
            message = updates.recv() => message,
        };
        match message {
            Ok(Message::StateUpdate { state }) => {
                info!(
                    "📣 {} {}/{}",
                    state.status.label(),
                    state.current_index,
                    state.total
                );
                match serde_json::to_string(&Message::StateUpdate { state }) {
                    Ok(line) => println!("{}", line),
                    Err(e) => warn!("序列化状态失败: {}", e),
                }
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(n)) => warn!("输出落后，丢失 {} 条状态", n),
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_words() {
        assert_eq!(parse_command("start"), Some(Command::Send(Message::Start)));
        assert_eq!(parse_command("  STOP "), Some(Command::Send(Message::Stop)));
        assert_eq!(parse_command("state"), Some(Command::Send(Message::GetState)));
        assert_eq!(parse_command("quit"), Some(Command::Quit));
        assert_eq!(parse_command("restart"), None);
    }

    #[test]
    fn test_parse_json_envelopes() {
        assert_eq!(
            parse_command(r#"{"type":"FILL_COMPLETE"}"#),
            Some(Command::Send(Message::FillComplete))
        );
        assert_eq!(parse_command(r#"{"type":"NOPE"}"#), None);
    }
}
