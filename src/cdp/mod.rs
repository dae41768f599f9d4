//! # Chrome DevTools Protocol (CDP) 层
//!
//! 提供 Chrome/Chromium 浏览器的 WebSocket 通信接口，基于 Chrome DevTools Protocol 驱动页面验证。
//!
//! ## 主要功能
//! - **WebSocket 连接管理**: 建立和维护与浏览器的 CDP WebSocket 连接
//! - **协议通信**: 发送 CDP 命令并按命令类型应用超时
//! - **导航控制**: 页面导航、readyState 轮询
//! - **脚本执行**: 在页面上下文中执行 JavaScript
//! - **截图功能**: 整页或裁剪区域的页面截图
//! - **输入派发**: 鼠标点击、按键序列、文本插入
//!
//! ## 模块结构
//! - `traits`: CDP 操作的核心 trait 定义
//! - `types`: CDP 协议相关的数据类型
//! - `connection`: WebSocket 连接实现
//! - `client`: CDP 客户端实现
//! - `browser`: 浏览器级别的操作
//! - `keys`: 按键名到 CDP 按键事件参数的映射
//! - `mock`: 用于测试的 Mock 实现
//!
//! ## 使用示例
//! ```rust,no_run
//! use veristep::cdp::{CdpBrowser, CdpBrowserImpl, CdpClient};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // 连接到浏览器调试端点
//! let browser = CdpBrowserImpl::new("http://127.0.0.1:9222");
//! let target = browser.create_page("about:blank").await?;
//! let client = browser.create_client(&target).await?;
//!
//! // 导航到页面
//! let result = client
//!     .navigate("http://localhost:5173/", Duration::from_secs(10))
//!     .await?;
//! println!("Navigated to: {}", result.url);
//! # Ok(())
//! # }
//! ```

pub mod traits;
pub mod types;
pub mod connection;
pub mod client;
pub mod browser;
pub mod keys;
pub mod mock;


pub use traits::{
    CdpConnection, CdpClient, CdpBrowser, CdpResponse, CdpError,
    NavigationResult, EvaluationResult, ScreenshotFormat,
    PageTarget, BrowserVersion,
};

// Re-export implementation structs
pub use connection::CdpWebSocketConnection;
pub use client::CdpClientImpl;
pub use browser::CdpBrowserImpl;

// Re-export mock for development/testing
pub use mock::{MockCdpBrowser, MockCdpClient, MockCdpConnection};
