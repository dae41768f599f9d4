//! # 会话层
//!
//! 管理浏览器会话的生命周期，并提供验证引擎所依赖的页面驱动抽象。
//!
//! ## 主要功能
//! - **会话启动**: 启动 Chrome 进程或附加到已有的调试端点
//! - **页面驱动**: 导航、元素查询、输入派发、脚本执行和截图
//! - **元素快照**: 以值的形式观察元素状态，查询每次使用时重新求值
//! - **资源释放**: 会话在任何退出路径上恰好释放一次
//!
//! ## 核心概念
//! - **Session**: 一个浏览器实例加一个活动页面，拥有全部句柄
//! - **PageDriver**: 引擎与页面之间的接缝，测试用 `FakePage` 替换
//! - **ElementSnapshot**: 查询时刻的元素观察值，不是活句柄
//!
//! ## 模块结构
//! - `traits`: 页面驱动和元素快照的核心定义
//! - `launcher`: Chrome 启动与会话构建
//! - `page`: 基于 CDP 客户端的页面驱动实现
//! - `js`: 元素查询脚本的生成
//! - `mock`: 用于测试的脚本化内存页面

pub mod traits;
pub mod launcher;
pub mod page;
pub mod js;
pub mod mock;

#[cfg(test)]
pub mod tests;

pub use traits::{ElementSnapshot, PageDriver, Rect};

// Re-export implementation structs
pub use launcher::{Session, SessionLauncher};
pub use page::CdpPageDriver;

// Re-export the fake page for driver-independent tests
pub use mock::{FakeElement, FakePage, PageModel};
