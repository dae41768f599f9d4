//! # 验证引擎
//!
//! 场景执行器依赖的五个组成部分：选择器解析、条件等待、动作执行、
//! 断言检查和证据截图。每个部分都可以单独针对假页面进行测试。
//!
//! ## 主要功能
//! - **选择器解析**: 把声明式元素查询解析为恰好一个活动元素
//! - **条件等待**: 按固定间隔轮询条件，超时时报告最后观察到的状态
//! - **动作执行**: 每个元素动作前隐式执行可操作性等待
//! - **断言检查**: 无副作用的单次条件求值，失败时附带诊断快照
//! - **证据截图**: 整页或按查询裁剪的幂等截图
//!
//! ## 模块结构
//! - `query`: 元素查询词汇（角色、文本、CSS、包含过滤、序号）
//! - `resolver`: 候选集分类，歧义显式失败
//! - `wait`: 等待引擎与可操作性检查
//! - `actions`: 动作执行器（导航重试一次，升级超时）
//! - `assertions`: 断言条件与检查
//! - `capture`: 截图持久化

pub mod query;
pub mod resolver;
pub mod wait;
pub mod actions;
pub mod assertions;
pub mod capture;

pub use query::{ElementQuery, QueryKind};
pub use resolver::{resolve_one, resolve_optional, ResolvedElement};
pub use wait::{WaitUntil, Waiter};
pub use actions::ActionExecutor;
pub use assertions::{check, Condition};
pub use capture::EvidenceCapture;
