//! # 场景层
//!
//! 场景即数据：一个命名的步骤序列，由一个运行器按声明顺序解释执行。
//! 同一个运行器消除了原始验证脚本之间的重复，每个控件的行为差异
//! 体现为场景文件的配置差异。
//!
//! ## 主要功能
//! - **步骤模型**: 带标签的步骤枚举，从 JSON 场景文件反序列化
//! - **状态机**: `Idle -> SessionStarting -> Running -> {Completed, Failed} -> TornDown`
//! - **无条件释放**: 任何退出路径上会话恰好关闭一次
//! - **结果聚合**: 逐步报告、追加式工件列表和进程退出码映射
//!
//! ## 模块结构
//! - `step`: 步骤与场景的数据模型
//! - `runner`: 场景运行器与执行结果

pub mod step;
pub mod runner;

pub use step::{Scenario, Step};
pub use runner::{
    ExecutionResult, Outcome, RunState, ScenarioRunner, SessionProvider, StepOutcome, StepReport,
};
