//! # Motion Host
//!
//! 无界面宿主：读取 JSON 配置与场景脚本，构建视图树，用固定帧率驱动
//! [`motion_runtime`] 的过渡状态机，输出 JSON 运行报告。
//!
//! ## 模块结构
//!
//! - [`config`]：宿主配置（帧率、日志级别、过渡选项、报告选项）
//! - [`scenario`]：场景脚本与场景构建
//! - [`runner`]：帧循环
//! - [`report`]：运行报告
//! - [`error`]：错误类型

pub mod config;
pub mod error;
pub mod report;
pub mod runner;
pub mod scenario;

pub use config::{DEFAULT_CONFIG_PATH, HostConfig, ReportConfig};
pub use error::{ConfigError, ScenarioError};
pub use report::{EventRecord, FrameRecord, Report, ViewReport};
pub use runner::ScenarioRunner;
pub use scenario::{Scenario, ScenarioSummary, Scene};
