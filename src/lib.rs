//! # Word Quiz
//!
//! 从 Word 文档解析出的选择题作答会话
//!
//! ## 架构设计
//!
//! ### ① 数据层（Models）
//! - `models/` - 题目、选项、判分结果、会话状态以及服务端数据格式
//!
//! ### ② 业务能力层（Services）
//! - `OptionNormalizer` - 把原始选项文本规范成按位置编号的选项
//! - `SessionStore` - 持有唯一的会话状态，校验每次修改
//! - `ReportWriter` - 写成绩报告
//!
//! ### ③ 外部接口层（Clients）
//! - `GradingGateway` - 判分接口（一次提交一次请求，不重试）
//! - `TestLoader` - 按ID拉取 / 上传文档 / 解析文档
//!
//! ### ④ 流程层（Workflow）
//! - `SessionController` - 状态机：加载 → 作答 → 提交 → 判分 → 重做
//!
//! ## 模块结构

pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use clients::{GradingGateway, HttpGradingClient, HttpTestLoader, LoadRequest, TestLoader};
pub use config::Config;
pub use error::{AppError, AppResult, GradingError, SessionError};
pub use models::{GradeResult, Phase, Question, QuizOption, RawTest, RevealKind, SessionState, TestId};
pub use services::{OptionNormalizer, SessionStore};
pub use workflow::{SessionController, SubmissionOutcome};
