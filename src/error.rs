use thiserror::Error;

use crate::models::session::{Phase, RevealKind};

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 会话状态机错误
    #[error("会话错误: {0}")]
    Session(#[from] SessionError),
    /// 判分接口错误
    #[error("判分错误: {0}")]
    Grading(#[from] GradingError),
    /// 试卷加载错误
    #[error("加载错误: {0}")]
    Loader(#[from] LoaderError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 会话相关错误
#[derive(Debug, Error)]
pub enum SessionError {
    /// 选项数据不合法，题目无法作答
    #[error("题目 {question_index:?} 的选项数据不合法: {reason}")]
    MalformedOptions {
        question_index: Option<usize>,
        reason: String,
    },
    /// 答案不合法（题号越界或字母不在选项中）
    #[error("无效答案: 题目 {index} 选项 '{letter}' ({reason})")]
    InvalidAnswer {
        index: usize,
        letter: char,
        reason: String,
    },
    /// 展开目标不存在
    #[error("无法展开题目 {index} 的{kind}")]
    InvalidRevealTarget { kind: RevealKind, index: usize },
    /// 还有题目未作答
    #[error("还有 {} 道题未作答 (已答 {answered}/{total})", .missing.len())]
    IncompleteAnswers {
        answered: usize,
        total: usize,
        missing: Vec<usize>,
    },
    /// 已有提交正在进行
    #[error("已有提交正在进行中")]
    SubmissionInProgress,
    /// 提交期间会话被锁定
    #[error("提交进行中，暂不能修改答案")]
    SessionBusy,
    /// 提交在返回前已被新的加载或提交取代
    #[error("提交已被取代，判分结果未写入")]
    SubmissionSuperseded,
    /// 判分结果与题目数量不一致
    #[error("判分结果数量 {actual} 与题目数量 {expected} 不一致")]
    GradingMismatch { expected: usize, actual: usize },
    /// 当前阶段不允许该操作
    #[error("阶段 {phase:?} 下不允许执行 {operation}")]
    InvalidPhase {
        operation: &'static str,
        phase: Phase,
    },
}

/// 判分接口错误
#[derive(Debug, Error)]
pub enum GradingError {
    /// 服务端拒绝了提交（结构化校验错误）
    #[error("提交被拒绝 (状态码: {status}): {}", detail_message(.detail))]
    SubmissionRejected {
        status: u16,
        detail: serde_json::Value,
    },
    /// 网络不可达或超时
    #[error("判分请求失败 ({endpoint}): {source}")]
    Transport {
        endpoint: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 服务端内部错误
    #[error("判分服务不可用 ({endpoint}): 状态码 {status}")]
    ServerUnavailable { endpoint: String, status: u16 },
    /// 响应不是完整的判分结果
    #[error("判分响应格式错误: {reason}")]
    MalformedResponse { reason: String },
}

impl GradingError {
    /// 服务端返回的原始错误详情（仅限被拒绝的提交）
    pub fn detail(&self) -> Option<&serde_json::Value> {
        match self {
            GradingError::SubmissionRejected { detail, .. } => Some(detail),
            _ => None,
        }
    }
}

/// 试卷加载错误
#[derive(Debug, Error)]
pub enum LoaderError {
    /// 请求失败
    #[error("试卷请求失败 ({endpoint}): {source}")]
    Transport {
        endpoint: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 服务端返回错误响应
    #[error("试卷接口返回错误 ({endpoint}, 状态码 {status}): {}", detail_message(.detail))]
    Rejected {
        endpoint: String,
        status: u16,
        detail: serde_json::Value,
    },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        source: std::io::Error,
    },
    /// 解析试卷数据失败
    #[error("解析试卷数据失败 ({origin}): {reason}")]
    DecodeFailed { origin: String, reason: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置值不合法
    #[error("配置项 {name} 的值 '{value}' 不合法: {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// 从服务端错误详情中提取可读信息
///
/// 服务端可能返回 `{"error": "..."}`、`{"detail": "..."}` 或纯字符串
pub fn detail_message(detail: &serde_json::Value) -> String {
    match detail {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Object(map) => map
            .get("error")
            .or_else(|| map.get("detail"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| detail.to_string()),
        other => other.to_string(),
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建选项数据错误
    pub fn malformed_options(question_index: Option<usize>, reason: impl Into<String>) -> Self {
        AppError::Session(SessionError::MalformedOptions {
            question_index,
            reason: reason.into(),
        })
    }

    /// 创建无效答案错误
    pub fn invalid_answer(index: usize, letter: char, reason: impl Into<String>) -> Self {
        AppError::Session(SessionError::InvalidAnswer {
            index,
            letter,
            reason: reason.into(),
        })
    }

    /// 创建判分请求失败错误
    pub fn grading_transport(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Grading(GradingError::Transport {
            endpoint: endpoint.into(),
            source: Box::new(source),
        })
    }

    /// 创建判分响应格式错误
    pub fn malformed_response(reason: impl Into<String>) -> Self {
        AppError::Grading(GradingError::MalformedResponse {
            reason: reason.into(),
        })
    }

    /// 创建试卷请求失败错误
    pub fn loader_transport(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Loader(LoaderError::Transport {
            endpoint: endpoint.into(),
            source: Box::new(source),
        })
    }

    /// 创建试卷解析失败错误
    pub fn decode_failed(origin: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Loader(LoaderError::DecodeFailed {
            origin: origin.into(),
            reason: reason.into(),
        })
    }

    /// 会话在该错误之后是否仍可继续使用
    ///
    /// 数据错误与调用方误用只让本次调用失败；其余错误均可由用户重新操作恢复
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Session(SessionError::MalformedOptions { .. })
            | AppError::Session(SessionError::InvalidAnswer { .. })
            | AppError::Session(SessionError::InvalidRevealTarget { .. })
            | AppError::Config(_) => false,
            _ => true,
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detail_message_extracts_error_field() {
        assert_eq!(
            detail_message(&json!({"error": "test_id and answers are required"})),
            "test_id and answers are required"
        );
        assert_eq!(detail_message(&json!({"detail": "Not found."})), "Not found.");
        assert_eq!(detail_message(&json!("plain text")), "plain text");
        assert_eq!(
            detail_message(&json!({"answers": ["bad"]})),
            r#"{"answers":["bad"]}"#
        );
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(AppError::from(SessionError::SessionBusy).is_recoverable());
        assert!(AppError::from(SessionError::IncompleteAnswers {
            answered: 1,
            total: 2,
            missing: vec![1],
        })
        .is_recoverable());
        assert!(AppError::malformed_response("empty").is_recoverable());
        assert!(!AppError::invalid_answer(0, 'z', "不在选项中").is_recoverable());
        assert!(!AppError::malformed_options(None, "空选项").is_recoverable());
    }

    #[test]
    fn test_rejected_detail_is_kept_verbatim() {
        let detail = json!({"error": "Test not found"});
        let err = GradingError::SubmissionRejected {
            status: 404,
            detail: detail.clone(),
        };
        assert_eq!(err.detail(), Some(&detail));
        assert!(err.to_string().contains("Test not found"));
    }
}
