use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::models::grade::{AnswerMap, GradeResult, QuestionOutcome};
use crate::models::question::{Question, TestId};

/// 未命名试卷的显示标题
pub const UNTITLED_TEST: &str = "Untitled Test";

/// 会话所处阶段
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// 尚未加载试卷
    #[default]
    Empty,
    /// 可以作答
    Ready,
    /// 判分请求进行中
    Submitting,
    /// 已判分
    Graded,
}

/// 展开内容的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RevealKind {
    /// 正确答案
    Correct,
    /// 解析
    Explanation,
}

impl std::fmt::Display for RevealKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RevealKind::Correct => write!(f, "正确答案"),
            RevealKind::Explanation => write!(f, "解析"),
        }
    }
}

/// 当前试卷会话的完整状态
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionState {
    pub test_id: Option<TestId>,
    pub title: Option<String>,
    /// 为空表示尚未加载试卷
    pub questions: Vec<Question>,
    pub answers: AnswerMap,
    pub reveal_correct: BTreeSet<usize>,
    pub reveal_explanation: BTreeSet<usize>,
    pub result: Option<GradeResult>,
    pub phase: Phase,
}

impl SessionState {
    pub fn is_loaded(&self) -> bool {
        !self.questions.is_empty()
    }

    pub fn answer(&self, index: usize) -> Option<char> {
        self.answers.get(&index).copied()
    }

    /// 尚未作答的题号（升序）
    pub fn missing_answers(&self) -> Vec<usize> {
        (0..self.questions.len())
            .filter(|i| !self.answers.contains_key(i))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.is_loaded() && self.missing_answers().is_empty()
    }

    pub fn is_revealed(&self, kind: RevealKind, index: usize) -> bool {
        self.reveal_set(kind).contains(&index)
    }

    pub fn reveal_set(&self, kind: RevealKind) -> &BTreeSet<usize> {
        match kind {
            RevealKind::Correct => &self.reveal_correct,
            RevealKind::Explanation => &self.reveal_explanation,
        }
    }

    /// 判分后某题的结果
    pub fn outcome(&self, index: usize) -> Option<&QuestionOutcome> {
        self.result.as_ref().and_then(|r| r.outcome(index))
    }

    /// 标题为空时显示默认标题
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(UNTITLED_TEST)
    }
}
