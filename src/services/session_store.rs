//! 会话存储 - 业务能力层
//!
//! 持有唯一的 `SessionState`，所有修改都是同步且完整的

use tracing::debug;

use crate::error::{AppError, AppResult, SessionError};
use crate::models::grade::GradeResult;
use crate::models::question::{Question, TestId};
use crate::models::session::{Phase, RevealKind, SessionState};

/// 会话存储
///
/// 职责：
/// - 校验每一次修改，失败时状态保持不变
/// - 不发网络请求，不关心流程顺序（阶段守卫由控制器负责）
#[derive(Debug, Default)]
pub struct SessionStore {
    state: SessionState,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// 整体替换当前试卷
    ///
    /// 清空答案、判分结果和展开状态，阶段变为 `Ready`
    pub fn load(
        &mut self,
        test_id: Option<TestId>,
        title: Option<String>,
        mut questions: Vec<Question>,
    ) -> AppResult<()> {
        if questions.is_empty() {
            return Err(AppError::malformed_options(None, "试卷不包含任何题目"));
        }
        if let Some(q) = questions.iter().find(|q| q.options.is_empty()) {
            return Err(AppError::malformed_options(Some(q.index), "题目没有选项"));
        }

        for (i, q) in questions.iter_mut().enumerate() {
            q.index = i;
        }

        self.state = SessionState {
            test_id,
            title,
            questions,
            phase: Phase::Ready,
            ..Default::default()
        };
        Ok(())
    }

    /// 记录某题的答案，重复作答会覆盖
    pub fn set_answer(&mut self, index: usize, letter: char) -> AppResult<()> {
        let letter = letter.to_ascii_lowercase();
        let question = self.state.questions.get(index).ok_or_else(|| {
            AppError::invalid_answer(
                index,
                letter,
                format!("题号超出范围 [0, {})", self.state.questions.len()),
            )
        })?;

        if !question.has_letter(letter) {
            return Err(AppError::invalid_answer(index, letter, "不是本题的选项"));
        }

        self.state.answers.insert(index, letter);
        Ok(())
    }

    /// 切换某题的展开状态，连续切换两次等于没有切换
    ///
    /// 题目必须存在且带有对应内容（正确答案或解析）
    pub fn toggle_reveal(&mut self, kind: RevealKind, index: usize) -> AppResult<bool> {
        let has_content = self
            .state
            .questions
            .get(index)
            .map(|q| match kind {
                RevealKind::Correct => q.correct_answer.is_some(),
                RevealKind::Explanation => q.explanation.is_some(),
            })
            .unwrap_or(false);

        if !has_content {
            return Err(SessionError::InvalidRevealTarget { kind, index }.into());
        }

        let set = match kind {
            RevealKind::Correct => &mut self.state.reveal_correct,
            RevealKind::Explanation => &mut self.state.reveal_explanation,
        };
        let shown = if set.remove(&index) {
            false
        } else {
            set.insert(index);
            true
        };
        debug!("题目 {} {}: {}", index, kind, if shown { "展开" } else { "收起" });
        Ok(shown)
    }

    /// 写入判分结果，阶段变为 `Graded`
    ///
    /// 结果数量与题目数量不一致时拒绝，状态不变
    pub fn set_result(&mut self, result: GradeResult) -> AppResult<()> {
        let expected = self.state.questions.len();
        let actual = result.per_question.len();
        if expected != actual {
            return Err(SessionError::GradingMismatch { expected, actual }.into());
        }

        self.state.result = Some(result);
        self.state.phase = Phase::Graded;
        Ok(())
    }

    /// 重做：保留试卷，清空作答痕迹
    pub fn reset(&mut self) {
        self.state.answers.clear();
        self.state.result = None;
        self.state.reveal_correct.clear();
        self.state.reveal_explanation.clear();
        self.state.phase = if self.state.is_loaded() {
            Phase::Ready
        } else {
            Phase::Empty
        };
    }

    pub(crate) fn mark_submitting(&mut self) {
        self.state.phase = Phase::Submitting;
    }

    /// 提交失败后回到 `Ready`
    pub(crate) fn abort_submission(&mut self) {
        if self.state.phase == Phase::Submitting {
            self.state.phase = Phase::Ready;
        }
    }
}
