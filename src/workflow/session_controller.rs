//! 会话流程 - 流程层
//!
//! 核心职责：编排 加载 → 作答 → 校验 → 提交 → 合并结果 → 重做
//!
//! 状态机：
//! - `Empty → Ready`：加载成功
//! - `Ready → Ready`：修改答案、展开/收起
//! - `Ready → Submitting → Graded`：提交成功
//! - `Submitting → Ready`：提交失败
//! - `Graded → Ready`：重做
//!
//! 每次加载都会让代数 (generation) 加一；提交时记下当时的代数，
//! 响应回来时代数已变化则直接丢弃。每次提交另有序号，
//! 只有仍在等待中的那一次提交的响应会被处理。

use tracing::{debug, info, warn};

use crate::clients::{GradingGateway, LoadRequest, TestLoader};
use crate::error::{AppError, AppResult, SessionError};
use crate::models::grade::{AnswerMap, GradeResult};
use crate::models::question::{RawTest, TestId};
use crate::models::session::{Phase, RevealKind, SessionState};
use crate::services::{OptionNormalizer, SessionStore};
use crate::utils::logging::truncate_text;

/// 已发出、尚未返回的提交
///
/// 持有发出时的代数、提交序号和答案快照，不借用控制器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSubmission {
    generation: u64,
    sequence: u64,
    test_id: Option<TestId>,
    answers: AnswerMap,
}

impl PendingSubmission {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn test_id(&self) -> Option<&TestId> {
        self.test_id.as_ref()
    }

    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }
}

/// 提交响应的处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    /// 结果已写入会话
    Applied(GradeResult),
    /// 会话已重新加载，过期响应被丢弃
    Discarded { stale_generation: u64 },
    /// 该提交已经处理过（或已被新提交取代），响应被忽略
    Superseded { sequence: u64 },
}

/// 会话控制器
///
/// - 唯一持有 `SessionStore`
/// - 通过构造参数注入判分网关
/// - 不自动重试，失败一律交给调用方
pub struct SessionController<G> {
    store: SessionStore,
    normalizer: OptionNormalizer,
    gateway: G,
    generation: u64,
    next_sequence: u64,
    outstanding: Option<u64>,
}

impl<G: GradingGateway> SessionController<G> {
    pub fn new(gateway: G) -> Self {
        Self::with_normalizer(gateway, OptionNormalizer::new())
    }

    pub fn with_normalizer(gateway: G, normalizer: OptionNormalizer) -> Self {
        Self {
            store: SessionStore::new(),
            normalizer,
            gateway,
            generation: 0,
            next_sequence: 0,
            outstanding: None,
        }
    }

    /// 当前会话状态（只读）
    pub fn state(&self) -> &SessionState {
        self.store.state()
    }

    pub fn phase(&self) -> Phase {
        self.store.phase()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// 加载一张新试卷
    ///
    /// 任何阶段都可以加载；成功后阶段为 `Ready`，正在进行的提交作废。
    /// 任一题目选项不合法时整张试卷拒绝加载，原状态不变。
    pub fn load(&mut self, test: RawTest) -> AppResult<()> {
        let questions = self.normalizer.normalize_questions(test.questions)?;
        self.store.load(test.test_id, test.title, questions)?;
        self.generation += 1;
        self.outstanding = None;

        let state = self.store.state();
        info!(
            "✓ 已加载试卷 {} (ID: {}), 共 {} 题, 代数 {}",
            truncate_text(state.display_title(), 40),
            state
                .test_id
                .as_ref()
                .map(|id| id.to_string())
                .unwrap_or_else(|| "无".to_string()),
            state.questions.len(),
            self.generation
        );
        Ok(())
    }

    /// 通过加载器取得试卷后加载
    pub async fn load_from<L: TestLoader + ?Sized>(
        &mut self,
        loader: &L,
        request: LoadRequest,
    ) -> AppResult<()> {
        debug!("加载请求: {:?}", request);
        let test = match &request {
            LoadRequest::ById(id) => loader.fetch_test_by_id(id).await,
            LoadRequest::Upload { path, title } => {
                loader.upload_document(path, title.as_deref()).await
            }
            LoadRequest::Parse(path) => loader.parse_document(path).await,
        }
        .map_err(|e| {
            warn!("⚠️ 加载试卷失败: {}", e);
            e
        })?;

        self.load(test)
    }

    /// 作答（可反复修改）
    pub fn set_answer(&mut self, index: usize, letter: char) -> AppResult<()> {
        match self.phase() {
            Phase::Submitting => return Err(self.rejected(SessionError::SessionBusy)),
            Phase::Graded => {
                return Err(self.rejected(SessionError::InvalidPhase {
                    operation: "set_answer",
                    phase: Phase::Graded,
                }))
            }
            Phase::Empty | Phase::Ready => {}
        }

        self.store.set_answer(index, letter).map_err(|e| {
            warn!("⚠️ 拒绝答案: {}", e);
            e
        })
    }

    /// 展开/收起某题的正确答案或解析
    ///
    /// 与判分无关，任何已加载的阶段都可以切换；返回切换后是否展开
    pub fn toggle_reveal(&mut self, kind: RevealKind, index: usize) -> AppResult<bool> {
        self.store.toggle_reveal(kind, index)
    }

    /// 开始一次提交
    ///
    /// 校验所有题目都已作答，然后进入 `Submitting`。未通过校验时不发请求，阶段不变。
    pub fn begin_submission(&mut self) -> AppResult<PendingSubmission> {
        match self.phase() {
            Phase::Ready => {}
            Phase::Submitting => return Err(self.rejected(SessionError::SubmissionInProgress)),
            phase => {
                return Err(self.rejected(SessionError::InvalidPhase {
                    operation: "submit_answers",
                    phase,
                }))
            }
        }

        let state = self.store.state();
        let missing = state.missing_answers();
        if !missing.is_empty() {
            return Err(self.rejected(SessionError::IncompleteAnswers {
                answered: state.answers.len(),
                total: state.questions.len(),
                missing,
            }));
        }

        self.next_sequence += 1;
        let pending = PendingSubmission {
            generation: self.generation,
            sequence: self.next_sequence,
            test_id: state.test_id.clone(),
            answers: state.answers.clone(),
        };
        self.store.mark_submitting();
        self.outstanding = Some(pending.sequence);

        info!(
            "📤 提交 {} 道题的答案 (代数 {})",
            pending.answers.len(),
            pending.generation
        );
        Ok(pending)
    }

    /// 处理提交的响应
    ///
    /// 代数已过期、或不是当前等待中的那次提交的响应直接丢弃，不触碰当前会话；
    /// 否则成功时进入 `Graded`，失败时回到 `Ready` 并返回错误
    pub fn complete_submission(
        &mut self,
        pending: PendingSubmission,
        outcome: AppResult<GradeResult>,
    ) -> AppResult<SubmissionOutcome> {
        if pending.generation != self.generation {
            warn!(
                "⚠️ 丢弃过期的判分响应 (提交代数 {}, 当前代数 {})",
                pending.generation, self.generation
            );
            return Ok(SubmissionOutcome::Discarded {
                stale_generation: pending.generation,
            });
        }

        if self.outstanding != Some(pending.sequence) || self.phase() != Phase::Submitting {
            warn!(
                "⚠️ 忽略不在等待中的提交响应 (序号 {}, 阶段 {:?})",
                pending.sequence,
                self.phase()
            );
            return Ok(SubmissionOutcome::Superseded {
                sequence: pending.sequence,
            });
        }
        self.outstanding = None;

        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                self.store.abort_submission();
                warn!("⚠️ 判分失败，回到作答阶段: {}", e);
                return Err(e);
            }
        };

        if let Err(e) = self.store.set_result(result.clone()) {
            self.store.abort_submission();
            warn!("⚠️ 判分结果与试卷不符，回到作答阶段: {}", e);
            return Err(e);
        }

        info!(
            "✓ 判分完成: {}/{} ({}%)",
            result.score, result.total, result.percent
        );
        Ok(SubmissionOutcome::Applied(result))
    }

    /// 提交答案：校验 → 调用一次判分网关 → 合并结果
    pub async fn submit_answers(&mut self) -> AppResult<GradeResult> {
        let pending = self.begin_submission()?;
        let outcome = self
            .gateway
            .submit(pending.test_id(), pending.answers())
            .await;

        match self.complete_submission(pending, outcome)? {
            SubmissionOutcome::Applied(result) => Ok(result),
            // 持有 &mut self 期间不会发生，仍按未写入处理
            SubmissionOutcome::Discarded { .. } | SubmissionOutcome::Superseded { .. } => {
                Err(SessionError::SubmissionSuperseded.into())
            }
        }
    }

    /// 重做：清空答案、结果和展开状态，保留试卷
    pub fn retake(&mut self) -> AppResult<()> {
        if self.phase() != Phase::Graded {
            return Err(self.rejected(SessionError::InvalidPhase {
                operation: "retake",
                phase: self.phase(),
            }));
        }
        self.store.reset();
        info!("🔄 重新作答: {}", self.store.state().display_title());
        Ok(())
    }

    fn rejected(&self, err: SessionError) -> AppError {
        warn!("⚠️ 操作被拒绝 (阶段 {:?}): {}", self.phase(), err);
        err.into()
    }
}
