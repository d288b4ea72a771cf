//! 成绩报告写入服务 - 业务能力层
//!
//! 只负责"写报告文件"能力，不关心流程

use anyhow::Result;
use std::fmt::Write as _;
use tokio::fs;
use tracing::debug;

use crate::models::session::SessionState;

/// 成绩报告写入服务
pub struct ReportWriter {
    report_file_path: String,
}

impl ReportWriter {
    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            report_file_path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.report_file_path
    }

    /// 把已判分的会话写入报告文件（覆盖旧文件）
    pub async fn write(&self, state: &SessionState) -> Result<()> {
        let report = render_report(state, &chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string());
        debug!("写入报告: {} ({} 字节)", self.report_file_path, report.len());
        fs::write(&self.report_file_path, report).await?;
        Ok(())
    }
}

/// 生成报告文本
///
/// # 参数
/// - `state`: 会话状态
/// - `timestamp`: 报告头部时间
pub fn render_report(state: &SessionState, timestamp: &str) -> String {
    let mut out = format!(
        "{}\n试卷成绩报告 - {}\n{}\n\n",
        "=".repeat(60),
        timestamp,
        "=".repeat(60)
    );

    let _ = writeln!(out, "试卷: {}", state.display_title());
    if let Some(id) = &state.test_id {
        let _ = writeln!(out, "试卷ID: {}", id);
    }

    match &state.result {
        Some(result) => {
            let _ = writeln!(
                out,
                "得分: {}/{} ({}%)\n",
                result.score, result.total, result.percent
            );
        }
        None => {
            let _ = writeln!(out, "尚未判分\n");
        }
    }

    for question in &state.questions {
        let answer = state
            .answer(question.index)
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        let verdict = match state.outcome(question.index) {
            Some(o) if o.is_correct => "✓".to_string(),
            Some(o) => format!("✗ 正确答案: {}", o.correct_answer),
            None => String::new(),
        };
        let _ = writeln!(
            out,
            "{}. {} [作答: {}] {}",
            question.index + 1,
            question.prompt,
            answer,
            verdict
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::grade::{GradeResult, QuestionOutcome};
    use crate::models::question::{Question, QuizOption};

    fn graded_state() -> SessionState {
        let option = |letter: char| QuizOption {
            letter,
            text: letter.to_string(),
        };
        SessionState {
            title: Some("Capitals".to_string()),
            questions: vec![
                Question {
                    index: 0,
                    prompt: "Capital of France?".to_string(),
                    options: vec![option('a'), option('b')],
                    correct_answer: None,
                    explanation: None,
                },
                Question {
                    index: 1,
                    prompt: "2 + 2?".to_string(),
                    options: vec![option('a'), option('b')],
                    correct_answer: None,
                    explanation: None,
                },
            ],
            answers: [(0, 'a'), (1, 'b')].into_iter().collect(),
            result: Some(GradeResult {
                score: 1,
                total: 2,
                percent: 50.0,
                per_question: vec![
                    QuestionOutcome {
                        is_correct: true,
                        correct_answer: 'a',
                    },
                    QuestionOutcome {
                        is_correct: false,
                        correct_answer: 'a',
                    },
                ],
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_render_report() {
        let report = render_report(&graded_state(), "2026-01-01 00:00:00");
        assert!(report.contains("试卷成绩报告 - 2026-01-01 00:00:00"));
        assert!(report.contains("得分: 1/2 (50%)"));
        assert!(report.contains("1. Capital of France? [作答: a] ✓"));
        assert!(report.contains("2. 2 + 2? [作答: b] ✗ 正确答案: a"));
    }

    #[tokio::test]
    async fn test_write_report_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        let writer = ReportWriter::with_path(path.to_string_lossy());

        writer.write(&graded_state()).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("试卷: Capitals"));
    }
}
