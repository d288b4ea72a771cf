use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{AppError, AppResult};
use crate::models::question::{parse_letter, TestId};

/// 题号 -> 所选字母
pub type AnswerMap = BTreeMap<usize, char>;

/// 单题判分结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOutcome {
    pub is_correct: bool,
    pub correct_answer: char,
}

/// 判分结果，收到后不再修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeResult {
    pub score: u32,
    pub total: u32,
    pub percent: f64,
    /// 与题目按序号一一对应
    pub per_question: Vec<QuestionOutcome>,
}

impl GradeResult {
    pub fn outcome(&self, index: usize) -> Option<&QuestionOutcome> {
        self.per_question.get(index)
    }
}

/// 判分请求体
#[derive(Debug, Serialize)]
pub struct GradeRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_id: Option<&'a TestId>,
    pub answers: &'a AnswerMap,
}

/// 判分接口的成功响应
#[derive(Debug, Clone, Deserialize)]
pub struct GradeResponse {
    pub score: u32,
    pub total: u32,
    pub percent: f64,
    pub results: Vec<GradeResponseItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GradeResponseItem {
    pub is_correct: bool,
    pub correct_answer: String,
    #[serde(default)]
    pub question_number: Option<u32>,
    #[serde(default)]
    pub user_answer: Option<String>,
}

impl TryFrom<GradeResponse> for GradeResult {
    type Error = AppError;

    /// 只接受完整的判分结果，任何一项不合法整体失败
    fn try_from(response: GradeResponse) -> AppResult<Self> {
        if !(0.0..=100.0).contains(&response.percent) {
            return Err(AppError::malformed_response(format!(
                "percent 超出范围: {}",
                response.percent
            )));
        }
        if response.score > response.total {
            return Err(AppError::malformed_response(format!(
                "score {} 大于 total {}",
                response.score, response.total
            )));
        }
        if response.results.len() != response.total as usize {
            return Err(AppError::malformed_response(format!(
                "results 数量 {} 与 total {} 不一致",
                response.results.len(),
                response.total
            )));
        }

        let per_question = response
            .results
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                let correct_answer = parse_letter(&item.correct_answer).ok_or_else(|| {
                    AppError::malformed_response(format!(
                        "第 {} 题的 correct_answer 不是字母: {:?}",
                        i + 1,
                        item.correct_answer
                    ))
                })?;
                Ok(QuestionOutcome {
                    is_correct: item.is_correct,
                    correct_answer,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(GradeResult {
            score: response.score,
            total: response.total,
            percent: response.percent,
            per_question,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_shape() {
        let answers: AnswerMap = [(0, 'a'), (1, 'b')].into_iter().collect();
        let id = TestId::new("3");
        let body = serde_json::to_value(GradeRequest {
            test_id: Some(&id),
            answers: &answers,
        })
        .unwrap();
        assert_eq!(body, json!({"test_id": "3", "answers": {"0": "a", "1": "b"}}));

        let anonymous = serde_json::to_value(GradeRequest {
            test_id: None,
            answers: &answers,
        })
        .unwrap();
        assert!(anonymous.get("test_id").is_none());
    }

    #[test]
    fn test_response_with_extra_fields_converts() {
        let response: GradeResponse = serde_json::from_value(json!({
            "score": 1, "total": 2, "percent": 50,
            "results": [
                {"question_number": 1, "is_correct": true, "correct_answer": "a", "user_answer": "a"},
                {"question_number": 2, "is_correct": false, "correct_answer": "B", "user_answer": "a"}
            ]
        }))
        .unwrap();
        let result = GradeResult::try_from(response).unwrap();
        assert_eq!(result.score, 1);
        assert_eq!(result.percent, 50.0);
        assert_eq!(result.outcome(1).unwrap().correct_answer, 'b');
        assert!(!result.outcome(1).unwrap().is_correct);
    }

    #[test]
    fn test_incomplete_response_is_rejected() {
        let response: GradeResponse = serde_json::from_value(json!({
            "score": 1, "total": 2, "percent": 50,
            "results": [{"is_correct": true, "correct_answer": "a"}]
        }))
        .unwrap();
        assert!(GradeResult::try_from(response).is_err());

        let bad_percent: GradeResponse = serde_json::from_value(json!({
            "score": 0, "total": 0, "percent": 120, "results": []
        }))
        .unwrap();
        assert!(GradeResult::try_from(bad_percent).is_err());
    }
}
