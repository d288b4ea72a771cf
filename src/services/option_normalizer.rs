//! 选项规范化服务 - 业务能力层
//!
//! 只负责把原始选项文本变成 `(字母, 文本)`，不关心会话状态

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::error::{AppError, AppResult, SessionError};
use crate::models::question::{letter_for, parse_letter, Question, QuizOption, RawQuestion};

/// 行首的字母前缀，如 `a) `、`B)`
static PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[a-z]\)\s*").expect("前缀正则合法"));

/// 被拼接在同一个字符串里的选项前缀
static EMBEDDED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[a-d]\)").expect("内嵌前缀正则合法"));

/// 选项规范化服务
///
/// 职责：
/// - 拆分被拼接在一起的选项
/// - 去掉文本自带的字母前缀
/// - 字母只按位置分配，不信任原文中的字母
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionNormalizer;

impl OptionNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// 规范化一组原始选项
    ///
    /// # 参数
    /// - `raw_options`: 原始选项文本，可能已分开，也可能多个选项挤在一个字符串里
    ///
    /// # 返回
    /// 按位置编号为 `a`, `b`, `c`... 的选项列表；输入为空时返回 `MalformedOptions`
    pub fn normalize<S: AsRef<str>>(&self, raw_options: &[S]) -> AppResult<Vec<QuizOption>> {
        if raw_options.is_empty() {
            return Err(AppError::malformed_options(None, "选项列表为空"));
        }

        // 只剩前缀的片段（如 "b)"）没有内容，不占字母
        let fragments: Vec<&str> = raw_options
            .iter()
            .flat_map(|raw| split_packed(raw.as_ref()))
            .map(strip_prefix)
            .filter(|text| !text.is_empty())
            .collect();

        if fragments.is_empty() {
            return Err(AppError::malformed_options(None, "拆分后没有任何选项"));
        }
        if fragments.len() > 26 {
            return Err(AppError::malformed_options(
                None,
                format!("选项数量 {} 超过字母表长度", fragments.len()),
            ));
        }

        if fragments.len() != raw_options.len() {
            debug!(
                "拆分拼接选项: {} 条原始文本 -> {} 个选项",
                raw_options.len(),
                fragments.len()
            );
        }

        let options = fragments
            .into_iter()
            .enumerate()
            .filter_map(|(position, text)| {
                letter_for(position).map(|letter| QuizOption {
                    letter,
                    text: text.to_string(),
                })
            })
            .collect();

        Ok(options)
    }

    /// 规范化一道原始题目
    ///
    /// 空解析视为无解析；正确答案必须是本题存在的字母
    pub fn normalize_question(&self, index: usize, raw: RawQuestion) -> AppResult<Question> {
        let options = self
            .normalize(&raw.options)
            .map_err(|e| with_question_index(e, index))?;

        let correct_answer = match raw.correct_answer.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(text) => {
                let letter = parse_letter(text)
                    .filter(|l| options.iter().any(|o| o.letter == *l))
                    .ok_or_else(|| {
                        AppError::malformed_options(
                            Some(index),
                            format!("正确答案 '{}' 不是本题的选项", text),
                        )
                    })?;
                Some(letter)
            }
        };

        let explanation = raw
            .explanation
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());

        Ok(Question {
            index,
            prompt: raw.question.trim().to_string(),
            options,
            correct_answer,
            explanation,
        })
    }

    /// 规范化整张试卷的题目
    pub fn normalize_questions(&self, raw: Vec<RawQuestion>) -> AppResult<Vec<Question>> {
        raw.into_iter()
            .enumerate()
            .map(|(index, q)| self.normalize_question(index, q))
            .collect()
    }
}

/// 多个前缀挤在同一条文本里时按前缀拆开，否则原样返回
///
/// 前缀前面紧挨字母时不算（避免把 "Lead)" 之类的单词拆开）
fn split_packed(raw: &str) -> Vec<&str> {
    let starts: Vec<usize> = EMBEDDED_RE
        .find_iter(raw)
        .map(|m| m.start())
        .filter(|&start| {
            raw[..start]
                .chars()
                .next_back()
                .map_or(true, |c| !c.is_alphabetic())
        })
        .collect();

    if starts.len() < 2 {
        return vec![raw];
    }

    let mut bounds = Vec::with_capacity(starts.len() + 2);
    bounds.push(0);
    bounds.extend(starts);
    bounds.push(raw.len());
    bounds.dedup();

    bounds
        .windows(2)
        .map(|w| raw[w[0]..w[1]].trim())
        .filter(|fragment| !fragment.is_empty())
        .collect()
}

fn strip_prefix(fragment: &str) -> &str {
    let trimmed = fragment.trim();
    match PREFIX_RE.find(trimmed) {
        Some(m) => trimmed[m.end()..].trim(),
        None => trimmed,
    }
}

fn with_question_index(err: AppError, index: usize) -> AppError {
    match err {
        AppError::Session(SessionError::MalformedOptions {
            question_index: None,
            reason,
        }) => AppError::malformed_options(Some(index), reason),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letters(options: &[QuizOption]) -> Vec<char> {
        options.iter().map(|o| o.letter).collect()
    }

    fn texts(options: &[QuizOption]) -> Vec<&str> {
        options.iter().map(|o| o.text.as_str()).collect()
    }

    #[test]
    fn test_separated_options_get_positional_letters() {
        let options = OptionNormalizer::new()
            .normalize(&["a) Paris", "b) Rome", "Berlin"])
            .unwrap();
        assert_eq!(letters(&options), vec!['a', 'b', 'c']);
        assert_eq!(texts(&options), vec!["Paris", "Rome", "Berlin"]);
    }

    #[test]
    fn test_mis_prefixed_options_ignore_source_letters() {
        let options = OptionNormalizer::new().normalize(&["c) 4", "d) 5"]).unwrap();
        assert_eq!(letters(&options), vec!['a', 'b']);
        assert_eq!(texts(&options), vec!["4", "5"]);
    }

    #[test]
    fn test_uppercase_prefix_is_stripped() {
        let options = OptionNormalizer::new().normalize(&["A)  Paris ", "B)Rome"]).unwrap();
        assert_eq!(texts(&options), vec!["Paris", "Rome"]);
    }

    #[test]
    fn test_packed_string_is_split() {
        let options = OptionNormalizer::new()
            .normalize(&["a) Paris b) Rome c) Berlin"])
            .unwrap();
        assert_eq!(letters(&options), vec!['a', 'b', 'c']);
        assert_eq!(texts(&options), vec!["Paris", "Rome", "Berlin"]);
    }

    #[test]
    fn test_packed_string_with_repeated_or_unordered_letters() {
        let options = OptionNormalizer::new()
            .normalize(&["b) 4 a) 5 a) 6 d) 7"])
            .unwrap();
        assert_eq!(letters(&options), vec!['a', 'b', 'c', 'd']);
        assert_eq!(texts(&options), vec!["4", "5", "6", "7"]);
    }

    #[test]
    fn test_packed_without_spaces() {
        let options = OptionNormalizer::new().normalize(&["a)4,b)5"]).unwrap();
        assert_eq!(texts(&options), vec!["4,", "5"]);
    }

    #[test]
    fn test_word_ending_in_letter_is_not_split() {
        let options = OptionNormalizer::new()
            .normalize(&["a) Lead) pipes", "b) Copper"])
            .unwrap();
        assert_eq!(texts(&options), vec!["Lead) pipes", "Copper"]);
    }

    #[test]
    fn test_prefix_only_fragments_are_dropped() {
        let options = OptionNormalizer::new()
            .normalize(&["Both a) and b)", "Neither"])
            .unwrap();
        assert_eq!(letters(&options), vec!['a', 'b', 'c']);
        assert_eq!(texts(&options), vec!["Both", "and", "Neither"]);

        let only_prefixes = OptionNormalizer::new().normalize(&["a)", " b) "]);
        assert!(matches!(
            only_prefixes,
            Err(AppError::Session(SessionError::MalformedOptions { .. }))
        ));
    }

    #[test]
    fn test_empty_input_is_malformed() {
        let empty: [&str; 0] = [];
        let result = OptionNormalizer::new().normalize(&empty);
        assert!(matches!(
            result,
            Err(AppError::Session(SessionError::MalformedOptions { .. }))
        ));
    }

    #[test]
    fn test_too_many_options_is_malformed() {
        let raw: Vec<String> = (0..27).map(|i| format!("option {}", i)).collect();
        assert!(OptionNormalizer::new().normalize(&raw).is_err());
    }

    #[test]
    fn test_normalize_question_fields() {
        let raw = RawQuestion {
            question: " Capital of France? ".to_string(),
            options: vec!["a) Paris".to_string(), "b) Rome".to_string()],
            explanation: Some("   ".to_string()),
            correct_answer: Some("A".to_string()),
            number: Some(1),
        };
        let question = OptionNormalizer::new().normalize_question(0, raw).unwrap();
        assert_eq!(question.prompt, "Capital of France?");
        assert_eq!(question.correct_answer, Some('a'));
        assert_eq!(question.explanation, None);
    }

    #[test]
    fn test_normalize_question_reports_index() {
        let raw = RawQuestion {
            question: "Empty?".to_string(),
            ..Default::default()
        };
        let err = OptionNormalizer::new().normalize_question(3, raw).unwrap_err();
        assert!(matches!(
            err,
            AppError::Session(SessionError::MalformedOptions {
                question_index: Some(3),
                ..
            })
        ));
    }

    #[test]
    fn test_correct_answer_outside_options_is_rejected() {
        let raw = RawQuestion {
            question: "2 + 2?".to_string(),
            options: vec!["4".to_string(), "5".to_string()],
            correct_answer: Some("c".to_string()),
            ..Default::default()
        };
        assert!(OptionNormalizer::new().normalize_question(0, raw).is_err());
    }
}
