use serde::{Deserialize, Serialize};

/// 试卷标识
///
/// 服务端可能以整数或字符串形式返回 id，统一按字符串保存
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TestId(String);

impl TestId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TestId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<u64> for TestId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

// id 既可能是字符串也可能是整数
impl<'de> Deserialize<'de> for TestId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Visitor;
        use std::fmt;

        struct TestIdVisitor;

        impl<'de> Visitor<'de> for TestIdVisitor {
            type Value = TestId;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or integer test id")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(TestId::new(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(TestId(value.to_string()))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(TestId(value.to_string()))
            }
        }

        deserializer.deserialize_any(TestIdVisitor)
    }
}

/// 规范化后的选项：字母只由位置决定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    pub letter: char,
    pub text: String,
}

/// 已加载的题目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// 题目序号（从0开始）
    pub index: usize,
    /// 题干
    pub prompt: String,
    pub options: Vec<QuizOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<char>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl Question {
    /// 该题是否存在某个选项字母
    pub fn has_letter(&self, letter: char) -> bool {
        self.options.iter().any(|o| o.letter == letter)
    }

    pub fn option(&self, letter: char) -> Option<&QuizOption> {
        self.options.iter().find(|o| o.letter == letter)
    }
}

/// 解析服务返回的原始题目
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawQuestion {
    #[serde(alias = "prompt")]
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    /// 服务端给出的题号（从1开始，仅供参考）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
}

/// 加载器产出的原始试卷
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTest {
    #[serde(default, alias = "id", skip_serializing_if = "Option::is_none")]
    pub test_id: Option<TestId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub questions: Vec<RawQuestion>,
}

/// 试卷记录接口 (`/tests/{id}/`) 的响应
///
/// 题目放在 `parsed_json` 中；解析接口则直接返回 `{ title, questions }`
#[derive(Debug, Clone, Deserialize)]
pub struct TestRecord {
    #[serde(default)]
    pub id: Option<TestId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub parsed_json: Option<ParsedDocument>,
    #[serde(default)]
    pub questions: Vec<RawQuestion>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParsedDocument {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub questions: Vec<RawQuestion>,
}

impl From<TestRecord> for RawTest {
    fn from(record: TestRecord) -> Self {
        let record_title = record.title.filter(|t| !t.trim().is_empty());
        match record.parsed_json {
            Some(parsed) => RawTest {
                test_id: record.id,
                title: record_title.or(parsed.title),
                questions: if parsed.questions.is_empty() {
                    record.questions
                } else {
                    parsed.questions
                },
            },
            None => RawTest {
                test_id: record.id,
                title: record_title,
                questions: record.questions,
            },
        }
    }
}

/// 按位置生成选项字母：0 -> 'a'
pub fn letter_for(position: usize) -> Option<char> {
    if position < 26 {
        Some((b'a' + position as u8) as char)
    } else {
        None
    }
}

/// 将单个字母字符串解析为小写字母
pub fn parse_letter(raw: &str) -> Option<char> {
    let mut chars = raw.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => Some(c.to_ascii_lowercase()),
        _ => None,
    }
}
