use crate::error::ConfigError;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 后端 API 根地址
    pub api_base_url: String,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 成绩报告文件
    pub report_file: String,
    // --- 运行输入 ---
    /// 要加载的试卷ID
    pub test_id: Option<String>,
    /// 本地 TOML 试卷（未提供试卷ID时使用）
    pub test_file: Option<String>,
    /// 按题号顺序的答案，如 "a,b,c"
    pub answers: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api".to_string(),
            request_timeout_secs: 30,
            verbose_logging: false,
            report_file: "quiz_report.txt".to_string(),
            test_id: None,
            test_file: None,
            answers: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            api_base_url: std::env::var("QUIZ_API_BASE_URL").unwrap_or(default.api_base_url),
            request_timeout_secs: std::env::var("QUIZ_REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.request_timeout_secs),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            report_file: std::env::var("QUIZ_REPORT_FILE").unwrap_or(default.report_file),
            test_id: std::env::var("QUIZ_TEST_ID").ok().filter(|v| !v.trim().is_empty()),
            test_file: std::env::var("QUIZ_TEST_FILE").ok().filter(|v| !v.trim().is_empty()),
            answers: std::env::var("QUIZ_ANSWERS").ok(),
        }
    }

    /// 检查配置是否可用
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                name: "QUIZ_API_BASE_URL",
                value: self.api_base_url.clone(),
                reason: "必须以 http:// 或 https:// 开头",
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                name: "QUIZ_REQUEST_TIMEOUT_SECS",
                value: self.request_timeout_secs.to_string(),
                reason: "必须大于 0",
            });
        }
        Ok(())
    }

    /// 拼接接口地址，`path` 不以 `/` 开头
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url.trim_end_matches('/'), path)
    }
}
