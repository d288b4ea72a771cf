use crate::error::{AppError, AppResult, LoaderError};
use crate::models::question::RawTest;
use std::path::Path;
use tokio::fs;

/// 从 TOML 文件加载原始试卷
pub async fn load_toml_to_raw_test(toml_file_path: &Path) -> AppResult<RawTest> {
    let content = fs::read_to_string(toml_file_path).await.map_err(|e| {
        AppError::Loader(LoaderError::ReadFailed {
            path: toml_file_path.display().to_string(),
            source: e,
        })
    })?;

    let test = parse_raw_test(&content, &toml_file_path.display().to_string())?;

    tracing::debug!(
        "从 {} 读取到 {} 道题",
        toml_file_path.display(),
        test.questions.len()
    );

    Ok(test)
}

/// 解析 TOML 文本
pub fn parse_raw_test(content: &str, origin: &str) -> AppResult<RawTest> {
    toml::from_str::<RawTest>(content).map_err(|e| AppError::decode_failed(origin, e.to_string()))
}
