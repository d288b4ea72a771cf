/// 试卷加载客户端
///
/// 从后端拉取或上传试卷，产出统一的 `RawTest`
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::clients::grading_client::parse_detail;
use crate::config::Config;
use crate::error::{AppError, AppResult, LoaderError};
use crate::models::loaders::load_toml_to_raw_test;
use crate::models::question::{RawTest, TestId, TestRecord};

/// 加载请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadRequest {
    /// 按ID拉取已保存的试卷
    ById(TestId),
    /// 上传文档并保存为新试卷
    Upload {
        path: PathBuf,
        title: Option<String>,
    },
    /// 只解析文档，不保存（没有试卷ID）
    Parse(PathBuf),
}

/// 试卷加载器
#[async_trait]
pub trait TestLoader: Send + Sync {
    async fn fetch_test_by_id(&self, id: &TestId) -> AppResult<RawTest>;

    async fn upload_document(&self, path: &Path, title: Option<&str>) -> AppResult<RawTest>;

    async fn parse_document(&self, path: &Path) -> AppResult<RawTest> {
        self.upload_document(path, None).await
    }
}

/// 基于 HTTP 的试卷加载器
pub struct HttpTestLoader {
    http: reqwest::Client,
    config: Config,
}

impl HttpTestLoader {
    /// 创建新的试卷加载器
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::loader_transport(&config.api_base_url, e))?;

        Ok(Self {
            http,
            config: config.clone(),
        })
    }

    /// 构建带文件的表单
    async fn file_part(&self, path: &Path) -> AppResult<Part> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            AppError::Loader(LoaderError::ReadFailed {
                path: path.display().to_string(),
                source: e,
            })
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "document.docx".to_string());

        Ok(Part::bytes(bytes).file_name(file_name))
    }

    /// 发送请求并解析试卷
    async fn send(&self, endpoint: &str, request: reqwest::RequestBuilder) -> AppResult<RawTest> {
        let response = request
            .send()
            .await
            .map_err(|e| AppError::loader_transport(endpoint, e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::loader_transport(endpoint, e))?;

        debug!("试卷接口响应 ({}, 状态码 {}): {} 字节", endpoint, status, body.len());

        decode_test_response(endpoint, status, &body)
    }
}

#[async_trait]
impl TestLoader for HttpTestLoader {
    async fn fetch_test_by_id(&self, id: &TestId) -> AppResult<RawTest> {
        let endpoint = self.config.endpoint(&format!("tests/{}/", id));
        info!("📥 正在拉取试卷 {}", id);
        self.send(&endpoint, self.http.get(&endpoint)).await
    }

    async fn upload_document(&self, path: &Path, title: Option<&str>) -> AppResult<RawTest> {
        let endpoint = self.config.endpoint("tests/");
        info!("📤 正在上传文档: {}", path.display());

        let mut form = Form::new().part("doc_file", self.file_part(path).await?);
        if let Some(title) = title {
            form = form.text("title", title.to_string());
        }

        self.send(&endpoint, self.http.post(&endpoint).multipart(form)).await
    }

    async fn parse_document(&self, path: &Path) -> AppResult<RawTest> {
        let endpoint = self.config.endpoint("parse-doc/");
        info!("📄 正在解析文档: {}", path.display());

        let form = Form::new().part("file", self.file_part(path).await?);
        self.send(&endpoint, self.http.post(&endpoint).multipart(form)).await
    }
}

/// 解析试卷接口响应
///
/// 同时支持试卷记录 (`parsed_json` 嵌套) 和解析结果 (`{ title, questions }`)
pub fn decode_test_response(endpoint: &str, status: u16, body: &str) -> AppResult<RawTest> {
    if !(200..=299).contains(&status) {
        return Err(AppError::Loader(LoaderError::Rejected {
            endpoint: endpoint.to_string(),
            status,
            detail: parse_detail(body),
        }));
    }

    let record: TestRecord =
        serde_json::from_str(body).map_err(|e| AppError::decode_failed(endpoint, e.to_string()))?;
    Ok(RawTest::from(record))
}

/// 基于本地 TOML 文件的试卷加载器
///
/// `fetch_test_by_id` 读取 `{目录}/{id}.toml`；上传即直接读取给定文件
pub struct FileTestLoader {
    folder: PathBuf,
}

impl FileTestLoader {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }
}

#[async_trait]
impl TestLoader for FileTestLoader {
    async fn fetch_test_by_id(&self, id: &TestId) -> AppResult<RawTest> {
        let path = self.folder.join(format!("{}.toml", id));
        let mut test = load_toml_to_raw_test(&path).await?;
        test.test_id.get_or_insert_with(|| id.clone());
        Ok(test)
    }

    async fn upload_document(&self, path: &Path, title: Option<&str>) -> AppResult<RawTest> {
        let mut test = load_toml_to_raw_test(path).await?;
        if let Some(title) = title {
            test.title = Some(title.to_string());
        }
        Ok(test)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SAMPLE: &str = r#"
title = "Capitals"

[[questions]]
question = "Capital of France?"
options = ["a) Paris", "b) Rome"]
"#;

    #[test]
    fn test_decode_parse_doc_response() {
        let body = json!({
            "title": "Capitals",
            "questions": [{"question": "Capital of France?", "options": ["a) Paris", "b) Rome"], "explanation": "", "number": 1}]
        })
        .to_string();
        let test = decode_test_response("parse-doc/", 200, &body).unwrap();
        assert!(test.test_id.is_none());
        assert_eq!(test.title.as_deref(), Some("Capitals"));
        assert_eq!(test.questions.len(), 1);
    }

    #[test]
    fn test_decode_error_response() {
        let err = decode_test_response("parse-doc/", 400, r#"{"error": "No file provided"}"#).unwrap_err();
        assert!(matches!(
            err,
            AppError::Loader(LoaderError::Rejected { status: 400, .. })
        ));
        assert!(err.to_string().contains("No file provided"));
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(
            decode_test_response("tests/1/", 200, "not json"),
            Err(AppError::Loader(LoaderError::DecodeFailed { .. }))
        ));
    }

    #[tokio::test]
    async fn test_file_loader_by_id() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("7.toml"), SAMPLE).unwrap();

        let loader = FileTestLoader::new(dir.path());
        let test = loader.fetch_test_by_id(&TestId::new("7")).await.unwrap();
        assert_eq!(test.test_id, Some(TestId::new("7")));
        assert_eq!(test.questions.len(), 1);
    }

    #[tokio::test]
    async fn test_file_loader_upload_overrides_title() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capitals.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let loader = FileTestLoader::new(dir.path());
        let test = loader.upload_document(&path, Some("Renamed")).await.unwrap();
        assert_eq!(test.title.as_deref(), Some("Renamed"));

        let parsed = loader.parse_document(&path).await.unwrap();
        assert_eq!(parsed.title.as_deref(), Some("Capitals"));
    }

    /// 需要本地后端：cargo test -- --ignored
    #[tokio::test]
    #[ignore]
    async fn test_fetch_against_local_backend() {
        let _ = tracing_subscriber::fmt::try_init();

        let loader = HttpTestLoader::new(&Config::from_env()).unwrap();
        let result = loader.fetch_test_by_id(&TestId::new("1")).await;
        println!("试卷: {:?}", result);
    }
}
