/// 判分 API 客户端
///
/// 封装与判分接口相关的调用逻辑：一次提交只发一次请求，不重试
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, GradingError};
use crate::models::grade::{AnswerMap, GradeRequest, GradeResponse, GradeResult};
use crate::models::question::TestId;

/// 判分网关
///
/// 调用方必须保证每道题都已作答
#[async_trait]
pub trait GradingGateway: Send + Sync {
    /// 提交答案并取得判分结果
    ///
    /// 只有完整合法的结果才算成功；被拒绝时返回 `SubmissionRejected`，
    /// 网络不可达或超时返回 `Transport`
    async fn submit(&self, test_id: Option<&TestId>, answers: &AnswerMap) -> AppResult<GradeResult>;
}

/// 基于 HTTP 的判分客户端
pub struct HttpGradingClient {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpGradingClient {
    /// 创建新的判分客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        let endpoint = config.endpoint("grade-test/");
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::grading_transport(&endpoint, e))?;

        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl GradingGateway for HttpGradingClient {
    async fn submit(&self, test_id: Option<&TestId>, answers: &AnswerMap) -> AppResult<GradeResult> {
        let request = GradeRequest { test_id, answers };
        debug!("提交判分 Payload: {:?}", request);

        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!("判分请求失败: {}", e);
                AppError::grading_transport(&self.endpoint, e)
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::grading_transport(&self.endpoint, e))?;

        debug!("判分结果 (状态码 {}): {}", status, body);

        interpret_grade_response(&self.endpoint, status, &body)
    }
}

/// 根据状态码和响应体得到判分结果
///
/// - 2xx：必须是完整的判分结果
/// - 4xx：服务端拒绝，原样保留错误详情
/// - 其他：视为服务不可用
pub fn interpret_grade_response(endpoint: &str, status: u16, body: &str) -> AppResult<GradeResult> {
    match status {
        200..=299 => {
            let response: GradeResponse = serde_json::from_str(body)
                .map_err(|e| AppError::malformed_response(format!("无法解析判分结果: {}", e)))?;
            GradeResult::try_from(response)
        }
        400..=499 => Err(GradingError::SubmissionRejected {
            status,
            detail: parse_detail(body),
        }
        .into()),
        _ => Err(GradingError::ServerUnavailable {
            endpoint: endpoint.to_string(),
            status,
        }
        .into()),
    }
}

/// 错误响应体可能是 JSON，也可能是纯文本
pub(crate) fn parse_detail(body: &str) -> serde_json::Value {
    serde_json::from_str(body).unwrap_or_else(|_| serde_json::Value::String(body.trim().to_string()))
}
