use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::clients::{FileTestLoader, GradingGateway, HttpGradingClient, HttpTestLoader, LoadRequest};
use crate::config::Config;
use crate::models::question::TestId;
use crate::services::ReportWriter;
use crate::utils::logging::{log_outcomes, log_startup};
use crate::workflow::SessionController;

/// 应用主结构
///
/// 无界面的作答流程：加载试卷 → 按配置作答 → 提交一次 → 输出结果
pub struct App<G: GradingGateway = HttpGradingClient> {
    config: Config,
    controller: SessionController<G>,
    report_writer: ReportWriter,
}

impl App<HttpGradingClient> {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        config.validate()?;
        log_startup(&config.api_base_url);

        let gateway = HttpGradingClient::new(&config)?;
        Ok(Self::with_gateway(config, gateway))
    }
}

impl<G: GradingGateway> App<G> {
    pub fn with_gateway(config: Config, gateway: G) -> Self {
        let report_writer = ReportWriter::with_path(config.report_file.clone());
        Self {
            config,
            controller: SessionController::new(gateway),
            report_writer,
        }
    }

    pub fn controller(&self) -> &SessionController<G> {
        &self.controller
    }

    /// 运行应用主逻辑
    pub async fn run(&mut self) -> Result<()> {
        self.load_test().await?;

        let answers = parse_answer_list(self.config.answers.as_deref().unwrap_or_default());
        if answers.is_empty() {
            warn!("⚠️ 没有提供答案 (QUIZ_ANSWERS)，只加载试卷");
            return Ok(());
        }

        for (index, letter) in answers {
            if let Err(e) = self.controller.set_answer(index, letter) {
                warn!("⚠️ 第 {} 题答案无效: {}", index + 1, e);
            }
        }

        let result = self.controller.submit_answers().await?;
        log_outcomes(self.controller.state());

        self.report_writer
            .write(self.controller.state())
            .await
            .with_context(|| format!("无法写入报告: {}", self.report_writer.path()))?;

        info!(
            "\n报告已保存至: {} (得分 {}/{})",
            self.report_writer.path(),
            result.score,
            result.total
        );
        Ok(())
    }

    /// 有试卷ID时从后端拉取，否则读取本地 TOML
    async fn load_test(&mut self) -> Result<()> {
        if let Some(id) = self.config.test_id.clone() {
            let loader = HttpTestLoader::new(&self.config)?;
            self.controller
                .load_from(&loader, LoadRequest::ById(TestId::new(id)))
                .await?;
        } else if let Some(file) = self.config.test_file.clone() {
            let path = PathBuf::from(file);
            let folder = path.parent().map(PathBuf::from).unwrap_or_default();
            let loader = FileTestLoader::new(folder);
            self.controller
                .load_from(&loader, LoadRequest::Upload { path, title: None })
                .await?;
        } else {
            anyhow::bail!("需要设置 QUIZ_TEST_ID 或 QUIZ_TEST_FILE");
        }
        Ok(())
    }
}

/// 解析按题号顺序的答案列表，如 "a, b,,c"；空位表示跳过该题
pub fn parse_answer_list(raw: &str) -> Vec<(usize, char)> {
    raw.split(',')
        .enumerate()
        .filter_map(|(index, item)| {
            crate::models::question::parse_letter(item).map(|letter| (index, letter))
        })
        .collect()
}
