/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::models::session::SessionState;

/// 初始化日志
///
/// `RUST_LOG` 优先；否则详细模式为 debug，普通模式为 info。可重复调用。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// 记录程序启动信息
pub fn log_startup(api_base_url: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 试卷作答模式");
    info!("🌐 后端地址: {}", api_base_url);
    info!("{}", "=".repeat(60));
}

/// 打印每道题的判分结果
pub fn log_outcomes(state: &SessionState) {
    let Some(result) = &state.result else {
        return;
    };

    info!("\n{}", "=".repeat(60));
    info!("📊 {} 判分结果", state.display_title());
    info!("{}", "=".repeat(60));
    for question in &state.questions {
        match state.outcome(question.index) {
            Some(o) if o.is_correct => {
                info!("✅ {}. {}", question.index + 1, truncate_text(&question.prompt, 60))
            }
            Some(o) => info!(
                "❌ {}. {} (正确答案: {})",
                question.index + 1,
                truncate_text(&question.prompt, 60),
                o.correct_answer
            ),
            None => {}
        }
    }
    info!("{}", "=".repeat(60));
    info!(
        "得分: {}/{} - {}%",
        result.score, result.total, result.percent
    );
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("Capital of France?", 7), "Capital...");
        assert_eq!(truncate_text("短文本", 10), "短文本");
        assert_eq!(truncate_text("中国的首都是哪里", 4), "中国的首...");
    }

    #[test]
    fn test_init_is_idempotent() {
        init(false);
        init(true);
    }
}
