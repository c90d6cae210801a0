use clap::Parser;
use tracing_subscriber::EnvFilter;

use code_interpreter_relay::model::arg::Args;
use code_interpreter_relay::model::config::Config;
use code_interpreter_relay::relay::{create_router, AppState};
use code_interpreter_relay::upstream::ResponsesProvider;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // 加载配置，环境变量优先
    let config_path = args
        .config
        .unwrap_or_else(|| Config::default_config_path().to_string());
    let mut config = Config::load(&config_path)?;
    config.override_from_env();

    if config.api_key.as_deref().map_or(true, str::is_empty) {
        tracing::error!("未配置上游 API 密钥，请设置 UPSTREAM_API_KEY 或 YANDEX_API_KEY");
        std::process::exit(1);
    }

    tracing::info!(
        "上游: {} 模型: {} 温度: {}",
        config.base_url,
        config.model_uri(),
        config.temperature
    );
    if let Some(proxy) = &config.proxy_url {
        tracing::info!("已启用 HTTP 代理: {}", proxy);
    }

    let addr = format!("{}:{}", config.host, config.port);
    let provider = ResponsesProvider::new(config)?;
    let app = create_router(AppState::new(provider));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("服务已启动: http://{}", addr);
    tracing::info!("  GET  /api/analyze?query=...&file_ids=...");
    tracing::info!("  POST /api/upload");
    tracing::info!("  GET  /api/sample-data");

    axum::serve(listener, app).await?;
    Ok(())
}
