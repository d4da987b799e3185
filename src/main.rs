use clap::Parser;
use vacancy_etl::utils::error::{ErrorSeverity, EtlError};
use vacancy_etl::utils::{logger, validation::Validate};
use vacancy_etl::{app, CliConfig, JobSearchApp};

fn exit_with(e: &EtlError) -> ! {
    tracing::error!(
        "❌ vacancy-etl failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting vacancy-etl");
    tracing::debug!("CLI config: {:?}", cli);

    let config = match cli.load() {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        exit_with(&e);
    }

    let client = match app::http_client() {
        Ok(client) => client,
        Err(e) => exit_with(&e),
    };

    let session = app::build_session(&config, client);
    let stores = app::build_stores(&config);

    let stdin = std::io::stdin();
    let mut job_search = JobSearchApp::new(session, stores, stdin.lock(), std::io::stdout());

    if let Err(e) = job_search.run().await {
        exit_with(&e);
    }

    tracing::info!("👋 Bye");
    Ok(())
}
