//! Listing-status collector CLI.

use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use listwatch_collector::input::{default_as_of, resolve_symbols};
use listwatch_collector::modules::{self, CommandReport, Output};
use listwatch_core::{init_logging, AppConfig, JoinMode, LogConfig, SourceName};
use listwatch_data::{CsvTableCodec, FileSink, Pipeline};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "listwatch")]
#[command(about = "NYSE/Nasdaq listing-status collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 설정 파일 (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Args)]
struct SymbolArgs {
    /// 조회할 심볼 (쉼표로 구분, 예: "AAPL,MSFT")
    #[arg(long)]
    symbols: Option<String>,

    /// 심볼 CSV 파일 ("Stock Symbol" 컬럼)
    #[arg(long)]
    input: Option<PathBuf>,
}

#[derive(Args)]
struct OutputArgs {
    /// 기준일 (YYYY-MM-DD, 기본: 어제)
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// 출력 디렉토리
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

#[derive(Args)]
struct SourceArgs {
    /// 실행할 소스 (쉼표로 구분, 예: "nyse_delisting,nasdaq_threshold")
    #[arg(long, value_delimiter = ',')]
    sources: Vec<SourceName>,
}

#[derive(Subcommand)]
enum Commands {
    /// 전체 실행 (소스 수집 + 가격 요약 + 조인 리포트)
    Run {
        #[command(flatten)]
        symbols: SymbolArgs,

        #[command(flatten)]
        output: OutputArgs,

        #[command(flatten)]
        sources: SourceArgs,

        /// 조인 방식 (full, left)
        #[arg(long)]
        join: Option<JoinMode>,
    },

    /// 소스 수집만 실행 (이벤트 표)
    Scrape {
        #[command(flatten)]
        output: OutputArgs,

        #[command(flatten)]
        sources: SourceArgs,
    },

    /// 가격 요약만 실행 (소스 수집 없음)
    Prices {
        #[command(flatten)]
        symbols: SymbolArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// 소스 목록 출력
    Sources {
        #[command(flatten)]
        sources: SourceArgs,
    },
}

/// 명령행 옵션을 설정에 반영합니다.
fn apply_overrides(config: &mut AppConfig, command: &Commands) {
    let (output, sources, join) = match command {
        Commands::Run {
            output,
            sources,
            join,
            ..
        } => (Some(output), Some(sources), *join),
        Commands::Scrape { output, sources } => (Some(output), Some(sources), None),
        Commands::Prices { output, .. } => (Some(output), None, None),
        Commands::Sources { sources } => (None, Some(sources), None),
    };

    if let Some(dir) = output.and_then(|o| o.output_dir.clone()) {
        config.report.output_dir = dir;
    }
    if let Some(sources) = sources.filter(|s| !s.sources.is_empty()) {
        config.scrape.sources = sources.sources.clone();
    }
    if let Some(join) = join {
        config.report.join = join;
    }
}

fn resolve_as_of(arg: Option<NaiveDate>) -> NaiveDate {
    arg.unwrap_or_else(|| default_as_of(Utc::now().date_naive()))
}

fn print_report(operation: &str, report: &CommandReport) {
    report.stats.log_summary(operation);

    println!("{} 저장: {}", operation, report.location);
    if !report.source_failures.is_empty() {
        println!("소스 실패 {}건:", report.source_failures.len());
        for failure in &report.source_failures {
            println!("  - {}", failure);
        }
    }
    if !report.price_warnings.is_empty() {
        println!("가격 경고 {}건:", report.price_warnings.len());
        for warning in &report.price_warnings {
            println!("  - {}", warning);
        }
    }
}

async fn execute(
    command: Commands,
    config: &AppConfig,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let codec = CsvTableCodec;
    let sink = FileSink::new(config.report.output_dir.clone());
    let output = Output::new(&codec, &sink);

    match command {
        Commands::Sources { .. } => {
            for listing in modules::list_sources(&config.scrape.sources) {
                println!("{}", listing);
            }
        }
        Commands::Run {
            symbols,
            output: dates,
            ..
        } => {
            let symbols = resolve_symbols(symbols.symbols.as_deref(), symbols.input.as_deref())?;
            let pipeline = Pipeline::from_config(config).context("파이프라인 구성 실패")?;
            let report = modules::run_report(
                &pipeline,
                &output,
                &symbols,
                resolve_as_of(dates.as_of),
                cancel,
            )
            .await?;
            print_report("리포트", &report);
        }
        Commands::Scrape { output: dates, .. } => {
            let pipeline = Pipeline::sources_from_config(config);
            let report =
                modules::scrape_events(&pipeline, &output, resolve_as_of(dates.as_of), cancel)
                    .await?;
            print_report("이벤트", &report);
        }
        Commands::Prices {
            symbols,
            output: dates,
        } => {
            let symbols = resolve_symbols(symbols.symbols.as_deref(), symbols.input.as_deref())?;
            let pipeline = Pipeline::from_config(config).context("파이프라인 구성 실패")?;
            let report = modules::collect_prices(
                &pipeline,
                &output,
                &symbols,
                resolve_as_of(dates.as_of),
                cancel,
            )
            .await?;
            print_report("가격 요약", &report);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();

    // 설정 로드
    let mut config = AppConfig::load(cli.config.as_deref()).context("설정 로드 실패")?;
    apply_overrides(&mut config, &cli.command);

    // 로깅 초기화
    let mut log_config = LogConfig::from_settings(&config.logging);
    if let Some(level) = &cli.log_level {
        log_config.level = level.clone();
    }
    init_logging(log_config).context("로깅 초기화 실패")?;

    tracing::info!(
        sources = config.scrape.sources.len(),
        join = %config.report.join,
        output_dir = %config.report.output_dir.display(),
        "Listwatch 시작"
    );

    let cancel = CancellationToken::new();
    let signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("종료 신호 수신, 진행 중인 작업 취소");
            signal.cancel();
        }
    });

    execute(cli.command, &config, &cancel).await?;

    tracing::info!("Listwatch 종료");
    Ok(())
}
