mod settings;

use clap::{Parser, Subcommand};
use colored::Colorize;
use settings::PluginArgs;
use tracing_subscriber::EnvFilter;
use vela_kaniko_build::{BuildError, Verbosity};

#[derive(Parser)]
#[command(name = "vela-kaniko")]
#[command(about = "Vela kaniko plugin for building and publishing images", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    args: PluginArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// バージョン情報を表示
    Version,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if matches!(cli.command, Some(Commands::Version)) {
        println!("vela-kaniko {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    if let Err(e) = run(cli.args).await {
        eprintln!("{} {}", "Error:".red().bold(), message(&e));
        std::process::exit(1);
    }
}

async fn run(args: PluginArgs) -> anyhow::Result<()> {
    let verbosity = args.verbosity()?;
    init_tracing(verbosity);

    tracing::info!(
        code = "https://github.com/go-vela/vela-kaniko",
        docs = "https://go-vela.github.io/docs/plugins/registry/pipeline/kaniko",
        registry = "https://hub.docker.com/r/target/vela-kaniko",
        "Vela Kaniko Plugin"
    );

    let created = chrono::Utc::now().to_rfc3339();
    let plugin = args.into_plugin(verbosity, created)?;

    plugin.run().await?;
    Ok(())
}

/// ログ出力を初期化（RUST_LOG が設定されていればそちらを優先）
fn init_tracing(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.level_filter().to_string()));

    // stdout は executor の出力に使う
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<BuildError>() {
        Some(build_err) => build_err.user_message(),
        None => format!("{:#}", err),
    }
}
