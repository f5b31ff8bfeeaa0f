use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::RwLock;

use backend_console::api::create_router;
use backend_console::core::Console;
use backend_console::error::Result;
use backend_console::models::ServiceTarget;
use backend_console::settings::Settings;

#[derive(Parser, Debug)]
#[command(name = "backend-console", about = "Backend console core", version)]
struct Cli {
    /// YAML 设置文件，CONSOLE_* 环境变量优先
    #[arg(long, env = "CONSOLE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 启动 HTTP 服务
    Serve,

    /// 列出所有应用
    Apps,

    /// 创建应用
    CreateApp {
        #[arg(long)]
        name: String,
        #[arg(long)]
        region: String,
    },

    /// 解析应用某个服务的基础地址
    Resolve {
        /// 应用 id 或 slug
        #[arg(long)]
        app: String,
        #[arg(long)]
        service: ServiceTarget,
    },

    /// 输出应用 GraphQL 直连地址
    Endpoint {
        #[arg(long)]
        app: String,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;
    let mut console = Console::new(settings)?;

    match cli.command {
        Command::Serve => serve(console),
        Command::Apps => {
            for app in console.list_apps() {
                println!("{}\t{}\t{}\t{}", app.id, app.slug, app.region, app.config_version);
            }
            Ok(())
        }
        Command::CreateApp { name, region } => {
            let app = console.create_app(&name, &region)?;
            println!("{}", app.id);
            Ok(())
        }
        Command::Resolve { app, service } => {
            println!("{}", console.service_url(&app, service)?);
            Ok(())
        }
        Command::Endpoint { app } => {
            let endpoint = console.remote_graphql_endpoint(&app)?;
            println!("{}", endpoint.url);
            Ok(())
        }
    }
}

fn serve(console: Console) -> Result<()> {
    let listen = console.settings().listen.clone();
    let state = Arc::new(RwLock::new(console));

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(&listen).await?;
        tracing::info!("listening on {}", listen);
        axum::serve(listener, create_router(state)).await?;
        Ok(())
    })
}
