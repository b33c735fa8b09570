use clap::{Parser, Subcommand};
use panel_relay::config::{ConfigError, EndpointArgs, Endpoints, ServeArgs};
use panel_relay::{console, routes, state};

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "panel-relay", about = "Relay a chat feed and a race game feed to a side panel")]
struct Cli {
    #[command(flatten)]
    endpoints: EndpointArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve panels over WebSocket at `/panel`.
    Serve(ServeArgs),
    /// Run a panel in this terminal.
    Console,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let endpoints = Endpoints::try_from(cli.endpoints)?;

    match cli.command {
        Command::Serve(args) => serve(endpoints, args).await,
        Command::Console => Ok(console::run_console(endpoints).await?),
    }
}

async fn serve(endpoints: Endpoints, args: ServeArgs) -> Result<(), AppError> {
    let app = routes::app(state::AppState::new(endpoints));
    let listener = tokio::net::TcpListener::bind(args.listen).await?;

    tracing::info!(listen = %args.listen, "panel-relay listening");
    axum::serve(listener, app).await?;
    Ok(())
}
