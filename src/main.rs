use clap::{Parser, Subcommand};

mod app;
mod auth;
mod config;
mod error;
mod images;
mod labels;
mod recipes;
mod state;
mod storage;


#[derive(Debug, Parser)]
#[command(name = "recipe-api", version, about = "Recipe management API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run migrations and start the HTTP server (default).
    Serve,
    /// Create a staff + superuser account.
    CreateSuperuser {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
}

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "recipe_api=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let app_state = state::AppState::init().await?;
            sqlx::migrate!("./migrations").run(&app_state.db).await?;
            app::serve(app::build_app(app_state)).await
        }
        Command::CreateSuperuser { email, password } => {
            let email = auth::services::validate_email(&email)?;
            auth::services::validate_password(&password)?;
            let database_url = std::env::var("DATABASE_URL")?;
            let db = state::connect_pool(&database_url, 2).await?;
            sqlx::migrate!("./migrations").run(&db).await?;
            let user = auth::services::create_superuser(&db, &email, &password).await?;
            tracing::info!(user_id = %user.id, email = %user.email, "superuser ready");
            Ok(())
        }
    }
}
