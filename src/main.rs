use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use log::error;
use mentor_session::api_clients::CatalogApi;
use mentor_session::constants::EXPIRY_WARNING_SECS;
use mentor_session::error::SerializableError;
use mentor_session::{AppContext, AppResult, InitOutcome, RuntimeConfig};
use serde::Serialize;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "mentor-session", version, about = "Mentor chat client session tool")]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show who is signed in
    Status,
    /// Sign in and persist the issued token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "MENTOR_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the persisted token
    Logout,
    /// List all fruits
    Fruits,
    /// Show one fruit
    Fruit { id: i64 },
    /// List fruit categories
    Categories,
}

#[derive(Serialize)]
struct StatusReport {
    authenticated: bool,
    user: Option<mentor_session::User>,
    expires_in_secs: Option<i64>,
    expiring_soon: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let json = cli.json;

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            if json {
                let body = SerializableError::from(e);
                println!("{}", serde_json::to_string(&body).unwrap_or_default());
            } else {
                eprintln!("error: {}", e);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> AppResult<()> {
    let config = RuntimeConfig::from_env()?;
    let ctx = AppContext::new(config)?;

    if let InitOutcome::Discarded(reason) = ctx.initialize() {
        eprintln!("Stored session discarded: {}", reason);
    }

    match cli.command {
        Command::Status => {
            let report = StatusReport {
                authenticated: ctx.session.is_authenticated(),
                user: ctx.session.user(),
                expires_in_secs: ctx.session.seconds_until_expiry(),
                expiring_soon: ctx.session.is_authenticated()
                    && ctx.session.is_expiring_within(EXPIRY_WARNING_SECS),
            };
            if cli.json {
                print_json(&report)?;
            } else if let Some(user) = &report.user {
                println!("Signed in as {} (id {})", user.email, user.id);
                if report.expiring_soon {
                    println!("Session expires in {}s", report.expires_in_secs.unwrap_or(0));
                }
            } else {
                println!("Not signed in");
            }
        }
        Command::Login { email, password } => {
            let user = ctx.auth.login(&email, &password).await?;
            if cli.json {
                print_json(&user)?;
            } else {
                println!("Login successful: {} (id {})", user.email, user.id);
            }
        }
        Command::Logout => {
            ctx.auth.logout();
            if !cli.json {
                println!("Signed out");
            }
        }
        Command::Fruits => {
            let fruits = ctx.catalog.get_all_fruits().await?;
            if cli.json {
                print_json(&fruits)?;
            } else {
                for fruit in fruits {
                    println!("{:>4}  {}", fruit.id, fruit.name);
                }
            }
        }
        Command::Fruit { id } => {
            let fruit = ctx.catalog.get_fruit_by_id(id).await?;
            if cli.json {
                print_json(&fruit)?;
            } else {
                println!("{}", fruit.name);
                println!("Family: {}", fruit.family.as_deref().unwrap_or("-"));
                println!("Genus:  {}", fruit.genus.as_deref().unwrap_or("-"));
                match fruit.nutritions.carbohydrates {
                    Some(carbs) => println!("Carbs:  {}", carbs),
                    None => println!("Carbs:  -"),
                }
            }
        }
        Command::Categories => {
            let categories = ctx.catalog.get_all_categories().await?;
            if cli.json {
                print_json(&categories)?;
            } else {
                for category in categories {
                    println!("{:>4}  {}", category.id, category.name);
                }
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
