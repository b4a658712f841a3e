use std::{fs::File, io, path::PathBuf};

use clap::{Args, Parser, Subcommand};
use engine::{Engine, LedgerWarning, Money, reports};

use crate::error::Result;

mod csv_io;
mod error;
mod render;
mod settings;

#[derive(Parser, Debug)]
#[command(name = "budgetflow")]
#[command(about = "Expense ledger with capped waterfall income allocation")]
struct Cli {
    /// Settings file, extension optional.
    #[arg(long, default_value = "settings")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create tables and a bucket for every configured category.
    Init,
    Expense(Expense),
    /// Split an income across the buckets.
    Income {
        #[arg(long, allow_negative_numbers = true)]
        amount: Money,
        #[arg(long)]
        json: bool,
    },
    /// Balance, cap and fill of every bucket.
    Budget {
        #[arg(long)]
        json: bool,
    },
    /// Total spent, number of expenses and spending per category.
    Summary {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
struct Expense {
    #[command(subcommand)]
    command: ExpenseCommand,
}

#[derive(Subcommand, Debug)]
enum ExpenseCommand {
    Add {
        #[arg(long)]
        category: String,
        #[arg(long, allow_negative_numbers = true)]
        amount: Money,
        #[arg(long, default_value = "")]
        description: String,
    },
    List {
        #[arg(long)]
        json: bool,
    },
    /// Expense amounts side by side, one column per category.
    Matrix {
        #[arg(long)]
        json: bool,
    },
    /// Write every expense as CSV to a file or stdout.
    Export {
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Replace the whole expense list with the rows of a CSV file.
    ///
    /// Bucket balances are left as they are.
    Import {
        #[arg(long)]
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let settings = settings::Settings::new(&cli.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "budgetflow={level},engine={level}",
            level = settings.app.level
        ))
        .with_writer(io::stderr)
        .init();

    if let Err(err) = run(cli.command, &settings).await {
        tracing::error!("{err}");
        return Err(err.into());
    }
    Ok(())
}

async fn run(command: Command, settings: &settings::Settings) -> Result<()> {
    let policy = settings.policy()?;
    if policy.is_empty() {
        tracing::warn!("no categories configured, income cannot be allocated");
    }

    let db = sea_orm::Database::connect(settings.database.url()).await?;
    let engine = Engine::builder()
        .database(db)
        .policy(policy)
        .unknown_category(settings.unknown_category)
        .build()
        .await?;

    match command {
        Command::Init => {
            let balances = engine.get_balances().await?;
            println!("ledger ready with {} bucket(s)", balances.len());
        }
        Command::Expense(Expense { command }) => expense(&engine, command).await?,
        Command::Income { amount, json } => {
            let allocation = engine.allocate_income(amount).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&allocation)?);
            } else {
                for (category, credited) in &allocation.credited {
                    println!("{category:<20} {credited:>12}");
                }
                println!("{:<20} {:>12}", "total", allocation.total_credited());
                if allocation.undistributed.is_positive() {
                    println!("{:<20} {:>12}", "undistributed", allocation.undistributed);
                }
                print_warnings(&allocation.warnings);
            }
        }
        Command::Budget { json } => {
            let balances = engine.get_balances().await?;
            let statuses = reports::bucket_statuses(&balances, engine.policy());
            if json {
                println!("{}", serde_json::to_string_pretty(&statuses)?);
            } else {
                for status in statuses {
                    let cap = status
                        .cap
                        .map_or_else(|| "-".to_string(), |cap| cap.to_string());
                    let fill = status
                        .fill_ratio
                        .map_or_else(String::new, |ratio| format!("{:.0}%", ratio * 100.0));
                    println!(
                        "{:<20} {:>12} / {:>12} {fill:>5}",
                        status.category, status.balance, cap
                    );
                }
            }
        }
        Command::Summary { json } => {
            let expenses = engine.try_load_expenses().await?;
            let summary = reports::summarize(&expenses);
            let by_category = reports::spent_by_category(&expenses);
            if json {
                let value = serde_json::json!({
                    "total": summary.total,
                    "count": summary.count,
                    "by_category": by_category,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("{} expense(s), {} spent", summary.count, summary.total);
                for (category, spent) in by_category {
                    println!("{category:<20} {spent:>12}");
                }
            }
        }
    }

    Ok(())
}

async fn expense(engine: &Engine, command: ExpenseCommand) -> Result<()> {
    match command {
        ExpenseCommand::Add {
            category,
            amount,
            description,
        } => {
            let receipt = engine
                .record_expense(category.trim(), description.trim(), amount)
                .await?;
            println!("recorded expense {} ({} total)", receipt.id, receipt.expenses.len());
            print_warnings(&receipt.warnings);
        }
        ExpenseCommand::List { json } => {
            let expenses = engine.load_expenses().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&expenses)?);
            } else {
                for expense in expenses {
                    let when = expense
                        .occurred_at
                        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_default();
                    println!(
                        "{:>5} {when:<16} {:<20} {:>12} {}",
                        expense.id.unwrap_or_default(),
                        expense.category,
                        expense.amount,
                        expense.description
                    );
                }
            }
        }
        ExpenseCommand::Matrix { json } => {
            let expenses = engine.try_load_expenses().await?;
            let mut categories = engine.policy().categories();
            categories.extend(expenses.iter().map(|expense| expense.category.as_str()));
            let categories: Vec<&str> = categories.into_iter().collect();
            let rows = reports::category_matrix(&expenses, &categories);
            if json {
                let value = serde_json::json!({
                    "categories": categories,
                    "rows": rows,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                for line in render::matrix(&categories, &rows) {
                    println!("{line}");
                }
            }
        }
        ExpenseCommand::Export { output } => {
            let expenses = engine.try_load_expenses().await?;
            match output {
                Some(path) => {
                    csv_io::write_expenses(File::create(&path)?, &expenses)?;
                    tracing::info!("exported {} expense(s) to {}", expenses.len(), path.display());
                }
                None => csv_io::write_expenses(io::stdout().lock(), &expenses)?,
            }
        }
        ExpenseCommand::Import { input } => {
            let records = csv_io::read_expenses(File::open(&input)?)?;
            let saved = engine.replace_all(&records).await?;
            println!("saved {saved} expense(s)");
        }
    }
    Ok(())
}

fn print_warnings(warnings: &[LedgerWarning]) {
    for warning in warnings {
        match warning {
            LedgerWarning::UnknownCategory(category) => {
                eprintln!("warning: no budget bucket for '{category}', balances unchanged");
            }
        }
    }
}
