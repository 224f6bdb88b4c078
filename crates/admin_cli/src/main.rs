use std::{error::Error, io::Write, str::FromStr};

use clap::{Args, Parser, Subcommand};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    terminal,
};
use engine::{CreateAccountCmd, Engine, Money};
use migration::MigratorTrait;
use sea_orm::Database;

#[derive(Parser, Debug)]
#[command(name = "monedero_admin")]
#[command(about = "Admin utilities for Monedero (bootstrap accounts)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./monedero.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Account(Account),
}

#[derive(Args, Debug)]
struct Account {
    #[command(subcommand)]
    command: AccountCommand,
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    /// Create an account; prompts for its password.
    Create(AccountCreateArgs),
    /// Print the account's current balance.
    Balance(AccountBalanceArgs),
    /// List every account.
    List,
}

#[derive(Args, Debug)]
struct AccountCreateArgs {
    #[arg(long)]
    username: String,
    /// Defaults to the username.
    #[arg(long)]
    display_name: Option<String>,
    /// Opening balance as a decimal amount, e.g. `100.00`.
    #[arg(long)]
    seed: Option<String>,
}

#[derive(Args, Debug)]
struct AccountBalanceArgs {
    #[arg(long)]
    username: String,
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self, Box<dyn Error + Send + Sync>> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Reads a line from the terminal without echoing it.
fn read_hidden(prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    eprint!("{prompt}");
    std::io::stderr().flush()?;

    let raw = RawModeGuard::enter()?;
    let mut line = String::new();
    let interrupted = loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => break false,
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => break true,
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => line.push(ch),
            KeyCode::Backspace => {
                line.pop();
            }
            _ => {}
        }
    };
    drop(raw);
    eprintln!();

    if interrupted {
        return Err("interrupted".into());
    }

    Ok(line)
}

fn prompt_password() -> Result<String, Box<dyn Error + Send + Sync>> {
    for _ in 0..3 {
        let first = read_hidden("Password: ")?;
        if first.is_empty() {
            eprintln!("Password must not be empty.");
            continue;
        }

        if first == read_hidden("Confirm password: ")? {
            return Ok(first);
        }
        eprintln!("Passwords do not match. Try again.");
    }

    Err("too many attempts".into())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = Database::connect(&cli.database_url).await?;
    migration::Migrator::up(&db, None).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::Account(Account {
            command: AccountCommand::Create(args),
        }) => {
            let seed = match args.seed.as_deref().map(Money::from_str).transpose() {
                Ok(seed) => seed,
                Err(err) => {
                    eprintln!("{err}");
                    std::process::exit(2);
                }
            };

            let password = prompt_password()?;
            let display_name = args
                .display_name
                .unwrap_or_else(|| args.username.clone());

            let mut cmd = CreateAccountCmd::new(args.username, password, display_name);
            if let Some(seed) = seed {
                cmd = cmd.seed_income(seed);
            }

            match engine.create_account(cmd).await {
                Ok(account) => {
                    println!("created account: {} (id {})", account.username, account.id);
                }
                Err(err) => {
                    eprintln!("{err}");
                    std::process::exit(1);
                }
            }
        }
        Command::Account(Account {
            command: AccountCommand::Balance(args),
        }) => {
            let account = match engine.account_by_username(&args.username).await {
                Ok(account) => account,
                Err(err) => {
                    eprintln!("{err}");
                    std::process::exit(1);
                }
            };

            let balance = engine.balance_of(account.id).await?;
            println!("{}: {balance}", account.username);
        }
        Command::Account(Account {
            command: AccountCommand::List,
        }) => {
            for account in engine.list_accounts().await? {
                println!(
                    "{}\t{}\t{}",
                    account.id, account.username, account.display_name
                );
            }
        }
    }

    Ok(())
}
