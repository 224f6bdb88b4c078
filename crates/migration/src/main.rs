use sea_orm::Database;
use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut args = std::env::args().skip(1);
    let cmd = args.next().unwrap_or_else(|| "up".to_string());

    let db_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite:./monedero.db?mode=rwc".to_string());

    let db = Database::connect(&db_url).await?;

    match cmd.as_str() {
        "up" => migration::Migrator::up(&db, None).await?,
        "down" => {
            // `down` alone reverts everything; `down <n>` reverts n steps.
            let steps = match args.next() {
                Some(raw) => Some(
                    raw.parse::<u32>()
                        .map_err(|_| format!("invalid step count: {raw}"))?,
                ),
                None => None,
            };
            migration::Migrator::down(&db, steps).await?;
        }
        "fresh" => migration::Migrator::fresh(&db).await?,
        "status" => {
            migration::Migrator::status(&db).await?;
        }
        _ => {
            eprintln!("Usage: cargo run -p migration -- [up|down [n]|fresh|status]");
            std::process::exit(2);
        }
    }

    Ok(())
}
