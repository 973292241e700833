use anyhow::{bail, Result};
use portfolio_rs::services::SeedingService;
use portfolio_rs::{AppConfig, Database};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Usage: create-admin <email> <password> [name]
// Creates the admin, or resets the password when the email already exists.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portfolio_rs=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (email, password, name) = match args.as_slice() {
        [email, password] => (email.clone(), password.clone(), "Admin".to_string()),
        [email, password, name @ ..] if !name.is_empty() => (email.clone(), password.clone(), name.join(" ")),
        _ => bail!("Usage: create-admin <email> <password> [name]"),
    };
    if password.len() < 8 {
        bail!("Password must be at least 8 characters");
    }

    let config = AppConfig::new()?;
    let database = Database::new(&config.database.url, config.database.max_connections).await?;

    let seeding = SeedingService::new(database.clone());
    let admin = seeding.upsert_admin(&email, &password, &name).await?;
    println!("Admin ready: {} <{}>", admin.name, admin.email);

    database.close().await;
    Ok(())
}
