mod config;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use config::Config;
use kover_core::auth::AuthClient;
use kover_core::history::QuoteHistory;
use kover_core::prices::{BlobStore, PriceEntry, PriceService, RemotePriceStore, SaveOutcome};
use kover_core::pricing::{CoverageType, QuoteRequest, Region};
use kover_remote::{RemoteAuthClient, RemoteClient, RemotePriceClient};
use kover_storage_file::FileBlobStore;

const USAGE: &str = "usage: kover <command>

commands:
  list                                     print the current price table
  quote <type> <thickness> <area> <region> price a coverage request
  history                                  print recent quotes, newest first
  mode                                     print online/offline state
  set-price <type> <thickness> <price>     admin: change one unit price
  passwd <new-password>                    admin: change the account password

types:   RED_GREEN, BLUE_YELLOW, EPDM
regions: MOSCOW, MOSCOW_OBLAST, OTHER";

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let config = Config::from_env();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        bail!("{USAGE}");
    };

    let blobs: Arc<dyn BlobStore> = Arc::new(FileBlobStore::new(&config.data_dir).await?);
    let remote_client = match &config.remote {
        Some(remote) => Some(RemoteClient::new(&remote.url, &remote.api_key)?),
        None => {
            tracing::info!("remote endpoint not fully configured, running offline");
            None
        }
    };
    let admin_email = config.remote.as_ref().map(|r| r.admin_email.clone());
    let remote: Option<Arc<dyn RemotePriceStore>> = remote_client
        .clone()
        .map(|client| Arc::new(RemotePriceClient::new(client)) as Arc<dyn RemotePriceStore>);

    let service = PriceService::new(blobs.clone(), remote.clone());
    service.initialize_with_cloud(config.init_timeout).await?;
    let history = QuoteHistory::new(blobs);

    match command {
        "list" => cmd_list(&service),
        "quote" => cmd_quote(&service, &history, &args[1..]).await?,
        "history" => cmd_history(&history).await,
        "mode" => println!("{}", service.mode_label()),
        "set-price" => {
            cmd_set_price(&service, remote_client, remote, admin_email, &args[1..]).await?
        }
        "passwd" => cmd_passwd(remote_client, remote, admin_email, &args[1..]).await?,
        other => bail!("unknown command '{other}'\n\n{USAGE}"),
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}

fn cmd_list(service: &PriceService) {
    println!(
        "price table v{} ({})",
        service.current_version(),
        service.mode_label()
    );
    for entry in service.list_prices() {
        println!(
            "  {:<12} {:<6} {:>8} rub/m2",
            entry.coverage_type.as_str(),
            entry.thickness,
            entry.unit_price
        );
    }
}

async fn cmd_quote(
    service: &PriceService,
    history: &QuoteHistory,
    args: &[String],
) -> Result<()> {
    let [coverage, thickness, area, region] = args else {
        bail!("usage: kover quote <type> <thickness> <area> <region>");
    };
    let coverage_type = CoverageType::from_key(&coverage.to_uppercase())
        .with_context(|| format!("unknown coverage type '{coverage}'"))?;
    let area: Decimal = area
        .parse()
        .with_context(|| format!("invalid area '{area}'"))?;
    let region = parse_region(region)?;

    let quote = service.quote(&QuoteRequest {
        area,
        thickness: thickness.clone(),
        coverage_type,
        region,
    })?;

    if quote.rejected {
        let reason = quote.rejection_reason.as_deref().unwrap_or("rejected");
        println!("rejected: {reason}");
    } else {
        println!(
            "{} m2 x {} rub/m2 = {} rub",
            quote.area, quote.unit_price, quote.final_cost
        );
    }
    history.append(quote).await?;
    Ok(())
}

async fn cmd_history(history: &QuoteHistory) {
    let quotes = history.list().await;
    if quotes.is_empty() {
        println!("no quotes yet");
        return;
    }
    for quote in quotes {
        let outcome = if quote.rejected {
            quote
                .rejection_reason
                .clone()
                .unwrap_or_else(|| "rejected".to_string())
        } else {
            format!("{} rub", quote.final_cost)
        };
        println!(
            "{}  {:<12} {:<6} {:>8} m2  {}",
            quote.created_at.format("%Y-%m-%d %H:%M"),
            quote.coverage_type.as_str(),
            quote.thickness,
            quote.area,
            outcome
        );
    }
}

async fn cmd_set_price(
    service: &PriceService,
    remote_client: Option<RemoteClient>,
    remote: Option<Arc<dyn RemotePriceStore>>,
    admin_email: Option<String>,
    args: &[String],
) -> Result<()> {
    let [coverage, thickness, price] = args else {
        bail!("usage: kover set-price <type> <thickness> <price>");
    };
    let coverage_type = CoverageType::from_key(&coverage.to_uppercase())
        .with_context(|| format!("unknown coverage type '{coverage}'"))?;
    let price: Decimal = price
        .parse()
        .with_context(|| format!("invalid price '{price}'"))?;

    // Sign in only when a remote is configured; offline edits stay local and
    // need no session.
    let session = match (remote_client, remote, admin_email) {
        (Some(client), Some(store), Some(email)) => {
            Some(admin_sign_in(client, store, &email).await?)
        }
        _ => None,
    };

    let mut entries = service.list_prices();
    match entries
        .iter_mut()
        .find(|e| e.coverage_type == coverage_type && e.thickness == *thickness)
    {
        Some(entry) => entry.unit_price = price,
        None => entries.push(PriceEntry::new(coverage_type, thickness.clone(), price)),
    }

    let outcome = service
        .save_admin_prices(&entries, session.as_ref().map(|(_, s)| s))
        .await;
    if let Some((auth, session)) = &session {
        auth.sign_out(session).await;
    }

    match outcome? {
        SaveOutcome::Synced { version } => println!("saved, synced as v{version}"),
        SaveOutcome::LocalOnly { version } => {
            println!("saved locally as v{version} (not synced)");
        }
    }
    Ok(())
}

async fn cmd_passwd(
    remote_client: Option<RemoteClient>,
    remote: Option<Arc<dyn RemotePriceStore>>,
    admin_email: Option<String>,
    args: &[String],
) -> Result<()> {
    let [new_password] = args else {
        bail!("usage: kover passwd <new-password>");
    };
    kover_core::validation::validate_password(new_password)?;
    let (Some(client), Some(store), Some(email)) = (remote_client, remote, admin_email) else {
        bail!("password change requires a configured remote endpoint");
    };
    let (auth, session) = admin_sign_in(client, store, &email).await?;
    let result = auth.update_password(&session, new_password).await;
    auth.sign_out(&session).await;
    result?;
    println!("password updated");
    Ok(())
}

async fn admin_sign_in(
    client: RemoteClient,
    store: Arc<dyn RemotePriceStore>,
    email: &str,
) -> Result<(RemoteAuthClient, kover_core::auth::AdminSession)> {
    let password =
        std::env::var("KOVER_ADMIN_PASSWORD").context("KOVER_ADMIN_PASSWORD is not set")?;
    kover_core::validation::validate_email(email)?;
    let auth = RemoteAuthClient::new(client, store);
    let session = auth.sign_in(email, &password).await?;
    Ok((auth, session))
}

fn parse_region(raw: &str) -> Result<Region> {
    match raw.to_uppercase().as_str() {
        "MOSCOW" => Ok(Region::Moscow),
        "MOSCOW_OBLAST" => Ok(Region::MoscowOblast),
        "OTHER" => Ok(Region::Other),
        other => bail!("unknown region '{other}' (expected MOSCOW, MOSCOW_OBLAST or OTHER)"),
    }
}
