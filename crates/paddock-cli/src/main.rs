use anyhow::{bail, Context};
use chrono::Duration;
use clap::Parser;
use dotenvy::dotenv;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use paddock_cli::{Command, Config, ExportFormat, ImportCommand, TokenCommand};
use paddock_client::{extract_horse_id, ZedClient};
use paddock_core::progress::TracingReporter;
use paddock_core::traits::{CollectionStore, CredentialSource, HorseRegistry};
use paddock_core::{
    Credential, HorseCollection, HorseStatus, ImportError, ImportOutcome, ImportService,
    LocalRecord,
};
use paddock_store::{JsonFileStore, TokenStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")?;

    let config = Config::parse();
    let store = JsonFileStore::new(&config.data_dir);
    let tokens = TokenStore::new(&config.data_dir);

    match &config.command {
        Command::Token { action } => match action {
            TokenCommand::Set { token } => set_token(&tokens, token).await?,
            TokenCommand::Status => token_status(&config, &tokens).await?,
            TokenCommand::Clear => {
                if tokens.clear().await? {
                    println!("API token removed.");
                } else {
                    println!("No API token was stored.");
                }
            }
        },
        Command::TestConnection => {
            let credential = resolve_credential(&config, &tokens).await?;
            test_connection(&config, credential).await?;
        }
        Command::Import { source } => {
            let credential = resolve_credential(&config, &tokens).await?;
            let client = ZedClient::new(credential, &config.http_config())
                .context("Invalid API configuration")?;
            let service = ImportService::new(client, store);
            match source {
                ImportCommand::Stable { kind, into } => {
                    import_stable(&service, *kind, into.unwrap_or(*kind)).await?;
                }
                ImportCommand::Horse { id, target } => {
                    import_horse(&service, id, *target).await?;
                }
            }
        }
        Command::Search { query } => {
            let credential = resolve_credential(&config, &tokens).await?;
            search(&config, credential, query).await?;
        }
        Command::List { status } => {
            list(&store, *status).await?;
        }
        Command::Export {
            status,
            format,
            limit,
        } => {
            export(&store, *status, *format, *limit).await?;
        }
    }

    Ok(())
}

async fn resolve_credential(
    config: &Config,
    tokens: &TokenStore,
) -> anyhow::Result<Option<Credential>> {
    if let Some(token) = config.token.as_deref().filter(|t| !t.trim().is_empty()) {
        return Ok(Some(Credential::from_stored(token)));
    }
    tokens.load().await.context("Failed to read stored API token")
}

async fn set_token(tokens: &TokenStore, raw: &str) -> anyhow::Result<()> {
    let credential = Credential::parse(raw).context("Invalid API token")?;
    let expiry = credential.expiry();

    tokens.save(&credential).await?;

    match expiry {
        Some(expiry) if expiry.expired => {
            warn!("Stored token is already expired ({})", expiry.expires_at);
            println!("Token saved, but it expired at {}.", expiry.expires_at);
        }
        Some(expiry) => {
            println!(
                "Token saved. Expires at {} (in {}).",
                expiry.expires_at,
                format_remaining(expiry.remaining)
            );
        }
        None => println!("Token saved."),
    }
    Ok(())
}

async fn token_status(config: &Config, tokens: &TokenStore) -> anyhow::Result<()> {
    let Some(credential) = resolve_credential(config, tokens).await? else {
        println!("No API token set. Use `paddock token set <TOKEN>`.");
        return Ok(());
    };

    match credential.expiry() {
        Some(expiry) if expiry.expired => {
            println!("Your API token expired at {}.", expiry.expires_at);
        }
        Some(expiry) => {
            println!(
                "API token valid until {} ({} left).",
                expiry.expires_at,
                format_remaining(expiry.remaining)
            );
        }
        None => println!("API token has no readable expiry; it will be treated as expired."),
    }
    Ok(())
}

async fn test_connection(config: &Config, credential: Option<Credential>) -> anyhow::Result<()> {
    if credential.token().is_none() {
        bail!("No API token set. Please set your token first.");
    }
    if credential.is_expired() {
        bail!("Your API token has expired. Please get a new token.");
    }

    let client =
        ZedClient::new(credential, &config.http_config()).context("Invalid API configuration")?;
    let profile = client.me().await.context("Connection test failed")?;

    println!(
        "Connected successfully. Welcome, {}!",
        profile.username.as_deref().unwrap_or("racer")
    );
    Ok(())
}

async fn import_stable<R, S>(
    service: &ImportService<R, S>,
    kind: HorseStatus,
    target: HorseStatus,
) -> anyhow::Result<()>
where
    R: HorseRegistry,
    S: CollectionStore,
{
    let mut collection = service
        .load(target)
        .await
        .context("Failed to load local horses")?;

    let result = service
        .import_batch_with_progress(kind, &mut collection, &TracingReporter)
        .await;
    let outcome = finish_import(result)?;

    if outcome.total == 0 {
        println!("No {} horses found to import.", kind);
    } else {
        println!(
            "Successfully imported {} {} horses ({} new, {} updated)",
            outcome.total - outcome.failed(),
            target,
            outcome.created,
            outcome.updated
        );
    }
    print_failures(&outcome);
    Ok(())
}

async fn import_horse<R, S>(
    service: &ImportService<R, S>,
    raw_id: &str,
    target: HorseStatus,
) -> anyhow::Result<()>
where
    R: HorseRegistry,
    S: CollectionStore,
{
    let mut collection = service
        .load(target)
        .await
        .context("Failed to load local horses")?;

    let result = service
        .import_single_with_progress(raw_id, &mut collection, &TracingReporter)
        .await;
    let outcome = finish_import(result)?;

    let name = imported_name(&collection, raw_id);
    if outcome.created > 0 {
        println!("Imported new {} horse: {}", target, name);
    } else if outcome.updated > 0 {
        println!("Updated {} horse: {}", target, name);
    }
    print_failures(&outcome);
    Ok(())
}

/// Name of the record a single import landed on, falling back to the input.
fn imported_name(collection: &HorseCollection, raw_id: &str) -> String {
    extract_horse_id(raw_id)
        .ok()
        .and_then(|id| collection.find_by_external_id(&id))
        .map(|record| record.name.clone())
        .unwrap_or_else(|| raw_id.trim().to_string())
}

async fn search(
    config: &Config,
    credential: Option<Credential>,
    query: &str,
) -> anyhow::Result<()> {
    let client =
        ZedClient::new(credential, &config.http_config()).context("Invalid API configuration")?;
    let horses = client.search(query).await.context("Search failed")?;

    if horses.is_empty() {
        println!("\nNo horses found matching: \"{}\"\n", query.trim());
        return Ok(());
    }

    println!("\n🔍 {} horse(s) matching \"{}\":\n", horses.len(), query.trim());
    for horse in &horses {
        println!(
            "  {:<24} {:<10} {:<8} {:>5}  {}",
            truncate_text(horse.name.as_deref().unwrap_or("(unnamed)"), 24),
            horse.bloodline.as_deref().unwrap_or("-"),
            horse.gender.as_deref().unwrap_or("-"),
            format_stars(horse.overall_rating),
            horse.id
        );
    }
    println!("\nImport one with: paddock import horse <ID>\n");
    Ok(())
}

fn finish_import(result: Result<ImportOutcome, ImportError>) -> anyhow::Result<ImportOutcome> {
    match result {
        Ok(outcome) => Ok(outcome),
        Err(ImportError::Fetch(e)) => Err(e).context("Import failed, nothing was changed"),
        Err(e @ ImportError::NotSaved { .. }) => {
            Err(e).context("Horses were fetched but could not be saved; run the import again")
        }
    }
}

fn print_failures(outcome: &ImportOutcome) {
    for failure in &outcome.failures {
        println!("  ✗ {}: {}", failure.external_id, failure.reason);
    }
}

async fn list(store: &JsonFileStore, status: HorseStatus) -> anyhow::Result<()> {
    let collection = load_collection(store, status).await?;

    if collection.is_empty() {
        println!("\nNo {} horses tracked yet.", status);
        println!("Try: paddock import stable {}\n", status);
        return Ok(());
    }

    println!("\n🐎 {} horses ({})\n", capitalize(status.as_str()), collection.len());
    for record in collection.records() {
        println!(
            "  {:<24} {:<10} {:<8} {:>5}  {}",
            truncate_text(&record.name, 24),
            record.bloodline.as_deref().unwrap_or("-"),
            record.gender.as_deref().unwrap_or("-"),
            format_stars(record.stars),
            record.external_id.as_deref().unwrap_or("(local)")
        );
    }
    println!();
    Ok(())
}

async fn load_collection(
    store: &JsonFileStore,
    status: HorseStatus,
) -> anyhow::Result<HorseCollection> {
    let records = store
        .load(status.collection_name())
        .await
        .context("Failed to load local horses")?;
    Ok(HorseCollection::from_records(status, records))
}

async fn export(
    store: &JsonFileStore,
    status: HorseStatus,
    format: ExportFormat,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    info!("Exporting {} horses...", status);

    let collection = load_collection(store, status).await?;
    let records: Vec<_> = collection
        .into_records()
        .into_iter()
        .take(limit.unwrap_or(usize::MAX))
        .collect();

    if records.is_empty() {
        eprintln!("No horses found to export.");
        return Ok(());
    }

    match format {
        ExportFormat::Jsonl => export_jsonl(&records)?,
        ExportFormat::Json => export_json(&records)?,
        ExportFormat::Csv => export_csv(&records),
    }

    info!("Export complete: {} horses", records.len());
    Ok(())
}

fn export_jsonl(records: &[LocalRecord]) -> anyhow::Result<()> {
    for record in records {
        println!("{}", serde_json::to_string(record)?);
    }
    Ok(())
}

fn export_json(records: &[LocalRecord]) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(records)?);
    Ok(())
}

fn export_csv(records: &[LocalRecord]) {
    println!(
        "id,externalId,status,name,bloodline,color,gender,stars,speedStars,sprintStars,enduranceStars,initialBalance,initialRating,lastReconciledAt"
    );
    for record in records {
        println!("{}", csv_row(record));
    }
}

fn csv_row(record: &LocalRecord) -> String {
    let opt = |v: Option<&str>| v.map(escape_csv).unwrap_or_default();
    let num = |v: Option<f64>| v.map(|n| n.to_string()).unwrap_or_default();

    [
        record.id.to_string(),
        opt(record.external_id.as_deref()),
        record.status.to_string(),
        escape_csv(&record.name),
        opt(record.bloodline.as_deref()),
        opt(record.color.as_deref()),
        opt(record.gender.as_deref()),
        num(record.stars),
        num(record.speed_stars),
        num(record.sprint_stars),
        num(record.endurance_stars),
        record.initial_balance.to_string(),
        record
            .initial_rating
            .map(|r| r.to_string())
            .unwrap_or_default(),
        record
            .last_reconciled_at
            .map(|t| t.format("%Y-%m-%dT%H:%M:%SZ").to_string())
            .unwrap_or_default(),
    ]
    .join(",")
}

fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn format_stars(stars: Option<f64>) -> String {
    match stars {
        Some(s) => format!("{:.1}★", s),
        None => "-".to_string(),
    }
}

fn format_remaining(remaining: Duration) -> String {
    let minutes = remaining.num_minutes();
    if minutes >= 24 * 60 {
        format!("{}d {}h", minutes / (24 * 60), (minutes / 60) % 24)
    } else if minutes >= 60 {
        format!("{}h {}m", minutes / 60, minutes % 60)
    } else {
        format!("{}m", minutes)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
