use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pricelens_client::{IdentifyService, OpenAiAnalyzer, encode_image};
use pricelens_core::models::{AnalysisResult, ShoppingItem};
use pricelens_core::ranking::{
    DEFAULT_YEARS_BACK, cheapest_offer, synthesize_value_history, valid_offers,
};
use pricelens_core::rewards::{RewardLedger, SAVE_AWARD, SCAN_AWARD, SEARCH_AWARD};
use pricelens_core::traits::{SystemStamper, ThreadJitter};
use pricelens_core::{checklist::ChecklistStore, inventory::InventoryStore};
use pricelens_db::{SqliteBackend, StorageConfig};

#[derive(Parser)]
#[command(name = "pricelens", version, about = "Product identification and price comparison")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Connection settings for the inference service.
#[derive(Args)]
struct ApiArgs {
    /// Model to use (e.g., "gpt-4o-mini")
    #[arg(short, long, env = "PRICELENS_MODEL", default_value = "gpt-4o-mini")]
    model: String,

    /// OpenAI-compatible API base URL
    #[arg(
        short,
        long,
        env = "PRICELENS_BASE_URL",
        default_value = "https://api.openai.com/v1"
    )]
    base_url: String,

    /// API key (reads from PRICELENS_API_KEY env var if not provided)
    #[arg(short, long, env = "PRICELENS_API_KEY")]
    api_key: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Identify a product and compare prices
    Identify {
        #[command(subcommand)]
        source: IdentifySource,
    },

    /// Manage saved identification results
    Saved {
        #[command(subcommand)]
        action: SavedAction,
    },

    /// Show ranked offers and the value trend for a saved result
    Offers {
        /// Id of the saved result
        #[arg(long)]
        id: String,

        /// Also print the synthesized multi-year value trend
        #[arg(long, default_value_t = false)]
        trend: bool,
    },

    /// Manage the shopping list
    List {
        #[command(subcommand)]
        action: ListAction,
    },

    /// Show accumulated reward points
    Points,
}

#[derive(Subcommand)]
enum IdentifySource {
    /// Identify the product in an image file
    Image {
        /// Path to the image
        path: PathBuf,

        /// Prioritize reading a barcode in the image
        #[arg(long, default_value_t = false)]
        barcode: bool,

        /// Save the result to the inventory
        #[arg(long, default_value_t = false)]
        save: bool,

        /// Print the raw result as JSON instead of the summary card
        #[arg(long, default_value_t = false)]
        json: bool,

        #[command(flatten)]
        api: ApiArgs,
    },

    /// Identify a product from a text query
    Text {
        /// Free-text product query
        query: String,

        /// Save the result to the inventory
        #[arg(long, default_value_t = false)]
        save: bool,

        /// Print the raw result as JSON instead of the summary card
        #[arg(long, default_value_t = false)]
        json: bool,

        #[command(flatten)]
        api: ApiArgs,
    },
}

#[derive(Subcommand)]
enum SavedAction {
    /// List saved results, newest first
    List,

    /// Delete one saved result
    Delete {
        #[arg(long)]
        id: String,
    },

    /// Delete all saved results
    Clear,
}

#[derive(Subcommand)]
enum ListAction {
    /// Show the shopping list
    Show {
        /// Show bought/cancelled items instead of active ones
        #[arg(long, default_value_t = false)]
        history: bool,
    },

    /// Add an item
    Add {
        /// Item text
        text: String,
    },

    /// Mark an active item as bought
    Bought {
        #[arg(long)]
        id: String,
    },

    /// Mark an active item as cancelled
    Cancel {
        #[arg(long)]
        id: String,
    },

    /// Restore a bought or cancelled item to active
    Restore {
        #[arg(long)]
        id: String,
    },

    /// Delete a bought or cancelled item
    Delete {
        #[arg(long)]
        id: String,
    },

    /// Delete all bought and cancelled items
    ClearHistory,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("pricelens=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Identify { source } => match source {
            IdentifySource::Image {
                path,
                barcode,
                save,
                json,
                api,
            } => cmd_identify_image(&path, barcode, save, json, &api).await?,
            IdentifySource::Text {
                query,
                save,
                json,
                api,
            } => cmd_identify_text(&query, save, json, &api).await?,
        },
        Commands::Saved { action } => cmd_saved(action).await?,
        Commands::Offers { id, trend } => cmd_offers(&id, trend).await?,
        Commands::List { action } => cmd_list(action).await?,
        Commands::Points => cmd_points().await?,
    }

    Ok(())
}

/// Open the local storage file configured through the environment.
async fn connect_storage() -> Result<SqliteBackend> {
    let config = StorageConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;
    SqliteBackend::connect(&config)
        .await
        .context("Failed to open local storage")
}

fn make_service(api: &ApiArgs) -> Result<IdentifyService<OpenAiAnalyzer, SystemStamper>> {
    let analyzer = OpenAiAnalyzer::with_base_url(&api.api_key, &api.model, &api.base_url)
        .map_err(|e| anyhow::anyhow!(e))?;
    Ok(IdentifyService::new(analyzer, SystemStamper))
}

async fn cmd_identify_image(
    path: &PathBuf,
    barcode: bool,
    save: bool,
    json: bool,
    api: &ApiArgs,
) -> Result<()> {
    let service = make_service(api)?;

    tracing::info!("Encoding {}", path.display());
    let image = encode_image(path).await.map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!("Identifying with model {} ...", api.model);
    let result = service
        .identify_image(&image.data, &image.mime_type, barcode)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }
    finish_identification(result, save, SCAN_AWARD).await
}

async fn cmd_identify_text(query: &str, save: bool, json: bool, api: &ApiArgs) -> Result<()> {
    let service = make_service(api)?;

    tracing::info!("Identifying with model {} ...", api.model);
    let result = service
        .identify_text(query)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }
    finish_identification(result, save, SEARCH_AWARD).await
}

/// Award points for the identification and, if requested, persist the
/// result (which awards again when it is actually new).
async fn finish_identification(result: AnalysisResult, save: bool, award: u64) -> Result<()> {
    let backend = connect_storage().await?;

    let mut ledger = RewardLedger::load(backend.clone()).await;
    let total = ledger.add(award).await.map_err(|e| anyhow::anyhow!(e))?;
    tracing::info!("+{award} points (total: {total})");

    if save {
        let id = result.id.clone();
        let mut inventory = InventoryStore::load(backend.clone()).await;
        let inserted = inventory.save(result).await.map_err(|e| anyhow::anyhow!(e))?;
        if inserted {
            let total = ledger
                .add(SAVE_AWARD)
                .await
                .map_err(|e| anyhow::anyhow!(e))?;
            tracing::info!(%id, "Saved to inventory, +{SAVE_AWARD} points (total: {total})");
        } else {
            tracing::info!(%id, "Already in inventory");
        }
    }

    Ok(())
}

async fn cmd_saved(action: SavedAction) -> Result<()> {
    let backend = connect_storage().await?;
    let mut inventory = InventoryStore::load(backend).await;

    match action {
        SavedAction::List => {
            let items = inventory.list();
            if items.is_empty() {
                println!("No saved results.");
                return Ok(());
            }
            println!("Saved results ({}):\n", items.len());
            for item in items {
                println!(
                    "  {}  {} [{}] {}",
                    item.id,
                    item.product_name,
                    item.rarity_tier.as_str(),
                    item.estimated_value_range,
                );
            }
        }
        SavedAction::Delete { id } => {
            if inventory.delete(&id).await.map_err(|e| anyhow::anyhow!(e))? {
                println!("Deleted {id}");
            } else {
                println!("No saved result with id {id}");
            }
        }
        SavedAction::Clear => {
            inventory.clear().await.map_err(|e| anyhow::anyhow!(e))?;
            println!("Inventory cleared.");
        }
    }

    Ok(())
}

async fn cmd_offers(id: &str, trend: bool) -> Result<()> {
    let backend = connect_storage().await?;
    let inventory = InventoryStore::load(backend).await;

    let result = inventory
        .list()
        .iter()
        .find(|r| r.id == id)
        .cloned()
        .with_context(|| format!("No saved result with id {id}"))?;

    println!("{} [{}]\n", result.product_name, result.rarity_tier.as_str());
    print_offers(&result);

    if trend {
        let offers = valid_offers(&result.retailers);
        let current = cheapest_offer(&offers)
            .map(|i| offers[i].price.clone())
            .unwrap_or_else(|| result.estimated_value_range.clone());

        let mut jitter = ThreadJitter;
        let history = synthesize_value_history(&current, DEFAULT_YEARS_BACK, &mut jitter);

        println!("\nEstimated value trend (synthetic):");
        for point in &history {
            println!("  {}  £{:.2}", point.year, point.price);
        }
    }

    Ok(())
}

async fn cmd_list(action: ListAction) -> Result<()> {
    let backend = connect_storage().await?;
    let mut list = ChecklistStore::load(backend, SystemStamper).await;

    match action {
        ListAction::Show { history } => {
            let items = if history {
                list.history_items()
            } else {
                list.active_items()
            };
            if items.is_empty() {
                println!(
                    "{}",
                    if history {
                        "No bought or cancelled items."
                    } else {
                        "Shopping list is empty."
                    }
                );
                return Ok(());
            }
            for item in items {
                print_list_item(item);
            }
        }
        ListAction::Add { text } => match list.add(&text).await.map_err(|e| anyhow::anyhow!(e))? {
            Some(item) => println!("Added {} ({})", item.text, item.id),
            None => println!("Nothing to add."),
        },
        ListAction::Bought { id } => {
            report_transition(list.mark_bought(&id).await, &id, "bought")?
        }
        ListAction::Cancel { id } => report_transition(list.cancel(&id).await, &id, "cancelled")?,
        ListAction::Restore { id } => report_transition(list.restore(&id).await, &id, "active")?,
        ListAction::Delete { id } => {
            if list.delete(&id).await.map_err(|e| anyhow::anyhow!(e))? {
                println!("Deleted {id}");
            } else {
                println!("No deletable item with id {id} (active items cannot be deleted)");
            }
        }
        ListAction::ClearHistory => {
            let removed = list.clear_history().await.map_err(|e| anyhow::anyhow!(e))?;
            println!("Removed {removed} items.");
        }
    }

    Ok(())
}

fn report_transition(
    outcome: Result<bool, pricelens_core::AppError>,
    id: &str,
    state: &str,
) -> Result<()> {
    if outcome.map_err(|e| anyhow::anyhow!(e))? {
        println!("{id} is now {state}");
    } else {
        println!("No transition for {id}");
    }
    Ok(())
}

async fn cmd_points() -> Result<()> {
    let backend = connect_storage().await?;
    let ledger = RewardLedger::load(backend).await;
    println!("Reward points: {}", ledger.total());
    Ok(())
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

fn print_result(result: &AnalysisResult) {
    println!("\n{}", result.product_name);
    println!(
        "{} | {} | confidence {:.0}%",
        result.category,
        result.rarity_tier.as_str(),
        result.confidence_score,
    );
    if result.is_rare {
        println!("Collectible / limited edition");
    }
    println!("\n{}", result.description);
    let (range, note) = split_value_range(&result.estimated_value_range);
    println!("\nEstimated value: {range}");
    if let Some(note) = note {
        println!("  ({note}");
    }
    if !result.buying_tip.is_empty() {
        println!("Tip: {}", result.buying_tip);
    }

    if !result.specs.is_empty() {
        println!("\nSpecs:");
        for spec in &result.specs {
            println!("  {}: {}", spec.name, spec.value.as_deref().unwrap_or("-"));
        }
    }

    if !result.pros.is_empty() {
        println!("\nPros:");
        for pro in result.pros.iter().take(3) {
            println!("  + {pro}");
        }
    }
    if !result.cons.is_empty() {
        println!("Cons:");
        for con in result.cons.iter().take(3) {
            println!("  - {con}");
        }
    }

    print_offers(result);

    if !result.related_products.is_empty() {
        println!("\nRelated:");
        for related in &result.related_products {
            println!(
                "  {} ({}) - {}",
                related.name, related.estimated_price, related.reason
            );
        }
    }

    println!("\nId: {}", result.id);
}

fn print_offers(result: &AnalysisResult) {
    let offers = valid_offers(&result.retailers);
    if offers.is_empty() {
        println!("\nNo offers with usable links.");
        return;
    }

    let cheapest = cheapest_offer(&offers);

    println!("\nOffers:");
    for (i, offer) in offers.iter().enumerate() {
        let marker = if cheapest == Some(i) { "*" } else { " " };
        let stock = if offer.in_stock { "in stock" } else { "out of stock" };
        println!(
            "  {marker} {}  {}  ({stock})  {}",
            offer.retailer,
            offer.price,
            host_of(&offer.url),
        );
        if let Some(comparison) = &offer.comparison {
            println!("      {comparison}");
        }
    }
    if cheapest.is_some() {
        println!("  (* = cheapest)");
    }
}

fn print_list_item(item: &ShoppingItem) {
    let status = match item.status {
        pricelens_core::models::ItemStatus::Active => "[ ]",
        pricelens_core::models::ItemStatus::Bought => "[x]",
        pricelens_core::models::ItemStatus::Cancelled => "[-]",
    };
    println!("  {status} {}  ({})", item.text, item.id);
}

/// Split an estimated value range like "£50 - £80 (boxed, mint)" into the
/// range and the optional parenthetical note.
fn split_value_range(raw: &str) -> (&str, Option<&str>) {
    match raw.split_once(" (") {
        Some((range, note)) => (range, Some(note)),
        None => (raw, None),
    }
}

/// Host part of an offer link, for compact display.
fn host_of(raw: &str) -> String {
    url::Url::parse(raw)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| raw.to_string())
}
