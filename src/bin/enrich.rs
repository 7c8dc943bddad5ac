use clap::Parser;
use pharm_lookup::adapters::remote::SourceCatalog;
use pharm_lookup::adapters::storage::RegistryStore;
use pharm_lookup::app::state::build_chain;
use pharm_lookup::config::{AppConfig, ChainKind};
use pharm_lookup::core::enrichment::EnrichmentRunner;
use pharm_lookup::core::mapping::LocalMappingTable;
use pharm_lookup::utils::{logger, validation::Validate};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "enrich")]
#[command(about = "Resolve ICD-10 codes for every drug in the registry")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Registry CSV; defaults to the configured drug list
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Where the drug-to-codes JSON map is written
    #[arg(short, long, default_value = "data/icd10-drug-mappings.json")]
    output: PathBuf,

    /// Only process the first N drugs
    #[arg(short, long)]
    limit: Option<usize>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init_cli_logger(args.verbose);

    let config = match &args.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            AppConfig::from_file(path)?
        }
        None => AppConfig::default(),
    };

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let input = args.input.clone().unwrap_or_else(|| config.drug_list_path());
    let (registry, status) = RegistryStore::load(&input);
    if !status.loaded {
        eprintln!("❌ Could not load drug registry from {}", input.display());
        std::process::exit(1);
    }

    let drugs = match args.limit {
        Some(limit) => &registry.drugs()[..limit.min(registry.len())],
        None => registry.drugs(),
    };

    let client = reqwest::Client::builder()
        .user_agent(config.user_agent())
        .build()?;
    let catalog = SourceCatalog::from_config(&config, client);
    let chain = build_chain(
        &config,
        &catalog,
        ChainKind::Batch,
        Arc::new(LocalMappingTable::common()),
    )?;

    tracing::info!(
        "🚀 Enriching {} drugs via {:?}",
        drugs.len(),
        chain.strategy_names()
    );

    let runner = EnrichmentRunner::new(
        chain,
        config.batch_size(),
        config.batch_delay(),
        &args.output,
    );
    let (_, stats) = runner.run(drugs).await?;

    println!("✅ Enrichment completed");
    println!("   Processed:     {}", stats.processed);
    println!("   With codes:    {}", stats.with_codes);
    println!("   Without codes: {}", stats.without_codes);
    println!("   Success rate:  {:.1}%", stats.success_rate());
    println!("📁 Output saved to: {}", runner.output_path().display());

    Ok(())
}
