use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use scrape_bench::config::{BenchConfig, ConfigLoader, OutputConfig};
use scrape_bench::metrics::snapshot::MetricsSnapshot;
use scrape_bench::runner::BenchmarkRunner;
use std::path::PathBuf;
use std::sync::Arc;
use validator::Validate;

#[derive(Parser)]
#[command(name = "scrape-bench")]
#[command(version)]
#[command(about = "Time and compare web-scraping backends against one URL", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape a URL with every enabled backend and report the results
    Run {
        /// Target URL (overrides the config file)
        #[arg(short, long)]
        url: Option<String>,

        /// Path to a configuration file (JSON/YAML/TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Firecrawl API key (defaults to the configured environment variable)
        #[arg(long)]
        firecrawl_api_key: Option<String>,

        /// Also write the report as JSON to this path
        #[arg(long)]
        json: Option<PathBuf>,

        /// Also write the results as CSV to this path
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Show a progress bar (stderr)
        #[arg(short, long, default_value_t = false)]
        progress: bool,
    },
    /// Validate a configuration file
    Check {
        /// Path to the configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    if std::env::var("RUST_LOG").is_err() {
        unsafe { std::env::set_var("RUST_LOG", "info"); }
    }
    let cli = Cli::parse();
    let logger = env_logger::Builder::from_default_env().build();
    let multi = Arc::new(indicatif::MultiProgress::new());

    match cli.command {
        Commands::Run {
            url,
            config,
            firecrawl_api_key,
            json,
            csv,
            progress,
        } => {
            let max_level = logger.filter();
            if progress {
                indicatif_log_bridge::LogWrapper::new((*multi).clone(), logger).try_init()?;
            } else {
                log::set_boxed_logger(Box::new(logger))?;
            }
            log::set_max_level(max_level);

            let mut config_data = match &config {
                Some(path) => {
                    log::info!("Loading config from {:?}", path);
                    ConfigLoader::load(path)?
                }
                None => BenchConfig::default(),
            };

            if url.is_some() {
                config_data.url = url;
            }
            if firecrawl_api_key.is_some() {
                config_data.firecrawl.api_key = firecrawl_api_key;
            }
            config_data.firecrawl.resolve_api_key_from_env();
            if json.is_some() || csv.is_some() {
                if config_data.outputs.is_empty() {
                    config_data.outputs.push(OutputConfig::Console);
                }
                if let Some(path) = json {
                    config_data.outputs.push(OutputConfig::Json {
                        path: path.display().to_string(),
                    });
                }
                if let Some(path) = csv {
                    config_data.outputs.push(OutputConfig::Csv {
                        path: path.display().to_string(),
                    });
                }
            }
            config_data.validate()?;

            let target = config_data.target_url()?.to_string();

            let runner = BenchmarkRunner::from_config(&config_data);
            if runner.backend_names().is_empty() {
                anyhow::bail!("every backend is disabled in the configuration");
            }
            let mut reporters = ConfigLoader::create_reporters(
                &config_data,
                progress.then(|| multi.clone()),
            )?;

            let mut progress_bar: Option<ProgressBar> = None;
            let mut _progress_task = None;
            if progress {
                let pb = multi.add(ProgressBar::new(runner.backend_names().len() as u64));
                pb.set_style(ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                    .progress_chars("#>-"));

                let mut metrics_rx = runner.watch_metrics();
                let pb_clone = pb.clone();
                progress_bar = Some(pb);
                _progress_task = Some(tokio::spawn(async move {
                    while metrics_rx.changed().await.is_ok() {
                        let snapshot: MetricsSnapshot = metrics_rx.borrow().clone();
                        pb_clone.set_position(snapshot.backends_completed);
                        pb_clone.set_message(format!(
                            "Succeeded: {} | Failed: {} | Running: {}",
                            snapshot.backends_succeeded,
                            snapshot.backends_failed,
                            snapshot.active_backends
                        ));
                    }
                }));
            }

            log::info!(
                "Starting benchmark '{}' with {}",
                config_data.name,
                runner.backend_names().join(", ")
            );
            let report = runner.run_report(&target).await;

            if let Some(task) = _progress_task {
                task.abort();
            }
            if let Some(pb) = progress_bar {
                let final_metrics = runner.get_metrics();
                pb.set_style(ProgressStyle::default_bar()
                    .template("✅ [{elapsed_precise}] [{bar:40.green/blue}] {pos}/{len} {msg}")?
                    .progress_chars("#>-"));
                pb.finish_with_message(format!(
                    "Succeeded: {} | Failed: {} - Completed",
                    final_metrics.backends_succeeded, final_metrics.backends_failed
                ));
            }

            for reporter in reporters.iter_mut() {
                reporter.write(&report).await?;
                reporter.close().await?;
            }
        }
        Commands::Check { config } => {
            match ConfigLoader::load(&config) {
                Ok(cfg) => {
                    println!("✅ Config is valid:");
                    println!("   Name: {}", cfg.name);
                    println!("   URL: {}", cfg.url.as_deref().unwrap_or("(from --url)"));
                    println!("   Backends: {}", cfg.enabled_backends().join(", "));
                    println!("   Outputs: {}", cfg.outputs.len().max(1));
                }
                Err(e) => {
                    eprintln!("❌ Config error: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
