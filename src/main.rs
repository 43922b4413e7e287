use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use fgnet_prep::infra::http_client::ReqwestFetcher;
use fgnet_prep::pipeline::{self, acquire, FgNet};
use fgnet_prep::summary::DatasetSummary;
use fgnet_prep::types::{Cutoffs, TargetSize};
use fgnet_prep::{logging, DatasetConfig};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "fgnet-prep")]
#[command(about = "Prepare the FG-NET facial age dataset for ordinal classification")]
#[command(version)]
struct Cli {
    /// Dataset root directory (overrides the config file and FGNET_ROOT)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for rolling log files
    #[arg(long, global = true, default_value = "logs")]
    log_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Overrides {
    /// Output resolution as HxW, e.g. 128x128
    #[arg(long)]
    target_size: Option<TargetSize>,

    /// Ascending age cutoffs, e.g. 3,11,16,24,40
    #[arg(long)]
    categories: Option<Cutoffs>,

    #[arg(long)]
    test_size: Option<f64>,

    #[arg(long)]
    validation_size: Option<f64>,

    #[arg(long)]
    seed: Option<u64>,

    /// Also copy validation images into FGNET/validation/<category>/
    #[arg(long)]
    materialize_validation: bool,
}

impl Overrides {
    fn apply(self, mut config: DatasetConfig) -> DatasetConfig {
        if let Some(v) = self.target_size {
            config.target_size = v;
        }
        if let Some(v) = self.categories {
            config.categories = v;
        }
        if let Some(v) = self.test_size {
            config.test_size = v;
        }
        if let Some(v) = self.validation_size {
            config.validation_size = v;
        }
        if let Some(v) = self.seed {
            config.seed = v;
        }
        if self.materialize_validation {
            config.materialize_validation = true;
        }
        config
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Download, verify and extract the archive if it is not already present
    Download,
    /// Label and resize the raw images into FGNET/data_processed
    Process {
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Split the processed manifest into train/validation/test
    Split {
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Run every stage in order, skipping the ones already done
    Run {
        /// Download the archive when it is missing
        #[arg(long)]
        download: bool,
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Print per-split category counts
    Summary {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn base_config(cli: &Cli) -> anyhow::Result<DatasetConfig> {
    let config = match &cli.config {
        Some(path) => DatasetConfig::load(path)?,
        None => DatasetConfig::default(),
    };
    let mut config = config.apply_env();
    if let Some(root) = &cli.root {
        config.root = root.clone();
    }
    Ok(config)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = base_config(&cli)?;

    match cli.command {
        Commands::Download => {
            config.validate()?;
            let fetcher = ReqwestFetcher::new()?;
            let outcome = pipeline::run_download(&config, &fetcher)?;
            println!("download: {outcome:?}");
        }
        Commands::Process { overrides } => {
            let config = overrides.apply(config);
            config.validate()?;
            acquire::ensure_integrity(&config.root)?;
            let outcome = pipeline::run_process(&config)?;
            println!("process: {outcome:?}");
        }
        Commands::Split { overrides } => {
            let config = overrides.apply(config);
            config.validate()?;
            let outcome = pipeline::run_split(&config)
                .context("split needs a processed dataset; run `process` first")?;
            println!("split: {outcome:?}");
        }
        Commands::Run { download, overrides } => {
            let mut config = overrides.apply(config);
            config.download = config.download || download;
            config.process_data = true;
            let dataset = FgNet::new(config)?;
            let report = dataset.report();
            println!("acquire: {:?}", report.acquire);
            println!("process: {:?}", report.process);
            println!("split:   {:?}", report.split);
            print!("{}", DatasetSummary::from_dataset(&dataset)?);
        }
        Commands::Summary { json } => {
            let dataset = FgNet::open(config)?;
            let summary = DatasetSummary::from_dataset(&dataset)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print!("{summary}");
            }
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let _guard = logging::init_logging(&cli.log_dir);

    info!("fgnet-prep starting");
    if let Err(e) = run(cli) {
        error!("{:#}", e);
        return Err(e);
    }
    Ok(())
}
