/*!
gssdash Command Line Interface

Loads the GSS extract and prints the summary table, renders the breakdown
chart for one selection, or exports every static figure as Vega-Lite JSON.
*/

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use gssdash::dashboard::Dashboard;
use gssdash::reader::{self, load_sample};
use gssdash::writer::{VegaLiteWriter, Writer};
use gssdash::{mean_by, BreakdownRequest, Dataset, Field, LoaderConfig, VERSION};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gssdash")]
#[command(about = "Explore the GSS 2018 extract from the command line")]
#[command(version = VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Where the survey comes from
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// URL or path of the survey CSV (overrides the config file)
    #[arg(long)]
    source: Option<String>,

    /// JSON loader configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use the bundled sample extract instead of fetching
    #[arg(long)]
    sample: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print dataset shape and mean income, prestige, SEI and education by sex
    Summary {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Count an attitude question per group and render the bar chart
    Breakdown {
        /// Attitude question (satjob, relationship, male_breadwinner, ...)
        #[arg(long, default_value = "satjob")]
        feature: String,

        /// Grouping column (sex, region, education)
        #[arg(long, default_value = "sex")]
        group: String,

        /// Output file path (stdout when omitted)
        #[arg(long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Write every static figure as <name>.json
    Figures {
        /// Directory to write into (created if missing)
        #[arg(long, default_value = "figures")]
        output_dir: PathBuf,

        #[command(flatten)]
        source: SourceArgs,
    },
}

fn load_dataset(args: &SourceArgs) -> anyhow::Result<Dataset> {
    let mut config = match &args.config {
        Some(path) => LoaderConfig::from_file(path)?,
        None => LoaderConfig::default(),
    };
    if let Some(source) = &args.source {
        config = config.with_source(source.as_str());
    }

    let dataset = if args.sample {
        load_sample(&config)?
    } else {
        reader::load(&config).with_context(|| format!("Failed to load {}", config.source))?
    };
    Ok(dataset)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "gssdash=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let writer = VegaLiteWriter::new();

    match cli.command {
        Commands::Summary { source } => {
            let dataset = load_dataset(&source)?;
            println!(
                "{} respondents x {} columns",
                dataset.height(),
                dataset.column_names().len()
            );
            let means = mean_by(
                &dataset,
                &[
                    Field::Income,
                    Field::JobPrestige,
                    Field::SocioeconomicIndex,
                    Field::Education,
                ],
                Field::Sex,
            )?;
            println!("{}", means);
        }

        Commands::Breakdown {
            feature,
            group,
            output,
            source,
        } => {
            // Reject bad selections before fetching anything
            let request = BreakdownRequest::parse(&feature, &group)?;
            let dashboard = Dashboard::new(Arc::new(load_dataset(&source)?))?;
            let json = writer.write(&dashboard.breakdown(request)?)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, &json)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    eprintln!("Vega-Lite JSON written to: {}", path.display());
                }
                None => println!("{}", json),
            }
        }

        Commands::Figures { output_dir, source } => {
            let dashboard = Dashboard::new(Arc::new(load_dataset(&source)?))?;
            std::fs::create_dir_all(&output_dir)
                .with_context(|| format!("Failed to create {}", output_dir.display()))?;
            for (which, figure) in dashboard.figures() {
                let path = output_dir.join(format!("{}.json", which.name()));
                std::fs::write(&path, writer.write(figure)?)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                eprintln!("{} -> {}", which.heading(), path.display());
            }
        }
    }

    Ok(())
}
