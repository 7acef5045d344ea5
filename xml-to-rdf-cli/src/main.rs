use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::{fs, io, path::PathBuf};
use templates::{Template, BASIC_CONFIG, FULL_CONFIG};
use tracing::{error, info, warn, Level};
use xml_to_rdf::{
    CollectionsProvider, DocumentReport, MappingConfig, OutputFormat, ProcessingOutcome,
    Processor, TransformRegistry,
};

mod templates;

/// XML to RDF Processor
/// Converts XML files to RDF based on a declarative mapping configuration
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output for detailed processing information
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Map XML files to RDF according to a mapping configuration
    Process {
        /// Path to the mapping configuration file
        #[arg(short, long, value_name = "PATH TO CONFIG")]
        config: PathBuf,

        /// Input XML file, or a directory whose files are all processed
        #[arg(short, long, value_name = "INPUT PATH")]
        input: PathBuf,

        /// Output directory for generated RDF files
        #[arg(short, long, value_name = "OUTPUT DIRECTORY PATH")]
        output: PathBuf,

        /// Output format: rdf, ttl, n3, trig, nt or nq
        #[arg(short, long, default_value = "rdf")]
        format: String,

        /// Split the input file into chunks using the config's <split> element
        #[arg(short, long)]
        split: bool,

        /// Wait for return to be pressed before exiting
        #[arg(short, long)]
        pause: bool,

        /// Directory of JSON transform bundles providing extra modifiers
        #[arg(short, long, value_name = "MODIFIERS DIRECTORY")]
        modifiers: Option<PathBuf>,

        /// Base IRI for relative identifiers (defaults to the output file's URL)
        #[arg(short, long, value_name = "IRI")]
        base_iri: Option<String>,
    },
    /// Generate a mapping configuration template
    GenerateConfig {
        /// Type of configuration template to generate (basic/full)
        #[arg(short = 't', long = "type", default_value = "basic")]
        template_type: String,

        /// Output path for the generated configuration
        #[arg(short, long, default_value = "config.xml", value_name = "OUTPUT PATH")]
        output: PathBuf,
    },
    /// Validate a mapping configuration file
    Validate {
        /// Path to the mapping configuration file to validate
        #[arg(short, long, default_value = "config.xml", value_name = "PATH TO CONFIG")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging with appropriate level
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    info!("XML to RDF Processor starting up...");

    match &cli.command {
        Commands::GenerateConfig {
            template_type,
            output,
        } => generate_config_command(template_type, output),
        Commands::Validate { config } => validate_command(config),
        Commands::Process {
            config,
            input,
            output,
            format,
            split,
            pause,
            modifiers,
            base_iri,
        } => {
            let result = process_command(
                config,
                input,
                output,
                format,
                *split,
                modifiers.as_ref(),
                base_iri.as_deref(),
            )
            .await;
            if let Err(e) = &result {
                error!("Processing failed: {:#}", e);
            }
            if *pause {
                wait_for_return()?;
            }
            result
        }
    }
}

async fn process_command(
    config_path: &PathBuf,
    input: &PathBuf,
    output: &PathBuf,
    format: &str,
    split: bool,
    modifiers: Option<&PathBuf>,
    base_iri: Option<&str>,
) -> Result<()> {
    // Verify config file exists
    if !config_path.exists() {
        anyhow::bail!(
            "Config file not found: {}. Try using --config <PATH TO CONFIG>",
            config_path.display()
        );
    }
    if !input.exists() {
        anyhow::bail!("Input file or directory not found: {}", input.display());
    }

    let format: OutputFormat = format.parse().context("Invalid --format")?;

    // Load and validate config
    let config = MappingConfig::from_file(config_path)
        .context("Failed to load mapping configuration. See errors for additional details:")?;
    config
        .validate()
        .context("Failed to validate mapping configuration")?;

    let mut transforms = TransformRegistry::new().with_provider(CollectionsProvider);
    if let Some(dir) = modifiers {
        let count = transforms
            .load_bundles(dir)
            .context(format!("Failed to load transform bundles from: {}", dir.display()))?;
        info!("Loaded {} transform bundle(s) from {}", count, dir.display());
    }

    // Create and run processor
    info!("Initializing processor...");
    let mut builder = Processor::builder(config)
        .format(format)
        .output_dir(output)
        .transforms(transforms);
    if let Some(base_iri) = base_iri {
        builder = builder.base_iri(base_iri);
    }
    let processor = builder.build().context("Failed to create processor")?;

    let reports = if split {
        info!("Splitting {} before processing...", input.display());
        processor
            .process_split(input)
            .await
            .context("Failed to split input file")?
    } else {
        processor
            .process_path(input)
            .await
            .context("Failed to process input")?
    };

    summarize(&reports)
}

fn summarize(reports: &[DocumentReport]) -> Result<()> {
    let mut failed = 0;
    for report in reports {
        match (&report.output, &report.outcome) {
            (None, _) => failed += 1,
            (Some(output), ProcessingOutcome::Success) => {
                info!("{} -> {}", report.input.display(), output.display())
            }
            (Some(output), ProcessingOutcome::SuccessWithWarnings(warnings)) => warn!(
                "{} -> {} with {} warning(s)",
                report.input.display(),
                output.display(),
                warnings.len()
            ),
            (Some(output), ProcessingOutcome::Failure { errors, warnings }) => warn!(
                "{} -> {} with {} mapping error(s) and {} warning(s)",
                report.input.display(),
                output.display(),
                errors.len(),
                warnings.len()
            ),
        }
    }
    if failed > 0 {
        anyhow::bail!("{} of {} file(s) could not be processed", failed, reports.len());
    }
    info!("Processing completed successfully");
    Ok(())
}

fn wait_for_return() -> Result<()> {
    info!("Processing finished. Press return to end.");
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(())
}

fn generate_config_command(template_type: &str, output: &PathBuf) -> Result<()> {
    let template = match template_type.to_lowercase().as_str() {
        "basic" => Template::Basic,
        "full" => Template::Full,
        _ => anyhow::bail!("Invalid template type. Must be either 'basic' or 'full'"),
    };

    info!("Generating {} configuration template...", template_type);

    let template_content = match template {
        Template::Basic => BASIC_CONFIG,
        Template::Full => FULL_CONFIG,
    };

    // if output is a directory, append the default file name
    let full_file_output_path = if output.is_dir() {
        output.join("config.xml")
    } else {
        output.into()
    };

    fs::write(&full_file_output_path, template_content).context(format!(
        "Failed to write configuration to: {}",
        output.display()
    ))?;

    info!(
        "Successfully generated configuration template at: {}",
        full_file_output_path.display()
    );
    Ok(())
}

fn validate_command(config_path: &PathBuf) -> Result<()> {
    info!("Validating mapping configuration...");

    if !config_path.exists() {
        anyhow::bail!(
            "Config file not found: {}. Try using --config <PATH TO CONFIG>",
            config_path.display()
        );
    }

    let config = MappingConfig::from_file(config_path)
        .context("Failed to parse mapping configuration. See errors for additional details:")?;

    config
        .validate()
        .context("Failed to validate mapping configuration")?;

    info!("Configuration validation successful");
    info!(
        "Namespaces: {}",
        config
            .namespaces()
            .iter()
            .map(|(prefix, _)| prefix)
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(())
}
