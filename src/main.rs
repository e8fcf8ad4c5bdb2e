use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sreagent::classification::{ClassificationResult, ErrorClassification};
use sreagent::taxonomy::ErrorCategory;
use sreagent::{
    ClassifierFactory, Config, ErrorClassifier, ErrorTypeRegistry, MixingConfig,
    MixingStrategyFactory, TrainingData,
};

#[derive(Parser, Debug)]
#[command(name = "sreagent")]
#[command(version = "0.1.0")]
#[command(about = "Classify source-control errors and inspect model mixing strategies")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train a classifier and classify a single error message
    Classify {
        /// Error message to classify
        message: String,

        /// Training data (JSON with error_messages and error_types)
        #[arg(short, long)]
        training: PathBuf,

        /// Classifier algorithm (rule_based, pattern_based, hybrid)
        #[arg(short, long)]
        algorithm: Option<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Train a classifier and report its accuracy on a labelled test set
    Score {
        #[arg(short, long)]
        training: PathBuf,

        #[arg(long)]
        test: PathBuf,

        #[arg(short, long)]
        algorithm: Option<String>,
    },

    /// List supported mixing strategies
    Strategies,

    /// List registered error types
    ErrorTypes {
        /// Only show one category (e.g. network, file_system)
        #[arg(short, long)]
        category: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so JSON output stays clean
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("sreagent=info".parse()?))
        .init();

    dotenvy::dotenv().ok();

    let args = Args::parse();
    let config = Config::from_env()?;
    let registry = Arc::new(ErrorTypeRegistry::new());

    match args.command {
        Command::Classify {
            message,
            training,
            algorithm,
            format,
        } => {
            let algorithm = algorithm.unwrap_or_else(|| config.classifier_algorithm.to_string());
            let mut classifier = ClassifierFactory::create_classifier(&algorithm, None, registry)?;
            classifier.fit(&load_training_data(&training)?)?;

            let result = classifier.predict(&message, None)?;
            let classification = ErrorClassification::from(&result);

            let output = match format.as_str() {
                "json" => serde_json::to_string_pretty(&serde_json::json!({
                    "result": result,
                    "classification": classification,
                }))?,
                _ => format_classification(&result, &classification),
            };
            println!("{}", output);
        }
        Command::Score {
            training,
            test,
            algorithm,
        } => {
            let algorithm = algorithm.unwrap_or_else(|| config.classifier_algorithm.to_string());
            let mut classifier = ClassifierFactory::create_classifier(&algorithm, None, registry)?;
            classifier.fit(&load_training_data(&training)?)?;

            let test_data = load_training_data(&test)?;
            let accuracy = classifier.score(&test_data)?;
            println!(
                "{}: accuracy {:.1}% over {} samples",
                classifier.name(),
                accuracy * 100.0,
                test_data.len()
            );
        }
        Command::Strategies => {
            let mixing = MixingConfig::from(&config);
            println!(
                "Concurrency limit: {} requests (default strategy: {})",
                mixing.max_concurrent_requests, mixing.default_strategy
            );
            for strategy in MixingStrategyFactory::get_supported_strategies() {
                let marker = if strategy == mixing.default_strategy { " *" } else { "" };
                println!("  - {}{}", strategy, marker);
            }
        }
        Command::ErrorTypes { category } => {
            let mut error_types: Vec<_> = match category {
                Some(name) => {
                    let category = ErrorCategory::from_name(&name)
                        .with_context(|| format!("Unknown error category: {}", name))?;
                    registry.get_errors_by_category(category).into_iter().collect()
                }
                None => registry.get_all_error_types().into_iter().collect(),
            };
            error_types.sort();

            for error_type in error_types {
                if let Some(metadata) = registry.metadata(error_type) {
                    let retry = if metadata.is_retryable {
                        format!("retry {}x after {}s", metadata.max_retries, metadata.retry_delay)
                    } else {
                        "no retry".to_string()
                    };
                    println!(
                        "{:<32} {:<15} {:<9} {}",
                        error_type.as_str(),
                        metadata.category.as_str(),
                        metadata.severity.to_string(),
                        retry
                    );
                }
            }
        }
    }

    Ok(())
}

fn load_training_data(path: &Path) -> anyhow::Result<TrainingData> {
    let data = TrainingData::from_json_file(path)
        .with_context(|| format!("Failed to load training data from {}", path.display()))?;
    tracing::info!("Loaded {} samples from {}", data.len(), path.display());
    Ok(data)
}

fn format_classification(
    result: &ClassificationResult,
    classification: &ErrorClassification,
) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "\n=== {} (confidence: {:.0}%) ===\n\n",
        result.error_type,
        result.confidence * 100.0
    ));

    if classification.is_retryable {
        output.push_str(&format!(
            "Retryable: yes ({} retries, {:.1}s delay)\n",
            classification.max_retries, classification.retry_delay
        ));
    } else {
        output.push_str("Retryable: no\n");
    }

    if !result.classification_path.is_empty() {
        output.push_str("\nEvidence:\n");
        for step in &result.classification_path {
            output.push_str(&format!("  - {}\n", step));
        }
    }

    output.push_str("\nSuggested Actions:\n");
    for action in &result.suggested_actions {
        output.push_str(&format!("  * {}\n", action));
    }

    output
}
