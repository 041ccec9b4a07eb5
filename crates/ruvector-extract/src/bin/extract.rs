//! Document extraction CLI
//!
//! Run with: cargo run -p ruvector-extract --features cli -- elements ./docs -o ./out

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use walkdir::WalkDir;

use ruvector_extract::backend::Tooling;
use ruvector_extract::config::OutputFormat;
use ruvector_extract::extraction::save_elements;
use ruvector_extract::{DocumentExtractor, ExtractConfig, FileType, StructuredPipeline};

#[derive(Parser)]
#[command(name = "ruvector-extract")]
#[command(version, about = "Extract typed elements and structural chunks from documents")]
struct Cli {
    /// TOML configuration file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract elements and write one file per element index
    Elements {
        /// Files or directories (searched recursively)
        inputs: Vec<PathBuf>,
        /// Output directory; each document gets its own subdirectory
        #[arg(long, short)]
        output: PathBuf,
        /// text or json (overrides the configuration)
        #[arg(long)]
        format: Option<OutputFormat>,
        /// Merge elements per index under this label, e.g. PAGE
        #[arg(long)]
        group_label: Option<String>,
    },
    /// Run the structure-aware pipeline and print chunks as JSON
    Structured {
        input: PathBuf,
        /// Write the JSON here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Report which external tools are installed
    Tools,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ruvector_extract=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => ExtractConfig::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => ExtractConfig::default(),
    };

    match cli.command {
        Commands::Elements {
            inputs,
            output,
            format,
            group_label,
        } => {
            if let Some(format) = format {
                config.output.format = format;
            }
            if group_label.is_some() {
                config.grouping.enabled = true;
                config.grouping.index_label = group_label;
            }
            config.validate()?;
            Tooling::probe(&config.tools).log_gaps();
            run_elements(&config, &inputs, &output)
        }
        Commands::Structured { input, output } => {
            config.validate()?;
            Tooling::probe(&config.tools).log_gaps();
            run_structured(&config, &input, output.as_deref())
        }
        Commands::Tools => {
            let tooling = Tooling::probe(&config.tools);
            let missing = tooling.missing();
            if missing.is_empty() {
                println!("All external tools found");
            } else {
                println!("Missing: {}", missing.join(", "));
            }
            tooling.log_gaps();
            Ok(())
        }
    }
}

/// A supported file and the input it was found under
struct Document {
    root: PathBuf,
    path: PathBuf,
}

impl Document {
    /// Output directory for this document: its path relative to the
    /// input it was found under, or its file name for a file input
    fn output_dir(&self, output: &Path) -> PathBuf {
        match self.path.strip_prefix(&self.root) {
            Ok(relative) if !relative.as_os_str().is_empty() => output.join(relative),
            _ => output.join(self.path.file_name().unwrap_or(self.path.as_os_str())),
        }
    }
}

/// Supported files under `inputs`, sorted and de-duplicated
fn collect_documents(inputs: &[PathBuf]) -> Vec<Document> {
    let mut documents: Vec<Document> = inputs
        .iter()
        .flat_map(|input| {
            WalkDir::new(input)
                .follow_links(true)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .filter(|path| FileType::from_path(path).is_supported())
                .map(|path| Document {
                    root: input.clone(),
                    path,
                })
                .collect::<Vec<_>>()
        })
        .collect();
    documents.sort_by(|a, b| a.path.cmp(&b.path));
    documents.dedup_by(|a, b| a.path == b.path);
    documents
}

fn run_elements(config: &ExtractConfig, inputs: &[PathBuf], output: &Path) -> anyhow::Result<()> {
    let documents = collect_documents(inputs);
    if documents.is_empty() {
        tracing::warn!("No supported documents found");
        return Ok(());
    }
    tracing::info!("Extracting {} documents", documents.len());

    let extractor = DocumentExtractor::new(config);
    let progress = ProgressBar::new(documents.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")?.progress_chars("=> "),
    );

    let results: Vec<(PathBuf, usize)> = documents
        .par_iter()
        .map(|document| {
            let path = &document.path;
            let elements = extractor.extract(path);
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            progress.set_message(name.clone());
            progress.inc(1);

            let dir = document.output_dir(output);
            let written = match save_elements(&dir, &elements, config.output.format) {
                Ok(paths) => paths.len(),
                Err(e) => {
                    tracing::error!("[{}] Could not save elements: {}", name, e);
                    0
                }
            };
            (path.clone(), written)
        })
        .collect();
    progress.finish_and_clear();

    let total: usize = results.iter().map(|(_, n)| n).sum();
    let empty = results.iter().filter(|(_, n)| *n == 0).count();
    println!(
        "Wrote {} elements for {} documents to {} ({} produced nothing)",
        total,
        results.len(),
        output.display(),
        empty
    );
    Ok(())
}

fn run_structured(config: &ExtractConfig, input: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let pipeline = StructuredPipeline::new(config);
    let extraction = pipeline.extract(input);
    let json = serde_json::to_string_pretty(&extraction)?;

    match output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote {} chunks to {}", extraction.chunks.len(), path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_names_in_different_folders_get_separate_outputs() {
        let dir = tempfile::tempdir().unwrap();
        for folder in ["a", "b"] {
            std::fs::create_dir_all(dir.path().join(folder)).unwrap();
            std::fs::write(dir.path().join(folder).join("notes.txt"), "text").unwrap();
        }

        let documents = collect_documents(&[dir.path().to_path_buf()]);
        let out = Path::new("/out");
        let dirs: Vec<PathBuf> = documents.iter().map(|d| d.output_dir(out)).collect();
        assert_eq!(
            dirs,
            vec![out.join("a").join("notes.txt"), out.join("b").join("notes.txt")]
        );
    }

    #[test]
    fn test_file_input_uses_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("report.md");
        std::fs::write(&file, "# Report").unwrap();

        let documents = collect_documents(&[file.clone(), file]);
        assert_eq!(documents.len(), 1);
        assert_eq!(
            documents[0].output_dir(Path::new("/out")),
            Path::new("/out").join("report.md")
        );
    }
}
