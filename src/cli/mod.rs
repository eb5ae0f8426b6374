//! Command-line interface for clausealign.
//!
//! Provides commands for aligning two documents, augmenting the weaker
//! one, and running the offline text tools (locate, reconstruct, parse)
//! on their own.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use crate::adapters::{Generator, ScriptedGenerator};
use crate::alignment::{
    parse_response, resolve_records, verify_records, AlignmentMode, AlignmentRecord,
    ParsedResponse,
};
use crate::anchor::{extract_context, offset_to_line_col, reconstruct, Anchor, AnchorRole};
use crate::config::{self, ResolvedConfig};
use crate::core::{Orchestrator, SafetyLimits};
use crate::prompts::PromptKind;

mod render;

/// clausealign - align legal clauses by topic and fill in missing ones
#[derive(Parser, Debug)]
#[command(name = "clausealign")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Align two documents by topic
    Align {
        /// Stronger document (doc A)
        doc_a: PathBuf,

        /// Weaker document (doc B)
        doc_b: PathBuf,

        /// Response shape requested from the model
        #[arg(short, long, value_enum, default_value = "anchors")]
        mode: ModeArg,

        /// Replay a saved model response instead of calling the generator
        #[arg(long)]
        response: Option<PathBuf>,

        /// Re-verify every span and print a summary
        #[arg(long)]
        verify: bool,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Align, then add clauses for topics doc B lacks
    Augment {
        /// Stronger document (doc A)
        doc_a: PathBuf,

        /// Weaker document (doc B), the one augmented
        doc_b: PathBuf,

        #[arg(short, long, value_enum, default_value = "anchors")]
        mode: ModeArg,

        /// Write the augmented document here
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Find an anchor phrase in a document (offline)
    Locate {
        document: PathBuf,

        /// Phrase to find
        anchor: String,

        /// Byte offset to search from
        #[arg(long, default_value = "0")]
        from: usize,

        /// Which clause boundary the phrase marks
        #[arg(long, value_enum, default_value = "start")]
        role: RoleArg,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Recover a clause from its start and end anchors (offline)
    Reconstruct {
        document: PathBuf,

        #[arg(long)]
        start: String,

        #[arg(long)]
        end: String,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Parse a saved model response (offline)
    Parse {
        /// File holding the raw model output
        response: PathBuf,

        #[arg(short, long, value_enum, default_value = "anchors")]
        mode: ModeArg,

        /// Resolve the records against doc A (requires --doc-b too)
        #[arg(long, requires = "doc_b")]
        doc_a: Option<PathBuf>,

        #[arg(long, requires = "doc_a")]
        doc_b: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show resolved configuration (debug)
    Config,

    /// Check that the configured generator is reachable
    Health,
}

/// Alignment mode for CLI (maps to AlignmentMode)
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    /// Model copies full clause text
    FullText,

    /// Model gives first and last words; text is reconstructed
    Anchors,
}

impl From<ModeArg> for AlignmentMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::FullText => AlignmentMode::FullText,
            ModeArg::Anchors => AlignmentMode::Anchors,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RoleArg {
    Start,
    End,
}

impl From<RoleArg> for AnchorRole {
    fn from(r: RoleArg) -> Self {
        match r {
            RoleArg::Start => AnchorRole::Start,
            RoleArg::End => AnchorRole::End,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Align {
                doc_a,
                doc_b,
                mode,
                response,
                verify,
                format,
            } => align(&doc_a, &doc_b, mode.into(), response, verify, format).await,
            Commands::Augment {
                doc_a,
                doc_b,
                mode,
                output,
                format,
            } => augment(&doc_a, &doc_b, mode.into(), output, format).await,
            Commands::Locate {
                document,
                anchor,
                from,
                role,
                format,
            } => locate(&document, &anchor, from, role.into(), format),
            Commands::Reconstruct {
                document,
                start,
                end,
                format,
            } => reconstruct_clause(&document, &start, &end, format),
            Commands::Parse {
                response,
                mode,
                doc_a,
                doc_b,
                format,
            } => parse(&response, mode.into(), doc_a.zip(doc_b), format),
            Commands::Config => show_config(),
            Commands::Health => health().await,
        }
    }
}

/// Read a document after checking it against the denylist and size limit
fn read_document(path: &Path, limits: &SafetyLimits) -> Result<String> {
    limits.validate_path(path)?;
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read document: {}", path.display()))?;
    limits
        .validate_document(&text, Some(path))
        .with_context(|| format!("Document rejected: {}", path.display()))?;
    Ok(text)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn build_orchestrator(cfg: &ResolvedConfig, generator: Box<dyn Generator>) -> Orchestrator {
    Orchestrator::new(generator)
        .with_locator_config(cfg.matching.clone())
        .with_safety_limits(cfg.safety.clone())
}

async fn align(
    doc_a_path: &Path,
    doc_b_path: &Path,
    mode: AlignmentMode,
    response: Option<PathBuf>,
    verify: bool,
    format: OutputFormat,
) -> Result<()> {
    let cfg = config::config()?;
    let doc_a = read_document(doc_a_path, &cfg.safety)?;
    let doc_b = read_document(doc_b_path, &cfg.safety)?;

    let generator: Box<dyn Generator> = match response {
        Some(path) => {
            let saved = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read response file: {}", path.display()))?;
            let scripted = ScriptedGenerator::new();
            scripted.push(PromptKind::from(mode), saved);
            Box::new(scripted)
        }
        None => cfg.generator.build()?,
    };

    let orchestrator = build_orchestrator(cfg, generator);
    let report = orchestrator.align(&doc_a, &doc_b, mode).await?;
    let summary = verify.then(|| verify_records(&report.records, &doc_a, &doc_b));

    match format {
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct AlignOutput<'a> {
                #[serde(flatten)]
                report: &'a crate::alignment::AlignmentReport,
                #[serde(skip_serializing_if = "Option::is_none")]
                verification: Option<&'a crate::alignment::VerificationSummary>,
            }
            print_json(&AlignOutput {
                report: &report,
                verification: summary.as_ref(),
            })
        }
        OutputFormat::Text => {
            println!("Operation: {}", report.operation_id);
            println!("Mode:      {}", report.mode);
            println!();
            render::print_records(&report.records, &doc_a, &doc_b);
            if let Some(summary) = &summary {
                println!();
                render::print_verification(summary);
            }
            Ok(())
        }
    }
}

async fn augment(
    doc_a_path: &Path,
    doc_b_path: &Path,
    mode: AlignmentMode,
    output: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let cfg = config::config()?;
    let doc_a = read_document(doc_a_path, &cfg.safety)?;
    let doc_b = read_document(doc_b_path, &cfg.safety)?;

    let orchestrator = build_orchestrator(cfg, cfg.generator.build()?);
    let (alignment, augmented) = orchestrator.align_and_augment(&doc_a, &doc_b, mode).await?;

    if let Some(path) = &output {
        std::fs::write(path, &augmented.augmented_text)
            .with_context(|| format!("Failed to write augmented document: {}", path.display()))?;
    }

    match format {
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct AugmentOutput<'a> {
                alignment: &'a crate::alignment::AlignmentReport,
                augmentation: &'a crate::augment::AugmentReport,
            }
            print_json(&AugmentOutput {
                alignment: &alignment,
                augmentation: &augmented,
            })
        }
        OutputFormat::Text => {
            render::print_records(&alignment.records, &doc_a, &doc_b);
            println!();
            render::print_augmentation(&augmented);
            match &output {
                Some(path) => println!("\nAugmented document written to {}", path.display()),
                None => {
                    println!("\n--- Augmented document ---");
                    println!("{}", augmented.augmented_text);
                }
            }
            Ok(())
        }
    }
}

fn locate(
    path: &Path,
    anchor: &str,
    from: usize,
    role: AnchorRole,
    format: OutputFormat,
) -> Result<()> {
    let cfg = config::config()?;
    let document = read_document(path, &cfg.safety)?;
    let locator = crate::anchor::TextLocator::new(cfg.matching.clone());

    let found = locator.locate(&document, anchor, from, role);

    match format {
        OutputFormat::Json => print_json(&found),
        OutputFormat::Text => {
            match found {
                Some(m) => {
                    let pos = offset_to_line_col(&document, m.offset);
                    println!("Strategy: {}", m.strategy.as_str());
                    println!("Bytes:    {}..{}", m.offset, m.end);
                    println!("Position: line {}, col {}", pos.line, pos.col);
                    if m.distance > 0 {
                        println!("Distance: {}", m.distance);
                    }
                    println!("Matched:  {:?}", &document[m.offset..m.end]);
                    println!("Context:  {}", extract_context(&document, m.offset, m.end, 120));
                }
                None => println!("Anchor not found: {:?}", anchor),
            }
            Ok(())
        }
    }
}

fn reconstruct_clause(path: &Path, start: &str, end: &str, format: OutputFormat) -> Result<()> {
    let cfg = config::config()?;
    let document = read_document(path, &cfg.safety)?;
    let locator = crate::anchor::TextLocator::new(cfg.matching.clone());

    let clause = reconstruct(&locator, &document, &Anchor::parse(start), &Anchor::parse(end));

    match format {
        OutputFormat::Json => print_json(&clause),
        OutputFormat::Text => {
            render::print_side("Clause", &clause, &document);
            Ok(())
        }
    }
}

fn parse(
    response_path: &Path,
    mode: AlignmentMode,
    documents: Option<(PathBuf, PathBuf)>,
    format: OutputFormat,
) -> Result<()> {
    let cfg = config::config()?;
    let raw = std::fs::read_to_string(response_path)
        .with_context(|| format!("Failed to read response file: {}", response_path.display()))?;
    let parsed = parse_response(&raw, mode);

    if let Some((doc_a_path, doc_b_path)) = documents {
        let doc_a = read_document(&doc_a_path, &cfg.safety)?;
        let doc_b = read_document(&doc_b_path, &cfg.safety)?;
        let locator = crate::anchor::TextLocator::new(cfg.matching.clone());
        let records: Vec<AlignmentRecord> = resolve_records(&locator, parsed, &doc_a, &doc_b);

        return match format {
            OutputFormat::Json => print_json(&records),
            OutputFormat::Text => {
                render::print_records(&records, &doc_a, &doc_b);
                Ok(())
            }
        };
    }

    match (&parsed, format) {
        (ParsedResponse::Records(records), OutputFormat::Json) => print_json(records),
        (ParsedResponse::Unparseable { .. }, OutputFormat::Json) => {
            print_json(&[AlignmentRecord::parse_failure(raw.as_str())])
        }
        (ParsedResponse::Records(records), OutputFormat::Text) => {
            render::print_parsed(records);
            Ok(())
        }
        (ParsedResponse::Unparseable { .. }, OutputFormat::Text) => {
            println!("No records could be parsed from {}", response_path.display());
            Ok(())
        }
    }
}

fn show_config() -> Result<()> {
    let cfg = config::config()?;

    render::banner("Clausealign Configuration");
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Generator:");
    println!("  Backend:     {:?}", cfg.generator.backend);
    println!("  Model:       {}", cfg.generator.model);
    println!("  Base URL:    {}", cfg.generator.base_url);
    println!(
        "  API key:     ${} ({})",
        cfg.generator.api_key_env,
        if std::env::var_os(&cfg.generator.api_key_env).is_some() {
            "set"
        } else {
            "not set"
        }
    );
    if let Some(command) = &cfg.generator.command {
        println!("  Command:     {} {}", command, cfg.generator.args.join(" "));
    }
    println!();
    println!("Matching:");
    println!("  Fuzzy:             {}", cfg.matching.fuzzy_enabled);
    println!("  Anchor distance:   {}", cfg.matching.anchor_max_distance);
    println!(
        "  Snippet distance:  min({}, {}% of length)",
        cfg.matching.snippet_max_distance,
        cfg.matching.snippet_distance_ratio * 100.0
    );
    println!("  Word fallback:     {}", cfg.matching.fallback_enabled);
    println!("  End boundary:      {:?}", cfg.matching.end_boundary);
    println!();
    println!("Safety limits:");
    println!("  Max generation calls: {}", cfg.safety.max_generation_calls);
    println!("  Max document size:    {} bytes", cfg.safety.max_document_bytes);
    println!("  Max response size:    {} bytes", cfg.safety.max_response_bytes);
    println!("  Call timeout:         {}s", cfg.safety.step_timeout_seconds);
    println!("  Operation timeout:    {}s", cfg.safety.operation_timeout_seconds);

    Ok(())
}

async fn health() -> Result<()> {
    let cfg = config::config()?;
    let generator = cfg.generator.build()?;
    let name = generator.name().to_string();

    generator
        .health_check()
        .await
        .with_context(|| format!("Generator '{}' is not healthy", name))?;

    println!("Generator '{}' is healthy", name);
    Ok(())
}
