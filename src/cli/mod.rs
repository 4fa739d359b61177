use anyhow::{Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

mod progress;

use billcopy::contexts::{
    BatchOutcome, CancellationToken, ClientConfig, GenerationOrchestrator, HttpGenerationClient, constraint_enforcer,
};
use billcopy::data::{GenerationRequest, GenerationResult, LimitSpec, StyleRuleSet};
use billcopy::registries::{EnvCredentialProvider, FileHistoryLog, FileStylePresetRegistry, StylePresetRegistry};
use progress::{ItemStatus, ProgressIndicator};

#[derive(Clone)]
pub struct Config {
    pub verbose: bool,
    pub dry_run: bool,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub api_key_env: Option<String>,
    /// History file override; `None` uses the log's own default location
    pub history: Option<PathBuf>,
    pub no_history: bool,
    pub presets_dir: Option<PathBuf>,
}

impl Config {
    fn client_config(&self) -> ClientConfig {
        let defaults = ClientConfig::default();
        ClientConfig {
            endpoint: self.endpoint.clone().unwrap_or(defaults.endpoint),
            model: self.model.clone().unwrap_or(defaults.model),
            api_version: defaults.api_version,
            max_tokens: self.max_tokens,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }

    fn history_log(&self) -> Option<FileHistoryLog> {
        if self.no_history {
            None
        } else {
            Some(FileHistoryLog::new(self.history.clone()))
        }
    }
}

/// Style options shared by commands that build a rule set
#[derive(Args, Default, Clone)]
pub struct StyleArgs {
    #[arg(long, help = "Start from a saved style preset")]
    pub preset: Option<String>,

    #[arg(long, help = "Use British English spelling")]
    pub british_english: bool,

    #[arg(long, help = "Never end a version with a full stop")]
    pub no_full_stops: bool,

    #[arg(long, help = "Include genre/tone descriptors where space allows")]
    pub include_descriptors: bool,

    #[arg(long, help = "Avoid repeated words and phrases")]
    pub avoid_repetition: bool,

    #[arg(long = "forbid", help = "A word the output must never use (repeatable)")]
    pub forbidden_words: Vec<String>,

    #[arg(long, help = "Extra instructions appended to the prompt")]
    pub instructions: Option<String>,
}

/// A batch job file
#[derive(Debug, Deserialize)]
struct BatchJob {
    #[serde(default)]
    preset: Option<String>,
    #[serde(default)]
    style: Option<StyleRuleSet>,
    limits: Vec<LimitSpec>,
    #[serde(default)]
    delay_ms: Option<u64>,
    items: Vec<BatchItem>,
}

#[derive(Debug, Deserialize)]
struct BatchItem {
    #[serde(default)]
    id: Option<String>,
    source: String,
}

/// One line of batch output; failed items carry the error sentinel as their result
#[derive(Debug, Serialize)]
struct BatchRecord {
    id: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    result: GenerationResult,
}

impl BatchRecord {
    fn new(id: &str, request: &GenerationRequest, outcome: BatchOutcome) -> Self {
        let status = ItemStatus::of(&outcome).as_str();
        match outcome {
            Ok(result) => Self {
                id: id.to_string(),
                status,
                error_kind: None,
                error: None,
                result,
            },
            Err(e) => Self {
                id: id.to_string(),
                status,
                error_kind: Some(e.kind().as_str()),
                error: Some(e.to_string()),
                result: GenerationResult::error_sentinel(&request.limits, &e.to_string()),
            },
        }
    }
}

pub fn read_source(source: Option<String>, source_file: Option<PathBuf>) -> Result<String> {
    match (source, source_file) {
        (Some(text), _) => Ok(text),
        (None, Some(path)) => fs::read_to_string(&path)
            .with_context(|| format!("Failed to read source file: {}", path.display())),
        (None, None) => anyhow::bail!("Provide the source copy with --source or --source-file"),
    }
}

fn parse_limits(raw: &[String]) -> Result<Vec<LimitSpec>> {
    raw.iter()
        .map(|s| s.parse::<LimitSpec>().with_context(|| format!("Invalid --limit '{}'", s)))
        .collect()
}

fn load_preset(name: &str, config: &Config) -> Result<StyleRuleSet> {
    FileStylePresetRegistry::new(config.presets_dir.clone())
        .get_preset(name)
        .with_context(|| format!("Failed to load style preset '{}'", name))
}

/// Layers command-line style flags over `base`: flags can switch rules on,
/// add forbidden words and replace the custom instructions
fn apply_style_args(mut base: StyleRuleSet, args: &StyleArgs) -> StyleRuleSet {
    base.british_english |= args.british_english;
    base.no_full_stops |= args.no_full_stops;
    base.include_descriptors |= args.include_descriptors;
    base.avoid_repetition |= args.avoid_repetition;
    for word in &args.forbidden_words {
        if !base.forbidden_words.iter().any(|w| w.eq_ignore_ascii_case(word)) {
            base.forbidden_words.push(word.clone());
        }
    }
    if let Some(instructions) = &args.instructions {
        base.custom_instructions = instructions.clone();
    }
    base
}

fn build_orchestrator(config: &Config) -> Result<GenerationOrchestrator<HttpGenerationClient, EnvCredentialProvider>> {
    let client = HttpGenerationClient::new(config.client_config()).context("Failed to create generation client")?;
    let credentials = EnvCredentialProvider::new(config.api_key_env.clone());

    let mut orchestrator = GenerationOrchestrator::new(client, credentials);
    if let Some(log) = config.history_log() {
        orchestrator = orchestrator.with_history(std::sync::Arc::new(log));
    }
    Ok(orchestrator)
}

/// Prints over-limit variants and style findings to stderr
fn report_issues(name: &str, result: &GenerationResult) {
    for violation in &result.violations {
        eprintln!("\u{001b}[31mover limit\u{001b}[0m {}: {}", name, violation);
    }
    for finding in &result.style_findings {
        eprintln!("\u{001b}[33mstyle\u{001b}[0m {}: {}", name, finding);
    }
}

pub async fn generate(source: String, limits: Vec<String>, style: StyleArgs, config: &Config) -> Result<()> {
    let limits = parse_limits(&limits)?;
    let base = match &style.preset {
        Some(name) => load_preset(name, config)?,
        None => StyleRuleSet::default(),
    };
    let request = GenerationRequest::new(source, apply_style_args(base, &style), limits);

    let orchestrator = build_orchestrator(config)?;

    if config.dry_run {
        let prompt = orchestrator.preview(&request)?;
        println!("{}", prompt.text);
        return Ok(());
    }

    if config.verbose {
        println!("Generating {} variant(s)", request.limits.len());
    }

    let outcome = orchestrator.generate_one(&request).await;
    orchestrator.flush_history().await;
    let result = outcome.map_err(|e| anyhow::anyhow!("Generation failed [{}]: {}", e.kind().as_str(), e))?;

    report_issues("generate", &result);
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}

pub async fn batch(job_path: PathBuf, output: Option<PathBuf>, config: &Config) -> Result<()> {
    let content = fs::read_to_string(&job_path)
        .with_context(|| format!("Failed to read batch job: {}", job_path.display()))?;
    let job: BatchJob = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse batch job: {}", job_path.display()))?;

    if job.items.is_empty() {
        println!("No items found in batch job");
        return Ok(());
    }

    let base = match (&job.preset, &job.style) {
        (_, Some(style)) => style.clone(),
        (Some(name), None) => load_preset(name, config)?,
        (None, None) => StyleRuleSet::default(),
    };

    let ids: Vec<String> = job
        .items
        .iter()
        .enumerate()
        .map(|(idx, item)| item.id.clone().unwrap_or_else(|| format!("item-{}", idx + 1)))
        .collect();
    let requests: Vec<GenerationRequest> = job
        .items
        .iter()
        .map(|item| GenerationRequest::new(item.source.clone(), base.clone(), job.limits.clone()))
        .collect();

    let mut orchestrator = build_orchestrator(config)?;
    if let Some(ms) = job.delay_ms {
        orchestrator = orchestrator.with_batch_delay(Duration::from_millis(ms));
    }

    if config.dry_run {
        for (id, request) in ids.iter().zip(&requests) {
            println!("=== {} ===", id);
            match orchestrator.preview(request) {
                Ok(prompt) => println!("{}", prompt.text),
                Err(e) => eprintln!("✗ {}: {}", id, e),
            }
        }
        return Ok(());
    }

    let cancel = CancellationToken::new();
    {
        let token = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("Cancelling after the current item...");
                token.cancel();
            }
        });
    }

    eprintln!("Generating variants for {} item(s)", requests.len());
    let mut progress = ProgressIndicator::new(requests.len());
    progress.start_item(&ids[0]);

    let outcomes = orchestrator
        .generate_batch_with(&requests, &cancel, |idx, outcome| {
            progress.complete_item(&ids[idx], ItemStatus::of(outcome));
            match outcome {
                Ok(result) => report_issues(&ids[idx], result),
                Err(e) if ItemStatus::of(outcome) == ItemStatus::Failed => {
                    eprintln!("✗ Failed to generate {}: {}", ids[idx], e);
                }
                Err(_) => {}
            }
            if let Some(next) = ids.get(idx + 1) {
                if !cancel.is_cancelled() {
                    progress.start_item(next);
                }
            }
        })
        .await;

    progress.finish();
    orchestrator.flush_history().await;

    let records: Vec<BatchRecord> = ids
        .iter()
        .zip(&requests)
        .zip(outcomes)
        .map(|((id, request), outcome)| BatchRecord::new(id, request, outcome))
        .collect();
    let json = serde_json::to_string_pretty(&records).context("Failed to serialize batch results")?;

    match output {
        Some(path) => {
            fs::write(&path, json).with_context(|| format!("Failed to write results: {}", path.display()))?;
            println!("Results written to {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}

pub fn history(last: usize, config: &Config) -> Result<()> {
    let Some(log) = config.history_log() else {
        println!("History is disabled");
        return Ok(());
    };

    let entries = log.load()?;
    if entries.is_empty() {
        println!("No history recorded at {}", log.path().display());
        return Ok(());
    }

    for entry in entries.iter().rev().take(last) {
        println!("{}  {}", entry.timestamp, &entry.fingerprint[..12.min(entry.fingerprint.len())]);
        println!("  {}", shorten(&entry.source_text, 70));
        for variant in &entry.result.variants {
            let marker = if entry.result.is_violated(&variant.label) { " OVER LIMIT" } else { "" };
            println!(
                "  {} [{}/{} {}]{}: {}",
                variant.label,
                constraint_enforcer::measure(&variant.text, variant.unit),
                variant.bound,
                variant.unit,
                marker,
                variant.text
            );
        }
        println!();
    }

    Ok(())
}

pub fn presets(config: &Config) -> Result<()> {
    let names = FileStylePresetRegistry::new(config.presets_dir.clone()).list()?;
    if names.is_empty() {
        println!("No style presets found");
    }
    for name in names {
        println!("{}", name);
    }
    Ok(())
}

fn shorten(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}…", cut.trim_end())
}
