//! CLI: catalog demos, plus check → decode → form over schema files.
use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use serde_json::Value;

use dynschema::catalog::{ExampleKind, Recipe};
use dynschema::interchange;
use dynschema::path_de::from_str_with_path;
use dynschema::{
    Report, ResolvedNode, SchemaNode, SchemaRegistry, SchemaValidator, ValidatorConfig, decode,
    decode_typed, describe_form,
};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// build, check and apply runtime schemas for structured generation output
#[derive(Parser, Debug)]
#[command(name = "dynschema", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// list the built-in example schemas
    Examples,
    /// print an example schema as a JSON-Schema style document
    Show(ShowOut),
    /// run an example end to end: resolve, validate, decode its sample, describe its form
    Demo(DemoOut),
    /// resolve and validate a schema document
    Check(SchemaSettings),
    /// decode generator output documents against a schema
    Decode(DecodeOut),
    /// print the form field descriptors of a schema
    Form(SchemaSettings),
}

#[derive(Args, Debug, Clone)]
struct ValidationSettings {
    /// maximum nesting depth accepted by validation
    #[arg(long, env = "DYNSCHEMA_MAX_DEPTH")]
    max_depth: Option<usize>,

    /// JSON file with validator settings (e.g. {"max_depth": 16}); flags win
    #[arg(long)]
    config: Option<PathBuf>,

    /// print findings as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Args, Debug, Clone)]
struct SchemaSettings {
    /// schema document (JSON-Schema style, with optional `$defs`)
    #[arg(long, short)]
    schema: PathBuf,

    /// resolve this `$defs` entry instead of the document root
    #[arg(long)]
    root: Option<String>,

    #[command(flatten)]
    validation: ValidationSettings,
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document.
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns or '-' for stdin
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct ShowOut {
    /// example id (see `dynschema examples`)
    example: ExampleKind,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct DemoOut {
    /// example id (see `dynschema examples`)
    example: ExampleKind,

    #[command(flatten)]
    validation: ValidationSettings,
}

#[derive(clap::Parser, Debug)]
struct DecodeOut {
    #[command(flatten)]
    schema: SchemaSettings,

    #[command(flatten)]
    input_settings: InputSettings,

    /// write decoded documents as NDJSON to this file
    #[arg(short, long)]
    out: Option<PathBuf>,
}

/// One input document and where it came from.
struct Document {
    source: String,
    value: Value,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    /// Returns `false` when the command ran but reported failures.
    pub fn run(&self) -> Result<bool> {
        match &self.cmd {
            Command::Examples => {
                for kind in ExampleKind::ALL {
                    println!(
                        "{:<20} {:<28} {:<13} {}",
                        kind.id().bold(),
                        kind.title(),
                        kind.complexity().label().cyan(),
                        kind.subtitle().dimmed(),
                    );
                }
                Ok(true)
            }
            Command::Show(target) => {
                let example = target.example.build()?;
                let document = interchange::document(&example.registry, &example.root);
                write_or_print(&serde_json::to_string_pretty(&document)?, target.out.as_ref())?;
                Ok(true)
            }
            Command::Demo(target) => run_demo(target),
            Command::Check(settings) => {
                let (registry, root) = settings.load()?;
                let Some((_, report)) = prepare(&registry, &root, &settings.validation)? else {
                    return Ok(false);
                };
                Ok(report.is_valid())
            }
            Command::Decode(target) => run_decode(target),
            Command::Form(settings) => {
                let (registry, root) = settings.load()?;
                let Some((resolved, report)) = prepare(&registry, &root, &settings.validation)? else {
                    return Ok(false);
                };
                if !report.is_valid() {
                    return Ok(false);
                }
                let fields = describe_form(&resolved);
                println!("{}", serde_json::to_string_pretty(&fields)?);
                Ok(true)
            }
        }
    }
}

fn run_demo(target: &DemoOut) -> Result<bool> {
    let example = target.example.build()?;
    println!("{} {}", "▶".cyan(), example.kind.title().bold());

    let Some((resolved, report)) = prepare(&example.registry, &example.root, &target.validation)? else {
        return Ok(false);
    };
    if !report.is_valid() {
        return Ok(false);
    }

    match decode(&resolved, &example.sample) {
        Ok(decoded) => {
            println!("{} sample decoded", "✓".green());
            println!("{}", serde_json::to_string_pretty(&decoded.encode())?);
        }
        Err(error) => {
            println!("{} {error}", "✗".red());
            return Ok(false);
        }
    }

    if example.kind == ExampleKind::GenerablePattern {
        let recipe: Recipe = decode_typed(&resolved, &example.sample)?;
        println!("{} typed: {recipe:?}", "✓".green());
    }

    println!("{}", "form fields".bold());
    for field in describe_form(&resolved) {
        let marker = if field.required { "*" } else { " " };
        println!("  {marker} {:<28} {:<20} {:?}", field.path, field.label, field.input);
    }
    Ok(true)
}

fn run_decode(target: &DecodeOut) -> Result<bool> {
    let (registry, root) = target.schema.load()?;
    let Some((resolved, report)) = prepare(&registry, &root, &target.schema.validation)? else {
        return Ok(false);
    };
    if !report.is_valid() {
        bail!("schema has validation errors; refusing to decode");
    }

    let documents = target.input_settings.load_documents()?;
    tracing::info!(documents = documents.len(), "decoding");

    // decoding is pure, so documents fan out freely
    let results: Vec<_> = documents
        .par_iter()
        .map(|doc| (doc, decode(&resolved, &doc.value)))
        .collect();

    let mut decoded_lines = Vec::new();
    let mut failures = 0usize;
    for (doc, result) in results {
        match result {
            Ok(decoded) => {
                eprintln!("{} {}", "✓".green(), doc.source);
                decoded_lines.push(serde_json::to_string(&decoded.encode())?);
            }
            Err(error) => {
                failures += 1;
                eprintln!("{} {}: {error}", "✗".red(), doc.source);
            }
        }
    }
    tracing::info!(failures, decoded = decoded_lines.len(), "decode finished");

    let ndjson = decoded_lines.join("\n");
    write_or_print(&ndjson, target.out.as_ref())?;
    Ok(failures == 0)
}

impl SchemaSettings {
    fn load(&self) -> Result<(SchemaRegistry, SchemaNode)> {
        let source = std::fs::read_to_string(&self.schema)
            .with_context(|| format!("failed to read schema file {}", self.schema.display()))?;
        let value: Value = serde_json::from_str(&source)
            .with_context(|| format!("failed to parse schema file {}", self.schema.display()))?;
        let document = interchange::from_json_schema(&value)
            .with_context(|| format!("invalid schema document {}", self.schema.display()))?;
        let (registry, root) = document.into_parts();
        tracing::debug!(definitions = registry.len(), "schema document loaded");
        match &self.root {
            None => Ok((registry, root)),
            Some(name) => Ok((registry, SchemaNode::reference(name.as_str())?)),
        }
    }
}

impl ValidationSettings {
    fn validator_config(&self) -> Result<ValidatorConfig> {
        let mut config = match &self.config {
            None => ValidatorConfig::default(),
            Some(path) => {
                let source = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config file {}", path.display()))?;
                from_str_with_path::<ValidatorConfig>(&source).map_err(|e| anyhow!(e))?
            }
        };
        if let Some(max_depth) = self.max_depth {
            config.max_depth = max_depth;
        }
        Ok(config)
    }
}

/// Resolve and validate, printing diagnostics. `None` when resolution failed.
fn prepare(
    registry: &SchemaRegistry,
    root: &SchemaNode,
    settings: &ValidationSettings,
) -> Result<Option<(ResolvedNode, Report)>> {
    let resolved = match registry.resolve(root) {
        Ok(resolved) => resolved,
        Err(error) => {
            tracing::warn!(%error, "resolution failed");
            eprintln!("{} {error}", "error:".red().bold());
            return Ok(None);
        }
    };
    let validator = SchemaValidator::new(settings.validator_config()?);
    let report = validator.validate(&resolved);
    tracing::info!(
        errors = report.errors().count(),
        warnings = report.warnings().count(),
        max_depth = validator.config().max_depth,
        "validation finished"
    );
    print_report(&report, settings.json)?;
    Ok(Some((resolved, report)))
}

fn print_report(report: &Report, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    for finding in &report.findings {
        let tag = if finding.is_error() {
            "error:".red().bold()
        } else {
            "warning:".yellow().bold()
        };
        eprintln!("{tag} {} {}", finding.path.to_string().dimmed(), finding.kind);
    }
    if report.is_valid() {
        eprintln!("{} schema is valid", "✓".green());
    }
    Ok(())
}

impl InputSettings {
    fn load_documents(&self) -> Result<Vec<Document>> {
        let mut out = Vec::new();
        for (source, text) in self.read_sources()? {
            let raw: Vec<(String, Value)> = if self.ndjson {
                text.lines()
                    .enumerate()
                    .filter(|(_, line)| !line.trim().is_empty())
                    .map(|(i, line)| {
                        let label = format!("{source}:{}", i + 1);
                        let value = serde_json::from_str(line)
                            .with_context(|| format!("invalid JSON at {label}"))?;
                        Ok((label, value))
                    })
                    .collect::<Result<_>>()?
            } else {
                let value = serde_json::from_str(&text).with_context(|| format!("invalid JSON in {source}"))?;
                vec![(source.clone(), value)]
            };
            for (label, value) in raw {
                for value in self.select(value, &label)? {
                    out.push(Document { source: label.clone(), value });
                }
            }
        }
        Ok(out)
    }

    fn read_sources(&self) -> Result<Vec<(String, String)>> {
        let mut sources = Vec::new();
        let (stdin, patterns): (Vec<&String>, Vec<&String>) =
            self.input.iter().partition(|raw| raw.as_str() == "-");
        if !stdin.is_empty() {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text).context("failed to read stdin")?;
            sources.push(("<stdin>".to_string(), text));
        }
        for path in resolve_file_path_patterns(patterns)? {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read input file {}", path.display()))?;
            sources.push((path.to_string_lossy().to_string(), text));
        }
        tracing::debug!(sources = sources.len(), "inputs resolved");
        Ok(sources)
    }

    /// Applies the JSON Pointer, then the jq filter.
    fn select(&self, value: Value, label: &str) -> Result<Vec<Value>> {
        let value = match &self.json_pointer {
            None => value,
            Some(pointer) => value
                .pointer(pointer)
                .cloned()
                .ok_or_else(|| anyhow!("JSON pointer {pointer} matched nothing in {label}"))?,
        };
        match &self.jq_expr {
            None => Ok(vec![value]),
            Some(expr) => crate::jq_exec::apply_filter(expr, &value)
                .with_context(|| format!("failed to apply jq expression to {label}")),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn write_or_print(text: &str, out: Option<&PathBuf>) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(out, text).with_context(|| format!("failed to write {}", out.display()))?;
        }
        None => println!("{text}"),
    }
    Ok(())
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                matched_any = true;
                out.push(entry?);
            }
            if !matched_any {
                // an explicit glob that matches nothing is a mistake, not an empty input
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn globs_expand_and_literals_pass_through() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.json", "b.json", "c.txt"] {
            std::fs::write(dir.path().join(name), "{}").unwrap();
        }
        let pattern = format!("{}/*.json", dir.path().display());
        let mut found = resolve_file_path_patterns([pattern.as_str(), "literal.json"]).unwrap();
        found.sort();
        assert_eq!(found.len(), 3);
        assert!(found.iter().any(|p| p.ends_with("a.json")));
        assert!(found.iter().any(|p| p == &PathBuf::from("literal.json")));

        let empty = format!("{}/*.yaml", dir.path().display());
        assert!(resolve_file_path_patterns([empty.as_str()]).is_err());
    }

    #[test]
    fn ndjson_with_pointer_selects_each_line() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("out.ndjson");
        std::fs::write(&file, "{\"data\":{\"n\":1}}\n\n{\"data\":{\"n\":2}}\n").unwrap();
        let settings = InputSettings {
            ndjson: true,
            json_pointer: Some("/data".into()),
            jq_expr: None,
            input: vec![file.to_string_lossy().to_string()],
        };
        let docs = settings.load_documents().unwrap();
        let values: Vec<&Value> = docs.iter().map(|d| &d.value).collect();
        assert_eq!(values, vec![&serde_json::json!({"n": 1}), &serde_json::json!({"n": 2})]);
        assert!(docs[1].source.ends_with(":3"));
    }

    #[test]
    fn cli_flag_overrides_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("validator.json");
        std::fs::write(&config, r#"{"max_depth": 8}"#).unwrap();
        let mut settings = ValidationSettings { max_depth: None, config: Some(config), json: false };
        assert_eq!(settings.validator_config().unwrap().max_depth, 8);
        settings.max_depth = Some(4);
        assert_eq!(settings.validator_config().unwrap().max_depth, 4);
    }
}
