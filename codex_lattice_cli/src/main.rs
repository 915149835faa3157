// Codex Lattice Generator: CLI entry point.
//
// Builds a generator from a preset (or JSON config/schema files), selects
// records, and writes them as JSON lines. Logs go to stderr so stdout can be
// piped straight into another tool.
//
// Usage:
//   cargo run -p codex_lattice_cli -- [output.jsonl | -] [--preset nodes|depths]
//     [--config FILE] [--schema FILE] [--index N] [--where ATTR=VALUE]
//     [--min-score F] [--cache N]
//
// `--config` and `--schema` replace the preset's config or schema
// individually. `--where` matches a categorical label or the rendered value
// of a derived attribute. Set `RUST_LOG` to change verbosity.

use anyhow::{Context, Result, bail};
use codex_lattice_gen::export::write_jsonl;
use codex_lattice_gen::{ContentRecord, GeneratorConfig, IndexedContentGenerator, Schema};
use codex_lattice_tables::default_tables;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    init_tracing();
    let args: Vec<String> = std::env::args().collect();

    let output_path = args
        .get(1)
        .filter(|s| !s.starts_with("--"))
        .map(|s| s.as_str())
        .unwrap_or("-");
    let preset: String = parse_flag(&args, "--preset")?.unwrap_or_else(|| "nodes".to_string());
    let config_path: Option<String> = parse_flag(&args, "--config")?;
    let schema_path: Option<String> = parse_flag(&args, "--schema")?;
    let index: Option<i64> = parse_flag(&args, "--index")?;
    let filter: Option<String> = parse_flag(&args, "--where")?;
    let min_score: Option<f64> = parse_flag(&args, "--min-score")?;
    let cache: usize = parse_flag(&args, "--cache")?.unwrap_or(0);

    let tables = default_tables();
    let (config, schema) = match preset.as_str() {
        "nodes" => (GeneratorConfig::codex_nodes(&tables), Schema::codex_nodes()),
        "depths" => (GeneratorConfig::codex_depths(&tables), Schema::codex_depths()),
        other => bail!("unknown preset '{other}' (expected nodes or depths)"),
    };
    let config = match config_path {
        Some(path) => {
            let json = fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
            GeneratorConfig::from_json(&json).with_context(|| format!("parsing {path}"))?
        }
        None => config,
    };
    let schema = match schema_path {
        Some(path) => {
            let json = fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
            Schema::from_json(&json).with_context(|| format!("parsing {path}"))?
        }
        None => schema,
    };

    let generator = IndexedContentGenerator::new(config, schema)?.with_cache(cache);
    let filter = filter.as_deref().map(parse_filter).transpose()?;

    let records: Vec<Arc<ContentRecord>> = match index {
        Some(index) => vec![generator.generate(index)?],
        None => generator
            .find_by_predicate(|record| {
                let score_ok = min_score.is_none_or(|min| record.quality_score >= min);
                let filter_ok = filter
                    .as_ref()
                    .is_none_or(|(attribute, value)| matches_filter(record, attribute, value));
                score_ok && filter_ok
            })
            .iter()
            .collect(),
    };

    let written = if output_path == "-" {
        let stdout = io::stdout();
        let mut out = BufWriter::new(stdout.lock());
        write_jsonl(&records, &mut out)?
    } else {
        let file = fs::File::create(output_path)
            .with_context(|| format!("creating {output_path}"))?;
        let mut out = BufWriter::new(file);
        let written = write_jsonl(&records, &mut out)?;
        out.flush()?;
        written
    };

    info!(
        preset = %preset,
        records = written,
        output = output_path,
        "wrote records"
    );
    if let Some(stats) = generator.cache_stats() {
        info!(
            hits = stats.hits,
            misses = stats.misses,
            evictions = stats.evictions,
            "cache"
        );
    }
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();
}

/// The value after `flag`, if the flag is present. A flag with a missing or
/// unparsable value is an error.
fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Result<Option<T>> {
    let Some(position) = args.iter().position(|a| a == flag) else {
        return Ok(None);
    };
    let Some(raw) = args.get(position + 1) else {
        bail!("{flag} needs a value");
    };
    match raw.parse() {
        Ok(value) => Ok(Some(value)),
        Err(_) => bail!("{flag}: cannot parse '{raw}'"),
    }
}

fn parse_filter(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((attribute, value)) if !attribute.is_empty() => {
            Ok((attribute.to_string(), value.to_string()))
        }
        _ => bail!("--where expects ATTR=VALUE, got '{raw}'"),
    }
}

fn matches_filter(record: &ContentRecord, attribute: &str, value: &str) -> bool {
    if let Some(label) = record.category(attribute) {
        return label == value;
    }
    record
        .derived
        .get(attribute)
        .is_some_and(|scalar| scalar.to_string() == value)
}
