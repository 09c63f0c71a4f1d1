//! Extract command - classify a captured OCR key/value dump offline.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use serde::Deserialize;
use tracing::debug;

use intake_core::{ClassifiedRecord, RawPair, SynonymTable, classify_record, extract_fields};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input JSON file: an array of {"key", "value"} pairs or a plain object
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Custom synonym table file
    #[arg(short, long)]
    table: Option<PathBuf>,

    /// Use the compact built-in synonym table
    #[arg(long, conflicts_with = "table")]
    compact: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

/// Both accepted input shapes. Object input loses the document's pair
/// order, so captures that care about duplicate-field overwrites should
/// use the array form.
#[derive(Deserialize)]
#[serde(untagged)]
enum PairsInput {
    Pairs(Vec<RawPair>),
    Map(serde_json::Map<String, serde_json::Value>),
}

pub async fn run(args: ExtractArgs) -> anyhow::Result<()> {
    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let table = if let Some(path) = &args.table {
        SynonymTable::from_file(path)?
    } else if args.compact {
        SynonymTable::compact()
    } else {
        SynonymTable::rich()
    };

    let content = fs::read_to_string(&args.input)?;
    let pairs = parse_pairs(&content)?;
    debug!("loaded {} raw pairs from {}", pairs.len(), args.input.display());

    let record = extract_fields(&pairs, &table);
    let classified = classify_record(record);

    let output = format_record(&classified, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    Ok(())
}

fn parse_pairs(content: &str) -> anyhow::Result<Vec<RawPair>> {
    let input: PairsInput = serde_json::from_str(content)
        .map_err(|e| anyhow::anyhow!("input is not a key/value dump: {e}"))?;

    let pairs = match input {
        PairsInput::Pairs(pairs) => pairs,
        PairsInput::Map(map) => map
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                RawPair::new(key, value)
            })
            .collect(),
    };
    Ok(pairs)
}

fn format_record(classified: &ClassifiedRecord, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(classified)?),
        OutputFormat::Text => Ok(format_text(classified)),
    }
}

fn format_text(classified: &ClassifiedRecord) -> String {
    let mut output = String::new();

    output.push_str(&format!("Schema: {}\n", classified.tag));
    if classified.record.is_empty() {
        output.push_str("No canonical fields matched.\n");
        return output;
    }

    output.push_str("Fields:\n");
    for (field, value) in classified.record.iter() {
        output.push_str(&format!("  {}: {}\n", field, value));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use intake_core::{CanonicalField, SchemaTag};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_pairs_array_form() {
        let pairs = parse_pairs(
            r#"[{"key": "Fecha: 2024-11-29", "value": ""}, {"key": "Total", "value": "99"}]"#,
        )
        .unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].key, "Fecha: 2024-11-29");
    }

    #[test]
    fn test_parse_pairs_object_form() {
        let pairs = parse_pairs(r#"{"Cliente": "Juan", "Total": "99"}"#).unwrap();
        assert_eq!(pairs.len(), 2);
        assert!(pairs.iter().any(|p| p.key == "Cliente" && p.value == "Juan"));
    }

    #[test]
    fn test_parse_pairs_rejects_garbage() {
        assert!(parse_pairs("42").is_err());
    }

    #[test]
    fn test_text_format() {
        let pairs = vec![RawPair::new("Cliente", "Juan")];
        let classified = classify_record(extract_fields(&pairs, &SynonymTable::rich()));
        assert_eq!(classified.tag, SchemaTag::Invoice);
        assert!(classified.record.contains(CanonicalField::ClientName));

        let text = format_text(&classified);
        assert!(text.starts_with("Schema: invoice\n"));
        assert!(text.contains("  client_name: Juan\n"));
    }
}
