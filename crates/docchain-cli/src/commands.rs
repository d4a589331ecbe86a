use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use docchain_codec::{decode_value, flatten_json};
use docchain_sdk::{DocumentManager, InMemoryKvEngine, ManagerConfig};
use docchain_types::PropertyEntryList;
use serde_json::json;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref(), cli.workers)?;
    match cli.command {
        Command::Store(args) => cmd_store(args, config, cli.format).await,
        Command::Flatten(args) => cmd_flatten(args, cli.format),
    }
}

fn load_config(path: Option<&Path>, workers: Option<usize>) -> anyhow::Result<ManagerConfig> {
    let config = match path {
        Some(path) => ManagerConfig::load(path)?,
        None => ManagerConfig::default(),
    };
    let config = match workers {
        Some(workers) => config.with_workers(workers),
        None => config,
    };
    config.validate()?;
    Ok(config)
}

fn read_input(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

async fn cmd_store(args: StoreArgs, config: ManagerConfig, format: OutputFormat) -> anyhow::Result<()> {
    let raw = read_input(&args.input)?;
    let manager = DocumentManager::new(Arc::new(InMemoryKvEngine::new()), config)?;

    let stored = manager.store_document(&args.id, &raw).await?;
    let read = manager.get_document(&args.id).await?;
    let verified = manager.verify_document(&args.id, &stored.hash).await?;

    match format {
        OutputFormat::Json => {
            let document: serde_json::Value = serde_json::from_slice(&read.payload)?;
            let report = json!({
                "id": &args.id,
                "index": stored.index,
                "hash": stored.hash,
                "verified": verified,
                "document": document,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            println!("{} Stored {}", "✓".green().bold(), args.id.bold());
            println!("  Manifest index: {}", stored.index.to_string().yellow());
            println!("  Hash: {}", stored.hash.cyan());
            if verified {
                println!("  Integrity: {}", "verified".green());
            } else {
                println!("  Integrity: {}", "MISMATCH".red().bold());
            }
            println!("  Document: {}", read.payload_str());
        }
    }

    if !verified {
        anyhow::bail!("document {} failed verification", args.id);
    }
    Ok(())
}

fn cmd_flatten(args: FlattenArgs, format: OutputFormat) -> anyhow::Result<()> {
    let raw = read_input(&args.input)?;
    let mut properties = flatten_json(&args.id, &raw)?;
    properties.sort_by_path();

    let rows = render(&properties)?;
    match format {
        OutputFormat::Json => {
            let list: Vec<_> = rows
                .into_iter()
                .map(|(path, value)| json!({ "path": path, "value": value }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&list)?);
        }
        OutputFormat::Text => {
            for (path, value) in rows {
                println!("{} = {}", path.cyan(), value);
            }
            println!("{} properties", properties.len().to_string().bold());
        }
    }
    Ok(())
}

/// Each property's path with its value decoded back to JSON.
fn render(properties: &PropertyEntryList) -> anyhow::Result<Vec<(String, serde_json::Value)>> {
    properties
        .iter()
        .map(|entry| -> anyhow::Result<(String, serde_json::Value)> {
            let parts = entry.dissect()?;
            let value = decode_value(parts.value_type, &entry.value, &entry.path)?;
            Ok((entry.path.clone(), value.to_json()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use docchain_types::PropertyEntry;
    use std::io::Write;

    #[test]
    fn workers_flag_overrides_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "num_workers = 3\nqueue_capacity = 7").unwrap();

        let config = load_config(Some(file.path()), Some(12)).unwrap();
        assert_eq!(config.num_workers, 12);
        assert_eq!(config.queue_capacity, 7);

        let config = load_config(Some(file.path()), None).unwrap();
        assert_eq!(config.num_workers, 3);
    }

    #[test]
    fn zero_workers_flag_is_rejected() {
        assert!(load_config(None, Some(0)).is_err());
    }

    #[test]
    fn render_decodes_values() {
        let properties: PropertyEntryList = vec![
            PropertyEntry::new("d/a/string", b"x".to_vec()),
            PropertyEntry::new("d/b/[0.1]/float64", 2.0f64.to_be_bytes().to_vec()),
        ]
        .into();
        let rows = render(&properties).unwrap();
        assert_eq!(rows[0], ("d/a/string".to_string(), json!("x")));
        assert_eq!(rows[1], ("d/b/[0.1]/float64".to_string(), json!(2)));
    }

    #[tokio::test]
    async fn store_command_roundtrips_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"a":"x","b":[1,2,3]}}"#).unwrap();
        let args = StoreArgs {
            id: "doc1".into(),
            input: file.path().to_path_buf(),
        };
        let config = ManagerConfig::default().with_workers(2);
        cmd_store(args, config, OutputFormat::Json).await.unwrap();
    }

    #[test]
    fn flatten_command_rejects_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1,").unwrap();
        let args = FlattenArgs {
            id: "doc1".into(),
            input: file.path().to_path_buf(),
        };
        assert!(cmd_flatten(args, OutputFormat::Text).is_err());
    }
}
