use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use geovc_ingest::BufferConfig;
use geovc_repo::{OpenOptions, Repository, CONFIG_FILE, REPO_DIR};
use geovc_store::{ConfigDatabase, FileConfigDatabase, RevObject, StorageType};
use geovc_types::ObjectId;
use geovc_worktree::{LoggingProgress, NodeRef};
use serde_json::json;
use tracing::debug;

use crate::cli::*;
use crate::input;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let dir = cli.repo.as_path();
    let output = cli.output;
    match cli.command {
        Command::Init(args) => cmd_init(dir, args, output),
        Command::Verify(args) => cmd_verify(dir, args, output),
        Command::Import(args) => cmd_import(dir, args, output),
        Command::Cat(args) => cmd_cat(dir, args, output),
        Command::Ls(args) => cmd_ls(dir, args, output),
        Command::Config(args) => cmd_config(dir, args, output),
    }
}

fn cmd_init(dir: &Path, args: InitArgs, output: OutputFormat) -> anyhow::Result<()> {
    let repo = Repository::init(dir, args.format)?;
    let root = repo.root().display().to_string();
    repo.close()?;

    match output {
        OutputFormat::Json => println!("{}", json!({ "root": root, "format": args.format.version() })),
        OutputFormat::Text => {
            println!("{} Initialized GeoVC repository in {}", "✓".green().bold(), root.bold());
            println!("  Object format: {}", args.format.version().cyan());
        }
    }
    Ok(())
}

fn cmd_verify(dir: &Path, args: VerifyArgs, output: OutputFormat) -> anyhow::Result<()> {
    let options = OpenOptions {
        read_only: true,
        format: args.format,
    };
    let repo = Repository::open(dir, options)?;
    repo.verify()?;

    let objects = StorageType::Objects.recorded(repo.config())?;
    let tree = StorageType::WorkingTree.recorded(repo.config())?;
    match output {
        OutputFormat::Json => println!(
            "{}",
            json!({ "objects": objects, "worktree": tree, "nodes": repo.tree().len() })
        ),
        OutputFormat::Text => {
            println!("{} Storage configuration verified", "✓".green().bold());
            for (label, record) in [("Objects", objects), ("Working tree", tree)] {
                if let Some((backend, version)) = record {
                    println!("  {label}: {} {}", backend.bold(), version.cyan());
                }
            }
            println!("  Nodes: {}", repo.tree().len());
        }
    }
    Ok(())
}

fn cmd_import(dir: &Path, args: ImportArgs, output: OutputFormat) -> anyhow::Result<()> {
    let schema = args.schema.as_deref().map(input::read_schema).transpose()?;
    let file = File::open(&args.file)
        .with_context(|| format!("failed to open {}", args.file.display()))?;

    debug!(file = %args.file.display(), tree = %args.tree, "importing features");
    let mut repo = Repository::open(dir, OpenOptions::default())?;
    if let Some(threshold) = args.threshold {
        repo.set_buffer_config(BufferConfig::with_threshold(threshold));
    }

    let mut buffer = repo
        .buffer()?
        .with_progress(Arc::new(LoggingProgress::default()));
    let mut read = 0usize;
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let feature = input::parse_feature(&line, schema.as_ref())
            .with_context(|| format!("{}:{}", args.file.display(), index + 1))?;
        buffer.put(args.tree.as_str(), feature)?;
        read += 1;
    }
    buffer.flush_all()?;
    let flushed = buffer.flushed_total();
    drop(buffer);

    let nodes = repo.tree().len();
    repo.close()?;

    match output {
        OutputFormat::Json => println!(
            "{}",
            json!({ "tree": args.tree, "read": read, "flushed": flushed, "nodes": nodes })
        ),
        OutputFormat::Text => {
            println!(
                "{} Imported {} features into {}",
                "✓".green().bold(),
                read.to_string().bold(),
                args.tree.yellow()
            );
            println!("  Working tree: {nodes} nodes");
        }
    }
    Ok(())
}

fn cmd_cat(dir: &Path, args: CatArgs, output: OutputFormat) -> anyhow::Result<()> {
    let id: ObjectId = args
        .id
        .parse()
        .with_context(|| format!("invalid object id {}", args.id))?;
    let repo = Repository::open(dir, OpenOptions::read_only())?;
    let object = repo.object(&id)?;

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&object)?),
        OutputFormat::Text => match object {
            RevObject::Schema(schema) => {
                println!("{} {}", "schema".cyan().bold(), schema.name().bold());
                for desc in schema.properties() {
                    let null = if desc.nullable { "" } else { " not null" };
                    println!("  {}: {}{}", desc.name, desc.binding, null.dimmed());
                }
            }
            RevObject::Feature(feature) => {
                println!("{} ({} values)", "feature".cyan().bold(), feature.len());
                for (i, value) in feature.values.iter().enumerate() {
                    println!("  [{i}] {}", serde_json::to_string(value)?);
                }
            }
        },
    }
    Ok(())
}

fn cmd_ls(dir: &Path, args: LsArgs, output: OutputFormat) -> anyhow::Result<()> {
    let repo = Repository::open(dir, OpenOptions::read_only())?;
    let tree = repo.tree();
    let nodes: Vec<&NodeRef> = match &args.tree {
        Some(path) => tree.children(path).collect(),
        None => tree.paths().filter_map(|p| tree.get(p)).collect(),
    };

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&nodes)?),
        OutputFormat::Text => {
            if nodes.is_empty() {
                println!("No features.");
            }
            for node in nodes {
                println!(
                    "{}  {}  {}",
                    node.object_id.short_hex().yellow(),
                    node.schema_id.short_hex().dimmed(),
                    node.path
                );
            }
        }
    }
    Ok(())
}

fn cmd_config(dir: &Path, args: ConfigArgs, output: OutputFormat) -> anyhow::Result<()> {
    let root = dir.join(REPO_DIR);
    if !root.is_dir() {
        bail!("not a geovc repository: {}", dir.display());
    }
    let config = FileConfigDatabase::open(root.join(CONFIG_FILE))?;

    match (args.key, args.value) {
        (Some(key), Some(value)) => {
            config.put(&key, &value)?;
            println!("Set {} = {}", key.bold(), value);
        }
        (Some(key), None) => match (config.get(&key)?, output) {
            (value, OutputFormat::Json) => println!("{}", json!({ key: value })),
            (Some(value), OutputFormat::Text) => println!("{value}"),
            (None, OutputFormat::Text) => println!("{} = (not set)", key.bold()),
        },
        (None, _) => {
            let entries = config.entries()?;
            match output {
                OutputFormat::Json => {
                    let map: serde_json::Map<_, _> = entries
                        .into_iter()
                        .map(|(k, v)| (k, serde_json::Value::String(v)))
                        .collect();
                    println!("{}", serde_json::Value::Object(map));
                }
                OutputFormat::Text => {
                    for (key, value) in entries {
                        println!("{} = {}", key.bold(), value);
                    }
                }
            }
        }
    }
    Ok(())
}
