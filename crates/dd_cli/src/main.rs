use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand};
use serde_json::{Map as JsonMap, Value as JsonValue, json};
use tracing_subscriber::EnvFilter;

use dd_core::{NameDirectory, Node, ResolvePolicy, decode, encode, name_hash};
use dd_core::files::{SAVE_COMPONENTS, component_for_path};
use dd_edit::{EditSession, parse, render};

#[derive(Debug, Parser)]
#[command(version, about = "Decode, edit, and re-encode game save containers")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// File of known field names to learn, one per line ('#' comments)
    #[arg(long, value_name = "FILE", global = true)]
    names: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Decode a save container into editable text
    Decode {
        #[arg(value_name = "SAVE.json")]
        path: PathBuf,
        /// Write text here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Keep every field key numeric, ignoring known names
        #[arg(long)]
        keep_numeric: bool,
    },
    /// Encode edited text back into a save container
    Encode {
        #[arg(value_name = "EDITED.txt")]
        path: PathBuf,
        /// Container file to write (typically the original SAVE.json)
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Validate edited text, reporting the first error position
    Check {
        #[arg(value_name = "EDITED.txt")]
        path: PathBuf,
    },
    /// Print the container hash of one or more field names
    Hash {
        #[arg(id = "hash_names", value_name = "NAME", required = true)]
        names: Vec<String>,
        #[arg(long)]
        json: bool,
    },
    /// Decode and re-encode a container, verifying byte identity
    Roundtrip {
        #[arg(value_name = "SAVE.json")]
        path: PathBuf,
    },
    /// List recognized save component files in a profile directory
    Scan {
        #[arg(value_name = "DIR")]
        dir: PathBuf,
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let directory = Arc::new(NameDirectory::new());
    if let Some(names_path) = &cli.names {
        learn_names_file(&directory, names_path)?;
    }

    match cli.command {
        Commands::Decode {
            path,
            output,
            keep_numeric,
        } => cmd_decode(&directory, &path, output.as_deref(), keep_numeric),
        Commands::Encode { path, output } => cmd_encode(&path, &output),
        Commands::Check { path } => cmd_check(&path),
        Commands::Hash { names, json } => cmd_hash(&names, json),
        Commands::Roundtrip { path } => cmd_roundtrip(&directory, &path),
        Commands::Scan { dir, json } => cmd_scan(&dir, json),
    }
}

fn learn_names_file(directory: &NameDirectory, path: &Path) -> Result<()> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read names file {}", path.display()))?;
    let names = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'));
    directory.learn_all(names);
    tracing::info!(count = directory.len(), "loaded name directory");
    Ok(())
}

fn read_save(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn cmd_decode(
    directory: &Arc<NameDirectory>,
    path: &Path,
    output: Option<&Path>,
    keep_numeric: bool,
) -> Result<()> {
    let bytes = read_save(path)?;
    let policy = if keep_numeric {
        ResolvePolicy::KeepNumeric
    } else {
        ResolvePolicy::ResolveKnown
    };
    let mut session = EditSession::with_policy(Arc::clone(directory), policy);
    let text = session
        .load_bytes(&bytes)
        .with_context(|| format!("failed to decode {}", path.display()))?;

    match output {
        Some(out) => fs::write(out, text)
            .with_context(|| format!("failed to write {}", out.display()))?,
        None => print!("{text}"),
    }
    Ok(())
}

fn cmd_encode(path: &Path, output: &Path) -> Result<()> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let tree = parse(&text).with_context(|| format!("failed to parse {}", path.display()))?;
    let bytes = encode(&tree);
    fs::write(output, bytes).with_context(|| format!("failed to write {}", output.display()))?;
    Ok(())
}

fn cmd_check(path: &Path) -> Result<()> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    match parse(&text) {
        Ok(tree) => {
            println!("ok: root is {}", describe_root(&tree));
            Ok(())
        }
        Err(err) => bail!("{err}"),
    }
}

fn describe_root(tree: &Node) -> String {
    match tree {
        Node::Object(fields) => format!("an object with {} field(s)", fields.len()),
        Node::Array(items) => format!("an array with {} item(s)", items.len()),
        Node::Int(_) => "an integer".to_string(),
        Node::Float(_) => "a float".to_string(),
        Node::Bool(_) => "a boolean".to_string(),
        Node::String(_) => "a string".to_string(),
        Node::HashRef(_) => "a hash reference".to_string(),
    }
}

fn cmd_hash(names: &[String], json: bool) -> Result<()> {
    if json {
        let mut map = JsonMap::new();
        for name in names {
            map.insert(name.clone(), JsonValue::from(name_hash(name)));
        }
        println!("{}", serde_json::to_string_pretty(&JsonValue::Object(map))?);
    } else {
        for name in names {
            println!("{name}\t{}", name_hash(name));
        }
    }
    Ok(())
}

fn cmd_roundtrip(directory: &NameDirectory, path: &Path) -> Result<()> {
    let bytes = read_save(path)?;
    let tree = decode(&bytes, directory, ResolvePolicy::ResolveKnown)
        .with_context(|| format!("failed to decode {}", path.display()))?;

    // Exercise the full edit pipeline, not just the binary codec.
    let reparsed =
        parse(&render(&tree)).context("rendered text failed to re-parse; renderer defect")?;
    let reencoded = encode(&reparsed);

    if reencoded != bytes {
        let first_diff = bytes
            .iter()
            .zip(&reencoded)
            .position(|(a, b)| a != b)
            .unwrap_or_else(|| bytes.len().min(reencoded.len()));
        bail!(
            "round-trip mismatch for {}: {} -> {} bytes, first difference at {first_diff}",
            path.display(),
            bytes.len(),
            reencoded.len()
        );
    }
    println!("ok: {} bytes round-trip exactly", bytes.len());
    Ok(())
}

fn cmd_scan(dir: &Path, json: bool) -> Result<()> {
    let mut found = Vec::new();
    for entry in
        fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?
    {
        let entry = entry?;
        if let Some(component) = component_for_path(&entry.path()) {
            found.push((component, entry.path()));
        }
    }
    found.sort_by_key(|(component, _)| {
        SAVE_COMPONENTS
            .iter()
            .position(|c| c.stem == component.stem)
    });

    if json {
        let items: Vec<JsonValue> = found
            .iter()
            .map(|(component, path)| {
                json!({
                    "stem": component.stem,
                    "label": component.label,
                    "path": path.display().to_string(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if found.is_empty() {
        println!("no save components in {}", dir.display());
    } else {
        for (component, path) in &found {
            println!("{}\t{}\t{}", component.stem, component.label, path.display());
        }
    }
    Ok(())
}
