//! Loader Codegen CLI
//!
//! Generates Rust loader modules from schema graphs and checks documents
//! against them.
//!
//! Usage:
//!   schema-codegen generate schema.yml -o src/loaders.rs
//!   schema-codegen generate schema.yml -o src/loaders.rs --check
//!   schema-codegen check schema.yml workflow.cwl
//!   schema-codegen loaders schema.yml
//!   schema-codegen config --init codegen.toml

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use familiar_codegen::codegen::{self, compile};
use familiar_codegen::eval::{default_base_uri, Evaluator};
use familiar_codegen::{CodegenConfig, SchemaDocument};
use similar::{ChangeTag, TextDiff};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-codegen")]
#[command(about = "Generate loader modules from linked-data schema graphs")]
struct Cli {
    /// Configuration file (defaults to codegen.toml and friends)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a schema into a Rust loader module
    Generate {
        /// Schema file or directory of schema files
        schema: PathBuf,

        /// Output file (stdout when neither this nor [output].path is set)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Compare with the existing output instead of writing it
        #[arg(long)]
        check: bool,
    },

    /// Validate a document against a schema
    Check {
        schema: PathBuf,
        document: PathBuf,

        /// Base URI for the document (defaults to its file URI)
        #[arg(long)]
        base: Option<String>,
    },

    /// List the loaders a schema compiles to
    Loaders { schema: PathBuf },

    /// Show the effective configuration, or write it out
    Config {
        #[arg(long)]
        init: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match CodegenConfig::load_from(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Error: failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli.command, config) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn run(command: Command, config: CodegenConfig) -> Result<i32> {
    match command {
        Command::Generate { schema, output, check } => {
            let output = output.or_else(|| config.output.path.clone());
            generate(&schema, output.as_deref(), check, &config)
        }
        Command::Check { schema, document, base } => check(&schema, &document, base, &config),
        Command::Loaders { schema } => loaders(&schema, &config),
        Command::Config { init } => {
            match init {
                Some(path) => {
                    config.save(&path).with_context(|| format!("writing {}", path))?;
                    eprintln!("✅ Wrote configuration to {}", path);
                }
                None => print!("{}", toml::to_string_pretty(&config)?),
            }
            Ok(0)
        }
    }
}

fn generate(schema: &Path, output: Option<&Path>, check: bool, config: &CodegenConfig) -> Result<i32> {
    let generated = codegen::generate_rust(schema, &config.compile, &config.render)
        .with_context(|| format!("compiling {}", schema.display()))?;

    for item in &generated.diagnostics {
        eprintln!("⚠️  {}", item);
    }

    let Some(output) = output else {
        if check {
            bail!("--check needs an output file");
        }
        print!("{}", generated.code);
        return Ok(0);
    };

    if check {
        let current = fs::read_to_string(output).unwrap_or_default();
        if current == generated.code {
            eprintln!("✅ {} is up to date", output.display());
            return Ok(0);
        }
        print_diff(&current, &generated.code, output);
        eprintln!("\n❌ {} is out of date, regenerate it", output.display());
        return Ok(1);
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, &generated.code).with_context(|| format!("writing {}", output.display()))?;
    eprintln!(
        "✅ Generated {} records, {} loaders -> {}",
        generated.record_count,
        generated.loader_count,
        output.display()
    );
    Ok(0)
}

fn print_diff(old: &str, new: &str, path: &Path) {
    let diff = TextDiff::from_lines(old, new);
    println!("--- {} (on disk)", path.display());
    println!("+++ {} (generated)", path.display());
    for hunk in diff.unified_diff().context_radius(3).iter_hunks() {
        println!("{}", hunk.header());
        for change in hunk.iter_changes() {
            let sign = match change.tag() {
                ChangeTag::Delete => "-",
                ChangeTag::Insert => "+",
                ChangeTag::Equal => " ",
            };
            print!("{}{}", sign, change);
            if change.missing_newline() {
                println!();
            }
        }
    }
}

fn check(schema: &Path, document: &Path, base: Option<String>, config: &CodegenConfig) -> Result<i32> {
    let schema = SchemaDocument::load(schema)?;
    let compiled = compile(&schema, &config.compile)?;
    let evaluator = Evaluator::new(&compiled.plan);

    let text = fs::read_to_string(document).with_context(|| format!("reading {}", document.display()))?;
    let uri = match base {
        Some(base) => base,
        None => document_uri(document),
    };

    match evaluator.load_document_by_string(&text, &uri, None) {
        Ok(node) => {
            let saved = evaluator.save_document(&node, &uri);
            println!("{}", serde_json::to_string_pretty(&saved)?);
            eprintln!("✅ {} is valid", document.display());
            Ok(0)
        }
        Err(e) => {
            eprintln!("❌ {} failed validation:", document.display());
            eprintln!("{}", e.report());
            Ok(1)
        }
    }
}

fn document_uri(path: &Path) -> String {
    fs::canonicalize(path)
        .ok()
        .and_then(|p| url::Url::from_file_path(p).ok())
        .map(|u| u.to_string())
        .unwrap_or_else(|| format!("{}{}", default_base_uri(), path.display()))
}

fn loaders(schema: &Path, config: &CodegenConfig) -> Result<i32> {
    let schema = SchemaDocument::load(schema)?;
    let compiled = compile(&schema, &config.compile)?;
    for descriptor in compiled.plan.loaders.values() {
        println!("{:<48} {}", descriptor.name, descriptor.kind);
    }
    println!("\nroot: {}", compiled.plan.root_loader);
    Ok(0)
}
