//! Command-line interface.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use quill_dom::{NodeId, print_tree};
use quill_markup::{DEFAULT_CHARSET, Document, PlaceholderRegistry};
use quill_validator::{
    Format, Severity, SpecRepository, ValidationFinding, ValidationOptions, Validator,
};

/// Quill - reversible markup transcoding and tag spec validation.
#[derive(Parser)]
#[command(name = "quill")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Encode, parse, serialize and decode a file, printing the result.
    Roundtrip {
        /// HTML file to read
        file: PathBuf,

        /// Treat the file as body content rather than a full document
        #[arg(long)]
        fragment: bool,

        /// Fixed placeholder salt, for reproducible intermediate output
        #[arg(long)]
        salt: Option<String>,

        /// Print an outline of the parsed (still encoded) tree first
        #[arg(long)]
        tree: bool,
    },

    /// Validate a file and report every finding.
    Validate {
        /// HTML file to read
        file: PathBuf,

        /// Treat the file as body content rather than a full document
        #[arg(long)]
        fragment: bool,

        /// Only apply rules for this format (amp, amp4ads, amp4email)
        #[arg(long)]
        format: Option<Format>,

        /// JSON rule set to use instead of the built-in one
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Reject global attributes the matched rule does not declare
        #[arg(long)]
        strict_attributes: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the loaded tag specs, or the specs for one tag.
    Rules {
        /// JSON rule set to use instead of the built-in one
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Only show specs for this tag, with their attributes
        tag: Option<String>,
    },
}

/// Run the CLI.
pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Roundtrip {
            file,
            fragment,
            salt,
            tree,
        } => roundtrip_command(&file, fragment, salt, tree),
        Commands::Validate {
            file,
            fragment,
            format,
            rules,
            strict_attributes,
            json,
        } => {
            let mut options = ValidationOptions::default();
            if let Some(format) = format {
                options = options.with_format(format);
            }
            if strict_attributes {
                options = options.with_strict_attributes();
            }
            validate_command(&file, fragment, rules.as_deref(), options, json)
        }
        Commands::Rules { rules, tag } => rules_command(rules.as_deref(), tag.as_deref()),
    }
}

fn read_document(file: &Path, fragment: bool, registry: PlaceholderRegistry) -> Result<Document> {
    let html = fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    let document = if fragment {
        Document::from_fragment_with_registry(&html, DEFAULT_CHARSET, registry)
    } else {
        Document::parse_with_registry(&html, registry)
    }
    .with_context(|| format!("failed to parse {}", file.display()))?;

    for issue in document.parse_issues() {
        tracing::debug!(token = issue.token_index, "{}", issue.message);
    }
    Ok(document)
}

/// Load a rule file, or fall back to the built-in rules.
fn load_rules(rules: Option<&Path>) -> Result<Option<SpecRepository>> {
    let Some(path) = rules else {
        return Ok(None);
    };
    let json = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let repository =
        SpecRepository::from_json(&json).with_context(|| format!("failed to load rules from {}", path.display()))?;
    Ok(Some(repository))
}

fn builtin_rules() -> Result<&'static SpecRepository> {
    SpecRepository::builtin().map_err(|e| anyhow!("built-in rules failed to load: {e}"))
}

fn roundtrip_command(file: &Path, fragment: bool, salt: Option<String>, tree: bool) -> Result<ExitCode> {
    let registry = salt.map_or_else(PlaceholderRegistry::new, PlaceholderRegistry::with_salt);
    let document = read_document(file, fragment, registry)?;
    if tree {
        println!("{}", "=== Encoded tree ===".bold());
        print_tree(document.tree(), NodeId::ROOT, 0);
        println!("{}", "=== Output ===".bold());
    }
    let output = if fragment {
        document.body_content()
    } else {
        document.to_html()
    };
    println!("{output}");
    Ok(ExitCode::SUCCESS)
}

fn validate_command(
    file: &Path,
    fragment: bool,
    rules: Option<&Path>,
    options: ValidationOptions,
    json: bool,
) -> Result<ExitCode> {
    let document = read_document(file, fragment, PlaceholderRegistry::new())?;
    let custom = load_rules(rules)?;
    let repository = match &custom {
        Some(repository) => repository,
        None => builtin_rules()?,
    };
    let report = Validator::new(repository, options).validate(&document);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for finding in &report.findings {
            print_finding(finding);
        }
        let errors = report.errors().count();
        let warnings = report.warnings().count();
        if report.is_valid() {
            println!(
                "{} {} ({warnings} warnings)",
                "PASS".green().bold(),
                file.display()
            );
        } else {
            println!(
                "{} {} ({errors} errors, {warnings} warnings)",
                "FAIL".red().bold(),
                file.display()
            );
        }
    }

    Ok(if report.is_valid() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_finding(finding: &ValidationFinding) {
    let severity = match finding.severity {
        Severity::Error => format!("{}", "error".red().bold()),
        Severity::Warning => format!("{}", "warning".yellow().bold()),
    };
    let location = if finding.path.is_empty() {
        "document".to_string()
    } else {
        finding.path.clone()
    };
    println!(
        "{severity} [{}] {}: {}",
        finding.code,
        location.cyan(),
        finding.message
    );
}

fn rules_command(rules: Option<&Path>, tag: Option<&str>) -> Result<ExitCode> {
    let custom = load_rules(rules)?;
    let repository = match &custom {
        Some(repository) => repository,
        None => builtin_rules()?,
    };

    let Some(tag) = tag else {
        for (_, compiled) in repository.iter() {
            let spec = compiled.spec();
            println!("{:<24} {}", spec.tag_name.cyan(), spec.name());
        }
        println!("{} specs", repository.len());
        return Ok(ExitCode::SUCCESS);
    };

    let ids = repository.tag_specs_for(tag);
    if ids.is_empty() {
        println!("no specs for '{tag}'");
        return Ok(ExitCode::FAILURE);
    }
    for compiled in ids.iter().filter_map(|&id| repository.spec(id)) {
        let spec = compiled.spec();
        println!("{}", spec.name().bold());
        let formats: Vec<String> = spec.html_format.iter().map(ToString::to_string).collect();
        if !formats.is_empty() {
            println!("  formats: {}", formats.join(", "));
        }
        if let Some(parent) = &spec.mandatory_parent {
            println!("  parent: {parent}");
        }
        if let Some(ancestor) = &spec.mandatory_ancestor {
            println!("  ancestor: {ancestor}");
        }
        if !spec.requires_extension.is_empty() {
            println!("  requires: {}", spec.requires_extension.join(", "));
        }
        for attr in compiled.attrs() {
            let marker = if attr.mandatory { "*" } else { " " };
            println!("  {marker} {}", attr.name);
        }
    }
    Ok(ExitCode::SUCCESS)
}
