//! CQL merge command-line interface

use clap::{Parser, Subcommand};
use colored::Colorize;
use cql_merge::{RawCql, export_cql, import_cql};
use cql_merge_diagnostics::{CQL0400, CQL0401, CqlError};
use std::path::{Path, PathBuf};

/// CQL merge command-line tool
#[derive(Parser)]
#[command(name = "cqlmerge")]
#[command(author, version, about = "Flatten a CQL library and its dependencies", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge a primary CQL file with its dependency files
    Merge {
        /// Primary CQL file
        primary: PathBuf,
        /// Dependency CQL files, in priority order
        #[arg(short, long = "dependency")]
        dependencies: Vec<PathBuf>,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Parse a CQL file and list its declarations
    Parse {
        /// CQL file to parse
        file: PathBuf,
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

fn main() {
    human_panic::setup_panic!();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Merge {
            primary,
            dependencies,
            output,
        } => run_merge(&primary, &dependencies, output.as_deref()),
        Commands::Parse { file, format } => run_parse(&file, &format),
    };

    if let Err(err) = result {
        if let Some(cql) = err.downcast_ref::<CqlError>() {
            eprintln!("{}", cql.to_diagnostic().render());
        } else {
            eprintln!("{}: {err:#}", "error".red().bold());
        }
        std::process::exit(1);
    }
}

fn read_raw(path: &Path) -> anyhow::Result<RawCql> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        let code = if e.kind() == std::io::ErrorKind::InvalidData {
            CQL0401
        } else {
            CQL0400
        };
        CqlError::system(code, format!("failed to read {}: {e}", path.display()))
    })?;
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned());
    Ok(match name {
        Some(name) => RawCql::new(content).with_name(name),
        None => RawCql::new(content),
    })
}

fn run_merge(
    primary: &Path,
    dependencies: &[PathBuf],
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let primary = read_raw(primary)?;
    let dependencies = dependencies
        .iter()
        .map(|p| read_raw(p))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let group = import_cql(primary, dependencies)?;
    for outcome in &group.dependencies {
        if let cql_merge::DependencyOutcome::Failed { name, error } = outcome {
            eprintln!(
                "{}: skipping dependency {}: {error}",
                "warning".yellow().bold(),
                name.as_deref().unwrap_or("<unnamed>")
            );
        }
    }

    let merged = export_cql(&group);
    match output {
        Some(path) => std::fs::write(path, merged).map_err(|e| {
            CqlError::system(CQL0400, format!("failed to write {}: {e}", path.display()))
        })?,
        None => print!("{merged}"),
    }
    Ok(())
}

fn run_parse(file: &Path, format: &str) -> anyhow::Result<()> {
    let raw = read_raw(file)?;
    let group = import_cql(raw, Vec::new())?;
    let library = &group.library;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&library.declarations)?);
        }
        _ => {
            if let Some(header) = &library.header {
                let version = header.version.as_deref().unwrap_or("-");
                println!("{} {} (version {})", "library".bold(), header.name, version);
            }
            for decl in &library.declarations {
                println!("  {:<10} {}", decl.kind().to_string().cyan(), decl.name());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_raw_missing_file_is_system_error() {
        let err = read_raw(Path::new("/nonexistent/missing.cql")).unwrap_err();
        let cql = err.downcast_ref::<CqlError>().unwrap();
        assert_eq!(cql.code(), CQL0400);
    }

    #[test]
    fn test_read_raw_attaches_file_stem_as_name() {
        let dir = std::env::temp_dir();
        let path = dir.join("CommonsHelpers.cql");
        std::fs::write(&path, "library CommonsHelpers").unwrap();
        let raw = read_raw(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(raw.name.as_deref(), Some("CommonsHelpers"));
    }
}
