use anyhow::{Context, Result, bail};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};

use vm_hack::{SourceUnit, TranslateOptions, translate_program};

#[derive(Parser)]
#[command(name = "vm-hack")]
#[command(about = "Hack VM to Hack assembly translator")]
struct Cli {
    #[arg(help = "Input .vm file or directory containing .vm files")]
    input: PathBuf,

    #[arg(short, long, help = "Output .asm file (defaults next to the input)")]
    output: Option<PathBuf>,

    #[arg(
        long,
        help = "Emit the bootstrap sequence for a single-file input (directories always get it)"
    )]
    bootstrap: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let (units, default_output, bootstrap) = if cli.input.is_dir() {
        (
            read_directory(&cli.input)?,
            directory_output(&cli.input),
            true,
        )
    } else {
        (
            vec![read_unit(&cli.input)?],
            cli.input.with_extension("asm"),
            cli.bootstrap,
        )
    };

    let options = TranslateOptions { bootstrap };
    let program = translate_program(&units, &options);

    let output = cli.output.unwrap_or(default_output);
    let mut text = program.lines().join("\n");
    text.push('\n');
    fs::write(&output, text)
        .with_context(|| format!("Failed to write output to {}", output.display()))?;

    if program.diagnostics.is_empty() {
        println!("Translated {} -> {}", cli.input.display(), output.display());
    } else {
        for diagnostic in &program.diagnostics {
            eprintln!(
                "{}: `{}`: {}",
                diagnostic.unit, diagnostic.line, diagnostic.error
            );
        }
        println!(
            "Translated {} -> {} ({} lines skipped)",
            cli.input.display(),
            output.display(),
            program.diagnostics.len()
        );
    }

    Ok(())
}

fn read_unit(path: &Path) -> Result<SourceUnit> {
    if path.extension().is_none_or(|e| e != "vm") {
        bail!("{}: expected a .vm file", path.display());
    }
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_stem()
        .map_or_else(|| "Main".to_string(), |s| s.to_string_lossy().into_owned());
    Ok(SourceUnit::from_text(name, &contents))
}

/// Gather the directory's `.vm` files in name order, one unit per file.
fn read_directory(dir: &Path) -> Result<Vec<SourceUnit>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read directory {}", dir.display()))?;
    let mut paths: Vec<PathBuf> = entries
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|e| e == "vm"))
        .collect();
    paths.sort();
    if paths.is_empty() {
        bail!("no .vm files found in {}", dir.display());
    }
    paths.iter().map(|path| read_unit(path)).collect()
}

fn directory_output(dir: &Path) -> PathBuf {
    let stem = dir
        .file_name()
        .map_or_else(|| "out".to_string(), |n| n.to_string_lossy().into_owned());
    dir.join(format!("{stem}.asm"))
}
