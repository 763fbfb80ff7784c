//! Dry-run driver for the descriptor engine.
//!
//! ```text
//! cargo run --example srcfiles -- .srcfiles.yaml [.private/.srcfiles.yaml]
//! cargo run --example srcfiles -- --convert build/app.vcxproj [dest_dir]
//! ```
//!
//! Nothing is written; the diff a write would make is printed instead. With
//! a private descriptor the summary shows the merged view, but the diff only
//! covers the master descriptor. Set `RUST_LOG=debug` to see what the reader
//! and writer are doing.

use std::path::PathBuf;
use std::process::ExitCode;

use srcfiles_rs::convert;
use srcfiles_rs::{Descriptor, DescriptorReader, DescriptorWriter, WriteMode, WriteOutcome};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = match args.as_slice() {
        [flag, project, rest @ ..] if flag == "--convert" => {
            let dest = rest.first().map(PathBuf::from).unwrap_or_else(|| {
                PathBuf::from(project)
                    .parent()
                    .map(PathBuf::from)
                    .unwrap_or_default()
            });
            convert_project(project, dest)
        }
        [master] => update(master, None),
        [master, private] => update(master, Some(private)),
        _ => {
            eprintln!("usage: srcfiles <descriptor> [private descriptor]");
            eprintln!(
                "       srcfiles --convert <project file> [destination directory]"
            );
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn update(master: &str, private: Option<&String>) -> srcfiles_rs::Result<()> {
    let (merged, outcome) = preview_update(master, private)?;
    summarize(&merged);
    report(outcome);
    Ok(())
}

/// The merged view of `master` (with `private` layered on when given) and
/// the dry-run diff of the master descriptor against its own model. Overlay
/// values never show up as changes to the shared file.
fn preview_update(
    master: &str,
    private: Option<&String>,
) -> srcfiles_rs::Result<(Descriptor, WriteOutcome)> {
    let reader = DescriptorReader::new();
    let shared = reader.read(master)?;
    let outcome = DescriptorWriter::new(&shared).write_updates(master, WriteMode::DryRun)?;
    let merged = match private {
        Some(private) => reader.private(private).read(master)?,
        None => shared,
    };
    Ok((merged, outcome))
}

fn convert_project(project: &str, dest: PathBuf) -> srcfiles_rs::Result<()> {
    let conversion = convert::import_project(project, &dest)?;
    println!("{} -> {}", conversion.format, conversion.descriptor.path().display());
    summarize(&conversion.descriptor);
    report(conversion.write(WriteMode::DryRun)?);
    Ok(())
}

fn summarize(desc: &Descriptor) {
    println!("project: {}", desc.project_name().unwrap_or("<unnamed>"));
    println!("exe type: {}", desc.exe_type().as_str());
    if let Some(pch) = desc.pch_header() {
        println!("precompiled header: {pch}");
    }
    println!("sources: {}", desc.src_files().len());
    for diagnostic in desc.diagnostics() {
        println!("warning: {diagnostic}");
    }
}

fn report(outcome: WriteOutcome) {
    match outcome {
        WriteOutcome::Unchanged => println!("no changes"),
        WriteOutcome::Written => println!("written"),
        WriteOutcome::DryRun(diff) => {
            for line in diff {
                println!("{line}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use srcfiles_rs::OptionId;

    #[test]
    fn overlay_values_stay_out_of_the_master_diff() {
        let dir = tempfile::tempdir().unwrap();
        let master = dir.path().join(".srcfiles.yaml");
        let private = dir.path().join("private.yaml");
        std::fs::write(
            &master,
            "Options:\n    Project: demo\n    Exe_type: console\n    Pch: none\n    \
             Optimize: space\n    Warn: 4\n\nFiles:\n",
        )
        .unwrap();
        std::fs::write(&private, "Options:\n    Warn: 1\n").unwrap();

        let master = master.to_string_lossy().into_owned();
        let private = private.to_string_lossy().into_owned();
        let (merged, outcome) = preview_update(&master, Some(&private)).unwrap();
        assert_eq!(merged.option(OptionId::Warn), Some("1"));
        assert_eq!(outcome, WriteOutcome::Unchanged);
    }
}
