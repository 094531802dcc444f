use crate::cache::ProcessEnv;
use crate::cli::setup::inspect;
use crate::setup::{SetupError, load_setup};
use owo_colors::OwoColorize;
use std::path::PathBuf;

pub fn check(path: PathBuf, plain: bool) -> anyhow::Result<()> {
    let loaded = match load_setup(&path) {
        Ok(loaded) => loaded,
        Err(err) => {
            print_setup_error(&err, plain);
            return Err(err.into());
        }
    };

    let setup = &loaded.setup;
    println!("✔ Setup loaded successfully");
    println!("✔ {} files", setup.files.len());
    println!("✔ {} aliases", setup.aliases.len());
    println!("✔ {} global headers", setup.global_headers.len());
    println!(
        "✔ {} files with environment replacements",
        setup
            .all_files()
            .filter(|f| !f.env_replacements.is_empty())
            .count()
    );
    match &setup.catch_all_file {
        Some(file) => println!("✔ catch-all file {}", file.path),
        None => println!("✔ no catch-all file"),
    }

    let report = inspect(&loaded, &ProcessEnv);
    if plain {
        report.render_plain();
    } else {
        report.render_pretty();
    }

    Ok(())
}

fn print_setup_error(err: &SetupError, plain: bool) {
    if plain {
        eprintln!("{err}");
    } else {
        eprintln!();
        eprintln!("{}: {err}", "error".red().bold());
    }
    if let Some(hint) = setup_error_hint(err) {
        eprintln!();
        eprintln!("{hint}");
    }
}

pub fn setup_error_hint(err: &SetupError) -> Option<&'static str> {
    use crate::setup::ValidationError;

    let SetupError::Invalid { source, .. } = err else {
        return None;
    };

    match source {
        ValidationError::MissingFolders => Some(
            "A setup must declare where each rendering lives.\n\
             \n\
             Example:\n\
             \n\
             \"folders\": { \"identity\": \"files\", \"gzip\": \"gzip\", \"deflate\": \"deflate\", \"brotli\": \"brotli\" }",
        ),
        ValidationError::NoFiles => Some(
            "Declare at least one entry in `files`, or a `catchAllFile`.",
        ),
        ValidationError::RelativePath { .. } => Some(
            "File paths are request paths and must start with `/`.",
        ),
        _ => None,
    }
}
