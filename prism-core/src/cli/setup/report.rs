use crate::cache::EnvLookup;
use crate::encoding::EncodingName;
use crate::setup::{FileEntry, LoadedSetup, ServerSetup};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::collections::BTreeSet;

/// Problems that do not make a setup invalid but will fail or misroute requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SetupReport {
    pub warnings: Vec<SetupWarning>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetupWarning {
    pub subject: String,
    pub message: String,
}

impl SetupReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    fn warn(&mut self, subject: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(SetupWarning {
            subject: subject.into(),
            message: message.into(),
        });
    }

    pub fn render_plain(&self) {
        for warning in &self.warnings {
            println!("{}: warning: {}", warning.subject, warning.message);
        }
    }

    pub fn render_pretty(&self) {
        if self.is_clean() {
            return;
        }

        println!("\n{} warnings\n", self.warnings.len());
        for warning in &self.warnings {
            println!(
                "  {}: {} {}",
                "warning".yellow().bold(),
                warning.subject.bold(),
                warning.message
            );
        }
    }
}

/// Look for missing asset files, dangling or cyclic aliases and unset environment variables.
pub fn inspect(loaded: &LoadedSetup, env: &dyn EnvLookup) -> SetupReport {
    let mut report = SetupReport::default();
    let setup = &loaded.setup;

    for file in setup.all_files() {
        inspect_variants(loaded, file, &mut report);

        let unset: BTreeSet<&str> = file
            .env_replacements
            .values()
            .filter(|var| env.var(var).is_none())
            .map(String::as_str)
            .collect();
        for var in unset {
            report.warn(
                &file.path,
                format!("environment variable {var} is not set"),
            );
        }
    }

    for alias in &setup.aliases {
        inspect_alias(setup, &alias.from, &mut report);
    }

    report
}

fn inspect_variants(loaded: &LoadedSetup, file: &FileEntry, report: &mut SetupReport) {
    let present = std::iter::once(EncodingName::Identity)
        .chain(EncodingName::COMPRESSED)
        .filter(|encoding| file.sizes.get(*encoding).is_some());

    for encoding in present {
        let on_disk = loaded
            .root_dir
            .join(loaded.setup.folders.for_encoding(encoding))
            .join(file.relative_path());
        if !on_disk.is_file() {
            report.warn(
                &file.path,
                format!("{encoding} rendering missing at {}", on_disk.display()),
            );
        }
    }
}

fn inspect_alias(setup: &ServerSetup, from: &str, report: &mut SetupReport) {
    let mut chain = vec![from];
    let mut current = from;

    loop {
        if setup.files.iter().any(|f| f.path == current) {
            return;
        }

        let Some(alias) = setup.aliases.iter().find(|a| a.from == current) else {
            let fallback = if setup.catch_all_file.is_some() {
                "the catch-all file"
            } else {
                "404"
            };
            report.warn(
                from,
                format!("alias target {current} does not exist, requests get {fallback}"),
            );
            return;
        };

        if chain.contains(&alias.to.as_str()) {
            chain.push(&alias.to);
            report.warn(from, format!("alias cycle {}", chain.join(" -> ")));
            return;
        }

        chain.push(&alias.to);
        current = &alias.to;
    }
}
