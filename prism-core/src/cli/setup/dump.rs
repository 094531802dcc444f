use crate::setup::load_setup;
use anyhow::Context;
use serde::Serialize;
use std::path::PathBuf;

pub fn dump(path: PathBuf, json: bool, yaml: bool) -> anyhow::Result<()> {
    let loaded =
        load_setup(&path).with_context(|| format!("cannot load setup {}", path.display()))?;

    if yaml {
        dump_yaml(&loaded.setup)?;
    } else if json || !yaml {
        dump_json(&loaded.setup)?;
    }

    Ok(())
}

fn dump_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    println!("{s}");
    Ok(())
}

fn dump_yaml<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let s = serde_yaml::to_string(value)?;
    println!("{s}");
    Ok(())
}
