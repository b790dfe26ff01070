//! Operator access to the snapshot cache and watermark.

use anyhow::{bail, Context, Result};
use gcs_schemas::{format_timestamp, parse_timestamp, RecordId};
use tracing::info;

use super::load_runtime;

pub fn watermark_show(config_paths: &[String]) -> Result<()> {
    let rt = load_runtime(config_paths)?;
    let mut store = rt.open_store()?;
    match store.get_watermark()? {
        Some(raw) => println!("watermark={raw}"),
        None => println!("watermark=<unset>"),
    }
    Ok(())
}

/// Normalises the value to the stored pattern before writing it.
pub fn watermark_set(config_paths: &[String], value: &str) -> Result<()> {
    let rt = load_runtime(config_paths)?;
    let ts = parse_timestamp(value, rt.zone).context("invalid watermark")?;
    let normalised = format_timestamp(&ts);

    let mut store = rt.open_store()?;
    let previous = store.get_watermark()?;
    store.set_watermark(&normalised)?;

    info!(previous = ?previous, watermark = %normalised, "watermark overridden by operator");
    println!("watermark={normalised}");
    Ok(())
}

pub fn snapshot_show(config_paths: &[String], id: &str) -> Result<()> {
    let rt = load_runtime(config_paths)?;
    let mut store = rt.open_store()?;
    let Some(snapshot) = store.get(&RecordId::new(id))? else {
        bail!("no cached snapshot for record {id}");
    };
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
