//! `craftform show` - print recorded state

use anyhow::{Result, bail};
use reconcile::{Reconciler, Record};
use std::collections::BTreeMap;

use crate::Context;
use crate::cli::ShowArgs;
use crate::state::State;
use crate::ui;

pub fn run(ctx: &Context, args: ShowArgs) -> Result<()> {
    let state = State::load(&ctx.state_path)?;

    let records: BTreeMap<&str, Record> = state
        .resources
        .iter()
        .filter(|(address, _)| {
            args.address
                .as_deref()
                .is_none_or(|want| want == address.as_str())
        })
        .map(|(address, record)| (address.as_str(), Reconciler::read(record)))
        .collect();

    if let Some(address) = &args.address
        && records.is_empty()
    {
        bail!("{address} is not recorded in {}", ctx.state_path.display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        ui::info("No resources recorded");
        return Ok(());
    }

    ui::header("Recorded State");
    for (address, record) in &records {
        display_record(address, record);
    }

    println!();
    ui::dim(&format!(
        "{} in {}, last updated {}",
        ui::count(state.resources.len(), "resource"),
        ctx.state_path.display(),
        state.last_updated.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    Ok(())
}

fn display_record(address: &str, record: &Record) {
    ui::section(address);
    ui::kv("id", record.id.as_str());

    let Some(spec) = &record.spec else {
        ui::kv("attributes", "unknown (imported, not yet applied)");
        return;
    };

    for attribute in spec.schema().attributes.iter().filter(|a| !a.computed) {
        if let Some(value) = spec.attribute(attribute.name) {
            ui::kv(attribute.name, &value.to_string());
        }
    }
}
