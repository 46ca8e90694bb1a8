//! `craftform import` - adopt an existing resource by ID

use anyhow::{Result, bail};
use reconcile::Reconciler;

use crate::Context;
use crate::cli::ImportArgs;
use crate::manifest::Manifest;
use crate::state::State;
use crate::ui;

pub fn run(ctx: &Context, args: ImportArgs) -> Result<()> {
    let (kind, _) = super::parse_address(&args.address)?;

    let mut state = State::load(&ctx.state_path)?;
    if let Some(existing) = state.resources.get(&args.address) {
        bail!(
            "{} is already recorded with ID {}; destroy it first to import another",
            args.address,
            existing.id
        );
    }

    let record = Reconciler::import(kind, &args.id)?;

    // The manifest is optional here; it only feeds the replacement hint
    let manifest = Manifest::load_optional(&ctx.manifest_path)?;
    if let Some(spec) = manifest.resources()?.get(&args.address) {
        let attributes = record.replaced_attributes(spec);
        if !attributes.is_empty() {
            ui::warn(&format!(
                "{} in the manifest derives {}; the next apply will replace it ({} differ)",
                args.address,
                spec.compute_id(),
                attributes.join(", ")
            ));
        }
    }

    state.resources.insert(args.address.clone(), record);
    state.touch(&ctx.state_path)?;

    ui::success(&format!("Imported {} as {}", args.id, args.address));
    ui::dim("No command was sent; attributes are recorded on the next apply");
    Ok(())
}
