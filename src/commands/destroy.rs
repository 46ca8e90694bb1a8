//! `craftform destroy` - clear recorded resources from the world

use anyhow::Result;
use reconcile::Plan;

use crate::Context;
use crate::cli::DestroyArgs;
use crate::manifest::Manifest;
use crate::state::State;
use crate::ui;

pub fn run(ctx: &Context, args: DestroyArgs) -> Result<()> {
    // Only the provider settings are needed; the manifest may already be gone
    let manifest = Manifest::load_optional(&ctx.manifest_path)?;
    let mut state = State::load(&ctx.state_path)?;

    let plan = Plan::destroy(&state.resources).filter_by_target(args.target.as_deref());
    if plan.is_empty() {
        ui::info("Nothing recorded to destroy");
        return Ok(());
    }

    let imported = plan
        .changes
        .iter()
        .filter(|c| c.prior.as_ref().is_some_and(|r| r.is_imported()))
        .count();
    if imported > 0 {
        ui::warn(&format!(
            "{} recorded by import only; of those, only blocks can be cleared from their ID",
            ui::count(imported, "resource")
        ));
    }

    super::apply::execute_plan(ctx, &manifest, &args.provider, &plan, &mut state, args.yes)
}
