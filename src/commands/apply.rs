//! `craftform apply` - converge the world to the manifest

use anyhow::{Result, bail};
use colored::Colorize;
use reconcile::{AutoConfirm, ExecuteSummary, Plan, Reconciler, execute};

use crate::Context;
use crate::channel::RconChannel;
use crate::cli::{ApplyArgs, ProviderArgs};
use crate::manifest::Manifest;
use crate::progress::{TerminalConfirm, TerminalProgress};
use crate::state::State;
use crate::ui;

use super::plan::display_plan;

pub fn run(ctx: &Context, args: ApplyArgs) -> Result<()> {
    let manifest = Manifest::load(&ctx.manifest_path)?;
    let desired = manifest.resources()?;
    super::warn_aliases(&desired);

    let mut state = State::load(&ctx.state_path)?;
    let plan = Plan::build(&state.resources, &desired).filter_by_target(args.target.as_deref());

    if args.dry_run {
        // Show commands when the provider resolves; a dry run never connects
        let config = match super::provider_config(&manifest, &args.provider) {
            Ok(config) => Some(config),
            Err(e) => {
                log::info!("not rendering commands: {e:#}");
                None
            }
        };
        display_plan(ctx, &plan, config.as_ref());
        println!();
        ui::info("Dry run: nothing was sent");
        return Ok(());
    }

    execute_plan(ctx, &manifest, &args.provider, &plan, &mut state, args.yes)
}

/// Connect, confirm, execute and persist whatever reached the world
pub(crate) fn execute_plan(
    ctx: &Context,
    manifest: &Manifest,
    provider: &ProviderArgs,
    plan: &Plan,
    state: &mut State,
    yes: bool,
) -> Result<()> {
    display_plan(ctx, plan, None);
    if !plan.summary().has_changes() {
        return Ok(());
    }

    let config = super::provider_config(manifest, provider)?;
    let channel = RconChannel::connect(&config)?;
    let reconciler = Reconciler::new(&config, &channel);

    let mut progress = TerminalProgress::default();
    let summary = if yes {
        execute(
            &reconciler,
            plan,
            &mut state.resources,
            &mut progress,
            &mut AutoConfirm,
        )?
    } else {
        execute(
            &reconciler,
            plan,
            &mut state.resources,
            &mut progress,
            &mut TerminalConfirm,
        )?
    };

    // Records change on success and on failed deletes alike
    if summary.total_changes() + summary.failed > 0 {
        state.touch(&ctx.state_path)?;
    }

    print_summary(&summary);

    if !summary.is_success() {
        bail!("{} failed", ui::count(summary.failed, "resource"));
    }
    Ok(())
}

/// Print final summary
pub(crate) fn print_summary(summary: &ExecuteSummary) {
    println!();
    if summary.total_changes() == 0 && summary.failed == 0 {
        println!("  {} Nothing applied", "-".dimmed());
        return;
    }

    if summary.is_success() {
        println!("  {} Apply complete!", "✓".green().bold());
    } else {
        println!("  {} Apply finished with errors", "⚠".yellow().bold());
    }

    if summary.created > 0 {
        println!("    • {} created", ui::count(summary.created, "resource"));
    }
    if summary.updated > 0 {
        println!("    • {} updated", ui::count(summary.updated, "resource"));
    }
    if summary.replaced > 0 {
        println!("    • {} replaced", ui::count(summary.replaced, "resource"));
    }
    if summary.deleted > 0 {
        println!("    • {} destroyed", ui::count(summary.deleted, "resource"));
    }
    if summary.skipped > 0 {
        println!("    • {} skipped", ui::count(summary.skipped, "resource"));
    }
    if summary.failed > 0 {
        println!(
            "    • {} {}",
            ui::count(summary.failed, "resource"),
            "failed".red()
        );
    }
}
