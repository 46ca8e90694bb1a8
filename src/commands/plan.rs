//! `craftform plan` - preview what apply would change

use anyhow::Result;
use colored::Colorize;
use reconcile::{Action, Plan, PlannedChange, ProviderConfig};

use crate::Context;
use crate::cli::PlanArgs;
use crate::manifest::Manifest;
use crate::state::State;
use crate::ui;

pub fn run(ctx: &Context, args: PlanArgs) -> Result<()> {
    let manifest = Manifest::load(&ctx.manifest_path)?;
    let desired = manifest.resources()?;
    super::warn_aliases(&desired);

    let state = State::load(&ctx.state_path)?;
    let plan = Plan::build(&state.resources, &desired).filter_by_target(args.target.as_deref());

    // Rendering needs the command settings, which live in the provider config
    let config = if args.commands {
        Some(super::provider_config(&manifest, &args.provider)?)
    } else {
        None
    };

    display_plan(ctx, &plan, config.as_ref());
    Ok(())
}

/// Print pending entries, optionally with the commands each would send
pub(crate) fn display_plan(ctx: &Context, plan: &Plan, config: Option<&ProviderConfig>) {
    let summary = plan.summary();

    if !summary.has_changes() {
        if !ctx.quiet {
            println!();
            println!(
                "  {} No changes. The world matches the manifest ({} tracked).",
                "✓".green(),
                ui::count(summary.unchanged, "resource")
            );
        }
        return;
    }

    if !ctx.quiet {
        ui::header("Plan");
        for change in &plan.changes {
            if change.action.is_change() || ctx.verbose > 0 {
                display_change(change, config);
            }
        }
    }

    println!();
    println!(
        "  Plan: {} to add, {} to change, {} to replace, {} to destroy.",
        summary.additions.to_string().green(),
        summary.updates.to_string().yellow(),
        summary.replacements.to_string().magenta(),
        summary.destructions.to_string().red()
    );
}

fn display_change(change: &PlannedChange, config: Option<&ProviderConfig>) {
    let symbol = match &change.action {
        Action::Create => "+".green(),
        Action::Update => "~".yellow(),
        Action::Replace { .. } => "-/+".magenta(),
        Action::Delete => "-".red(),
        Action::NoChange => " ".normal(),
    };

    let before = change.prior.as_ref().map(|record| {
        record
            .spec
            .as_ref()
            .map_or_else(|| format!("{} (imported)", record.id), |s| s.summary())
    });
    let after = change.desired.as_ref().map(|spec| spec.summary());

    let detail = match (&change.action, before, after) {
        (Action::Update, Some(before), Some(after)) => format!("{before} → {after}"),
        (Action::Replace { attributes }, Some(before), Some(after)) => format!(
            "{before} → {after} (forces replacement: {})",
            attributes.join(", ")
        ),
        (_, _, Some(after)) => after,
        (_, Some(before), None) => before,
        (_, None, None) => String::new(),
    };

    let id = change.id().map(|id| format!(" [{id}]")).unwrap_or_default();
    println!(
        "  {:>3} {:<28} {}{}",
        symbol,
        change.address,
        detail.dimmed(),
        id.dimmed()
    );

    if let Some(config) = config {
        match change.commands(config) {
            Ok(commands) if commands.is_empty() => ui::dim("      (no commands)"),
            Ok(commands) => {
                for command in commands {
                    println!("      {}", command.cyan());
                }
            }
            Err(e) => ui::warn(&format!("      {e}")),
        }
    }
}
