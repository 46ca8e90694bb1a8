//! `craftform schema` - describe resource kinds

use anyhow::Result;
use colored::Colorize;
use reconcile::{Attribute, ResourceKind, Schema};

use crate::ui;

pub fn run(json: bool) -> Result<()> {
    let schemas: Vec<&Schema> = ResourceKind::ALL.iter().map(ResourceKind::schema).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&schemas)?);
        return Ok(());
    }

    for schema in schemas {
        ui::section(schema.kind.as_str());
        ui::dim(schema.description);
        let identity = schema.identity;
        ui::dim(&format!(
            "ID: {}-<{identity}.x>-<{identity}.y>-<{identity}.z>",
            schema.kind
        ));
        println!();
        for attribute in schema.attributes {
            println!(
                "  {:<14} {:<28} {}",
                attribute.name,
                flags(attribute).yellow(),
                attribute.description.dimmed()
            );
        }
    }
    Ok(())
}

fn flags(attribute: &Attribute) -> String {
    let mut flags = Vec::new();
    if attribute.required {
        flags.push("required");
    }
    if attribute.computed {
        flags.push("computed");
    }
    if attribute.requires_replace {
        flags.push("forces replacement");
    }
    flags.join(", ")
}
