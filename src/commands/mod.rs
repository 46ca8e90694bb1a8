pub mod apply;
pub mod destroy;
pub mod import;
pub mod plan;
pub mod schema;
pub mod show;

use anyhow::{Context, Result, bail};
use reconcile::{ProviderConfig, ProviderSettings, ResourceKind, ResourceSpec, find_aliases};
use std::collections::BTreeMap;

use crate::cli::ProviderArgs;
use crate::manifest::Manifest;
use crate::ui;

/// Resolve the provider: flags over the manifest's [provider] table over the environment
pub(crate) fn provider_config(manifest: &Manifest, args: &ProviderArgs) -> Result<ProviderConfig> {
    let overrides = ProviderSettings {
        address: args.address.clone(),
        password: args.password.clone(),
        ..Default::default()
    };
    let settings = manifest.provider.clone().merge(overrides);
    ProviderConfig::from_settings(settings).context("Invalid provider configuration")
}

/// Warn about manifest entries that act on the same coordinates
pub(crate) fn warn_aliases(desired: &BTreeMap<String, ResourceSpec>) {
    for (id, addresses) in find_aliases(desired) {
        ui::warn(&format!(
            "{} all derive {id} and will overwrite each other",
            addresses.join(", ")
        ));
    }
}

/// Split a `kind.name` address
pub(crate) fn parse_address(address: &str) -> Result<(ResourceKind, &str)> {
    let Some((kind, name)) = address.split_once('.') else {
        bail!("Invalid address {address:?}: expected kind.name, e.g. block.beacon");
    };
    let Some(kind) = ResourceKind::from_name(kind) else {
        bail!("Unknown resource kind {kind:?} in {address:?} (expected block, fill or entity)");
    };
    if name.is_empty() || name.contains('.') {
        bail!("Invalid address {address:?}: expected kind.name, e.g. block.beacon");
    }
    Ok((kind, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        assert_eq!(
            parse_address("block.beacon").unwrap(),
            (ResourceKind::Block, "beacon")
        );
        assert_eq!(
            parse_address("entity.guard").unwrap(),
            (ResourceKind::Entity, "guard")
        );
        assert!(parse_address("beacon").is_err());
        assert!(parse_address("chest.a").is_err());
        assert!(parse_address("fill.").is_err());
        assert!(parse_address("fill.a.b").is_err());
        assert!(parse_address("Block.beacon").is_err());
    }

    #[test]
    fn test_flags_override_manifest() {
        let manifest = Manifest::parse(
            r#"
[provider]
address = "manifest:25575"
password = "from-manifest"
"#,
        )
        .unwrap();
        let args = ProviderArgs {
            address: Some("flag:25580".into()),
            password: None,
        };

        let config = provider_config(&manifest, &args).unwrap();
        assert_eq!(config.address(), "flag:25580");
        assert_eq!(config.password(), "from-manifest");
    }
}
