//! `docforge variants`: list registered variants and their edit keys.

use anyhow::Result;

use docforge_core::config::ServiceConfig;
use docforge_core::variant::VariantRegistry;

use crate::output;

/// Print every variant the service would register, with its edit keys.
pub fn run(config: &ServiceConfig) -> Result<()> {
    let mut registry = VariantRegistry::builtin();
    registry.extend(config.variants.iter().cloned());
    registry.validate()?;

    for summary in registry.list() {
        let mut panel = output::Panel::new(&summary.id)
            .row("name", summary.name.as_str())
            .row("description", summary.description.as_str());
        if let Some(variant) = registry.get(&summary.id) {
            for pass in &variant.passes {
                panel = panel.row(&pass.name, pass.strategy.keys().join(", "));
            }
        }
        panel.print();
    }
    Ok(())
}
