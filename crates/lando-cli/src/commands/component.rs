//! `lando component`

use colored::Colorize;
use lando_core::Bootstrap;

use crate::error::Result;

/// Resolve `id` and print the class it resolves to.
pub fn run_component(bootstrap: &Bootstrap, id: &str) -> Result<()> {
    let target = bootstrap.registry().resolve_alias(id);
    if target != id {
        println!("{} -> {}", id.cyan(), target.green());
    }

    let class = bootstrap.get_component(id)?;
    println!("{} {}", "class".bold(), class.lineage().join(" < "));
    if let Some(locator) = bootstrap.registry().get(id) {
        println!("{} {}", "locator".bold(), locator);
    }
    println!(
        "{}",
        serde_json::to_string_pretty(&class.config()).unwrap_or_default()
    );
    Ok(())
}
