//! `lando registry`

use colored::Colorize;
use lando_core::Bootstrap;

use crate::error::Result;

pub fn run_registry(bootstrap: &Bootstrap) -> Result<()> {
    let registry = bootstrap.registry();
    if registry.is_empty() {
        println!("{}", "No components registered".dimmed());
        return Ok(());
    }

    println!("{}", "Components".bold());
    for (id, locator) in registry.components() {
        println!("  {} {}", id.green(), locator);
    }

    if !registry.aliases().is_empty() {
        println!();
        println!("{}", "Aliases".bold());
        for (from, to) in registry.aliases() {
            println!("  {} -> {}", from.cyan(), to);
        }
    }
    Ok(())
}
