//! `lando plugins`

use colored::Colorize;
use lando_core::Bootstrap;
use lando_plugins::Plugin;

use crate::error::Result;

/// List enabled, disabled and invalid plugins, highest priority first.
pub fn run_plugins(bootstrap: &Bootstrap) -> Result<()> {
    let plugins = bootstrap.plugins();
    if plugins.is_empty() {
        println!("{}", "No plugins found".dimmed());
        return Ok(());
    }

    let groups = [
        ("Enabled", &plugins.enabled),
        ("Disabled", &plugins.disabled),
        ("Invalid", &plugins.invalid),
    ];
    for (label, list) in groups {
        if list.is_empty() {
            continue;
        }
        println!("{}", label.bold());
        for plugin in list.iter().rev() {
            print_plugin(plugin);
        }
        println!();
    }
    Ok(())
}

fn print_plugin(plugin: &Plugin) {
    let installed = if plugin.is_installed {
        String::new()
    } else {
        format!(" {}", "(dependencies missing)".yellow())
    };
    println!(
        "  {} {} {} {}{}",
        plugin.name.green(),
        plugin.version.dimmed(),
        format!("[{}]", plugin.plugin_type).cyan(),
        plugin.root.display(),
        installed
    );
}
