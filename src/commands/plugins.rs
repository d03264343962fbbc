//! Plugins command implementation.
//!
//! Loads the plugin directory the same way the server does and prints the
//! catalog a given role would see from `/api/plugins`.

use herakles_dashboard::plugins::{load_plugins, manifest};
use herakles_dashboard::{BackendCatalog, Role};

use crate::config::Config;

/// Lists plugins visible to `role`, plus any that failed to load.
pub fn command_plugins(role: Role, config: &Config) -> anyhow::Result<()> {
    let plugins_dir = config.plugins_dir();
    let catalog = BackendCatalog::builtin();
    let report = load_plugins(&plugins_dir, &catalog);

    println!("🧩 Plugins in {} (role: {})", plugins_dir.display(), role);
    println!("{}", "=".repeat(40));

    let visible = report.registry.list_visible(role);
    if visible.is_empty() {
        println!("\n   (none)");
    }
    for summary in &visible {
        let min_role = report
            .registry
            .get(&summary.name)
            .map(|p| p.min_role)
            .unwrap_or_default();
        println!("\n   {} {} [{}+]", summary.name, summary.version, min_role);
        println!("      title:   {}", summary.title);
        println!("      url:     {}", manifest::base_url(&summary.name));
        println!(
            "      assets:  {} script(s), {} style(s), {} widget(s)",
            summary.scripts.len(),
            summary.styles.len(),
            summary.widgets.len()
        );
    }

    let hidden = report.registry.len() - visible.len();
    if hidden > 0 {
        println!("\n   {} plugin(s) hidden from role {}", hidden, role);
    }

    for (path, err) in &report.skipped {
        println!("\n   ⚠️  Skipped {}: {}", path.display(), err);
    }

    println!("\nAvailable backend modules: {}", catalog.names().collect::<Vec<_>>().join(", "));
    Ok(())
}
