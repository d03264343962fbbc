//! Check command implementation.
//!
//! Validates system requirements, configuration, the metric store and
//! the plugin directory without starting the server.

use herakles_dashboard::collectors::{netdev, thermal};
use herakles_dashboard::plugins::load_plugins;
use herakles_dashboard::{system, BackendCatalog, MetricStore};

use crate::config::{validate_effective_config, Config};

/// Validates system requirements and configuration.
pub async fn command_check(config: &Config) -> anyhow::Result<()> {
    println!("🔍 Herakles Dashboard - System Check");
    println!("====================================");

    let mut all_ok = true;

    println!("\n📁 Checking /proc filesystem...");
    match system::read_cpu_stats() {
        Ok(stats) => println!("   ✅ /proc/stat readable ({} cores)", stats.len().saturating_sub(1)),
        Err(e) => {
            println!("   ❌ /proc/stat: {}", e);
            all_ok = false;
        }
    }
    match system::read_memory_info() {
        Ok(mem) => println!(
            "   ✅ /proc/meminfo readable ({:.1}% used)",
            mem.used_percent()
        ),
        Err(e) => {
            println!("   ❌ /proc/meminfo: {}", e);
            all_ok = false;
        }
    }
    match netdev::read_netdev_stats() {
        Ok(devices) => println!("   ✅ /proc/net/dev readable ({} interfaces)", devices.len()),
        Err(e) => {
            println!("   ❌ /proc/net/dev: {}", e);
            all_ok = false;
        }
    }
    match thermal::mean_temperature() {
        Some(t) => println!("   ✅ Temperature sensors: {:.1} °C", t),
        None => println!("   ⚠️  No temperature sensors (temperature will be null)"),
    }

    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => println!("   ✅ Configuration is valid"),
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\n💾 Checking metric store...");
    let database = config.database_path();
    match MetricStore::open(&database).await {
        Ok(store) => {
            match store.count().await {
                Ok(count) => println!(
                    "   ✅ {} opened ({} samples stored)",
                    database.display(),
                    count
                ),
                Err(e) => {
                    println!("   ❌ {} unreadable: {}", database.display(), e);
                    all_ok = false;
                }
            }
            store.close().await;
        }
        Err(e) => {
            println!("   ❌ Cannot open {}: {}", database.display(), e);
            all_ok = false;
        }
    }

    println!("\n🧩 Checking plugins...");
    let report = load_plugins(&config.plugins_dir(), &BackendCatalog::builtin());
    println!(
        "   ✅ {} plugins loaded from {}",
        report.registry.len(),
        config.plugins_dir().display()
    );
    for (path, err) in &report.skipped {
        println!("   ⚠️  Skipped {}: {}", path.display(), err);
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - system is ready");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review warnings");
        std::process::exit(1);
    }
}
