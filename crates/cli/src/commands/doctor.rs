//! `prospector doctor` — diagnose setup problems.

use prospector_config::AppConfig;
use tokio::net::TcpStream;
use tokio::time::timeout;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 Prospector Doctor — Setup Diagnostics");
    println!("========================================\n");

    let mut issues = 0;

    // Check config
    let config_path = AppConfig::config_dir().join("config.toml");
    let config = if config_path.exists() {
        match AppConfig::load() {
            Ok(config) => {
                println!("  ✅ Config file valid");
                Some(config)
            }
            Err(e) => {
                println!("  ❌ Config file invalid: {e}");
                issues += 1;
                None
            }
        }
    } else {
        println!("  ⚠️  No config file — run `prospector config init` (defaults in use)");
        Some(AppConfig::default())
    };

    if let Some(config) = config {
        // Travel
        if config.travel.runebook.is_some() {
            println!("  ✅ Runebook configured for travel");
        } else {
            println!("  ⚠️  No runebook set — the session will stay in one area");
        }

        // Carrier
        if config.carrier.enabled {
            match config.carrier.serial {
                Some(serial) => println!("  ✅ Carrier pinned to {serial:#010x}"),
                None => println!("  ✅ Carrier enabled, nearest pack animal will be adopted"),
            }
        } else {
            println!("  ⚠️  Carrier disabled — expect ground drops under load");
        }

        // Combat
        if config.combat.enabled {
            println!("  ✅ Combat responder: {}", config.combat.responder_script);
        } else {
            println!("  ⚠️  Combat handling disabled");
        }

        // Host endpoint
        let addr = format!("127.0.0.1:{}", config.probe.port);
        match timeout(config.probe.timeout(), TcpStream::connect(&addr)).await {
            Ok(Ok(_)) => println!("  ✅ Game host reachable on {addr}"),
            _ => {
                println!("  ❌ Game host not reachable on {addr}");
                issues += 1;
            }
        }
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
