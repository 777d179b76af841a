//! `prospector simulate` — a full session against the built-in world.
//!
//! Useful for watching the controller's decisions without a live host:
//! the demo world has two rune anchors, a pack horse, a tight carry
//! capacity, and one scripted ambush.

use prospector_core::{EventBus, SessionEvent};
use prospector_miner::{GatheringSession, ScriptHook};
use prospector_sim::{sim_session_config, SimWorld};
use std::sync::Arc;

pub async fn run(cycles: u64, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    println!("⛏️  Prospector — simulated gathering session\n");

    let host = Arc::new(SimWorld::demo().build());
    let mut config = sim_session_config();
    config.travel.runebook = Some(0x000B_0001);

    let events = Arc::new(EventBus::default());
    let mut rx = events.subscribe();
    let echo = tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            match &*event {
                SessionEvent::AreaScanned {
                    candidates,
                    on_cooldown,
                    ..
                } => println!("  🔍 Area scanned: {candidates} workable, {on_cooldown} resting"),
                SessionEvent::SpotDepleted { spot, attempts, .. } => {
                    println!("  ⛏️  Spot {spot} gave out after {attempts} swing(s)")
                }
                SessionEvent::SpotAbandoned { spot, reason, .. } => {
                    println!("  🚫 Spot {spot} abandoned: {reason}")
                }
                SessionEvent::OffloadCompleted { items_moved, .. } => {
                    println!("  🐴 Offloaded {items_moved} stack(s) to the carrier")
                }
                SessionEvent::CarrierUnreachable { reason, .. } => {
                    println!("  🐴 Carrier unreachable: {reason}")
                }
                SessionEvent::CombatStarted { hostile, .. } => {
                    println!("  ⚔️  Under attack by {hostile}")
                }
                SessionEvent::ThreatCleared { .. } => {
                    println!("  ⚔️  Threat cleared, back to work")
                }
                SessionEvent::StrangerSighted { name, .. } => {
                    println!("  👀 Stranger sighted: {name}")
                }
                _ => {}
            }
        }
    });

    let mut session = GatheringSession::new(host.clone(), config.clone(), events)
        .with_max_cycles(cycles);
    if config.hooks.smelter_enabled {
        session = session.with_hook(Arc::new(ScriptHook::smelter(&config)));
    }

    let summary = session.run().await?;
    // The bus closes when the session drops; let the echo task drain.
    let _ = echo.await;

    println!();
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{summary}");
        println!(
            "  Ore left in the ground: {} swing(s)",
            host.remaining_ore().await
        );
    }
    Ok(())
}
