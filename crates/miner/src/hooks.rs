//! Built-in session hooks.
//!
//! The hook trait lives in `prospector-core`; this module ships the one
//! implementation most setups want: a hook that fires a host-side helper
//! script at phase boundaries, optionally gated on the carrier being near
//! enough for the script to matter.

use async_trait::async_trait;
use prospector_config::AppConfig;
use prospector_core::{GameHost, GraphicId, HookError, Serial, SessionHook, SessionPhase};
use tracing::debug;

/// Runs a named host-side script when the session crosses the given phases.
pub struct ScriptHook {
    name: String,
    script: String,
    phases: Vec<SessionPhase>,
    gate: Option<CarrierGate>,
}

/// Skip condition: the carrier must be within `max_distance` tiles.
struct CarrierGate {
    serial: Option<Serial>,
    bodies: Vec<GraphicId>,
    max_distance: i32,
}

impl ScriptHook {
    pub fn new(name: &str, script: &str, phases: Vec<SessionPhase>) -> Self {
        Self {
            name: name.to_string(),
            script: script.to_string(),
            phases,
            gate: None,
        }
    }

    /// Only run while the carrier is close enough to receive the output.
    pub fn with_carrier_gate(
        mut self,
        serial: Option<Serial>,
        bodies: Vec<GraphicId>,
        max_distance: i32,
    ) -> Self {
        self.gate = Some(CarrierGate {
            serial,
            bodies,
            max_distance,
        });
        self
    }

    /// The smelter helper: turns raw ore into ingots after a spot is
    /// exhausted or an offload lands, but only while the carrier is close
    /// by to take the ingots.
    pub fn smelter(config: &AppConfig) -> Self {
        Self::new(
            "smelter",
            &config.hooks.smelter_script,
            vec![SessionPhase::SpotDepleted, SessionPhase::OffloadComplete],
        )
        .with_carrier_gate(
            config.carrier.serial,
            config.carrier.pack_animal_bodies.clone(),
            config.hooks.carrier_max_distance,
        )
    }
}

impl CarrierGate {
    async fn carrier_nearby(&self, host: &dyn GameHost) -> Result<bool, HookError> {
        let status = host.player_status().await?;
        if let Some(serial) = self.serial
            && let Some(carrier) = host.find_mobile(serial).await?
        {
            return Ok(status.position.tile_range(&carrier.position) <= self.max_distance);
        }
        for mobile in host.mobiles_in_range(self.max_distance).await? {
            if self.bodies.contains(&mobile.body) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[async_trait]
impl SessionHook for ScriptHook {
    fn name(&self) -> &str {
        &self.name
    }

    async fn on_phase(&self, phase: SessionPhase, host: &dyn GameHost) -> Result<(), HookError> {
        if !self.phases.contains(&phase) {
            return Ok(());
        }
        if let Some(gate) = &self.gate
            && !gate.carrier_nearby(host).await?
        {
            return Err(HookError::Skipped(format!(
                "carrier beyond {} tiles",
                gate.max_distance
            )));
        }
        debug!(hook = %self.name, script = %self.script, "Running phase script");
        host.run_script(&self.script).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::MockHost;
    use prospector_core::Position;
    use std::sync::Arc;

    const PACK_HORSE: GraphicId = 0x0123;
    const CARRIER: Serial = 0x0004_2000;

    fn smelter_for_test() -> ScriptHook {
        ScriptHook::smelter(&AppConfig::default())
    }

    #[tokio::test]
    async fn fires_on_its_phases_when_the_carrier_is_near() {
        let host = Arc::new(MockHost::new(Position::new(0, 0, 0)));
        host.add_carrier(CARRIER, PACK_HORSE, Position::new(3, 0, 0), Vec::new());
        let hook = smelter_for_test();

        hook.on_phase(SessionPhase::SpotDepleted, host.as_ref())
            .await
            .unwrap();
        hook.on_phase(SessionPhase::OffloadComplete, host.as_ref())
            .await
            .unwrap();

        assert_eq!(host.calls_named("run_script:auto_smelter.py"), 2);
    }

    #[tokio::test]
    async fn other_phases_are_ignored() {
        let host = Arc::new(MockHost::new(Position::new(0, 0, 0)));
        host.add_carrier(CARRIER, PACK_HORSE, Position::new(3, 0, 0), Vec::new());
        let hook = smelter_for_test();

        hook.on_phase(SessionPhase::SessionStart, host.as_ref())
            .await
            .unwrap();
        hook.on_phase(SessionPhase::SessionEnd, host.as_ref())
            .await
            .unwrap();

        assert_eq!(host.calls_named("run_script:auto_smelter.py"), 0);
    }

    #[tokio::test]
    async fn skips_when_the_carrier_wandered_off() {
        let host = Arc::new(MockHost::new(Position::new(0, 0, 0)));
        host.add_carrier(CARRIER, PACK_HORSE, Position::new(30, 0, 0), Vec::new());
        let hook = smelter_for_test();

        let result = hook.on_phase(SessionPhase::SpotDepleted, host.as_ref()).await;

        assert!(matches!(result, Err(HookError::Skipped(_))));
        assert_eq!(host.calls_named("run_script:auto_smelter.py"), 0);
    }

    #[tokio::test]
    async fn skips_with_no_carrier_at_all() {
        let host = Arc::new(MockHost::new(Position::new(0, 0, 0)));
        let hook = smelter_for_test();

        let result = hook.on_phase(SessionPhase::SpotDepleted, host.as_ref()).await;

        assert!(matches!(result, Err(HookError::Skipped(_))));
    }

    #[tokio::test]
    async fn pinned_serial_is_checked_directly() {
        let host = Arc::new(MockHost::new(Position::new(0, 0, 0)));
        host.add_carrier(CARRIER, PACK_HORSE, Position::new(5, 5, 0), Vec::new());
        let mut config = AppConfig::default();
        config.carrier.serial = Some(CARRIER);
        let hook = ScriptHook::smelter(&config);

        hook.on_phase(SessionPhase::SpotDepleted, host.as_ref())
            .await
            .unwrap();

        assert_eq!(host.calls_named("run_script:auto_smelter.py"), 1);
    }

    #[tokio::test]
    async fn ungated_hook_always_fires() {
        let host = Arc::new(MockHost::new(Position::new(0, 0, 0)));
        let hook = ScriptHook::new(
            "greeter",
            "wave_hello.py",
            vec![SessionPhase::SessionStart],
        );

        hook.on_phase(SessionPhase::SessionStart, host.as_ref())
            .await
            .unwrap();

        assert_eq!(host.calls_named("run_script:wave_hello.py"), 1);
    }
}
