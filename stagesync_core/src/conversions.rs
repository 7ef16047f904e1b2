//! `From` implementations bridging `stagesync_config` types to `stagesync_core` types.

use crate::config::{SyncCfg, Verbosity};

impl From<stagesync_config::Verbosity> for Verbosity {
    fn from(v: stagesync_config::Verbosity) -> Self {
        match v {
            stagesync_config::Verbosity::Quiet => Verbosity::Quiet,
            stagesync_config::Verbosity::Normal => Verbosity::Normal,
            stagesync_config::Verbosity::Verbose => Verbosity::Verbose,
        }
    }
}

/// `(primary heater, instance section)` as yielded by `Config::instances()`.
impl From<(&str, &stagesync_config::StageSyncCfg)> for SyncCfg {
    fn from((primary, c): (&str, &stagesync_config::StageSyncCfg)) -> Self {
        SyncCfg::new(primary, &c.stages, &c.temp_ratio)
            .with_poll_interval(c.poll_interval)
            .with_verbosity(c.verbosity.into())
            .with_manual_trigger(c.manual_trigger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_instance_section() {
        let cfg = stagesync_config::load_toml(
            "[stagesync.extruder]\nstages = \"left,right\"\ntemp_ratio = [0.5, 1.2]\nverbosity = \"quiet\"\npoll_interval = 0.5\nmanual_trigger = false\n",
        )
        .expect("parse");
        let (primary, section) = cfg.instances().next().expect("instance");
        let sync = SyncCfg::from((primary, section));
        assert_eq!(sync.primary, "extruder");
        assert_eq!(sync.stages, "left,right");
        assert_eq!(sync.temp_ratio, "0.5,1.2");
        assert_eq!(sync.verbosity, Verbosity::Quiet);
        assert!((sync.poll_interval_s - 0.5).abs() < f64::EPSILON);
        assert!(!sync.manual_trigger);
    }
}
