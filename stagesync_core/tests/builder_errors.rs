mod common;

use common::{Rig, dual_cfg};
use rstest::rstest;
use stagesync_core::error::BuildError;
use stagesync_core::{ConfigError, HeaterRole, Phase, StageSync, SyncCfg, SyncError};
use stagesync_host::{ScriptRecorder, SimRegistry, SimShutdown, VirtualReactor};

#[rstest]
fn builder_missing_registry_yields_typed_build_error() {
    let err = StageSync::builder(dual_cfg())
        // missing with_registry()
        .with_dispatch(ScriptRecorder::new())
        .with_shutdown(SimShutdown::new())
        .with_scheduler(VirtualReactor::new())
        .try_build()
        .expect_err("should fail with MissingRegistry");

    match err.downcast_ref::<BuildError>() {
        Some(BuildError::MissingRegistry) => {}
        other => panic!("expected MissingRegistry, got: {other:?}"),
    }
}

#[rstest]
fn builder_missing_scheduler_yields_typed_build_error() {
    let shutdown = SimShutdown::new();
    let err = StageSync::builder(dual_cfg())
        .with_registry(SimRegistry::with_heaters(["extruder", "left", "right"]))
        .with_dispatch(ScriptRecorder::new())
        .with_shutdown(shutdown.clone())
        .build()
        .expect_err("should fail with MissingScheduler");

    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::MissingScheduler)
    ));
    // Wiring mistakes are not host faults.
    assert_eq!(shutdown.count(), 0);
}

#[rstest]
fn valid_config_builds_without_touching_the_scheduler() {
    let rig = Rig::dual();
    let sync = rig.build(dual_cfg()).expect("build");

    assert_eq!(sync.phase(), Phase::Constructed);
    assert_eq!(sync.timer(), None);
    assert_eq!(rig.reactor.pending(), 0);
    assert_eq!(sync.stage_table().names(), "left, right");
    assert_eq!(rig.shutdown.count(), 0);
}

#[rstest]
#[case::ratio_above_range(
    "left,right", "0.5,2.5",
    SyncError::Config(ConfigError::RatioOutOfRange { stage: "right".into(), ratio: 2.5 })
)]
#[case::negative_ratio(
    "left,right", "-0.1,1.0",
    SyncError::Config(ConfigError::RatioOutOfRange { stage: "left".into(), ratio: -0.1 })
)]
#[case::unparsable_ratio(
    "left,right", "0.5,hot",
    SyncError::Config(ConfigError::UnparsableRatio { stage: "right".into(), literal: "hot".into() })
)]
#[case::count_mismatch(
    "left,right", "0.5",
    SyncError::Config(ConfigError::LengthMismatch { stages: 2, ratios: 1 })
)]
#[case::no_stages("", "", SyncError::Config(ConfigError::NoStages))]
#[case::empty_name(
    "left,,right", "0.5,1.0,1.2",
    SyncError::Config(ConfigError::EmptyStageName { index: 1 })
)]
#[case::unknown_stage(
    "left,middle", "0.5,1.0",
    SyncError::Lookup { role: HeaterRole::Stage, name: "middle".into() }
)]
#[case::first_bad_entry_wins(
    "left,middle", "3.0,1.0",
    SyncError::Config(ConfigError::RatioOutOfRange { stage: "left".into(), ratio: 3.0 })
)]
fn invalid_stage_config_is_escalated(
    #[case] stages: &str,
    #[case] ratios: &str,
    #[case] expected: SyncError,
) {
    let rig = Rig::dual();
    let err = rig
        .build(SyncCfg::new("extruder", stages, ratios))
        .expect_err("invalid config must not build");

    assert_eq!(err.downcast_ref::<SyncError>(), Some(&expected));
    assert_eq!(rig.shutdown.count(), 1);
    assert_eq!(
        rig.shutdown.requested(),
        Some(format!("stagesync: {expected}"))
    );
    assert_eq!(rig.reactor.pending(), 0);
}

#[rstest]
fn out_of_range_ratio_message_names_stage_and_value() {
    let rig = Rig::dual();
    let _ = rig.build(SyncCfg::new("extruder", "left,right", "0.5,2.5"));
    assert_eq!(
        rig.shutdown.requested().as_deref(),
        Some("stagesync: configuration error: invalid ratio for 'right': 2.5 (allowed 0.0..=2.0)")
    );
}

#[rstest]
#[case(0.0)]
#[case(-1.0)]
#[case(f64::NAN)]
#[case(1e-300)]
#[case(0.001)]
fn too_small_or_invalid_poll_interval_is_rejected(#[case] secs: f64) {
    let rig = Rig::dual();
    let err = rig
        .build(dual_cfg().with_poll_interval(secs))
        .expect_err("poll interval below the floor");
    assert!(matches!(
        err.downcast_ref::<SyncError>(),
        Some(SyncError::Config(ConfigError::PollInterval(_)))
    ));
    assert_eq!(rig.shutdown.count(), 1);
}

#[rstest]
fn ratio_bounds_are_inclusive_and_whitespace_is_ignored() {
    let rig = Rig::dual();
    let sync = rig
        .build(SyncCfg::new("extruder", "  left ,right  ", " 0.0 , 2.0 "))
        .expect("bounds are valid");
    let ratios: Vec<(&str, f64)> = sync
        .stage_table()
        .iter()
        .map(|s| (s.name(), s.ratio()))
        .collect();
    assert_eq!(ratios, vec![("left", 0.0), ("right", 2.0)]);
}

#[rstest]
fn unknown_primary_is_reported_on_connect_not_build() {
    let rig = Rig::dual();
    let mut sync = rig
        .build(SyncCfg::new("nozzle", "left,right", "0.5,1.2"))
        .expect("primary is resolved lazily");
    assert_eq!(rig.shutdown.count(), 0);

    let err = sync.handle_connect().expect_err("unknown primary");
    assert_eq!(
        err.downcast_ref::<SyncError>(),
        Some(&SyncError::Lookup {
            role: HeaterRole::Primary,
            name: "nozzle".into()
        })
    );
    assert_eq!(
        rig.shutdown.requested().as_deref(),
        Some("stagesync: unknown primary heater 'nozzle'")
    );
    assert_eq!(sync.phase(), Phase::Shutdown);
    assert_eq!(rig.reactor.pending(), 0);
}
