mod common;

use common::Rig;
use proptest::prelude::*;
use stagesync_core::SyncCfg;
use stagesync_host::parse_set_heater_temperature;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // Every dispatched batch lists each stage once, in order, at target * ratio.
    #[test]
    fn batch_matches_stage_table(
        ratios in prop::collection::vec(0.0f64..=2.0, 1..6),
        target in 0.0f64..350.0,
    ) {
        let names: Vec<String> = (0..ratios.len()).map(|i| format!("stage{i}")).collect();
        let mut heaters: Vec<&str> = names.iter().map(String::as_str).collect();
        heaters.push("extruder");
        let rig = Rig::new(&heaters);

        let ratio_list = ratios.iter().map(f64::to_string).collect::<Vec<_>>().join(",");
        let mut sync = rig.connected(SyncCfg::new("extruder", &names.join(","), &ratio_list));
        rig.heater("extruder").set_target(Some(target));
        rig.reactor.run_until(&mut sync, 0.0);

        prop_assert_eq!(rig.dispatch.count(), 1);
        let script = rig.dispatch.last().unwrap_or_default();
        let lines: Vec<&str> = script.lines().collect();
        prop_assert_eq!(lines.len(), names.len());
        for (idx, line) in lines.iter().enumerate() {
            let (heater, value) = parse_set_heater_temperature(idx + 1, line)
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(&heater, &names[idx]);
            prop_assert!((value - target * ratios[idx]).abs() <= 0.005 + 1e-9);
        }
    }

    // Out-of-range ratios never produce an instance.
    #[test]
    fn out_of_range_ratio_never_builds(ratio in prop_oneof![-10.0f64..-0.001, 2.001f64..10.0]) {
        let rig = Rig::new(&["extruder", "left"]);
        let built = rig.build(SyncCfg::new("extruder", "left", &ratio.to_string()));
        prop_assert!(built.is_err());
        prop_assert_eq!(rig.shutdown.count(), 1);
        prop_assert_eq!(rig.reactor.pending(), 0);
    }
}
