use rstest::rstest;
use stagesync_host::{
    HostError, ReplyLog, ScriptRecorder, SimHeater, SimRegistry, SimShutdown,
    parse_set_heater_temperature,
};
use stagesync_traits::{CommandDispatch, DeviceRegistry, Heater, Responder, Shutdown};

#[test]
fn heater_clones_share_state() {
    let heater = SimHeater::new("extruder");
    let handle = heater.clone();
    heater.set_target(Some(210.0));
    let (_, target) = handle.get_temp(0.0).expect("sample");
    assert_eq!(target, Some(210.0));
    assert_eq!(heater.reads(), 1);
}

#[test]
fn injected_read_failures_are_consumed() {
    let heater = SimHeater::new("extruder");
    heater.fail_next_reads(1);
    let err = heater.get_temp(0.0).expect_err("first read fails");
    assert!(err.downcast_ref::<HostError>().is_some());
    assert!(heater.get_temp(1.0).is_ok());
}

#[test]
fn registry_resolves_known_heaters_only() {
    let reg = SimRegistry::with_heaters(["extruder", "left"]);
    assert_eq!(
        reg.lookup_heater("left").map(|h| h.name().to_string()),
        Some("left".to_string())
    );
    assert!(reg.lookup_heater("right").is_none());
}

#[rstest]
#[case(r#"SET_HEATER_TEMPERATURE HEATER="left" TARGET="100.00""#, "left", 100.0)]
#[case("SET_HEATER_TEMPERATURE HEATER=right TARGET=240", "right", 240.0)]
fn parses_heater_commands(#[case] line: &str, #[case] heater: &str, #[case] target: f64) {
    let (h, t) = parse_set_heater_temperature(1, line).expect("parse");
    assert_eq!(h, heater);
    assert!((t - target).abs() < 1e-9);
}

#[rstest]
#[case("M104 S200")]
#[case(r#"SET_HEATER_TEMPERATURE HEATER="left""#)]
#[case(r#"SET_HEATER_TEMPERATURE HEATER="left" TARGET="hot""#)]
fn rejects_malformed_commands(#[case] line: &str) {
    assert!(matches!(
        parse_set_heater_temperature(3, line),
        Err(HostError::Malformed { line: 3, .. })
    ));
}

#[test]
fn recorder_applies_whole_script_or_nothing() {
    let reg = SimRegistry::with_heaters(["left", "right"]);
    let mut rec = ScriptRecorder::applying_to(reg.clone());

    rec.run_script("SET_HEATER_TEMPERATURE HEATER=\"left\" TARGET=\"100.00\"\nSET_HEATER_TEMPERATURE HEATER=\"right\" TARGET=\"240.00\"")
        .expect("accepted");
    assert_eq!(reg.get("left").and_then(SimHeater::target), Some(100.0));
    assert_eq!(reg.get("right").and_then(SimHeater::target), Some(240.0));

    // Second line names an unknown heater: the first line must not apply either.
    let err = rec
        .run_script("SET_HEATER_TEMPERATURE HEATER=\"left\" TARGET=\"1.00\"\nSET_HEATER_TEMPERATURE HEATER=\"ghost\" TARGET=\"2.00\"")
        .expect_err("rejected");
    assert!(err.to_string().contains("ghost"));
    assert_eq!(reg.get("left").and_then(SimHeater::target), Some(100.0));
    assert_eq!(rec.count(), 1);
}

#[test]
fn recorder_rejects_when_asked() {
    let mut rec = ScriptRecorder::new();
    rec.reject_with("printer is shutdown");
    let err = rec.run_script("anything").expect_err("rejected");
    assert!(err.to_string().contains("printer is shutdown"));
    assert_eq!(rec.count(), 0);
    rec.accept();
    rec.run_script("anything").expect("accepted");
    assert_eq!(rec.last().as_deref(), Some("anything"));
}

#[test]
fn shutdown_and_replies_are_recorded() {
    let sd = SimShutdown::new();
    let mut handle = sd.clone();
    handle.invoke_shutdown("stagesync: boom");
    assert_eq!(sd.requested().as_deref(), Some("stagesync: boom"));
    assert_eq!(sd.count(), 1);

    let log = ReplyLog::new();
    let mut r = log.clone();
    r.respond_info("hello");
    assert_eq!(log.lines(), vec!["hello".to_string()]);
}
