#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not.
    if let Ok(cfg) = stagesync_config::load_toml(data) {
        let _ = cfg.validate();
        let _ = cfg.referenced_heaters();
        for (primary, section) in cfg.instances() {
            let _ = stagesync_core::SyncCfg::from((primary, section));
        }
    }
});
