#![no_main]
use libfuzzer_sys::{arbitrary, fuzz_target};
use stagesync_core::StageTable;
use stagesync_host::SimRegistry;

#[derive(Debug, arbitrary::Arbitrary)]
struct Input {
    stages: String,
    temp_ratio: String,
}

fuzz_target!(|input: Input| {
    let registry = SimRegistry::with_heaters(input.stages.split(',').map(str::trim));
    if let Ok(table) = StageTable::build(&input.stages, &input.temp_ratio, &registry) {
        assert!(!table.is_empty());
        for stage in table.iter() {
            assert!((0.0..=2.0).contains(&stage.ratio()));
        }
    }
});
