#![no_main]
use assetid::core::{GenerationRule, Platform};
use assetid::detection::patterns::{find_slot, substitute_index, PatternGenerator};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(pattern) = std::str::from_utf8(data) else {
        return;
    };
    let _ = find_slot(pattern);
    for index in [0, 7, 99, u32::MAX] {
        let _ = substitute_index(pattern, index);
    }
    let generator = PatternGenerator::new(&[]);
    for rule in [
        GenerationRule::Literal,
        GenerationRule::DiskNumber,
        GenerationRule::RoomNumber,
        GenerationRule::HumongousPc,
        GenerationRule::HumongousMac,
        GenerationRule::HumongousMacNoParens,
        GenerationRule::ResourceFork,
    ] {
        let _ = generator.generate(&rule, pattern, Platform::Dos);
    }
});
