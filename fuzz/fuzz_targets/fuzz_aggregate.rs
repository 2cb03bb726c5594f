// Fuzz target feeding arbitrary layer text through the full aggregation pipeline.
#![no_main]

use std::collections::HashSet;

use libfuzzer_sys::fuzz_target;
use ruleset_engine::{to_json, RulesetEngine};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // Record separator splits the input into the three layers.
    let mut layers = text.splitn(3, '\u{1e}');
    let base = layers.next().unwrap_or("{}");
    let updated = layers.next().unwrap_or("{}");
    let custom = layers.next().unwrap_or("{}");

    if let Ok(run) = RulesetEngine::default().run_json(base, updated, custom) {
        let mut seen = HashSet::new();
        for record in run.output.iter() {
            assert!(seen.insert(record.domain().to_string()), "duplicate domain in output");
            assert!(!run.deletions.domains.contains(record.domain()));
        }
        let _ = to_json(&run.output);
    }
});
