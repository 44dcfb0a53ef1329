#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Whatever is on disk, an accepted rate must be usable as a duration factor.
    if let Ok(rate) = grinder_core::store::parse_rate(data) {
        assert!(rate.is_finite() && rate > 0.0);
        let secs = grinder_core::grind::grind_duration_s(rate, 30.0);
        assert!(!secs.is_nan());
    }
});
