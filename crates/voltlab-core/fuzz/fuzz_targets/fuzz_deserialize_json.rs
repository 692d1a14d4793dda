#![no_main]
use libfuzzer_sys::fuzz_target;
use voltlab_core::control::Control;

fuzz_target!(|data: &[u8]| {
    // Feed arbitrary text to Control::from_json.
    // Must not panic -- returning Err is fine.
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = Control::from_json(text);
    }
});
