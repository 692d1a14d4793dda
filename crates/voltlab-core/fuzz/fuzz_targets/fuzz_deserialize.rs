#![no_main]
use libfuzzer_sys::fuzz_target;
use voltlab_core::control::Control;

fuzz_target!(|data: &[u8]| {
    // Feed arbitrary bytes to Control::deserialize.
    // Must not panic -- returning Err is fine.
    let _ = Control::deserialize(data);
});
