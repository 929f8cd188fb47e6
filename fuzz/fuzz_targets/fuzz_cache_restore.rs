#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must be rejected cleanly or decode into a consistent store
    if let Ok(store) = urlindex::index::decode_store(data) {
        assert!(store.validate().is_ok());
        let _ = urlindex::index::encode_store(&store);
    }
});
