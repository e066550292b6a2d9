#![no_main]

use libfuzzer_sys::fuzz_target;
use wa_session::core::bytes::ByteView;
use wa_session::core::decoder::BinaryDecoder;
use wa_session::core::encoder::encode;

fuzz_target!(|data: &[u8]| {
    // Decoding arbitrary bytes must fail cleanly, never panic
    if let Ok(node) = BinaryDecoder::new().decode(&ByteView::from(data)) {
        // Anything that decodes re-encodes
        let _ = encode(&node);
    }
});
