#![no_main]

use libfuzzer_sys::fuzz_target;
use wa_session::core::bytes::ByteView;
use wa_session::protocol::frame::open_frame;
use wa_session::protocol::handshake::derive_login_keys;
use wa_session::protocol::keys::{IdentityKeys, SessionKeys};

fuzz_target!(|data: &[u8]| {
    let identity = IdentityKeys::from_private_bytes([0x21; 32]);
    let _ = derive_login_keys(&identity, &ByteView::from(data));

    let keys = SessionKeys {
        enc_key: [0x01; 32],
        mac_key: [0x02; 32],
        server_token: String::new(),
        client_token: String::new(),
    };
    let _ = open_frame(&ByteView::from(data), &keys);
});
