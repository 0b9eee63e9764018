//! Fuzz target for device reply decoding
//!
//! Replies come from whatever is on the other end of the port, which during
//! dialect detection may be the wrong firmware or no firmware at all.
//!
//! # Invariants
//!
//! - Decoding NEVER panics; bad input is a `ProtocolError`
//! - A reply accepted as a VERSION reply is exactly 32 bytes
//! - A reply accepted as an IDENT reply is never also a VERSION reply

#![no_main]

use ledmarquee_proto::{official, official::VersionReply, sigroot};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(reply) = VersionReply::from_bytes(data) {
        assert_eq!(data.len(), official::REPLY_SIZE);
        let _ = reply.version();
    }

    let is_version = official::is_version_reply(data);
    if let Ok(version) = sigroot::parse_ident(data) {
        assert!(!is_version, "reply matched both dialects");
        assert!(version.patch.is_none());
    }
});
