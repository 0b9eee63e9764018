//! Property-based tests for the dialect encoders.
//!
//! These check the bit-level contracts of both dialects for arbitrary module
//! grids rather than hand-picked examples.

use ledmarquee_proto::{
    GAMMA, MODULE_HEIGHT, MODULE_WIDTH, PixelGrid, gamma, official,
    official::{BitDepth, VersionReply},
    sigroot,
};
use proptest::prelude::*;

/// Strategy for module-sized grids with a mix of dark, lit, and partial cells.
fn arbitrary_module_grid() -> impl Strategy<Value = PixelGrid> {
    prop::collection::vec(
        prop_oneof![Just(0.0f32), Just(1.0f32), 0.0f32..=1.0f32],
        MODULE_HEIGHT * MODULE_WIDTH,
    )
    .prop_map(|cells| {
        PixelGrid::from_fn(MODULE_HEIGHT, MODULE_WIDTH, |r, c| cells[r * MODULE_WIDTH + c])
    })
}

proptest! {
    #[test]
    fn prop_gamma_is_monotonic_and_bounded(a in 0.0f32..=1.0, b in 0.0f32..=1.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        // PROPERTY: brighter input never yields a dimmer output
        prop_assert!(gamma(lo) <= gamma(hi));
    }

    #[test]
    fn prop_mono_bit_matches_pixel(grid in arbitrary_module_grid()) {
        let packed = official::pack_mono(&grid).expect("module grid packs");

        for r in 0..MODULE_HEIGHT {
            for c in 0..MODULE_WIDTH {
                let index = r * MODULE_WIDTH + c;
                let bit = packed[index / 8] >> (index % 8) & 1 == 1;
                prop_assert_eq!(bit, grid.value(r, c) > 0.0, "pixel ({}, {})", r, c);
            }
        }

        // PROPERTY: the 2 unused trailing bits are never set
        prop_assert_eq!(packed[38] & 0b1111_1100, 0);
    }

    #[test]
    fn prop_grey_columns_are_transposed_gamma(grid in arbitrary_module_grid()) {
        let frames = official::grey_draw(&grid).expect("module grid encodes");
        prop_assert_eq!(frames.len(), MODULE_WIDTH + 1);

        for c in 0..MODULE_WIDTH {
            let frame = &frames[c];
            for r in 0..MODULE_HEIGHT {
                prop_assert_eq!(frame[2 + r], gamma(grid.value(r, c)));
            }
        }
    }

    #[test]
    fn prop_pwm_draw_is_row_major_gamma(grid in arbitrary_module_grid()) {
        let bytes = sigroot::pwm_draw(&grid).expect("module grid encodes");
        let expected: Vec<u8> = grid.cells().iter().map(|&v| gamma(v)).collect();
        prop_assert_eq!(&bytes[1..], &expected[..]);
    }

    #[test]
    fn prop_version_reply_fields(major in any::<u8>(), minor in 0u8..16, patch in 0u8..16, pre in any::<bool>()) {
        let bytes = VersionReply::new(major, minor, patch, pre).to_bytes();
        let version = VersionReply::from_bytes(&bytes).expect("32 bytes").version();

        prop_assert_eq!(version.major, u16::from(major));
        prop_assert_eq!(version.minor, u16::from(minor));
        prop_assert_eq!(version.patch, Some(u16::from(patch)));
        prop_assert_eq!(version.pre_release, pre);
        prop_assert!(official::is_version_reply(&bytes));
    }

    #[test]
    fn prop_ident_reply_parses(major in 0u16..10, minor in 0u16..10) {
        let reply = sigroot::ident_reply(major, minor);
        let version = sigroot::parse_ident(reply.as_bytes()).expect("well-formed ident");
        prop_assert_eq!((version.major, version.minor), (major, minor));

        // PROPERTY: a sigroot ident never passes the official zero-padding check
        prop_assert!(!official::is_version_reply(reply.as_bytes()));
    }

    #[test]
    fn prop_decoders_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let _ = VersionReply::from_bytes(&bytes);
        let _ = official::is_version_reply(&bytes);
        let _ = sigroot::parse_ident(&bytes);
    }
}

#[test]
fn gamma_table_endpoints() {
    assert_eq!(GAMMA[0], 0);
    assert_eq!(GAMMA[255], 255);
}

#[test]
fn mono_draw_wire_bytes() {
    let mut grid = PixelGrid::module();
    grid.set(0, 0, 1.0);
    let bytes = official::mono_draw(&grid).unwrap();
    insta::assert_snapshot!(
        hex::encode(&bytes),
        @"32ac06010000000000000000000000000000000000000000000000000000000000000000000000000000"
    );
}

#[test]
fn control_frames_wire_bytes() {
    insta::assert_snapshot!(hex::encode(official::version_request()), @"32ac20");
    insta::assert_snapshot!(hex::encode(official::commit_grey_columns()), @"08");
    insta::assert_snapshot!(hex::encode(sigroot::ident_request()), @"7f");
    insta::assert_snapshot!(hex::encode(sigroot::set_const_scale(sigroot::CONST_SCALE)), @"7320");
}

#[test]
fn bit_depth_labels() {
    assert_eq!(BitDepth::default(), BitDepth::Mono1);
    assert_eq!(BitDepth::Gray8.to_string(), "8-bit Grayscale");
}
