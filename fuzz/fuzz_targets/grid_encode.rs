//! Fuzz target for draw command encoding
//!
//! # Strategy
//!
//! - Dimensions: exact module size most of the time, otherwise arbitrary
//! - Values: arbitrary floats, including NaN, infinities, and out-of-range
//!
//! # Invariants
//!
//! - Encoding NEVER panics
//! - Wrong dimensions are rejected by every encoder
//! - Module-sized grids encode to fixed frame sizes

#![no_main]

use arbitrary::Arbitrary;
use ledmarquee_proto::{MODULE_HEIGHT, MODULE_WIDTH, PixelGrid, official, sigroot};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Shape {
    Module,
    Other { rows: u8, cols: u8 },
}

#[derive(Debug, Arbitrary)]
struct Input {
    shape: Shape,
    values: Vec<f32>,
}

fuzz_target!(|input: Input| {
    let (rows, cols) = match input.shape {
        Shape::Module => (MODULE_HEIGHT, MODULE_WIDTH),
        Shape::Other { rows, cols } => (usize::from(rows), usize::from(cols)),
    };
    let grid = PixelGrid::from_fn(rows, cols, |r, c| {
        input.values.get(r * cols + c).copied().unwrap_or(0.0)
    });
    let module = rows == MODULE_HEIGHT && cols == MODULE_WIDTH;

    let mono = official::mono_draw(&grid);
    let grey = official::grey_draw(&grid);
    let pwm = sigroot::pwm_draw(&grid);

    assert_eq!(mono.is_ok(), module);
    assert_eq!(grey.is_ok(), module);
    assert_eq!(pwm.is_ok(), module);

    if module {
        assert_eq!(mono.unwrap().len(), 3 + official::MONO_FRAME_SIZE);
        assert_eq!(grey.unwrap().len(), MODULE_WIDTH + 1);
        assert_eq!(pwm.unwrap().len(), 1 + sigroot::PWM_FRAME_SIZE);
    }
});
