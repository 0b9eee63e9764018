//! Perceptual brightness correction.
//!
//! LED brightness is linear in PWM duty but perceived brightness is not. The
//! table maps a linear 8-bit intensity to the duty cycle that looks like it.

/// Gamma lookup table, indexed by linear intensity.
///
/// Monotonic non-decreasing, `GAMMA[0] == 0`, `GAMMA[255] == 255`.
pub const GAMMA: [u8; 256] = [
    0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1, 1, //
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, //
    1, 1, 1, 2, 2, 2, 2, 2, 2, 2, 2, 2, 3, 3, 3, 3, //
    3, 3, 3, 4, 4, 4, 4, 4, 4, 5, 5, 5, 5, 6, 6, 6, //
    6, 6, 7, 7, 7, 7, 8, 8, 8, 9, 9, 9, 10, 10, 10, 11, //
    11, 11, 12, 12, 12, 13, 13, 14, 14, 14, 15, 15, 16, 16, 17, 17, //
    17, 18, 18, 19, 19, 20, 20, 21, 22, 22, 23, 23, 24, 24, 25, 26, //
    26, 27, 27, 28, 29, 29, 30, 31, 32, 32, 33, 34, 34, 35, 36, 37, //
    38, 38, 39, 40, 41, 42, 42, 43, 44, 45, 46, 47, 48, 49, 50, 51, //
    52, 53, 54, 55, 56, 57, 58, 59, 60, 61, 62, 63, 64, 66, 67, 68, //
    69, 70, 71, 73, 74, 75, 76, 78, 79, 80, 82, 83, 84, 86, 87, 88, //
    90, 91, 93, 94, 96, 97, 99, 100, 102, 103, 105, 106, 108, 110, 111, 113, //
    115, 116, 118, 120, 121, 123, 125, 127, 128, 130, 132, 134, 136, 138, 140, 141, //
    143, 145, 147, 149, 151, 153, 155, 157, 159, 161, 164, 166, 168, 170, 172, 174, //
    177, 179, 181, 183, 186, 188, 190, 193, 195, 197, 200, 202, 205, 207, 210, 212, //
    215, 217, 220, 222, 225, 228, 230, 233, 236, 238, 241, 244, 247, 249, 252, 255, //
];

/// Corrected device brightness for a linear intensity in `[0, 1]`.
///
/// Out of range input is clamped. NaN maps to 0.
#[must_use]
pub fn gamma(value: f32) -> u8 {
    let index = (value.clamp(0.0, 1.0) * 255.0).floor() as usize;
    GAMMA[index.min(255)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints() {
        assert_eq!(GAMMA[0], 0);
        assert_eq!(GAMMA[255], 255);
        assert_eq!(gamma(0.0), 0);
        assert_eq!(gamma(1.0), 255);
    }

    #[test]
    fn table_is_monotonic() {
        for pair in GAMMA.windows(2) {
            assert!(pair[0] <= pair[1], "{} > {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn clamps_out_of_range() {
        assert_eq!(gamma(-3.0), 0);
        assert_eq!(gamma(7.5), 255);
        assert_eq!(gamma(f32::NAN), 0);
    }

    #[test]
    fn floors_to_table_index() {
        // 0.5 * 255 = 127.5 -> index 127
        assert_eq!(gamma(0.5), GAMMA[127]);
    }
}
