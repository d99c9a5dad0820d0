//! Microsecond-to-byte normalization.
//!
//! RC gear encodes a channel position as a 900-2100 us high pulse with the
//! stick center near 1500 us. This module maps that microsecond domain onto
//! the public 0-255 output range.

/// Shortest pulse treated as a plausible RC frame, in microseconds.
pub const MIN_PULSE_US: u16 = 900;

/// Longest pulse treated as a plausible RC frame, in microseconds.
pub const MAX_PULSE_US: u16 = 2100;

/// Nominal pulse width at stick center, in microseconds.
pub const CENTER_PULSE_US: u16 = 1500;

/// Map a pulse width onto the normalized 0-255 range.
///
/// The map is affine over `[MIN_PULSE_US, MAX_PULSE_US]`, with
/// `pulse_to_byte(MIN_PULSE_US) == 0` and `pulse_to_byte(MAX_PULSE_US) == 255`
/// exactly. Inputs outside the window clamp to the output bounds; values fed
/// from the capture path have already passed range validation, so the clamp
/// is inert for them.
#[inline]
#[must_use]
pub fn pulse_to_byte(us: u16) -> u8 {
    let span = i32::from(MAX_PULSE_US - MIN_PULSE_US);
    let scaled = (i32::from(us) - i32::from(MIN_PULSE_US)) * 255 / span;
    scaled.clamp(0, 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_map_exactly() {
        assert_eq!(pulse_to_byte(MIN_PULSE_US), 0);
        assert_eq!(pulse_to_byte(MAX_PULSE_US), 255);
    }

    #[test]
    fn test_center_maps_to_midscale() {
        assert_eq!(pulse_to_byte(CENTER_PULSE_US), 127);
    }

    #[test]
    fn test_monotonic_over_valid_domain() {
        let mut prev = pulse_to_byte(MIN_PULSE_US);
        for us in MIN_PULSE_US..=MAX_PULSE_US {
            let mapped = pulse_to_byte(us);
            assert!(mapped >= prev, "map regressed at {} us", us);
            prev = mapped;
        }
    }

    #[test]
    fn test_out_of_window_inputs_clamp() {
        assert_eq!(pulse_to_byte(0), 0);
        assert_eq!(pulse_to_byte(500), 0);
        assert_eq!(pulse_to_byte(3000), 255);
        assert_eq!(pulse_to_byte(u16::MAX), 255);
    }
}
