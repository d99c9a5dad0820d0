//! RC receiver PWM pulse timing, filtering, and calibration.
//!
//! A hobby RC receiver emits each channel as a recurring high pulse whose
//! width (nominally 900-2100 us) encodes the control position. This crate
//! turns that noisy, glitchy, sometimes-absent signal into a stable
//! normalized value. It is chip-agnostic: the platform supplies a microsecond
//! tick source and an input pin, and routes its edge interrupt into the
//! crate; everything else runs here and is fully testable on host.
//!
//! # Overview
//!
//! The crate is organized into several modules:
//!
//! - [`channel`]: Per-channel capture and the public query surface
//!   ([`PwmChannel`], [`ChannelConfig`], [`ZeroPoint`])
//! - [`filter`]: Fixed-window smoothing ([`SampleFilter`])
//! - [`status`]: Consecutive-error accounting and the calibration latch
//!   ([`RxStatus`])
//! - [`mapping`]: Microsecond-to-byte normalization ([`pulse_to_byte`])
//! - [`registry`]: Interrupt-line-to-channel dispatch
//!   ([`EdgeHandler`][registry::EdgeHandler], [`registry::dispatch`])
//! - [`time`]: Tick source capability ([`TickSource`])
//!
//! # Signal processing
//!
//! Each falling edge yields one raw pulse width. Widths strictly inside the
//! accepted window land in a ten-slot ring buffer; the reported value is the
//! window mean with the single highest and single lowest slot discarded, so
//! one glitched pulse cannot drag the output. Out-of-range widths and
//! silence on the line feed a consecutive-error counter instead. The first
//! time the window is full with no error active, the smoothed value is
//! latched once as the channel's zero point (center/trim reference).
//!
//! # Example
//!
//! ```ignore
//! use rc_pulse::{registry, PwmChannel};
//! use static_cell::StaticCell;
//!
//! static THROTTLE: StaticCell<PwmChannel<McuClock, McuPin>> = StaticCell::new();
//!
//! let channel = THROTTLE.init(PwmChannel::new(McuClock::new(), throttle_pin));
//! registry::register(0, channel)?;
//! // ... platform edge ISR for the pin calls registry::dispatch(0) ...
//!
//! loop {
//!     if !channel.has_error() {
//!         let throttle = channel.value(); // 0-255
//!     }
//! }
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations,
//! making it suitable for embedded systems with limited resources. Shared
//! state is guarded with `critical-section`, so it needs whatever
//! critical-section implementation the target platform provides (most HALs
//! ship one; host tests use the `std` implementation).

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod channel;
pub mod filter;
pub mod mapping;
pub mod registry;
pub mod status;
pub mod time;

// Re-export main types at crate root
pub use channel::{ChannelConfig, PwmChannel, ZeroPoint, DEFAULT_CONFIG, RING_DEPTH};
pub use filter::SampleFilter;
pub use mapping::{pulse_to_byte, CENTER_PULSE_US, MAX_PULSE_US, MIN_PULSE_US};
pub use registry::{EdgeHandler, RegistryError, MAX_IRQ_LINES};
pub use status::{RxStatus, ERROR_CEILING};
pub use time::TickSource;
