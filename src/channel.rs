//! Per-channel pulse capture, classification, and the public query surface.

use core::cell::RefCell;

use critical_section::Mutex;
use embedded_hal::digital::InputPin;
use portable_atomic::{AtomicU16, Ordering};

use crate::filter::SampleFilter;
use crate::mapping::{pulse_to_byte, MAX_PULSE_US, MIN_PULSE_US};
use crate::registry::EdgeHandler;
use crate::status::RxStatus;
use crate::time::TickSource;

/// Depth of the smoothing window.
pub const RING_DEPTH: usize = 10;

/// Channel tuning knobs.
///
/// Customize at compile time by declaring your own const; most receivers
/// are fine with [`DEFAULT_CONFIG`].
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelConfig {
    /// Raw widths at or below this bound are rejected, in microseconds.
    pub min_pulse_us: u16,
    /// Raw widths at or above this bound are rejected, in microseconds.
    pub max_pulse_us: u16,
    /// Silence on the line longer than this counts as a stale-signal
    /// error on the next query, in microseconds.
    pub stale_after_us: u32,
    /// Upper bound on each busy-wait phase of [`PwmChannel::poll`], in
    /// tick units.
    pub poll_timeout: u32,
}

impl ChannelConfig {
    /// Whether a raw width lies strictly inside the accepted window.
    ///
    /// Both comparisons are exclusive: a width exactly equal to either
    /// bound is rejected.
    #[inline]
    #[must_use]
    pub const fn accepts(&self, us: u16) -> bool {
        us > self.min_pulse_us && us < self.max_pulse_us
    }
}

/// Nominal RC servo-pulse configuration.
pub const DEFAULT_CONFIG: ChannelConfig = ChannelConfig {
    min_pulse_us: MIN_PULSE_US,
    max_pulse_us: MAX_PULSE_US,
    stale_after_us: 100_000,
    poll_timeout: 100_000,
};

/// One-shot calibrated center/trim reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ZeroPoint {
    /// Smoothed pulse width at the moment of calibration, in microseconds.
    pub us: u16,
    /// The same reference mapped into the 0-255 output range.
    pub byte: u8,
}

/// State shared between the edge path and the foreground query path.
/// Touched only inside a critical section, or through `&mut` exclusivity
/// in poll mode.
struct Shared<T, P> {
    tick: T,
    pin: P,
    filter: SampleFilter<RING_DEPTH>,
    status: RxStatus,
    zero: Option<ZeroPoint>,
    /// Tick value at the last rising edge; cleared by the falling edge.
    rise_at: Option<u32>,
    /// Set by the capture paths, consumed by the staleness check.
    fresh: bool,
    /// Tick value when the staleness check last saw, or last charged
    /// for, a sample.
    seen_at: u32,
    config: ChannelConfig,
}

impl<T: TickSource, P> Shared<T, P> {
    /// Classify one raw width, feed the filter, and run the calibration
    /// gate.
    fn record_sample(&mut self, width: u16) {
        if self.config.accepts(width) {
            self.filter.push(width);
            self.status.record_valid();
        } else {
            self.status.record_error();
        }
        if !self.status.is_calibrated() {
            self.try_calibrate();
        }
    }

    /// Latch the zero point on the first full, error-free window.
    fn try_calibrate(&mut self) {
        if self.filter.is_full() && !self.status.has_error() {
            let us = self.filter.average();
            self.zero = Some(ZeroPoint {
                us,
                byte: pulse_to_byte(us),
            });
            self.status.set_calibrated();
        }
    }

    /// Charge at most one stale-signal error per gap-exceeding call.
    ///
    /// A fresh sample re-anchors the silence window; so does charging for
    /// a gap, which is what keeps repeated queries during one outage from
    /// inflating the count once per call.
    fn check_staleness(&mut self) {
        let now = self.tick.now_us();
        if self.fresh {
            self.seen_at = now;
        } else if now.wrapping_sub(self.seen_at) > self.config.stale_after_us {
            self.status.record_error();
            self.seen_at = now;
        }
        self.fresh = false;
    }
}

/// One decoded RC PWM channel.
///
/// Construct it with an owned tick source and an input pin the platform
/// has already configured, then either lend it to the interrupt
/// [`registry`](crate::registry) (edge mode) or drive it with
/// [`poll`](Self::poll) (poll mode). The two modes are mutually exclusive
/// on a single channel, and the receiver types enforce that: a channel
/// lent out as `&'static` for edge dispatch can no longer be polled.
///
/// All queries are safe to call from the foreground while edges are being
/// handled; shared state is guarded by critical sections throughout.
pub struct PwmChannel<T, P> {
    shared: Mutex<RefCell<Shared<T, P>>>,
    /// Mirror of the most recent raw width for lock-free reads.
    last_raw: AtomicU16,
}

impl<T: TickSource, P: InputPin> PwmChannel<T, P> {
    /// Create a channel with [`DEFAULT_CONFIG`].
    #[must_use]
    pub fn new(tick: T, pin: P) -> Self {
        Self::with_config(tick, pin, DEFAULT_CONFIG)
    }

    /// Create a channel with a custom configuration.
    #[must_use]
    pub fn with_config(mut tick: T, pin: P, config: ChannelConfig) -> Self {
        let seen_at = tick.now_us();
        Self {
            shared: Mutex::new(RefCell::new(Shared {
                tick,
                pin,
                filter: SampleFilter::new(),
                status: RxStatus::new(),
                zero: None,
                rise_at: None,
                fresh: false,
                seen_at,
                config,
            })),
            last_raw: AtomicU16::new(0),
        }
    }

    /// Edge-path entry point: measure, classify, maybe calibrate.
    ///
    /// Call on every logic transition of the input line, usually via
    /// [`registry::dispatch`](crate::registry::dispatch). The whole body
    /// runs inside one critical section, so back-to-back edges and
    /// foreground queries each observe a complete update or none of it.
    ///
    /// A rising edge only records the start reference; the falling edge
    /// produces the sample. A falling edge with no recorded start (the
    /// channel attached mid-pulse) produces nothing.
    pub fn handle_edge(&self) {
        critical_section::with(|cs| {
            let mut shared = self.shared.borrow_ref_mut(cs);
            shared.fresh = true;
            let now = shared.tick.now_us();
            let Ok(is_high) = shared.pin.is_high() else {
                // Nothing sensible to do with a pin fault mid-interrupt;
                // drop the edge and let staleness accounting surface it.
                return;
            };
            if is_high {
                shared.rise_at = Some(now);
            } else if let Some(start) = shared.rise_at.take() {
                let width = clamp_width(now.wrapping_sub(start));
                shared.record_sample(width);
                self.last_raw.store(width, Ordering::Relaxed);
            }
        });
    }

    /// Blocking, interrupt-free capture of a single pulse.
    ///
    /// Busy-waits for the line to assert and times the high period, each
    /// wait phase bounded by `config.poll_timeout` ticks; a timed-out
    /// measurement yields a zero-width sample, which classifies as
    /// invalid. The result feeds the same classification, filtering, and
    /// calibration path as the edge handler. Returns whether a nonzero
    /// pulse was observed.
    ///
    /// Runs without masking interrupts: exclusive `&mut` access replaces
    /// the critical section here, which also keeps a slow line from
    /// stalling unrelated interrupts.
    pub fn poll(&mut self) -> bool {
        let width = {
            let shared = self.shared.get_mut().get_mut();
            let timeout = shared.config.poll_timeout;
            measure_pulse(&mut shared.tick, &mut shared.pin, timeout)
        };
        let shared = self.shared.get_mut().get_mut();
        shared.fresh = true;
        shared.record_sample(width);
        self.last_raw.store(width, Ordering::Relaxed);
        width != 0
    }

    /// Current trimmed-mean value mapped onto the 0-255 range.
    ///
    /// No has-data gating happens here: from a cold start the window
    /// still contains zeros and the result is meaningless. Callers that
    /// need a trustworthy value check [`has_error`](Self::has_error) and
    /// [`is_calibrated`](Self::is_calibrated) first.
    #[must_use]
    pub fn value(&self) -> u8 {
        let us = critical_section::with(|cs| self.shared.borrow_ref(cs).filter.average());
        pulse_to_byte(us)
    }

    /// Current trimmed-mean value in microseconds.
    ///
    /// Also runs the staleness check first: if no sample has arrived for
    /// longer than `config.stale_after_us`, one error is charged per
    /// gap-exceeding call.
    #[must_use]
    pub fn value_us(&self) -> u16 {
        critical_section::with(|cs| {
            let mut shared = self.shared.borrow_ref_mut(cs);
            shared.check_staleness();
            shared.filter.average()
        })
    }

    /// Most recent raw pulse width in microseconds, unsmoothed.
    /// Lock-free.
    #[must_use]
    pub fn last_raw_us(&self) -> u16 {
        self.last_raw.load(Ordering::Relaxed)
    }

    /// True iff at least one error has occurred since the last valid
    /// sample (including "no data yet" after construction).
    #[must_use]
    pub fn has_error(&self) -> bool {
        critical_section::with(|cs| self.shared.borrow_ref(cs).status.has_error())
    }

    /// Whether the zero point has been latched.
    #[must_use]
    pub fn is_calibrated(&self) -> bool {
        critical_section::with(|cs| self.shared.borrow_ref(cs).status.is_calibrated())
    }

    /// The latched center/trim reference, once calibration has fired.
    #[must_use]
    pub fn zero_point(&self) -> Option<ZeroPoint> {
        critical_section::with(|cs| self.shared.borrow_ref(cs).zero)
    }
}

impl<T, P> EdgeHandler for PwmChannel<T, P>
where
    T: TickSource + Send,
    P: InputPin + Send,
{
    fn on_edge(&self) {
        self.handle_edge();
    }
}

/// Saturate an elapsed time into the sample domain. Anything past
/// `u16::MAX` is far outside the accepted window either way.
#[inline]
fn clamp_width(elapsed_us: u32) -> u16 {
    elapsed_us.min(u32::from(u16::MAX)) as u16
}

/// Wait out any in-progress pulse, wait for the rising edge, then time
/// the high period. Returns 0 if any phase exceeds `timeout` ticks.
/// A pin read fault reads as "line low".
fn measure_pulse<T: TickSource, P: InputPin>(tick: &mut T, pin: &mut P, timeout: u32) -> u16 {
    let mut phase = tick.now_us();
    while pin.is_high().unwrap_or(false) {
        if tick.elapsed_us(phase) > timeout {
            return 0;
        }
    }
    phase = tick.now_us();
    while !pin.is_high().unwrap_or(false) {
        if tick.elapsed_us(phase) > timeout {
            return 0;
        }
    }
    let rise = tick.now_us();
    while pin.is_high().unwrap_or(false) {
        if tick.elapsed_us(rise) > timeout {
            return 0;
        }
    }
    clamp_width(tick.elapsed_us(rise))
}
