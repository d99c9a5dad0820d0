//! Interrupt-line-to-channel dispatch.
//!
//! Platforms route each edge interrupt into [`dispatch`] with the small
//! integer line id they assigned at attach time:
//!
//! ```ignore
//! #[interrupt]
//! fn IO_IRQ_BANK0() {
//!     // ... clear the pin's interrupt flag ...
//!     rc_pulse::registry::dispatch(0);
//! }
//! ```
//!
//! The registry only borrows the handlers it holds; ownership of a channel
//! stays with whoever constructed it.

use core::cell::RefCell;

use critical_section::Mutex;

/// Number of dispatchable interrupt lines.
pub const MAX_IRQ_LINES: usize = 8;

/// Callback seam between a platform edge interrupt and a channel.
///
/// Implementations must tolerate back-to-back invocation with no
/// intervening application code.
pub trait EdgeHandler: Sync {
    /// Invoked on every logic-level transition of the attached line.
    fn on_edge(&self);
}

/// Error type for registry operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistryError {
    /// The line id is not below [`MAX_IRQ_LINES`].
    LineOutOfRange,
    /// Another handler is already attached to this line.
    LineOccupied,
}

static HANDLERS: Mutex<RefCell<[Option<&'static dyn EdgeHandler>; MAX_IRQ_LINES]>> =
    Mutex::new(RefCell::new([None; MAX_IRQ_LINES]));

/// Attach a handler to an interrupt line.
///
/// # Errors
///
/// Returns [`RegistryError::LineOutOfRange`] for an invalid line id and
/// [`RegistryError::LineOccupied`] if the line already has a handler;
/// detach the old one first.
pub fn register(line: usize, handler: &'static dyn EdgeHandler) -> Result<(), RegistryError> {
    critical_section::with(|cs| {
        let mut handlers = HANDLERS.borrow_ref_mut(cs);
        let slot = handlers
            .get_mut(line)
            .ok_or(RegistryError::LineOutOfRange)?;
        if slot.is_some() {
            return Err(RegistryError::LineOccupied);
        }
        *slot = Some(handler);
        Ok(())
    })
}

/// Detach whatever handler is attached to `line`, if any.
pub fn unregister(line: usize) {
    critical_section::with(|cs| {
        if let Some(slot) = HANDLERS.borrow_ref_mut(cs).get_mut(line) {
            *slot = None;
        }
    });
}

/// Route one edge interrupt to the handler attached to `line`.
///
/// Unattached and out-of-range lines are ignored: an interrupt that fires
/// during detach, or before attach completes, must never fault.
pub fn dispatch(line: usize) {
    let handler =
        critical_section::with(|cs| HANDLERS.borrow_ref(cs).get(line).copied().flatten());
    if let Some(handler) = handler {
        handler.on_edge();
    }
}
