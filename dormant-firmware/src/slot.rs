//! Handler contexts owned by a single vector

use core::cell::UnsafeCell;

use portable_atomic::{AtomicBool, Ordering};

/// The slot already holds a context
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub struct AlreadyInstalled;

/// A context written once at startup, then used only by its own vector
///
/// Unlike a `critical_section::Mutex`, reaching the context does not mask
/// interrupts, so a more urgent vector can still preempt the handler
/// while it busy-waits.
pub struct HandlerSlot<T> {
    installed: AtomicBool,
    value: UnsafeCell<Option<T>>,
}

// SAFETY: the value is written once before its vector is enabled and
// afterwards touched only from that vector, which cannot preempt itself
unsafe impl<T: Send> Sync for HandlerSlot<T> {}

impl<T> HandlerSlot<T> {
    pub const fn new() -> Self {
        Self {
            installed: AtomicBool::new(false),
            value: UnsafeCell::new(None),
        }
    }

    /// Store the context; call from startup before the vector is enabled
    pub fn install(&self, value: T) -> Result<(), AlreadyInstalled> {
        critical_section::with(|_| {
            if self.installed.load(Ordering::Relaxed) {
                return Err(AlreadyInstalled);
            }
            // SAFETY: not yet installed, so no vector can be reading it
            unsafe { *self.value.get() = Some(value) };
            self.installed.store(true, Ordering::Release);
            Ok(())
        })
    }

    /// The installed context, or `None` if startup has not reached it
    ///
    /// # Safety
    ///
    /// Only the vector that owns this slot may call this.
    pub unsafe fn get_mut(&self) -> Option<&mut T> {
        if !self.installed.load(Ordering::Acquire) {
            return None;
        }
        (*self.value.get()).as_mut()
    }
}
