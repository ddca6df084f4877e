//! The single-slot registration through which the interrupt bridge wakes the
//! consumer task blocked waiting for received packets.

use alloc::sync::Arc;
use nic_platform::RxWaker;
use spin::Mutex;

/// A one-slot cell holding the waker of the task waiting for RX data.
///
/// Occupancy of the slot *is* the "waiting for RX" flag: the consumer
/// registers its waker before yielding, and the interrupt bridge empties the
/// slot when it wakes the consumer. The receive path is single-consumer
/// (one tail pointer, destructive reads), so registering while another
/// waiter is present is refused rather than silently queued or fanned out.
pub struct RxWaitCell {
    waiter: Mutex<Option<Arc<dyn RxWaker>>>,
}

impl RxWaitCell {
    pub(crate) fn new() -> RxWaitCell {
        RxWaitCell { waiter: Mutex::new(None) }
    }

    /// Registers the calling consumer's waker; the caller should yield
    /// afterwards and will be woken by the next receive-timer interrupt.
    /// There is no timeout: if no packet ever arrives, the consumer stays
    /// blocked until the interrupt bridge wakes it.
    ///
    /// Returns an error if another consumer is already waiting.
    pub fn register(&self, waker: Arc<dyn RxWaker>) -> Result<(), &'static str> {
        let mut waiter = self.waiter.lock();
        if waiter.is_some() {
            return Err("e1000: another task is already waiting for received packets");
        }
        *waiter = Some(waker);
        Ok(())
    }

    /// Wakes and deregisters the waiting consumer, if any.
    /// Returns whether a consumer was woken.
    pub(crate) fn notify(&self) -> bool {
        match self.waiter.lock().take() {
            Some(waker) => {
                waker.wake();
                true
            }
            None => false,
        }
    }
}
