use crate::event::BusEvent;

/// A bus slave: receives every event addressed to it, in arrival order.
///
/// Called from the bus callback context, so implementations must not block
/// for long and must never fail. The bus never invokes `on_event` for the same
/// address concurrently.
pub trait SlaveHandler: Send + Sync {
    fn on_event(&self, event: BusEvent);
}

impl<F> SlaveHandler for F
where
    F: Fn(BusEvent) + Send + Sync,
{
    fn on_event(&self, event: BusEvent) {
        self(event)
    }
}
