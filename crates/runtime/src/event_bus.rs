/// Ordered, typed event bus.
///
/// Session mutations publish events here; the app drains the bus once per
/// UI turn and refreshes the subscribed views. Publishers never know which
/// views exist, and views never call each other.
///
/// Ordering contract: `drain` yields events in publication order.
#[derive(Debug)]
pub struct EventBus<E> {
    events: Vec<E>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&mut self, event: E) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn drain(&mut self) -> Vec<E> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::EventBus;

    #[derive(Debug, PartialEq, Eq)]
    enum Ev {
        A,
        B,
    }

    #[test]
    fn drain_preserves_publication_order() {
        let mut bus = EventBus::new();
        bus.publish(Ev::A);
        bus.publish(Ev::B);
        assert_eq!(bus.len(), 2);
        assert_eq!(bus.drain(), vec![Ev::A, Ev::B]);
        assert!(bus.is_empty());
    }

    #[test]
    fn drain_on_empty_bus_is_empty() {
        let mut bus: EventBus<Ev> = EventBus::new();
        assert!(bus.drain().is_empty());
    }
}
