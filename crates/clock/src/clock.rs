use std::panic::{self, AssertUnwindSafe};

/// Events a [`Clock`] dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClockEvent {
    /// Once per display refresh while running.
    Tick,
}

/// Returned by [`Clock::on`]; pass to [`Clock::off`] to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Outcome of one [`Clock::tick`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub frame: u64,
    pub fired: usize,
    pub failed: usize,
}

type Listener<C> = Box<dyn FnMut(&mut C)>;

/// Dispatches tick events to listeners that borrow the host context `C`.
///
/// The host loop calls [`Clock::tick`] once per display refresh and forwards
/// window focus changes through [`Clock::focus_changed`].
pub struct Clock<C> {
    listeners: Vec<(ListenerId, ClockEvent, Listener<C>)>,
    next_id: u64,
    running: bool,
    frame: u64,
}

impl<C> Default for Clock<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Clock<C> {
    /// A running clock with no listeners.
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 0,
            running: true,
            frame: 0,
        }
    }

    pub fn on(&mut self, event: ClockEvent, listener: impl FnMut(&mut C) + 'static) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.listeners.push((id, event, Box::new(listener)));
        id
    }

    /// Returns whether `id` was subscribed.
    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _, _)| *listener != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Frames seen so far, running or not.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Blur stops the clock, focus resumes it.
    pub fn focus_changed(&mut self, focused: bool) {
        if focused {
            self.start();
            tracing::info!("Clock resumed");
        } else {
            self.stop();
            tracing::info!("Clock stopped");
        }
    }

    /// Count a display refresh and, while running, fire every tick listener.
    pub fn tick(&mut self, ctx: &mut C) -> TickReport {
        self.frame += 1;
        let mut report = TickReport {
            frame: self.frame,
            ..TickReport::default()
        };
        if !self.running {
            return report;
        }

        for (id, event, listener) in &mut self.listeners {
            if *event != ClockEvent::Tick {
                continue;
            }
            match panic::catch_unwind(AssertUnwindSafe(|| listener(&mut *ctx))) {
                Ok(()) => report.fired += 1,
                Err(payload) => {
                    report.failed += 1;
                    tracing::error!(
                        listener = id.0,
                        frame = self.frame,
                        "tick listener panicked: {}",
                        panic_message(payload.as_ref())
                    );
                }
            }
        }
        tracing::trace!(frame = self.frame, fired = report.fired, "tick");
        report
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_fires_listeners_in_order() {
        let mut clock: Clock<Vec<u8>> = Clock::new();
        clock.on(ClockEvent::Tick, |log| log.push(1));
        clock.on(ClockEvent::Tick, |log| log.push(2));

        let mut log = Vec::new();
        let report = clock.tick(&mut log);
        assert_eq!(log, vec![1, 2]);
        assert_eq!(report.fired, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(report.frame, 1);
    }

    #[test]
    fn stopped_clock_counts_frames_only() {
        let mut clock: Clock<u32> = Clock::new();
        clock.on(ClockEvent::Tick, |n| *n += 1);
        let mut n = 0;

        clock.stop();
        let report = clock.tick(&mut n);
        assert_eq!(report.fired, 0);
        assert_eq!(n, 0);

        clock.start();
        clock.tick(&mut n);
        assert_eq!(n, 1);
        assert_eq!(clock.frame(), 2);
    }

    #[test]
    fn focus_pauses_and_resumes() {
        let mut clock: Clock<()> = Clock::new();
        assert!(clock.is_running());
        clock.focus_changed(false);
        assert!(!clock.is_running());
        clock.focus_changed(true);
        assert!(clock.is_running());
    }

    #[test]
    fn off_unsubscribes() {
        let mut clock: Clock<u32> = Clock::new();
        let id = clock.on(ClockEvent::Tick, |n| *n += 1);
        assert!(clock.off(id));
        assert!(!clock.off(id));

        let mut n = 0;
        clock.tick(&mut n);
        assert_eq!(n, 0);
        assert_eq!(clock.listener_count(), 0);
    }

    #[test]
    fn panicking_listener_is_isolated() {
        let mut clock: Clock<u32> = Clock::new();
        clock.on(ClockEvent::Tick, |_| panic!("bad listener"));
        clock.on(ClockEvent::Tick, |n| *n += 1);

        let mut n = 0;
        let report = clock.tick(&mut n);
        assert_eq!(report.failed, 1);
        assert_eq!(report.fired, 1);
        assert_eq!(n, 1);

        clock.tick(&mut n);
        assert_eq!(n, 2);
    }
}
