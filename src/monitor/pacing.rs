use std::time::Duration;

/// Waits between poll cycles.
pub trait Pacer {
    fn pause(&mut self, interval: Duration);
}

pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn pause(&mut self, interval: Duration) {
        std::thread::sleep(interval);
    }
}
