use std::sync::mpsc::{self, Receiver, RecvError, Sender};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};

/// Unified event type consumed by the app loop.
#[derive(Clone, Debug)]
pub enum Event {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Source of app events: keyboard, resize, and the periodic clock tick.
pub trait EventSource {
    /// Block for the next event. `Err` means the source has shut down.
    fn recv(&self) -> Result<Event, RecvError>;
}

/// Production event source: a crossterm reader thread plus a ticker thread,
/// funneled into one channel. Both threads exit once the receiving side is
/// dropped, so dropping the source cancels the periodic tick.
pub struct CrosstermEventSource {
    rx: Receiver<Event>,
}

impl CrosstermEventSource {
    pub fn new(tick_interval: Duration) -> Self {
        let (tx, rx) = mpsc::channel();

        let key_tx = tx.clone();
        std::thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) => {
                    if key_tx.send(Event::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if key_tx.send(Event::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        std::thread::spawn(move || loop {
            std::thread::sleep(tick_interval);
            if tx.send(Event::Tick).is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl EventSource for CrosstermEventSource {
    fn recv(&self) -> Result<Event, RecvError> {
        self.rx.recv()
    }
}

/// Channel-backed event source for headless tests: the test holds the
/// sender and scripts the exact event sequence.
pub struct TestEventSource {
    rx: Receiver<Event>,
}

impl TestEventSource {
    pub fn channel() -> (Sender<Event>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self { rx })
    }
}

impl EventSource for TestEventSource {
    fn recv(&self) -> Result<Event, RecvError> {
        self.rx.recv()
    }
}
