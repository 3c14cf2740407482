//! Bounded queue for sending notes into the physics engine.
//!
//! Any number of producers on any threads may hold an `IngressSender`. The engine holds the one
//! `IngressReceiver` and drains it without blocking once per step. When the queue is full a
//! producer blocks for up to the configured timeout, and then gets its note back in an
//! `EnqueueError::Full`. The engine uses this same queue type for every ingress path so that they
//! all behave identically under load.

use crate::note::Note;
use std::{
    fmt,
    time::Duration,
};
use crossbeam_channel::{
    bounded,
    Sender,
    Receiver,
    SendTimeoutError,
    TryRecvError,
};


/// Create a queue holding at most `capacity` pending notes. Producers wait at most `timeout` for
/// space.
pub fn ingress_queue(capacity: usize, timeout: Duration) -> (IngressSender, IngressReceiver) {
    let (send, recv) = bounded(capacity);
    (IngressSender { send, timeout }, IngressReceiver(recv))
}

/// Sending half of an ingress queue.
#[derive(Debug, Clone)]
pub struct IngressSender {
    send: Sender<Note>,
    timeout: Duration,
}

/// Receiving half of an ingress queue.
#[derive(Debug)]
pub struct IngressReceiver(Receiver<Note>);

/// Failure to enqueue a note. Hands the note back to the producer.
#[derive(Debug, Clone, PartialEq)]
pub enum EnqueueError {
    /// The queue stayed full for the whole timeout.
    Full(Note),
    /// The receiving engine has been dropped.
    Closed(Note),
}

impl EnqueueError {
    pub fn into_note(self) -> Note {
        match self {
            EnqueueError::Full(note) | EnqueueError::Closed(note) => note,
        }
    }
}

impl fmt::Display for EnqueueError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EnqueueError::Full(_) => f.write_str("ingress queue full"),
            EnqueueError::Closed(_) => f.write_str("ingress queue closed"),
        }
    }
}

impl std::error::Error for EnqueueError {}

impl IngressSender {
    /// Enqueue a note, waiting for space if the queue is full.
    pub fn enqueue(&self, note: Note) -> Result<(), EnqueueError> {
        self.send.send_timeout(note, self.timeout).map_err(|e| match e {
            SendTimeoutError::Timeout(note) => EnqueueError::Full(note),
            SendTimeoutError::Disconnected(note) => EnqueueError::Closed(note),
        })
    }

    /// Number of notes currently waiting.
    pub fn len(&self) -> usize {
        self.send.len()
    }

    pub fn is_empty(&self) -> bool {
        self.send.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.send.capacity().unwrap_or(usize::MAX)
    }
}

impl IngressReceiver {
    /// Take the next pending note, if any. Never blocks.
    pub fn poll(&self) -> Option<Note> {
        match self.0.try_recv() {
            Ok(note) => Some(note),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Iterate over the notes pending right now, stopping once the queue is empty.
    pub fn drain(&self) -> impl Iterator<Item = Note> + '_ {
        std::iter::from_fn(move || self.poll())
    }
}


#[test]
fn full_queue_returns_note() {
    use crate::note::Subsystem;

    let (send, recv) = ingress_queue(2, Duration::from_millis(5));
    send.enqueue(Note::kill(Subsystem::GameEngine, 1)).unwrap();
    send.enqueue(Note::kill(Subsystem::GameEngine, 2)).unwrap();
    let err = send.enqueue(Note::kill(Subsystem::GameEngine, 3)).unwrap_err();
    assert_eq!(err, EnqueueError::Full(Note::kill(Subsystem::GameEngine, 3)));

    assert_eq!(recv.drain().count(), 2);
    assert!(recv.poll().is_none());
    send.enqueue(err.into_note()).unwrap();
    assert_eq!(recv.poll(), Some(Note::kill(Subsystem::GameEngine, 3)));
}

#[test]
fn closed_queue_returns_note() {
    use crate::note::Subsystem;

    let (send, recv) = ingress_queue(2, Duration::from_millis(5));
    drop(recv);
    let err = send.enqueue(Note::kill(Subsystem::Client, 1)).unwrap_err();
    assert!(matches!(err, EnqueueError::Closed(_)));
}

#[test]
fn concurrent_producers() {
    use crate::note::Subsystem;
    use std::thread;

    let (send, recv) = ingress_queue(64, Duration::from_secs(5));
    let producers = (0..4)
        .map(|t| {
            let send = send.clone();
            thread::spawn(move || {
                for i in 0..16 {
                    send.enqueue(Note::kill(Subsystem::GameEngine, t * 100 + i)).unwrap();
                }
            })
        })
        .collect::<Vec<_>>();
    for producer in producers {
        producer.join().unwrap();
    }
    assert_eq!(send.len(), 64);
    assert_eq!(recv.drain().count(), 64);
}
