//! Consumers of periodic vorticity snapshots.
//!
//! A sink must never hold up the step loop: the provided sinks hand each frame to
//! another thread over an unbounded channel and drop it if nobody is listening.

use crate::d2q9::io::write_snapshot;
use crate::d2q9::VorticityField;
use std::io;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use tracing::{error, warn};

pub trait SnapshotSink {
    fn accept(&mut self, field: VorticityField);
}

impl<F> SnapshotSink for F
where
    F: FnMut(VorticityField),
{
    fn accept(&mut self, field: VorticityField) {
        self(field)
    }
}

/// Discards every frame.
pub struct NullSink;

impl SnapshotSink for NullSink {
    fn accept(&mut self, _field: VorticityField) {}
}

pub struct ChannelSnapshotSink {
    sender: mpsc::Sender<VorticityField>,
}

impl ChannelSnapshotSink {
    pub fn new() -> (Self, mpsc::Receiver<VorticityField>) {
        let (sender, receiver) = mpsc::channel();
        (Self { sender }, receiver)
    }
}

impl SnapshotSink for ChannelSnapshotSink {
    fn accept(&mut self, field: VorticityField) {
        // A dropped receiver just means nobody renders this frame.
        let _ = self.sender.send(field);
    }
}

/// Writes every frame to `./data/<step>/vorticity.dat` on a dedicated thread.
pub struct FileSnapshotSink {
    sender: Option<mpsc::Sender<VorticityField>>,
    handle: Option<JoinHandle<io::Result<usize>>>,
}

impl FileSnapshotSink {
    pub fn spawn() -> Self {
        let (sender, receiver) = mpsc::channel::<VorticityField>();
        let handle = thread::spawn(move || {
            let mut written = 0;
            for field in receiver {
                write_snapshot(&field)?;
                written += 1;
            }
            Ok(written)
        });
        Self {
            sender: Some(sender),
            handle: Some(handle),
        }
    }

    /// Closes the channel and waits for pending frames; returns how many were written.
    pub fn finish(mut self) -> io::Result<usize> {
        self.sender.take();
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| io::Error::new(io::ErrorKind::Other, "snapshot writer panicked"))?,
            None => Ok(0),
        }
    }
}

impl SnapshotSink for FileSnapshotSink {
    fn accept(&mut self, field: VorticityField) {
        if let Some(sender) = &self.sender {
            if sender.send(field).is_err() {
                warn!("snapshot writer stopped, dropping frame");
            }
        }
    }
}

impl Drop for FileSnapshotSink {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            match handle.join() {
                Ok(Err(e)) => error!("Error while writing a vorticity snapshot: {e}."),
                Err(_) => error!("snapshot writer panicked"),
                Ok(Ok(_)) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(time_step: usize) -> VorticityField {
        VorticityField {
            time_step,
            nx: 1,
            ny: 1,
            values: vec![time_step as f64],
        }
    }

    #[test]
    fn test_channel_sink_forwards_frames() {
        let (mut sink, receiver) = ChannelSnapshotSink::new();
        sink.accept(field(5));
        sink.accept(field(10));
        drop(sink);
        let steps: Vec<usize> = receiver.iter().map(|f| f.time_step).collect();
        assert_eq!(steps, vec![5, 10]);
    }

    #[test]
    fn test_channel_sink_drops_frames_without_receiver() {
        let (mut sink, receiver) = ChannelSnapshotSink::new();
        drop(receiver);
        sink.accept(field(1));
    }

    #[test]
    fn test_closure_sink() {
        let mut seen = Vec::new();
        {
            let mut sink = |f: VorticityField| seen.push(f.time_step);
            sink.accept(field(3));
        }
        assert_eq!(seen, vec![3]);
    }
}
