//! Export queue
//!
//! GPU threads push snapshots without blocking; one named worker drains them
//! in FIFO order so at most one export touches the disk at a time.

use std::panic::{self, AssertUnwindSafe};
use std::thread::JoinHandle;

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::constants::export::WORKER_THREAD_NAME;
use crate::error::{DiskTextureError, DiskTextureResult};
use crate::persistence::export::{ExportEncoder, ExportJob};

enum QueueMessage {
    Export(Box<ExportJob>),
    /// Acknowledged once everything queued before it has run
    Flush(Sender<()>),
}

/// Single consumer queue of export jobs
pub struct ExportQueue {
    sender: Option<Sender<QueueMessage>>,
    worker: Option<JoinHandle<()>>,
}

impl ExportQueue {
    /// Spawn the worker thread
    pub fn new(encoder: ExportEncoder) -> DiskTextureResult<Self> {
        let (sender, receiver) = unbounded();

        let worker = std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run_worker(encoder, receiver))
            .map_err(|error| DiskTextureError::Worker(error.to_string()))?;

        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    /// Queue a job, never blocks
    pub fn push(&self, job: ExportJob) {
        if let Some(sender) = &self.sender {
            if sender.send(QueueMessage::Export(Box::new(job))).is_err() {
                log::error!("[ExportQueue::push] Export worker is gone, dropping job");
            }
        }
    }

    /// Block until every job queued before this call has run
    pub fn flush(&self) {
        let Some(sender) = &self.sender else {
            return;
        };

        let (done_sender, done_receiver) = crossbeam_channel::bounded(1);
        if sender.send(QueueMessage::Flush(done_sender)).is_ok() {
            let _ = done_receiver.recv();
        }
    }

    /// Jobs waiting for the worker
    pub fn pending(&self) -> usize {
        self.sender.as_ref().map_or(0, |sender| sender.len())
    }
}

impl Drop for ExportQueue {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain what is left and exit
        self.sender.take();

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("[ExportQueue::drop] Export worker panicked");
            }
        }
    }
}

fn run_worker(encoder: ExportEncoder, receiver: Receiver<QueueMessage>) {
    log::debug!("[ExportQueue] Worker started");

    while let Ok(message) = receiver.recv() {
        match message {
            QueueMessage::Export(job) => {
                let result = panic::catch_unwind(AssertUnwindSafe(|| encoder.export(&job)));
                if result.is_err() {
                    log::error!(
                        "[ExportQueue] Export of texture {:?} panicked, continuing with the next job",
                        job.handle
                    );
                }
            }
            QueueMessage::Flush(done) => {
                let _ = done.send(());
            }
        }
    }

    log::debug!("[ExportQueue] Worker stopped");
}
