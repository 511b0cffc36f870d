use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use tracing::{trace, warn};

use crate::error::{DeviceError, Result};

pub(crate) type Job = Box<dyn FnOnce() -> Result<()> + Send>;

enum Command {
    Run(Job),
    Fence(mpsc::Sender<Result<()>>),
}

/// An in-order work queue drained by a dedicated dispatcher thread.
///
/// Jobs run one after another in submission order. The first error a job
/// returns is held until the next fence reports it.
pub(crate) struct Stream {
    sender: Option<mpsc::Sender<Command>>,
    worker: Option<JoinHandle<()>>,
}

impl Stream {
    pub(crate) fn spawn(name: &str) -> Result<Self> {
        let (sender, receiver) = mpsc::channel::<Command>();
        let worker = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || dispatch(receiver))
            .map_err(|e| DeviceError::Init(format!("failed to spawn stream thread: {}", e)))?;
        Ok(Stream {
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    /// Queue a job. Returns as soon as the job is enqueued.
    pub(crate) fn submit(&self, job: Job) -> Result<()> {
        self.send(Command::Run(job))
    }

    /// Wait for every job submitted so far and collect the pending error.
    pub(crate) fn fence(&self) -> Result<()> {
        let (reply, done) = mpsc::channel();
        self.send(Command::Fence(reply))?;
        done.recv()
            .map_err(|_| DeviceError::DeviceLost("stream thread exited before fence".to_string()))?
    }

    fn send(&self, cmd: Command) -> Result<()> {
        self.sender
            .as_ref()
            .ok_or_else(|| DeviceError::DeviceLost("stream is shut down".to_string()))?
            .send(cmd)
            .map_err(|_| DeviceError::DeviceLost("stream thread is gone".to_string()))
    }
}

impl Drop for Stream {
    fn drop(&mut self) {
        // Closing the channel lets the dispatcher drain and exit.
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("stream thread panicked during shutdown");
            }
        }
    }
}

fn dispatch(receiver: mpsc::Receiver<Command>) {
    let mut pending: Option<DeviceError> = None;
    for cmd in receiver {
        match cmd {
            Command::Run(job) => {
                if let Err(e) = job() {
                    warn!(error = %e, "launch failed");
                    pending.get_or_insert(e);
                }
            }
            Command::Fence(reply) => {
                trace!("fence reached");
                let status = match pending.take() {
                    Some(e) => Err(e),
                    None => Ok(()),
                };
                // The waiter may have given up; nothing to report to then.
                let _ = reply.send(status);
            }
        }
    }
}
