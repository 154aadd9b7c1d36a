//! Pending outbound payloads.

use std::collections::VecDeque;

use bytes::Bytes;
use tokio::sync::oneshot;

use super::config::WritePolicy;
use super::error::RadioError;

/// One payload awaiting transmission, with the channel its outcome goes to.
pub(crate) struct WriteJob {
    pub(crate) payload: Bytes,
    reply: oneshot::Sender<Result<(), RadioError>>,
}

impl WriteJob {
    pub(crate) fn new(payload: Bytes, reply: oneshot::Sender<Result<(), RadioError>>) -> Self {
        Self { payload, reply }
    }

    /// Report the outcome. The submitter may have stopped listening.
    pub(crate) fn complete(self, result: Result<(), RadioError>) {
        let _ = self.reply.send(result);
    }
}

/// Buffer shaped by the write policy.
pub(crate) enum Outbox {
    Fifo(VecDeque<WriteJob>),
    LatestWins(Option<WriteJob>),
}

impl Outbox {
    pub(crate) fn new(policy: WritePolicy) -> Self {
        match policy {
            WritePolicy::Fifo => Outbox::Fifo(VecDeque::new()),
            WritePolicy::LatestWins => Outbox::LatestWins(None),
        }
    }

    /// Add a job. Returns the job it replaced, if any.
    pub(crate) fn push(&mut self, job: WriteJob) -> Option<WriteJob> {
        match self {
            Outbox::Fifo(queue) => {
                queue.push_back(job);
                None
            }
            Outbox::LatestWins(slot) => slot.replace(job),
        }
    }

    pub(crate) fn pop(&mut self) -> Option<WriteJob> {
        match self {
            Outbox::Fifo(queue) => queue.pop_front(),
            Outbox::LatestWins(slot) => slot.take(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Outbox::Fifo(queue) => queue.len(),
            Outbox::LatestWins(slot) => usize::from(slot.is_some()),
        }
    }

    /// Payload that will be sent next.
    pub(crate) fn peek(&self) -> Option<Bytes> {
        match self {
            Outbox::Fifo(queue) => queue.front().map(|job| job.payload.clone()),
            Outbox::LatestWins(slot) => slot.as_ref().map(|job| job.payload.clone()),
        }
    }

    pub(crate) fn drain(&mut self) -> Vec<WriteJob> {
        match self {
            Outbox::Fifo(queue) => queue.drain(..).collect(),
            Outbox::LatestWins(slot) => slot.take().into_iter().collect(),
        }
    }
}
