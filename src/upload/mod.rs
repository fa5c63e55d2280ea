//! Remote upload with bounded polling.

mod manager;
mod poller;

pub use manager::RemoteUploadManager;
pub use poller::{PollBudget, PollPolicy, Sleeper, TokioSleeper};

#[cfg(test)]
pub(crate) use poller::tests::RecordingSleeper;
