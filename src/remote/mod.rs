//! Remote collaborators of the summary handlers

pub mod store;
pub mod wikipedia;

pub use store::{DirectoryStore, MemoryStore, ObjectStore};
pub use wikipedia::{summary_or_message, SummarySource, WikipediaClient};
