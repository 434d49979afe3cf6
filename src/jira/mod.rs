pub mod client;
pub mod types;

pub use client::JiraClient;
pub use types::{VersionEntry, VersionField, VersionRef};
