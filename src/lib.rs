// Library interface for mixto-lite
pub mod capture;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod output;
pub mod platforms;
pub mod progress;
pub mod prompt;
pub mod types;
pub mod writeups;

pub use client::MixtoClient;
pub use config::{ConfigResolver, MixtoConfig};
pub use error::{MixtoError, Result};
