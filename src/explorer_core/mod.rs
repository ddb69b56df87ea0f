//! Explorer Core - HTTP collaborators
//!
//! Thin I/O wrappers with no algorithmic content: an etherscan-compatible
//! Blockscout client for the three transfer feeds plus balance, and a spot
//! price client. Both sit behind traits so the fetch cycle can run against
//! in-memory fakes in tests.

pub mod client;
pub mod price;

pub use client::{ExplorerApi, ExplorerClient, FetchError};
pub use price::{PriceClient, PriceSource};
