//! State module for tracking crawl progress
//!
//! `CrawlState` names each step of a single variant's run and encodes which
//! steps may follow which.

mod crawl_state;

pub use crawl_state::CrawlState;
