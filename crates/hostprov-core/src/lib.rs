pub mod config;
pub mod logging;

pub mod checksum;
pub mod fetcher;
pub mod pipeline;
pub mod transfer;
pub mod unit;
