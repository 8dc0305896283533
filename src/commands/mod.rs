pub mod build;
pub mod chunk;
pub mod search;
pub mod stats;
