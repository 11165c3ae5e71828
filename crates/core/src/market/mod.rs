pub mod feed;
pub mod signal;
