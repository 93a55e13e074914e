pub mod cache;
pub mod deploy;
