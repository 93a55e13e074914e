pub mod email;
pub mod github;
pub mod hosting;
pub mod limiter;
pub mod utils;
