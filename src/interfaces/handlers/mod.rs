pub mod contact;
pub mod cron;
pub mod deploy;
pub mod github;
pub mod home;
pub mod system;
