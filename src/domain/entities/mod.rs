pub mod contact;
pub mod github;
pub mod lead;
