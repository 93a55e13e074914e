pub mod contact;
pub mod deploy;
pub mod github;
pub mod revalidation;
pub mod sequences;
