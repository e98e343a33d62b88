pub mod error;
pub mod insight;
