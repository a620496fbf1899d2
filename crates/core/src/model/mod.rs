pub mod link;
pub mod span;
