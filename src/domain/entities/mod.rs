pub mod filter;
pub mod image;
