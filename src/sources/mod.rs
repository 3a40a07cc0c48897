pub mod market;
pub mod news;
