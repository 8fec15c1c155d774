mod market;
mod data;

pub use market::*;
pub use data::*;

pub mod write;
pub use write::*;
