
mod linalg;
mod rands;
mod svd;

pub use linalg::*;
pub use rands::*;
pub use svd::*;
