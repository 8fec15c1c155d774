pub mod io;
pub mod series;
pub mod window;
