pub mod io;

pub use io::{read_input, write_output};
