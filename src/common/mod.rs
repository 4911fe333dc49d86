mod save_file;

pub use save_file::*;
