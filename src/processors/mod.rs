mod filters;

pub use filters::register_all;
