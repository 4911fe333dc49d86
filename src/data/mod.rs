mod date;
mod dir_loader;
mod document;
mod front_matter;
mod page_loader;
mod site;
pub mod url;

pub use date::*;
pub use dir_loader::*;
pub use document::*;
pub use front_matter::*;
pub use page_loader::*;
pub use site::*;
pub use url::Route;
