pub mod document;
pub mod logging;
