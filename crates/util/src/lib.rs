pub mod http;
pub mod logging;
pub mod path_processing;
pub mod text_processing;

pub use http::*;
pub use path_processing::expand_tilde;
pub use text_processing::{derive_slug, escape_html, slugify};
