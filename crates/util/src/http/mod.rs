pub mod parser;
pub mod url_template;

pub use parser::*;
pub use url_template::*;
