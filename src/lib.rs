pub mod db;
pub mod error;
pub mod parser;
pub mod rules;
pub mod server;
pub mod settings;
pub mod sync;

pub use error::{Error, Result};
pub use parser::{AddressExtractor, Extraction};
pub use rules::ExtractionRules;
