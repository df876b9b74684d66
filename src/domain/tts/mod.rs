pub mod error;
pub mod language;

pub use error::SynthesisError;
pub use language::{detect_language, LanguageCode};
