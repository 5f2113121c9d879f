//! RimWorld Translator - batch translation of mod localization XML
//!
//! This library walks a mod directory for `DefInjected` and `Keyed` files,
//! translates the text between tags through an external service, and writes
//! the results back in place while keeping markup and grammar placeholders.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod core;
pub mod processors;

// Re-export key types for convenience
pub use self::core::{
    cancel::CancelToken,
    client::{GoogleTranslateService, RetryingTranslator, TranslationService},
    config::TranslatorConfig,
    errors::TranslationError,
    models::{BatchReport, TextUnit, TranslationOutcome, TranslationTarget},
    progress::{EventLevel, ProgressEvent, ProgressSink},
};

pub use self::processors::{
    batch::BatchTranslator,
    discovery::TargetDiscovery,
    xml::XmlFileTranslator,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
