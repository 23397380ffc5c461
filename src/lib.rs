//! Metascope: extracción forense de metadata.
//!
//! Detecta el tipo real de cada archivo por su firma, despacha a los
//! extractores de cada formato, une los resultados en un [`FileRecord`] por
//! archivo y marca los campos de interés forense.

pub mod advanced_metadata;
pub mod aggregate;
pub mod app;
pub mod cli;
pub mod config;
pub mod detection;
pub mod dispatch;
pub mod error;
pub mod formatting;
pub mod metadata;
pub mod pipeline;
pub mod rules;
pub mod scan;
pub mod tools;
pub mod ui;

pub use detection::{Detection, FileKind};
pub use metadata::report::{FileRecord, MetadataValue};
pub use pipeline::Engine;
