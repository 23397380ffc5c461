//! Metadata del sistema de archivos, modelo de reporte y salidas.

pub mod console;
pub mod export;
pub mod filesystem;
pub mod hashing;
mod permissions;
pub mod report;
