//! Recolección de metadata embebida para diferentes tipos de archivo.

pub mod archive;
pub mod audio;
pub mod image;
pub mod odf;
pub mod office;
pub mod pdf;
pub mod xmp;
