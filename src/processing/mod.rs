//! File classification and content normalization.
//!
//! This module provides:
//! - Type routing from declared MIME type and file suffix
//! - Image decoding and downscaling
//! - HTML cleaning and text extraction with length limits

pub mod classifier;
pub mod html;
pub mod normalizer;

pub use classifier::FileClassifier;
pub use normalizer::ContentNormalizer;
