//! Image decoding for the sticker pipeline.
//!
//! This module provides functionality for:
//! - Decoding uploads (PNG, JPEG, WebP) into a [`SourceImage`]
//! - Decoding generated results into raw RGBA buffers
//! - Converting `data:` URIs to and from raw bytes
//!
//! # Architecture
//!
//! Decoding is synchronous and single-threaded. The editing session wraps it
//! in a cancellable load (see [`crate::session`]) so that a superseded upload
//! can never overwrite a newer one.

mod data_uri;
mod raster;
mod types;

pub use data_uri::{decode_data_uri, png_data_uri, strip_data_uri_prefix};
pub use raster::{decode_rgba, decode_source, SUPPORTED_FORMATS};
pub use types::{DecodeError, Orientation, SourceImage};
