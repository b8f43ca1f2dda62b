//! Image encoding for the sticker pipeline.
//!
//! All output (confirmed edits, matted results, downloads) is PNG so that
//! transparency survives every step.

mod png;

pub use png::{encode_png, encode_rgba_png, EncodeError};
