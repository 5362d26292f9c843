// lib.rs - Pixelpress core library

//! Image compression and resizing toolkit with a persisted compression
//! history.
//!
//! The processing [`pipeline`] decodes a source image, re-encodes it at a
//! requested quality and format, and optionally resizes it. The [`flow`]
//! controller drives one upload → configure → results session over the
//! pipeline. Completed results can be persisted through the [`history`]
//! store, which is served over HTTP by the `pixelpress` binary.

pub mod error;
pub mod flow;
pub mod formats;
pub mod history;
pub mod logger;
pub mod models;
pub mod pipeline;
pub mod settings;
