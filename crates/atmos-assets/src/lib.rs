//! Earth imagery streaming.
//!
//! A [`ProgressiveTexture`] fetches a small preview image followed by the
//! full-resolution image on a background thread, decodes and fits both to the
//! device limits off the render thread, and hands finished pixels to a
//! [`TextureAllocator`] when the render thread polls it. Failures never escape:
//! they show up as [`LoadStatus::Error`] with whatever texture was already live.

mod decode;
mod error;
mod fetch;
mod progressive;

pub use decode::{
    DecodedImage, DeviceCapabilities, MAX_ANISOTROPY, MAX_TEXTURE_WIDTH, TextureSettings,
    decode_image, fitted_size, mip_level_count,
};
pub use error::LoadError;
pub use fetch::{AssetFetcher, Fetcher, FileFetcher, HttpFetcher, with_cache_buster};
pub use progressive::{
    LoadRequest, LoadStatus, LoadedTexture, ProgressiveTexture, Resolution, TextureAllocator,
};
