#![forbid(unsafe_code)]

//! Download YouTube video thumbnails from `i.ytimg.com`.
//!
//! Resolve the input with [`VideoId::parse`] or [`VideoId::from_url`], then
//! [`Thumbnail::fetch`] the best available size and [`Thumbnail::save`] it.

pub mod config;
pub mod error;
pub mod identifier;
pub mod thumbnail;
pub mod transport;
pub mod variant;

pub use error::{FetchError, ResolveError, SaveError, SizeError, TransportError};
pub use identifier::VideoId;
pub use thumbnail::{FetchOptions, FetchResult, SaveOptions, Thumbnail};
pub use transport::{HttpTransport, Transport};
pub use variant::{Frame, ImageFormat, Size, SizeTier};
