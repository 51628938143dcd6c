//! Fetching and saving a single video's thumbnail.
//!
//! A [`Thumbnail`] starts out unfetched. [`Thumbnail::fetch`] walks the size
//! tiers from the requested one toward smaller ones, probing each URL before
//! downloading it, and keeps the first image it manages to retrieve. Once an
//! image is held, further fetches return it without touching the network.

use std::{
    cell::OnceCell,
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

use tracing::{debug, info, instrument, warn};

use crate::{
    error::{FetchError, SaveError},
    identifier::VideoId,
    transport::{HttpTransport, Transport},
    variant::{ImageFormat, Size, thumbnail_url},
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Size to try first.
    pub size: Size,
    pub format: ImageFormat,
    /// Move on to smaller tiers when the requested one is unavailable.
    pub fallback: bool,
    /// Bound on each individual probe and retrieval.
    pub timeout: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            size: Size::default(),
            format: ImageFormat::default(),
            fallback: true,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOptions {
    /// File stem to use instead of the video identifier.
    pub filename: Option<String>,
    pub overwrite: bool,
    /// Create the target directory and its parents when missing.
    pub mkdir: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            filename: None,
            overwrite: false,
            mkdir: true,
        }
    }
}

/// An image that was successfully downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    image: Vec<u8>,
    size: Size,
    format: ImageFormat,
}

impl FetchResult {
    pub fn image(&self) -> &[u8] {
        &self.image
    }

    /// The size actually served, which may be smaller than the one requested.
    pub fn size(&self) -> Size {
        self.size
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn extension(&self) -> &'static str {
        self.format.extension()
    }

    pub fn into_image(self) -> Vec<u8> {
        self.image
    }
}

#[derive(Debug)]
pub struct Thumbnail<T = HttpTransport> {
    id: VideoId,
    transport: T,
    /// Empty until the first successful fetch, then fixed for the instance.
    fetched: OnceCell<FetchResult>,
}

impl Thumbnail<HttpTransport> {
    pub fn new(id: VideoId) -> Self {
        Self::with_transport(id, HttpTransport::new())
    }
}

impl<T: Transport> Thumbnail<T> {
    pub fn with_transport(id: VideoId, transport: T) -> Self {
        Self {
            id,
            transport,
            fetched: OnceCell::new(),
        }
    }

    pub fn id(&self) -> &VideoId {
        &self.id
    }

    pub fn result(&self) -> Option<&FetchResult> {
        self.fetched.get()
    }

    pub fn is_fetched(&self) -> bool {
        self.fetched.get().is_some()
    }

    /// Downloads the thumbnail, or returns the one already held.
    ///
    /// HTTP-level refusals move on to the next tier (when `fallback` is set);
    /// transport failures abort immediately. On error the instance is left
    /// unfetched and can be retried.
    #[instrument(skip_all, fields(video = %self.id, size = %options.size))]
    pub fn fetch(&mut self, options: &FetchOptions) -> Result<&FetchResult, FetchError> {
        if let Some(result) = self.fetched.get() {
            debug!("Returning cached thumbnail");
            return Ok(result);
        }

        let result = self.walk_tiers(options)?;
        Ok(self.fetched.get_or_init(|| result))
    }

    fn walk_tiers(&self, options: &FetchOptions) -> Result<FetchResult, FetchError> {
        for &tier in options.size.tier.fallback_chain() {
            let size = options.size.with_tier(tier);
            let url = thumbnail_url(&self.id, size, options.format);

            if self.transport.probe(&url, options.timeout)? {
                match self.transport.retrieve(&url, options.timeout)? {
                    Some(image) => {
                        info!(resolved = %size, bytes = image.len(), "Thumbnail found");
                        return Ok(FetchResult {
                            image,
                            size,
                            format: options.format,
                        });
                    }
                    None => warn!(%url, "Retrieval failed after successful probe"),
                }
            } else {
                debug!(%url, "Size unavailable");
            }

            if !options.fallback {
                break;
            }
        }

        Err(FetchError::NotFound {
            id: self.id.to_string(),
            size: options.size.to_string(),
        })
    }

    /// File name the image is saved under: the custom stem or the identifier,
    /// plus the extension of the fetched format.
    pub fn file_name(&self, filename: Option<&str>) -> Result<String, SaveError> {
        let result = self.result().ok_or(SaveError::NotFetched)?;
        let stem = filename.unwrap_or(self.id.as_str());
        Ok(format!("{stem}.{}", result.extension()))
    }

    /// Writes the image into `dir` and returns the absolute path written.
    ///
    /// The directory is created first when `mkdir` is set, then canonicalized;
    /// existence of the destination is checked against the canonical path.
    pub fn save(&self, dir: impl AsRef<Path>, options: &SaveOptions) -> Result<PathBuf, SaveError> {
        let result = self.result().ok_or(SaveError::NotFetched)?;
        let file_name = self.file_name(options.filename.as_deref())?;
        let dir = dir.as_ref();

        if options.mkdir {
            fs::create_dir_all(dir).map_err(|err| match err.kind() {
                std::io::ErrorKind::AlreadyExists => SaveError::NotADirectory(dir.to_path_buf()),
                _ => SaveError::from_io(dir, err),
            })?;
        }

        let dir = fs::canonicalize(dir).map_err(|err| SaveError::from_io(dir, err))?;
        if !dir.is_dir() {
            return Err(SaveError::NotADirectory(dir));
        }

        let dest = dir.join(file_name);
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .create_new(!options.overwrite)
            .open(&dest)
            .map_err(|err| SaveError::from_io(&dest, err))?;
        write_or_remove(&dest, file, result.image())?;

        debug!(path = %dest.display(), "Thumbnail written");
        Ok(dest)
    }

    /// Streams the image to `writer`, e.g. standard output.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), SaveError> {
        let result = self.result().ok_or(SaveError::NotFetched)?;
        writer.write_all(result.image()).map_err(SaveError::Write)?;
        writer.flush().map_err(SaveError::Write)
    }
}

/// Writes `image` through `file`, deleting `dest` if the write fails so no
/// partial image is left to block a later save.
fn write_or_remove<W: Write>(dest: &Path, mut file: W, image: &[u8]) -> Result<(), SaveError> {
    let written = file.write_all(image).and_then(|()| file.flush());
    drop(file);
    if let Err(err) = written {
        if let Err(remove_err) = fs::remove_file(dest) {
            warn!(path = %dest.display(), %remove_err, "Failed to remove partial file");
        }
        return Err(SaveError::from_io(dest, err));
    }
    Ok(())
}
