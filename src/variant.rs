//! Thumbnail variants served by `i.ytimg.com`.
//!
//! A variant is a size (quality tier plus frame) in a given image format. The
//! tiers are ordered from best to worst quality; fallback only ever walks
//! toward the worse end.

use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::Deserialize;

use crate::{error::SizeError, identifier::VideoId};

pub const THUMBNAIL_BASE_URL: &str = "https://i.ytimg.com";

static SIZE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(maxres|sd|hq|mq)?(default|1|2|3)$").expect("size pattern compiles")
});

/// Quality tier, ranked 0 (largest) to 4 (smallest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum SizeTier {
    /// `maxres*`
    #[default]
    MaxRes,
    /// `sd*`
    Standard,
    /// `hq*`
    High,
    /// `mq*`
    Medium,
    /// Unprefixed (`default`, `1`, `2`, `3`).
    Low,
}

impl SizeTier {
    pub const ALL: [SizeTier; 5] = [
        SizeTier::MaxRes,
        SizeTier::Standard,
        SizeTier::High,
        SizeTier::Medium,
        SizeTier::Low,
    ];

    pub fn rank(self) -> usize {
        self as usize
    }

    pub fn from_rank(rank: usize) -> Option<Self> {
        Self::ALL.get(rank).copied()
    }

    pub fn prefix(self) -> &'static str {
        match self {
            SizeTier::MaxRes => "maxres",
            SizeTier::Standard => "sd",
            SizeTier::High => "hq",
            SizeTier::Medium => "mq",
            SizeTier::Low => "",
        }
    }

    /// This tier followed by every smaller one, best first.
    pub fn fallback_chain(self) -> &'static [SizeTier] {
        &Self::ALL[self.rank()..]
    }
}

/// Which image of a tier to fetch: the regular thumbnail or one of the three
/// auto-generated frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "u8")]
pub enum Frame {
    #[default]
    Default,
    One,
    Two,
    Three,
}

impl Frame {
    pub fn suffix(self) -> &'static str {
        match self {
            Frame::Default => "default",
            Frame::One => "1",
            Frame::Two => "2",
            Frame::Three => "3",
        }
    }

    /// Auto-generated frames are numbered 1 to 3.
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            1 => Some(Frame::One),
            2 => Some(Frame::Two),
            3 => Some(Frame::Three),
            _ => None,
        }
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "default" => Some(Frame::Default),
            "1" => Some(Frame::One),
            "2" => Some(Frame::Two),
            "3" => Some(Frame::Three),
            _ => None,
        }
    }
}

impl TryFrom<u8> for Frame {
    type Error = String;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Frame::from_index(index).ok_or_else(|| format!("frame must be 1, 2 or 3, got {index}"))
    }
}

/// A concrete image name such as `maxresdefault`, `hq2` or `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "String")]
pub struct Size {
    pub tier: SizeTier,
    pub frame: Frame,
}

impl Size {
    pub fn new(tier: SizeTier, frame: Frame) -> Self {
        Self { tier, frame }
    }

    pub fn with_tier(self, tier: SizeTier) -> Self {
        Self { tier, ..self }
    }

    pub fn with_frame(self, frame: Frame) -> Self {
        Self { frame, ..self }
    }
}

impl From<SizeTier> for Size {
    fn from(tier: SizeTier) -> Self {
        Self::new(tier, Frame::Default)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.tier.prefix(), self.frame.suffix())
    }
}

/// Accepts a tier index `0`-`4` or an image name. Bare `1`-`3` are tier
/// indices; the smallest tier's frames need an explicit frame selection.
impl FromStr for Size {
    type Err = SizeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || SizeError(value.to_owned());

        if let Ok(rank) = value.parse::<usize>() {
            return SizeTier::from_rank(rank)
                .filter(|_| value.len() == 1)
                .map(Size::from)
                .ok_or_else(invalid);
        }

        let caps = SIZE_NAME_RE.captures(value).ok_or_else(invalid)?;
        let prefix = caps.get(1).map_or("", |m| m.as_str());
        let tier = SizeTier::ALL
            .into_iter()
            .find(|tier| tier.prefix() == prefix)
            .ok_or_else(invalid)?;
        let frame = Frame::from_suffix(&caps[2]).ok_or_else(invalid)?;
        Ok(Self::new(tier, frame))
    }
}

impl TryFrom<String> for Size {
    type Error = SizeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageFormat {
    #[default]
    Jpeg,
    Webp,
}

impl ImageFormat {
    pub fn from_webp_flag(webp: bool) -> Self {
        if webp { ImageFormat::Webp } else { ImageFormat::Jpeg }
    }

    pub fn path_segment(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "vi",
            ImageFormat::Webp => "vi_webp",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Webp => "webp",
        }
    }
}

/// Canonical location of one variant on the thumbnail host.
pub fn thumbnail_url(id: &VideoId, size: Size, format: ImageFormat) -> String {
    format!(
        "{THUMBNAIL_BASE_URL}/{}/{id}/{size}.{}",
        format.path_segment(),
        format.extension()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> VideoId {
        VideoId::parse("aqz-KE-bpKQ").unwrap()
    }

    #[test]
    fn tiers_rank_from_largest_to_smallest() {
        let names: Vec<String> = SizeTier::ALL.iter().map(|t| Size::from(*t).to_string()).collect();
        assert_eq!(
            names,
            ["maxresdefault", "sddefault", "hqdefault", "mqdefault", "default"]
        );
        for (rank, tier) in SizeTier::ALL.iter().enumerate() {
            assert_eq!(tier.rank(), rank);
            assert_eq!(SizeTier::from_rank(rank), Some(*tier));
        }
        assert_eq!(SizeTier::from_rank(5), None);
    }

    #[test]
    fn fallback_chain_never_climbs_above_requested_tier() {
        assert_eq!(SizeTier::MaxRes.fallback_chain(), &SizeTier::ALL);
        assert_eq!(
            SizeTier::High.fallback_chain(),
            &[SizeTier::High, SizeTier::Medium, SizeTier::Low]
        );
        assert_eq!(SizeTier::Low.fallback_chain(), &[SizeTier::Low]);
    }

    #[test]
    fn size_parses_indices() {
        assert_eq!("0".parse::<Size>().unwrap(), Size::from(SizeTier::MaxRes));
        assert_eq!("3".parse::<Size>().unwrap(), Size::from(SizeTier::Medium));
        assert_eq!("4".parse::<Size>().unwrap(), Size::from(SizeTier::Low));
        assert!("5".parse::<Size>().is_err());
        assert!("00".parse::<Size>().is_err());
    }

    #[test]
    fn size_parses_names() {
        assert_eq!(
            "sddefault".parse::<Size>().unwrap(),
            Size::from(SizeTier::Standard)
        );
        assert_eq!(
            "hq2".parse::<Size>().unwrap(),
            Size::new(SizeTier::High, Frame::Two)
        );
        assert_eq!(
            "maxres1".parse::<Size>().unwrap(),
            Size::new(SizeTier::MaxRes, Frame::One)
        );
        assert_eq!("default".parse::<Size>().unwrap(), Size::from(SizeTier::Low));
    }

    #[test]
    fn size_rejects_unknown_names() {
        for value in ["", "large", "hq4", "maxres", "hqdefault ", "xxdefault"] {
            let err = value.parse::<Size>().unwrap_err();
            assert_eq!(err.0, value);
        }
    }

    #[test]
    fn frame_from_index_only_accepts_generated_frames() {
        assert_eq!(Frame::from_index(2), Some(Frame::Two));
        assert_eq!(Frame::from_index(0), None);
        assert_eq!(Frame::from_index(4), None);
        assert_eq!(Size::new(SizeTier::Low, Frame::Three).to_string(), "3");
        assert_eq!(Size::new(SizeTier::High, Frame::One).to_string(), "hq1");
    }

    #[test]
    fn urls_follow_host_layout() {
        assert_eq!(
            thumbnail_url(&id(), SizeTier::MaxRes.into(), ImageFormat::Jpeg),
            "https://i.ytimg.com/vi/aqz-KE-bpKQ/maxresdefault.jpg"
        );
        assert_eq!(
            thumbnail_url(&id(), Size::new(SizeTier::Medium, Frame::One), ImageFormat::Webp),
            "https://i.ytimg.com/vi_webp/aqz-KE-bpKQ/mq1.webp"
        );
    }
}
