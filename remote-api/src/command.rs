//! Session-scoped commands forwarded to a connected [`RemoteHandle`](crate::RemoteHandle)

use serde::{Deserialize, Serialize};

use crate::error::ArgumentError;

/// Repeat mode as encoded by host clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RepeatMode {
    Off,
    Track,
    Context,
}

impl TryFrom<i64> for RepeatMode {
    type Error = ArgumentError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(RepeatMode::Off),
            1 => Ok(RepeatMode::Track),
            2 => Ok(RepeatMode::Context),
            other => Err(ArgumentError::OutOfRange {
                name: "repeatMode",
                value: other,
            }),
        }
    }
}

/// Podcast playback speed in percent of normal speed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PodcastPlaybackSpeed {
    Speed50,
    Speed80,
    Speed100,
    Speed120,
    Speed150,
    Speed200,
    Speed300,
}

impl PodcastPlaybackSpeed {
    pub fn percent(&self) -> u16 {
        match self {
            PodcastPlaybackSpeed::Speed50 => 50,
            PodcastPlaybackSpeed::Speed80 => 80,
            PodcastPlaybackSpeed::Speed100 => 100,
            PodcastPlaybackSpeed::Speed120 => 120,
            PodcastPlaybackSpeed::Speed150 => 150,
            PodcastPlaybackSpeed::Speed200 => 200,
            PodcastPlaybackSpeed::Speed300 => 300,
        }
    }
}

impl TryFrom<i64> for PodcastPlaybackSpeed {
    type Error = ArgumentError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            50 => Ok(PodcastPlaybackSpeed::Speed50),
            80 => Ok(PodcastPlaybackSpeed::Speed80),
            100 => Ok(PodcastPlaybackSpeed::Speed100),
            120 => Ok(PodcastPlaybackSpeed::Speed120),
            150 => Ok(PodcastPlaybackSpeed::Speed150),
            200 => Ok(PodcastPlaybackSpeed::Speed200),
            300 => Ok(PodcastPlaybackSpeed::Speed300),
            other => Err(ArgumentError::OutOfRange {
                name: "podcastPlaybackSpeed",
                value: other,
            }),
        }
    }
}

/// Requested edge length of a fetched image, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageDimension {
    Large,
    Medium,
    Small,
    XSmall,
    Thumbnail,
}

impl ImageDimension {
    pub fn pixels(&self) -> u16 {
        match self {
            ImageDimension::Large => 720,
            ImageDimension::Medium => 480,
            ImageDimension::Small => 360,
            ImageDimension::XSmall => 240,
            ImageDimension::Thumbnail => 144,
        }
    }
}

impl TryFrom<i64> for ImageDimension {
    type Error = ArgumentError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            720 => Ok(ImageDimension::Large),
            480 => Ok(ImageDimension::Medium),
            360 => Ok(ImageDimension::Small),
            240 => Ok(ImageDimension::XSmall),
            144 => Ok(ImageDimension::Thumbnail),
            other => Err(ArgumentError::OutOfRange {
                name: "imageDimension",
                value: other,
            }),
        }
    }
}

/// A command that is only meaningful while a session is connected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    GetCrossfadeState,
    GetPlayerState,
    Play { spotify_uri: String },
    Pause,
    QueueTrack { spotify_uri: String },
    Resume,
    SeekTo { positioned_ms: i64 },
    SeekToRelativePosition { relative_ms: i64 },
    SetPodcastPlaybackSpeed { speed: PodcastPlaybackSpeed },
    SkipNext,
    SkipPrevious,
    SkipToIndex { spotify_uri: String, track_index: i64 },
    ToggleShuffle,
    SetShuffle { shuffle: bool },
    ToggleRepeat,
    SetRepeatMode { repeat_mode: RepeatMode },
    IsSpotifyAppActive,
    AddToLibrary { spotify_uri: String },
    RemoveFromLibrary { spotify_uri: String },
    GetCapabilities,
    GetLibraryState { spotify_uri: String },
    GetImage { image_uri: String, dimension: ImageDimension },
}

impl SessionCommand {
    /// Host-facing method name of this command
    pub fn method(&self) -> &'static str {
        match self {
            SessionCommand::GetCrossfadeState => "getCrossfadeState",
            SessionCommand::GetPlayerState => "getPlayerState",
            SessionCommand::Play { .. } => "play",
            SessionCommand::Pause => "pause",
            SessionCommand::QueueTrack { .. } => "queueTrack",
            SessionCommand::Resume => "resume",
            SessionCommand::SeekTo { .. } => "seekTo",
            SessionCommand::SeekToRelativePosition { .. } => "seekToRelativePosition",
            SessionCommand::SetPodcastPlaybackSpeed { .. } => "setPodcastPlaybackSpeed",
            SessionCommand::SkipNext => "skipNext",
            SessionCommand::SkipPrevious => "skipPrevious",
            SessionCommand::SkipToIndex { .. } => "skipToIndex",
            SessionCommand::ToggleShuffle => "toggleShuffle",
            SessionCommand::SetShuffle { .. } => "setShuffle",
            SessionCommand::ToggleRepeat => "toggleRepeat",
            SessionCommand::SetRepeatMode { .. } => "setRepeatMode",
            SessionCommand::IsSpotifyAppActive => "isSpotifyAppActive",
            SessionCommand::AddToLibrary { .. } => "addToLibrary",
            SessionCommand::RemoveFromLibrary { .. } => "removeFromLibrary",
            SessionCommand::GetCapabilities => "getCapabilities",
            SessionCommand::GetLibraryState { .. } => "getLibraryState",
            SessionCommand::GetImage { .. } => "getImage",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, RepeatMode::Off)]
    #[case(1, RepeatMode::Track)]
    #[case(2, RepeatMode::Context)]
    fn test_repeat_mode_from_wire(#[case] raw: i64, #[case] expected: RepeatMode) {
        assert_eq!(RepeatMode::try_from(raw).unwrap(), expected);
    }

    #[test]
    fn test_repeat_mode_rejects_unknown() {
        assert!(matches!(
            RepeatMode::try_from(3),
            Err(ArgumentError::OutOfRange { name: "repeatMode", value: 3 })
        ));
    }

    #[test]
    fn test_speed_round_trips_through_percent() {
        for raw in [50, 80, 100, 120, 150, 200, 300] {
            let speed = PodcastPlaybackSpeed::try_from(raw).unwrap();
            assert_eq!(i64::from(speed.percent()), raw);
        }
        assert!(PodcastPlaybackSpeed::try_from(110).is_err());
    }

    #[test]
    fn test_image_dimension_pixels() {
        assert_eq!(ImageDimension::try_from(144).unwrap(), ImageDimension::Thumbnail);
        assert_eq!(ImageDimension::Large.pixels(), 720);
        assert!(ImageDimension::try_from(1080).is_err());
    }

    #[test]
    fn test_method_names() {
        assert_eq!(SessionCommand::Pause.method(), "pause");
        assert_eq!(
            SessionCommand::SkipToIndex {
                spotify_uri: "spotify:album:1".into(),
                track_index: 2
            }
            .method(),
            "skipToIndex"
        );
    }
}
