//! Domain models for the Relisten catalogue
//!
//! These mirror the JSON shapes served by the Relisten API. They are stored
//! as JSON payloads in the durable store and in the disk cache tier, so every
//! field round-trips through `serde`.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Render a UUID the way every cache layer keys it: upper-case, hyphenated.
///
/// ```
/// use core_library::models::cache_key;
/// use uuid::Uuid;
///
/// let uuid = Uuid::parse_str("6fb9a4e0-07b8-4f5d-9c2e-56b6e2c1d0aa").unwrap();
/// assert_eq!(cache_key(&uuid), "6FB9A4E0-07B8-4F5D-9C2E-56B6E2C1D0AA");
/// ```
pub fn cache_key(uuid: &Uuid) -> String {
    uuid.hyphenated().to_string().to_uppercase()
}

// =============================================================================
// Artists
// =============================================================================

/// Per-artist capability flags controlling which UI sections apply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtistFeatures {
    pub descriptions: bool,
    pub eras: bool,
    pub multiple_sources: bool,
    pub reviews: bool,
    pub ratings: bool,
    pub tours: bool,
    pub taper_notes: bool,
    pub source_information: bool,
    pub sets: bool,
    pub per_show_venues: bool,
    pub per_source_venues: bool,
    pub venue_coords: bool,
    pub songs: bool,
    pub years: bool,
    pub track_md5s: bool,
    pub track_names: bool,
    pub track_durations: bool,
}

/// Artist metadata plus show/source counts, as returned by the artist list
/// endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistWithCounts {
    /// Server-side integer id
    pub id: i64,
    pub uuid: Uuid,
    pub musicbrainz_id: Option<String>,
    pub name: String,
    pub slug: String,
    pub sort_name: Option<String>,
    #[serde(default)]
    pub featured: i32,
    #[serde(default)]
    pub features: ArtistFeatures,
    pub show_count: i64,
    pub source_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ArtistWithCounts {
    /// Key used by the artist cache tiers and the durable store.
    pub fn cache_key(&self) -> String {
        cache_key(&self.uuid)
    }
}

// =============================================================================
// Venues
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub id: i64,
    pub uuid: Uuid,
    pub artist_uuid: Option<Uuid>,
    pub name: String,
    pub location: String,
    pub slug: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub past_names: Option<String>,
    #[serde(default)]
    pub shows_at_venue: i64,
}

// =============================================================================
// Shows and sources
// =============================================================================

/// A dated performance by an artist, without its recordings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Show {
    pub id: i64,
    pub uuid: Uuid,
    pub artist_id: i64,
    pub artist_uuid: Uuid,
    pub venue_id: Option<i64>,
    pub venue_uuid: Option<Uuid>,
    pub venue: Option<Venue>,
    pub tour_uuid: Option<Uuid>,
    pub year_uuid: Option<Uuid>,
    pub date: DateTime<Utc>,
    /// Date as the artist's archive displays it, e.g. `1977-05-08`
    pub display_date: String,
    #[serde(default)]
    pub avg_rating: f32,
    pub avg_duration: Option<f64>,
    #[serde(default)]
    pub has_soundboard_source: bool,
    #[serde(default)]
    pub source_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Show {
    pub fn year(&self) -> i32 {
        self.date.year()
    }
}

/// One track of a recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceTrack {
    pub id: i64,
    pub uuid: Uuid,
    pub source_uuid: Uuid,
    pub track_position: i32,
    pub duration: Option<f64>,
    pub title: String,
    pub slug: String,
    pub mp3_url: Option<String>,
    pub mp3_md5: Option<String>,
    pub flac_url: Option<String>,
}

/// A set (first set, encore, ...) within a recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSet {
    pub id: i64,
    pub uuid: Uuid,
    pub source_uuid: Uuid,
    pub index: i32,
    #[serde(default)]
    pub is_encore: bool,
    pub name: String,
    #[serde(default)]
    pub tracks: Vec<SourceTrack>,
}

/// A complete recording of a show, with its sets and tracks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFull {
    pub id: i64,
    pub uuid: Uuid,
    pub show_uuid: Uuid,
    pub artist_uuid: Uuid,
    pub venue: Option<Venue>,
    #[serde(default)]
    pub is_soundboard: bool,
    #[serde(default)]
    pub is_remaster: bool,
    #[serde(default)]
    pub avg_rating: f32,
    #[serde(default)]
    pub num_ratings: i64,
    pub duration: Option<f64>,
    pub upstream_identifier: String,
    pub description: Option<String>,
    pub taper_notes: Option<String>,
    pub source: Option<String>,
    pub taper: Option<String>,
    pub transferrer: Option<String>,
    pub lineage: Option<String>,
    pub display_date: String,
    #[serde(default)]
    pub sets: Vec<SourceSet>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SourceFull {
    /// Tracks across all sets in playback order.
    pub fn tracks(&self) -> impl Iterator<Item = &SourceTrack> {
        self.sets.iter().flat_map(|set| set.tracks.iter())
    }

    /// Sum of track durations, falling back to the recorded duration when
    /// tracks carry none.
    pub fn total_duration(&self) -> Option<f64> {
        let summed: f64 = self.tracks().filter_map(|track| track.duration).sum();
        if summed > 0.0 {
            Some(summed)
        } else {
            self.duration
        }
    }
}

/// A show with every recording of it. This is the payload of the show
/// endpoint and the unit the show cache stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowWithSources {
    #[serde(flatten)]
    pub show: Show,
    #[serde(default)]
    pub sources: Vec<SourceFull>,
}

impl ShowWithSources {
    pub fn uuid(&self) -> Uuid {
        self.show.uuid
    }

    /// Key used by the show cache tiers and the durable store.
    pub fn cache_key(&self) -> String {
        cache_key(&self.show.uuid)
    }

    pub fn source(&self, uuid: &Uuid) -> Option<&SourceFull> {
        self.sources.iter().find(|source| &source.uuid == uuid)
    }

    /// Venue of the show, falling back to the first source that has one.
    pub fn venue(&self) -> Option<&Venue> {
        self.show
            .venue
            .as_ref()
            .or_else(|| self.sources.iter().find_map(|source| source.venue.as_ref()))
    }
}
