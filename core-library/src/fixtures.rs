//! Sample catalogue entities for tests.
//!
//! Available to other crates through the `test-fixtures` feature.

use crate::models::{
    ArtistFeatures, ArtistWithCounts, Show, ShowWithSources, SourceFull, SourceSet, SourceTrack,
    Venue,
};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

const TRACKS_PER_SET: i32 = 2;
const SETS_PER_SOURCE: i32 = 2;
const TRACK_SECONDS: f64 = 300.0;

fn timestamp() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default()
}

fn show_date(display_date: &str) -> DateTime<Utc> {
    NaiveDate::parse_from_str(display_date, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or_else(timestamp)
}

fn slugify(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

/// Artist with a fresh UUID.
pub fn artist(id: i64, name: &str) -> ArtistWithCounts {
    ArtistWithCounts {
        id,
        uuid: Uuid::new_v4(),
        musicbrainz_id: None,
        name: name.to_string(),
        slug: slugify(name),
        sort_name: Some(name.to_string()),
        featured: 1,
        features: ArtistFeatures {
            sets: true,
            years: true,
            ratings: true,
            ..Default::default()
        },
        show_count: 100 + id,
        source_count: 200 + id,
        created_at: timestamp(),
        updated_at: timestamp(),
    }
}

/// `count` artists with sequential ids starting at 1.
pub fn artists(count: usize) -> Vec<ArtistWithCounts> {
    (1..=count as i64)
        .map(|id| artist(id, &format!("Artist {id}")))
        .collect()
}

pub fn venue(name: &str) -> Venue {
    Venue {
        id: 1,
        uuid: Uuid::new_v4(),
        artist_uuid: None,
        name: name.to_string(),
        location: "Ithaca, NY".to_string(),
        slug: slugify(name),
        latitude: Some(42.4534),
        longitude: Some(-76.4735),
        past_names: None,
        shows_at_venue: 1,
    }
}

fn source(show_uuid: Uuid, artist_uuid: Uuid, display_date: &str, index: i64) -> SourceFull {
    let source_uuid = Uuid::new_v4();
    let sets = (0..SETS_PER_SOURCE)
        .map(|set_index| SourceSet {
            id: i64::from(set_index),
            uuid: Uuid::new_v4(),
            source_uuid,
            index: set_index,
            is_encore: set_index + 1 == SETS_PER_SOURCE,
            name: format!("Set {}", set_index + 1),
            tracks: (0..TRACKS_PER_SET)
                .map(|position| SourceTrack {
                    id: i64::from(set_index * TRACKS_PER_SET + position),
                    uuid: Uuid::new_v4(),
                    source_uuid,
                    track_position: set_index * TRACKS_PER_SET + position + 1,
                    duration: Some(TRACK_SECONDS),
                    title: format!("Song {}", position + 1),
                    slug: format!("song-{}", position + 1),
                    mp3_url: Some(format!("https://archive.org/download/{source_uuid}/{position}.mp3")),
                    mp3_md5: None,
                    flac_url: None,
                })
                .collect(),
        })
        .collect();

    SourceFull {
        id: index,
        uuid: source_uuid,
        show_uuid,
        artist_uuid,
        venue: None,
        is_soundboard: index == 0,
        is_remaster: false,
        avg_rating: 8.5,
        num_ratings: 12,
        duration: None,
        upstream_identifier: format!("gd{display_date}.sbd.{index}"),
        description: None,
        taper_notes: None,
        source: Some("SBD".to_string()),
        taper: None,
        transferrer: None,
        lineage: None,
        display_date: display_date.to_string(),
        sets,
        created_at: timestamp(),
        updated_at: timestamp(),
    }
}

/// Show on `display_date` (`YYYY-MM-DD`) with `source_count` recordings,
/// each holding two sets of two tracks.
pub fn show_with_sources(display_date: &str, source_count: usize) -> ShowWithSources {
    let show_uuid = Uuid::new_v4();
    let artist_uuid = Uuid::new_v4();

    let show = Show {
        id: 1,
        uuid: show_uuid,
        artist_id: 1,
        artist_uuid,
        venue_id: Some(1),
        venue_uuid: None,
        venue: Some(venue("Barton Hall")),
        tour_uuid: None,
        year_uuid: None,
        date: show_date(display_date),
        display_date: display_date.to_string(),
        avg_rating: 9.1,
        avg_duration: Some(f64::from(SETS_PER_SOURCE * TRACKS_PER_SET) * TRACK_SECONDS),
        has_soundboard_source: source_count > 0,
        source_count: source_count as i64,
        created_at: timestamp(),
        updated_at: timestamp(),
    };

    let sources = (0..source_count as i64)
        .map(|index| source(show_uuid, artist_uuid, display_date, index))
        .collect();

    ShowWithSources { show, sources }
}

/// Show belonging to `artist`.
pub fn show_for_artist(artist: &ArtistWithCounts, display_date: &str) -> ShowWithSources {
    let mut show = show_with_sources(display_date, 1);
    show.show.artist_id = artist.id;
    show.show.artist_uuid = artist.uuid;
    for source in &mut show.sources {
        source.artist_uuid = artist.uuid;
    }
    show
}
