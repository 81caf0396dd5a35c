// src/library.rs

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::advisory::{Advisor, CompletionBackend, TrackAnalysis};
use crate::decoder;

const DEMO_BASE_URL: &str = "https://raw.githubusercontent.com/captbaritone/webamp-music-spite/master/mp3";

pub const DEFAULT_BPM: f32 = 128.0;
pub const DEFAULT_KEY: &str = "Cm";
pub const DEFAULT_GENRE: &str = "House";
pub const DEFAULT_ENERGY: u8 = 5;
/// Used when the container does not report a length.
pub const FALLBACK_DURATION_SECS: f64 = 180.0;

/// A library entry. Immutable once created; decks only borrow its `url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub bpm: f32,
    pub key: String,
    pub genre: String,
    /// 1..=10
    pub energy: u8,
    pub url: String,
    /// Seconds.
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
}

impl Track {
    fn demo(id: &str, title: &str, artist: &str, bpm: f32, key: &str, genre: &str, energy: u8, file: &str, duration: f64) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            bpm,
            key: key.into(),
            genre: genre.into(),
            energy,
            url: format!("{DEMO_BASE_URL}/{file}"),
            duration,
            cover_url: Some(format!("https://picsum.photos/200/200?random={id}")),
        }
    }

    /// Build a track from advisor output, filling gaps with house defaults.
    pub fn from_analysis(id: String, title: String, artist: String, url: String, duration: f64, analysis: TrackAnalysis) -> Self {
        let energy = analysis
            .energy
            .filter(|e| e.is_finite())
            .map(|e| e.round().clamp(1.0, 10.0) as u8)
            .unwrap_or(DEFAULT_ENERGY);
        Self {
            id,
            title,
            artist,
            bpm: analysis
                .bpm
                .filter(|b| b.is_finite() && *b > 0.0)
                .unwrap_or(DEFAULT_BPM),
            key: analysis.key.filter(|k| !k.trim().is_empty()).unwrap_or_else(|| DEFAULT_KEY.into()),
            genre: analysis.genre.filter(|g| !g.trim().is_empty()).unwrap_or_else(|| DEFAULT_GENRE.into()),
            energy,
            url,
            duration,
            cover_url: None,
        }
    }
}

/// In-memory track list. Newest entries first.
pub struct TrackLibrary {
    tracks: Vec<Track>,
    next_id: u64,
}

impl Default for TrackLibrary {
    fn default() -> Self {
        Self::with_demo_tracks()
    }
}

impl TrackLibrary {
    pub fn empty() -> Self {
        Self { tracks: Vec::new(), next_id: 1 }
    }

    pub fn with_demo_tracks() -> Self {
        let tracks = vec![
            Track::demo("1", "Llama Whippin' Intro", "DJ Camel", 95.0, "Cm", "Intro", 4, "01.mp3", 5.0),
            Track::demo("2", "Neon Nights", "Cyberwave", 128.0, "Am", "Synthwave", 8, "02.mp3", 245.0),
            Track::demo("3", "Deep Focus", "Mindset", 124.0, "Gm", "Deep House", 6, "03.mp3", 310.0),
            Track::demo("4", "Festival Banger", "Mainstage", 130.0, "Fm", "Big Room", 10, "04.mp3", 195.0),
        ];
        Self { next_id: tracks.len() as u64 + 1, tracks }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn find_by_url(&self, url: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.url == url)
    }

    /// Case-insensitive substring match on title or artist.
    pub fn search(&self, query: &str) -> Vec<&Track> {
        let q = query.trim().to_lowercase();
        self.tracks
            .iter()
            .filter(|t| q.is_empty() || t.title.to_lowercase().contains(&q) || t.artist.to_lowercase().contains(&q))
            .collect()
    }

    fn allocate_id(&mut self) -> String {
        let id = self.next_id;
        self.next_id += 1;
        id.to_string()
    }

    pub fn insert(&mut self, track: Track) -> &Track {
        self.tracks.insert(0, track);
        &self.tracks[0]
    }

    /// Add a local audio file. Metadata comes from the advisor, the length
    /// from the container when it reports one.
    pub async fn import_file<B: CompletionBackend>(&mut self, path: &Path, advisor: &Advisor<B>) -> &Track {
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let artist = "Unknown Artist".to_string();

        let owned = path.to_path_buf();
        let duration = match tokio::task::spawn_blocking(move || decoder::probe_duration(&owned)).await {
            Ok(Ok(d)) => d.as_secs_f64(),
            Ok(Err(e)) => {
                log::debug!("Duration probe failed for {}: {e:#}", path.display());
                FALLBACK_DURATION_SECS
            }
            Err(e) => {
                log::warn!("Duration probe task failed for {}: {e}", path.display());
                FALLBACK_DURATION_SECS
            }
        };

        let analysis = advisor.analyze_track(&title, &artist).await;
        let id = self.allocate_id();
        let track = Track::from_analysis(id, title, artist, path.display().to_string(), duration, analysis);
        log::info!("📥 Imported {} ({} BPM, {})", track.title, track.bpm, track.key);
        self.insert(track)
    }
}
