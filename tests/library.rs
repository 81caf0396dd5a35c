// tests/library.rs

mod common;

use deck_mixer::advisory::{AdvisoryError, CompletionBackend, CompletionRequest};
use deck_mixer::library::{DEFAULT_BPM, DEFAULT_ENERGY, DEFAULT_GENRE, DEFAULT_KEY, FALLBACK_DURATION_SECS};
use deck_mixer::{Advisor, TrackLibrary};

use common::{write_sine, RATE};

struct Reply(Option<&'static str>);

impl CompletionBackend for Reply {
    async fn complete(&self, _request: CompletionRequest) -> Result<String, AdvisoryError> {
        self.0.map(str::to_string).ok_or(AdvisoryError::MissingKey)
    }
}

#[tokio::test]
async fn import_uses_analysis_and_probed_length() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sine(dir.path(), "Sunrise Edit.wav", 440.0, 1.5, RATE);
    let advisor = Advisor::new(Reply(Some(
        r#"{"bpm": 122, "key": "F#m", "genre": "Deep House", "energy": 7}"#,
    )));
    let mut library = TrackLibrary::with_demo_tracks();

    let track = library.import_file(&path, &advisor).await.clone();
    assert_eq!(track.title, "Sunrise Edit");
    assert_eq!(track.artist, "Unknown Artist");
    assert_eq!(track.bpm, 122.0);
    assert_eq!(track.key, "F#m");
    assert_eq!(track.genre, "Deep House");
    assert_eq!(track.energy, 7);
    assert!((track.duration - 1.5).abs() < 1e-3);

    // Newest first, and findable.
    assert_eq!(library.tracks()[0].id, track.id);
    assert_eq!(library.len(), 5);
    assert_eq!(library.search("sunrise").len(), 1);
    assert_eq!(library.get(&track.id), Some(&track));
}

#[tokio::test]
async fn import_without_advisor_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mystery.mp3");
    std::fs::write(&path, b"not really audio").unwrap();
    let advisor = Advisor::new(Reply(None));
    let mut library = TrackLibrary::empty();

    let track = library.import_file(&path, &advisor).await.clone();
    assert_eq!(track.title, "mystery");
    assert_eq!(track.bpm, DEFAULT_BPM);
    assert_eq!(track.key, DEFAULT_KEY);
    assert_eq!(track.genre, DEFAULT_GENRE);
    assert_eq!(track.energy, DEFAULT_ENERGY);
    assert_eq!(track.duration, FALLBACK_DURATION_SECS);
}

#[tokio::test]
async fn imported_ids_are_unique() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sine(dir.path(), "loop.wav", 220.0, 0.1, RATE);
    let advisor = Advisor::new(Reply(None));
    let mut library = TrackLibrary::with_demo_tracks();

    let first = library.import_file(&path, &advisor).await.id.clone();
    let second = library.import_file(&path, &advisor).await.id.clone();
    assert_ne!(first, second);
    assert!(library.tracks().iter().filter(|t| t.id == first).count() == 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn imports_probe_length_on_a_threaded_runtime() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_sine(dir.path(), "a.wav", 220.0, 0.5, RATE);
    let b = write_sine(dir.path(), "b.wav", 330.0, 0.25, RATE);
    let advisor = Advisor::new(Reply(None));
    let mut library = TrackLibrary::empty();

    let first = library.import_file(&a, &advisor).await.duration;
    let second = library.import_file(&b, &advisor).await.duration;
    assert!((first - 0.5).abs() < 1e-3);
    assert!((second - 0.25).abs() < 1e-3);
}
