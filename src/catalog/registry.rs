// Song registry - owns every song for the session
//
// Songs live in a Vec and are addressed by SongIndex handles. The ranking
// tree only stores handles, so it can never outlive or dangle into this.

use crate::catalog::features::{Feature, FEATURE_COUNT};
use crate::catalog::song::Song;
use crate::error::{Result, SongSplayError};
use csv::{ReaderBuilder, StringRecord};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Handle to a song inside a registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SongIndex(pub(crate) usize);

impl SongIndex {
    pub fn get(self) -> usize {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct SongRegistry {
    songs: Vec<Song>,
    by_id: HashMap<String, SongIndex>,
}

impl SongRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Adds a song, or replaces the one with the same id in place so existing
    // handles keep pointing at the right slot.
    pub fn insert(&mut self, song: Song) -> SongIndex {
        if let Some(&idx) = self.by_id.get(&song.track_id) {
            self.songs[idx.0] = song;
            return idx;
        }

        let idx = SongIndex(self.songs.len());
        self.by_id.insert(song.track_id.clone(), idx);
        self.songs.push(song);
        idx
    }

    pub fn index_of(&self, track_id: &str) -> Option<SongIndex> {
        self.by_id.get(track_id).copied()
    }

    pub fn get(&self, track_id: &str) -> Option<&Song> {
        self.index_of(track_id).map(|idx| &self.songs[idx.0])
    }

    /// Like `get`, but an unknown id is an error
    pub fn require(&self, track_id: &str) -> Result<&Song> {
        self.get(track_id)
            .ok_or_else(|| SongSplayError::SongNotFound(track_id.to_string()))
    }

    /// Panics if the handle came from a different registry
    pub fn song(&self, idx: SongIndex) -> &Song {
        &self.songs[idx.0]
    }

    pub fn song_mut(&mut self, idx: SongIndex) -> &mut Song {
        &mut self.songs[idx.0]
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    /// Handles in load order
    pub fn indices(&self) -> impl Iterator<Item = SongIndex> + '_ {
        (0..self.songs.len()).map(SongIndex)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SongIndex, &Song)> {
        self.songs.iter().enumerate().map(|(i, s)| (SongIndex(i), s))
    }

    /// Load songs from a CSV file. Returns how many rows were added.
    pub fn load_csv<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let loaded = self.load_csv_reader(file)?;
        info!("Loaded {} songs from {}", loaded, path.display());
        Ok(loaded)
    }

    /// Load songs from any CSV source with a header row
    ///
    /// Quoted fields may contain commas and doubled quotes. Missing or
    /// malformed numbers become 0, rows with an empty `track_id` are
    /// skipped, and records the parser rejects are skipped with a warning.
    pub fn load_csv_reader<R: Read>(&mut self, reader: R) -> Result<usize> {
        let mut csv = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let columns = Columns::from_headers(csv.headers()?);
        if columns.track_id.is_none() {
            return Err(SongSplayError::Catalog(
                "missing track_id column".to_string(),
            ));
        }

        let mut loaded = 0;
        for (line, record) in csv.records().enumerate() {
            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    warn!("Skipping unreadable catalog row {}: {}", line + 2, e);
                    continue;
                }
            };

            match columns.song_from(&record) {
                Some(song) => {
                    self.insert(song);
                    loaded += 1;
                }
                None => debug!("Skipping catalog row {} with empty track_id", line + 2),
            }
        }

        Ok(loaded)
    }
}

// Column positions looked up once from the header row
struct Columns {
    track_id: Option<usize>,
    track_name: Option<usize>,
    track_artist: Option<usize>,
    track_popularity: Option<usize>,
    track_album_id: Option<usize>,
    track_album_name: Option<usize>,
    track_album_release_date: Option<usize>,
    playlist_name: Option<usize>,
    playlist_id: Option<usize>,
    playlist_genre: Option<usize>,
    playlist_subgenre: Option<usize>,
    key: Option<usize>,
    mode: Option<usize>,
    features: [Option<usize>; FEATURE_COUNT],
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Self {
        let idx = |name: &str| headers.iter().position(|h| h.trim() == name);

        Self {
            track_id: idx("track_id"),
            track_name: idx("track_name"),
            track_artist: idx("track_artist"),
            track_popularity: idx("track_popularity"),
            track_album_id: idx("track_album_id"),
            track_album_name: idx("track_album_name"),
            track_album_release_date: idx("track_album_release_date"),
            playlist_name: idx("playlist_name"),
            playlist_id: idx("playlist_id"),
            playlist_genre: idx("playlist_genre"),
            playlist_subgenre: idx("playlist_subgenre"),
            key: idx("key"),
            mode: idx("mode"),
            features: Feature::ALL.map(|f| idx(f.name())),
        }
    }

    fn song_from(&self, record: &StringRecord) -> Option<Song> {
        let text = |col: Option<usize>| -> String {
            col.and_then(|i| record.get(i)).unwrap_or("").to_string()
        };

        let track_id = text(self.track_id);
        if track_id.is_empty() {
            return None;
        }

        let mut song = Song::new(track_id, text(self.track_name));
        song.track_artist = text(self.track_artist);
        song.track_popularity = parse_int(record, self.track_popularity);
        song.track_album_id = text(self.track_album_id);
        song.track_album_name = text(self.track_album_name);
        song.track_album_release_date = text(self.track_album_release_date);
        song.playlist_name = text(self.playlist_name);
        song.playlist_id = text(self.playlist_id);
        song.playlist_genre = text(self.playlist_genre);
        song.playlist_subgenre = text(self.playlist_subgenre);
        song.key = parse_int(record, self.key);
        song.mode = parse_int(record, self.mode);

        for feature in Feature::ALL {
            song.features[feature] = parse_float(record, self.features[feature.index()]);
        }

        Some(song)
    }
}

fn parse_float(record: &StringRecord, col: Option<usize>) -> f64 {
    col.and_then(|i| record.get(i))
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

// Accepts "63" as well as "63.0"
fn parse_int(record: &StringRecord, col: Option<usize>) -> i32 {
    let Some(raw) = col.and_then(|i| record.get(i)).map(str::trim) else {
        return 0;
    };

    raw.parse::<i32>()
        .ok()
        .or_else(|| {
            raw.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(|v| v.round() as i32)
        })
        .unwrap_or(0)
}
