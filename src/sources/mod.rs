pub mod csv_file;
pub mod spotify_playlist;

pub use csv_file::{CsvFileSource, expand_csv_inputs};
pub use spotify_playlist::{SpotifyPlaylistSource, parse_playlist_id};
