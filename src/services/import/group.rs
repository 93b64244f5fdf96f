use std::collections::HashMap;

use crate::services::import::types::{NormalizedTrack, PlaylistGroup};

/// Fold normalized tracks into playlist groups keyed by name.
///
/// Both the group order and the track order inside a group follow first appearance.
pub fn group_tracks(tracks: impl IntoIterator<Item = NormalizedTrack>) -> Vec<PlaylistGroup> {
    let mut groups: Vec<PlaylistGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for NormalizedTrack { playlist, track } in tracks {
        match index.get(&playlist) {
            Some(&idx) => groups[idx].tracks.push(track),
            None => {
                index.insert(playlist.clone(), groups.len());
                groups.push(PlaylistGroup {
                    name: playlist,
                    tracks: vec![track],
                });
            }
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::import::types::{SourceRow, Track};

    fn normalized(playlist: &str, title: &str) -> NormalizedTrack {
        NormalizedTrack {
            playlist: playlist.to_string(),
            track: Track {
                title: title.to_string(),
                artist: None,
                target_id: None,
                source_row: SourceRow {
                    source: "test".to_string(),
                    line: 1,
                },
            },
        }
    }

    #[test]
    fn test_grouping_is_stable() {
        let groups = group_tracks(vec![
            normalized("A", "first"),
            normalized("B", "second"),
            normalized("A", "third"),
        ]);

        let names: Vec<_> = groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, ["A", "B"]);

        let a_titles: Vec<_> = groups[0].tracks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(a_titles, ["first", "third"]);
    }

    #[test]
    fn test_grouping_empty_input() {
        assert!(group_tracks(Vec::new()).is_empty());
    }
}
