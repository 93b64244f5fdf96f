//! Helpers for digging data out of innertube responses.
//!
//! The response layout is undocumented and shifts often, so everything here walks
//! `serde_json::Value` trees and tolerates missing pieces instead of deserializing
//! into fixed structs.

use serde_json::Value;

use crate::ytmusic_rs::types::{LibraryPlaylist, PlaylistItem, SongResult};

const LIST_ITEM: &str = "musicResponsiveListItemRenderer";
const TWO_ROW_ITEM: &str = "musicTwoRowItemRenderer";
const ARTIST_PAGE: &str = "MUSIC_PAGE_TYPE_ARTIST";
const SEPARATOR: &str = " • ";

/// Collect every value stored under `key`, depth first. Matches are not searched
/// further.
pub fn collect_renderers<'a>(value: &'a Value, key: &str, out: &mut Vec<&'a Value>) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                if k == key {
                    out.push(v);
                } else {
                    collect_renderers(v, key, out);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_renderers(item, key, out);
            }
        }
        _ => {}
    }
}

fn find_first<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map
            .get(key)
            .or_else(|| map.values().find_map(|v| find_first(v, key))),
        Value::Array(items) => items.iter().find_map(|v| find_first(v, key)),
        _ => None,
    }
}

fn text(value: &Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn runs(column: &Value) -> &[Value] {
    column
        .pointer("/musicResponsiveListItemFlexColumnRenderer/text/runs")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Token for the next page of a shelf, if there is one.
pub fn continuation_token(response: &Value) -> Option<String> {
    if let Some(data) = find_first(response, "nextContinuationData") {
        return text(data, "/continuation");
    }
    find_first(response, "continuationCommand").and_then(|command| text(command, "/token"))
}

fn item_video_id(item: &Value) -> Option<String> {
    text(item, "/playlistItemData/videoId")
        .or_else(|| {
            text(
                item,
                "/flexColumns/0/musicResponsiveListItemFlexColumnRenderer/text/runs/0/navigationEndpoint/watchEndpoint/videoId",
            )
        })
        .or_else(|| {
            text(
                item,
                "/overlay/musicItemThumbnailOverlayRenderer/content/musicPlayButtonRenderer/playNavigationEndpoint/watchEndpoint/videoId",
            )
        })
}

fn item_artists(item: &Value) -> Vec<String> {
    let Some(column) = item.pointer("/flexColumns/1") else {
        return Vec::new();
    };
    let runs = runs(column);

    let linked: Vec<String> = runs
        .iter()
        .filter(|run| {
            let endpoint = run.pointer("/navigationEndpoint/browseEndpoint");
            let page_type = endpoint.and_then(|e| {
                e.pointer(
                    "/browseEndpointContextSupportedConfigs/browseEndpointContextMusicConfig/pageType",
                )
            });
            let browse_id = endpoint.and_then(|e| e.get("browseId")).and_then(Value::as_str);
            page_type.and_then(Value::as_str) == Some(ARTIST_PAGE)
                || browse_id.is_some_and(|id| id.starts_with("UC"))
        })
        .filter_map(|run| text(run, "/text"))
        .collect();

    if !linked.is_empty() {
        return linked;
    }

    // Unlinked artists: everything before the first separator
    runs.iter()
        .filter_map(|run| run.get("text").and_then(Value::as_str))
        .take_while(|t| *t != SEPARATOR)
        .filter(|t| !t.trim().is_empty() && *t != ", " && *t != " & ")
        .map(str::to_string)
        .collect()
}

fn list_item(item: &Value) -> PlaylistItem {
    PlaylistItem {
        video_id: item_video_id(item),
        title: text(
            item,
            "/flexColumns/0/musicResponsiveListItemFlexColumnRenderer/text/runs/0/text",
        )
        .unwrap_or_default(),
        artists: item_artists(item),
    }
}

/// Song rows of a search response, in ranking order. Rows without a video id are skipped.
pub fn song_results(response: &Value) -> Vec<SongResult> {
    let mut items = Vec::new();
    collect_renderers(response, LIST_ITEM, &mut items);

    items
        .into_iter()
        .map(list_item)
        .filter_map(|item| {
            Some(SongResult {
                video_id: item.video_id?,
                title: item.title,
                artists: item.artists,
            })
        })
        .collect()
}

/// Track rows of a playlist page (or one of its continuations).
pub fn playlist_items(response: &Value) -> Vec<PlaylistItem> {
    let mut items = Vec::new();
    collect_renderers(response, LIST_ITEM, &mut items);
    items.into_iter().map(list_item).collect()
}

/// Playlists on the library page. Tiles that do not link to a playlist
/// (such as "New playlist") are skipped.
pub fn library_playlists(response: &Value) -> Vec<LibraryPlaylist> {
    let mut items = Vec::new();
    collect_renderers(response, TWO_ROW_ITEM, &mut items);

    items
        .into_iter()
        .filter_map(|item| {
            let browse_id = text(item, "/navigationEndpoint/browseEndpoint/browseId").or_else(
                || {
                    text(
                        item,
                        "/title/runs/0/navigationEndpoint/browseEndpoint/browseId",
                    )
                },
            )?;
            let playlist_id = browse_id.strip_prefix("VL")?.to_string();
            Some(LibraryPlaylist {
                playlist_id,
                title: text(item, "/title/runs/0/text").unwrap_or_default(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn song_row(video_id: &str, title: &str, artist_runs: Value) -> Value {
        json!({
            "musicResponsiveListItemRenderer": {
                "flexColumns": [
                    {"musicResponsiveListItemFlexColumnRenderer": {"text": {"runs": [
                        {"text": title, "navigationEndpoint": {"watchEndpoint": {"videoId": video_id}}}
                    ]}}},
                    {"musicResponsiveListItemFlexColumnRenderer": {"text": {"runs": artist_runs}}}
                ]
            }
        })
    }

    fn artist_run(name: &str) -> Value {
        json!({"text": name, "navigationEndpoint": {"browseEndpoint": {
            "browseId": "UCxyz",
            "browseEndpointContextSupportedConfigs": {"browseEndpointContextMusicConfig": {"pageType": "MUSIC_PAGE_TYPE_ARTIST"}}
        }}})
    }

    #[test]
    fn test_song_results_in_order() {
        let response = json!({
            "contents": {"tabbedSearchResultsRenderer": {"tabs": [{"tabRenderer": {"content": {
                "sectionListRenderer": {"contents": [{"musicShelfRenderer": {"contents": [
                    song_row("aaaaaaaaaaa", "First", json!([artist_run("Artist X"), {"text": " & "}, artist_run("Artist Y"), {"text": " • "}, {"text": "Album"}])),
                    song_row("bbbbbbbbbbb", "Second", json!([{"text": "Unlinked"}, {"text": " • "}, {"text": "3:12"}]))
                ]}}]}
            }}}]}}
        });

        let results = song_results(&response);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].video_id, "aaaaaaaaaaa");
        assert_eq!(results[0].title, "First");
        assert_eq!(results[0].artists, ["Artist X", "Artist Y"]);
        assert_eq!(results[1].video_id, "bbbbbbbbbbb");
        assert_eq!(results[1].artists, ["Unlinked"]);
    }

    #[test]
    fn test_song_results_skip_rows_without_video_id() {
        let response = json!({"contents": [{"musicResponsiveListItemRenderer": {
            "flexColumns": [{"musicResponsiveListItemFlexColumnRenderer": {"text": {"runs": [{"text": "Gone"}]}}}]
        }}]});

        assert!(song_results(&response).is_empty());
    }

    #[test]
    fn test_playlist_items_prefer_playlist_item_data() {
        let mut row = song_row("fromcolumn1", "Song", json!([artist_run("Artist")]));
        row["musicResponsiveListItemRenderer"]["playlistItemData"] =
            json!({"videoId": "fromitemdat"});
        let unavailable = json!({"musicResponsiveListItemRenderer": {"flexColumns": [
            {"musicResponsiveListItemFlexColumnRenderer": {"text": {"runs": [{"text": "Deleted video"}]}}}
        ]}});

        let items = playlist_items(&json!({"contents": [row, unavailable]}));

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].video_id.as_deref(), Some("fromitemdat"));
        assert_eq!(items[1].video_id, None);
        assert_eq!(items[1].title, "Deleted video");
    }

    #[test]
    fn test_library_playlists() {
        let response = json!({"contents": {"gridRenderer": {"items": [
            {"musicTwoRowItemRenderer": {"title": {"runs": [{"text": "New playlist"}]},
                "navigationEndpoint": {"createPlaylistEndpoint": {}}}},
            {"musicTwoRowItemRenderer": {"title": {"runs": [{"text": "My Mix"}]},
                "navigationEndpoint": {"browseEndpoint": {"browseId": "VLPL123"}}}},
            {"musicTwoRowItemRenderer": {"title": {"runs": [{"text": "Road Trip",
                "navigationEndpoint": {"browseEndpoint": {"browseId": "VLPL456"}}}]}}}
        ]}}});

        let playlists = library_playlists(&response);

        assert_eq!(
            playlists,
            vec![
                LibraryPlaylist {
                    playlist_id: "PL123".to_string(),
                    title: "My Mix".to_string()
                },
                LibraryPlaylist {
                    playlist_id: "PL456".to_string(),
                    title: "Road Trip".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_continuation_token() {
        let legacy = json!({"continuations": [{"nextContinuationData": {"continuation": "tok1"}}]});
        let command = json!({"contents": [{"continuationItemRenderer": {"continuationEndpoint":
            {"continuationCommand": {"token": "tok2"}}}}]});

        assert_eq!(continuation_token(&legacy).as_deref(), Some("tok1"));
        assert_eq!(continuation_token(&command).as_deref(), Some("tok2"));
        assert_eq!(continuation_token(&json!({"contents": []})), None);
    }
}
