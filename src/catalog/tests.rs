use super::client::SearchResponse;
use super::model::{RawResult, format_duration, playable_url};

#[test]
fn format_duration_renders_m_ss() {
    assert_eq!(format_duration(0), "0:00");
    assert_eq!(format_duration(7), "0:07");
    assert_eq!(format_duration(59), "0:59");
    assert_eq!(format_duration(60), "1:00");
    assert_eq!(format_duration(61), "1:01");
    assert_eq!(format_duration(600), "10:00");
    // No hour rollover: minutes keep counting.
    assert_eq!(format_duration(3605), "60:05");
}

#[test]
fn playable_url_embeds_the_track_id() {
    assert_eq!(
        playable_url("dQw4w9WgXcQ"),
        "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
    );
}

#[test]
fn search_response_drops_entries_without_an_id() {
    let json = r#"{
        "results": [
            {"id": "abc123", "title": "Keeper", "artist": "Band", "durationSeconds": 61},
            {"id": "", "title": "Empty Id"},
            {"id": "   ", "title": "Blank Id"},
            {"title": "No Id At All"}
        ]
    }"#;
    let decoded: SearchResponse = serde_json::from_str(json).unwrap();
    let tracks: Vec<_> = decoded
        .results
        .into_iter()
        .filter_map(RawResult::into_track)
        .collect();

    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].id, "abc123");
    assert_eq!(tracks[0].title, "Keeper");
    assert_eq!(tracks[0].artist, "Band");
    assert_eq!(tracks[0].duration, "1:01");
}

#[test]
fn missing_artist_and_duration_get_placeholders() {
    let json = r#"{"results": [{"id": "xyz", "title": "Lone"}]}"#;
    let decoded: SearchResponse = serde_json::from_str(json).unwrap();
    let tracks: Vec<_> = decoded
        .results
        .into_iter()
        .filter_map(RawResult::into_track)
        .collect();

    assert_eq!(tracks[0].artist, "Unknown Artist");
    assert_eq!(tracks[0].duration, "0:00");
}

#[test]
fn absent_results_field_decodes_as_empty() {
    let decoded: SearchResponse = serde_json::from_str("{}").unwrap();
    assert!(decoded.results.is_empty());
}
