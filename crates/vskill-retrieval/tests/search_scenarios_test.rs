//! End-to-end search scenarios against the in-memory backend

use serde_json::{json, Value};
use std::time::Duration;
use vskill_core::models::{
    IndexKind, RawShot, SearchRequest, SearchScope, VideoHandle, VideoRef,
};
use vskill_core::ports::RetryPolicy;
use vskill_core::SkillError;
use vskill_retrieval::SearchOrchestrator;
use vskill_store::{MemoryBackend, RecordingSleeper};

fn raw(value: Value) -> RawShot {
    match value {
        Value::Object(map) => map,
        _ => panic!("raw shot must be an object"),
    }
}

#[test]
fn test_known_youtube_url_searches_existing_video() {
    let backend = MemoryBackend::new()
        .with_video(
            VideoHandle::new("m-7")
                .with_name("Launch keynote")
                .with_source("https://www.youtube.com/watch?v=abc123"),
        )
        .with_ready_index("m-7", IndexKind::SpokenWord)
        .with_shots(
            "m-7",
            IndexKind::SpokenWord,
            vec![raw(json!({"start": 3.21, "end": 9.87, "text": "pricing", "score": 0.9}))],
        );
    let sleeper = RecordingSleeper::new();

    let request = SearchRequest::new(
        "pricing",
        SearchScope::Video(VideoRef::ByUrl("https://youtu.be/abc123".into())),
    );
    let outcome = SearchOrchestrator::new(&backend, &sleeper, RetryPolicy::default())
        .search(&request)
        .unwrap();

    assert_eq!(outcome.video_id.as_deref(), Some("m-7"));
    assert_eq!(outcome.total(), 1);
    assert_eq!(outcome.shots[0].start, 3.2);
    assert_eq!(outcome.shots[0].end, 9.9);
    assert_eq!(backend.calls().upload, 0);
}

#[test]
fn test_new_url_is_uploaded_indexed_and_searched() {
    let backend = MemoryBackend::new().with_index_delay(1);
    let sleeper = RecordingSleeper::new();
    let policy = RetryPolicy::new(30, Duration::from_secs(10));

    let request = SearchRequest::new(
        "pricing",
        SearchScope::Video(VideoRef::ByUrl("https://youtu.be/fresh1".into())),
    );
    let outcome = SearchOrchestrator::new(&backend, &sleeper, policy)
        .search(&request)
        .unwrap();

    // The fresh upload has no content, so the final attempt is empty
    assert_eq!(outcome.total(), 0);
    assert!(outcome.compiled_stream_url.is_none());

    let calls = backend.calls();
    assert_eq!(calls.upload, 1);
    assert_eq!(calls.create_index, 1);
    assert_eq!(calls.search, 2);
    assert_eq!(sleeper.total(), Duration::from_secs(20));
}

#[test]
fn test_search_calls_bounded_on_timeout() {
    let backend = MemoryBackend::new()
        .with_video(VideoHandle::new("vid_1"))
        .with_index_never_ready();
    let sleeper = RecordingSleeper::new();

    let err = SearchOrchestrator::new(&backend, &sleeper, RetryPolicy::default())
        .search(&SearchRequest::new("q", SearchScope::Video(VideoRef::ById("vid_1".into()))))
        .unwrap_err();

    assert!(matches!(err, SkillError::IndexingTimeout { attempts: 30, .. }));
    assert_eq!(sleeper.sleeps().len(), 30);
    assert!(backend.calls().search <= 2);
}
