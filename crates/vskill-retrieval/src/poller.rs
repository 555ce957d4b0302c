use vskill_core::error::{BackendErrorKind, Result, SkillError};
use vskill_core::models::{IndexCreateParams, IndexKind};
use vskill_core::ports::{RetryPolicy, Sleeper, VideoBackend};

/// Builds an index when missing and waits for it to become ready
pub struct IndexReadinessPoller<'a, B: VideoBackend + ?Sized, S: Sleeper + ?Sized> {
    backend: &'a B,
    sleeper: &'a S,
    policy: RetryPolicy,
}

impl<'a, B: VideoBackend + ?Sized, S: Sleeper + ?Sized> IndexReadinessPoller<'a, B, S> {
    pub fn new(backend: &'a B, sleeper: &'a S, policy: RetryPolicy) -> Self {
        Self { backend, sleeper, policy }
    }

    /// Ensure an index of `params.kind()` is ready on the video
    ///
    /// Returns immediately when one is already ready. Otherwise creates it and
    /// checks again up to `max_attempts` times, `interval` apart. The flag
    /// tells whether this call started building a new index.
    pub fn ensure_ready(&self, video_id: &str, params: &IndexCreateParams) -> Result<bool> {
        let kind = params.kind();

        if self.is_ready(video_id, kind) {
            tracing::debug!(%video_id, %kind, "Index already ready");
            return Ok(false);
        }

        let created = match self.backend.create_index(video_id, params) {
            Ok(index_id) => {
                tracing::info!(%video_id, %kind, index_id = ?index_id, "Started indexing");
                true
            }
            Err(e) if e.backend_kind() == Some(BackendErrorKind::AlreadyIndexed) => {
                tracing::debug!(%video_id, %kind, "Index creation already in progress: {}", e);
                false
            }
            Err(e) => return Err(e),
        };

        for attempt in 1..=self.policy.max_attempts {
            self.sleeper.sleep(self.policy.interval);

            if self.is_ready(video_id, kind) {
                tracing::info!(%video_id, %kind, attempt, "Index ready");
                return Ok(created);
            }
        }

        tracing::warn!(
            %video_id,
            %kind,
            attempts = self.policy.max_attempts,
            waited_secs = self.policy.budget().as_secs(),
            "Index not ready in time"
        );
        Err(SkillError::IndexingTimeout {
            video_id: video_id.to_string(),
            kind,
            attempts: self.policy.max_attempts,
        })
    }

    /// A failed status query counts as not ready
    fn is_ready(&self, video_id: &str, kind: IndexKind) -> bool {
        match self.backend.list_indexes(video_id, kind) {
            Ok(indexes) => indexes.iter().any(|index| index.is_ready()),
            Err(e) => {
                tracing::debug!(%video_id, %kind, "Index status check failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use vskill_core::models::SceneIndexParams;
    use vskill_store::{MemoryBackend, RecordingSleeper};

    #[test]
    fn test_ready_index_skips_create() {
        let backend = MemoryBackend::new().with_ready_index("m-1", IndexKind::SpokenWord);
        let sleeper = RecordingSleeper::new();
        let poller = IndexReadinessPoller::new(&backend, &sleeper, RetryPolicy::default());

        let created = poller.ensure_ready("m-1", &IndexCreateParams::SpokenWord).unwrap();

        assert!(!created);
        assert_eq!(backend.calls().create_index, 0);
        assert!(sleeper.sleeps().is_empty());
    }

    #[test]
    fn test_never_ready_times_out_after_policy() {
        let backend = MemoryBackend::new().with_index_never_ready();
        let sleeper = RecordingSleeper::new();
        let poller = IndexReadinessPoller::new(&backend, &sleeper, RetryPolicy::default());

        let err = poller
            .ensure_ready("m-1", &IndexCreateParams::Scene(SceneIndexParams::default()))
            .unwrap_err();

        assert!(matches!(
            err,
            SkillError::IndexingTimeout { attempts: 30, kind: IndexKind::Scene, .. }
        ));
        assert_eq!(sleeper.sleeps().len(), 30);
        assert_eq!(sleeper.total(), Duration::from_secs(300));
        assert_eq!(backend.calls().create_index, 1);
        assert_eq!(backend.calls().list_indexes, 31);
    }

    #[test]
    fn test_ready_after_some_checks() {
        let backend = MemoryBackend::new().with_index_delay(2);
        let sleeper = RecordingSleeper::new();
        let policy = RetryPolicy::new(5, Duration::from_secs(2));
        let poller = IndexReadinessPoller::new(&backend, &sleeper, policy);

        let created = poller.ensure_ready("m-1", &IndexCreateParams::SpokenWord).unwrap();
        assert!(created);
        assert_eq!(sleeper.sleeps(), vec![Duration::from_secs(2); 3]);
    }

    #[test]
    fn test_status_failures_count_as_not_ready() {
        let backend = MemoryBackend::new()
            .with_ready_index("m-1", IndexKind::SpokenWord)
            .with_status_failures(2);
        let sleeper = RecordingSleeper::new();
        let poller = IndexReadinessPoller::new(&backend, &sleeper, RetryPolicy::default());

        poller.ensure_ready("m-1", &IndexCreateParams::SpokenWord).unwrap();
        assert_eq!(sleeper.sleeps().len(), 2);
    }

    #[test]
    fn test_already_indexed_create_is_tolerated() {
        let backend = MemoryBackend::new()
            .with_index_never_ready()
            .with_duplicate_rejection();
        backend.create_index("m-1", &IndexCreateParams::SpokenWord).unwrap();

        let sleeper = RecordingSleeper::new();
        let policy = RetryPolicy::new(2, Duration::from_secs(1));
        let err = IndexReadinessPoller::new(&backend, &sleeper, policy)
            .ensure_ready("m-1", &IndexCreateParams::SpokenWord)
            .unwrap_err();

        // The duplicate is tolerated; only the wait fails
        assert!(matches!(err, SkillError::IndexingTimeout { attempts: 2, .. }));
    }

    #[test]
    fn test_create_failure_propagates() {
        let backend = MemoryBackend::new().with_create_failure("Quota exceeded");
        let sleeper = RecordingSleeper::new();

        let err = IndexReadinessPoller::new(&backend, &sleeper, RetryPolicy::default())
            .ensure_ready("m-1", &IndexCreateParams::SpokenWord)
            .unwrap_err();

        assert_eq!(err.to_string(), "Quota exceeded");
        assert!(sleeper.sleeps().is_empty());
    }
}
