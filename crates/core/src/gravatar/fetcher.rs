//! Concurrent fetch-and-persist orchestration.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::client::{AvatarResponse, AvatarSource};
use super::store::{avatar_path, save_avatar, CollisionPolicy};
use crate::errors::{FetchError, IdentityError};
use crate::events::{Event, EventSink, TracingSink};
use crate::identity::{fingerprint, CommitterIdentity};

/// Tuning for a fetch run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FetchOptions {
    /// Upper bound on tasks fetching at once; `0` means unbounded.
    #[serde(default)]
    pub max_concurrent: usize,

    /// File naming when display names collide.
    #[serde(default)]
    pub collision: CollisionPolicy,
}

/// Result of fetching one committer's avatar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Saved { path: PathBuf },
    NotFound,
    Failed { cause: String },
}

/// Aggregated result of a fetch run.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct FetchSummary {
    /// Images written to disk.
    pub success_count: usize,
    /// Committers with no registered image.
    pub not_found_count: usize,
    /// One message per failed committer, in completion order.
    pub errors: Vec<String>,
}

impl FetchSummary {
    pub fn failed_count(&self) -> usize {
        self.errors.len()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Fetches and saves one avatar per committer, all concurrently.
///
/// Once fingerprints are computed, individual failures never stop the run:
/// every task is awaited and its outcome folded into the returned
/// [`FetchSummary`].
pub struct FetchOrchestrator {
    source: Arc<dyn AvatarSource>,
    sink: Arc<dyn EventSink>,
    options: FetchOptions,
}

impl FetchOrchestrator {
    pub fn new(source: Arc<dyn AvatarSource>, options: FetchOptions) -> Self {
        Self::with_sink(source, Arc::new(TracingSink), options)
    }

    pub fn with_sink(
        source: Arc<dyn AvatarSource>,
        sink: Arc<dyn EventSink>,
        options: FetchOptions,
    ) -> Self {
        Self {
            source,
            sink,
            options,
        }
    }

    /// Fetch every committer's avatar into `target_dir` and wait for all of
    /// them to finish.
    ///
    /// Every fingerprint is computed before any request is sent. A committer
    /// whose email cannot be hashed fails the whole run with
    /// [`IdentityError::InvalidArgument`]; every later failure is per
    /// committer and lands in the summary.
    pub async fn run<I>(
        &self,
        committers: I,
        target_dir: &Path,
    ) -> Result<FetchSummary, IdentityError>
    where
        I: IntoIterator<Item = CommitterIdentity>,
    {
        let jobs = committers
            .into_iter()
            .map(|committer| fingerprint(committer.email()).map(|fp| (committer, fp)))
            .collect::<Result<Vec<_>, _>>()?;

        let limit = match self.options.max_concurrent {
            0 => None,
            n => Some(Arc::new(Semaphore::new(n))),
        };

        let mut join_set = JoinSet::new();
        for (committer, fingerprint) in jobs {
            let source = Arc::clone(&self.source);
            let sink = Arc::clone(&self.sink);
            let limit = limit.clone();
            let dir = target_dir.to_path_buf();
            let policy = self.options.collision;
            join_set.spawn(async move {
                let _permit = match limit {
                    Some(sem) => sem.acquire_owned().await.ok(),
                    None => None,
                };
                let job = Job {
                    committer: &committer,
                    fingerprint: &fingerprint,
                    dir: &dir,
                    policy,
                };
                let outcome = match job.fetch(source.as_ref(), sink.as_ref()).await {
                    Ok(outcome) => outcome,
                    Err(e) => FetchOutcome::Failed {
                        cause: e.to_string(),
                    },
                };
                (committer, outcome)
            });
        }

        let mut summary = FetchSummary::default();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((committer, outcome)) => self.record(&mut summary, &committer, outcome),
                Err(e) => summary.errors.push(format!("fetch task failed: {}", e)),
            }
        }

        self.sink.record(&Event::RunCompleted {
            saved: summary.success_count,
            not_found: summary.not_found_count,
            failed: summary.failed_count(),
        });
        Ok(summary)
    }

    fn record(&self, summary: &mut FetchSummary, committer: &CommitterIdentity, outcome: FetchOutcome) {
        match outcome {
            FetchOutcome::Saved { path } => {
                self.sink.record(&Event::Saved {
                    committer,
                    path: &path,
                });
                summary.success_count += 1;
            }
            FetchOutcome::NotFound => {
                self.sink.record(&Event::NotFound { committer });
                summary.not_found_count += 1;
            }
            FetchOutcome::Failed { cause } => {
                self.sink.record(&Event::Failed {
                    committer,
                    cause: &cause,
                });
                summary.errors.push(format!("{}: {}", committer, cause));
            }
        }
    }
}

/// One committer's request, with its fingerprint already computed.
struct Job<'a> {
    committer: &'a CommitterIdentity,
    fingerprint: &'a str,
    dir: &'a Path,
    policy: CollisionPolicy,
}

impl Job<'_> {
    async fn fetch(
        &self,
        source: &dyn AvatarSource,
        sink: &dyn EventSink,
    ) -> Result<FetchOutcome, FetchError> {
        let url = source.url_for(self.fingerprint);
        sink.record(&Event::FetchStarted {
            committer: self.committer,
            url: &url,
        });

        match source.fetch(self.fingerprint).await? {
            AvatarResponse::Found(bytes) => {
                let path = avatar_path(self.dir, self.committer, self.fingerprint, self.policy);
                save_avatar(&path, bytes).await?;
                Ok(FetchOutcome::Saved { path })
            }
            AvatarResponse::NotFound => Ok(FetchOutcome::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::events::testing::RecordingSink;
    use crate::events::NullSink;

    #[derive(Clone)]
    enum Reply {
        Image(Vec<u8>),
        Missing,
        Broken(&'static str),
    }

    /// In-memory avatar source keyed by email.
    #[derive(Default)]
    struct FakeSource {
        replies: HashMap<String, Reply>,
        requested: Mutex<Vec<String>>,
        delay: Option<Duration>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl FakeSource {
        fn with(mut self, email: &str, reply: Reply) -> Self {
            self.replies.insert(fingerprint(email).unwrap(), reply);
            self
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }
    }

    #[async_trait]
    impl AvatarSource for FakeSource {
        fn url_for(&self, fingerprint: &str) -> String {
            format!("fake://{}", fingerprint)
        }

        async fn fetch(&self, fingerprint: &str) -> Result<AvatarResponse, FetchError> {
            self.requested.lock().unwrap().push(fingerprint.to_string());
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            match self.replies.get(fingerprint).cloned().unwrap_or(Reply::Missing) {
                Reply::Image(bytes) => Ok(AvatarResponse::Found(bytes)),
                Reply::Missing => Ok(AvatarResponse::NotFound),
                Reply::Broken(msg) => Err(FetchError::Source(msg.into())),
            }
        }
    }

    fn committer(name: &str, email: &str) -> CommitterIdentity {
        CommitterIdentity::new(name, email)
    }

    #[tokio::test]
    async fn test_partial_failure_does_not_stop_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource::default()
            .with("one@example.com", Reply::Image(b"png-1".to_vec()))
            .with("two@example.com", Reply::Broken("connection reset"))
            .with("three@example.com", Reply::Image(b"png-3".to_vec()));
        let orchestrator = FetchOrchestrator::with_sink(
            Arc::new(source),
            Arc::new(NullSink),
            FetchOptions::default(),
        );

        let summary = orchestrator
            .run(
                vec![
                    committer("One", "one@example.com"),
                    committer("Two", "two@example.com"),
                    committer("Three", "three@example.com"),
                ],
                dir.path(),
            )
            .await
            .unwrap();

        assert_eq!(summary.success_count, 2);
        assert_eq!(summary.not_found_count, 0);
        assert_eq!(summary.errors.len(), 1);
        assert!(summary.errors[0].starts_with("Two <two@example.com>: "));
        assert!(summary.errors[0].contains("connection reset"));
        assert_eq!(std::fs::read(dir.path().join("One.png")).unwrap(), b"png-1");
        assert_eq!(std::fs::read(dir.path().join("Three.png")).unwrap(), b"png-3");
        assert!(!dir.path().join("Two.png").exists());
    }

    #[tokio::test]
    async fn test_not_found_is_neither_success_nor_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource::default().with("darth@deathstar.space", Reply::Missing);
        let orchestrator =
            FetchOrchestrator::with_sink(Arc::new(source), Arc::new(NullSink), FetchOptions::default());

        let summary = orchestrator
            .run(vec![committer("Darth Vader", "darth@deathstar.space")], dir.path())
            .await
            .unwrap();

        assert_eq!(summary.success_count, 0);
        assert_eq!(summary.not_found_count, 1);
        assert!(summary.errors.is_empty());
        assert!(!dir.path().join("Darth Vader.png").exists());
    }

    #[tokio::test]
    async fn test_one_request_per_committer_by_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(FakeSource::default());
        let orchestrator = FetchOrchestrator::with_sink(source.clone(), Arc::new(NullSink), FetchOptions::default());

        orchestrator
            .run(
                vec![
                    committer("Tim Long", "Tim@tigranetworks.co.uk"),
                    committer("Darth Vader", "darth@deathstar.space"),
                ],
                dir.path(),
            )
            .await
            .unwrap();

        let mut requested = source.requested.lock().unwrap().clone();
        requested.sort();
        assert_eq!(requested.len(), 2);
        assert!(requested.contains(&"df0478426c0e47cc5e557d5391e5255d".to_string()));
    }

    #[tokio::test]
    async fn test_invalid_email_fails_run_before_any_request() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(
            FakeSource::default().with("a@example.com", Reply::Image(b"png-a".to_vec())),
        );
        let sink = Arc::new(RecordingSink::default());
        let orchestrator =
            FetchOrchestrator::with_sink(source.clone(), sink.clone(), FetchOptions::default());

        let result = orchestrator
            .run(
                vec![committer("A", "a@example.com"), committer("Blank", "   ")],
                dir.path(),
            )
            .await;

        assert!(matches!(result, Err(IdentityError::InvalidArgument(_))));
        assert!(source.requested.lock().unwrap().is_empty());
        assert!(sink.lines().is_empty());
        assert!(!dir.path().join("A.png").exists());
    }

    #[tokio::test]
    async fn test_write_failure_is_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("not-created");
        let source = FakeSource::default().with("one@example.com", Reply::Image(b"x".to_vec()));
        let orchestrator =
            FetchOrchestrator::with_sink(Arc::new(source), Arc::new(NullSink), FetchOptions::default());

        let summary = orchestrator
            .run(vec![committer("One", "one@example.com")], &missing)
            .await
            .unwrap();

        assert_eq!(summary.success_count, 0);
        assert_eq!(summary.failed_count(), 1);
        assert!(summary.errors[0].contains("failed to write"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_shared_name_overwrite_leaves_one_whole_image() {
        let large = vec![b'L'; 4 * 1024 * 1024];
        let small = vec![b'S'; 1000];
        for _ in 0..20 {
            let dir = tempfile::tempdir().unwrap();
            let source = FakeSource::default()
                .with("same@home.example", Reply::Image(large.clone()))
                .with("same@work.example", Reply::Image(small.clone()));
            let orchestrator = FetchOrchestrator::with_sink(
                Arc::new(source),
                Arc::new(NullSink),
                FetchOptions::default(),
            );

            let summary = orchestrator
                .run(
                    vec![
                        committer("Same", "same@home.example"),
                        committer("Same", "same@work.example"),
                    ],
                    dir.path(),
                )
                .await
                .unwrap();

            assert_eq!(summary.success_count, 2);
            let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
            assert_eq!(files.len(), 1);
            let content = std::fs::read(dir.path().join("Same.png")).unwrap();
            assert!(content == large || content == small, "mixed file of {} bytes", content.len());
        }
    }

    #[tokio::test]
    async fn test_shared_name_with_fingerprint_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource::default()
            .with("tim@home.example", Reply::Image(b"home".to_vec()))
            .with("tim@work.example", Reply::Image(b"work".to_vec()));
        let options = FetchOptions {
            collision: CollisionPolicy::SuffixFingerprint,
            ..Default::default()
        };
        let orchestrator = FetchOrchestrator::with_sink(Arc::new(source), Arc::new(NullSink), options);

        orchestrator
            .run(
                vec![
                    committer("Tim Long", "tim@home.example"),
                    committer("Tim Long", "tim@work.example"),
                ],
                dir.path(),
            )
            .await
            .unwrap();

        let home = dir
            .path()
            .join(format!("Tim Long-{}.png", fingerprint("tim@home.example").unwrap()));
        let work = dir
            .path()
            .join(format!("Tim Long-{}.png", fingerprint("tim@work.example").unwrap()));
        assert_eq!(std::fs::read(home).unwrap(), b"home");
        assert_eq!(std::fs::read(work).unwrap(), b"work");
    }

    #[tokio::test]
    async fn test_concurrency_bound_is_respected() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(FakeSource::default().with_delay(Duration::from_millis(20)));
        let options = FetchOptions {
            max_concurrent: 2,
            ..Default::default()
        };
        let orchestrator = FetchOrchestrator::with_sink(source.clone(), Arc::new(NullSink), options);

        let committers: Vec<_> = (0..6)
            .map(|i| committer(&format!("User {i}"), &format!("user{i}@example.com")))
            .collect();
        let summary = orchestrator.run(committers, dir.path()).await.unwrap();

        assert_eq!(summary.not_found_count, 6);
        assert!(source.max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_unbounded_runs_all_at_once() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(FakeSource::default().with_delay(Duration::from_millis(50)));
        let orchestrator = FetchOrchestrator::with_sink(source.clone(), Arc::new(NullSink), FetchOptions::default());

        let committers: Vec<_> = (0..5)
            .map(|i| committer(&format!("User {i}"), &format!("user{i}@example.com")))
            .collect();
        orchestrator.run(committers, dir.path()).await.unwrap();

        assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_events_reported_to_sink() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(RecordingSink::default());
        let source = FakeSource::default()
            .with("one@example.com", Reply::Image(b"1".to_vec()))
            .with("two@example.com", Reply::Broken("boom"));
        let orchestrator = FetchOrchestrator::with_sink(Arc::new(source), sink.clone(), FetchOptions::default());

        orchestrator
            .run(
                vec![
                    committer("One", "one@example.com"),
                    committer("Two", "two@example.com"),
                    committer("Three", "three@example.com"),
                ],
                dir.path(),
            )
            .await
            .unwrap();

        assert_eq!(sink.count_prefix("fetching "), 3);
        assert_eq!(sink.count_prefix("saved "), 1);
        assert_eq!(sink.count_prefix("failed "), 1);
        assert_eq!(sink.count_prefix("no image for "), 1);
        assert_eq!(
            sink.lines().last().unwrap(),
            "run completed (saved=1, not_found=1, failed=1)"
        );
    }

    #[tokio::test]
    async fn test_empty_input() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator =
            FetchOrchestrator::new(Arc::new(FakeSource::default()), FetchOptions::default());
        let summary = orchestrator.run(Vec::new(), dir.path()).await.unwrap();
        assert_eq!(summary, FetchSummary::default());
    }
}
