//! End-to-end avatar run: repository log in, image files out.
//!
//! [`AvatarEngine`] ties the configuration to the git log reader and the
//! fetch orchestrator. Every fatal condition comes back as a [`CoreError`];
//! per-committer fetch failures stay inside the [`FetchSummary`].

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::errors::CoreError;
use crate::events::{EventSink, TracingSink};
use crate::git::GitLog;
use crate::gravatar::{prepare_output_dir, FetchOrchestrator, FetchSummary, GravatarClient};
use crate::identity::CommitterIdentity;

/// What a call to [`AvatarEngine::fetch`] did.
#[derive(Debug, Clone, Serialize)]
pub struct FetchReport {
    /// Committers an avatar was requested for.
    pub committers: usize,
    /// Absolute path of the output directory.
    pub target_dir: PathBuf,
    pub summary: FetchSummary,
}

/// Reads committers and fetches their avatars as an [`AppConfig`] describes.
pub struct AvatarEngine {
    config: AppConfig,
    sink: Arc<dyn EventSink>,
}

impl AvatarEngine {
    pub fn new(config: AppConfig) -> Self {
        Self::with_sink(config, Arc::new(TracingSink))
    }

    pub fn with_sink(config: AppConfig, sink: Arc<dyn EventSink>) -> Self {
        info!(
            repository = %config.repository.path.display(),
            output = %config.output.directory.display(),
            "initializing avatar engine"
        );
        Self { config, sink }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Unique committers of the configured repository.
    ///
    /// When `only` is non-empty, just the committers whose name or email
    /// matches one of its entries are kept.
    pub async fn committers(
        &self,
        only: &[String],
    ) -> Result<BTreeSet<CommitterIdentity>, CoreError> {
        let log = GitLog::open(&self.config.repository.path)?;
        let (committers, added) = log
            .unique_committers(self.config.fetch.identity_match, Arc::clone(&self.sink))
            .await?;
        debug!(added, "read committers");

        if only.is_empty() {
            return Ok(committers);
        }
        Ok(committers
            .into_iter()
            .filter(|c| only.iter().any(|text| c.matches_text(text)))
            .collect())
    }

    /// Fetch one avatar per committer into the configured output directory,
    /// creating the directory if needed.
    pub async fn fetch(
        &self,
        committers: BTreeSet<CommitterIdentity>,
    ) -> Result<FetchReport, CoreError> {
        let target_dir = prepare_output_dir(&self.config.output.directory)?;
        let client = GravatarClient::new(&self.config.gravatar)?;
        let orchestrator = FetchOrchestrator::with_sink(
            Arc::new(client),
            Arc::clone(&self.sink),
            self.config.fetch_options(),
        );

        let total = committers.len();
        let summary = orchestrator.run(committers, &target_dir).await?;
        Ok(FetchReport {
            committers: total,
            target_dir,
            summary,
        })
    }
}
