// src/pipeline/dists.rs

//! Building the artifact for every configured runtime tag into one shared
//! output directory.

use std::path::PathBuf;

use tracing::info;

use crate::errors::{PipelineError, Result};
use crate::exec::CommandBackend;
use crate::pipeline::executor::{Executor, Invocation};
use crate::types::RuntimeTag;

impl<B: CommandBackend> Executor<B> {
    /// Clear the output directory once, then run `dist` for each tag in a
    /// fresh sub-invocation and check that every tag left its own artifact.
    ///
    /// An artifact shared by two tags (a universal wheel, say) fails with
    /// [`PipelineError::ArtifactCollision`]: the later build replaced the
    /// earlier one.
    pub(crate) async fn build_all(&mut self, inv: &mut Invocation<'_>, target: &str) -> Result<()> {
        let ctx = inv.ctx;
        let tags = self.dist_tags.clone();
        if tags.is_empty() {
            return Err(PipelineError::ConfigError(
                "no runtime tags configured for multi-runtime builds".to_string(),
            ));
        }

        self.fs.remove_all(&ctx.dist_dir)?;
        self.fs.create_dir_all(&ctx.dist_dir)?;
        info!(dir = ?ctx.dist_dir, tags = tags.len(), "cleared output directory");

        let mut built: Vec<(RuntimeTag, PathBuf)> = Vec::with_capacity(tags.len());
        for tag in tags {
            let tag_ctx = ctx.with_runtime(tag.clone());
            info!(runtime = %tag, setup_dir = ?tag_ctx.setup_dir, "building artifact");

            let sub = self.run_in(&tag_ctx, vec!["dist".to_string()]).await?;
            let label = tag.label();
            inv.report
                .executed
                .extend(sub.executed.into_iter().map(|n| format!("{n} ({label})")));
            inv.report
                .skipped
                .extend(sub.skipped.into_iter().map(|n| format!("{n} ({label})")));

            let artifact = self.find_artifact(&tag_ctx, target)?;
            if let Some((earlier, _)) = built.iter().find(|(_, p)| *p == artifact) {
                return Err(PipelineError::ArtifactCollision {
                    target: target.to_string(),
                    path: artifact,
                    earlier: earlier.label(),
                    later: label,
                });
            }
            built.push((tag, artifact));
        }

        // A later tag's build must not have replaced an earlier artifact.
        for (tag, artifact) in &built {
            if !self.fs.is_file(artifact) {
                return Err(PipelineError::ArtifactNotFound {
                    target: target.to_string(),
                    pattern: artifact.to_string_lossy().into_owned(),
                    dir: ctx.dist_dir.clone(),
                });
            }
            info!(runtime = %tag, artifact = ?artifact, "artifact present");
        }
        Ok(())
    }
}
