//! Session-aware generation service

use crate::generator::{CodeGenerator, GenerationReport};
use crate::renderer::FileSet;
use crate::Result;
use agent_smith_core::naming::module_name;
use agent_smith_core::project::Project;
use agent_smith_core::validation::ValidationReport;
use agent_smith_storage::StorageManager;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Runs validation and generation against stored sessions
///
/// Each call takes a snapshot of the session's project under the session
/// lock and renders it after the lock is released.
pub struct GenerationService {
    storage: Arc<StorageManager>,
    generator: CodeGenerator,
}

impl GenerationService {
    /// Create a new generation service
    pub fn new(storage: Arc<StorageManager>) -> Result<Self> {
        Ok(Self {
            storage,
            generator: CodeGenerator::new()?,
        })
    }

    pub fn generator(&self) -> &CodeGenerator {
        &self.generator
    }

    pub async fn validate_session(&self, session_id: &str) -> Result<ValidationReport> {
        let project = self.snapshot(session_id).await?;
        Ok(self.generator.validate_configuration(&project))
    }

    pub async fn preview_session(&self, session_id: &str) -> Result<FileSet> {
        let project = self.snapshot(session_id).await?;
        self.generator.preview_generated_code(&project)
    }

    /// Generate the session's package
    ///
    /// `output_directory` overrides the project's build context; see
    /// [`GenerationService::resolve_output_directory`].
    pub async fn generate_session(
        &self,
        session_id: &str,
        output_directory: Option<&Path>,
    ) -> Result<GenerationReport> {
        let project = self.snapshot(session_id).await?;
        let target = self.resolve_output_directory(&project, output_directory);
        info!(
            "Generating session {} into {}",
            session_id,
            target.display()
        );
        self.generator.generate_agent_code(&project, target).await
    }

    /// Pick the output directory for a project
    ///
    /// An explicit directory wins. Otherwise the build context's directory
    /// is used, relative paths being joined onto the configured base
    /// directory. Failing both, the package lands in
    /// `<output_base_dir>/<project module name>`.
    pub fn resolve_output_directory(&self, project: &Project, explicit: Option<&Path>) -> PathBuf {
        let base = &self.storage.settings().output_base_dir;
        if let Some(explicit) = explicit {
            return explicit.to_path_buf();
        }
        match project.build_context.output_directory.as_deref() {
            Some(dir) if Path::new(dir).is_absolute() => PathBuf::from(dir),
            Some(dir) => base.join(dir),
            None => base.join(module_name(&project.name)),
        }
    }

    async fn snapshot(&self, session_id: &str) -> Result<Project> {
        Ok(self.storage.merger().get_full_config(session_id).await?)
    }
}
