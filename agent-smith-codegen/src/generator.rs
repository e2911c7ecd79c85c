//! Validation-gated code generation
//!
//! Generation always re-validates the project and renders the whole file
//! set in memory. The files are written into a staging directory next to
//! the target and then moved into place. Every file the move replaces or
//! removes is parked in the staging directory first, so a failure at any
//! point restores the target directory as it was.

use crate::renderer::{CodeRenderer, FileSet, PACKAGE_DIRECTORIES, PACKAGE_FILES};
use crate::{Error, Result};
use agent_smith_core::project::Project;
use agent_smith_core::validation::{ValidationReport, Validator};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Result of a successful generation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationReport {
    pub output_directory: PathBuf,
    /// Relative paths of the written files, in order
    pub files: Vec<String>,
    /// Relative paths of earlier package files the render no longer produces
    #[serde(default)]
    pub removed: Vec<String>,
}

/// Validates projects and renders them to disk
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    validator: Validator,
    renderer: CodeRenderer,
}

impl CodeGenerator {
    /// Create a new code generator
    pub fn new() -> Result<Self> {
        Ok(Self {
            validator: Validator::new(),
            renderer: CodeRenderer::new()?,
        })
    }

    pub fn validate_configuration(&self, project: &Project) -> ValidationReport {
        let report = self.validator.validate(project);
        if report.is_ok() {
            info!("Project '{}' passed validation", project.name);
        } else {
            warn!(
                "Project '{}' has {} validation finding(s)",
                project.name,
                report.len()
            );
        }
        report
    }

    /// Render the files generation would write, without touching disk
    pub fn preview_generated_code(&self, project: &Project) -> Result<FileSet> {
        let report = self.validate_configuration(project);
        if !report.is_ok() {
            return Err(Error::Validation { report });
        }
        self.renderer.render(project)
    }

    /// Validate, render and write the package into `output_directory`
    ///
    /// The package owns its top-level generated files and every `.py`
    /// module under `agents/` and `tools/`. Owned files the render no longer
    /// produces are removed, so the package on disk matches
    /// [`CodeGenerator::preview_generated_code`]. Anything else in the
    /// directory is left alone. Either every change lands or none does.
    pub async fn generate_agent_code<P: AsRef<Path>>(
        &self,
        project: &Project,
        output_directory: P,
    ) -> Result<GenerationReport> {
        let output_directory = output_directory.as_ref().to_path_buf();
        info!(
            "Generating code for project '{}' into {}",
            project.name,
            output_directory.display()
        );

        let files = self.preview_generated_code(project)?;
        let paths: Vec<String> = files.keys().cloned().collect();

        let target = output_directory.clone();
        let removed = tokio::task::spawn_blocking(move || write_staged(&target, &files))
            .await
            .map_err(|e| {
                Error::generation(&output_directory, io::Error::new(io::ErrorKind::Other, e))
            })??;

        info!(
            "Generated {} files for project '{}' in {} ({} stale removed)",
            paths.len(),
            project.name,
            output_directory.display(),
            removed.len()
        );
        Ok(GenerationReport {
            output_directory,
            files: paths,
            removed,
        })
    }
}

/// Write every file into a sibling staging directory, then move into place
fn write_staged(output_directory: &Path, files: &FileSet) -> Result<Vec<String>> {
    let parent = match output_directory.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(|e| Error::generation(&parent, e))?;

    let staging = tempfile::Builder::new()
        .prefix(".agent-smith-")
        .tempdir_in(&parent)
        .map_err(|e| Error::generation(&parent, e))?;
    debug!("Staging generated files in {}", staging.path().display());

    let package = staging.path().join("package");
    for (relative, content) in files {
        let path = package.join(relative);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| Error::generation(dir, e))?;
        }
        fs::write(&path, content)
            .map_err(|e| Error::generation(output_directory.join(relative), e))?;
    }

    let mut commit = Commit::new(staging.path().join("previous"));
    let result = commit.apply(&package, output_directory, files);
    if result.is_err() {
        commit.rollback();
    }
    result
}

/// One reversible change to the target directory
#[derive(Debug)]
enum Step {
    CreatedDir(PathBuf),
    Placed(PathBuf),
    Replaced { destination: PathBuf, backup: PathBuf },
    Removed { path: PathBuf, backup: PathBuf },
}

/// Journal of the changes made while moving a package into place
#[derive(Debug)]
struct Commit {
    backup_root: PathBuf,
    steps: Vec<Step>,
}

impl Commit {
    fn new(backup_root: PathBuf) -> Self {
        Self {
            backup_root,
            steps: Vec::new(),
        }
    }

    /// Check every destination, then remove stale files and place new ones
    fn apply(
        &mut self,
        package: &Path,
        output_directory: &Path,
        files: &FileSet,
    ) -> Result<Vec<String>> {
        for relative in files.keys() {
            let destination = output_directory.join(relative);
            if let Some(dir) = destination.parent() {
                self.ensure_dir(dir)?;
            }
            if destination.is_dir() {
                return Err(Error::generation(
                    &destination,
                    io::Error::new(io::ErrorKind::AlreadyExists, "a directory is in the way"),
                ));
            }
        }

        let stale = stale_files(output_directory, files)?;
        for relative in &stale {
            self.remove(output_directory, relative)?;
        }
        for relative in files.keys() {
            self.place(&package.join(relative), output_directory, relative)?;
        }
        Ok(stale)
    }

    fn ensure_dir(&mut self, dir: &Path) -> Result<()> {
        match fs::metadata(dir) {
            Ok(metadata) if metadata.is_dir() => Ok(()),
            Ok(_) => Err(Error::generation(
                dir,
                io::Error::new(io::ErrorKind::AlreadyExists, "a file is in the way"),
            )),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if let Some(parent) = dir.parent().filter(|p| !p.as_os_str().is_empty()) {
                    self.ensure_dir(parent)?;
                }
                fs::create_dir(dir).map_err(|e| Error::generation(dir, e))?;
                self.steps.push(Step::CreatedDir(dir.to_path_buf()));
                Ok(())
            }
            Err(e) => Err(Error::generation(dir, e)),
        }
    }

    fn park(&self, path: &Path, relative: &str) -> Result<PathBuf> {
        let backup = self.backup_root.join(relative);
        if let Some(dir) = backup.parent() {
            fs::create_dir_all(dir).map_err(|e| Error::generation(dir, e))?;
        }
        fs::rename(path, &backup).map_err(|e| Error::generation(path, e))?;
        Ok(backup)
    }

    fn remove(&mut self, output_directory: &Path, relative: &str) -> Result<()> {
        let path = output_directory.join(relative);
        let backup = self.park(&path, relative)?;
        debug!("Removing stale {}", path.display());
        self.steps.push(Step::Removed { path, backup });
        Ok(())
    }

    fn place(&mut self, staged: &Path, output_directory: &Path, relative: &str) -> Result<()> {
        let destination = output_directory.join(relative);
        if destination.exists() {
            let backup = self.park(&destination, relative)?;
            self.steps.push(Step::Replaced {
                destination: destination.clone(),
                backup,
            });
            fs::rename(staged, &destination).map_err(|e| Error::generation(&destination, e))?;
        } else {
            fs::rename(staged, &destination).map_err(|e| Error::generation(&destination, e))?;
            self.steps.push(Step::Placed(destination));
        }
        Ok(())
    }

    /// Undo every recorded step, newest first
    fn rollback(self) {
        warn!("Rolling back {} change(s) to the package", self.steps.len());
        for step in self.steps.into_iter().rev() {
            let outcome = match &step {
                Step::Placed(path) => fs::remove_file(path),
                Step::Replaced {
                    destination,
                    backup,
                } => {
                    if destination.exists() {
                        let _ = fs::remove_file(destination);
                    }
                    fs::rename(backup, destination)
                }
                Step::Removed { path, backup } => fs::rename(backup, path),
                Step::CreatedDir(dir) => fs::remove_dir(dir),
            };
            if let Err(e) = outcome {
                warn!("Could not undo {:?}: {}", step, e);
            }
        }
    }
}

/// Package-owned files present on disk that `files` no longer contains
fn stale_files(output_directory: &Path, files: &FileSet) -> Result<Vec<String>> {
    let mut stale: Vec<String> = PACKAGE_FILES
        .iter()
        .filter(|name| !files.contains_key(**name) && output_directory.join(name).is_file())
        .map(|name| name.to_string())
        .collect();

    for dir in PACKAGE_DIRECTORIES {
        let path = output_directory.join(dir);
        if !path.is_dir() {
            continue;
        }
        let entries = fs::read_dir(&path).map_err(|e| Error::generation(&path, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| Error::generation(&path, e))?;
            let file = entry.path();
            if !file.is_file() || file.extension().map_or(true, |ext| ext != "py") {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                let relative = format!("{}/{}", dir, name);
                if !files.contains_key(&relative) {
                    stale.push(relative);
                }
            }
        }
    }

    stale.sort();
    Ok(stale)
}
