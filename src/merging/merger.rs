use crate::merging::error::MergeError;
use async_trait::async_trait;
use globset::GlobBuilder;
use log::{debug, info};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::process::Command;

pub const DEFAULT_MERGE_PROGRAM: &str = "cdo";

/// Concatenates files along their time axis into a single output file.
#[async_trait]
pub trait MergeTool: Send + Sync {
    async fn merge(
        &self,
        inputs: &[PathBuf],
        output: &Path,
        overwrite: bool,
    ) -> Result<(), MergeError>;
}

/// Runs `cdo mergetime`, tolerating duplicate time steps across inputs.
#[derive(Debug, Clone)]
pub struct CdoMergeTool {
    program: String,
}

impl CdoMergeTool {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn arguments(inputs: &[PathBuf], output: &Path, overwrite: bool) -> Vec<String> {
        let mut args = Vec::with_capacity(inputs.len() + 3);
        if overwrite {
            args.push("-O".to_string());
        }
        args.push("mergetime".to_string());
        args.extend(inputs.iter().map(|p| p.to_string_lossy().into_owned()));
        args.push(output.to_string_lossy().into_owned());
        args
    }
}

impl Default for CdoMergeTool {
    fn default() -> Self {
        Self::new(DEFAULT_MERGE_PROGRAM)
    }
}

#[async_trait]
impl MergeTool for CdoMergeTool {
    async fn merge(
        &self,
        inputs: &[PathBuf],
        output: &Path,
        overwrite: bool,
    ) -> Result<(), MergeError> {
        let args = Self::arguments(inputs, output, overwrite);
        info!(">>> SKIP_SAME_TIME=1 {} {}", self.program, args.join(" "));

        let result = Command::new(&self.program)
            .args(&args)
            .env("SKIP_SAME_TIME", "1")
            .output()
            .await
            .map_err(|source| MergeError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&result.stdout);
        if !stdout.trim().is_empty() {
            debug!("{}", stdout.trim());
        }
        if !result.status.success() {
            return Err(MergeError::ToolFailed {
                program: self.program.clone(),
                status: result.status,
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    Merged { output: PathBuf, inputs: Vec<PathBuf> },
    AlreadyPresent { output: PathBuf },
}

/// Merges the per-slice files of one year into `{prefix}_{year}.nc`.
pub struct YearMerger<M: MergeTool> {
    tool: M,
}

impl<M: MergeTool> YearMerger<M> {
    pub fn new(tool: M) -> Self {
        Self { tool }
    }

    pub fn tool(&self) -> &M {
        &self.tool
    }

    /// Files in `dir` named like `*_{year}*00.nc`, sorted by name.
    ///
    /// The merged file of the same year is never part of the result.
    pub async fn collect_year_files(dir: &Path, year: i32) -> Result<Vec<PathBuf>, MergeError> {
        let pattern = format!("*_{}*00.nc", year);
        let matcher = GlobBuilder::new(&pattern)
            .literal_separator(true)
            .build()
            .map_err(|source| MergeError::Pattern {
                pattern: pattern.clone(),
                source,
            })?
            .compile_matcher();
        let merged_suffix = format!("_{}.nc", year);

        let mut entries = fs::read_dir(dir)
            .await
            .map_err(|e| MergeError::ReadDir(dir.to_path_buf(), e))?;
        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| MergeError::ReadDir(dir.to_path_buf(), e))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if matcher.is_match(&name) && !name.ends_with(&merged_suffix) {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }

    /// Name of the merged file: everything before `_{year}` in the first
    /// input's name, followed by `_{year}.nc`.
    pub fn output_name(first_input: &Path, year: i32) -> String {
        let name = first_input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let marker = format!("_{}", year);
        let prefix = name.split(&marker).next().unwrap_or_default();
        format!("{}_{}.nc", prefix, year)
    }

    pub async fn merge_year(
        &self,
        dir: &Path,
        year: i32,
        overwrite: bool,
    ) -> Result<MergeOutcome, MergeError> {
        let inputs = Self::collect_year_files(dir, year).await?;
        let Some(first) = inputs.first() else {
            return Err(MergeError::NoInputFiles {
                dir: dir.to_path_buf(),
                year,
            });
        };
        let output = dir.join(Self::output_name(first, year));

        if !overwrite {
            let exists = fs::try_exists(&output)
                .await
                .map_err(|e| MergeError::ExistenceCheck(output.clone(), e))?;
            if exists {
                info!("{} already exists, not merging", output.display());
                return Ok(MergeOutcome::AlreadyPresent { output });
            }
        }

        info!(
            "Merging {} file(s) for {} into {}",
            inputs.len(),
            year,
            output.display()
        );
        self.tool.merge(&inputs, &output, overwrite).await?;
        Ok(MergeOutcome::Merged { output, inputs })
    }

    /// Merges each year in turn, stopping at the first error.
    pub async fn merge_years(
        &self,
        dir: &Path,
        years: impl IntoIterator<Item = i32>,
        overwrite: bool,
    ) -> Result<Vec<MergeOutcome>, MergeError> {
        let mut outcomes = Vec::new();
        for year in years {
            outcomes.push(self.merge_year(dir, year, overwrite).await?);
        }
        Ok(outcomes)
    }
}
