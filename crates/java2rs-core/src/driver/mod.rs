/*!
# FileDriver - directory-level translation

Collects Java sources from files and directories, runs them through one
[`Transpiler`] so cross-file references resolve, and writes a Rust module
tree: one `.rs` file per unit, a `mod.rs` per directory and a `lib.rs` at
the output root.
*/

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::naming::{escape_keyword, to_snake_case};
use crate::transpiler::{Transpiler, UnitOutcome, UnitStatus};
use crate::TranspileConfig;

/// One collected source file and where its output goes
#[derive(Debug, Clone)]
struct SourceFile {
    path: PathBuf,
    /// Module segments below the crate root, file module last
    segments: Vec<String>,
}

impl SourceFile {
    fn module_path(&self) -> String {
        let mut path = String::from("crate");
        for segment in &self.segments {
            path.push_str("::");
            path.push_str(segment);
        }
        path
    }

    fn output_file(&self, output_dir: &Path) -> PathBuf {
        let mut file = output_dir.to_path_buf();
        for segment in &self.segments {
            file.push(segment.trim_start_matches("r#"));
        }
        file.set_extension("rs");
        file
    }
}

fn module_segment(name: &str) -> String {
    escape_keyword(&to_snake_case(name))
}

/// File-based translation driver
pub struct FileDriver {
    config: TranspileConfig,
    source_extensions: Vec<String>,
    preserve_structure: bool,
}

impl FileDriver {
    pub fn new() -> Self {
        let config = TranspileConfig::default();
        Self {
            source_extensions: config.source_extensions.clone(),
            config,
            preserve_structure: true,
        }
    }

    /// Set the file extensions to process
    pub fn source_extensions(mut self, extensions: Vec<String>) -> Self {
        self.source_extensions = extensions;
        self
    }

    /// Whether to mirror the source directory layout as nested modules
    pub fn preserve_structure(mut self, preserve: bool) -> Self {
        self.preserve_structure = preserve;
        self
    }

    /// Use a translation configuration; its extensions replace the current ones
    pub fn config(mut self, config: TranspileConfig) -> Self {
        self.source_extensions = config.source_extensions.clone();
        self.config = config;
        self
    }

    /// Translate files and directories without writing anything
    pub fn transpile_paths<P: AsRef<Path>>(&self, inputs: &[P]) -> Result<Vec<UnitOutcome>> {
        let files = self.collect(inputs)?;
        self.transpile(&files)
    }

    /// Translate a directory tree into `output_dir`
    pub fn transform_directory<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        source_dir: P,
        output_dir: Q,
    ) -> Result<TransformationSummary> {
        let source_path = source_dir.as_ref();
        if !source_path.is_dir() {
            return Err(anyhow!(
                "Source directory does not exist: {}",
                source_path.display()
            ));
        }
        self.transform_paths(&[source_path], output_dir)
    }

    /// Translate a single file into `output_file`
    pub fn transform_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        source_file: P,
        output_file: Q,
    ) -> Result<TransformationSummary> {
        let source_path = source_file.as_ref();
        let output_path = output_file.as_ref();
        let files = vec![self.single(source_path)];
        let outcomes = self.transpile(&files)?;

        let mut summary = TransformationSummary::new();
        for outcome in &outcomes {
            if let Some(parent) = output_path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            fs::write(output_path, &outcome.text)
                .with_context(|| format!("writing {}", output_path.display()))?;
            summary.record(outcome);
        }
        Ok(summary)
    }

    /// Translate any mix of files and directories into one module tree
    pub fn transform_paths<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        inputs: &[P],
        output_dir: Q,
    ) -> Result<TransformationSummary> {
        let output_path = output_dir.as_ref();
        let files = self.collect(inputs)?;
        let outcomes = self.transpile(&files)?;

        fs::create_dir_all(output_path)
            .with_context(|| format!("creating {}", output_path.display()))?;
        let mut summary = TransformationSummary::new();
        let mut created = BTreeSet::new();
        // directory (as segments) -> child module names
        let mut children: BTreeMap<Vec<String>, BTreeSet<String>> = BTreeMap::new();
        children.entry(Vec::new()).or_default();

        for (file, outcome) in files.iter().zip(&outcomes) {
            let target = file.output_file(output_path);
            if let Some(parent) = target.parent() {
                if !parent.exists() && created.insert(parent.to_path_buf()) {
                    summary.directories_created += 1;
                }
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            fs::write(&target, &outcome.text)
                .with_context(|| format!("writing {}", target.display()))?;
            debug!("wrote {}", target.display());

            for depth in 0..file.segments.len() {
                children
                    .entry(file.segments[..depth].to_vec())
                    .or_default()
                    .insert(file.segments[depth].clone());
            }
            summary.record(outcome);
        }

        for (dir, modules) in &children {
            let mut text = String::new();
            for module in modules {
                text.push_str(&format!("pub mod {module};\n"));
            }
            let mut target = output_path.to_path_buf();
            for segment in dir {
                target.push(segment.trim_start_matches("r#"));
            }
            target.push(if dir.is_empty() { "lib.rs" } else { "mod.rs" });
            fs::write(&target, text).with_context(|| format!("writing {}", target.display()))?;
        }

        info!(
            "converted {} of {} file(s) into {}",
            summary.files_converted,
            summary.files_processed,
            output_path.display()
        );
        Ok(summary)
    }

    fn transpile(&self, files: &[SourceFile]) -> Result<Vec<UnitOutcome>> {
        let mut transpiler = Transpiler::new(self.config.clone())?;
        for file in files {
            let text = fs::read_to_string(&file.path)
                .with_context(|| format!("reading {}", file.path.display()))?;
            transpiler.add_unit_in(file.path.display().to_string(), file.module_path(), &text);
        }
        Ok(transpiler.run())
    }

    fn single(&self, path: &Path) -> SourceFile {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        SourceFile {
            path: path.to_path_buf(),
            segments: vec![module_segment(&stem)],
        }
    }

    /// Source files below every input, sorted for a stable unit order
    fn collect<P: AsRef<Path>>(&self, inputs: &[P]) -> Result<Vec<SourceFile>> {
        let mut files = Vec::new();
        for input in inputs {
            let input = input.as_ref();
            if input.is_dir() {
                self.collect_directory(input, input, &mut files)?;
            } else if input.is_file() {
                files.push(self.single(input));
            } else {
                return Err(anyhow!("Input does not exist: {}", input.display()));
            }
        }
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    fn collect_directory(&self, current_dir: &Path, source_root: &Path, files: &mut Vec<SourceFile>) -> Result<()> {
        let entries = fs::read_dir(current_dir)
            .with_context(|| format!("reading directory {}", current_dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.is_dir() {
                self.collect_directory(&path, source_root, files)?;
            } else if self.should_process_file(&path) {
                let mut file = self.single(&path);
                if self.preserve_structure {
                    let relative = path.strip_prefix(source_root)?;
                    let mut segments: Vec<String> = relative
                        .parent()
                        .into_iter()
                        .flat_map(|p| p.components())
                        .map(|c| module_segment(&c.as_os_str().to_string_lossy()))
                        .collect();
                    segments.append(&mut file.segments);
                    file.segments = segments;
                }
                files.push(file);
            }
        }
        Ok(())
    }

    /// Check if a file should be processed based on its extension
    fn should_process_file(&self, path: &Path) -> bool {
        if let Some(extension) = path.extension() {
            let ext_str = extension.to_string_lossy().to_lowercase();
            self.source_extensions
                .iter()
                .any(|ext| ext.to_lowercase() == ext_str)
        } else {
            false
        }
    }
}

impl Default for FileDriver {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary of a driver run
#[derive(Debug, Default, Clone, Serialize)]
pub struct TransformationSummary {
    pub files_processed: u64,
    pub files_converted: u64,
    pub files_failed: u64,
    pub directories_created: u64,
    pub errors: Vec<String>,
}

impl TransformationSummary {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, outcome: &UnitOutcome) {
        self.files_processed += 1;
        match outcome.status {
            UnitStatus::Success => self.files_converted += 1,
            UnitStatus::ParseFailure | UnitStatus::InternalFault => {
                warn!("{}: translation failed", outcome.path);
                self.files_failed += 1;
                let message = outcome
                    .diagnostics
                    .first()
                    .map(|d| d.message.clone())
                    .unwrap_or_default();
                self.errors
                    .push(format!("Error processing {}: {}", outcome.path, message));
            }
        }
    }

    pub fn success(&self) -> bool {
        self.files_failed == 0 && self.errors.is_empty()
    }
}
