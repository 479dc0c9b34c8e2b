//! Declared file properties of a work unit.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::file_set::FileSet;
use crate::normalizer::NormalizerSelector;

/// Check applied to a property's files by the declaring layer.
///
/// Validation only signals pass or fail; the fingerprinting core never runs
/// it on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationAction {
    /// No validation.
    #[default]
    None,
    /// Any collection of files, present or not.
    InputFiles,
    /// Every root must be an existing regular file.
    InputFile,
    /// Every root must be an existing directory.
    InputDirectory,
}

impl ValidationAction {
    /// Validates `files`, returning a message describing the first problem.
    pub fn validate(self, property: &str, files: &FileSet) -> Result<(), String> {
        match self {
            ValidationAction::None | ValidationAction::InputFiles => Ok(()),
            ValidationAction::InputFile => {
                for root in files.roots() {
                    if !root.exists() {
                        return Err(format!(
                            "file '{}' specified for property '{property}' does not exist",
                            root.display()
                        ));
                    }
                    if !root.is_file() {
                        return Err(format!(
                            "file '{}' specified for property '{property}' is not a file",
                            root.display()
                        ));
                    }
                }
                Ok(())
            }
            ValidationAction::InputDirectory => {
                for root in files.roots() {
                    if !root.exists() {
                        return Err(format!(
                            "directory '{}' specified for property '{property}' does not exist",
                            root.display()
                        ));
                    }
                    if !root.is_dir() {
                        return Err(format!(
                            "directory '{}' specified for property '{property}' is not a directory",
                            root.display()
                        ));
                    }
                }
                Ok(())
            }
        }
    }
}

/// A declared file property: name, normalizer, resolved files, validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySpec {
    name: String,
    normalizer: NormalizerSelector,
    files: FileSet,
    validation: ValidationAction,
}

impl PropertySpec {
    /// Creates a property with no validation.
    pub fn new(
        name: impl Into<String>,
        normalizer: impl Into<NormalizerSelector>,
        files: FileSet,
    ) -> Self {
        Self {
            name: name.into(),
            normalizer: normalizer.into(),
            files,
            validation: ValidationAction::None,
        }
    }

    /// Creates an input-files property: absolute-path normalization with the
    /// input-files validator.
    pub fn input_files(name: impl Into<String>, files: FileSet) -> Self {
        Self::new(name, NormalizerSelector::ABSOLUTE_PATH, files)
            .with_validation(ValidationAction::InputFiles)
    }

    /// Replaces the normalizer.
    pub fn with_normalizer(mut self, normalizer: impl Into<NormalizerSelector>) -> Self {
        self.normalizer = normalizer.into();
        self
    }

    /// Replaces the validation action.
    pub fn with_validation(mut self, validation: ValidationAction) -> Self {
        self.validation = validation;
        self
    }

    /// Property name, unique within its work unit.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Normalizer selector.
    pub fn normalizer(&self) -> &NormalizerSelector {
        &self.normalizer
    }

    /// Resolved files.
    pub fn files(&self) -> &FileSet {
        &self.files
    }

    /// Validation action.
    pub fn validation(&self) -> ValidationAction {
        self.validation
    }

    /// Runs this property's validation action against its files.
    pub fn validate(&self) -> Result<(), String> {
        self.validation.validate(&self.name, &self.files)
    }
}

impl fmt::Display for PropertySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' ({})", self.name, self.normalizer)
    }
}
