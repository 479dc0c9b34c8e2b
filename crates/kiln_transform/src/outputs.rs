//! Ownership checks for the outputs a transform reports.

use std::path::{Path, PathBuf};

use crate::error::{InvalidOutputReason, TransformError};

/// Checks that every reported output exists and belongs to the execution.
///
/// An output is accepted when it is the primary input itself, lies under the
/// primary input, or lies under `output_dir`. Paths are compared after
/// resolving symlinks and `..` components.
pub fn validate_outputs(
    transform: &str,
    primary_input: &Path,
    output_dir: Option<&Path>,
    outputs: &[PathBuf],
) -> Result<(), TransformError> {
    let input_root = canonical_or_raw(primary_input);
    let output_root = output_dir.map(canonical_or_raw);

    for output in outputs {
        let invalid = |reason| TransformError::InvalidOutput {
            transform: transform.to_string(),
            path: output.clone(),
            reason,
        };

        if !output.is_absolute() {
            return Err(invalid(InvalidOutputReason::NotAbsolute));
        }
        let resolved = output
            .canonicalize()
            .map_err(|_| invalid(InvalidOutputReason::Missing))?;

        let owned = resolved.starts_with(&input_root)
            || output_root
                .as_ref()
                .is_some_and(|root| resolved.starts_with(root));
        if !owned {
            return Err(invalid(InvalidOutputReason::OutsideAllowedRoots));
        }
    }
    Ok(())
}

fn canonical_or_raw(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
