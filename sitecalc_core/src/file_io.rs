//! # Project File I/O
//!
//! Saves and loads single-calculation project files as JSON:
//!
//! - **Atomic saves**: write to a `.tmp` sibling, fsync, rename.
//! - **Version validation**: the schema version is checked on load.
//! - **Tolerant parsing**: unknown fields are ignored and missing model
//!   fields take their defaults, so files survive schema evolution in
//!   both directions within a major version.
//!
//! The file is a flat JSON object: the schema version, the stable kind
//! code, the project identity, and the model fields side by side.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::params::{CalculationParams, ParameterModel, ProjectId};
use crate::registry::CalculationKind;

/// Current project file schema version.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// On-disk shape of a project file.
#[derive(Debug, Serialize, Deserialize)]
struct ProjectFile {
    schema_version: String,
    kind: CalculationKind,
    id: ProjectId,
    display_name: String,
    #[serde(flatten)]
    params: CalculationParams,
}

/// Save a parameter model with atomic write semantics.
///
/// The write goes to a `.tmp` sibling first and is renamed over the
/// target only after a successful fsync, so an interrupted save never
/// corrupts an existing file.
pub fn save_model(model: &ParameterModel, path: &Path) -> CalcResult<()> {
    let record = ProjectFile {
        schema_version: SCHEMA_VERSION.to_string(),
        kind: model.kind,
        id: model.id,
        display_name: model.display_name.clone(),
        params: model.params.clone(),
    };

    let json = serde_json::to_string_pretty(&record).map_err(|e| {
        CalcError::SerializationError {
            reason: e.to_string(),
        }
    })?;

    let tmp_path = tmp_path_for(path);
    let mut tmp_file = File::create(&tmp_path).map_err(|e| {
        CalcError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;
    tmp_file.write_all(json.as_bytes()).map_err(|e| {
        CalcError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;
    tmp_file.sync_all().map_err(|e| {
        CalcError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        CalcError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    tracing::debug!(path = %path.display(), "project saved");
    Ok(())
}

/// Load a parameter model from a project file.
pub fn load_model(path: &Path) -> CalcResult<ParameterModel> {
    let mut file = File::open(path).map_err(|e| {
        CalcError::file_error("open", path.display().to_string(), e.to_string())
    })?;
    let mut contents = String::new();
    file.read_to_string(&mut contents).map_err(|e| {
        CalcError::file_error("read", path.display().to_string(), e.to_string())
    })?;

    let record: ProjectFile =
        serde_json::from_str(&contents).map_err(|e| CalcError::SerializationError {
            reason: format!("Invalid JSON in {}: {}", path.display(), e),
        })?;

    validate_version(&record.schema_version)?;

    if record.kind != record.params.kind() {
        return Err(CalcError::SerializationError {
            reason: format!(
                "kind code {} does not match the stored parameters in {}",
                record.kind.code(),
                path.display()
            ),
        });
    }

    Ok(ParameterModel {
        kind: record.kind,
        id: record.id,
        dirty: false,
        display_name: record.display_name,
        params: record.params,
    })
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".tmp");
    PathBuf::from(os)
}

/// Validate that a file version is compatible with the current schema.
fn validate_version(file_version: &str) -> CalcResult<()> {
    let file_parts: Vec<u32> = file_version
        .split('.')
        .filter_map(|p| p.parse().ok())
        .collect();
    let current_parts: Vec<u32> = SCHEMA_VERSION
        .split('.')
        .filter_map(|p| p.parse().ok())
        .collect();

    if file_parts.is_empty() || current_parts.is_empty() {
        return Err(CalcError::VersionMismatch {
            file_version: file_version.to_string(),
            expected_version: SCHEMA_VERSION.to_string(),
        });
    }

    // Major version must match
    if file_parts[0] != current_parts[0] {
        return Err(CalcError::VersionMismatch {
            file_version: file_version.to_string(),
            expected_version: SCHEMA_VERSION.to_string(),
        });
    }

    Ok(())
}
