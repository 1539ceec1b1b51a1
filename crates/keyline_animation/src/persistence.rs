//! Loading and saving step animations
//!
//! Animations are stored per assembly step. The engine only talks to an
//! [`AnimationRepository`]; the bundled [`FileRepository`] keeps one JSON
//! document per step under `<root>/<assembly_id>/<step_id>.json`.

use crate::document::StepAnimation;
use crate::error::RepositoryError;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Identifies the animation of one step of one assembly
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StepKey {
    pub assembly_id: String,
    pub step_id: String,
}

impl StepKey {
    /// Create a key; both parts must be usable as single path components
    pub fn new(assembly_id: impl Into<String>, step_id: impl Into<String>) -> Result<Self> {
        let key = Self {
            assembly_id: assembly_id.into(),
            step_id: step_id.into(),
        };
        validate_component(&key.assembly_id)?;
        validate_component(&key.step_id)?;
        Ok(key)
    }
}

impl fmt::Display for StepKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.assembly_id, self.step_id)
    }
}

fn validate_component(part: &str) -> Result<()> {
    let bad = part.is_empty()
        || part.starts_with('.')
        || part.contains(['/', '\\', '\0'])
        || part.trim() != part;
    if bad {
        return Err(RepositoryError::InvalidKey(part.to_string()));
    }
    Ok(())
}

/// Storage backend for step animations
pub trait AnimationRepository {
    /// Load a step's animation; `Ok(None)` when the step has none yet
    fn load(&self, key: &StepKey) -> Result<Option<StepAnimation>>;

    /// Store a step's animation, replacing any previous one
    fn save(&mut self, key: &StepKey, animation: &StepAnimation) -> Result<()>;

    /// Remove a step's animation; returns whether one existed
    fn delete(&mut self, key: &StepKey) -> Result<bool>;
}

/// JSON files on disk
#[derive(Clone, Debug)]
pub struct FileRepository {
    root: PathBuf,
}

impl FileRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File holding the animation of `key`
    pub fn path_for(&self, key: &StepKey) -> PathBuf {
        self.root
            .join(&key.assembly_id)
            .join(format!("{}.json", key.step_id))
    }

    /// Step ids with a stored animation for one assembly, sorted
    pub fn list_steps(&self, assembly_id: &str) -> Result<Vec<String>> {
        validate_component(assembly_id)?;
        let dir = self.root.join(assembly_id);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&dir, e)),
        };

        let mut steps = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| io_error(&dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                steps.push(stem.to_string());
            }
        }
        steps.sort();
        Ok(steps)
    }
}

impl AnimationRepository for FileRepository {
    fn load(&self, key: &StepKey) -> Result<Option<StepAnimation>> {
        let path = self.path_for(key);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("no animation stored for {}", key);
                return Ok(None);
            }
            Err(e) => return Err(io_error(&path, e)),
        };
        let animation = StepAnimation::from_json(&text)?;
        tracing::debug!("loaded animation for {} from {}", key, path.display());
        Ok(Some(animation))
    }

    fn save(&mut self, key: &StepKey, animation: &StepAnimation) -> Result<()> {
        let path = self.path_for(key);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;
        }

        // Write beside the target and rename so readers never see half a file
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, animation.to_json()?).map_err(|e| io_error(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| io_error(&path, e))?;

        tracing::debug!("saved animation for {} to {}", key, path.display());
        Ok(())
    }

    fn delete(&mut self, key: &StepKey) -> Result<bool> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(&path, e)),
        }
    }
}

fn io_error(path: &Path, source: std::io::Error) -> RepositoryError {
    RepositoryError::Io {
        path: path.to_path_buf(),
        source,
    }
}
