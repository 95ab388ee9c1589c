//! Skill catalog
//!
//! Skills are named, reusable snippets stored one JSON file per skill. The
//! reasoning loop only advertises their names to the model.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Default catalog directory, relative to the working directory
pub const DEFAULT_SKILLS_DIR: &str = ".skills";

/// A stored skill
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub description: String,
    pub code: String,
}

/// Directory-backed skill store
#[derive(Debug, Clone)]
pub struct SkillCatalog {
    dir: PathBuf,
}

impl SkillCatalog {
    /// Open a catalog, creating the directory if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create skills directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    /// Lowercased, spaces to underscores
    fn path_for(&self, name: &str) -> PathBuf {
        self.dir
            .join(format!("{}.json", name.to_lowercase().replace(' ', "_")))
    }

    /// Write a skill, replacing any skill that maps to the same file
    #[allow(dead_code)]
    pub fn save(&self, name: &str, description: &str, code: &str) -> Result<PathBuf> {
        let skill = Skill {
            name: name.to_string(),
            description: description.to_string(),
            code: code.to_string(),
        };
        let path = self.path_for(name);
        let content = serde_json::to_string_pretty(&skill)?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write skill {}", path.display()))?;

        debug!(skill = %name, path = %path.display(), "Saved skill");
        Ok(path)
    }

    /// Look up a skill by name. `Ok(None)` if it does not exist.
    #[allow(dead_code)]
    pub fn get(&self, name: &str) -> Result<Option<Skill>> {
        let path = self.path_for(name);
        if !path.exists() {
            return Ok(None);
        }
        read_skill(&path).map(Some)
    }

    /// All readable skills, sorted by file name
    pub fn list(&self) -> Result<Vec<Skill>> {
        let mut paths: Vec<PathBuf> = fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read skills directory {}", self.dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut skills = Vec::with_capacity(paths.len());
        for path in paths {
            match read_skill(&path) {
                Ok(skill) => skills.push(skill),
                Err(e) => warn!(path = %path.display(), error = %format!("{:#}", e), "Skipping unreadable skill"),
            }
        }
        Ok(skills)
    }

    /// Skill names for prompt context. Empty if the catalog cannot be read.
    pub fn names(&self) -> Vec<String> {
        match self.list() {
            Ok(skills) => skills.into_iter().map(|s| s.name).collect(),
            Err(e) => {
                warn!(error = %format!("{:#}", e), "Failed to list skills");
                Vec::new()
            }
        }
    }
}

fn read_skill(path: &Path) -> Result<Skill> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid skill file {}", path.display()))
}
