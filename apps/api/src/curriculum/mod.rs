// Curriculum catalog: static course data served read-only.
// Loaded once at startup from the bundled JSON asset or an override file.

pub mod handlers;
pub mod models;

use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::info;

use models::{CapabilityKind, Course, CourseSummary, KnowledgeTopic};

const EMBEDDED_CATALOG: &str = include_str!("../../data/curriculum.json");

#[derive(Debug, Deserialize)]
struct CatalogFile {
    courses: Vec<Course>,
}

/// Immutable set of courses. Shared through `AppState` behind an `Arc`.
#[derive(Debug)]
pub struct Catalog {
    courses: Vec<Course>,
}

impl Catalog {
    /// Parses the catalog bundled into the binary.
    pub fn embedded() -> Result<Self> {
        Self::from_json(EMBEDDED_CATALOG).context("Embedded curriculum catalog is invalid")
    }

    /// Parses a catalog file from disk, replacing the bundled one.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read curriculum file '{}'", path.display()))?;
        Self::from_json(&raw)
            .with_context(|| format!("Curriculum file '{}' is invalid", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(raw)?;
        validate(&file.courses)?;

        let units = file.courses.iter().map(|c| c.units.len()).sum::<usize>();
        let topics = file
            .courses
            .iter()
            .flat_map(|c| &c.units)
            .flat_map(|u| &u.knowledge)
            .map(KnowledgeTopic::count)
            .sum::<usize>();
        info!(
            courses = file.courses.len(),
            units, topics, "Curriculum catalog loaded"
        );

        Ok(Self {
            courses: file.courses,
        })
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn course(&self, course_id: &str) -> Option<&Course> {
        self.courses.iter().find(|c| c.id == course_id)
    }

    pub fn summaries(&self) -> Vec<CourseSummary> {
        self.courses().iter().map(CourseSummary::from).collect()
    }
}

/// Course ids are unique, unit ids are unique within their course, and every
/// capability code carries a CB/CT/CS prefix.
fn validate(courses: &[Course]) -> Result<()> {
    let mut course_ids = HashSet::new();
    for course in courses {
        if !course_ids.insert(course.id.as_str()) {
            bail!("Duplicate course id '{}'", course.id);
        }
        let mut unit_ids = HashSet::new();
        for unit in &course.units {
            if !unit_ids.insert(unit.id.as_str()) {
                bail!("Duplicate unit id '{}' in course '{}'", unit.id, course.id);
            }
            if let Some(cap) = unit
                .capabilities
                .iter()
                .find(|c| c.kind() == CapabilityKind::Other)
            {
                bail!(
                    "Capability '{}' in unit '{}' has no CB/CT/CS prefix",
                    cap.code,
                    unit.id
                );
            }
        }
    }
    Ok(())
}
