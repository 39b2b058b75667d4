use serde::{Deserialize, Serialize};

/// A vocational course and its ordered curricular units.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub name: String,
    pub total_hours: u32,
    /// Technological axis / area, e.g. "Informação e Comunicação".
    pub technological_axis: String,
    pub general_competency: String,
    pub units: Vec<CurricularUnit>,
}

/// Unidade Curricular (UC).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurricularUnit {
    pub id: String,
    pub name: String,
    pub hours: u32,
    /// Module or period label, e.g. "Módulo Básico".
    pub module: String,
    pub capabilities: Vec<Capability>,
    #[serde(default)]
    pub knowledge: Vec<KnowledgeTopic>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capability {
    /// "CB1", "CT3", "CS2", ...
    pub code: String,
    pub description: String,
}

/// Capability taxonomy, taken from the code prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityKind {
    Basic,
    Technical,
    SocioEmotional,
    Other,
}

impl Capability {
    pub fn kind(&self) -> CapabilityKind {
        let prefix: String = self.code.chars().take(2).collect();
        match prefix.to_ascii_uppercase().as_str() {
            "CB" => CapabilityKind::Basic,
            "CT" => CapabilityKind::Technical,
            "CS" => CapabilityKind::SocioEmotional,
            _ => CapabilityKind::Other,
        }
    }
}

/// A knowledge topic; sub-topics nest to any depth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeTopic {
    /// Hierarchical numbering, e.g. "7.2.1".
    pub code: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtopics: Vec<KnowledgeTopic>,
}

impl KnowledgeTopic {
    /// Levels in this tree, counting the topic itself.
    pub fn depth(&self) -> usize {
        1 + self.subtopics.iter().map(Self::depth).max().unwrap_or(0)
    }

    /// Topics in this tree, counting the topic itself.
    pub fn count(&self) -> usize {
        1 + self.subtopics.iter().map(Self::count).sum::<usize>()
    }
}

impl Course {
    pub fn unit(&self, unit_id: &str) -> Option<&CurricularUnit> {
        self.units.iter().find(|u| u.id == unit_id)
    }
}

/// List view of a course, without the unit bodies.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    pub id: String,
    pub name: String,
    pub total_hours: u32,
    pub technological_axis: String,
    pub unit_count: usize,
    /// Deepest knowledge-topic nesting across all units.
    pub knowledge_depth: usize,
}

impl From<&Course> for CourseSummary {
    fn from(course: &Course) -> Self {
        Self {
            id: course.id.clone(),
            name: course.name.clone(),
            total_hours: course.total_hours,
            technological_axis: course.technological_axis.clone(),
            unit_count: course.units.len(),
            knowledge_depth: course
                .units
                .iter()
                .flat_map(|u| &u.knowledge)
                .map(KnowledgeTopic::depth)
                .max()
                .unwrap_or(0),
        }
    }
}
