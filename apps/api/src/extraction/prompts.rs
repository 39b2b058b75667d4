// LLM prompt templates for the course-plan extraction endpoints.
// Reuses cross-cutting fragments from gemini::prompts.

use crate::extraction::models::UnitDescriptor;
use crate::gemini::prompts::{FAITHFUL_EXTRACTION_INSTRUCTION, JSON_ONLY_INSTRUCTION};

/// Course metadata extraction. Replace: {known_units}, {faithful}, {json_only}
pub const COURSE_PROMPT_TEMPLATE: &str = r#"The attached PDF is a vocational course plan (Plano de Curso).
Extract the course-level information and the list of curricular units (Unidades Curriculares, UCs).

Return a JSON object with this EXACT schema (no extra fields):
{
  "nome": "Técnico em Desenvolvimento de Sistemas",
  "cargaHorariaTotal": 1200,
  "eixoTecnologico": "Informação e Comunicação",
  "competenciaGeral": "Full general competency text of the course",
  "unidadesCurriculares": [
    {"nome": "Lógica de Programação", "cargaHoraria": 120, "modulo": "Módulo Básico"}
  ]
}

Rules:
- "cargaHorariaTotal" and "cargaHoraria" are numbers of hours, without units.
- List the units in the order they appear in the document's curriculum matrix.
- The following units are ALREADY KNOWN. Do NOT include them in "unidadesCurriculares":
{known_units}

{faithful}

{json_only}"#;

/// Capability extraction. Replace: {units}, {faithful}, {json_only}
pub const CAPABILITIES_PROMPT_TEMPLATE: &str = r#"The attached PDF is a vocational course plan (Plano de Curso).
For EACH curricular unit listed below, extract its capabilities (capacidades) from the document.

UNITS:
{units}

Return a JSON object with this EXACT schema (no extra fields):
{
  "unidades": [
    {
      "nome": "Lógica de Programação",
      "capacidades": [
        {"codigo": "CB1", "tipo": "basica", "descricao": "Capability text"},
        {"codigo": "CT1", "tipo": "tecnica", "descricao": "Capability text"},
        {"codigo": "CS1", "tipo": "socioemocional", "descricao": "Capability text"}
      ]
    }
  ]
}

Rules:
- "nome" must be the unit name exactly as given in the UNITS list above.
- Classify each capability: basic capabilities (capacidades básicas) get "CB",
  technical capabilities (capacidades técnicas) get "CT",
  socio-emotional capabilities (capacidades socioemocionais) get "CS".
- Number codes sequentially per type within each unit, starting at 1: CB1, CB2, ..., CT1, CT2, ..., CS1, ...
- Include one entry per unit in the list, in the same order, even when no capabilities are found (use an empty array).

{faithful}

{json_only}"#;

/// Knowledge-topic extraction. Replace: {units}, {faithful}, {json_only}
pub const KNOWLEDGE_PROMPT_TEMPLATE: &str = r#"The attached PDF is a vocational course plan (Plano de Curso).
For EACH curricular unit listed below, extract its knowledge topics (conhecimentos) from the document,
preserving the document's hierarchical numbering.

UNITS:
{units}

Return a JSON object with this EXACT schema (no extra fields):
{
  "unidades": [
    {
      "nome": "Banco de Dados",
      "conhecimentos": [
        {
          "codigo": "7",
          "titulo": "Linguagem SQL",
          "subtopicos": [
            {"codigo": "7.1", "titulo": "DDL", "subtopicos": []},
            {
              "codigo": "7.2",
              "titulo": "DML",
              "subtopicos": [
                {"codigo": "7.2.1", "titulo": "Consultas", "subtopicos": []}
              ]
            }
          ]
        }
      ]
    }
  ]
}

Rules:
- "nome" must be the unit name exactly as given in the UNITS list above.
- Keep the numbering ("codigo") exactly as printed in the document; nest each topic under its parent.
- Topics can nest to any depth. Use an empty "subtopicos" array for leaves.
- Include one entry per unit in the list, in the same order, even when no topics are found (use an empty array).

{faithful}

{json_only}"#;

fn render_units(units: &[UnitDescriptor]) -> String {
    units
        .iter()
        .map(|u| format!("- {}", u.label()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn fill_shared(template: &str) -> String {
    template
        .replace("{faithful}", FAITHFUL_EXTRACTION_INSTRUCTION)
        .replace("{json_only}", JSON_ONLY_INSTRUCTION)
}

pub fn course_prompt(known_units: &[UnitDescriptor]) -> String {
    let known = if known_units.is_empty() {
        "(none)".to_string()
    } else {
        render_units(known_units)
    };
    fill_shared(&COURSE_PROMPT_TEMPLATE.replace("{known_units}", &known))
}

pub fn capabilities_prompt(units: &[UnitDescriptor]) -> String {
    fill_shared(&CAPABILITIES_PROMPT_TEMPLATE.replace("{units}", &render_units(units)))
}

pub fn knowledge_prompt(units: &[UnitDescriptor]) -> String {
    fill_shared(&KNOWLEDGE_PROMPT_TEMPLATE.replace("{units}", &render_units(units)))
}
