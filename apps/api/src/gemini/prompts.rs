// Shared prompt fragments for calls that go through the Gemini client.
// Task-specific templates live next to the handlers that use them.

/// Instruction appended to every extraction prompt. The request already asks
/// for `application/json`, this keeps the model from wrapping it in prose.
pub const JSON_ONLY_INSTRUCTION: &str = "\
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction shared by all extraction prompts over course plan PDFs.
pub const FAITHFUL_EXTRACTION_INSTRUCTION: &str = "\
    CRITICAL: Copy text exactly as it appears in the document, in Portuguese, \
    keeping the original accents and wording. Do NOT translate, summarize, \
    paraphrase or invent content. If a field is not present in the document, \
    use null (or an empty array for lists).";
