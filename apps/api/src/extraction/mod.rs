// Course-plan extraction: prompt building and the Gemini-backed endpoints.
// All model calls go through the gemini client, never reqwest directly.

pub mod handlers;
pub mod models;
pub mod prompts;
