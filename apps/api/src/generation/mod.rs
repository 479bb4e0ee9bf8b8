// Résumé generation: prompt building, completion calls, export orchestration.
// All model calls go through llm_client; no direct HTTP calls here.

pub mod generator;
pub mod handlers;
pub mod prompts;
