/*!
 * Prompt template for cue translation.
 *
 * The template is plain text with three placeholders:
 * `{source_language}`, `{target_language}` and `{text}`. Language codes are
 * expanded to English language names before substitution.
 */

use crate::language_utils;

/// Prompt template used for every cue
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// The template string with placeholders
    template: String,
    /// English name of the source language
    source_language: String,
}

impl PromptTemplate {
    /// Create a new prompt template for a given source language code
    pub fn new(template: &str, source_language: &str) -> Self {
        Self {
            template: template.to_string(),
            source_language: language_utils::prompt_language_name(source_language),
        }
    }

    /// Render the prompt for one cue and one target language code
    pub fn render(&self, text: &str, target_language: &str) -> String {
        // {text} last so cue text containing placeholder syntax is left alone
        self.template
            .replace("{source_language}", &self.source_language)
            .replace("{target_language}", &language_utils::prompt_language_name(target_language))
            .replace("{text}", text)
    }
}
