//! Diagnosis note template: the ordered section headings and the prompt sent
//! to the generation service.
//!
//! The default headings follow the Uzbek clinical note layout: complaints,
//! history, examination, test results, conclusion with ICD-10 code,
//! recommendations, and a signature placeholder.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Default section headings, in document order.
pub fn default_section_labels() -> Vec<String> {
    [
        "Shikoyatlar",
        "Anamnez",
        "Ko'rik natijalari",
        "Tahlil natijalari",
        "Xulosa (MKB-10 kodi bilan)",
        "Tavsiyalar",
        "Terapevt imzo joyi",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Ordered section layout of a generated diagnosis note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteTemplate {
    sections: Vec<String>,
}

impl Default for NoteTemplate {
    fn default() -> Self {
        Self {
            sections: default_section_labels(),
        }
    }
}

impl NoteTemplate {
    /// Creates a template from custom section headings. Falls back to the
    /// default layout when the list is empty.
    pub fn new(sections: Vec<String>) -> Self {
        if sections.is_empty() {
            return Self::default();
        }
        Self { sections }
    }

    pub fn section_labels(&self) -> &[String] {
        &self.sections
    }

    /// Builds the generation prompt for a symptom description.
    ///
    /// Mirrors the clinical instruction format: the transcript is quoted as
    /// the symptom source and the service is asked to answer with every
    /// section heading in order.
    pub fn prompt_for(&self, source_text: &str) -> String {
        let mut prompt = String::from(
            "Ushbu simptom tavsifiga asoslanib, o'zbek tilida tibbiy yozuv yarating. \
             Javobni quyidagi bo'limlarda tuzish:\n\n",
        );
        prompt.push_str(&format!("Simptomlar: \"{source_text}\"\n\n"));
        prompt.push_str("Quyidagi formatda javob bering:\n");
        for section in &self.sections {
            prompt.push_str(&format!("\n**{section}:**\n[...]\n"));
        }
        prompt
    }

    /// Checks that every section heading appears in the text, in template
    /// order.
    pub fn contains_all_sections(&self, text: &str) -> bool {
        let pattern = self
            .sections
            .iter()
            .map(|s| regex::escape(s))
            .collect::<Vec<_>>()
            .join(".*");
        // Escaped literals joined with `.*` always form a valid pattern.
        let re = Regex::new(&format!("(?s){pattern}")).expect("section pattern is valid");
        re.is_match(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document_with_all_sections() -> String {
        default_section_labels()
            .iter()
            .map(|s| format!("**{s}:**\nmatn\n"))
            .collect()
    }

    #[test]
    fn prompt_includes_source_and_every_section() {
        let template = NoteTemplate::default();
        let prompt = template.prompt_for("yurak og'rig'i");
        assert!(prompt.contains("yurak og'rig'i"));
        for section in template.section_labels() {
            assert!(prompt.contains(section.as_str()), "missing {section}");
        }
    }

    #[test]
    fn ordered_sections_match() {
        let template = NoteTemplate::default();
        assert!(template.contains_all_sections(&document_with_all_sections()));
    }

    #[test]
    fn out_of_order_sections_do_not_match() {
        let template = NoteTemplate::default();
        let mut reversed: Vec<String> = default_section_labels();
        reversed.reverse();
        let text: String = reversed.iter().map(|s| format!("**{s}:**\n")).collect();
        assert!(!template.contains_all_sections(&text));
    }

    #[test]
    fn empty_custom_sections_fall_back_to_default() {
        let template = NoteTemplate::new(Vec::new());
        assert_eq!(template.section_labels().len(), 7);
    }
}
