use std::collections::BTreeSet;

use quick_xml::escape::partial_escape;
use serde::Serialize;

const CORRECT_ANSWER_MARKER: &str = "<input type=\"hidden\" id=\"Corretta\">\n";

#[derive(Debug, Clone, Serialize)]
pub struct QuizDocument {
    pub name: String,
    pub units: Vec<Unit>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Unit {
    pub index: usize,
    pub name: String,
    pub duration: Option<f64>,
    pub modules: Vec<Module>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Module {
    pub unit_index: usize,
    pub index: usize,
    pub name: String,
    pub duration: Option<f64>,
    /// Insertion order, as read from the document.
    pub questions: Vec<Question>,
    /// Indices into `questions`, ascending by minimum remediation slide.
    pub sort_order: Vec<usize>,
    pub clusters: Vec<QuestionCluster>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Question {
    pub unit_index: usize,
    pub module_index: usize,
    pub index: usize,
    pub global_index: usize,
    pub prompt: String,
    pub answers: Vec<Answer>,
    pub slides: BTreeSet<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub text: String,
    pub is_correct: bool,
}

/// Questions of one module whose remediation slides sit close together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionCluster {
    pub members: Vec<usize>,
    pub min_slide: u32,
    pub max_slide: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DocumentCounts {
    pub units: usize,
    pub modules: usize,
    pub questions: usize,
    pub clusters: usize,
}

impl QuizDocument {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            units: Vec::new(),
        }
    }

    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.units.iter().flat_map(|unit| unit.modules.iter())
    }

    pub fn modules_mut(&mut self) -> impl Iterator<Item = &mut Module> {
        self.units.iter_mut().flat_map(|unit| unit.modules.iter_mut())
    }

    pub fn counts(&self) -> DocumentCounts {
        DocumentCounts {
            units: self.units.len(),
            modules: self.modules().count(),
            questions: self.modules().map(|module| module.questions.len()).sum(),
            clusters: self.modules().map(|module| module.clusters.len()).sum(),
        }
    }
}

impl Unit {
    pub fn display_name(&self) -> String {
        self.name.trim().to_uppercase()
    }

    pub fn location(&self) -> String {
        format!("uf: {}", self.index + 1)
    }
}

impl Module {
    pub fn display_name(&self) -> String {
        normalize_module_name(&self.name)
    }

    pub fn location(&self) -> String {
        format!("uf: {}, module: {}", self.unit_index + 1, self.index + 1)
    }

    /// Questions in sort order; falls back to insertion order before the
    /// sort view has been computed.
    pub fn ordered_questions(&self) -> Vec<&Question> {
        if self.sort_order.len() != self.questions.len() {
            return self.questions.iter().collect();
        }

        self.sort_order
            .iter()
            .filter_map(|&index| self.questions.get(index))
            .collect()
    }
}

impl Question {
    pub fn min_slide(&self) -> Option<u32> {
        self.slides.first().copied()
    }

    pub fn max_slide(&self) -> Option<u32> {
        self.slides.last().copied()
    }

    pub fn correct_count(&self) -> usize {
        self.answers.iter().filter(|answer| answer.is_correct).count()
    }

    pub fn location(&self) -> String {
        format!(
            "uf: {}, module: {}, question: {} / global question: {}",
            self.unit_index + 1,
            self.module_index + 1,
            self.index + 1,
            self.global_index + 1
        )
    }
}

impl Answer {
    pub fn new(text: impl Into<String>, is_correct: bool) -> Self {
        Self {
            text: text.into(),
            is_correct,
        }
    }

    /// Answer text wrapped as-is, so inline markup written by the author
    /// reaches the quiz unchanged.
    pub fn html(&self) -> String {
        self.with_marker(format!("<p>{}</p>", self.text))
    }

    pub fn html_escaped(&self) -> String {
        self.with_marker(format!("<p>{}</p>", partial_escape(&self.text)))
    }

    fn with_marker(&self, html: String) -> String {
        if self.is_correct {
            format!("{CORRECT_ANSWER_MARKER}{html}")
        } else {
            html
        }
    }
}

pub fn normalize_module_name(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut base = trimmed;
    // Only a duration note is dropped; "(parte 1)" belongs to the name.
    let duration_open = trimmed
        .strip_suffix(')')
        .and_then(|inner| inner.rfind('(').map(|open| (inner, open)))
        .filter(|(inner, open)| is_duration_note(&inner[open + 1..]))
        .map(|(_, open)| open);
    if let Some(open) = duration_open {
        base = trimmed[..open].trim_end();
    }
    if base.is_empty() {
        base = trimmed;
    }

    base.replace('/', " and ")
        .split_whitespace()
        .map(capitalize_word)
        .collect::<Vec<String>>()
        .join(" ")
}

fn is_duration_note(note: &str) -> bool {
    let note = note.trim().to_lowercase();
    let number_end = note
        .find(|ch: char| !(ch.is_ascii_digit() || ch == '.' || ch == ','))
        .unwrap_or(note.len());
    let (number, unit) = note.split_at(number_end);

    number.replace(',', ".").parse::<f64>().is_ok()
        && matches!(unit.trim(), "" | "h" | "ore" | "hours")
}

fn capitalize_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConvertRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub output_dir: String,
    pub document_count: usize,
    pub failed_count: usize,
    pub documents: Vec<DocumentOutcome>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentOutcome {
    pub source: String,
    pub document_name: String,
    pub sha256: Option<String>,
    pub status: String,
    pub error_kind: Option<String>,
    pub error: Option<String>,
    pub counts: Option<DocumentCounts>,
    pub artifacts: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_name_drops_parenthetical_suffix_and_capitalizes() {
        assert_eq!(
            normalize_module_name("cavi/CONNETTORI   di rete (8 ore)"),
            "Cavi And Connettori Di Rete"
        );
        assert_eq!(normalize_module_name("Cabling"), "Cabling");
        assert_eq!(normalize_module_name("(intro)"), "(intro)");
        assert_eq!(normalize_module_name("Cabling (12,5 h)"), "Cabling");
    }

    #[test]
    fn module_name_keeps_parentheticals_that_are_not_durations() {
        assert_eq!(
            normalize_module_name("Sicurezza (parte 1)"),
            "Sicurezza (parte 1)"
        );
        assert_eq!(normalize_module_name("Reti (LAN)"), "Reti (lan)");
    }

    #[test]
    fn correct_answer_html_carries_hidden_marker() {
        let answer = Answer::new("a < b", true);
        assert_eq!(
            answer.html_escaped(),
            "<input type=\"hidden\" id=\"Corretta\">\n<p>a &lt; b</p>"
        );
        assert_eq!(Answer::new("x", false).html_escaped(), "<p>x</p>");
        assert_eq!(
            answer.html(),
            "<input type=\"hidden\" id=\"Corretta\">\n<p>a < b</p>"
        );
    }

    #[test]
    fn question_location_is_one_based() {
        let question = Question {
            unit_index: 0,
            module_index: 2,
            index: 4,
            global_index: 11,
            prompt: "Why?".to_string(),
            answers: Vec::new(),
            slides: BTreeSet::from([7, 3]),
        };

        assert_eq!(
            question.location(),
            "uf: 1, module: 3, question: 5 / global question: 12"
        );
        assert_eq!(question.min_slide(), Some(3));
        assert_eq!(question.max_slide(), Some(7));
    }
}
