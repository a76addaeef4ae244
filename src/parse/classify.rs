use std::collections::BTreeSet;

use anyhow::{Context, Result};
use regex::{Captures, Regex};

use crate::model::Answer;

#[derive(Debug, Clone, PartialEq)]
pub enum LineEvent {
    UnitHeader {
        name: String,
        duration: Option<f64>,
    },
    ModuleHeader {
        name: String,
        duration: Option<f64>,
    },
    QuestionLine {
        prompt: String,
        slides: BTreeSet<u32>,
    },
    JumpAnnotation {
        slides: BTreeSet<u32>,
    },
    AnswerLine {
        answers: Vec<Answer>,
    },
    CombinedQuestionAnswer {
        prompt: String,
        slides: BTreeSet<u32>,
        answers: Vec<Answer>,
    },
    Ignorable,
}

/// Why a non-blank line could not be classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unrecognized {
    pub reason: &'static str,
}

impl Unrecognized {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

#[derive(Debug)]
pub struct LineClassifier {
    unit_keyword: Regex,
    module_keyword: Regex,
    header_body: Regex,
    jump_annotation: Regex,
    legacy_question: Regex,
    legacy_answer: Regex,
    question_clause: Regex,
    answer_triple: Regex,
    lettered_answer: Regex,
    correct_marker: Regex,
    digits: Regex,
}

impl LineClassifier {
    pub fn new() -> Result<Self> {
        Ok(Self {
            unit_keyword: Regex::new(r"(?i)^(?:uf|unit[àa]\s+formativa)(?P<body>[^\p{L}].*)?$")
                .context("failed to compile unit keyword regex")?,
            module_keyword: Regex::new(r"(?i)^(?:modulo|module)(?P<body>[^\p{L}].*)?$")
                .context("failed to compile module keyword regex")?,
            header_body: Regex::new(
                r"(?i)^(?:\s*[.:\-]?\s*\d+\s*[.:\-])?\s*[.:\-]?\s*(?P<name>.*?)\s*(?:\(\s*(?P<duration>\d+(?:[.,]\d+)?)\s*(?:h|ore|hours)?\s*\))?$",
            )
            .context("failed to compile header body regex")?,
            jump_annotation: Regex::new(
                r"(?i)^[*\s]*slides?\s*[:.]?\s*(?P<numbers>\d[\d\s,;/\-]*?)[\s*.]*$",
            )
            .context("failed to compile jump annotation regex")?,
            legacy_question: Regex::new(r"(?i)^domanda\s*(?:\d+\s*)?[:.\-]\s*(?P<body>.*)$")
                .context("failed to compile legacy question regex")?,
            legacy_answer: Regex::new(r"(?i)^risposta\b(?P<marker>[^-]*)-\s*(?P<text>.*)$")
                .context("failed to compile legacy answer regex")?,
            question_clause: Regex::new(
                r"(?i)[(\[*]*\s*\bslides?\s*[:.]?\s*(?P<numbers>\d+(?:\s*[-,/]\s*\d+|\s+\d+)*)\s*[)\]*]*",
            )
            .context("failed to compile question clause regex")?,
            answer_triple: Regex::new(
                r"(?i)^a\s*(?:[.)]|[:\-]\s)\s*(?P<a>.+?)\s+b\s*(?:[.)]|[:\-]\s)\s*(?P<b>.+?)\s+c\s*(?:[.)]|[:\-]\s)\s*(?P<c>.+?)$",
            )
            .context("failed to compile answer triple regex")?,
            lettered_answer: Regex::new(r"(?i)^[a-c]\s*[.):\-]\s+(?P<text>.+)$")
                .context("failed to compile lettered answer regex")?,
            correct_marker: Regex::new(r"(?i)^ok(?:\s*-\s*|\s+|$)(?P<text>.*)$")
                .context("failed to compile correctness marker regex")?,
            digits: Regex::new(r"\d+").context("failed to compile digit run regex")?,
        })
    }

    /// Classifies one normalized paragraph. Matchers run in priority order
    /// and the first one that recognizes the line wins.
    pub fn classify(&self, line: &str) -> Result<LineEvent, Unrecognized> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(LineEvent::Ignorable);
        }

        if let Some(event) = self.match_unit_header(line)? {
            return Ok(event);
        }
        if let Some(event) = self.match_module_header(line)? {
            return Ok(event);
        }
        if let Some(event) = self.match_jump_annotation(line)? {
            return Ok(event);
        }
        if let Some(event) = self.match_legacy_question(line)? {
            return Ok(event);
        }
        if let Some(event) = self.match_legacy_answer(line) {
            return Ok(event);
        }
        if let Some(event) = self.match_question(line)? {
            return Ok(event);
        }
        if let Some(answers) = self.match_answer_triple(line) {
            return Ok(LineEvent::AnswerLine { answers });
        }
        if let Some(event) = self.match_lettered_answer(line) {
            return Ok(event);
        }

        Err(Unrecognized::new(
            "line is neither a header, a question nor an answer",
        ))
    }

    fn match_unit_header(&self, line: &str) -> Result<Option<LineEvent>, Unrecognized> {
        let Some(captures) = self.unit_keyword.captures(line) else {
            return Ok(None);
        };

        let (name, duration) = self
            .parse_header_body(&captures)
            .ok_or(Unrecognized::new("unit header without a name"))?;
        Ok(Some(LineEvent::UnitHeader { name, duration }))
    }

    fn match_module_header(&self, line: &str) -> Result<Option<LineEvent>, Unrecognized> {
        let Some(captures) = self.module_keyword.captures(line) else {
            return Ok(None);
        };

        let (name, duration) = self
            .parse_header_body(&captures)
            .ok_or(Unrecognized::new("module header without a name"))?;
        Ok(Some(LineEvent::ModuleHeader { name, duration }))
    }

    fn parse_header_body(&self, keyword: &Captures<'_>) -> Option<(String, Option<f64>)> {
        let body = keyword.name("body").map(|m| m.as_str()).unwrap_or("");
        let captures = self.header_body.captures(body)?;

        let name = captures
            .name("name")
            .map(|m| m.as_str().trim())
            .filter(|name| name.chars().any(char::is_alphanumeric))?
            .to_string();
        let duration = captures
            .name("duration")
            .and_then(|m| m.as_str().replace(',', ".").parse::<f64>().ok());

        Some((name, duration))
    }

    fn match_jump_annotation(&self, line: &str) -> Result<Option<LineEvent>, Unrecognized> {
        let Some(captures) = self.jump_annotation.captures(line) else {
            return Ok(None);
        };

        let numbers = captures.name("numbers").map(|m| m.as_str()).unwrap_or("");
        let slides = self.parse_slides(numbers)?;
        Ok(Some(LineEvent::JumpAnnotation { slides }))
    }

    fn match_legacy_question(&self, line: &str) -> Result<Option<LineEvent>, Unrecognized> {
        let Some(captures) = self.legacy_question.captures(line) else {
            return Ok(None);
        };

        let body = captures.name("body").map(|m| m.as_str().trim()).unwrap_or("");
        if body.is_empty() {
            return Err(Unrecognized::new("question keyword without a prompt"));
        }

        if let Some(event) = self.match_question(body)? {
            return Ok(Some(event));
        }

        // Older documents put the slide on its own line after the answers.
        Ok(Some(LineEvent::QuestionLine {
            prompt: body.to_string(),
            slides: BTreeSet::new(),
        }))
    }

    fn match_legacy_answer(&self, line: &str) -> Option<LineEvent> {
        let captures = self.legacy_answer.captures(line)?;
        let marker = captures.name("marker").map(|m| m.as_str()).unwrap_or("");
        let text = captures.name("text").map(|m| m.as_str().trim()).unwrap_or("");

        Some(LineEvent::AnswerLine {
            answers: vec![Answer::new(
                text,
                marker.to_ascii_lowercase().contains("ok"),
            )],
        })
    }

    fn match_question(&self, line: &str) -> Result<Option<LineEvent>, Unrecognized> {
        for clause in self.question_clause.captures_iter(line) {
            let Some(whole) = clause.get(0) else {
                continue;
            };

            let prompt = line[..whole.start()]
                .trim_end_matches(|ch: char| ch.is_whitespace() || matches!(ch, '-' | ',' | ';'))
                .trim_start();
            if prompt.is_empty() {
                continue;
            }

            let rest = line[whole.end()..].trim();
            let numbers = clause.name("numbers").map(|m| m.as_str()).unwrap_or("");

            // Closing punctuation after the clause still ends the question.
            let only_punctuation = rest
                .chars()
                .all(|ch| ch.is_whitespace() || matches!(ch, '.' | ';' | ':' | ',' | ')' | ']' | '*'));
            if only_punctuation {
                return Ok(Some(LineEvent::QuestionLine {
                    prompt: prompt.to_string(),
                    slides: self.parse_slides(numbers)?,
                }));
            }

            let answers_part = rest
                .trim_start_matches(|ch: char| matches!(ch, '-' | '.' | ':' | ';'))
                .trim_start();
            if let Some(answers) = self.match_answer_triple(answers_part) {
                return Ok(Some(LineEvent::CombinedQuestionAnswer {
                    prompt: prompt.to_string(),
                    slides: self.parse_slides(numbers)?,
                    answers,
                }));
            }
        }

        Ok(None)
    }

    fn match_answer_triple(&self, text: &str) -> Option<Vec<Answer>> {
        let captures = self.answer_triple.captures(text.trim())?;

        ["a", "b", "c"]
            .iter()
            .map(|group| captures.name(group).map(|m| self.parse_answer(m.as_str())))
            .collect()
    }

    fn match_lettered_answer(&self, line: &str) -> Option<LineEvent> {
        let captures = self.lettered_answer.captures(line)?;
        let text = captures.name("text")?.as_str();

        Some(LineEvent::AnswerLine {
            answers: vec![self.parse_answer(text)],
        })
    }

    fn parse_answer(&self, segment: &str) -> Answer {
        let segment = segment.trim();
        match self.correct_marker.captures(segment) {
            Some(captures) => {
                let text = captures.name("text").map(|m| m.as_str().trim()).unwrap_or("");
                Answer::new(text, true)
            }
            None => Answer::new(segment, false),
        }
    }

    fn parse_slides(&self, numbers: &str) -> Result<BTreeSet<u32>, Unrecognized> {
        let mut slides = BTreeSet::new();
        for digits in self.digits.find_iter(numbers) {
            let slide = digits
                .as_str()
                .parse::<u32>()
                .map_err(|_| Unrecognized::new("slide number out of range"))?;
            slides.insert(slide);
        }

        if slides.is_empty() {
            return Err(Unrecognized::new("jump to slide without a slide number"));
        }

        Ok(slides)
    }
}
