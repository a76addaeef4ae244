use crate::model::{Module, Question, QuizDocument, Unit};

pub const DEFAULT_TO_DIVIDE: usize = 5;

const SEPARATOR: &str = "    ----------------------------------------";

#[derive(Debug, Clone, Copy)]
pub struct ReportOptions {
    /// Walk each module's sort-order view instead of insertion order.
    pub ordered: bool,
    pub separated: bool,
    /// Questions between separators when no cluster boundaries apply.
    pub to_divide: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            ordered: false,
            separated: false,
            to_divide: DEFAULT_TO_DIVIDE,
        }
    }
}

pub fn render_report(document: &QuizDocument, options: ReportOptions) -> String {
    let mut lines = vec![format!(
        "DOCUMENT {} - units: {}",
        document.name,
        document.units.len()
    )];

    for unit in &document.units {
        lines.push(String::new());
        render_unit(unit, options, &mut lines);
    }

    let mut report = lines.join("\n");
    report.push('\n');
    report
}

fn render_unit(unit: &Unit, options: ReportOptions, lines: &mut Vec<String>) {
    lines.push(format!(
        "UF {}: {}{} - modules: {}",
        unit.index + 1,
        unit.display_name(),
        format_duration(unit.duration),
        unit.modules.len()
    ));

    for module in &unit.modules {
        render_module(module, options, lines);
    }
}

fn render_module(module: &Module, options: ReportOptions, lines: &mut Vec<String>) {
    lines.push(format!(
        "  MODULE {}: {}{} - questions: {}",
        module.index + 1,
        module.display_name(),
        format_duration(module.duration),
        module.questions.len()
    ));

    if options.separated && options.ordered && !module.clusters.is_empty() {
        for cluster in &module.clusters {
            lines.push(format!(
                "    ---- slides {}-{} ({} questions) ----",
                cluster.min_slide,
                cluster.max_slide,
                cluster.members.len()
            ));
            for question in cluster
                .members
                .iter()
                .filter_map(|&index| module.questions.get(index))
            {
                render_question(question, lines);
            }
        }
        return;
    }

    let questions = if options.ordered {
        module.ordered_questions()
    } else {
        module.questions.iter().collect()
    };

    for (position, question) in questions.iter().enumerate() {
        render_question(question, lines);

        let written = position + 1;
        if options.separated
            && options.to_divide > 0
            && written % options.to_divide == 0
            && written < questions.len()
        {
            lines.push(SEPARATOR.to_string());
        }
    }
}

fn render_question(question: &Question, lines: &mut Vec<String>) {
    lines.push(format!(
        "    QUESTION {} (global {}): {}",
        question.index + 1,
        question.global_index + 1,
        question.prompt
    ));

    for (letter, answer) in ('a'..='z').zip(&question.answers) {
        let marker = if answer.is_correct { " [OK]" } else { "" };
        lines.push(format!("      {letter}) {}{marker}", answer.text));
    }

    if let Some(slide) = question.min_slide() {
        lines.push(format!("      jump to slide: {slide}"));
    }
    if question.slides.len() > 1 {
        let all = question
            .slides
            .iter()
            .map(u32::to_string)
            .collect::<Vec<String>>()
            .join(", ");
        lines.push(format!("      slides: {all}"));
    }
}

fn format_duration(duration: Option<f64>) -> String {
    match duration {
        Some(hours) if hours.fract() == 0.0 => format!(" - {hours:.0} h"),
        Some(hours) => format!(" - {hours} h"),
        None => String::new(),
    }
}
