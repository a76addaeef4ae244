use std::collections::BTreeSet;

use tracing::debug;

use super::classify::LineEvent;
use crate::error::QuizError;
use crate::model::{Answer, Module, Question, QuizDocument, Unit};

/// Cursors and counters threaded through the single pass over a document.
#[derive(Debug, Default)]
struct ParserState {
    current_unit: Option<usize>,
    current_module: Option<usize>,
    current_question: Option<usize>,
    unit_count: usize,
    module_count: usize,
    question_count: usize,
    global_question_count: usize,
}

/// Folds classified lines into a document tree, attaching each entity to
/// the most recently opened parent.
#[derive(Debug)]
pub struct HierarchyBuilder {
    document: QuizDocument,
    state: ParserState,
}

impl HierarchyBuilder {
    pub fn new(document_name: impl Into<String>) -> Self {
        Self {
            document: QuizDocument::new(document_name),
            state: ParserState::default(),
        }
    }

    /// `paragraph` is the 1-based source paragraph, used in error messages.
    pub fn apply(&mut self, paragraph: usize, event: LineEvent) -> Result<(), QuizError> {
        match event {
            LineEvent::Ignorable => Ok(()),
            LineEvent::UnitHeader { name, duration } => {
                self.open_unit(name, duration);
                Ok(())
            }
            LineEvent::ModuleHeader { name, duration } => {
                self.open_module(paragraph, name, duration)
            }
            LineEvent::QuestionLine { prompt, slides } => {
                self.open_question(paragraph, prompt, slides)
            }
            LineEvent::JumpAnnotation { slides } => self.attach_slides(paragraph, slides),
            LineEvent::AnswerLine { answers } => self.attach_answers(paragraph, answers),
            LineEvent::CombinedQuestionAnswer {
                prompt,
                slides,
                answers,
            } => {
                self.open_question(paragraph, prompt, slides)?;
                self.attach_answers(paragraph, answers)?;
                self.state.current_question = None;
                Ok(())
            }
        }
    }

    /// Closes the pass and computes each module's sort-order view.
    pub fn finish(mut self) -> Result<QuizDocument, QuizError> {
        for module in self.document.modules_mut() {
            build_sort_order(module)?;
        }

        debug!(
            document = %self.document.name,
            units = self.state.unit_count,
            questions = self.state.global_question_count,
            "document tree built"
        );

        Ok(self.document)
    }

    fn open_unit(&mut self, name: String, duration: Option<f64>) {
        let index = self.state.unit_count;
        self.document.units.push(Unit {
            index,
            name,
            duration,
            modules: Vec::new(),
        });

        self.state.current_unit = Some(index);
        self.state.current_module = None;
        self.state.current_question = None;
        self.state.unit_count += 1;
        self.state.module_count = 0;
        self.state.question_count = 0;
    }

    fn open_module(
        &mut self,
        paragraph: usize,
        name: String,
        duration: Option<f64>,
    ) -> Result<(), QuizError> {
        let unit_index = self
            .state
            .current_unit
            .ok_or_else(|| QuizError::structural(paragraph, "Found module without unit"))?;
        let unit = &mut self.document.units[unit_index];

        let index = self.state.module_count;
        unit.modules.push(Module {
            unit_index,
            index,
            name,
            duration,
            questions: Vec::new(),
            sort_order: Vec::new(),
            clusters: Vec::new(),
        });

        self.state.current_module = Some(index);
        self.state.current_question = None;
        self.state.module_count += 1;
        self.state.question_count = 0;
        Ok(())
    }

    fn open_question(
        &mut self,
        paragraph: usize,
        prompt: String,
        slides: BTreeSet<u32>,
    ) -> Result<(), QuizError> {
        let (unit_index, module_index) = match (self.state.current_unit, self.state.current_module)
        {
            (Some(unit), Some(module)) => (unit, module),
            _ => {
                return Err(QuizError::structural(
                    paragraph,
                    "Found question without module",
                ));
            }
        };
        let module = &mut self.document.units[unit_index].modules[module_index];

        let index = self.state.question_count;
        module.questions.push(Question {
            unit_index,
            module_index,
            index,
            global_index: self.state.global_question_count,
            prompt,
            answers: Vec::new(),
            slides,
        });

        self.state.current_question = Some(index);
        self.state.question_count += 1;
        self.state.global_question_count += 1;
        Ok(())
    }

    fn attach_answers(&mut self, paragraph: usize, answers: Vec<Answer>) -> Result<(), QuizError> {
        let question = self
            .current_question_mut()
            .ok_or_else(|| QuizError::structural(paragraph, "Found answer without question"))?;
        question.answers.extend(answers);
        Ok(())
    }

    fn attach_slides(&mut self, paragraph: usize, slides: BTreeSet<u32>) -> Result<(), QuizError> {
        let question = self.current_question_mut().ok_or_else(|| {
            QuizError::structural(paragraph, "Found jump to slide without question")
        })?;

        if !question.slides.is_empty() {
            return Err(QuizError::structural(
                paragraph,
                format!(
                    "Found a second jump to slide for the same question [{}]",
                    question.location()
                ),
            ));
        }

        question.slides = slides;
        Ok(())
    }

    fn current_question_mut(&mut self) -> Option<&mut Question> {
        let unit = self.state.current_unit?;
        let module = self.state.current_module?;
        let question = self.state.current_question?;

        self.document
            .units
            .get_mut(unit)?
            .modules
            .get_mut(module)?
            .questions
            .get_mut(question)
    }
}

/// Builds a whole document from a stream of classified lines, one item per
/// source paragraph. The first classification failure ends the pass.
pub fn build<I>(document_name: impl Into<String>, lines: I) -> Result<QuizDocument, QuizError>
where
    I: IntoIterator<Item = Result<LineEvent, QuizError>>,
{
    let mut builder = HierarchyBuilder::new(document_name);
    for (index, line) in lines.into_iter().enumerate() {
        builder.apply(index + 1, line?)?;
    }
    builder.finish()
}

fn build_sort_order(module: &mut Module) -> Result<(), QuizError> {
    let mut keyed = Vec::with_capacity(module.questions.len());
    for (position, question) in module.questions.iter().enumerate() {
        let min_slide = question.min_slide().ok_or_else(|| {
            QuizError::validation("No jump to slide found", question.location())
        })?;
        keyed.push((min_slide, position));
    }

    keyed.sort_by_key(|&(min_slide, position)| (min_slide, position));
    module.sort_order = keyed.into_iter().map(|(_, position)| position).collect();
    Ok(())
}
