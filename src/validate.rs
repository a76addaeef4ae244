use crate::error::QuizError;
use crate::model::{Module, Question, QuizDocument, Unit};

pub const ANSWERS_PER_QUESTION: usize = 3;

/// Depth-first walk over the tree; the first broken invariant is reported
/// with the location of the offending entity.
pub fn validate(document: &QuizDocument) -> Result<(), QuizError> {
    if document.units.is_empty() {
        return Err(QuizError::validation(
            "No unit found",
            format!("document: {}", document.name),
        ));
    }

    document.units.iter().try_for_each(validate_unit)
}

fn validate_unit(unit: &Unit) -> Result<(), QuizError> {
    if unit.modules.is_empty() {
        return Err(QuizError::validation(
            format!("No module found for UF {}", unit.display_name()),
            unit.location(),
        ));
    }

    unit.modules.iter().try_for_each(validate_module)
}

fn validate_module(module: &Module) -> Result<(), QuizError> {
    if module.questions.is_empty() {
        return Err(QuizError::validation(
            format!("No question found for module {}", module.display_name()),
            module.location(),
        ));
    }

    module.questions.iter().try_for_each(validate_question)
}

fn validate_question(question: &Question) -> Result<(), QuizError> {
    let fail = |message: String| Err(QuizError::validation(message, question.location()));

    if question.answers.len() != ANSWERS_PER_QUESTION {
        return fail(format!(
            "Expected {} answers, found {}",
            ANSWERS_PER_QUESTION,
            question.answers.len()
        ));
    }

    match question.correct_count() {
        0 => return fail("No correct answer found".to_string()),
        1 => {}
        _ => return fail("More than one correct answer found".to_string()),
    }

    // Slide 0 means the author never filled the jump in.
    match question.min_slide() {
        None => return fail("No jump to slide found".to_string()),
        Some(0) => return fail("Jump to slide 0 is not a valid slide".to_string()),
        Some(_) => {}
    }

    if let Some(position) = question
        .answers
        .iter()
        .position(|answer| answer.text.trim().is_empty())
    {
        return fail(format!("Answer {} has no text", position + 1));
    }

    Ok(())
}
