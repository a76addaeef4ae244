use anyhow::Result;

use crate::error::QuizError;
use crate::model::QuizDocument;

mod builder;
mod classify;
mod normalize;
#[cfg(test)]
mod tests;

use builder::build;
use classify::LineClassifier;
use normalize::TextNormalizer;

/// Normalizes, classifies and folds the paragraphs of one document into a
/// tree in a single forward pass.
#[derive(Debug)]
pub struct DocumentParser {
    normalizer: TextNormalizer,
    classifier: LineClassifier,
}

impl DocumentParser {
    pub fn new(repair_accents: bool) -> Result<Self> {
        Ok(Self {
            normalizer: TextNormalizer::new(repair_accents),
            classifier: LineClassifier::new()?,
        })
    }

    pub fn parse(&self, document_name: &str, paragraphs: &[String]) -> Result<QuizDocument, QuizError> {
        let lines = paragraphs.iter().enumerate().map(|(index, raw)| {
            let line = self.normalizer.normalize(raw);
            self.classifier
                .classify(&line)
                .map_err(|unrecognized| QuizError::Recognition {
                    paragraph: index + 1,
                    reason: unrecognized.reason,
                    text: line,
                })
        });

        build(document_name, lines)
    }
}
