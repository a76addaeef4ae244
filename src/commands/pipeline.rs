use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::cli::PipelineArgs;
use crate::cluster::{ClusterConfig, cluster_document};
use crate::error::QuizError;
use crate::model::QuizDocument;
use crate::parse::DocumentParser;
use crate::source::{document_name, is_supported, read_paragraphs};
use crate::validate::validate;

/// Read, parse, validate and (optionally) cluster one document.
#[derive(Debug)]
pub struct DocumentPipeline {
    parser: DocumentParser,
    clustering: Option<ClusterConfig>,
}

impl DocumentPipeline {
    pub fn new(args: &PipelineArgs, clustering: bool) -> Result<Self> {
        Ok(Self {
            parser: DocumentParser::new(!args.no_accent_repair)?,
            clustering: clustering.then(|| args.cluster_config()),
        })
    }

    pub fn run(&self, path: &Path) -> Result<QuizDocument, QuizError> {
        let name = document_name(path);
        let paragraphs = read_paragraphs(path)?;
        debug!(path = %path.display(), paragraphs = paragraphs.len(), "read document");

        let mut document = self.parser.parse(&name, &paragraphs)?;
        validate(&document)?;

        if let Some(config) = self.clustering {
            cluster_document(&mut document, config)?;
        }

        Ok(document)
    }
}

/// Expands directories (non-recursively) into their supported documents.
/// Files named explicitly are kept whatever their extension, so an
/// unsupported one is reported per document instead of silently skipped.
pub fn discover_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut documents = Vec::new();

    for input in inputs {
        if !input.is_dir() {
            documents.push(input.clone());
            continue;
        }

        let mut found = Vec::new();
        let entries =
            fs::read_dir(input).with_context(|| format!("failed to read {}", input.display()))?;
        for entry in entries {
            let entry =
                entry.with_context(|| format!("failed to read entry in {}", input.display()))?;
            let path = entry.path();

            if !entry
                .file_type()
                .with_context(|| format!("failed to inspect file type: {}", path.display()))?
                .is_file()
            {
                continue;
            }

            // Word keeps `~$name.docx` lock files next to open documents.
            let is_lock_file = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("~$"));

            if is_supported(&path) && !is_lock_file {
                found.push(path);
            }
        }

        found.sort();
        documents.extend(found);
    }

    if documents.is_empty() {
        bail!("no .docx or .txt documents found in the given inputs");
    }

    Ok(documents)
}
