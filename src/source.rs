use std::fs;
use std::path::Path;

use docx_rs::{
    DocumentChild, Paragraph, ParagraphChild, Run, RunChild, Table, TableCellContent,
    TableChild, TableRowChild,
};

use crate::error::QuizError;

pub const SUPPORTED_EXTENSIONS: [&str; 2] = ["docx", "txt"];

const UNREADABLE_HINT: &str =
    "save the document as .docx and make sure it is not open in a word processor";
const UNSUPPORTED_HINT: &str = "supported inputs are .docx and .txt";

pub fn is_supported(path: &Path) -> bool {
    extension(path).is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

pub fn document_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Body paragraphs of a document in reading order, one string each.
/// Blank paragraphs are kept so positions match the source.
pub fn read_paragraphs(path: &Path) -> Result<Vec<String>, QuizError> {
    match extension(path).as_deref() {
        Some("docx") => read_docx_paragraphs(path),
        Some("txt") => read_text_paragraphs(path),
        other => Err(unreadable(
            path,
            format!("unsupported extension {:?}", other.unwrap_or("")),
            UNSUPPORTED_HINT,
        )),
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

fn unreadable(path: &Path, diagnostic: impl Into<String>, hint: &'static str) -> QuizError {
    QuizError::InputUnreadable {
        path: path.display().to_string(),
        diagnostic: diagnostic.into(),
        hint,
    }
}

fn read_text_paragraphs(path: &Path) -> Result<Vec<String>, QuizError> {
    let bytes = fs::read(path).map_err(|err| unreadable(path, err.to_string(), UNREADABLE_HINT))?;
    let text = String::from_utf8_lossy(&bytes);

    Ok(text
        .lines()
        .map(|line| line.trim_start_matches('\u{feff}').to_string())
        .collect())
}

fn read_docx_paragraphs(path: &Path) -> Result<Vec<String>, QuizError> {
    let bytes = fs::read(path).map_err(|err| unreadable(path, err.to_string(), UNREADABLE_HINT))?;
    let docx = docx_rs::read_docx(&bytes)
        .map_err(|err| unreadable(path, format!("invalid docx: {err}"), UNREADABLE_HINT))?;

    let mut paragraphs = Vec::new();
    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(paragraph) => paragraphs.push(paragraph_text(paragraph)),
            DocumentChild::Table(table) => collect_table(table, &mut paragraphs),
            _ => {}
        }
    }

    Ok(paragraphs)
}

fn collect_table(table: &Table, paragraphs: &mut Vec<String>) {
    for row in &table.rows {
        let TableChild::TableRow(row) = row;
        for cell in &row.cells {
            let TableRowChild::TableCell(cell) = cell;
            for content in &cell.children {
                if let TableCellContent::Paragraph(paragraph) = content {
                    paragraphs.push(paragraph_text(paragraph));
                }
            }
        }
    }
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut text = String::new();
    for child in &paragraph.children {
        match child {
            ParagraphChild::Run(run) => push_run(run, &mut text),
            ParagraphChild::Hyperlink(link) => {
                for inner in &link.children {
                    if let ParagraphChild::Run(run) = inner {
                        push_run(run, &mut text);
                    }
                }
            }
            _ => {}
        }
    }
    text
}

fn push_run(run: &Run, text: &mut String) {
    for child in &run.children {
        match child {
            RunChild::Text(value) => text.push_str(&value.text),
            RunChild::Tab(_) | RunChild::Break(_) => text.push(' '),
            _ => {}
        }
    }
}
