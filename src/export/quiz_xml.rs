use std::io::Cursor;

use anyhow::{Context, Result};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::model::{Answer, Module, Question};

const CATEGORY_ROOT: &str = "$course$/top";
const DEFAULT_GRADE: &str = "1.0";
const PENALTY: &str = "0.3333333";

type XmlWriter = Writer<Cursor<Vec<u8>>>;

/// How prompt and answer text are placed inside their CDATA sections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextMarkup {
    /// `<`, `>` and `&` are escaped, so the text shows up literally.
    #[default]
    Escaped,
    /// Text is kept as written, so inline HTML in the document is rendered.
    Raw,
}

pub fn module_xml_filename(module: &Module) -> String {
    format!("uf-{}_module-{}.xml", module.unit_index + 1, module.index + 1)
}

/// Serializes one module as an importable multiple-choice quiz: a category
/// record followed by one question record per question, in insertion order.
pub fn render_module_xml(module: &Module, markup: TextMarkup) -> Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .context("failed to write xml declaration")?;

    open(&mut writer, "quiz", &[])?;
    write_category(&mut writer, module)
        .with_context(|| format!("failed to write category for {}", module.location()))?;
    for (position, question) in module.questions.iter().enumerate() {
        write_question(&mut writer, position + 1, question, markup)
            .with_context(|| format!("failed to write question [{}]", question.location()))?;
    }
    close(&mut writer, "quiz")?;

    let mut bytes = writer.into_inner().into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

fn write_category(writer: &mut XmlWriter, module: &Module) -> Result<()> {
    let name = module.display_name();

    open(writer, "question", &[("type", "category")])?;
    write_text_element(
        writer,
        "category",
        &[],
        &format!("{CATEGORY_ROOT}/{name}"),
    )?;
    write_cdata_element(
        writer,
        "info",
        &[("format", "html")],
        &format!("<p>Domande per il modulo <span>{name}</span></p>"),
    )?;
    write_empty(writer, "idnumber")?;
    close(writer, "question")
}

fn write_question(
    writer: &mut XmlWriter,
    number: usize,
    question: &Question,
    markup: TextMarkup,
) -> Result<()> {
    let prompt = match markup {
        TextMarkup::Escaped => quick_xml::escape::partial_escape(&question.prompt),
        TextMarkup::Raw => question.prompt.as_str().into(),
    };

    open(writer, "question", &[("type", "multichoice")])?;

    write_text_element(writer, "name", &[], &format!("Domanda {number}"))?;
    write_cdata_element(
        writer,
        "questiontext",
        &[("format", "html")],
        &format!("<p>{prompt}</p>"),
    )?;
    open(writer, "generalfeedback", &[("format", "html")])?;
    write_empty(writer, "text")?;
    close(writer, "generalfeedback")?;

    write_value(writer, "defaultgrade", DEFAULT_GRADE)?;
    write_value(writer, "penalty", PENALTY)?;
    write_value(writer, "hidden", "0")?;
    write_empty(writer, "idnumber")?;
    write_value(writer, "single", "true")?;
    write_value(writer, "shuffleanswers", "true")?;
    write_value(writer, "answernumbering", "abc")?;
    write_text_element(
        writer,
        "correctfeedback",
        &[("format", "html")],
        "Risposta corretta.",
    )?;
    write_text_element(
        writer,
        "partiallycorrectfeedback",
        &[],
        "Risposta parzialmente corretta.",
    )?;
    write_text_element(writer, "incorrectfeedback", &[], "Risposta errata.")?;
    write_empty(writer, "shownumcorrect")?;

    for answer in &question.answers {
        write_answer(writer, answer, markup)?;
    }

    close(writer, "question")
}

fn write_answer(writer: &mut XmlWriter, answer: &Answer, markup: TextMarkup) -> Result<()> {
    let fraction = if answer.is_correct { "100" } else { "0" };
    let feedback = if answer.is_correct {
        "<p>Risposta Esatta</p>"
    } else {
        "<p>Risposta Errata</p>"
    };

    open(writer, "answer", &[("format", "html"), ("fraction", fraction)])?;
    let html = match markup {
        TextMarkup::Escaped => answer.html_escaped(),
        TextMarkup::Raw => answer.html(),
    };
    write_cdata(writer, &html)?;
    write_cdata_element(writer, "feedback", &[("format", "html")], feedback)?;
    close(writer, "answer")
}

fn open(writer: &mut XmlWriter, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
    let start = BytesStart::new(name).with_attributes(attributes.iter().copied());
    writer
        .write_event(Event::Start(start))
        .with_context(|| format!("failed to open <{name}>"))?;
    Ok(())
}

fn close(writer: &mut XmlWriter, name: &str) -> Result<()> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .with_context(|| format!("failed to close <{name}>"))?;
    Ok(())
}

fn write_empty(writer: &mut XmlWriter, name: &str) -> Result<()> {
    writer
        .write_event(Event::Empty(BytesStart::new(name)))
        .with_context(|| format!("failed to write <{name}/>"))?;
    Ok(())
}

fn write_value(writer: &mut XmlWriter, name: &str, value: &str) -> Result<()> {
    open(writer, name, &[])?;
    writer
        .write_event(Event::Text(BytesText::new(value)))
        .with_context(|| format!("failed to write <{name}> value"))?;
    close(writer, name)
}

// <name attrs><text>escaped text</text></name>
fn write_text_element(
    writer: &mut XmlWriter,
    name: &str,
    attributes: &[(&str, &str)],
    text: &str,
) -> Result<()> {
    open(writer, name, attributes)?;
    write_value(writer, "text", text)?;
    close(writer, name)
}

// <name attrs><text><![CDATA[html]]></text></name>
fn write_cdata_element(
    writer: &mut XmlWriter,
    name: &str,
    attributes: &[(&str, &str)],
    html: &str,
) -> Result<()> {
    open(writer, name, attributes)?;
    write_cdata(writer, html)?;
    close(writer, name)
}

fn write_cdata(writer: &mut XmlWriter, html: &str) -> Result<()> {
    // A CDATA section cannot contain its own terminator.
    let safe = html.replace("]]>", "]]&gt;");

    open(writer, "text", &[])?;
    writer
        .write_event(Event::CData(BytesCData::new(safe.as_str())))
        .context("failed to write CDATA section")?;
    close(writer, "text")
}

/// Shape of a generated quiz file, read back from its bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizXmlSummary {
    pub category_count: usize,
    pub question_names: Vec<String>,
    /// Answer fractions per multichoice question, in document order.
    pub answer_fractions: Vec<Vec<String>>,
}

pub fn inspect_quiz_xml(bytes: &[u8]) -> Result<QuizXmlSummary> {
    let mut reader = Reader::from_reader(bytes);
    let mut summary = QuizXmlSummary::default();
    let mut buf = Vec::new();
    let mut in_multichoice = false;
    let mut in_name = false;
    let mut in_name_text = false;

    loop {
        match reader
            .read_event_into(&mut buf)
            .context("generated quiz xml is not well formed")?
        {
            Event::Start(element) => match element.name().as_ref() {
                b"question" => {
                    let kind = element
                        .try_get_attribute("type")
                        .context("invalid question attributes")?
                        .map(|attribute| attribute.unescape_value().map(|value| value.into_owned()))
                        .transpose()
                        .context("invalid question type attribute")?
                        .unwrap_or_default();

                    in_multichoice = kind == "multichoice";
                    if kind == "category" {
                        summary.category_count += 1;
                    } else if in_multichoice {
                        summary.answer_fractions.push(Vec::new());
                    }
                }
                b"name" if in_multichoice => in_name = true,
                b"text" if in_name => in_name_text = true,
                b"answer" if in_multichoice => {
                    let fraction = element
                        .try_get_attribute("fraction")
                        .context("invalid answer attributes")?
                        .map(|attribute| attribute.unescape_value().map(|value| value.into_owned()))
                        .transpose()
                        .context("invalid answer fraction attribute")?
                        .unwrap_or_default();
                    if let Some(fractions) = summary.answer_fractions.last_mut() {
                        fractions.push(fraction);
                    }
                }
                _ => {}
            },
            Event::Text(text) if in_name_text => {
                let value = text.unescape().context("invalid question name text")?;
                summary.question_names.push(value.trim().to_string());
            }
            Event::End(element) => match element.name().as_ref() {
                b"question" => in_multichoice = false,
                b"name" => in_name = false,
                b"text" => in_name_text = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(summary)
}
