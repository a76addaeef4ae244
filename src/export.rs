mod quiz_xml;
mod report;

pub use quiz_xml::{TextMarkup, inspect_quiz_xml, module_xml_filename, render_module_xml};
pub use report::{DEFAULT_TO_DIVIDE, ReportOptions, render_report};
