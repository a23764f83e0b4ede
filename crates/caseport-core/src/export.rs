//! Test case import XML writer

use crate::markup::{MarkupConverter, MarkupNote};
use crate::models::{TestCase, TestScript};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fmt::Display;

pub const DEFAULT_MODEL_VERSION: &str = "1.0";

const EXPORT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Serialize `test_cases` into one import document
pub fn export_test_cases(
    test_cases: &[TestCase],
    date: DateTime<Utc>,
    model_version: &str,
    converter: &MarkupConverter,
) -> Result<String> {
    let mut out = XmlOut::new();

    out.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    out.start("project")?;
    out.text_element("modelVersion", model_version)?;
    out.text_element("exportDate", &date.format(EXPORT_DATE_FORMAT).to_string())?;

    out.start("testCases")?;
    for test_case in test_cases {
        write_test_case(&mut out, test_case, converter)?;
    }
    out.end("testCases")?;
    out.end("project")?;

    out.finish()
}

fn write_test_case(out: &mut XmlOut, test_case: &TestCase, converter: &MarkupConverter) -> Result<()> {
    let mut notes = Notes::default();

    out.start("testCase")?;
    out.cdata_element("name", converter.literal(test_case.name.as_deref()))?;
    out.cdata_element("objective", converter.literal(test_case.objective.as_deref()))?;
    out.cdata_element("precondition", converter.literal(test_case.precondition.as_deref()))?;
    out.cdata_element("status", converter.literal(test_case.status.as_deref()))?;
    out.cdata_element("priority", converter.literal(test_case.priority.as_deref()))?;

    if !test_case.labels.is_empty() {
        out.start("labels")?;
        for label in &test_case.labels {
            out.cdata_element("label", converter.literal(Some(label)))?;
        }
        out.end("labels")?;
    }

    out.cdata_element("owner", converter.literal(test_case.owner.as_deref()))?;
    out.cdata_element("component", converter.literal(test_case.component.as_deref()))?;

    if !test_case.issues.is_empty() {
        out.start("issues")?;
        for key in &test_case.issues {
            out.start("issue")?;
            out.text_element("key", key)?;
            out.end("issue")?;
        }
        out.end("issues")?;
    }

    match &test_case.script {
        TestScript::Plain { details } => {
            out.start_with("testScript", &[("type", "plain")])?;
            out.cdata_element("details", notes.take(converter, Some(details)))?;
            out.end("testScript")?;
        }
        TestScript::Steps { steps } => {
            out.start_with("testScript", &[("type", "steps")])?;
            out.start("steps")?;
            for step in steps {
                out.start_with("step", &[("index", step.index.to_string().as_str())])?;
                out.cdata_element("description", notes.take(converter, step.description.as_deref()))?;
                out.cdata_element("testData", notes.take(converter, step.test_data.as_deref()))?;
                out.cdata_element(
                    "expectedResult",
                    notes.take(converter, step.expected_result.as_deref()),
                )?;
                out.end("step")?;
            }
            out.end("steps")?;
            out.end("testScript")?;
        }
    }

    if !test_case.custom_fields.is_empty() {
        out.start("customFields")?;
        for field in &test_case.custom_fields {
            out.start_with(
                "customField",
                &[("name", field.name.as_str()), ("type", field.field_type.as_str())],
            )?;
            out.cdata_element("value", converter.literal(Some(&field.value)))?;
            out.end("customField")?;
        }
        out.end("customFields")?;
    }

    out.end("testCase")?;

    notes.report(test_case.name.as_deref().unwrap_or_default());
    Ok(())
}

/// Markup notes raised while writing one test case
#[derive(Default)]
struct Notes(Vec<MarkupNote>);

impl Notes {
    fn take(&mut self, converter: &MarkupConverter, text: Option<&str>) -> Option<String> {
        let converted = converter.convert(text);
        for note in converted.notes {
            if !self.0.contains(&note) {
                self.0.push(note);
            }
        }
        converted.text
    }

    fn report(&self, name: &str) {
        if self.0.is_empty() {
            return;
        }
        let notes: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        tracing::info!("Converting test case: {} ({})", name, notes.join(" "));
    }
}

struct XmlOut {
    writer: Writer<Vec<u8>>,
}

impl XmlOut {
    fn new() -> Self {
        Self {
            writer: Writer::new_with_indent(Vec::new(), b' ', 2),
        }
    }

    fn event(&mut self, event: Event<'_>) -> Result<()> {
        self.writer.write_event(event).map_err(write_error)
    }

    fn start(&mut self, name: &str) -> Result<()> {
        self.event(Event::Start(BytesStart::new(name)))
    }

    fn start_with(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
        let mut start = BytesStart::new(name);
        for attribute in attributes {
            start.push_attribute(*attribute);
        }
        self.event(Event::Start(start))
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn text_element(&mut self, name: &str, text: &str) -> Result<()> {
        self.start(name)?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    /// Element with CDATA content; omitted when `text` is absent
    fn cdata_element(&mut self, name: &str, text: Option<String>) -> Result<()> {
        let Some(text) = text else {
            return Ok(());
        };

        self.start(name)?;
        for section in cdata_sections(&text) {
            self.event(Event::CData(BytesCData::new(section)))?;
        }
        self.end(name)
    }

    fn finish(self) -> Result<String> {
        let mut bytes = self.writer.into_inner();
        bytes.push(b'\n');
        String::from_utf8(bytes).map_err(write_error)
    }
}

fn write_error(err: impl Display) -> Error {
    Error::Xml(format!("Failed to write export: {}", err))
}

/// Split text so no section contains `]]>`.
///
/// `a]]>b` becomes `a]]` and `>b`, written as two adjacent CDATA sections.
fn cdata_sections(text: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let mut rest = text;
    while let Some(pos) = rest.find("]]>") {
        sections.push(&rest[..pos + 2]);
        rest = &rest[pos + 2..];
    }
    sections.push(rest);
    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CustomField, CustomFieldType};
    use chrono::TimeZone;

    fn date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 9, 7, 1).unwrap()
    }

    fn export(test_cases: &[TestCase], convert_wiki_markup: bool) -> String {
        export_test_cases(
            test_cases,
            date(),
            DEFAULT_MODEL_VERSION,
            &MarkupConverter::new(convert_wiki_markup),
        )
        .unwrap()
    }

    #[test]
    fn test_header() {
        let xml = export(&[], false);
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains("<modelVersion>1.0</modelVersion>"));
        assert!(xml.contains("<exportDate>2024-03-05 09:07:01 UTC</exportDate>"));
        assert!(xml.contains("<testCases>"));
        assert!(xml.trim_end().ends_with("</project>"));
    }

    #[test]
    fn test_absent_elements_omitted() {
        let test_case = TestCase::new(Some("Bare".to_string()), Vec::new());
        let xml = export(&[test_case], false);

        assert!(xml.contains("<name><![CDATA[Bare]]></name>"));
        for element in ["<objective", "<precondition", "<labels", "<owner", "<issues", "<customFields"] {
            assert!(!xml.contains(element), "{} should be omitted", element);
        }
        assert!(xml.contains(r#"<testScript type="steps">"#));
    }

    #[test]
    fn test_steps_and_fields() {
        let mut test_case = TestCase::new(
            Some("Login works".to_string()),
            vec![CustomField::new(
                "Original issue key",
                "TEST-1",
                CustomFieldType::SingleLineText,
            )],
        );
        test_case.labels = vec!["smoke".to_string()];
        test_case.issues.insert("TEST-2".to_string());
        test_case.add_step(Some("Open app".to_string()), None, Some("App opens".to_string()));

        let xml = export(&[test_case], false);
        assert!(xml.contains("<label><![CDATA[smoke]]></label>"));
        assert!(xml.contains("<key>TEST-2</key>"));
        assert!(xml.contains(r#"<step index="0">"#));
        assert!(xml.contains("<description><![CDATA[Open app]]></description>"));
        assert!(!xml.contains("<testData"));
        assert!(xml.contains("<expectedResult><![CDATA[App opens]]></expectedResult>"));
        assert!(xml.contains(r#"<customField name="Original issue key" type="SINGLE_LINE_TEXT">"#));
        assert!(xml.contains("<value><![CDATA[TEST-1]]></value>"));
    }

    #[test]
    fn test_plain_script() {
        let mut test_case = TestCase::new(Some("Case".to_string()), Vec::new());
        test_case.set_plain_script("Do *everything*".to_string());

        let xml = export(&[test_case], true);
        assert!(xml.contains(r#"<testScript type="plain">"#));
        assert!(xml.contains("<details><![CDATA[<p>Do <strong>everything</strong></p>]]></details>"));
        assert!(!xml.contains("<steps"));
    }

    #[test]
    fn test_literal_fields_not_converted() {
        let mut test_case = TestCase::new(Some("*Name*".to_string()), Vec::new());
        test_case.objective = Some("<p>kept</p> *as is*".to_string());

        let xml = export(&[test_case], true);
        assert!(xml.contains("<name><![CDATA[*Name*]]></name>"));
        assert!(xml.contains("<objective><![CDATA[<p>kept</p> *as is*]]></objective>"));
    }

    #[test]
    fn test_script_defused_without_conversion() {
        let mut test_case = TestCase::new(Some("Case".to_string()), Vec::new());
        test_case.objective = Some("<script></script>".to_string());
        test_case.add_step(Some("<SCRIPT>x".to_string()), None, None);

        let xml = export(&[test_case], false);
        assert!(!xml.to_lowercase().contains("<script"));
        assert!(xml.contains("&lt;script&gt;&lt;/script&gt;"));
        assert!(xml.contains("&lt;SCRIPT>x"));
    }

    #[test]
    fn test_table_header_in_step() {
        let mut test_case = TestCase::new(Some("Case".to_string()), Vec::new());
        test_case.add_step(Some("||Col1||Col2||\n|a|b|".to_string()), None, None);

        let xml = export(&[test_case], true);
        assert!(xml.contains("<th>Col1</th>"));
        assert!(xml.contains("<th>Col2</th>"));
    }

    #[test]
    fn test_cdata_terminator_split() {
        assert_eq!(cdata_sections("a]]>b"), vec!["a]]", ">b"]);
        assert_eq!(cdata_sections("plain"), vec!["plain"]);

        let mut test_case = TestCase::new(Some("a]]>b".to_string()), Vec::new());
        test_case.status = Some("Open".to_string());
        let xml = export(&[test_case], false);
        assert!(xml.contains("<name><![CDATA[a]]]]><![CDATA[>b]]></name>"));
    }

    #[test]
    fn test_nameless_test_case_omits_name() {
        let mut test_case = TestCase::new(None, Vec::new());
        test_case.status = Some("Open".to_string());

        let xml = export(&[test_case], true);
        assert!(!xml.contains("<name"));
        assert!(xml.contains("<status><![CDATA[Open]]></status>"));
    }

    #[test]
    fn test_custom_field_values_stay_literal_when_converting() {
        let test_case = TestCase::new(
            Some("Case".to_string()),
            vec![
                CustomField::new("Original issue key", "TEST-1", CustomFieldType::SingleLineText),
                CustomField::new("Effort", " 2.5 ", CustomFieldType::Decimal),
                CustomField::new("Notes", "*bold* <script>", CustomFieldType::MultiLineText),
            ],
        );

        let xml = export(&[test_case], true);
        assert!(xml.contains("<value><![CDATA[TEST-1]]></value>"));
        assert!(xml.contains("<value><![CDATA[2.5]]></value>"));
        assert!(xml.contains("<value><![CDATA[*bold* &lt;script>]]></value>"));
        assert!(!xml.contains("<p>"));
    }

    #[test]
    fn test_attribute_values_escaped() {
        let test_case = TestCase::new(
            Some("Case".to_string()),
            vec![CustomField::new("R&D \"area\"", "x", CustomFieldType::SingleLineText)],
        );
        let xml = export(&[test_case], false);
        assert!(xml.contains(r#"name="R&amp;D &quot;area&quot;""#));
    }
}
