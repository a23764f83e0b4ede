//! Repair passes for Jira's issue export
//!
//! The export never CDATA-wraps free text, so descriptions and XRay step bodies
//! may carry raw HTML that breaks a strict XML parser. The passes below rewrite
//! the raw text into well-formed XML. They run in the declared order: later
//! patterns expect the markers inserted by earlier ones.

use lazy_static::lazy_static;
use regex::{NoExpand, Regex};

/// Custom field key of the XRay manual test steps field
pub const XRAY_STEPS_KEY: &str = "com.xpandit.plugins.xray:manual-test-steps-custom-field";

/// A named, independently testable rewrite
pub struct RepairPass {
    pub name: &'static str,
    rewrite: fn(&str) -> String,
}

impl RepairPass {
    pub fn apply(&self, text: &str) -> String {
        (self.rewrite)(text)
    }
}

/// Passes run on every document
pub const ALWAYS: &[RepairPass] = &[RepairPass {
    name: "description",
    rewrite: wrap_description,
}];

/// Passes run only when the document carries XRay steps
pub const XRAY: &[RepairPass] = &[
    RepairPass {
        name: "step_aliases",
        rewrite: rename_step_aliases,
    },
    RepairPass {
        name: "step_description",
        rewrite: wrap_step_description,
    },
    RepairPass {
        name: "step_data",
        rewrite: wrap_step_data,
    },
    RepairPass {
        name: "step_result",
        rewrite: wrap_step_result,
    },
    RepairPass {
        name: "bare_ampersands",
        rewrite: escape_bare_ampersands,
    },
];

lazy_static! {
    static ref RE_ACTION: Regex = Regex::new(r"<(/?)Action(\s*/?)>").unwrap();
    static ref RE_DATA: Regex = Regex::new(r"<(/?)Data(\s*/?)>").unwrap();
    static ref RE_EXPECTED_RESULT: Regex = Regex::new(r"<(/?)Expected_Result(\s*/?)>").unwrap();

    static ref RE_INDEX_THEN_STEP: Regex = Regex::new(r"</index>[^<]*<step>").unwrap();
    static ref RE_STEP_CLOSE_THEN_DATA: Regex = Regex::new(r"</step>[^<]*<data").unwrap();

    static ref RE_STEP_THEN_DATA_OPEN: Regex = Regex::new(r"</step>[^<]*<data>").unwrap();
    static ref RE_EMPTY_STEP_THEN_DATA_OPEN: Regex = Regex::new(r"<step/>[^<]*<data>").unwrap();
    static ref RE_DATA_CLOSE_THEN_RESULT: Regex = Regex::new(r"</data>[^<]*<result").unwrap();

    static ref RE_DATA_THEN_RESULT_OPEN: Regex = Regex::new(r"</data>[^<]*<result>").unwrap();
    static ref RE_EMPTY_DATA_THEN_RESULT_OPEN: Regex = Regex::new(r"<data/>[^<]*<result>").unwrap();
    static ref RE_RESULT_CLOSE_THEN_STEP_CLOSE: Regex = Regex::new(r"</result>[^<]*</step").unwrap();
}

/// Passes applicable to `raw`, in execution order
pub fn passes_for(raw: &str) -> Vec<&'static RepairPass> {
    let mut passes: Vec<&'static RepairPass> = ALWAYS.iter().collect();
    if raw.contains(XRAY_STEPS_KEY) {
        passes.extend(XRAY.iter());
    }
    passes
}

/// Rewrite a raw export into text the XML parser accepts
pub fn repair(raw: &str) -> String {
    let mut text = raw.to_string();
    for pass in passes_for(raw) {
        text = pass.apply(&text);
        tracing::trace!("Applied repair pass {}", pass.name);
    }
    text
}

fn replace_literal(re: &Regex, text: &str, replacement: &str) -> String {
    re.replace_all(text, NoExpand(replacement)).into_owned()
}

/// `<description><p>a & b</p></description>`
/// becomes `<description><![CDATA[<p>a & b</p>]]></description>`
fn wrap_description(text: &str) -> String {
    text.replace("<description>", "<description><![CDATA[")
        .replace("</description>", "]]></description>")
}

/// `<Action>Click</Action><Data/>` becomes `<step>Click</step><data/>`
fn rename_step_aliases(text: &str) -> String {
    let text = RE_ACTION.replace_all(text, "<${1}step${2}>");
    let text = RE_DATA.replace_all(&text, "<${1}data${2}>");
    RE_EXPECTED_RESULT
        .replace_all(&text, "<${1}result${2}>")
        .into_owned()
}

/// `</index>\n<step>Open <b>app</b></step>\n<data`
/// becomes `</index><step><![CDATA[Open <b>app</b>]]></step><data`
fn wrap_step_description(text: &str) -> String {
    let text = replace_literal(&RE_INDEX_THEN_STEP, text, "</index><step><![CDATA[");
    replace_literal(&RE_STEP_CLOSE_THEN_DATA, &text, "]]></step><data")
}

/// `</step><data>x < y</data>\n<result` and `<step/>\n<data>x < y</data><result`
/// both wrap the data body: `<data><![CDATA[x < y]]></data><result`
fn wrap_step_data(text: &str) -> String {
    let text = replace_literal(&RE_STEP_THEN_DATA_OPEN, text, "</step><data><![CDATA[");
    let text = replace_literal(&RE_EMPTY_STEP_THEN_DATA_OPEN, &text, "<step/><data><![CDATA[");
    replace_literal(&RE_DATA_CLOSE_THEN_RESULT, &text, "]]></data><result")
}

/// `</data><result>ok</result>\n</step` and `<data/>\n<result>ok</result></step`
/// both wrap the result body: `<result><![CDATA[ok]]></result></step`
fn wrap_step_result(text: &str) -> String {
    let text = replace_literal(&RE_DATA_THEN_RESULT_OPEN, text, "</data><result><![CDATA[");
    let text = replace_literal(&RE_EMPTY_DATA_THEN_RESULT_OPEN, &text, "<data/><result><![CDATA[");
    replace_literal(&RE_RESULT_CLOSE_THEN_STEP_CLOSE, &text, "]]></result></step")
}

/// `Tom & Jerry` becomes `Tom &amp; Jerry`; CDATA sections are left alone
fn escape_bare_ampersands(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("<![CDATA[") {
        escaped.push_str(&rest[..start].replace("& ", "&amp; "));
        let section = &rest[start..];
        let end = section.find("]]>").map(|i| i + 3).unwrap_or(section.len());
        escaped.push_str(&section[..end]);
        rest = &section[end..];
    }
    escaped.push_str(&rest.replace("& ", "&amp; "));
    escaped
}
