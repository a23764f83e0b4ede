//! Field extractors
//!
//! Pure functions over one issue record and the configured field mappings.
//! Text values are trimmed and blank values come back as `None`.

use crate::document::{trimmed, Element, Issue};
use crate::models::settings::custom_field_element_id;
use crate::models::{CustomField, CustomFieldType, Mappings};
use crate::{Error, Result};
use indexmap::IndexSet;

pub const ORIGINAL_ISSUE_KEY_FIELD: &str = "Original issue key";
pub const ENVIRONMENT_FIELD: &str = "Environment";
pub const ADDITIONAL_COMPONENTS_FIELD: &str = "Additional linked components";

const TEXTAREA_KEY: &str = "com.atlassian.jira.plugin.system.customfieldtypes:textarea";
const TEXTFIELD_KEY: &str = "com.atlassian.jira.plugin.system.customfieldtypes:textfield";
const FLOAT_KEY: &str = "com.atlassian.jira.plugin.system.customfieldtypes:float";
const SELECT_KEY: &str = "com.atlassian.jira.plugin.system.customfieldtypes:select";
const MULTISELECT_KEY: &str = "com.atlassian.jira.plugin.system.customfieldtypes:multiselect";
const MULTICHECKBOXES_KEY: &str = "com.atlassian.jira.plugin.system.customfieldtypes:multicheckboxes";

/// Generic custom field dispatch, in output order
const CUSTOM_FIELD_TYPES: &[(&str, CustomFieldType)] = &[
    (TEXTAREA_KEY, CustomFieldType::MultiLineText),
    (TEXTFIELD_KEY, CustomFieldType::MultiLineText),
    (FLOAT_KEY, CustomFieldType::Decimal),
    (SELECT_KEY, CustomFieldType::SingleChoiceSelectList),
    (MULTISELECT_KEY, CustomFieldType::MultiChoiceSelectList),
    (MULTICHECKBOXES_KEY, CustomFieldType::MultiChoiceSelectList),
];

/// Test case name from the issue summary
pub fn name(issue: &Issue<'_>) -> Option<String> {
    issue.summary()
}

/// Objective from the issue description, optionally HTML-entity decoded
pub fn objective(issue: &Issue<'_>, decode_entities: bool) -> Option<String> {
    let description = issue.description()?;
    if decode_entities {
        trimmed(&html_escape::decode_html_entities(description))
    } else {
        trimmed(description)
    }
}

pub fn precondition(issue: &Issue<'_>, mappings: &Mappings) -> Result<Option<String>> {
    match mappings.precondition_field_id() {
        Some(id) => value_by_field_id(issue, id),
        None => Ok(None),
    }
}

pub fn plain_text_script(issue: &Issue<'_>, mappings: &Mappings) -> Result<Option<String>> {
    match mappings.plain_text_script_field_id() {
        Some(id) => value_by_field_id(issue, id),
        None => Ok(None),
    }
}

/// First value of the custom field with numeric ID `id`.
///
/// The field must exist on the issue; its value may be blank.
fn value_by_field_id(issue: &Issue<'_>, id: &str) -> Result<Option<String>> {
    let element_id = custom_field_element_id(id);
    let field = issue.custom_field_by_id(&element_id).ok_or_else(|| {
        Error::MissingField(format!(
            "custom field {} not found on issue {}",
            element_id,
            issue.key().unwrap_or_default()
        ))
    })?;
    Ok(field.first_value())
}

pub fn status(issue: &Issue<'_>) -> Option<String> {
    issue.status()
}

pub fn priority(issue: &Issue<'_>, mappings: &Mappings) -> Option<String> {
    issue.priority().map(|priority| mappings.map_priority(priority))
}

pub fn labels(issue: &Issue<'_>) -> Vec<String> {
    issue.labels().filter_map(Element::text_value).collect()
}

pub fn components(issue: &Issue<'_>) -> Vec<String> {
    issue.components().filter_map(Element::text_value).collect()
}

/// Only the first component is kept on the test case
pub fn component(issue: &Issue<'_>) -> Option<String> {
    components(issue).into_iter().next()
}

/// Username held by the configured owner element, if any
pub fn owner_username(issue: &Issue<'_>, mappings: &Mappings) -> Result<Option<String>> {
    let Some(field) = mappings.owner_field() else {
        return Ok(None);
    };

    let element = issue.element().required_child(field)?;
    Ok(element.attr("username").and_then(trimmed))
}

/// Linked issue keys, outward and inward, first occurrence wins
pub fn issue_links(issue: &Issue<'_>) -> IndexSet<String> {
    let mut keys = IndexSet::new();
    for link_type in issue.link_types() {
        for direction in ["outwardlinks", "inwardlinks"] {
            let links = link_type
                .child(direction)
                .into_iter()
                .flat_map(|links| links.children("issuelink"));
            for link in links {
                if let Some(key) = link.child_text("issuekey") {
                    keys.insert(key);
                }
            }
        }
    }
    keys
}

/// Synthetic and generic custom fields of an issue
pub fn custom_fields(issue: &Issue<'_>, mappings: &Mappings) -> Result<Vec<CustomField>> {
    let key = issue
        .key()
        .ok_or_else(|| Error::MissingField("issue has no key".to_string()))?;

    let mut fields = vec![CustomField::new(
        ORIGINAL_ISSUE_KEY_FIELD,
        key,
        CustomFieldType::SingleLineText,
    )];

    if let Some(environment) = issue.environment() {
        fields.push(CustomField::new(
            ENVIRONMENT_FIELD,
            environment,
            CustomFieldType::MultiLineText,
        ));
    }

    let ignored = mappings.ignored_custom_fields();
    for (type_key, field_type) in CUSTOM_FIELD_TYPES {
        for node in issue.custom_fields_by_key(type_key, &ignored) {
            let Some(name) = node.name() else {
                continue;
            };

            let value = if *field_type == CustomFieldType::MultiChoiceSelectList {
                let values: Vec<String> = node.values().filter_map(Element::text_value).collect();
                trimmed(&values.join(", "))
            } else {
                node.first_value()
            };

            if let Some(value) = value {
                fields.push(CustomField::new(name, value, *field_type));
            }
        }
    }

    let components = components(issue);
    if components.len() > 1 {
        fields.push(CustomField::new(
            ADDITIONAL_COMPONENTS_FIELD,
            components[1..].join(", "),
            CustomFieldType::MultiChoiceSelectList,
        ));
    }

    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn parse_item(item: &str) -> Document {
        Document::parse(&format!("<rss><channel><item>{}</item></channel></rss>", item)).unwrap()
    }

    fn with_issue<T>(item: &str, f: impl FnOnce(&Issue<'_>) -> T) -> T {
        let document = parse_item(item);
        let issues = document.issues().unwrap();
        f(&issues[0])
    }

    #[test]
    fn test_name_from_summary() {
        assert_eq!(
            with_issue("<summary> Login works </summary>", name).as_deref(),
            Some("Login works")
        );
        assert!(with_issue("<summary>  </summary>", name).is_none());
        assert!(with_issue("<key>T-1</key>", name).is_none());
    }

    #[test]
    fn test_objective_decoding() {
        let item = "<description>&lt;p&gt;Hi&lt;/p&gt;</description>";
        assert_eq!(with_issue(item, |i| objective(i, false)).as_deref(), Some("<p>Hi</p>"));

        let item = "<description><![CDATA[&lt;p&gt;Hi &amp; bye&lt;/p&gt;]]></description>";
        assert_eq!(
            with_issue(item, |i| objective(i, true)).as_deref(),
            Some("<p>Hi & bye</p>")
        );
        assert!(with_issue("<description>   </description>", |i| objective(i, false)).is_none());
    }

    #[test]
    fn test_precondition_lookup() {
        let item = r#"<key>T-1</key><customfields>
            <customfield id="customfield_10100" key="com.atlassian.jira.plugin.system.customfieldtypes:textarea">
              <customfieldname>Precondition</customfieldname>
              <customfieldvalues><customfieldvalue key="1"> Logged out </customfieldvalue></customfieldvalues>
            </customfield></customfields>"#;

        let mut mappings = Mappings::default();
        assert!(with_issue(item, |i| precondition(i, &mappings)).unwrap().is_none());

        mappings.precondition = Some("10100".to_string());
        assert_eq!(
            with_issue(item, |i| precondition(i, &mappings)).unwrap().as_deref(),
            Some("Logged out")
        );

        mappings.precondition = Some("99999".to_string());
        let err = with_issue(item, |i| precondition(i, &mappings)).unwrap_err();
        assert!(matches!(err, Error::MissingField(_)));
    }

    #[test]
    fn test_priority_remapped() {
        let mut mappings = Mappings::default();
        mappings
            .priority
            .insert("Blocker".to_string(), "Highest".to_string());

        assert_eq!(
            with_issue(r#"<priority id="1">Blocker</priority>"#, |i| priority(i, &mappings)).as_deref(),
            Some("Highest")
        );
        assert_eq!(
            with_issue(r#"<priority id="5">Trivial</priority>"#, |i| priority(i, &mappings)).as_deref(),
            Some("Trivial")
        );
        assert!(with_issue("", |i| priority(i, &mappings)).is_none());
    }

    #[test]
    fn test_labels() {
        let item = "<labels><label> smoke </label><label></label><label>ui</label></labels>";
        assert_eq!(with_issue(item, labels), vec!["smoke", "ui"]);
        assert!(with_issue("<labels/>", labels).is_empty());
        assert!(with_issue("", labels).is_empty());
    }

    #[test]
    fn test_components() {
        let item = "<key>T-1</key><component>UI</component><component> API </component><component>DB</component>";
        assert_eq!(with_issue(item, component).as_deref(), Some("UI"));

        let fields = with_issue(item, |i| custom_fields(i, &Mappings::default())).unwrap();
        let additional = fields
            .iter()
            .find(|f| f.name == ADDITIONAL_COMPONENTS_FIELD)
            .unwrap();
        assert_eq!(additional.value, "API, DB");
        assert_eq!(additional.field_type, CustomFieldType::MultiChoiceSelectList);
    }

    #[test]
    fn test_single_component_has_no_additional_field() {
        let item = "<key>T-1</key><component>UI</component>";
        let fields = with_issue(item, |i| custom_fields(i, &Mappings::default())).unwrap();
        assert!(fields.iter().all(|f| f.name != ADDITIONAL_COMPONENTS_FIELD));
    }

    #[test]
    fn test_owner_username() {
        let item = r#"<assignee username=" jdoe ">John Doe</assignee><reporter username="">Nobody</reporter>"#;
        let mut mappings = Mappings::default();
        assert!(with_issue(item, |i| owner_username(i, &mappings)).unwrap().is_none());

        mappings.owner = Some("assignee".to_string());
        assert_eq!(
            with_issue(item, |i| owner_username(i, &mappings)).unwrap().as_deref(),
            Some("jdoe")
        );

        mappings.owner = Some("reporter".to_string());
        assert!(with_issue(item, |i| owner_username(i, &mappings)).unwrap().is_none());

        mappings.owner = Some("creator".to_string());
        assert!(with_issue(item, |i| owner_username(i, &mappings)).is_err());
    }

    #[test]
    fn test_issue_links_deduplicated() {
        let item = r#"<issuelinks>
            <issuelinktype id="1">
              <outwardlinks description="tests">
                <issuelink><issuekey id="1">TEST-1</issuekey></issuelink>
                <issuelink><issuekey id="2"> TEST-2 </issuekey></issuelink>
              </outwardlinks>
              <inwardlinks description="is tested by">
                <issuelink><issuekey id="1">TEST-1</issuekey></issuelink>
              </inwardlinks>
            </issuelinktype>
            <issuelinktype id="2">
              <inwardlinks description="relates">
                <issuelink><issuekey id="3">TEST-3</issuekey></issuelink>
                <issuelink><issuekey id="2">TEST-2</issuekey></issuelink>
              </inwardlinks>
            </issuelinktype>
          </issuelinks>"#;

        let links: Vec<String> = with_issue(item, issue_links).into_iter().collect();
        assert_eq!(links, vec!["TEST-1", "TEST-2", "TEST-3"]);
    }

    #[test]
    fn test_custom_field_dispatch() {
        let item = r#"<key> TEST-7 </key><environment> Chrome </environment><customfields>
            <customfield id="customfield_1" key="com.atlassian.jira.plugin.system.customfieldtypes:select">
              <customfieldname>Level</customfieldname>
              <customfieldvalues><customfieldvalue key="10"><![CDATA[High]]></customfieldvalue></customfieldvalues>
            </customfield>
            <customfield id="customfield_2" key="com.atlassian.jira.plugin.system.customfieldtypes:textarea">
              <customfieldname>Notes</customfieldname>
              <customfieldvalues><customfieldvalue>Some notes</customfieldvalue></customfieldvalues>
            </customfield>
            <customfield id="customfield_3" key="com.atlassian.jira.plugin.system.customfieldtypes:float">
              <customfieldname>Effort</customfieldname>
              <customfieldvalues><customfieldvalue>2.5</customfieldvalue></customfieldvalues>
            </customfield>
            <customfield id="customfield_4" key="com.atlassian.jira.plugin.system.customfieldtypes:multicheckboxes">
              <customfieldname>Platforms</customfieldname>
              <customfieldvalues>
                <customfieldvalue key="1">iOS</customfieldvalue>
                <customfieldvalue key="2">Android</customfieldvalue>
              </customfieldvalues>
            </customfield>
            <customfield id="customfield_5" key="com.atlassian.jira.plugin.system.customfieldtypes:textarea">
              <customfieldname>  </customfieldname>
              <customfieldvalues><customfieldvalue>nameless</customfieldvalue></customfieldvalues>
            </customfield>
            <customfield id="customfield_6" key="com.atlassian.jira.plugin.system.customfieldtypes:labels">
              <customfieldname>Tags</customfieldname>
              <customfieldvalues><label>ignored</label></customfieldvalues>
            </customfield>
          </customfields>"#;

        let fields = with_issue(item, |i| custom_fields(i, &Mappings::default())).unwrap();
        let summary: Vec<(&str, &str, CustomFieldType)> = fields
            .iter()
            .map(|f| (f.name.as_str(), f.value.as_str(), f.field_type))
            .collect();

        assert_eq!(
            summary,
            vec![
                (ORIGINAL_ISSUE_KEY_FIELD, "TEST-7", CustomFieldType::SingleLineText),
                (ENVIRONMENT_FIELD, "Chrome", CustomFieldType::MultiLineText),
                ("Notes", "Some notes", CustomFieldType::MultiLineText),
                ("Effort", "2.5", CustomFieldType::Decimal),
                ("Level", "High", CustomFieldType::SingleChoiceSelectList),
                ("Platforms", "iOS, Android", CustomFieldType::MultiChoiceSelectList),
            ]
        );
    }

    #[test]
    fn test_ignored_custom_fields_skipped() {
        let item = r#"<key>T-1</key><customfields>
            <customfield id="customfield_10100" key="com.atlassian.jira.plugin.system.customfieldtypes:textarea">
              <customfieldname>Precondition</customfieldname>
              <customfieldvalues><customfieldvalue>Logged out</customfieldvalue></customfieldvalues>
            </customfield></customfields>"#;
        let mappings = Mappings {
            precondition: Some("10100".to_string()),
            ..Mappings::default()
        };

        let fields = with_issue(item, |i| custom_fields(i, &mappings)).unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, ORIGINAL_ISSUE_KEY_FIELD);
    }

    #[test]
    fn test_missing_key_is_schema_mismatch() {
        let err = with_issue("<summary>x</summary>", |i| custom_fields(i, &Mappings::default())).unwrap_err();
        assert!(matches!(err, Error::MissingField(_)));
    }
}
