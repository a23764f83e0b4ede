//! Custom field data model

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomField {
    pub name: String,
    pub value: String,
    pub field_type: CustomFieldType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomFieldType {
    SingleLineText,
    MultiLineText,
    Decimal,
    SingleChoiceSelectList,
    MultiChoiceSelectList,
}

impl CustomField {
    pub fn new(name: impl Into<String>, value: impl Into<String>, field_type: CustomFieldType) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            field_type,
        }
    }
}

impl CustomFieldType {
    /// Type tag written to the `type` attribute of the export
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomFieldType::SingleLineText => "SINGLE_LINE_TEXT",
            CustomFieldType::MultiLineText => "MULTI_LINE_TEXT",
            CustomFieldType::Decimal => "DECIMAL",
            CustomFieldType::SingleChoiceSelectList => "SINGLE_CHOICE_SELECT_LIST",
            CustomFieldType::MultiChoiceSelectList => "MULTI_CHOICE_SELECT_LIST",
        }
    }
}
