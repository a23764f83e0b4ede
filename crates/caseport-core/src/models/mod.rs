pub mod custom_field;
pub mod settings;
pub mod test_case;

pub use custom_field::{CustomField, CustomFieldType};
pub use settings::{JiraServerSettings, Mappings, Settings};
pub use test_case::{Step, TestCase, TestScript};
