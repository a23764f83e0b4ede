//! Parsed issue export
//!
//! The repaired export is read into an owned element tree. Navigation goes
//! through explicit accessors: [`Element::child`] for optional single
//! elements, [`Element::children`] for repeated ones and
//! [`Element::required_child`] where the export must contain the element.

use crate::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    /// Concatenated text and CDATA content directly inside this element
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| Error::Xml(format!("Invalid attribute in <{}>: {}", name, e)))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| Error::Xml(format!("Invalid attribute value in <{}>: {}", name, e)))?
                .into_owned();
            attributes.push((key, value));
        }

        Ok(Self {
            name,
            attributes,
            text: String::new(),
            children: Vec::new(),
        })
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Like [`Element::child`], but a missing element is a schema mismatch
    pub fn required_child(&self, name: &str) -> Result<&Element> {
        self.child(name)
            .ok_or_else(|| Error::MissingField(format!("<{}> has no <{}> element", self.name, name)))
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Trimmed text content, `None` when blank
    pub fn text_value(&self) -> Option<String> {
        trimmed(&self.text)
    }

    pub fn child_text(&self, name: &str) -> Option<String> {
        self.child(name).and_then(Element::text_value)
    }
}

/// Trim `text`; blank text becomes `None`
pub fn trimmed(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    root: Element,
}

impl Document {
    /// Parse repaired export text
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut stack = vec![Element::default()];

        loop {
            let event = reader.read_event().map_err(|e| {
                Error::Xml(format!("{} at position {}", e, reader.buffer_position()))
            })?;

            match event {
                Event::Start(start) => stack.push(Element::from_start(&start)?),
                Event::Empty(start) => {
                    let element = Element::from_start(&start)?;
                    push_child(&mut stack, element);
                }
                Event::End(_) => {
                    let element = match stack.pop() {
                        Some(element) if !stack.is_empty() => element,
                        _ => {
                            return Err(Error::Xml(format!(
                                "Unexpected closing tag at position {}",
                                reader.buffer_position()
                            )))
                        }
                    };
                    push_child(&mut stack, element);
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(|e| {
                        Error::Xml(format!("{} at position {}", e, reader.buffer_position()))
                    })?;
                    append_text(&mut stack, &text);
                }
                Event::CData(cdata) => {
                    append_text(&mut stack, &String::from_utf8_lossy(&cdata));
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if stack.len() != 1 {
            let open = stack.last().map(|e| e.name.clone()).unwrap_or_default();
            return Err(Error::Xml(format!("Unexpected end of document inside <{}>", open)));
        }

        let root = stack
            .pop()
            .and_then(|document| document.children.into_iter().next())
            .ok_or_else(|| Error::Xml("Document has no root element".to_string()))?;

        Ok(Self { root })
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Issue records under `rss/channel/item`, in document order
    pub fn issues(&self) -> Result<Vec<Issue<'_>>> {
        if self.root.name != "rss" {
            return Err(Error::MissingField(format!(
                "expected <rss> root element, found <{}>",
                self.root.name
            )));
        }

        let channel = self.root.required_child("channel")?;
        Ok(channel.children("item").map(Issue::new).collect())
    }
}

fn push_child(stack: &mut [Element], element: Element) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
    }
}

fn append_text(stack: &mut [Element], text: &str) {
    if let Some(current) = stack.last_mut() {
        current.text.push_str(text);
    }
}

/// One `<item>` of the export
#[derive(Debug, Clone, Copy)]
pub struct Issue<'a> {
    element: &'a Element,
}

impl<'a> Issue<'a> {
    pub fn new(element: &'a Element) -> Self {
        Self { element }
    }

    pub fn element(&self) -> &'a Element {
        self.element
    }

    pub fn summary(&self) -> Option<String> {
        self.element.child_text("summary")
    }

    pub fn key(&self) -> Option<String> {
        self.element.child_text("key")
    }

    /// Description body exactly as exported, untrimmed
    pub fn description(&self) -> Option<&'a str> {
        self.element.child("description").map(|e| e.text.as_str())
    }

    pub fn status(&self) -> Option<String> {
        self.element.child_text("status")
    }

    pub fn priority(&self) -> Option<String> {
        self.element.child_text("priority")
    }

    pub fn environment(&self) -> Option<String> {
        self.element.child_text("environment")
    }

    pub fn labels(&self) -> impl Iterator<Item = &'a Element> + 'a {
        self.element
            .child("labels")
            .into_iter()
            .flat_map(|labels| labels.children("label"))
    }

    pub fn components(&self) -> impl Iterator<Item = &'a Element> + 'a {
        self.element.children("component")
    }

    pub fn link_types(&self) -> impl Iterator<Item = &'a Element> + 'a {
        self.element
            .child("issuelinks")
            .into_iter()
            .flat_map(|links| links.children("issuelinktype"))
    }

    pub fn custom_fields(&self) -> impl Iterator<Item = CustomFieldNode<'a>> + 'a {
        self.element
            .child("customfields")
            .into_iter()
            .flat_map(|fields| fields.children("customfield"))
            .map(CustomFieldNode::new)
    }

    /// Custom field by element ID such as `customfield_10100`
    pub fn custom_field_by_id(&self, id: &str) -> Option<CustomFieldNode<'a>> {
        self.custom_fields().find(|field| field.id() == id)
    }

    /// Custom fields of type `key`, skipping the element IDs in `ignored`
    pub fn custom_fields_by_key(&self, key: &str, ignored: &[String]) -> Vec<CustomFieldNode<'a>> {
        self.custom_fields()
            .filter(|field| field.key() == key && !ignored.iter().any(|id| id == field.id()))
            .collect()
    }
}

/// One `<customfield id=".." key="..">` of an issue
#[derive(Debug, Clone, Copy)]
pub struct CustomFieldNode<'a> {
    element: &'a Element,
}

impl<'a> CustomFieldNode<'a> {
    pub fn new(element: &'a Element) -> Self {
        Self { element }
    }

    pub fn id(&self) -> &'a str {
        self.element.attr("id").unwrap_or_default().trim()
    }

    pub fn key(&self) -> &'a str {
        self.element.attr("key").unwrap_or_default().trim()
    }

    pub fn name(&self) -> Option<String> {
        self.element.child_text("customfieldname")
    }

    /// Every `customfieldvalue`; attributed values unwrap to their text
    pub fn values(&self) -> impl Iterator<Item = &'a Element> + 'a {
        self.element
            .child("customfieldvalues")
            .into_iter()
            .flat_map(|values| values.children("customfieldvalue"))
    }

    pub fn first_value(&self) -> Option<String> {
        self.values().next().and_then(Element::text_value)
    }

    /// Structured steps stored under `customfieldvalues/steps/step`
    pub fn steps(&self) -> impl Iterator<Item = &'a Element> + 'a {
        self.element
            .child("customfieldvalues")
            .and_then(|values| values.child("steps"))
            .into_iter()
            .flat_map(|steps| steps.children("step"))
    }
}
