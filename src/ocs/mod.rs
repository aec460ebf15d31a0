//! Typed decoding of the OCS XML envelope.
//!
//! Responses look like `<ocs><meta>…</meta><data>…</data></ocs>`. Lists are
//! repeated `<element>` nodes under a kind-specific container (`users`,
//! `groups`, `apps`) or directly under `<data>` for subadmins. Scalar user
//! attributes are the direct children of `<data>`.

use std::collections::BTreeMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde::Serialize;
use thiserror::Error;

const ROOT: &str = "ocs";
const DATA: &str = "data";
const META: &str = "meta";
const ELEMENT: &str = "element";

/// Errors raised when a response body does not match the OCS envelope.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum DecodeError {
    /// The body is not well-formed XML.
    #[error("malformed XML response: {message}")]
    Malformed {
        /// Parser error message.
        message: String,
    },
    /// The XML is well-formed but a required node is absent.
    #[error("unexpected response shape: expected {expected}")]
    Shape {
        /// Path of the node that was expected, for example `ocs/data/users`.
        expected: String,
    },
    /// A scalar field requested by the caller is not present.
    #[error("response has no field '{field}'")]
    MissingField {
        /// Field name that was looked up.
        field: String,
    },
}

impl DecodeError {
    fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    fn shape(expected: impl Into<String>) -> Self {
        Self::Shape {
            expected: expected.into(),
        }
    }
}

/// Status block of an OCS response.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OcsMeta {
    /// `ok` or `failure`.
    pub status: String,
    /// OCS status code (100 for v1 success, 200 for v2 success).
    pub statuscode: u16,
    /// Optional human readable message.
    pub message: Option<String>,
}

/// Scalar attributes of a single user, keyed by field name.
///
/// Nested fields are flattened with dots, so the quota definition of an
/// OCS v2 response is available as `quota.definition`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct UserAttributes(BTreeMap<String, String>);

impl UserAttributes {
    /// Returns the value of `field`, if present.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Returns the value of `field`, failing when it is absent.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::MissingField`] when the field is missing.
    pub fn require(&self, field: &str) -> Result<&str, DecodeError> {
        self.get(field).ok_or_else(|| DecodeError::MissingField {
            field: field.to_owned(),
        })
    }

    /// Iterates over the fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

#[derive(Clone, Debug, Default)]
struct Node {
    name: String,
    text: String,
    children: Vec<Self>,
}

impl Node {
    fn child(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|node| node.name == name)
    }

    fn texts_of(&self, name: &str) -> Vec<String> {
        self.children
            .iter()
            .filter(|node| node.name == name)
            .map(|node| node.text.clone())
            .collect()
    }

    fn flatten_into(&self, prefix: &str, out: &mut BTreeMap<String, String>) {
        for child in &self.children {
            let key = if prefix.is_empty() {
                child.name.clone()
            } else {
                format!("{prefix}.{}", child.name)
            };
            child.flatten_into(&key, out);
            out.insert(key, child.text.clone());
        }
    }
}

/// A parsed OCS response body.
#[derive(Clone, Debug)]
pub struct OcsDocument {
    root: Node,
}

impl OcsDocument {
    /// Parses `xml` and checks that the root element is `<ocs>`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Malformed`] for ill-formed XML and
    /// [`DecodeError::Shape`] when the root element is not `<ocs>`.
    pub fn parse(xml: &str) -> Result<Self, DecodeError> {
        let root = parse_tree(xml)?;
        if root.name != ROOT {
            return Err(DecodeError::shape(ROOT));
        }
        Ok(Self { root })
    }

    /// Decodes the `<meta>` block.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Shape`] when `meta`, `status` or a numeric
    /// `statuscode` is missing.
    pub fn meta(&self) -> Result<OcsMeta, DecodeError> {
        let meta = self
            .root
            .child(META)
            .ok_or_else(|| DecodeError::shape("ocs/meta"))?;
        let status = meta
            .child("status")
            .ok_or_else(|| DecodeError::shape("ocs/meta/status"))?
            .text
            .clone();
        let statuscode = meta
            .child("statuscode")
            .and_then(|node| node.text.parse::<u16>().ok())
            .ok_or_else(|| DecodeError::shape("numeric ocs/meta/statuscode"))?;
        let message = meta
            .child("message")
            .map(|node| node.text.clone())
            .filter(|text| !text.is_empty());
        Ok(OcsMeta {
            status,
            statuscode,
            message,
        })
    }

    /// Returns the `<element>` texts under `data/{container}`, or directly
    /// under `data` when `container` is `None`, in document order.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Shape`] when `data` or the container is absent.
    pub fn elements(&self, container: Option<&str>) -> Result<Vec<String>, DecodeError> {
        let data = self.data()?;
        let list = match container {
            Some(name) => data
                .child(name)
                .ok_or_else(|| DecodeError::shape(format!("ocs/{DATA}/{name}")))?,
            None => data,
        };
        Ok(list.texts_of(ELEMENT))
    }

    /// Returns the scalar fields under `data`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Shape`] when `data` is absent.
    pub fn user_attributes(&self) -> Result<UserAttributes, DecodeError> {
        let mut fields = BTreeMap::new();
        self.data()?.flatten_into("", &mut fields);
        Ok(UserAttributes(fields))
    }

    fn data(&self) -> Result<&Node, DecodeError> {
        self.root
            .child(DATA)
            .ok_or_else(|| DecodeError::shape("ocs/data"))
    }
}

/// Extracts the user list from `data/users`.
///
/// # Errors
///
/// Returns [`DecodeError`] when the body does not match the envelope.
pub fn parse_users(body: &str) -> Result<Vec<String>, DecodeError> {
    OcsDocument::parse(body)?.elements(Some("users"))
}

/// Extracts the group list from `data/groups`.
///
/// # Errors
///
/// Returns [`DecodeError`] when the body does not match the envelope.
pub fn parse_groups(body: &str) -> Result<Vec<String>, DecodeError> {
    OcsDocument::parse(body)?.elements(Some("groups"))
}

/// Extracts the app list from `data/apps`.
///
/// # Errors
///
/// Returns [`DecodeError`] when the body does not match the envelope.
pub fn parse_apps(body: &str) -> Result<Vec<String>, DecodeError> {
    OcsDocument::parse(body)?.elements(Some("apps"))
}

/// Extracts subadmin users (or subadmin groups) listed directly under `data`.
///
/// # Errors
///
/// Returns [`DecodeError`] when the body does not match the envelope.
pub fn parse_subadmins(body: &str) -> Result<Vec<String>, DecodeError> {
    OcsDocument::parse(body)?.elements(None)
}

/// Extracts the scalar user attributes under `data`.
///
/// # Errors
///
/// Returns [`DecodeError`] when the body does not match the envelope.
pub fn parse_user_attributes(body: &str) -> Result<UserAttributes, DecodeError> {
    OcsDocument::parse(body)?.user_attributes()
}

/// Extracts the `<meta>` block.
///
/// # Errors
///
/// Returns [`DecodeError`] when the body does not match the envelope.
pub fn parse_meta(body: &str) -> Result<OcsMeta, DecodeError> {
    OcsDocument::parse(body)?.meta()
}

fn element_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.local_name().into_inner()).into_owned()
}

fn attach(stack: &mut [Node], root: &mut Option<Node>, node: Node) -> Result<(), DecodeError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return Ok(());
    }
    if root.is_some() {
        return Err(DecodeError::malformed("document has more than one root element"));
    }
    *root = Some(node);
    Ok(())
}

fn append_text(stack: &mut [Node], text: &str) -> Result<(), DecodeError> {
    match stack.last_mut() {
        Some(current) => current.text.push_str(text),
        None if text.trim().is_empty() => {}
        None => return Err(DecodeError::malformed("text outside the root element")),
    }
    Ok(())
}

fn parse_tree(xml: &str) -> Result<Node, DecodeError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Node> = Vec::new();
    let mut root = None;
    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => stack.push(Node {
                name: element_name(&start),
                ..Node::default()
            }),
            Ok(Event::Empty(start)) => {
                let node = Node {
                    name: element_name(&start),
                    ..Node::default()
                };
                attach(&mut stack, &mut root, node)?;
            }
            Ok(Event::End(_)) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| DecodeError::malformed("unbalanced closing tag"))?;
                attach(&mut stack, &mut root, node)?;
            }
            Ok(Event::Text(text)) => {
                let unescaped = text
                    .unescape()
                    .map_err(|err| DecodeError::malformed(err.to_string()))?;
                append_text(&mut stack, &unescaped)?;
            }
            Ok(Event::CData(data)) => {
                append_text(&mut stack, &String::from_utf8_lossy(&data.into_inner()))?;
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(DecodeError::malformed(err.to_string())),
        }
    }

    if let Some(open) = stack.last() {
        return Err(DecodeError::malformed(format!(
            "element <{}> is never closed",
            open.name
        )));
    }
    root.ok_or_else(|| DecodeError::malformed("document has no root element"))
}
