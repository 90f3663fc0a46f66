// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared wire protocol between the orchestration engine and the gateway.
//!
//! This crate defines the message types and framing used on the engine's
//! TCP connection. One message is one XML element; frames carry the ASCII
//! decimal byte length of the payload immediately followed by the payload
//! itself, whose first byte is always `<`.

use std::fmt;
use std::str::FromStr;

use jg_core::fields::{Access, FieldType};
use thiserror::Error;

pub mod framing;

/// Error returned by wire decoding.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed frame: {0}")]
    Frame(String),

    #[error("xml error: {0}")]
    Xml(String),
}

/// A specialized Result type for wire operations.
pub type Result<T> = std::result::Result<T, WireError>;

/// Request types, one per root XML element name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Shutdown,
    Connect,
    Login,
    Ping,
    ListProjects,
    GetProject,
    GetServerVersion,
    GetServerDate,
    ListFields,
    ListDefects,
    CreateDefect,
    NewDefect,
    SegmentFilters,
    ReferencedFields,
    SaveDefect,
    GetDefect,
}

impl RequestKind {
    /// The root element name for this request type.
    pub fn as_tag(&self) -> &'static str {
        match self {
            RequestKind::Shutdown => "SHUTDOWN",
            RequestKind::Connect => "CONNECT",
            RequestKind::Login => "LOGIN",
            RequestKind::Ping => "PING",
            RequestKind::ListProjects => "LIST_PROJECTS",
            RequestKind::GetProject => "GET_PROJECT",
            RequestKind::GetServerVersion => "GET_SERVER_VERSION",
            RequestKind::GetServerDate => "GET_SERVER_DATE",
            RequestKind::ListFields => "LIST_FIELDS",
            RequestKind::ListDefects => "LIST_DEFECTS",
            RequestKind::CreateDefect => "CREATE_DEFECT",
            RequestKind::NewDefect => "NEW_DEFECT",
            RequestKind::SegmentFilters => "SEGMENT_FILTERS",
            RequestKind::ReferencedFields => "REFERENCED_FIELDS",
            RequestKind::SaveDefect => "SAVE_DEFECT",
            RequestKind::GetDefect => "GET_DEFECT",
        }
    }

    /// Resolve a root element name to a request type.
    pub fn from_tag(tag: &str) -> Option<RequestKind> {
        match tag {
            "SHUTDOWN" => Some(RequestKind::Shutdown),
            "CONNECT" => Some(RequestKind::Connect),
            "LOGIN" => Some(RequestKind::Login),
            "PING" => Some(RequestKind::Ping),
            "LIST_PROJECTS" => Some(RequestKind::ListProjects),
            "GET_PROJECT" => Some(RequestKind::GetProject),
            "GET_SERVER_VERSION" => Some(RequestKind::GetServerVersion),
            "GET_SERVER_DATE" => Some(RequestKind::GetServerDate),
            "LIST_FIELDS" => Some(RequestKind::ListFields),
            "LIST_DEFECTS" => Some(RequestKind::ListDefects),
            "CREATE_DEFECT" => Some(RequestKind::CreateDefect),
            "NEW_DEFECT" => Some(RequestKind::NewDefect),
            "SEGMENT_FILTERS" => Some(RequestKind::SegmentFilters),
            "REFERENCED_FIELDS" => Some(RequestKind::ReferencedFields),
            "SAVE_DEFECT" => Some(RequestKind::SaveDefect),
            "GET_DEFECT" => Some(RequestKind::GetDefect),
            _ => None,
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_tag())
    }
}

impl FromStr for RequestKind {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self> {
        RequestKind::from_tag(s)
            .ok_or_else(|| WireError::Xml(format!("unknown request tag: {}", s)))
    }
}

/// A decoded request: root tag, attributes and `Field` children.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    tag: String,
    attrs: Vec<(String, String)>,
    fields: Vec<(String, String)>,
}

impl Request {
    pub fn new(tag: impl Into<String>) -> Self {
        Request {
            tag: tag.into(),
            attrs: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// The root element name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The request type, if the tag is known.
    pub fn kind(&self) -> Option<RequestKind> {
        RequestKind::from_tag(&self.tag)
    }

    /// Attribute value by exact name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Attribute value by exact name, treating an empty value as absent.
    pub fn attr_non_empty(&self, name: &str) -> Option<&str> {
        self.attr(name).filter(|v| !v.trim().is_empty())
    }

    /// `Field` child value by name. Field names are matched
    /// case-insensitively, as the engine is not consistent about casing.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All `Field` children in document order.
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn push_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attrs.push((name.into(), value.into()));
    }

    pub fn push_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push_attr(name, value);
        self
    }

    /// Builder-style field setter.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push_field(name, value);
        self
    }

    /// Parse a request from its XML payload.
    pub fn parse(xml: &str) -> Result<Request> {
        use quick_xml::events::Event;

        let mut reader = quick_xml::Reader::from_str(xml);
        let mut root: Option<(String, Vec<(String, String)>)> = None;
        let mut fields: Vec<(String, String)> = Vec::new();

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    let pairs = attribute_pairs(&e)?;
                    if root.is_none() {
                        root = Some((name, pairs));
                    } else if name == "Field" {
                        let field_name = pair_value(&pairs, "NAME").unwrap_or_default();
                        let field_value = pair_value(&pairs, "VALUE").unwrap_or_default();
                        fields.push((field_name, field_value));
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => return Err(WireError::Xml(e.to_string())),
            }
        }

        let (tag, attrs) =
            root.ok_or_else(|| WireError::Xml("empty request document".to_string()))?;
        Ok(Request { tag, attrs, fields })
    }

    /// Serialize the request to XML. Used by the engine side of the
    /// protocol and by tests driving a gateway end to end.
    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        xml.push('<');
        xml.push_str(&self.tag);
        for (name, value) in &self.attrs {
            xml.push(' ');
            xml.push_str(name);
            xml.push_str("=\"");
            xml.push_str(&escape_xml(value));
            xml.push('"');
        }
        if self.fields.is_empty() {
            xml.push_str(" />");
        } else {
            xml.push('>');
            for (name, value) in &self.fields {
                xml.push_str("<Field NAME=\"");
                xml.push_str(&escape_xml(name));
                xml.push_str("\" VALUE=\"");
                xml.push_str(&escape_xml(value));
                xml.push_str("\" />");
            }
            xml.push_str("</");
            xml.push_str(&self.tag);
            xml.push('>');
        }
        xml
    }
}

/// A field descriptor entry of a DESCS response.
#[derive(Debug, Clone, PartialEq)]
pub struct Desc {
    pub name: String,
    pub field_type: FieldType,
    pub access: Access,
    /// Allowed values for select descriptors, in display order.
    pub values: Option<Vec<String>>,
}

impl Desc {
    pub fn new(name: impl Into<String>, field_type: FieldType, access: Access) -> Self {
        Desc {
            name: name.into(),
            field_type,
            access,
            values: None,
        }
    }

    pub fn with_values(mut self, values: Vec<String>) -> Self {
        self.values = Some(values);
        self
    }

    fn to_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str("<DESC NAME=\"");
        xml.push_str(&escape_xml(&self.name));
        xml.push_str("\" ACCESS=\"");
        xml.push_str(&self.access.code().to_string());
        xml.push_str("\" TYPE=\"");
        xml.push_str(self.field_type.as_str());
        xml.push_str("\">");
        if let Some(values) = &self.values {
            if !values.is_empty() {
                xml.push_str(&strings_xml(values));
            }
        }
        xml.push_str("</DESC>");
        xml
    }
}

/// A response message sent back to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// A STRINGS list. Values are deduplicated in insertion order.
    Strings(Vec<String>),
    /// A FIELDS list of name/value pairs.
    Fields(Vec<(String, String)>),
    /// A DESCS list of field descriptors.
    Descs(Vec<Desc>),
    /// An ERROR with a message and a continue flag.
    Error { message: String, can_continue: bool },
}

impl Response {
    /// Single-value STRINGS response.
    pub fn string(value: impl Into<String>) -> Self {
        Response::Strings(vec![value.into()])
    }

    /// STRINGS response with duplicates dropped, first occurrence wins.
    pub fn strings(values: impl IntoIterator<Item = String>) -> Self {
        let mut unique: Vec<String> = Vec::new();
        for value in values {
            if !unique.contains(&value) {
                unique.push(value);
            }
        }
        Response::Strings(unique)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Response::Error {
            message: message.into(),
            can_continue: false,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error { .. })
    }

    /// Serialize the response to XML. Attribute order is part of the
    /// protocol surface and must not change.
    pub fn to_xml(&self) -> String {
        match self {
            Response::Strings(values) => strings_xml(values),
            Response::Fields(fields) => {
                let mut xml = String::from("<FIELDS>");
                for (name, value) in fields {
                    xml.push_str("<FIELD NAME=\"");
                    xml.push_str(&escape_xml(name));
                    xml.push_str("\" VALUE=\"");
                    xml.push_str(&escape_xml(value));
                    xml.push_str("\" />");
                }
                xml.push_str("</FIELDS>");
                xml
            }
            Response::Descs(descs) => {
                let mut xml = String::from("<DESCS>");
                for desc in descs {
                    xml.push_str(&desc.to_xml());
                }
                xml.push_str("</DESCS>");
                xml
            }
            Response::Error {
                message,
                can_continue,
            } => {
                let mut xml = String::from("<ERROR CONTINUE=\"");
                xml.push_str(if *can_continue { "1" } else { "0" });
                xml.push_str("\" MESSAGE=\"");
                xml.push_str(&escape_xml(message));
                xml.push_str("\" />");
                xml
            }
        }
    }

    /// Parse a response from its XML payload. The gateway never consumes
    /// responses itself; this exists for the engine side and for tests.
    pub fn parse(xml: &str) -> Result<Response> {
        use quick_xml::events::Event;

        #[derive(Clone, Copy, PartialEq)]
        enum Root {
            Strings,
            Fields,
            Descs,
            Error,
        }

        let mut reader = quick_xml::Reader::from_str(xml);
        let mut root: Option<Root> = None;
        let mut strings: Vec<String> = Vec::new();
        let mut fields: Vec<(String, String)> = Vec::new();
        let mut descs: Vec<Desc> = Vec::new();
        let mut current_desc: Option<Desc> = None;
        let mut error_message = String::new();
        let mut error_continue = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    let pairs = attribute_pairs(&e)?;
                    if root.is_none() {
                        match name.as_str() {
                            "STRINGS" => root = Some(Root::Strings),
                            "FIELDS" => root = Some(Root::Fields),
                            "DESCS" => root = Some(Root::Descs),
                            "ERROR" => {
                                error_continue =
                                    pair_value(&pairs, "CONTINUE").as_deref() == Some("1");
                                error_message = pair_value(&pairs, "MESSAGE").unwrap_or_default();
                                root = Some(Root::Error);
                            }
                            other => {
                                return Err(WireError::Xml(format!(
                                    "unknown response element: {}",
                                    other
                                )));
                            }
                        }
                        continue;
                    }
                    match (root, name.as_str()) {
                        (Some(Root::Strings), "STRING") => {
                            strings.push(pair_value(&pairs, "VALUE").unwrap_or_default());
                        }
                        (Some(Root::Fields), "FIELD") => {
                            fields.push((
                                pair_value(&pairs, "NAME").unwrap_or_default(),
                                pair_value(&pairs, "VALUE").unwrap_or_default(),
                            ));
                        }
                        (Some(Root::Descs), "DESC") => {
                            let access = match pair_value(&pairs, "ACCESS").as_deref() {
                                Some("0") | None => Access::Rw,
                                Some("1") => Access::Ro,
                                Some("2") => Access::ModDate,
                                Some("3") => Access::ModUser,
                                Some("4") => Access::DefectId,
                                Some(other) => {
                                    return Err(WireError::Xml(format!(
                                        "unknown ACCESS code: {}",
                                        other
                                    )))
                                }
                            };
                            let field_type = pair_value(&pairs, "TYPE")
                                .unwrap_or_default()
                                .parse::<FieldType>()
                                .map_err(|e| WireError::Xml(e.to_string()))?;
                            current_desc = Some(Desc::new(
                                pair_value(&pairs, "NAME").unwrap_or_default(),
                                field_type,
                                access,
                            ));
                        }
                        (Some(Root::Descs), "STRING") => {
                            if let Some(desc) = current_desc.as_mut() {
                                desc.values
                                    .get_or_insert_with(Vec::new)
                                    .push(pair_value(&pairs, "VALUE").unwrap_or_default());
                            }
                        }
                        _ => {}
                    }
                }
                Ok(Event::End(e)) => {
                    if e.name().as_ref() == b"DESC" {
                        if let Some(desc) = current_desc.take() {
                            descs.push(desc);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => return Err(WireError::Xml(e.to_string())),
            }
        }

        if let Some(desc) = current_desc.take() {
            descs.push(desc);
        }
        match root {
            Some(Root::Strings) => Ok(Response::Strings(strings)),
            Some(Root::Fields) => Ok(Response::Fields(fields)),
            Some(Root::Descs) => Ok(Response::Descs(descs)),
            Some(Root::Error) => Ok(Response::Error {
                message: error_message,
                can_continue: error_continue,
            }),
            None => Err(WireError::Xml("empty response document".to_string())),
        }
    }
}

fn attribute_pairs(element: &quick_xml::events::BytesStart<'_>) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    for attr in element.attributes() {
        let attr = attr.map_err(|err| WireError::Xml(err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr
            .unescape_value()
            .map_err(|err| WireError::Xml(err.to_string()))?
            .into_owned();
        pairs.push((key, value));
    }
    Ok(pairs)
}

fn pair_value(pairs: &[(String, String)], name: &str) -> Option<String> {
    pairs
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.clone())
}

fn strings_xml(values: &[String]) -> String {
    let mut xml = String::from("<STRINGS>");
    for value in values {
        xml.push_str("<STRING VALUE=\"");
        xml.push_str(&escape_xml(value));
        xml.push_str("\" />");
    }
    xml.push_str("</STRINGS>");
    xml
}

/// Escape a string for use in an XML attribute value.
pub fn escape_xml(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#039;"),
            '&' => result.push_str("&amp;"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
