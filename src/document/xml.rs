//! XML reading and writing for model documents.

use std::io::Cursor;

use indexmap::IndexMap;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use super::error::DocumentError;
use super::{Document, Element, Prolog, XmlDeclaration};

// ============================================================================
// READER
// ============================================================================

pub(super) fn read(input: &str) -> Result<Document, DocumentError> {
    let mut reader = Reader::from_reader(input.as_bytes());
    reader.config_mut().trim_text(false);

    let mut prolog = Prolog::default();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                stack.push(start_element(e)?);
            }
            Ok(Event::Empty(ref e)) => {
                let element = start_element(e)?;
                close_element(element, &mut stack, &mut root)?;
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| DocumentError::xml("Unexpected closing tag"))?;
                close_element(element, &mut stack, &mut root)?;
            }
            Ok(Event::Text(ref e)) => {
                if let Some(top) = stack.last_mut() {
                    let text = e
                        .unescape()
                        .map_err(|e| DocumentError::xml(format!("Text error: {e}")))?;
                    top.text.push_str(&text);
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Some(top) = stack.last_mut() {
                    let text = std::str::from_utf8(e)
                        .map_err(|e| DocumentError::xml(format!("CDATA error: {e}")))?;
                    top.text.push_str(text);
                }
            }
            Ok(Event::Decl(ref e)) if stack.is_empty() && root.is_none() => {
                prolog.declaration = Some(read_declaration(e)?);
            }
            Ok(Event::DocType(ref e)) if stack.is_empty() && root.is_none() => {
                let doctype = std::str::from_utf8(e)
                    .map_err(|e| DocumentError::xml(format!("DOCTYPE error: {e}")))?;
                prolog.doctype = Some(doctype.trim().to_string());
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(DocumentError::xml(format!(
                    "XML parse error at position {}: {e}",
                    reader.error_position()
                )));
            }
            // Comments and processing instructions have no place in the tree.
            Ok(Event::Comment(_) | Event::PI(_)) => {}
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(DocumentError::xml(format!("Unclosed element <{}>", open.tag)));
    }
    let root = root.ok_or_else(|| DocumentError::invalid("Document has no root element"))?;
    Ok(Document { prolog, root })
}

fn start_element(e: &BytesStart<'_>) -> Result<Element, DocumentError> {
    let tag = std::str::from_utf8(e.name().as_ref())
        .map_err(|e| DocumentError::xml(format!("Invalid tag name: {e}")))?
        .to_string();

    let mut attributes = IndexMap::new();
    for attr_result in e.attributes() {
        let attr = attr_result.map_err(|e| DocumentError::xml(format!("Attribute error: {e}")))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| DocumentError::xml(format!("Attribute key error: {e}")))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| DocumentError::xml(format!("Attribute value error: {e}")))?
            .to_string();
        attributes.insert(key, value);
    }

    Ok(Element {
        tag,
        attributes,
        text: String::new(),
        children: Vec::new(),
    })
}

/// Attach a finished element to its parent, or make it the root.
fn close_element(
    mut element: Element,
    stack: &mut [Element],
    root: &mut Option<Element>,
) -> Result<(), DocumentError> {
    // Indentation between child elements is not content.
    if !element.children.is_empty() && element.text.trim().is_empty() {
        element.text.clear();
    }
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(DocumentError::invalid("Document has more than one root element")),
    }
    Ok(())
}

fn read_declaration(e: &BytesDecl<'_>) -> Result<XmlDeclaration, DocumentError> {
    let version = e
        .version()
        .map_err(|e| DocumentError::xml(format!("Declaration error: {e}")))?;
    let version = String::from_utf8_lossy(&version).into_owned();
    let encoding = e
        .encoding()
        .transpose()
        .map_err(|e| DocumentError::xml(format!("Declaration error: {e}")))?
        .map(|value| String::from_utf8_lossy(&value).into_owned());
    let standalone = e
        .standalone()
        .transpose()
        .map_err(|e| DocumentError::xml(format!("Declaration error: {e}")))?
        .map(|value| String::from_utf8_lossy(&value).into_owned());
    Ok(XmlDeclaration {
        version,
        encoding,
        standalone,
    })
}

// ============================================================================
// WRITER
// ============================================================================

pub(super) fn write(document: &Document) -> Result<String, DocumentError> {
    let mut buffer = Cursor::new(Vec::new());
    let mut writer = Writer::new_with_indent(&mut buffer, b' ', 2);

    if let Some(declaration) = &document.prolog.declaration {
        writer
            .write_event(Event::Decl(BytesDecl::new(
                &declaration.version,
                declaration.encoding.as_deref(),
                declaration.standalone.as_deref(),
            )))
            .map_err(|e| DocumentError::xml(format!("Write error: {e}")))?;
    }
    if let Some(doctype) = &document.prolog.doctype {
        writer
            .write_event(Event::DocType(BytesText::from_escaped(doctype.as_str())))
            .map_err(|e| DocumentError::xml(format!("Write error: {e}")))?;
    }

    write_element(&mut writer, &document.root)?;

    let mut output = buffer.into_inner();
    output.push(b'\n');
    String::from_utf8(output).map_err(|e| DocumentError::xml(format!("Write error: {e}")))
}

fn write_element<W: std::io::Write>(writer: &mut Writer<W>, element: &Element) -> Result<(), DocumentError> {
    let mut start = BytesStart::new(element.tag.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.text.is_empty() && element.children.is_empty() {
        writer
            .write_event(Event::Empty(start))
            .map_err(|e| DocumentError::xml(format!("Write error: {e}")))?;
        return Ok(());
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| DocumentError::xml(format!("Write error: {e}")))?;
    if !element.text.is_empty() {
        writer
            .write_event(Event::Text(BytesText::new(&element.text)))
            .map_err(|e| DocumentError::xml(format!("Write error: {e}")))?;
    }
    for child in &element.children {
        write_element(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.tag.as_str())))
        .map_err(|e| DocumentError::xml(format!("Write error: {e}")))?;
    Ok(())
}
