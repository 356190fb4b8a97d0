//! Indented XML output

use std::io::{Cursor, Write};

use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use super::document::{Document, Element, Node};
use crate::error::{ImportError, Result};

/// Indentation width used for every written document
pub const INDENT_SIZE: usize = 2;

/// Write `doc` as UTF-8 XML with two-space indentation and a trailing newline
pub fn write_document<W: Write>(mut w: W, doc: &Document) -> Result<()> {
    let mut writer = Writer::new_with_indent(&mut w, b' ', INDENT_SIZE);

    writer
        .write_event(Event::Decl(BytesDecl::new(
            &doc.declaration.version,
            Some("UTF-8"),
            doc.declaration.standalone.as_deref(),
        )))
        .map_err(xml)?;

    for node in &doc.prolog {
        write_node(&mut writer, node)?;
    }
    write_element(&mut writer, &doc.root)?;

    w.write_all(b"\n")?;
    Ok(())
}

/// Serialize `doc` into a string
pub fn to_string(doc: &Document) -> Result<String> {
    let mut cursor = Cursor::new(Vec::new());
    write_document(&mut cursor, doc)?;
    String::from_utf8(cursor.into_inner()).map_err(xml)
}

fn write_element<W: Write>(writer: &mut Writer<W>, el: &Element) -> Result<()> {
    let mut start = BytesStart::new(el.name.as_str());
    for (key, value) in &el.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if el.children.is_empty() {
        writer.write_event(Event::Empty(start)).map_err(xml)?;
        return Ok(());
    }

    writer.write_event(Event::Start(start)).map_err(xml)?;
    for child in &el.children {
        write_node(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(el.name.as_str())))
        .map_err(xml)?;
    Ok(())
}

fn write_node<W: Write>(writer: &mut Writer<W>, node: &Node) -> Result<()> {
    match node {
        Node::Element(el) => write_element(writer, el),
        Node::Text(text) => writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml),
        Node::CData(text) => writer
            .write_event(Event::CData(BytesCData::new(text.as_str())))
            .map_err(xml),
        Node::Comment(text) => writer
            .write_event(Event::Comment(BytesText::from_escaped(text.as_str())))
            .map_err(xml),
    }
}

fn xml<E: std::fmt::Display>(e: E) -> ImportError {
    ImportError::XmlError(e.to_string())
}
