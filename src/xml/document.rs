//! In-memory XML tree
//!
//! Documents are parsed leniently: mismatched or missing end tags, unknown
//! entities and truncated input are tolerated, and whatever could be read
//! up to that point is kept. Only a document without any element is an error.
//!
//! Text is kept verbatim. Whitespace-only text between child elements is
//! formatting and is dropped, so output can be re-indented.

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesDecl, BytesStart, Event};
use tracing::{debug, warn};

use crate::error::{ImportError, Result};

/// Child indices leading from the document element to a descendant element
pub type NodePath = Vec<usize>;

/// A node inside an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
}

/// An XML element with its attributes and children
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    /// Create an empty element
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Builder: add an attribute
    pub fn with_attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes.push((key.to_string(), value.to_string()));
        self
    }

    /// Builder: add a text child (empty text adds nothing)
    pub fn with_text(mut self, text: &str) -> Self {
        if !text.is_empty() {
            self.children.push(Node::Text(text.to_string()));
        }
        self
    }

    /// Builder: add a child element
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Append a child element, returning its index in `children`.
    ///
    /// Blank text left over from an empty `<X>\n</X>` is dropped first, the
    /// same way parsing drops it between child elements.
    pub fn push_child(&mut self, child: Element) -> usize {
        self.children.push(Node::Element(child));
        strip_formatting_in(self);
        self.children.len() - 1
    }

    /// Iterate over direct child elements
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            _ => None,
        })
    }

    /// First direct child element with the given name
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.child_elements().find(|el| el.name == name)
    }

    /// Concatenated text and CDATA of the direct children
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(t) | Node::CData(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Attribute value by name
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// The `<?xml ...?>` declaration of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub version: String,
    pub standalone: Option<String>,
}

impl Default for Declaration {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            standalone: None,
        }
    }
}

/// A parsed XML document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub declaration: Declaration,
    /// Comments appearing before the document element
    pub prolog: Vec<Node>,
    pub root: Element,
}

impl Document {
    /// Create a document around a document element
    pub fn new(root: Element) -> Self {
        Self {
            declaration: Declaration::default(),
            prolog: Vec::new(),
            root,
        }
    }

    /// Load a document from a file; invalid UTF-8 is replaced, not rejected
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::parse_str(&String::from_utf8_lossy(&bytes))
    }

    /// Parse a document from a string in recovering mode
    pub fn parse_str(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let config = reader.config_mut();
        config.check_end_names = false;
        config.allow_unmatched_ends = true;

        let mut builder = TreeBuilder::default();

        loop {
            match reader.read_event() {
                Ok(Event::Decl(ref d)) => builder.declaration = Some(declaration_from(d)),
                Ok(Event::Start(ref e)) => builder.stack.push(element_from(e)),
                Ok(Event::Empty(ref e)) => builder.attach(Node::Element(element_from(e))),
                Ok(Event::End(ref e)) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    builder.close(&name);
                }
                Ok(Event::Text(ref t)) => {
                    let text = match t.unescape() {
                        Ok(text) => text.into_owned(),
                        Err(e) => {
                            debug!("keeping raw text after unescape failure: {}", e);
                            String::from_utf8_lossy(t).into_owned()
                        }
                    };
                    if !text.is_empty() {
                        builder.attach(Node::Text(text));
                    }
                }
                Ok(Event::CData(c)) => {
                    let text = String::from_utf8_lossy(&c.into_inner()).into_owned();
                    builder.attach(Node::CData(text));
                }
                Ok(Event::Comment(ref c)) => {
                    builder.attach(Node::Comment(String::from_utf8_lossy(c).into_owned()));
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!(
                        "XML error at position {}, keeping what was read so far: {}",
                        reader.buffer_position(),
                        e
                    );
                    break;
                }
            }
        }

        builder.finish()
    }

    /// Path of the first element (pre-order) matching `predicate`
    pub fn find_element<P>(&self, predicate: P) -> Option<NodePath>
    where
        P: Fn(&Element) -> bool,
    {
        let mut path = Vec::new();
        find_in(&self.root, &predicate, &mut path).then_some(path)
    }

    /// Element at `path`
    pub fn element(&self, path: &[usize]) -> Option<&Element> {
        path.iter().try_fold(&self.root, |el, &idx| match el.children.get(idx) {
            Some(Node::Element(child)) => Some(child),
            _ => None,
        })
    }

    /// Mutable element at `path`
    pub fn element_mut(&mut self, path: &[usize]) -> Option<&mut Element> {
        let mut current = &mut self.root;
        for &idx in path {
            current = match current.children.get_mut(idx) {
                Some(Node::Element(child)) => child,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Append `child` under the element at `path` and return the child's path
    pub fn append_child(&mut self, path: &[usize], child: Element) -> Result<NodePath> {
        let parent = self.element_mut(path).ok_or_else(|| {
            ImportError::InvalidOperation(format!("no element at path {:?}", path))
        })?;
        let idx = parent.push_child(child);

        let mut child_path = path.to_vec();
        child_path.push(idx);
        Ok(child_path)
    }
}

fn find_in<P>(el: &Element, predicate: &P, path: &mut Vec<usize>) -> bool
where
    P: Fn(&Element) -> bool,
{
    if predicate(el) {
        return true;
    }
    for (idx, node) in el.children.iter().enumerate() {
        if let Node::Element(child) = node {
            path.push(idx);
            if find_in(child, predicate, path) {
                return true;
            }
            path.pop();
        }
    }
    false
}

/// Accumulates events into a tree, tolerating broken nesting
#[derive(Default)]
struct TreeBuilder {
    declaration: Option<Declaration>,
    prolog: Vec<Node>,
    stack: Vec<Element>,
    root: Option<Element>,
}

impl TreeBuilder {
    fn attach(&mut self, node: Node) {
        if let Some(parent) = self.stack.last_mut() {
            parent.children.push(node);
            return;
        }

        match node {
            Node::Element(el) if self.root.is_none() => self.root = Some(el),
            Node::Element(el) => warn!("ignoring extra top-level element <{}>", el.name),
            Node::Comment(_) if self.root.is_none() => self.prolog.push(node),
            Node::Text(text) if is_blank(&text) => {}
            _ => debug!("ignoring content outside the document element"),
        }
    }

    /// Close the innermost open element named `name`, implicitly closing
    /// anything opened after it. Unmatched end tags are ignored.
    fn close(&mut self, name: &str) {
        let Some(pos) = self.stack.iter().rposition(|el| el.name == name) else {
            debug!("ignoring unmatched end tag </{}>", name);
            return;
        };
        while self.stack.len() > pos {
            if let Some(el) = self.stack.pop() {
                if self.stack.len() > pos {
                    debug!("implicitly closing <{}>", el.name);
                }
                self.attach(Node::Element(strip_formatting(el)));
            }
        }
    }

    fn finish(mut self) -> Result<Document> {
        while let Some(el) = self.stack.pop() {
            debug!("closing unterminated <{}>", el.name);
            self.attach(Node::Element(strip_formatting(el)));
        }

        let root = self
            .root
            .ok_or_else(|| ImportError::XmlError("document has no root element".to_string()))?;

        Ok(Document {
            declaration: self.declaration.unwrap_or_default(),
            prolog: self.prolog,
            root,
        })
    }
}

fn is_blank(text: &str) -> bool {
    text.chars().all(char::is_whitespace)
}

/// Drop whitespace-only text from an element that has element children.
/// Leaf text, blank or not, is left untouched.
fn strip_formatting(mut el: Element) -> Element {
    strip_formatting_in(&mut el);
    el
}

fn strip_formatting_in(el: &mut Element) {
    if el.child_elements().next().is_some() {
        el.children
            .retain(|node| !matches!(node, Node::Text(text) if is_blank(text)));
    }
}

fn element_from(start: &BytesStart) -> Element {
    let mut el = Element::new(&String::from_utf8_lossy(start.name().as_ref()));
    for attr in start.attributes().with_checks(false).flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .unwrap_or_else(|_| Cow::Owned(String::from_utf8_lossy(&attr.value).into_owned()))
            .into_owned();
        el.attributes.push((key, value));
    }
    el
}

fn declaration_from(decl: &BytesDecl) -> Declaration {
    let version = decl
        .version()
        .map(|v| String::from_utf8_lossy(&v).into_owned())
        .unwrap_or_else(|_| "1.0".to_string());
    let standalone = decl
        .standalone()
        .and_then(|s| s.ok())
        .map(|s| String::from_utf8_lossy(&s).into_owned());
    Declaration { version, standalone }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_document() {
        let doc = Document::parse_str(
            r#"<?xml version="1.0" encoding="utf-8" standalone="yes"?>
            <KeePassFile><Root><Group><Name>General</Name></Group></Root></KeePassFile>"#,
        )
        .unwrap();

        assert_eq!(doc.declaration.version, "1.0");
        assert_eq!(doc.declaration.standalone.as_deref(), Some("yes"));
        assert_eq!(doc.root.name, "KeePassFile");

        let group = doc.element(&[0, 0]).unwrap();
        assert_eq!(group.name, "Group");
        assert_eq!(group.child("Name").unwrap().text(), "General");
    }

    #[test]
    fn test_parse_attributes_and_entities() {
        let doc = Document::parse_str(
            r#"<String><Key>Password</Key><Value ProtectInMemory="True">a&amp;b &lt;c&gt;</Value></String>"#,
        )
        .unwrap();

        let value = doc.root.child("Value").unwrap();
        assert_eq!(value.attribute("ProtectInMemory"), Some("True"));
        assert_eq!(value.text(), "a&b <c>");
    }

    #[test]
    fn test_parse_keeps_leaf_whitespace() {
        let doc = Document::parse_str(
            "<String>\n  <Key>Password</Key>\n  <Value>  secret  </Value>\n  \
             <Notes>line1\n</Notes>\n  <Blank>   </Blank>\n</String>\n",
        )
        .unwrap();

        assert_eq!(doc.root.children.len(), 4);
        assert_eq!(doc.root.child("Value").unwrap().text(), "  secret  ");
        assert_eq!(doc.root.child("Notes").unwrap().text(), "line1\n");
        assert_eq!(doc.root.child("Blank").unwrap().text(), "   ");
    }

    #[test]
    fn test_parse_drops_formatting_in_unclosed_elements() {
        let doc = Document::parse_str("<Root>\n  <Group>\n    <Name> Open </Name>\n").unwrap();
        let group = doc.root.child("Group").unwrap();
        assert_eq!(doc.root.children.len(), 1);
        assert_eq!(group.children.len(), 1);
        assert_eq!(group.child("Name").unwrap().text(), " Open ");
    }

    #[test]
    fn test_parse_recovers_from_unclosed_elements() {
        let doc = Document::parse_str("<Root><Group><Name>Open</Name>").unwrap();
        let group = doc.root.child("Group").unwrap();
        assert_eq!(group.child("Name").unwrap().text(), "Open");
    }

    #[test]
    fn test_parse_recovers_from_mismatched_end_tags() {
        let doc = Document::parse_str("<Root><A><B>text</A><C/></Root>").unwrap();
        let a = doc.root.child("A").unwrap();
        assert_eq!(a.child("B").unwrap().text(), "text");
        assert!(doc.root.child("C").is_some());
    }

    #[test]
    fn test_parse_ignores_stray_end_tags() {
        let doc = Document::parse_str("<Root></Stray><A/></Root>").unwrap();
        assert!(doc.root.child("A").is_some());
    }

    #[test]
    fn test_parse_keeps_unknown_entities_raw() {
        let doc = Document::parse_str("<Root>a&nbsp;b</Root>").unwrap();
        assert_eq!(doc.root.text(), "a&nbsp;b");
    }

    #[test]
    fn test_parse_keeps_cdata_and_comments() {
        let doc = Document::parse_str("<!-- header --><Root><![CDATA[x < y]]><!-- c --></Root>").unwrap();
        assert_eq!(doc.prolog, vec![Node::Comment(" header ".to_string())]);
        assert_eq!(doc.root.text(), "x < y");
        assert!(matches!(doc.root.children[1], Node::Comment(_)));
    }

    #[test]
    fn test_parse_without_element_fails() {
        assert!(matches!(
            Document::parse_str("just text"),
            Err(ImportError::XmlError(_))
        ));
        assert!(Document::parse_str("").is_err());
    }

    #[test]
    fn test_find_element_pre_order() {
        let doc = Document::parse_str(
            "<R><A><X id=\"1\"/></A><X id=\"2\"/></R>",
        )
        .unwrap();
        let path = doc.find_element(|el| el.name == "X").unwrap();
        assert_eq!(path, vec![0, 0]);
        assert_eq!(doc.element(&path).unwrap().attribute("id"), Some("1"));

        assert!(doc.find_element(|el| el.name == "Missing").is_none());
        assert_eq!(doc.find_element(|el| el.name == "R"), Some(vec![]));
    }

    #[test]
    fn test_append_child() {
        let mut doc = Document::new(Element::new("Root").with_child(Element::new("Group")));
        let path = doc
            .append_child(&[0], Element::new("Entry").with_text("e"))
            .unwrap();
        assert_eq!(path, vec![0, 0]);
        assert_eq!(doc.element(&path).unwrap().text(), "e");

        assert!(doc.append_child(&[5], Element::new("Entry")).is_err());
    }

    #[test]
    fn test_append_child_replaces_blank_text() {
        let mut doc = Document::parse_str("<R>\n  <Root>\n  </Root>\n</R>").unwrap();
        assert_eq!(doc.root.children.len(), 1);
        assert_eq!(doc.element(&[0]).unwrap().children.len(), 1);

        let path = doc.append_child(&[0], Element::new("Group")).unwrap();
        assert_eq!(path, vec![0, 0]);
        assert_eq!(doc.element(&[0]).unwrap().children.len(), 1);
    }

    #[test]
    fn test_element_path_through_text_is_none() {
        let doc = Document::parse_str("<R>text<A/></R>").unwrap();
        assert!(doc.element(&[0]).is_none());
        assert_eq!(doc.element(&[1]).unwrap().name, "A");
    }
}
