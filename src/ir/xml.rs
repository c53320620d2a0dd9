//! Small XML adapter shared by the VOC and MVI codecs.
//!
//! Reading goes through `roxmltree`. Repeated child elements are always
//! returned as a `Vec`, whether the document has zero, one, or many of them,
//! so codec code never has to tell a single node apart from a list.

use std::path::Path;

use roxmltree::{Document, Node};

use crate::error::AnnoconvError;

/// Parses `xml`, rejecting anything that is not well-formed.
pub(crate) fn parse_document<'input>(
    xml: &'input str,
    path: &Path,
) -> Result<Document<'input>, AnnoconvError> {
    Document::parse(xml).map_err(|source| AnnoconvError::VocXmlParse {
        path: path.to_path_buf(),
        message: source.to_string(),
    })
}

/// Returns every direct child element named `tag`, in document order.
pub(crate) fn child_elements<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &str,
) -> Vec<Node<'a, 'input>> {
    node.children()
        .filter(|child| child.is_element() && child.tag_name().name() == tag)
        .collect()
}

pub(crate) fn child_element<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &str,
) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && child.tag_name().name() == tag)
}

pub(crate) fn required_child_element<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &str,
    path: &Path,
    context: &str,
) -> Result<Node<'a, 'input>, AnnoconvError> {
    child_element(node, tag).ok_or_else(|| AnnoconvError::VocXmlParse {
        path: path.to_path_buf(),
        message: format!("missing <{tag}> in {context}"),
    })
}

pub(crate) fn optional_child_text(node: Node<'_, '_>, tag: &str) -> Option<String> {
    child_element(node, tag)
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToOwned::to_owned)
}

pub(crate) fn required_child_text(
    node: Node<'_, '_>,
    tag: &str,
    path: &Path,
    context: &str,
) -> Result<String, AnnoconvError> {
    optional_child_text(node, tag).ok_or_else(|| AnnoconvError::VocXmlParse {
        path: path.to_path_buf(),
        message: format!("missing <{tag}> in {context}"),
    })
}

pub(crate) fn parse_required_u32(
    node: Node<'_, '_>,
    tag: &str,
    path: &Path,
    context: &str,
) -> Result<u32, AnnoconvError> {
    let raw = required_child_text(node, tag, path, context)?;
    raw.parse::<u32>().map_err(|_| AnnoconvError::VocXmlParse {
        path: path.to_path_buf(),
        message: format!("invalid <{tag}> value '{raw}' in {context}; expected u32"),
    })
}

pub(crate) fn parse_required_f64(
    node: Node<'_, '_>,
    tag: &str,
    path: &Path,
    context: &str,
) -> Result<f64, AnnoconvError> {
    let raw = required_child_text(node, tag, path, context)?;
    raw.parse::<f64>().map_err(|_| AnnoconvError::VocXmlParse {
        path: path.to_path_buf(),
        message: format!(
            "invalid <{tag}> value '{raw}' in {context}; expected floating-point number"
        ),
    })
}

/// Indenting XML writer producing the pretty layout VOC tools expect.
#[derive(Debug, Default)]
pub(crate) struct XmlWriter {
    out: String,
    depth: usize,
}

impl XmlWriter {
    pub(crate) fn new() -> Self {
        let mut writer = Self::default();
        writer.out.push_str("<?xml version=\"1.0\"?>\n");
        writer
    }

    pub(crate) fn open(&mut self, tag: &str) -> &mut Self {
        self.indent();
        self.out.push('<');
        self.out.push_str(tag);
        self.out.push_str(">\n");
        self.depth += 1;
        self
    }

    pub(crate) fn close(&mut self, tag: &str) -> &mut Self {
        self.depth = self.depth.saturating_sub(1);
        self.indent();
        self.out.push_str("</");
        self.out.push_str(tag);
        self.out.push_str(">\n");
        self
    }

    pub(crate) fn leaf(&mut self, tag: &str, value: impl std::fmt::Display) -> &mut Self {
        self.indent();
        self.out.push('<');
        self.out.push_str(tag);
        self.out.push('>');
        self.out.push_str(&xml_escape(&value.to_string()));
        self.out.push_str("</");
        self.out.push_str(tag);
        self.out.push_str(">\n");
        self
    }

    pub(crate) fn finish(self) -> String {
        self.out
    }

    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
    }
}

fn xml_escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
