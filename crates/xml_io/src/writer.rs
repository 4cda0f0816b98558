//! Streaming XML writer for the structured element protocol

use crate::codec::AttrWriter;
use crate::element::XmlElement;
use crate::error::Result;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;

/// Writer driving the [`XmlElement`] protocol over any byte sink.
///
/// The sink is type-erased so that element implementations stay object-safe;
/// child writing recurses through the same writer.
pub struct XmlWriter<'a> {
    inner: Writer<&'a mut dyn Write>,
}

impl<'a> XmlWriter<'a> {
    pub fn new(sink: &'a mut dyn Write) -> Self {
        Self {
            inner: Writer::new(sink),
        }
    }

    /// Indented variant for human-readable output
    pub fn new_indented(sink: &'a mut dyn Write) -> Self {
        Self {
            inner: Writer::new_with_indent(sink, b' ', 2),
        }
    }

    /// Write one element: start tag, composed attributes, text, children,
    /// end tag. Childless, textless elements emit a self-closing tag.
    pub fn write_element(&mut self, element: &dyn XmlElement) -> Result<()> {
        let mut attrs = AttrWriter::new();
        element.contribute_attributes(&mut attrs);

        let mut start = BytesStart::new(element.tag_name().to_string());
        for (name, value) in attrs.pairs() {
            start.push_attribute((name.as_str(), value.as_str()));
        }

        let text = element.character_data();
        if text.is_none() && !element.has_children() {
            self.inner.write_event(Event::Empty(start))?;
            return Ok(());
        }

        let end = BytesEnd::new(element.tag_name().to_string());
        self.inner.write_event(Event::Start(start))?;
        if let Some(text) = text {
            self.inner.write_event(Event::Text(BytesText::new(&text)))?;
        }
        element.write_children(self)?;
        self.inner.write_event(Event::End(end))?;
        Ok(())
    }

    /// Self-closing child with explicit attributes; used for the sparse
    /// override children of the table frame format.
    pub fn write_empty_child(&mut self, tag: &str, attrs: &AttrWriter) -> Result<()> {
        let mut start = BytesStart::new(tag.to_string());
        for (name, value) in attrs.pairs() {
            start.push_attribute((name.as_str(), value.as_str()));
        }
        self.inner.write_event(Event::Empty(start))?;
        Ok(())
    }
}

/// Serialize a single element to a string; the common in-memory path
pub fn element_to_string(element: &dyn XmlElement) -> Result<String> {
    let mut buffer: Vec<u8> = Vec::new();
    {
        let mut writer = XmlWriter::new(&mut buffer);
        writer.write_element(element)?;
    }
    Ok(String::from_utf8(buffer).expect("writer emits UTF-8"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::AttrMap;

    struct Probe {
        bold: bool,
    }

    impl XmlElement for Probe {
        fn tag_name(&self) -> &str {
            "Probe"
        }

        fn contribute_attributes(&self, attrs: &mut AttrWriter) {
            attrs.push_bool("bold", self.bold, false);
        }

        fn consume_attributes(&mut self, attrs: &mut AttrMap) -> Result<()> {
            self.bold = attrs.take_bool("bold", false)?;
            Ok(())
        }
    }

    #[test]
    fn test_childless_element_self_closes() {
        let xml = element_to_string(&Probe { bold: true }).unwrap();
        assert_eq!(xml, r#"<Probe bold="true"/>"#);
    }

    #[test]
    fn test_default_valued_attribute_omitted() {
        let xml = element_to_string(&Probe { bold: false }).unwrap();
        assert_eq!(xml, "<Probe/>");
    }
}
