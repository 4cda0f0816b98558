//! Streaming XML reader with a sticky error flag
//!
//! The reader drives the [`XmlElement`] protocol over an in-memory document.
//! Any failure latches: every subsequent read short-circuits with the latched
//! reason until the caller clears it or abandons the reader. A malformed
//! document therefore aborts the whole load with the first descriptive error.

use crate::codec::AttrMap;
use crate::element::XmlElement;
use crate::error::{Result, XmlIoError};
use quick_xml::events::Event;
use quick_xml::Reader;

pub struct XmlReader<'a> {
    inner: Reader<&'a [u8]>,
    error: Option<String>,
}

impl<'a> XmlReader<'a> {
    pub fn from_str(xml: &'a str) -> Self {
        let mut inner = Reader::from_str(xml);
        inner.config_mut().trim_text(true);
        Self { inner, error: None }
    }

    /// Whether a previous read failed
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Latch an error raised by a consumer (the collaborator-facing
    /// `raise_error` of the protocol)
    pub fn raise_error(&mut self, error: XmlIoError) -> XmlIoError {
        self.latch(error)
    }

    /// Reset the sticky flag; reading resumes at the current position
    pub fn clear_error(&mut self) {
        self.error = None;
    }

    fn guard(&self) -> Result<()> {
        match &self.error {
            Some(reason) => Err(XmlIoError::AlreadyFailed(reason.clone())),
            None => Ok(()),
        }
    }

    fn latch(&mut self, error: XmlIoError) -> XmlIoError {
        if !matches!(error, XmlIoError::AlreadyFailed(_)) {
            self.error = Some(error.to_string());
        }
        error
    }

    fn next_event(&mut self) -> Result<Event<'a>> {
        Ok(self.inner.read_event()?)
    }

    /// Scan forward to the next element start at the current level, skipping
    /// prolog, comments, and whitespace. Returns the tag's attributes and
    /// whether it was self-closing; `None` at end of input.
    pub fn next_element_start(&mut self) -> Result<Option<(AttrMap, bool)>> {
        self.guard()?;
        let result = self.next_element_start_inner();
        result.map_err(|e| self.latch(e))
    }

    fn next_element_start_inner(&mut self) -> Result<Option<(AttrMap, bool)>> {
        loop {
            match self.next_event()? {
                Event::Start(e) => return Ok(Some((AttrMap::from_start(&e)?, false))),
                Event::Empty(e) => return Ok(Some((AttrMap::from_start(&e)?, true))),
                Event::Eof | Event::End(_) => return Ok(None),
                _ => continue,
            }
        }
    }

    /// Read one element whose start tag has already been consumed: layered
    /// attribute consumption, then streamed child/text dispatch until the
    /// matching end tag.
    pub fn read_element_content(
        &mut self,
        element: &mut dyn XmlElement,
        attrs: AttrMap,
        is_empty: bool,
    ) -> Result<()> {
        self.guard()?;
        let result = self.read_element_content_inner(element, attrs, is_empty);
        result.map_err(|e| self.latch(e))
    }

    fn read_element_content_inner(
        &mut self,
        element: &mut dyn XmlElement,
        mut attrs: AttrMap,
        is_empty: bool,
    ) -> Result<()> {
        let tag = attrs.tag_name().to_string();
        element.consume_attributes(&mut attrs)?;
        if !element.allows_unknown_attributes() {
            attrs.finish()?;
        }
        if is_empty {
            return Ok(());
        }
        loop {
            match self.next_event()? {
                Event::Start(e) => {
                    let child = AttrMap::from_start(&e)?;
                    element.read_child(self, child, false)?;
                }
                Event::Empty(e) => {
                    let child = AttrMap::from_start(&e)?;
                    element.read_child(self, child, true)?;
                }
                Event::Text(t) => {
                    let text = t.unescape()?;
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        element.read_text(trimmed)?;
                    }
                }
                Event::CData(t) => {
                    let bytes = t.into_inner();
                    let text = std::str::from_utf8(&bytes)?;
                    if !text.trim().is_empty() {
                        element.read_text(text)?;
                    }
                }
                Event::End(e) => {
                    if e.name().as_ref() == tag.as_bytes() {
                        return Ok(());
                    }
                    // quick-xml's end-name checking catches mismatches
                    // before this; defend against it being disabled.
                    return Err(XmlIoError::UnexpectedChild {
                        parent: tag,
                        child: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                    });
                }
                Event::Eof => return Err(XmlIoError::UnexpectedEof { tag }),
                _ => continue,
            }
        }
    }

    /// Convenience: find the next start tag, require it to match the
    /// element, and read its content.
    pub fn read_element(&mut self, element: &mut dyn XmlElement) -> Result<()> {
        self.guard()?;
        let started = self.next_element_start()?;
        let (attrs, is_empty) = match started {
            Some(parts) => parts,
            None => {
                return Err(self.latch(XmlIoError::UnexpectedEof {
                    tag: element.tag_name().to_string(),
                }))
            }
        };
        if attrs.tag_name() != element.tag_name() {
            let err = XmlIoError::UnexpectedChild {
                parent: element.tag_name().to_string(),
                child: attrs.tag_name().to_string(),
            };
            return Err(self.latch(err));
        }
        self.read_element_content(element, attrs, is_empty)
    }

    /// Consume everything up to and including the end tag of an element
    /// whose start tag was already read
    pub fn skip_element(&mut self, tag: &str) -> Result<()> {
        self.guard()?;
        let result = self.skip_element_inner(tag);
        result.map_err(|e| self.latch(e))
    }

    fn skip_element_inner(&mut self, tag: &str) -> Result<()> {
        let mut depth = 1usize;
        loop {
            match self.next_event()? {
                Event::Start(_) => depth += 1,
                Event::End(_) => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Event::Eof => {
                    return Err(XmlIoError::UnexpectedEof {
                        tag: tag.to_string(),
                    })
                }
                _ => continue,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::AttrWriter;

    #[derive(Default)]
    struct Probe {
        bold: bool,
        children: Vec<String>,
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

        fn read_child(
            &mut self,
            reader: &mut XmlReader<'_>,
            attrs: AttrMap,
            is_empty: bool,
        ) -> Result<()> {
            if attrs.tag_name() != "Entry" {
                return Err(XmlIoError::UnexpectedChild {
                    parent: self.tag_name().to_string(),
                    child: attrs.tag_name().to_string(),
                });
            }
            let mut entry = attrs;
            self.children.push(entry.take_string("name", ""));
            entry.finish()?;
            if !is_empty {
                reader.skip_element("Entry")?;
            }
            Ok(())
        }
    }

    #[test]
    fn test_read_attributes_and_children() {
        let xml = r#"<Probe bold="true"><Entry name="a"/><Entry name="b"/></Probe>"#;
        let mut reader = XmlReader::from_str(xml);
        let mut probe = Probe::default();
        reader.read_element(&mut probe).unwrap();
        assert!(probe.bold);
        assert_eq!(probe.children, vec!["a", "b"]);
    }

    #[test]
    fn test_absent_attribute_resolves_to_default() {
        let mut reader = XmlReader::from_str("<Probe/>");
        let mut probe = Probe::default();
        reader.read_element(&mut probe).unwrap();
        assert!(!probe.bold);
    }

    #[test]
    fn test_unexpected_attribute_is_error() {
        let mut reader = XmlReader::from_str(r#"<Probe bogus="1"/>"#);
        let mut probe = Probe::default();
        let err = reader.read_element(&mut probe).unwrap_err();
        assert!(matches!(err, XmlIoError::UnexpectedAttribute { .. }));
    }

    #[test]
    fn test_unexpected_text_is_error() {
        let mut reader = XmlReader::from_str("<Probe>stray</Probe>");
        let mut probe = Probe::default();
        let err = reader.read_element(&mut probe).unwrap_err();
        assert!(matches!(err, XmlIoError::UnexpectedText { .. }));
    }

    #[test]
    fn test_whitespace_text_tolerated() {
        let mut reader = XmlReader::from_str("<Probe>\n  <Entry name=\"a\"/>\n</Probe>");
        let mut probe = Probe::default();
        reader.read_element(&mut probe).unwrap();
        assert_eq!(probe.children, vec!["a"]);
    }

    #[test]
    fn test_error_is_sticky() {
        let mut reader = XmlReader::from_str(r#"<Probe bold="maybe"/><Probe/>"#);
        let mut probe = Probe::default();
        assert!(reader.read_element(&mut probe).is_err());
        assert!(reader.has_error());
        // Subsequent reads fail with the latched reason, not fresh parses
        let err = reader.read_element(&mut probe).unwrap_err();
        assert!(matches!(err, XmlIoError::AlreadyFailed(_)));
        reader.clear_error();
        assert!(!reader.has_error());
    }

    #[test]
    fn test_unexpected_child_is_error() {
        let mut reader = XmlReader::from_str("<Probe><Wrong/></Probe>");
        let mut probe = Probe::default();
        let err = reader.read_element(&mut probe).unwrap_err();
        assert!(matches!(err, XmlIoError::UnexpectedChild { ref child, .. } if child == "Wrong"));
    }
}
