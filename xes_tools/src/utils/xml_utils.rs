/// Either an owned [`quick_xml::Writer`] or a mutable reference to one
///
/// Lets the exporters accept both a plain [`std::io::Write`] and an already configured XML writer
/// (e.g., one created with [`quick_xml::Writer::new_with_indent`]).
#[allow(missing_debug_implementations)]
pub enum XMLWriterWrapper<'a, W> {
    /// Owned [`quick_xml::Writer`]
    Owned(quick_xml::Writer<W>),
    /// Mutable Reference to [`quick_xml::Writer`]
    Ref(&'a mut quick_xml::Writer<W>),
}

impl<W> XMLWriterWrapper<'_, W> {
    /// Return a mutable reference to the wrapped [`quick_xml::Writer`]
    pub fn to_xml_writer(&mut self) -> &mut quick_xml::Writer<W> {
        match self {
            XMLWriterWrapper::Owned(w) => w,
            XMLWriterWrapper::Ref(w) => w,
        }
    }
}

impl<W: std::io::Write> From<W> for XMLWriterWrapper<'_, W> {
    fn from(w: W) -> Self {
        Self::Owned(quick_xml::Writer::new(w))
    }
}

impl<'a, W> From<&'a mut quick_xml::Writer<W>> for XMLWriterWrapper<'a, W> {
    fn from(w: &'a mut quick_xml::Writer<W>) -> Self {
        Self::Ref(w)
    }
}
