use embedded_io::{ErrorType, Read, Seek};

/// Named-resource byte store. This is the decoder's entire view of
/// storage; the host decides what a name maps to.
pub trait ByteStore: ErrorType {
    type Source<'a>: ByteSource
    where
        Self: 'a;

    /// Open a resource by name for sequential reading.
    fn open(&mut self, name: &str) -> Result<Self::Source<'_>, Self::Error>;
}

/// An open resource. Closed when dropped.
pub trait ByteSource: Read + Seek {
    /// Total size of the resource in bytes.
    fn size(&self) -> u64;
}
