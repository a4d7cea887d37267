use std::fs::File;
use std::path::PathBuf;

use embedded_io::{ErrorType, Read, Seek, SeekFrom};
use shackclock_core::store::{ByteSource, ByteStore};

/// Byte store over a directory of files; resource names are file names
/// relative to the root.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl ErrorType for FileStore {
    type Error = std::io::Error;
}

impl ByteStore for FileStore {
    type Source<'a>
        = FileSource
    where
        Self: 'a;

    fn open(&mut self, name: &str) -> Result<FileSource, Self::Error> {
        let file = File::open(self.root.join(name))?;
        let size = file.metadata()?.len();
        Ok(FileSource { file, size })
    }
}

pub struct FileSource {
    file: File,
    size: u64,
}

impl ErrorType for FileSource {
    type Error = std::io::Error;
}

impl Read for FileSource {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        std::io::Read::read(&mut self.file, buf)
    }
}

impl Seek for FileSource {
    fn seek(&mut self, pos: SeekFrom) -> Result<u64, Self::Error> {
        let pos = match pos {
            SeekFrom::Start(n) => std::io::SeekFrom::Start(n),
            SeekFrom::Current(n) => std::io::SeekFrom::Current(n),
            SeekFrom::End(n) => std::io::SeekFrom::End(n),
        };
        std::io::Seek::seek(&mut self.file, pos)
    }
}

impl ByteSource for FileSource {
    fn size(&self) -> u64 {
        self.size
    }
}
