//! Streaming file digests with bounded memory.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use timeblocks_core::{Digest, HashAlgorithm};

/// Size of each read when digesting a file.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Hashes files in fixed-size chunks, so memory use does not grow with file size.
#[derive(Debug, Clone, Copy)]
pub struct FileDigester {
    chunk_size: usize,
}

impl FileDigester {
    /// A digester reading [`CHUNK_SIZE`] bytes at a time.
    pub fn new() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
        }
    }

    /// Override the chunk size. Zero is treated as one byte.
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// Digest the file at `path`.
    pub fn digest(&self, path: &Path, algorithm: HashAlgorithm) -> io::Result<Digest> {
        let file = File::open(path)?;
        self.digest_reader(file, algorithm)
    }

    /// Digest everything `reader` yields.
    pub fn digest_reader<R: Read>(&self, mut reader: R, algorithm: HashAlgorithm) -> io::Result<Digest> {
        let mut hasher = algorithm.hasher();
        let mut buf = vec![0u8; self.chunk_size];
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buf[..n]);
        }
        Ok(hasher.finalize())
    }
}

impl Default for FileDigester {
    fn default() -> Self {
        Self::new()
    }
}
