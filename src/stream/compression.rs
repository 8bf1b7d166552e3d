use std::io::{self, Read, Write};
use std::path::Path;

/// Compression format detected from file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Bzip2,
    Xz,
    Zstd,
}

impl Compression {
    /// Detect compression format from file extension
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("gz" | "gzip") => Compression::Gzip,
            Some("bz2" | "bzip2") => Compression::Bzip2,
            Some("xz" | "lzma") => Compression::Xz,
            Some("zst" | "zstd") => Compression::Zstd,
            _ => Compression::None,
        }
    }

    /// Wrap a reader with the appropriate decompressor
    pub fn wrap_reader<'a>(&self, reader: Box<dyn Read + 'a>) -> io::Result<Box<dyn Read + 'a>> {
        Ok(match self {
            Compression::None => reader,
            Compression::Gzip => Box::new(flate2::read::GzDecoder::new(reader)),
            Compression::Bzip2 => Box::new(bzip2::read::BzDecoder::new(reader)),
            Compression::Xz => Box::new(xz2::read::XzDecoder::new(reader)),
            Compression::Zstd => Box::new(zstd::stream::read::Decoder::new(reader)?),
        })
    }

    /// Wrap a writer with the matching compressor.
    ///
    /// The trailer of a compressed stream is only written by
    /// [`CompressedWriter::finish`]; dropping the writer without it loses
    /// any error from that final write.
    pub fn wrap_writer<W: Write>(&self, writer: W) -> io::Result<CompressedWriter<W>> {
        Ok(match self {
            Compression::None => CompressedWriter::Plain(writer),
            Compression::Gzip => CompressedWriter::Gzip(flate2::write::GzEncoder::new(
                writer,
                flate2::Compression::default(),
            )),
            Compression::Bzip2 => CompressedWriter::Bzip2(bzip2::write::BzEncoder::new(
                writer,
                bzip2::Compression::default(),
            )),
            Compression::Xz => CompressedWriter::Xz(xz2::write::XzEncoder::new(writer, 6)),
            Compression::Zstd => {
                CompressedWriter::Zstd(zstd::stream::write::Encoder::new(writer, 0)?)
            }
        })
    }
}

/// Writer returned by [`Compression::wrap_writer`]
pub enum CompressedWriter<W: Write> {
    Plain(W),
    Gzip(flate2::write::GzEncoder<W>),
    Bzip2(bzip2::write::BzEncoder<W>),
    Xz(xz2::write::XzEncoder<W>),
    Zstd(zstd::stream::write::Encoder<'static, W>),
}

impl<W: Write> CompressedWriter<W> {
    /// Write the compressed trailer, flush, and hand back the inner writer
    pub fn finish(self) -> io::Result<W> {
        let mut inner = match self {
            CompressedWriter::Plain(w) => w,
            CompressedWriter::Gzip(e) => e.finish()?,
            CompressedWriter::Bzip2(e) => e.finish()?,
            CompressedWriter::Xz(e) => e.finish()?,
            CompressedWriter::Zstd(e) => e.finish()?,
        };
        inner.flush()?;
        Ok(inner)
    }
}

impl<W: Write> Write for CompressedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            CompressedWriter::Plain(w) => w.write(buf),
            CompressedWriter::Gzip(e) => e.write(buf),
            CompressedWriter::Bzip2(e) => e.write(buf),
            CompressedWriter::Xz(e) => e.write(buf),
            CompressedWriter::Zstd(e) => e.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            CompressedWriter::Plain(w) => w.flush(),
            CompressedWriter::Gzip(e) => e.flush(),
            CompressedWriter::Bzip2(e) => e.flush(),
            CompressedWriter::Xz(e) => e.flush(),
            CompressedWriter::Zstd(e) => e.flush(),
        }
    }
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Compression::None => write!(f, "none"),
            Compression::Gzip => write!(f, "gzip"),
            Compression::Bzip2 => write!(f, "bzip2"),
            Compression::Xz => write!(f, "xz"),
            Compression::Zstd => write!(f, "zstd"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_from_path() {
        assert_eq!(Compression::from_path(&PathBuf::from("a.dat")), Compression::None);
        assert_eq!(Compression::from_path(&PathBuf::from("a.dat.GZ")), Compression::Gzip);
        assert_eq!(Compression::from_path(&PathBuf::from("a.bz2")), Compression::Bzip2);
        assert_eq!(Compression::from_path(&PathBuf::from("a.xz")), Compression::Xz);
        assert_eq!(Compression::from_path(&PathBuf::from("a.zst")), Compression::Zstd);
    }

    #[test]
    fn test_gzip_writer_then_reader() {
        let mut buf = Vec::new();
        {
            let mut w = Compression::Gzip.wrap_writer(&mut buf).unwrap();
            w.write_all(b"hello rows").unwrap();
            w.finish().unwrap();
        }
        let mut r = Compression::Gzip.wrap_reader(Box::new(&buf[..])).unwrap();
        let mut out = String::new();
        r.read_to_string(&mut out).unwrap();
        assert_eq!(out, "hello rows");
    }
}
