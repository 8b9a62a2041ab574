//! Byte-for-byte transfer from a readable into a writable stream.
//!
//! Sources are small user downloads, so the copy reads one byte at a time and
//! favors correctness over throughput. Both ends are always released before
//! returning. Release is best-effort: closing happens on drop and any error
//! it raises is discarded, so it can never replace the copy's own error.

use std::io::{self, Read, Write};

/// Drains `source` into `dest`, then flushes `dest`. Returns the number of bytes copied.
pub fn copy_stream<R: Read, W: Write>(mut source: R, mut dest: W) -> io::Result<u64> {
  let result = transfer(&mut source, &mut dest);
  release(source);
  release(dest);
  result
}

/// Like [`copy_stream`], but opens the destination lazily. `source` is
/// released even when the destination cannot be opened.
pub fn copy_into<R, W, F>(source: R, open_dest: F) -> io::Result<u64>
where
  R: Read,
  W: Write,
  F: FnOnce() -> io::Result<W>,
{
  match open_dest() {
    Ok(dest) => copy_stream(source, dest),
    Err(e) => {
      release(source);
      Err(e)
    }
  }
}

fn transfer<R: Read, W: Write>(source: &mut R, dest: &mut W) -> io::Result<u64> {
  let mut byte = [0u8; 1];
  let mut copied = 0u64;
  loop {
    match source.read(&mut byte) {
      Ok(0) => break,
      Ok(_) => {
        dest.write_all(&byte)?;
        copied += 1;
      }
      Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
      Err(e) => return Err(e),
    }
  }
  // 部分 writer（如 Android 桥）在 flush 时才真正写出，失败必须作为主错误返回
  dest.flush()?;
  Ok(copied)
}

fn release<T>(stream: T) {
  drop(stream);
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Cursor;
  use std::sync::atomic::{AtomicBool, Ordering};
  use std::sync::Arc;

  /// Records when it is dropped.
  struct Tracked<T> {
    inner: T,
    dropped: Arc<AtomicBool>,
  }

  impl<T> Tracked<T> {
    fn new(inner: T) -> (Self, Arc<AtomicBool>) {
      let dropped = Arc::new(AtomicBool::new(false));
      (
        Self {
          inner,
          dropped: dropped.clone(),
        },
        dropped,
      )
    }
  }

  impl<T> Drop for Tracked<T> {
    fn drop(&mut self) {
      self.dropped.store(true, Ordering::SeqCst);
    }
  }

  impl<T: Read> Read for Tracked<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
      self.inner.read(buf)
    }
  }

  impl<T: Write> Write for Tracked<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
      self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
      self.inner.flush()
    }
  }

  /// Yields `good` bytes, then fails.
  struct BrokenReader {
    good: usize,
  }

  impl Read for BrokenReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
      if self.good == 0 {
        return Err(io::Error::new(io::ErrorKind::Other, "disk went away"));
      }
      self.good -= 1;
      buf[0] = b'x';
      Ok(1)
    }
  }

  struct FailingFlush(Vec<u8>);

  impl Write for FailingFlush {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
      self.0.extend_from_slice(buf);
      Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
      Err(io::Error::new(io::ErrorKind::BrokenPipe, "bridge rejected payload"))
    }
  }

  fn roundtrip(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let copied = copy_stream(Cursor::new(data.to_vec()), &mut out).unwrap();
    assert_eq!(copied, data.len() as u64);
    out
  }

  #[test]
  fn test_copy_empty_single_and_large() {
    assert!(roundtrip(b"").is_empty());
    assert_eq!(roundtrip(b"z"), b"z");

    let large: Vec<u8> = (0..70_000u32).map(|i| (i % 251) as u8).collect();
    assert_eq!(roundtrip(&large), large);
  }

  #[test]
  fn test_copy_into_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.bin");
    let copied = copy_into(Cursor::new(b"hello".to_vec()), || std::fs::File::create(&path)).unwrap();
    assert_eq!(copied, 5);
    assert_eq!(std::fs::read(&path).unwrap(), b"hello");
  }

  #[test]
  fn test_read_failure_releases_both_ends() {
    let (source, source_dropped) = Tracked::new(BrokenReader { good: 3 });
    let (dest, dest_dropped) = Tracked::new(Vec::new());

    let err = copy_stream(source, dest).unwrap_err();
    assert_eq!(err.to_string(), "disk went away");
    assert!(source_dropped.load(Ordering::SeqCst));
    assert!(dest_dropped.load(Ordering::SeqCst));
  }

  #[test]
  fn test_flush_failure_is_the_primary_error() {
    let err = copy_stream(Cursor::new(b"abc".to_vec()), FailingFlush(Vec::new())).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
  }

  #[test]
  fn test_unopenable_destination_releases_source() {
    let (source, source_dropped) = Tracked::new(Cursor::new(b"abc".to_vec()));
    let err = copy_into(source, || -> io::Result<Vec<u8>> {
      Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
    })
    .unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    assert!(source_dropped.load(Ordering::SeqCst));
  }
}
