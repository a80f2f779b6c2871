use std::io::{BufRead, BufReader, BufWriter, Write};

/// Opens `input` for buffered reading. `stdin` reads standard input and
/// a `.gz` extension is decompressed on the fly.
///
/// ```
/// use std::io::BufRead;
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("seqs.fa");
/// std::fs::write(&path, ">a\nACGT\n>b\nAC-T\n").unwrap();
///
/// let reader = divmsa::reader(path.to_str().unwrap()).unwrap();
/// assert_eq!(reader.lines().count(), 4);
/// ```
pub fn reader(input: &str) -> std::io::Result<Box<dyn BufRead>> {
    let reader: Box<dyn BufRead> = if input == "stdin" {
        Box::new(BufReader::new(std::io::stdin()))
    } else {
        let path = std::path::Path::new(input);
        let file = std::fs::File::open(path).map_err(|e| {
            std::io::Error::new(e.kind(), format!("could not open {}: {}", path.display(), e))
        })?;

        if path.extension() == Some(std::ffi::OsStr::new("gz")) {
            Box::new(BufReader::new(flate2::read::MultiGzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        }
    };

    Ok(reader)
}

/// Opens `output` for buffered writing, `stdout` for screen.
pub fn writer(output: &str) -> std::io::Result<Box<dyn Write>> {
    let writer: Box<dyn Write> = if output == "stdout" {
        Box::new(BufWriter::new(std::io::stdout()))
    } else {
        let file = std::fs::File::create(output).map_err(|e| {
            std::io::Error::new(e.kind(), format!("could not create {}: {}", output, e))
        })?;
        Box::new(BufWriter::new(file))
    };

    Ok(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use std::io::Read;
    use tempfile::tempdir;

    #[test]
    fn test_reader_plain_and_gz() {
        let dir = tempdir().unwrap();

        let plain = dir.path().join("seqs.fa");
        std::fs::write(&plain, ">s1\nACGT\n").unwrap();

        let gz = dir.path().join("seqs.fa.gz");
        {
            let file = std::fs::File::create(&gz).unwrap();
            let mut encoder = GzEncoder::new(file, flate2::Compression::default());
            encoder.write_all(b">s1\nACGT\n").unwrap();
            encoder.finish().unwrap();
        }

        for path in [&plain, &gz] {
            let mut content = String::new();
            reader(path.to_str().unwrap())
                .unwrap()
                .read_to_string(&mut content)
                .unwrap();
            assert_eq!(content, ">s1\nACGT\n");
        }
    }

    #[test]
    fn test_reader_missing_file() {
        let err = reader("does/not/exist.fa").err().unwrap();
        assert!(err.to_string().contains("could not open"));
    }

    #[test]
    fn test_writer_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.txt");
        {
            let mut w = writer(path.to_str().unwrap()).unwrap();
            w.write_all(b"hello\n").unwrap();
        }
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello\n");
    }
}
