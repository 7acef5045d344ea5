use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::{Reader, Writer};

use crate::config::{SplitKind, SplitSettings};
use crate::error::ProcessorError;

/// Streams a large XML document into smaller, well-formed documents.
///
/// Every chunk repeats the prolog and the root start tag of the input, holds
/// a run of whole top-level elements and is closed with the root end tag.
pub struct XmlSplitter {
    settings: SplitSettings,
}

impl XmlSplitter {
    pub fn new(settings: SplitSettings) -> Self {
        Self { settings }
    }

    /// Split `input` into `<stem>_<n>.xml` files inside `chunk_dir`, numbered
    /// from zero, and return their paths in order.
    pub fn split(&self, input: &Path, chunk_dir: &Path) -> Result<Vec<PathBuf>, ProcessorError> {
        let stem = input
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| ProcessorError::Split(format!("cannot name chunks of {:?}", input)))?;
        let file = File::open(input).map_err(|e| {
            ProcessorError::Split(format!("Failed to open {} for splitting: {}", input.display(), e))
        })?;
        fs::create_dir_all(chunk_dir).map_err(|e| {
            ProcessorError::Split(format!("Failed to create chunk directory: {}", e))
        })?;

        tracing::info!(
            "Splitting {} by {:?} ({}) into {}",
            input.display(),
            self.settings.kind,
            self.settings.size,
            chunk_dir.display()
        );
        let mut paths = Vec::new();
        self.split_into(BufReader::new(file), |chunk| {
            let path = chunk_dir.join(format!("{}_{}.xml", stem, paths.len()));
            fs::write(&path, chunk).map_err(|e| {
                ProcessorError::Split(format!("Failed to write chunk {}: {}", path.display(), e))
            })?;
            tracing::debug!("Wrote chunk {} ({} bytes)", path.display(), chunk.len());
            paths.push(path);
            Ok(())
        })?;
        tracing::info!("Split {} into {} chunk(s)", input.display(), paths.len());
        Ok(paths)
    }

    /// Hand every finished chunk to `emit`; returns the number of chunks.
    pub fn split_into<R, F>(&self, source: R, mut emit: F) -> Result<usize, ProcessorError>
    where
        R: BufRead,
        F: FnMut(&[u8]) -> Result<(), ProcessorError>,
    {
        let mut reader = Reader::from_reader(source);
        let mut buf = Vec::new();

        let mut header = Writer::new(Vec::new());
        let root = loop {
            buf.clear();
            match reader.read_event_into(&mut buf).map_err(malformed)? {
                Event::Start(start) => {
                    let name = start.name().as_ref().to_vec();
                    copy(&mut header, Event::Start(start))?;
                    break name;
                }
                Event::Empty(_) => {
                    tracing::warn!("Root element has no content, nothing to split");
                    return Ok(0);
                }
                Event::Eof => return Err(ProcessorError::Split("input has no root element".into())),
                event => copy(&mut header, event)?,
            }
        };
        let header = header.into_inner();
        let mut footer = b"</".to_vec();
        footer.extend_from_slice(&root);
        footer.push(b'>');

        let mut body = Writer::new(Vec::new());
        let mut depth = 0usize;
        let mut elements = 0usize;
        let mut chunks = 0usize;
        loop {
            buf.clear();
            let event = reader.read_event_into(&mut buf).map_err(malformed)?;
            let completes_element = match &event {
                Event::Start(_) => {
                    depth += 1;
                    false
                }
                Event::End(_) if depth == 0 => break,
                Event::End(_) => {
                    depth -= 1;
                    depth == 0
                }
                Event::Empty(_) => depth == 0,
                Event::Eof => {
                    return Err(ProcessorError::Split(
                        "input ended before the root element was closed".into(),
                    ))
                }
                _ => false,
            };
            copy(&mut body, event)?;

            if completes_element {
                elements += 1;
                if self.is_full(elements, body.get_ref().len()) {
                    emit(&assemble(&header, body.get_ref(), &footer))?;
                    chunks += 1;
                    elements = 0;
                    body = Writer::new(Vec::new());
                }
            }
        }
        if elements > 0 {
            emit(&assemble(&header, body.get_ref(), &footer))?;
            chunks += 1;
        }
        Ok(chunks)
    }

    fn is_full(&self, elements: usize, body_len: usize) -> bool {
        match self.settings.kind {
            SplitKind::ElementCount => elements >= self.settings.size,
            SplitKind::FileSize => body_len >= self.settings.size * 1000,
        }
    }
}

fn malformed(error: quick_xml::Error) -> ProcessorError {
    ProcessorError::Split(format!("malformed input: {}", error))
}

fn copy<W: Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<(), ProcessorError> {
    writer
        .write_event(event)
        .map_err(|e| ProcessorError::Split(format!("cannot copy XML event: {}", e)))
}

fn assemble(header: &[u8], body: &[u8], footer: &[u8]) -> Vec<u8> {
    let mut chunk = Vec::with_capacity(header.len() + body.len() + footer.len());
    chunk.extend_from_slice(header);
    chunk.extend_from_slice(body);
    chunk.extend_from_slice(footer);
    chunk
}

#[cfg(test)]
mod tests {
    use super::*;

    const INPUT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- catalogue -->
<items xmlns="http://example.com/items" source="test">
  <item id="1"><name>One</name></item>
  <item id="2"/>
  <item id="3"><name>Three &amp; more</name></item>
</items>
"#;

    fn settings(kind: SplitKind, size: usize) -> SplitSettings {
        SplitSettings {
            kind,
            size,
            input_directory: "inputchunks".into(),
            output_directory: "outputchunks".into(),
        }
    }

    fn chunks(kind: SplitKind, size: usize, input: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        XmlSplitter::new(settings(kind, size))
            .split_into(input.as_bytes(), |chunk| {
                chunks.push(String::from_utf8(chunk.to_vec()).unwrap());
                Ok(())
            })
            .unwrap();
        chunks
    }

    #[test]
    fn test_split_by_element_count() {
        let chunks = chunks(SplitKind::ElementCount, 2, INPUT);
        assert_eq!(chunks.len(), 2);
        for chunk in &chunks {
            assert!(chunk.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
            assert!(chunk.contains("<!-- catalogue -->"));
            assert!(chunk.contains(r#"<items xmlns="http://example.com/items" source="test">"#));
            assert!(chunk.ends_with("</items>"));
            assert!(chunk.parse::<crate::path::DataDocument>().is_ok());
        }
        assert!(chunks[0].contains(r#"<item id="1">"#));
        assert!(chunks[0].contains(r#"<item id="2"/>"#));
        assert!(!chunks[0].contains(r#"id="3""#));
        assert!(chunks[1].contains("<name>Three &amp; more</name>"));
    }

    #[test]
    fn test_split_by_file_size() {
        let mut input = String::from("<rows>");
        for i in 0..30 {
            input.push_str(&format!("<row>{}</row>", "x".repeat(90 + i % 2)));
        }
        input.push_str("</rows>");

        let chunks = chunks(SplitKind::FileSize, 1, &input);
        // rows are 101 or 102 bytes, so a chunk closes after ten of them
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.matches("<row>").count() == 10));
    }

    #[test]
    fn test_split_writes_numbered_files() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("catalogue.xml");
        fs::write(&input, INPUT).unwrap();

        let splitter = XmlSplitter::new(settings(SplitKind::ElementCount, 1));
        let chunk_dir = dir.path().join("inputchunks");
        let paths = splitter.split(&input, &chunk_dir).unwrap();

        let names: Vec<String> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["catalogue_0.xml", "catalogue_1.xml", "catalogue_2.xml"]);
        assert!(fs::read_to_string(&paths[1]).unwrap().contains(r#"<item id="2"/>"#));
    }

    #[test]
    fn test_unclosed_root_is_an_error() {
        let result = XmlSplitter::new(settings(SplitKind::ElementCount, 5))
            .split_into("<items><item/>".as_bytes(), |_| Ok(()));
        assert!(matches!(result, Err(ProcessorError::Split(_))));
    }
}
