use crate::config::MappingConfig;
use crate::error::{ProcessingMessage, ProcessingOutcome, ProcessingState, ProcessorError};
use crate::interpreter::Interpreter;
use crate::output::{serialize, OutputFormat, RdfGraph};
use crate::path::{DataDocument, PathEvaluator};
use crate::split::XmlSplitter;
use crate::transform::TransformRegistry;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

/// Result of mapping one input document.
#[derive(Debug)]
pub struct DocumentReport {
    pub input: PathBuf,
    /// `None` when the document could not be mapped at all.
    pub output: Option<PathBuf>,
    pub outcome: ProcessingOutcome,
}

/// Runs a mapping configuration against input documents and writes one RDF
/// document per input.
#[derive(Clone)]
pub struct Processor {
    config: Arc<MappingConfig>,
    transforms: Arc<TransformRegistry>,
    format: OutputFormat,
    output_dir: PathBuf,
    base_iri: Option<String>,
}

pub struct ProcessorBuilder {
    config: MappingConfig,
    transforms: TransformRegistry,
    format: OutputFormat,
    output_dir: PathBuf,
    base_iri: Option<String>,
}

impl ProcessorBuilder {
    pub fn new(config: MappingConfig) -> Self {
        Self {
            config,
            transforms: TransformRegistry::new(),
            format: OutputFormat::default(),
            output_dir: PathBuf::from("."),
            base_iri: None,
        }
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn output_dir<P: Into<PathBuf>>(mut self, output_dir: P) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Base for relative identifiers. Defaults to the `file:` URL of each
    /// output document.
    pub fn base_iri(mut self, base_iri: impl Into<String>) -> Self {
        self.base_iri = Some(base_iri.into());
        self
    }

    pub fn transforms(mut self, transforms: TransformRegistry) -> Self {
        self.transforms = transforms;
        self
    }

    pub fn build(self) -> Result<Processor, ProcessorError> {
        if let Some(base) = &self.base_iri {
            oxiri::Iri::parse(base.as_str())
                .map_err(|e| ProcessorError::InvalidIri(format!("{} ({})", base, e)))?;
        }
        tracing::info!(
            "Creating processor writing {} to {:?}",
            self.format,
            self.output_dir
        );
        Ok(Processor {
            config: Arc::new(self.config),
            transforms: Arc::new(self.transforms),
            format: self.format,
            output_dir: self.output_dir,
            base_iri: self.base_iri,
        })
    }
}

impl Processor {
    pub fn builder(config: MappingConfig) -> ProcessorBuilder {
        ProcessorBuilder::new(config)
    }

    pub fn config(&self) -> &MappingConfig {
        &self.config
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Map one input document held in memory. Counters and unique
    /// identifiers start afresh for every call.
    pub fn map_document(
        &self,
        xml: &str,
        base_iri: Option<&str>,
    ) -> Result<(RdfGraph, ProcessingState), ProcessorError> {
        let mut data: DataDocument = xml.parse()?;
        data.bind_missing(self.config.namespaces());
        let document = data.document();
        let root = DataDocument::root_node(&document);

        let mut graph = RdfGraph::new(self.config.namespaces().clone(), self.format);
        if let Some(base) = base_iri {
            graph = graph.with_base_iri(base)?;
        }
        let paths = PathEvaluator::new(data.namespaces());
        let state = Interpreter::new(&self.config, &self.transforms, &mut graph, paths).run(root)?;
        Ok((graph, state))
    }

    /// Map `input` and write the result into `output_dir` as
    /// `<stem>.<extension>`, the extension following the final format.
    pub async fn process_document(
        &self,
        input: &Path,
        output_dir: &Path,
    ) -> Result<DocumentReport, ProcessorError> {
        tracing::info!("Processing file: {}", input.display());
        let xml = fs::read_to_string(input).map_err(|e| {
            ProcessorError::Processing(format!("Failed to read {}: {}", input.display(), e))
        })?;
        let stem = input
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| {
                ProcessorError::Processing(format!("Cannot name output for {:?}", input))
            })?;
        fs::create_dir_all(output_dir).map_err(|e| {
            ProcessorError::Processing(format!("Failed to create output directory: {}", e))
        })?;

        let base_iri = match &self.base_iri {
            Some(base) => base.clone(),
            None => file_base_iri(&output_dir.join(format!("{}.{}", stem, self.format.extension())))?,
        };
        let (graph, state) = self.map_document(&xml, Some(&base_iri))?;

        let output = output_dir.join(format!("{}.{}", stem, graph.format().extension()));
        let file = File::create(&output).map_err(|e| {
            ProcessorError::Processing(format!("Failed to create {}: {}", output.display(), e))
        })?;
        let mut writer = serialize(&graph, BufWriter::new(file))?;
        writer.flush()?;

        if state.has_errors() || state.has_warnings() {
            tracing::warn!(
                "{}: {} mapping error(s), {} warning(s)",
                input.display(),
                state.get_errors().len(),
                state.get_warnings().len()
            );
        }
        tracing::info!(
            "Wrote {} statement(s) to {}",
            graph.len(),
            output.display()
        );
        Ok(DocumentReport {
            input: input.to_path_buf(),
            output: Some(output),
            outcome: ProcessingOutcome::from_state(state),
        })
    }

    /// Process a single file, or every file below a directory, into the
    /// configured output directory.
    pub async fn process_path(&self, input: &Path) -> Result<Vec<DocumentReport>, ProcessorError> {
        let files = if input.is_dir() {
            let mut files = Vec::new();
            collect_input_files(input, &mut files)?;
            tracing::info!("Found {} input file(s) in {}", files.len(), input.display());
            files
        } else if input.is_file() {
            vec![input.to_path_buf()]
        } else {
            return Err(ProcessorError::Processing(format!(
                "Input file or directory does not exist: {}",
                input.display()
            )));
        };
        self.process_files(&files, &self.output_dir).await
    }

    /// Split `input` with the configuration's `<split>` settings and process
    /// every chunk into the output chunk directory.
    pub async fn process_split(&self, input: &Path) -> Result<Vec<DocumentReport>, ProcessorError> {
        if !input.is_file() {
            return Err(ProcessorError::Split(format!(
                "splitting needs a single input file, got {}",
                input.display()
            )));
        }
        let settings = self.config.split_settings()?;
        let chunk_dir = settings.input_chunk_dir(input);
        let output_dir = settings.output_chunk_dir(&self.output_dir);
        let chunks = XmlSplitter::new(settings).split(input, &chunk_dir)?;
        self.process_files(&chunks, &output_dir).await
    }

    async fn process_files(
        &self,
        files: &[PathBuf],
        output_dir: &Path,
    ) -> Result<Vec<DocumentReport>, ProcessorError> {
        let mut reports = Vec::with_capacity(files.len());
        for file in files {
            match self.process_document(file, output_dir).await {
                Ok(report) => reports.push(report),
                Err(error) => {
                    tracing::error!("Failed to process {}: {}", file.display(), error);
                    reports.push(DocumentReport {
                        input: file.clone(),
                        output: None,
                        outcome: ProcessingOutcome::Failure {
                            errors: vec![ProcessingMessage::new(
                                error.to_string(),
                                Some(file.display().to_string()),
                            )],
                            warnings: Vec::new(),
                        },
                    });
                }
            }
        }
        let failed = reports.iter().filter(|r| r.output.is_none()).count();
        tracing::info!(
            "Processing completed: {} file(s), {} failed",
            reports.len(),
            failed
        );
        Ok(reports)
    }
}

/// Files of `dir` in name order, then those of each subdirectory.
fn collect_input_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), ProcessorError> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<Vec<_>, _>>()?;
    entries.sort();
    files.extend(entries.iter().filter(|path| path.is_file()).cloned());
    for subdir in entries.iter().filter(|path| path.is_dir()) {
        collect_input_files(subdir, files)?;
    }
    Ok(())
}

fn file_base_iri(path: &Path) -> Result<String, ProcessorError> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Url::from_file_path(&absolute)
        .map(|url| url.to_string())
        .map_err(|_| ProcessorError::InvalidIri(absolute.display().to_string()))
}
