use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("XML parse error: {0}")]
    XmlParse(String),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Missing attribute {attribute}=\"...\" in: {fragment}")]
    MissingAttribute { attribute: String, fragment: String },
    #[error("Modifier function modifier={0} does not exist. If it is custom, verify that its provider has been registered")]
    UnknownTransform(String),
    #[error("No match for {placeholder} in {attribute}=\"{template}\"")]
    NoMatch {
        placeholder: String,
        attribute: String,
        template: String,
    },
    #[error("Multiple matches for {placeholder} in {attribute}=\"{template}\"")]
    MultipleMatches {
        placeholder: String,
        attribute: String,
        template: String,
    },
    #[error("Unable to match {attribute}=\"{template}\": found {found} value(s), expected at least {min}")]
    TooFewValues {
        attribute: String,
        template: String,
        min: usize,
        found: usize,
    },
    #[error("Too many values for {attribute}=\"{template}\": found {found}, expected at most {max}")]
    TooManyValues {
        attribute: String,
        template: String,
        max: usize,
        found: usize,
    },
    #[error("Cannot identify tag <{tag}> in: {fragment}")]
    UnrecognizedTag { tag: String, fragment: String },
    #[error("No named mapping was found for: {0}. A <namedmapping> must be defined directly under <config>")]
    MissingNamedMapping(String),
    #[error("No counter named '{0}' exists")]
    UnknownCounter(String),
    #[error("No unique identifier named '{0}' exists")]
    UnknownUniqueIdentifier(String),
    #[error("Attribute @{attribute} in <{tag}> has invalid value '{value}': expected {expected}")]
    InvalidBooleanOrInteger {
        tag: String,
        attribute: String,
        value: String,
        expected: &'static str,
    },
    #[error("User specified error: {message}")]
    UserDefined { message: String, exit: bool },
    #[error("Path evaluation error: {0}")]
    PathEvaluation(String),
    #[error("Invalid qualified name '{0}': expected 'prefix:localname'")]
    InvalidQualifiedName(String),
    #[error("Unknown namespace prefix '{0}'")]
    UnknownPrefix(String),
    #[error("Invalid IRI '{0}'")]
    InvalidIri(String),
    #[error("<{0}> used outside of a <resource> or <bnode>")]
    NoSubject(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Split error: {0}")]
    Split(String),
    #[error("Processing error: {0}")]
    Processing(String),
}

impl ProcessorError {
    /// Fatal errors abort the current document; everything else is reported
    /// and traversal continues with the next sibling.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ProcessorError::UserDefined { exit: true, .. })
    }
}

#[derive(Debug, Clone)]
pub struct ProcessingMessage {
    pub message: String,
    pub source: Option<String>,
}

impl ProcessingMessage {
    pub fn new(message: impl Into<String>, source: Option<String>) -> Self {
        Self {
            message: message.into(),
            source,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct ProcessingState {
    warnings: Vec<ProcessingMessage>,
    errors: Vec<ProcessingMessage>,
}

impl ProcessingState {
    pub fn new() -> Self {
        Self {
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn add_warning(&mut self, message: impl Into<String>, source: Option<String>) {
        self.warnings.push(ProcessingMessage::new(message, source));
    }

    pub fn add_error(&mut self, message: impl Into<String>, source: Option<String>) {
        self.errors.push(ProcessingMessage::new(message, source));
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn get_warnings(&self) -> &[ProcessingMessage] {
        &self.warnings
    }

    pub fn get_errors(&self) -> &[ProcessingMessage] {
        &self.errors
    }

    pub fn merge(&mut self, other: ProcessingState) {
        self.warnings.extend(other.warnings);
        self.errors.extend(other.errors);
    }
}

#[derive(Debug)]
pub enum ProcessingOutcome {
    Success,
    SuccessWithWarnings(Vec<ProcessingMessage>),
    Failure {
        errors: Vec<ProcessingMessage>,
        warnings: Vec<ProcessingMessage>,
    },
}

impl ProcessingOutcome {
    pub fn from_state(state: ProcessingState) -> Self {
        if !state.has_errors() && !state.has_warnings() {
            ProcessingOutcome::Success
        } else if state.has_errors() {
            ProcessingOutcome::Failure {
                errors: state.errors,
                warnings: state.warnings,
            }
        } else {
            ProcessingOutcome::SuccessWithWarnings(state.warnings)
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, ProcessingOutcome::Failure { .. })
    }
}
