/// A `^...~` call answered from interpreter state rather than the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalCall {
    Counter(String),
    UniqueIdentifier(String),
}

impl InternalCall {
    /// Parse the text between `^` and `~`.
    pub fn parse(body: &str) -> Option<Self> {
        if let Some(name) = body.strip_prefix("counter_") {
            Some(InternalCall::Counter(name.to_string()))
        } else {
            body.strip_prefix("uniqueidentifier_")
                .map(|name| InternalCall::UniqueIdentifier(name.to_string()))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    /// Path expression between `{` and `}`, possibly holding nested calls.
    Path(String),
    Internal(InternalCall),
}

impl Segment {
    pub fn is_placeholder(&self) -> bool {
        !matches!(self, Segment::Literal(_))
    }
}

/// An attribute value split into literal text and placeholders.
///
/// `{...}` extends to the first `}` and swallows any `^...~` inside it, so
/// `{/item[position()=^counter_i~]}` is one path placeholder. A `^...~` that
/// is not a `counter_` or `uniqueidentifier_` call, and any unterminated
/// opener, stays literal text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(text: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = text;

        while let Some(pos) = rest.find(['{', '^']) {
            let (before, from_opener) = rest.split_at(pos);
            literal.push_str(before);
            let closer = if from_opener.starts_with('{') { '}' } else { '~' };

            let Some(end) = from_opener[1..].find(closer) else {
                literal.push_str(from_opener);
                rest = "";
                break;
            };
            let body = &from_opener[1..1 + end];
            let whole = &from_opener[..end + 2];

            let placeholder = if closer == '}' {
                Some(Segment::Path(body.to_string()))
            } else {
                InternalCall::parse(body).map(Segment::Internal)
            };
            match placeholder {
                Some(segment) => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(segment);
                }
                None => literal.push_str(whole),
            }
            rest = &from_opener[end + 2..];
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn placeholder_count(&self) -> usize {
        self.segments.iter().filter(|s| s.is_placeholder()).count()
    }

    /// The single placeholder, when it spans the whole value.
    pub fn sole_placeholder(&self) -> Option<&Segment> {
        match self.segments.as_slice() {
            [only] if only.is_placeholder() => Some(only),
            _ => None,
        }
    }
}
