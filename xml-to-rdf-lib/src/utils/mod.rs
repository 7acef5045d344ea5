use once_cell::sync::Lazy;
use regex::Regex;

use crate::ProcessorError;

pub const DATE_FORMATS: [&str; 9] = [
    "%d %b %Y",  // 23 May 2012
    "%d %B %Y",  // 23 May 2012
    "%Y-%m-%d",  // 2012-05-23
    "%Y/%m/%d",  // 2012/05/23
    "%d/%m/%Y",  // 23/05/2012
    "%d-%m-%Y",  // 23-05-2012
    "%b %d, %Y", // May 23, 2012
    "%B %d, %Y", // May 23, 2012
    "%d.%m.%Y",  // 23.05.2012
];

/// Control characters that legacy exports leave in text nodes.
const STRIPPED_CONTROL_CHARS: [char; 4] = ['\u{0B}', '\u{0E}', '\u{13}', '\u{1D}'];

static INVALID_IRI_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9_#\-/:.]").unwrap());
static DOUBLE_SLASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"([^:])//").unwrap());

/// Clean a resolved value so it can be used as an IRI.
///
/// Angle brackets are dropped, any character outside `[A-Za-z0-9_#-/:.]`
/// becomes `-`, hyphen runs collapse and one leading/trailing hyphen is
/// trimmed, `//` not preceded by `:` collapses to `/`, and a trailing `/` is
/// removed once the value holds more than three slashes. The rules are
/// applied until the value stops changing, so the result is stable under
/// repeated sanitizing.
pub fn sanitize_uri(value: &str) -> String {
    let mut current = sanitize_uri_once(value);
    loop {
        let next = sanitize_uri_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn sanitize_uri_once(value: &str) -> String {
    let stripped = value.replace(['<', '>'], "");
    let mut cleaned = INVALID_IRI_CHARS.replace_all(&stripped, "-").into_owned();

    while cleaned.contains("--") {
        cleaned = cleaned.replace("--", "-");
    }
    if let Some(rest) = cleaned.strip_prefix('-') {
        cleaned = rest.to_string();
    }
    if let Some(rest) = cleaned.strip_suffix('-') {
        cleaned = rest.to_string();
    }

    cleaned = DOUBLE_SLASH.replace_all(&cleaned, "${1}/").into_owned();

    if cleaned.ends_with('/') && cleaned.matches('/').count() > 3 {
        cleaned.pop();
    }
    cleaned
}

/// Remove control characters that are not allowed in serialized literals.
pub fn sanitize_literal(value: &str) -> String {
    value.replace(STRIPPED_CONTROL_CHARS, "")
}

/// Parse a boolean attribute value (`true`/`false`, any case, surrounding
/// whitespace ignored).
pub fn parse_bool(
    tag: &str,
    attribute: &str,
    value: &str,
) -> Result<bool, ProcessorError> {
    match value.trim().to_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ProcessorError::InvalidBooleanOrInteger {
            tag: tag.to_string(),
            attribute: attribute.to_string(),
            value: value.to_string(),
            expected: "a boolean (true|false)",
        }),
    }
}

pub fn parse_integer(
    tag: &str,
    attribute: &str,
    value: &str,
) -> Result<i64, ProcessorError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| ProcessorError::InvalidBooleanOrInteger {
            tag: tag.to_string(),
            attribute: attribute.to_string(),
            value: value.to_string(),
            expected: "an integer",
        })
}

/// Render a path-evaluation number: integral values print without a
/// fractional part, everything else uses the shortest decimal form.
pub fn render_number(number: f64) -> String {
    if number.is_finite() && number.fract() == 0.0 && number.abs() < i64::MAX as f64 {
        (number as i64).to_string()
    } else if number.is_nan() {
        "NaN".to_string()
    } else if number.is_infinite() {
        if number > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        number.to_string()
    }
}
