//! Tokenizer and builders for Confluence storage markup.
//!
//! Structured macros are embedded in a page body as
//! `<ac:structured-macro ac:name="...">` elements, either self-closing or
//! wrapping a rich-text body. The scanner here locates each macro instance
//! with precise byte spans, pairing open and close tags with a depth
//! counter so nested or repeated macros of the same name never mis-pair.

use serde::Deserialize;
use serde_json::{Map, Value};

const OPEN_TAG: &str = "<ac:structured-macro";
const CLOSE_TAG: &str = "</ac:structured-macro>";

/// One structured-macro instance located in a page body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroSpan {
  /// The macro's `ac:name` attribute value.
  pub name: String,
  /// Byte offset of the `<` opening the start tag.
  pub start: usize,
  /// Byte offset one past the end of the macro (after `/>` or the close
  /// tag).
  pub end: usize,
  /// Whether the start tag was self-closing.
  pub self_closing: bool,
}

/// Placement of an embedded image within the surrounding text flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
  /// No wrapper; the image participates in the line it lands on.
  Inline,
  /// Centered paragraph wrapper.
  Center,
  /// Float left with a right margin.
  Left,
  /// Float right with a left margin.
  Right,
}

struct OpenTag {
  start: usize,
  /// Index one past the `>` of the start tag.
  after: usize,
  name: String,
  self_closing: bool,
}

/// Find the end of a tag that starts before `from`, honouring quoted
/// attribute values that may contain `>`.
fn tag_end(body: &str, from: usize) -> Option<(usize, bool)> {
  let bytes = body.as_bytes();
  let mut quote: Option<u8> = None;
  let mut i = from;

  while i < bytes.len() {
    let byte = bytes[i];
    match quote {
      Some(q) => {
        if byte == q {
          quote = None;
        }
      }
      None => match byte {
        b'"' | b'\'' => quote = Some(byte),
        b'>' => {
          let self_closing = i > from && bytes[i - 1] == b'/';
          return Some((i + 1, self_closing));
        }
        _ => {}
      },
    }
    i += 1;
  }

  None
}

/// Extract a quoted attribute value from a start tag's source text.
fn parse_attribute(tag_source: &str, attribute: &str) -> Option<String> {
  let bytes = tag_source.as_bytes();
  let mut search = 0;

  while let Some(found) = tag_source[search..].find(attribute) {
    let at = search + found;
    let preceded_ok = at > 0 && bytes[at - 1].is_ascii_whitespace();
    let rest = &tag_source[at + attribute.len()..];

    if preceded_ok {
      for quote in ['"', '\''] {
        let open = format!("={quote}");
        if let Some(value) = rest.strip_prefix(&open) {
          return value.find(quote).map(|end| value[..end].to_string());
        }
      }
    }

    search = at + attribute.len();
  }

  None
}

/// Locate the next structured-macro start tag at or after `from`.
fn find_open_tag(body: &str, from: usize) -> Option<OpenTag> {
  let mut search = from;

  while let Some(found) = body[search..].find(OPEN_TAG) {
    let start = search + found;
    let after_name = start + OPEN_TAG.len();

    // The tag name must end here, otherwise we matched a prefix of some
    // longer element name.
    let boundary = body.as_bytes().get(after_name);
    if !matches!(boundary, Some(b' ' | b'\t' | b'\r' | b'\n' | b'>' | b'/')) {
      search = after_name;
      continue;
    }

    let Some((after, self_closing)) = tag_end(body, after_name) else {
      return None;
    };

    let name = parse_attribute(&body[start..after], "ac:name").unwrap_or_default();
    return Some(OpenTag {
      start,
      after,
      name,
      self_closing,
    });
  }

  None
}

/// Find the close tag matching an open tag whose body begins at `from`,
/// counting nested macro opens so same-name nesting pairs correctly.
///
/// Returns the index one past the matching close tag.
fn find_matching_close(body: &str, from: usize) -> Option<usize> {
  let mut depth = 1usize;
  let mut pos = from;

  loop {
    let next_open = find_open_tag(body, pos);
    let next_close = body[pos..].find(CLOSE_TAG).map(|found| pos + found);

    let close = next_close?;
    match next_open {
      Some(open) if open.start < close => {
        if !open.self_closing {
          depth += 1;
        }
        pos = open.after;
      }
      _ => {
        depth -= 1;
        let after = close + CLOSE_TAG.len();
        if depth == 0 {
          return Some(after);
        }
        pos = after;
      }
    }
  }
}

/// Scan a page body for every structured-macro start tag, nested instances
/// included, in document order.
///
/// An unterminated macro is reported as ending at its start tag so a
/// malformed tail never swallows the rest of the document.
pub fn scan_macros(body: &str) -> Vec<MacroSpan> {
  let mut spans = Vec::new();
  let mut cursor = 0;

  while let Some(open) = find_open_tag(body, cursor) {
    let end = if open.self_closing {
      open.after
    } else {
      find_matching_close(body, open.after).unwrap_or(open.after)
    };

    spans.push(MacroSpan {
      name: open.name,
      start: open.start,
      end,
      self_closing: open.self_closing,
    });
    cursor = open.after;
  }

  spans
}

/// Replace every top-level instance of the named macro with `replacement`.
///
/// Instances nested inside an already-replaced instance are subsumed by the
/// outer replacement. Returns the rewritten body and the number of spans
/// replaced; zero replacements returns the body unchanged.
pub fn replace_macros(body: &str, name: &str, replacement: &str) -> (String, usize) {
  let mut selected: Vec<MacroSpan> = Vec::new();
  for span in scan_macros(body) {
    if span.name == name && selected.last().is_none_or(|prev| span.start >= prev.end) {
      selected.push(span);
    }
  }

  if selected.is_empty() {
    return (body.to_string(), 0);
  }

  let mut result = body.to_string();
  for span in selected.iter().rev() {
    result.replace_range(span.start..span.end, replacement);
  }
  (result, selected.len())
}

/// Serialize macro parameters as `key="value"` attribute pairs.
///
/// Values are interpolated directly; callers must not embed quote
/// characters in parameter values.
pub fn format_parameters(parameters: &Map<String, Value>) -> String {
  parameters
    .iter()
    .map(|(key, value)| format!("{key}=\"{}\"", parameter_value(value)))
    .collect::<Vec<_>>()
    .join(" ")
}

fn parameter_value(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}

/// Build a structured-macro element.
///
/// With a body the macro wraps it in `<ac:rich-text-body>`; without one the
/// tag is self-closing.
pub fn macro_markup(name: &str, parameters: &Map<String, Value>, body: Option<&str>) -> String {
  let params = format_parameters(parameters);
  let attrs = if params.is_empty() {
    format!("ac:name=\"{name}\"")
  } else {
    format!("ac:name=\"{name}\" {params}")
  };

  match body {
    Some(content) => {
      format!("<ac:structured-macro {attrs}><ac:rich-text-body>{content}</ac:rich-text-body></ac:structured-macro>")
    }
    None => format!("<ac:structured-macro {attrs}/>"),
  }
}

/// Build an inline image element referencing an attachment.
///
/// Confluence resolves the image by filename at render time, so two
/// attachments sharing a filename on one page render ambiguously.
pub fn image_markup(filename: &str, width: u32) -> String {
  format!("<ac:image ac:width=\"{width}\"><ri:attachment ri:filename=\"{filename}\"/></ac:image>")
}

/// Wrap markup in the container matching the requested position.
pub fn positioned(markup: &str, position: Position) -> String {
  match position {
    Position::Inline => markup.to_string(),
    Position::Center => format!("<p style=\"text-align: center;\">{markup}</p>"),
    Position::Left => format!("<div style=\"float: left; margin-right: 10px;\">{markup}</div>"),
    Position::Right => format!("<div style=\"float: right; margin-left: 10px;\">{markup}</div>"),
  }
}

/// Build a paragraph linking to an issue in the configured tracker.
pub fn issue_link_markup(tracker_base_url: &str, issue_key: &str) -> String {
  let base = tracker_base_url.trim_end_matches('/');
  format!("<p><a href=\"{base}/browse/{issue_key}\">{issue_key}</a></p>")
}
