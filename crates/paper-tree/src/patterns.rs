//! Structural patterns over cleaned LaTeX: sectioning commands, float
//! environments, captions, and appendix markers.
//!
//! Regexes locate command sites only; argument text is always read with the
//! balanced-brace scanner so titles containing nested groups survive.

use std::sync::LazyLock;

use regex::Regex;

use crate::brace;

/// Sectioning commands recognized, by heading level.
pub const HEADING_COMMANDS: [&str; 3] = ["section", "subsection", "subsubsection"];

/// Number of heading levels recognized.
pub const HEADING_LEVELS: usize = HEADING_COMMANDS.len();

static HEADING_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    HEADING_COMMANDS
        .iter()
        .map(|cmd| Regex::new(&format!(r"\\{}\*?\s*\{{", cmd)).expect("heading pattern"))
        .collect()
});

static FLOAT_BEGIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\begin\s*\{(figure\*?|table\*?|sidewaystable\*?)\}").expect("float pattern")
});

static CAPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\caption(?:of)?\*?").expect("caption pattern"));

static APPENDIX_CMD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\appendix\b").expect("appendix pattern"));

static APPENDICES_ENV_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\begin\s*\{appendices\}").expect("appendices pattern"));

/// A sectioning command with its balanced title argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingMatch {
    /// Byte offset of the command's backslash.
    pub start: usize,
    /// Byte offset just past the title's closing brace.
    pub end: usize,
    /// Title text, braces stripped and trimmed.
    pub title: String,
}

/// Find all sectioning commands at `level` (0 = `\section`,
/// 1 = `\subsection`, 2 = `\subsubsection`), in document order.
///
/// Commands whose title group never closes are skipped; malformed nesting
/// is a fallback condition, never an error.
pub fn find_headings(text: &str, level: usize) -> Vec<HeadingMatch> {
    let Some(re) = HEADING_RES.get(level) else {
        return Vec::new();
    };
    let mut matches = Vec::new();
    for m in re.find_iter(text) {
        // The regex ends on the opening brace.
        let Some(group) = brace::match_group(text, m.end() - 1) else {
            continue;
        };
        matches.push(HeadingMatch {
            start: m.start(),
            end: group.end(),
            title: group.inner(text).trim().to_string(),
        });
    }
    matches
}

/// A float environment span with any caption text found inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloatMatch {
    /// Environment name as written, star included (`figure`, `table*`, ...).
    pub env: String,
    /// Byte offset of `\begin`.
    pub start: usize,
    /// Byte offset just past `\end{...}`.
    pub end: usize,
    /// Concatenated caption arguments, if any caption command was present.
    pub caption: Option<String>,
}

/// Find all figure/table/sidewaystable environments, in document order.
/// Environments with no matching `\end` are skipped.
pub fn find_floats(text: &str) -> Vec<FloatMatch> {
    let mut floats: Vec<FloatMatch> = Vec::new();
    for m in FLOAT_BEGIN_RE.captures_iter(text) {
        let whole = m.get(0).expect("match");
        // Skip begins nested inside an already-extracted float.
        if floats.iter().any(|f| whole.start() < f.end) {
            continue;
        }
        let env = m.get(1).expect("env capture").as_str();
        let end_re = Regex::new(&format!(r"\\end\s*\{{{}\}}", regex::escape(env)))
            .expect("float end pattern");
        let Some(end_m) = end_re.find(&text[whole.end()..]) else {
            continue;
        };
        let end = whole.end() + end_m.end();
        let body = &text[whole.end()..whole.end() + end_m.start()];
        floats.push(FloatMatch {
            env: env.to_string(),
            start: whole.start(),
            end,
            caption: extract_captions(body),
        });
    }
    floats
}

/// Collect the arguments of every caption command in a float body.
///
/// Recognizes `\caption`, `\caption*`, and `\captionof` (whose first group
/// names the float type and is skipped), each with an optional `[...]`
/// short form before the argument.
fn extract_captions(body: &str) -> Option<String> {
    let mut captions = Vec::new();
    for m in CAPTION_RE.find_iter(body) {
        let is_captionof = body[m.start()..m.end()].starts_with("\\captionof");
        let mut pos = brace::skip_bracket_group(body, m.end());
        if is_captionof {
            match brace::group_after(body, pos) {
                Some(group) => pos = group.end(),
                None => continue,
            }
        }
        if let Some(group) = brace::group_after(body, pos) {
            let caption = group.inner(body).trim();
            if !caption.is_empty() {
                captions.push(caption.to_string());
            }
        }
    }
    if captions.is_empty() {
        None
    } else {
        Some(captions.join(" "))
    }
}

/// An appendix marker occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendixMatch {
    /// Byte offset of the marker.
    pub start: usize,
    /// Byte offset just past the marker (the appendix body starts here).
    pub end: usize,
}

/// Find the *last* appendix marker in the text: `\appendix`,
/// `\begin{appendices}`, or a level-0 heading whose title starts with
/// "Appendix".
pub fn find_appendix(text: &str) -> Option<AppendixMatch> {
    let mut best: Option<AppendixMatch> = None;
    let mut consider = |candidate: AppendixMatch| {
        if best.map_or(true, |b| candidate.start > b.start) {
            best = Some(candidate);
        }
    };
    for re in [&*APPENDIX_CMD_RE, &*APPENDICES_ENV_RE] {
        if let Some(m) = re.find_iter(text).last() {
            consider(AppendixMatch {
                start: m.start(),
                end: m.end(),
            });
        }
    }
    for h in find_headings(text, 0) {
        if h.title.starts_with("Appendix") {
            consider(AppendixMatch {
                start: h.start,
                end: h.end,
            });
        }
    }
    best
}
