//! Log sanitization for untrusted request text and secret material.
//!
//! Form fields end up in log lines (parse errors echo the rejected value), so
//! formatted output is filtered before it reaches the sink:
//! - terminal escape sequences and other control characters are neutralized
//! - secret-like tokens (signing seeds, keys, bearer tokens) are redacted
//! - oversized lines are truncated
//!
//! `SanitizingMakeWriter` applies this to every line written by the
//! `tracing_subscriber` fmt layer.

use regex::{Regex, RegexSet};
use std::io::{self, Write};
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

static SECRET_PATTERNS: OnceLock<SecretPatterns> = OnceLock::new();

/// Maximum number of bytes kept per sanitized line.
///
/// Can be overridden via `WASTECAST_SANITIZE_MAX_BYTES`.
const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

struct SecretPattern {
    regex: Regex,
    replacement: &'static str,
}

struct SecretPatterns {
    ansi: Regex,
    set: RegexSet,
    patterns: Vec<SecretPattern>,
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }

    let mut end = max_bytes.min(input.len());
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

fn max_sanitize_bytes() -> usize {
    std::env::var("WASTECAST_SANITIZE_MAX_BYTES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(DEFAULT_SANITIZE_MAX_BYTES)
}

fn get_patterns() -> &'static SecretPatterns {
    SECRET_PATTERNS.get_or_init(|| {
        let rules: Vec<(&'static str, &'static str)> = vec![
            // JWTs / bearer tokens
            (
                r"\beyJ[a-zA-Z0-9_-]{10,}\.[a-zA-Z0-9_-]{10,}\.[a-zA-Z0-9_-]{10,}\b",
                "[REDACTED-JWT]",
            ),
            // key=value secrets, base64 or hex valued
            (
                r"(?i)\b(?:api[_-]?key|token|secret|password|private[_-]?key|seed|signing[_-]?key)\b\s*[:=]\s*[A-Za-z0-9+/]{32,}={0,2}",
                "[REDACTED-SECRET]",
            ),
            (
                r"(?i)\b(?:api[_-]?key|token|secret|password|private[_-]?key|seed|signing[_-]?key)\b\s*[:=]\s*[0-9a-fA-F]{16,}\b",
                "[REDACTED-SECRET]",
            ),
            // Bare 32-byte keys in base64 (Ed25519 seeds)
            (r"\b[A-Za-z0-9+/]{43}=", "[REDACTED-KEY]"),
        ];

        let set = RegexSet::new(rules.iter().map(|(p, _)| *p)).expect("Valid regex set");
        let patterns = rules
            .into_iter()
            .map(|(pattern, replacement)| SecretPattern {
                regex: Regex::new(pattern).expect("Valid regex"),
                replacement,
            })
            .collect();

        SecretPatterns {
            ansi: Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]").expect("Valid regex"),
            set,
            patterns,
        }
    })
}

/// Sanitize one chunk of log text.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, max_sanitize_bytes())
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let patterns = get_patterns();
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    let mut result = patterns.ansi.replace_all(prefix, "").into_owned();
    result = escape_control_chars(&result);

    for idx in patterns.set.matches(&result).into_iter().collect::<Vec<_>>() {
        let pattern = &patterns.patterns[idx];
        result = pattern
            .regex
            .replace_all(&result, pattern.replacement)
            .into_owned();
    }

    if truncated {
        result.push_str(" [TRUNCATED]");
        if input.ends_with('\n') {
            result.push('\n');
        }
    }
    result
}

/// Replace control characters with their escaped form.
///
/// Tabs and line feeds are kept so the formatter's own layout survives.
fn escape_control_chars(input: &str) -> String {
    if !input.chars().any(|c| c.is_control() && c != '\n' && c != '\t') {
        return input.to_string();
    }
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if c.is_control() && c != '\n' && c != '\t' {
            out.extend(c.escape_default());
        } else {
            out.push(c);
        }
    }
    out
}

/// `MakeWriter` adapter that runs every formatted log line through
/// [`sanitize`] before it reaches the wrapped writer.
#[derive(Debug, Clone)]
pub struct SanitizingMakeWriter<M>(M);

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self(inner)
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter::with_limit(self.0.make_writer(), max_sanitize_bytes())
    }
}

/// Line-buffering writer produced by [`SanitizingMakeWriter`].
///
/// Complete lines are sanitized as soon as they arrive; a trailing partial
/// line waits for its newline or for `flush`.
pub struct SanitizingWriter<W> {
    inner: W,
    pending: Vec<u8>,
    limit: usize,
}

impl<W: Write> SanitizingWriter<W> {
    fn with_limit(inner: W, limit: usize) -> Self {
        Self {
            inner,
            pending: Vec::new(),
            limit,
        }
    }

    fn emit(&mut self, raw: &[u8]) -> io::Result<()> {
        let clean = sanitize_with_limit(&String::from_utf8_lossy(raw), self.limit);
        self.inner.write_all(clean.as_bytes())
    }
}

impl<W: Write> Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);

        if let Some(last) = self.pending.iter().rposition(|&b| b == b'\n') {
            let complete: Vec<u8> = self.pending.drain(..=last).collect();
            for line in complete.split_inclusive(|&b| b == b'\n') {
                self.emit(line)?;
            }
        }

        // An unterminated line may not grow without bound.
        if self.pending.len() > self.limit.saturating_mul(2) {
            let overflow = std::mem::take(&mut self.pending);
            self.emit(&overflow)?;
            self.inner.write_all(b"\n")?;
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            self.emit(&rest)?;
        }
        self.inner.flush()
    }
}
