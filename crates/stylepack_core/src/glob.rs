use anyhow::{Context, Result};
use ignore::WalkBuilder;
use log::{debug, trace};
use regex::Regex;
use std::{
    borrow::Cow,
    path::{Path, PathBuf},
};

use crate::constants::IMPORT_KEYWORD;

/// Expands a wildcard path inside the first quoted string of an import line.
///
/// The line is returned unchanged when it carries no `import` payload, when
/// its first quoted segment is blank, or when that segment is a literal path.
/// Otherwise the pattern is matched against files under `cwd` and one import
/// line is produced per match, joined with `\n`. A pattern matching nothing
/// yields an empty string.
///
/// # Arguments
/// * `line` - A single source line (no trailing newline)
/// * `cwd` - Directory of the stylesheet containing the line
pub fn expand_line<'a>(line: &'a str, cwd: &Path) -> Result<Cow<'a, str>> {
    expand_line_with(line, cwd, |file| file)
}

/// Like [`expand_line`], passing every matched path through `rewrite` before
/// it is substituted into the line.
pub fn expand_line_with<'a, F>(line: &'a str, cwd: &Path, rewrite: F) -> Result<Cow<'a, str>>
where
    F: Fn(String) -> String,
{
    match import_payload(line) {
        Some(payload) if !payload.trim().is_empty() => {}
        _ => return Ok(Cow::Borrowed(line)),
    }

    let Some(quoted) = first_quoted(line) else {
        return Ok(Cow::Borrowed(line));
    };

    if quoted.content.trim().is_empty() || !is_dynamic_pattern(quoted.content) {
        return Ok(Cow::Borrowed(line));
    }

    trace!("Expanding glob '{}' relative to {}", quoted.content, cwd.display());
    let pre = &line[..quoted.start];
    let post = &line[quoted.end..];
    let quote = quoted.quote;

    let matches = glob_files(quoted.content, cwd)?;
    debug!("Glob '{}' matched {} files in {}", quoted.content, matches.len(), cwd.display());

    let expanded = matches
        .into_iter()
        .map(|file| format!("{pre}{quote}{}{quote}{post}", rewrite(file)))
        .collect::<Vec<_>>()
        .join("\n");
    Ok(Cow::Owned(expanded))
}

/// Text following the last whole-word `import` on the line.
fn import_payload(line: &str) -> Option<&str> {
    let bytes = line.as_bytes();
    let is_word = |b: u8| b.is_ascii_alphanumeric() || b == b'_';

    line.rmatch_indices(IMPORT_KEYWORD)
        .find(|(idx, _)| {
            let end = idx + IMPORT_KEYWORD.len();
            let before_ok = *idx == 0 || !is_word(bytes[idx - 1]);
            let after_ok = end == bytes.len() || !is_word(bytes[end]);
            before_ok && after_ok
        })
        .map(|(idx, _)| &line[idx + IMPORT_KEYWORD.len()..])
}

#[derive(Debug, PartialEq, Eq)]
struct Quoted<'a> {
    quote: char,
    content: &'a str,
    /// Byte offset of the opening quote
    start: usize,
    /// Byte offset just past the closing quote
    end: usize,
}

/// Leftmost `'...'` or `"..."` segment, closed by the same quote character.
///
/// An opening quote without a matching close is skipped and the search
/// continues from the next quote character.
fn first_quoted(line: &str) -> Option<Quoted<'_>> {
    line.char_indices().filter(|(_, c)| *c == '\'' || *c == '"').find_map(|(start, quote)| {
        let body = start + 1;
        line[body..].find(quote).map(|len| Quoted {
            quote,
            content: &line[body..body + len],
            start,
            end: body + len + 1,
        })
    })
}

/// Whether a path contains glob syntax rather than naming a single file.
///
/// Recognizes unescaped `*` and `?`, character classes (`[abc]`), brace
/// groups (`{a,b}`, `{1..3}`) and extglobs (`@(a|b)`, `!(a)`, `+(a)`).
pub fn is_dynamic_pattern(pattern: &str) -> bool {
    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '\\' => {
                i += 2;
                continue;
            }
            '*' | '?' => return true,
            '[' if chars[i + 1..].contains(&']') => return true,
            '{' => {
                if let Some(close) = find_close(&chars, i)
                    && is_brace_group(&chars[i + 1..close])
                {
                    return true;
                }
            }
            '@' | '!' | '+' if chars.get(i + 1) == Some(&'(') => {
                if find_close(&chars, i + 1).is_some() {
                    return true;
                }
            }
            _ => {}
        }
        i += 1;
    }

    false
}

/// Files under `cwd` matching `pattern`, as `/`-separated paths relative to `cwd`.
///
/// The leading non-wildcard segments of the pattern form the walk base so the
/// walk never leaves the part of the tree the pattern can reach. `.` segments
/// are dropped from the yielded paths, `..` segments are kept. A pattern
/// starting with `/` is searched from the filesystem root and yields absolute
/// paths.
pub fn glob_files(pattern: &str, cwd: &Path) -> Result<Vec<String>> {
    let absolute = pattern.starts_with('/');
    let chars: Vec<char> = pattern.chars().collect();
    let segments: Vec<String> = split_top_level(&chars, '/')
        .into_iter()
        .filter(|s| !s.is_empty())
        .map(|s| s.iter().collect())
        .collect();
    let split = segments.iter().position(|s| is_dynamic_pattern(s)).unwrap_or(segments.len());
    let (base_segments, glob_segments) = segments.split_at(split);

    let prefix: Vec<&str> =
        base_segments.iter().map(String::as_str).filter(|s| *s != ".").collect();
    let start = if absolute { PathBuf::from("/") } else { cwd.to_path_buf() };
    let base: PathBuf = prefix.iter().fold(start, |acc, s| acc.join(s));

    if glob_segments.is_empty() {
        // Nothing dynamic past the base: the pattern names a single path
        let found = base.is_file().then(|| display_path(absolute, &prefix, ""));
        return Ok(found.into_iter().collect());
    }

    if !base.is_dir() {
        trace!("Glob base does not exist: {}", base.display());
        return Ok(vec![]);
    }

    let rest = glob_segments.join("/");
    let matcher = PathMatcher::new(&rest)
        .with_context(|| format!("Invalid glob pattern: {pattern}"))?;

    // Groups may hold `/`, so their depth is only known once expanded
    let unbounded = rest.contains("**") || glob_segments.iter().any(|s| s.contains('/'));
    let max_depth = if unbounded { None } else { Some(glob_segments.len()) };
    let walker = WalkBuilder::new(&base)
        .standard_filters(false)
        .hidden(true)
        .follow_links(true)
        .max_depth(max_depth)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut files = Vec::new();
    for res in walker {
        let dent = res.with_context(|| format!("Failed to walk {}", base.display()))?;
        if !dent.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }

        let Ok(rel) = dent.path().strip_prefix(&base) else {
            continue;
        };
        let rel = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if !matcher.is_match(&rel) {
            continue;
        }

        trace!("Glob '{}' matched {}", pattern, rel);
        files.push(display_path(absolute, &prefix, &rel));
    }

    Ok(files)
}

fn display_path<'a>(absolute: bool, prefix: &[&'a str], rel: &'a str) -> String {
    let mut parts = prefix.to_vec();
    if !rel.is_empty() {
        parts.push(rel);
    }
    let joined = parts.join("/");
    if absolute { format!("/{joined}") } else { joined }
}

/// Matches `/`-separated relative paths against the dynamic part of a glob.
///
/// `!(...)` cannot be expressed as a plain regex, so a negated pattern is
/// compiled twice: once with each negation as a segment wildcard, once with
/// the negated body in its place. A path matches when it fits the first and
/// not the second.
struct PathMatcher {
    include: Regex,
    exclude: Option<Regex>,
}

impl PathMatcher {
    fn new(pattern: &str) -> Result<Self> {
        let chars: Vec<char> = pattern.chars().collect();
        let mut negated = false;
        let include = anchored(&translate(&chars, Negation::Wildcard, &mut negated))?;
        let exclude = if negated {
            Some(anchored(&translate(&chars, Negation::Body, &mut negated))?)
        } else {
            None
        };
        trace!("Glob '{}' compiled to {}", pattern, include.as_str());
        Ok(Self { include, exclude })
    }

    fn is_match(&self, path: &str) -> bool {
        self.include.is_match(path) && !self.exclude.as_ref().is_some_and(|re| re.is_match(path))
    }
}

fn anchored(body: &str) -> Result<Regex> {
    Regex::new(&format!("^{body}$")).context("Glob did not translate to a valid regex")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Negation {
    Wildcard,
    Body,
}

/// Glob to regex source. `*` and `?` never cross `/`; `**` as a whole
/// segment crosses any number of directories.
fn translate(pattern: &[char], negation: Negation, negated: &mut bool) -> String {
    let mut re = String::new();
    let mut i = 0;

    while i < pattern.len() {
        let c = pattern[i];
        let next = pattern.get(i + 1).copied();

        if next == Some('(')
            && matches!(c, '@' | '!' | '+' | '*' | '?')
            && let Some(close) = find_close(pattern, i + 1)
        {
            let body = split_top_level(&pattern[i + 2..close], '|')
                .into_iter()
                .map(|alt| translate(alt, negation, negated))
                .collect::<Vec<_>>()
                .join("|");
            match c {
                '@' => re.push_str(&format!("(?:{body})")),
                '+' => re.push_str(&format!("(?:{body})+")),
                '*' => re.push_str(&format!("(?:{body})*")),
                '?' => re.push_str(&format!("(?:{body})?")),
                _ => {
                    *negated = true;
                    match negation {
                        Negation::Wildcard => re.push_str("[^/]*"),
                        Negation::Body => re.push_str(&format!("(?:{body})")),
                    }
                }
            }
            i = close + 1;
            continue;
        }

        match c {
            '\\' => match next {
                Some(escaped) => {
                    re.push_str(&regex::escape(&escaped.to_string()));
                    i += 1;
                }
                None => re.push_str(r"\\"),
            },
            '*' if next == Some('*') => {
                let at_start = i == 0 || pattern[i - 1] == '/';
                match pattern.get(i + 2) {
                    Some('/') if at_start => {
                        re.push_str("(?:[^/]*/)*");
                        i += 2;
                    }
                    None if at_start => {
                        re.push_str(".*");
                        i += 1;
                    }
                    _ => {
                        re.push_str("[^/]*");
                        i += 1;
                    }
                }
            }
            '*' => re.push_str("[^/]*"),
            '?' => re.push_str("[^/]"),
            '[' => match pattern[i + 1..].iter().position(|c| *c == ']') {
                Some(len) if len > 0 => {
                    re.push_str(&character_class(&pattern[i + 1..i + 1 + len]));
                    i += len + 1;
                }
                _ => re.push_str(r"\["),
            },
            '{' => match find_close(pattern, i) {
                Some(close) if is_brace_group(&pattern[i + 1..close]) => {
                    re.push_str(&brace_group(&pattern[i + 1..close], negation, negated));
                    i = close;
                }
                _ => re.push_str(r"\{"),
            },
            other => re.push_str(&regex::escape(&other.to_string())),
        }
        i += 1;
    }

    re
}

fn character_class(body: &[char]) -> String {
    let (negate, body) = match body.first() {
        Some('!' | '^') => (true, &body[1..]),
        _ => (false, body),
    };
    let mut class = String::from(if negate { "[^" } else { "[" });
    for c in body {
        if matches!(c, '\\' | '[' | ']' | '^' | '&' | '~') {
            class.push('\\');
        }
        class.push(*c);
    }
    class.push(']');
    class
}

fn is_brace_group(inner: &[char]) -> bool {
    split_top_level(inner, ',').len() > 1 || brace_range(inner).is_some()
}

fn brace_group(inner: &[char], negation: Negation, negated: &mut bool) -> String {
    let alternatives: Vec<String> = match brace_range(inner) {
        Some(items) => items.iter().map(|item| regex::escape(item)).collect(),
        None => split_top_level(inner, ',')
            .into_iter()
            .map(|alt| translate(alt, negation, negated))
            .collect(),
    };
    format!("(?:{})", alternatives.join("|"))
}

/// `{1..3}` or `{a..c}`, inclusive, in either direction
fn brace_range(inner: &[char]) -> Option<Vec<String>> {
    let text: String = inner.iter().collect();
    let (from, to) = text.split_once("..")?;

    if let (Ok(from), Ok(to)) = (from.parse::<i64>(), to.parse::<i64>()) {
        let (lo, hi) = (from.min(to), from.max(to));
        return Some((lo..=hi).map(|n| n.to_string()).collect());
    }

    let mut from_chars = from.chars();
    let mut to_chars = to.chars();
    match (from_chars.next(), from_chars.next(), to_chars.next(), to_chars.next()) {
        (Some(a), None, Some(b), None) if a.is_ascii_alphabetic() && b.is_ascii_alphabetic() => {
            let (lo, hi) = (a.min(b), a.max(b));
            Some((lo..=hi).map(String::from).collect())
        }
        _ => None,
    }
}

/// Index of the bracket closing the one at `open`, skipping escapes and
/// nested groups.
fn find_close(pattern: &[char], open: usize) -> Option<usize> {
    let (opening, closing) = match pattern.get(open)? {
        '(' => ('(', ')'),
        '{' => ('{', '}'),
        _ => return None,
    };
    let mut depth = 0;
    let mut i = open;
    while i < pattern.len() {
        match pattern[i] {
            '\\' => i += 1,
            c if c == opening => depth += 1,
            c if c == closing => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Splits on `sep` outside of `{}`, `()` and `[]` groups.
fn split_top_level(pattern: &[char], sep: char) -> Vec<&[char]> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut i = 0;

    while i < pattern.len() {
        match pattern[i] {
            '\\' => i += 1,
            '{' | '(' | '[' => depth += 1,
            '}' | ')' | ']' => depth = depth.saturating_sub(1),
            c if c == sep && depth == 0 => {
                parts.push(&pattern[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    parts.push(&pattern[start.min(pattern.len())..]);
    parts
}
