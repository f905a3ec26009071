//! Path segmentation and path string helpers.
//!
//! # Responsibilities
//! - Split a path template or concrete pathname into typed segments
//! - Normalise slashes (collapse repeats, trim, join)
//!
//! # Design Decisions
//! - Segment values are kept raw; decoding happens in the matcher
//! - A leading and a trailing `/` each become their own static segment so
//!   index routes stay distinguishable from their parents

/// Kind of a path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    /// Literal text, including the `/` boundary markers.
    Static,
    /// `$name`, captures one segment.
    Param,
    /// `$` (or legacy `*`), captures the remainder.
    Wildcard,
}

/// One component of a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Segment {
    pub kind: SegmentKind,
    pub value: String,
}

impl Segment {
    pub fn slash() -> Self {
        Self {
            kind: SegmentKind::Static,
            value: "/".to_string(),
        }
    }

    pub fn is_slash(&self) -> bool {
        self.kind == SegmentKind::Static && self.value == "/"
    }

    /// Param name without the `$` sigil.
    pub fn param_name(&self) -> &str {
        self.value.trim_start_matches('$')
    }

    fn classify(part: &str) -> Self {
        let kind = if part == "$" || part == "*" {
            SegmentKind::Wildcard
        } else if part.starts_with('$') {
            SegmentKind::Param
        } else {
            SegmentKind::Static
        };
        Self {
            kind,
            value: part.to_string(),
        }
    }
}

/// Collapse runs of `/` into one.
pub fn clean_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut prev_slash = false;
    for c in path.chars() {
        if c == '/' {
            if !prev_slash {
                out.push(c);
            }
            prev_slash = true;
        } else {
            out.push(c);
            prev_slash = false;
        }
    }
    out
}

/// Join parts with `/` and clean the result.
pub fn join_paths<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined = parts
        .into_iter()
        .map(|p| p.as_ref().to_string())
        .collect::<Vec<_>>()
        .join("/");
    clean_path(&joined)
}

pub fn trim_path_left(path: &str) -> &str {
    if path == "/" {
        path
    } else {
        path.trim_start_matches('/')
    }
}

pub fn trim_path_right(path: &str) -> &str {
    if path == "/" {
        path
    } else {
        path.trim_end_matches('/')
    }
}

pub fn trim_path(path: &str) -> &str {
    trim_path_right(trim_path_left(path))
}

/// Drop one trailing `/`, except from `/` itself and from the basepath.
pub fn remove_trailing_slash<'a>(path: &'a str, basepath: &str) -> &'a str {
    if path == "/" || path == basepath {
        return path;
    }
    path.strip_suffix('/').unwrap_or(path)
}

/// Equal up to a trailing slash.
pub fn exact_path_test(a: &str, b: &str, basepath: &str) -> bool {
    remove_trailing_slash(a, basepath) == remove_trailing_slash(b, basepath)
}

/// Split a pathname or template into segments.
pub fn parse_pathname(path: &str) -> Vec<Segment> {
    if path.is_empty() {
        return Vec::new();
    }

    let cleaned = clean_path(path);
    let mut segments = Vec::new();

    let body = match cleaned.strip_prefix('/') {
        Some(rest) => {
            segments.push(Segment::slash());
            rest
        }
        None => cleaned.as_str(),
    };

    segments.extend(
        body.split('/')
            .filter(|part| !part.is_empty())
            .map(Segment::classify),
    );

    if body.ends_with('/') {
        segments.push(Segment::slash());
    }

    segments
}

/// Inverse of [`parse_pathname`] for cleaned input.
pub fn join_segments(segments: &[Segment]) -> String {
    join_paths(segments.iter().map(|s| s.value.as_str()))
}
