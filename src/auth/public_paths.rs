// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Paths reachable without an authenticated identity.
//!
//! Patterns are matched segment by segment:
//!
//! - a literal segment matches itself
//! - `*` matches exactly one segment
//! - a trailing `**` matches any remainder, including nothing
//!
//! so `/api/auth/**` covers `/api/auth`, `/api/auth/login` and
//! `/api/auth/a/b`.

/// Default public paths.
pub const DEFAULT_PUBLIC_PATHS: [&str; 4] = [
    "/api/auth/**",
    "/api/public/**",
    "/swagger-ui/**",
    "/v3/api-docs/**",
];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    AnySegment,
    AnyTail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    fn parse(raw: &str) -> Self {
        let parts: Vec<&str> = split(raw).collect();
        let last = parts.len().saturating_sub(1);
        let segments = parts
            .iter()
            .enumerate()
            .map(|(i, part)| match *part {
                "**" if i == last => Segment::AnyTail,
                "*" => Segment::AnySegment,
                literal => Segment::Literal(literal.to_string()),
            })
            .collect();

        Self {
            raw: raw.to_string(),
            segments,
        }
    }

    fn matches(&self, path: &str) -> bool {
        let parts: Vec<&str> = split(path).collect();
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::AnyTail => return true,
                Segment::AnySegment => {
                    if i >= parts.len() {
                        return false;
                    }
                }
                Segment::Literal(literal) => {
                    if parts.get(i) != Some(&literal.as_str()) {
                        return false;
                    }
                }
            }
        }
        parts.len() == self.segments.len()
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Set of public path patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicPaths {
    patterns: Vec<PathPattern>,
}

impl PublicPaths {
    pub fn new<I, P>(patterns: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.as_ref().trim().to_string())
                .filter(|p| !p.is_empty())
                .map(|p| PathPattern::parse(&p))
                .collect(),
        }
    }

    /// Whether `path` is exempt from the authentication requirement.
    pub fn matches(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(path))
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|p| p.raw.as_str())
    }
}

impl Default for PublicPaths {
    fn default() -> Self {
        Self::new(DEFAULT_PUBLIC_PATHS)
    }
}
