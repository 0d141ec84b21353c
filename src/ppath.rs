//! Paths independent of the local file system (pure functions), as
//! seen in request URLs.

//! Does not concern itself with handling ".." or ".", i.e. does not
//! offer canonicalization.

use std::fmt::{self, Display};

use itertools::Itertools;
use kstring::KString;

/// Split a path string into its non-empty segments.
pub fn path_segments(s: &str) -> impl Iterator<Item = &str> {
    s.split('/').filter(|s| !s.is_empty())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PPath {
    is_absolute: bool,
    ends_with_slash: bool,
    segments: Vec<KString>, // without empty ones
}

impl PPath {
    pub fn new(is_absolute: bool, ends_with_slash: bool, segments: Vec<KString>) -> Self {
        PPath { is_absolute, ends_with_slash, segments }
    }

    pub fn from_str(s: &str) -> Self {
        let is_absolute = s.starts_with('/');
        let ends_with_slash = s.ends_with('/');
        PPath {
            is_absolute,
            ends_with_slash,
            segments: path_segments(s).map(KString::from_ref).collect(),
        }
    }

    pub fn is_absolute(&self) -> bool { self.is_absolute }
    pub fn ends_with_slash(&self) -> bool { self.ends_with_slash }
    pub fn segments(&self) -> &[KString] { &self.segments }

    /// The first `n` segments, as a directory path (ending with a
    /// slash unless it is the empty relative path). `n` larger than
    /// the number of segments is clipped.
    pub fn prefix(&self, n: usize) -> Self {
        let n = n.min(self.segments.len());
        PPath {
            is_absolute: self.is_absolute,
            ends_with_slash: self.is_absolute || n > 0,
            segments: self.segments[0..n].to_vec(),
        }
    }

    /// If `prefix` is a leading part of self (compared by segments,
    /// same absoluteness), return the relative rest.
    pub fn strip_prefix(&self, prefix: &PPath) -> Option<PPath> {
        if self.is_absolute != prefix.is_absolute {
            return None
        }
        let n = prefix.segments.len();
        if n > self.segments.len() || self.segments[0..n] != prefix.segments[..] {
            return None
        }
        Some(PPath {
            is_absolute: false,
            ends_with_slash: self.ends_with_slash,
            segments: self.segments[n..].to_vec(),
        })
    }
}

impl Display for PPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_absolute {
            f.write_str("/")?;
        }
        if self.segments.is_empty() {
            if !self.is_absolute {
                f.write_str(".")?;
                if self.ends_with_slash {
                    f.write_str("/")?;
                }
            }
        } else {
            f.write_str(&self.segments.iter().map(|s| s.as_str()).join("/"))?;
            if self.ends_with_slash {
                f.write_str("/")?;
            }
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_roundtrip_strings() {
        for s in ["/", "/shop", "/shop/", "/shop/books/rust", "docs/intro", "./"] {
            assert_eq!(PPath::from_str(s).to_string(), s);
        }
        // Multiple slashes collapse
        assert_eq!(PPath::from_str("//a///b/").to_string(), "/a/b/");
        assert_eq!(PPath::from_str("").to_string(), ".");
    }

    #[test]
    fn t_prefix() {
        let p = PPath::from_str("/shop/books/rust");
        assert_eq!(p.prefix(0).to_string(), "/");
        assert_eq!(p.prefix(1).to_string(), "/shop/");
        assert_eq!(p.prefix(2).to_string(), "/shop/books/");
        assert_eq!(p.prefix(10).to_string(), "/shop/books/rust/");
        assert_eq!(PPath::from_str("a/b").prefix(0).to_string(), ".");
    }

    #[test]
    fn t_strip_prefix() {
        let p = PPath::from_str("/shop/books/rust");
        assert_eq!(p.strip_prefix(&PPath::from_str("/shop")).map(|p| p.to_string()),
                   Some("books/rust".into()));
        assert_eq!(p.strip_prefix(&PPath::from_str("/")).map(|p| p.segments().len()),
                   Some(3));
        assert_eq!(p.strip_prefix(&PPath::from_str("/docs")), None);
        assert_eq!(p.strip_prefix(&PPath::from_str("shop")), None);
        let rest = p.strip_prefix(&p).expect("same path");
        assert!(rest.segments().is_empty());
    }
}
