//! Image reference matching.
//!
//! An [`ImagePattern`] locates `<registry-prefix><image>:<tag>` references in
//! raw file bytes. Matching works on bytes so that files which are not valid
//! UTF-8 can still be scanned and rewritten without losing their other
//! content.
//!
//! Tags that are intentionally decoupled from the release version are never
//! matched: shell/template placeholders (`$TAG`, `${TAG}`) and the reserved
//! words `latest`, `local`, `dev` and `test`.

use crate::error::{Result, TagSyncError};
use regex::bytes::Regex;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

/// Tags that never count as a versioned reference.
pub const RESERVED_TAGS: &[&str] = &["latest", "local", "dev", "test"];

/// Zero or more `segment[:port]/` parts in front of the image name.
const REGISTRY_PREFIX: &str = r"((?:[a-zA-Z0-9._-]+(?::[0-9]+)?/)+)?";
const TAG: &str = r"([a-zA-Z0-9._-]+)";

/// One image reference found in a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageMatch<'h> {
    /// Registry/namespace prefix including its trailing `/`, or empty.
    pub prefix: &'h [u8],
    /// The tag after the colon.
    pub tag: &'h str,
    /// Byte range of the whole reference (prefix through tag).
    pub range: Range<usize>,
}

/// Compiled matcher for one literal image name.
#[derive(Debug)]
pub struct ImagePattern {
    image: String,
    regex: Regex,
}

impl ImagePattern {
    /// Build a matcher for `image`. The name is escaped, so characters such
    /// as `.` or `+` only ever match themselves.
    pub fn new(image: &str) -> Result<Self> {
        let source = format!("{}{}:{}", REGISTRY_PREFIX, regex::escape(image), TAG);
        let regex = Regex::new(&source).map_err(|source| TagSyncError::Pattern {
            image: image.to_string(),
            source,
        })?;
        Ok(Self {
            image: image.to_string(),
            regex,
        })
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    /// Iterate over all versioned references in `haystack`, left to right.
    pub fn find_iter<'p, 'h>(&'p self, haystack: &'h [u8]) -> Matches<'p, 'h> {
        Matches {
            pattern: self,
            haystack,
            pos: 0,
        }
    }

    /// First versioned reference in `haystack`, if any.
    pub fn find<'h>(&self, haystack: &'h [u8]) -> Option<ImageMatch<'h>> {
        self.find_iter(haystack).next()
    }

    /// Rewrite every reference to carry `tag`, keeping each prefix as found.
    ///
    /// Returns the new content and the number of references whose tag
    /// actually changed. Content is returned unchanged when that count is 0.
    pub fn replace_tags(&self, haystack: &[u8], tag: &str) -> (Vec<u8>, usize) {
        let mut out = Vec::with_capacity(haystack.len());
        let mut last = 0;
        let mut replaced = 0;

        for found in self.find_iter(haystack) {
            if found.tag == tag {
                continue;
            }
            out.extend_from_slice(&haystack[last..found.range.start]);
            out.extend_from_slice(found.prefix);
            out.extend_from_slice(self.image.as_bytes());
            out.push(b':');
            out.extend_from_slice(tag.as_bytes());
            last = found.range.end;
            replaced += 1;
        }

        if replaced == 0 {
            return (haystack.to_vec(), 0);
        }
        out.extend_from_slice(&haystack[last..]);
        (out, replaced)
    }
}

/// Iterator returned by [`ImagePattern::find_iter`].
pub struct Matches<'p, 'h> {
    pattern: &'p ImagePattern,
    haystack: &'h [u8],
    pos: usize,
}

impl<'p, 'h> Iterator for Matches<'p, 'h> {
    type Item = ImageMatch<'h>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos <= self.haystack.len() {
            let caps = self.pattern.regex.captures_at(self.haystack, self.pos)?;
            let whole = caps.get(0)?;
            let tag = caps.get(2)?;

            if is_reserved_at(&self.haystack[tag.start()..]) {
                // Retry from the next byte: a shorter reference may start
                // inside the rejected one.
                self.pos = whole.start() + 1;
                continue;
            }

            self.pos = whole.end();
            // Tag bytes are restricted to ASCII by the pattern.
            let tag = std::str::from_utf8(tag.as_bytes()).ok()?;
            let prefix = caps.get(1).map_or(&b""[..], |m| m.as_bytes());
            return Some(ImageMatch {
                prefix,
                tag,
                range: whole.range(),
            });
        }
        None
    }
}

/// True when `rest` starts with a reserved tag followed by a word boundary.
fn is_reserved_at(rest: &[u8]) -> bool {
    RESERVED_TAGS.iter().any(|word| {
        rest.starts_with(word.as_bytes()) && !starts_with_word_char(&rest[word.len()..])
    })
}

fn starts_with_word_char(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(4)];
    let decoded = match std::str::from_utf8(head) {
        Ok(s) => s,
        Err(e) => std::str::from_utf8(&head[..e.valid_up_to()]).unwrap_or(""),
    };
    decoded
        .chars()
        .next()
        .map_or(false, |c| c.is_alphanumeric() || c == '_')
}

/// Compiled patterns keyed by image name.
#[derive(Debug, Default)]
pub struct PatternCache {
    patterns: HashMap<String, Arc<ImagePattern>>,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached pattern for `image`, compiling it on first use.
    pub fn get_or_build(&mut self, image: &str) -> Result<Arc<ImagePattern>> {
        if let Some(pattern) = self.patterns.get(image) {
            return Ok(Arc::clone(pattern));
        }
        let pattern = Arc::new(ImagePattern::new(image)?);
        self.patterns.insert(image.to_string(), Arc::clone(&pattern));
        Ok(pattern)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn execd() -> ImagePattern {
        ImagePattern::new("opensandbox/execd").unwrap()
    }

    fn prefix_and_tag(pattern: &ImagePattern, text: &str) -> Option<(String, String)> {
        pattern.find(text.as_bytes()).map(|m| {
            (
                String::from_utf8(m.prefix.to_vec()).unwrap(),
                m.tag.to_string(),
            )
        })
    }

    #[test]
    fn test_matches_plain_reference() {
        let pattern = execd();
        assert!(pattern.find(b"image: opensandbox/execd:v1.0.0").is_some());
        assert!(pattern.find(br#""opensandbox/execd:v1.2.3""#).is_some());
        assert_eq!(
            prefix_and_tag(&pattern, "opensandbox/execd:v1.0.0"),
            Some((String::new(), "v1.0.0".to_string()))
        );
    }

    #[test]
    fn test_registry_prefix() {
        let pattern = execd();
        assert_eq!(
            prefix_and_tag(&pattern, "registry.example.com/opensandbox/execd:v1.0.0"),
            Some(("registry.example.com/".to_string(), "v1.0.0".to_string()))
        );
        assert_eq!(
            prefix_and_tag(
                &pattern,
                "sandbox-registry.cn-zhangjiakou.cr.aliyuncs.com/opensandbox/execd:v1.0.5"
            ),
            Some((
                "sandbox-registry.cn-zhangjiakou.cr.aliyuncs.com/".to_string(),
                "v1.0.5".to_string()
            ))
        );
    }

    #[test]
    fn test_registry_prefix_with_port_and_segments() {
        let pattern = ImagePattern::new("ns/image").unwrap();
        assert_eq!(
            prefix_and_tag(&pattern, "image: registry.example.com:5000/ns/image:v1.0.0"),
            Some(("registry.example.com:5000/".to_string(), "v1.0.0".to_string()))
        );
        assert_eq!(
            prefix_and_tag(&pattern, "localhost:5000/team/mirror/ns/image:1.2"),
            Some(("localhost:5000/team/mirror/".to_string(), "1.2".to_string()))
        );
    }

    #[test]
    fn test_ignores_reserved_and_placeholder_tags() {
        let pattern = execd();
        for text in [
            "opensandbox/execd:latest",
            "opensandbox/execd:local",
            "opensandbox/execd:dev",
            "opensandbox/execd:test",
            "opensandbox/execd:${TAG}",
            "opensandbox/execd:$TAG",
            "registry.example.com:5000/opensandbox/execd:latest",
            "my.registry/opensandbox/execd:${EXECD_TAG}",
            "docker build -t opensandbox/execd:dev .",
            "opensandbox/execd:latest-rc",
        ] {
            assert!(pattern.find(text.as_bytes()).is_none(), "matched {text}");
        }
    }

    #[test]
    fn test_reserved_word_must_be_whole_word() {
        let pattern = execd();
        assert_eq!(
            prefix_and_tag(&pattern, "opensandbox/execd:testing"),
            Some((String::new(), "testing".to_string()))
        );
        assert_eq!(
            prefix_and_tag(&pattern, "opensandbox/execd:dev_build"),
            Some((String::new(), "dev_build".to_string()))
        );
        assert_eq!(
            prefix_and_tag(&pattern, "opensandbox/execd:latest2"),
            Some((String::new(), "latest2".to_string()))
        );
    }

    #[test]
    fn test_image_name_is_literal() {
        let pattern = ImagePattern::new("my.org/app+x").unwrap();
        assert!(pattern.find(b"my.org/app+x:v1").is_some());
        assert!(pattern.find(b"myXorg/app+x:v1").is_none());
        assert!(pattern.find(b"my.org/appx:v1").is_none());
    }

    #[test]
    fn test_does_not_match_other_images() {
        let pattern = execd();
        assert!(pattern.find(b"opensandbox/egress:v1.0.0").is_none());
        assert!(pattern.find(b"opensandbox/execd").is_none());
        assert!(pattern.find(b"opensandbox/execd:").is_none());
    }

    #[test]
    fn test_find_iter_skips_reserved_between_matches() {
        let pattern = execd();
        let text = b"a: opensandbox/execd:v1\nb: opensandbox/execd:latest\nc: x.io/opensandbox/execd:v2\n";
        let tags: Vec<&str> = pattern.find_iter(text).map(|m| m.tag).collect();
        assert_eq!(tags, vec!["v1", "v2"]);
    }

    #[test]
    fn test_matches_in_non_utf8_content() {
        let pattern = execd();
        let mut content = vec![0xff, 0xfe, b'\n'];
        content.extend_from_slice(b"image: opensandbox/execd:v0.9.0");
        let found = pattern.find(&content).unwrap();
        assert_eq!(found.tag, "v0.9.0");
        assert_eq!(found.range.start, 10);
    }

    #[test]
    fn test_replace_tags_preserves_prefix() {
        let pattern = ImagePattern::new("ns/image").unwrap();
        let (out, n) = pattern.replace_tags(
            b"image: registry.example.com:5000/ns/image:v1.0.0",
            "v2.0.0",
        );
        assert_eq!(n, 1);
        assert_eq!(out, b"image: registry.example.com:5000/ns/image:v2.0.0");
    }

    #[test]
    fn test_replace_tags_leaves_placeholders_and_current() {
        let pattern = execd();
        let input = "a: opensandbox/execd:${TAG}\nb: opensandbox/execd:v2\nc: opensandbox/execd:v1\n";
        let (out, n) = pattern.replace_tags(input.as_bytes(), "v2");
        assert_eq!(n, 1);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "a: opensandbox/execd:${TAG}\nb: opensandbox/execd:v2\nc: opensandbox/execd:v2\n"
        );

        let (again, n) = pattern.replace_tags(b"no references here", "v2");
        assert_eq!(n, 0);
        assert_eq!(again, b"no references here");
    }

    #[test]
    fn test_pattern_cache_reuses_compiled_patterns() {
        let mut cache = PatternCache::new();
        let a = cache.get_or_build("opensandbox/execd").unwrap();
        let b = cache.get_or_build("opensandbox/execd").unwrap();
        let c = cache.get_or_build("opensandbox/egress").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(cache.len(), 2);
    }
}
