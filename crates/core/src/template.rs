use regex::{Captures, Regex, RegexBuilder};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("source pattern is empty")]
    EmptyPattern,
    #[error("invalid source pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// One piece of a parsed replacement template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplacementPart {
    Literal(String),
    Group(usize),
    Named(String),
    Before,
    After,
    LastGroup,
    Input,
}

#[derive(Debug, Clone)]
pub struct CompiledRule {
    regex: Regex,
    parts: Vec<ReplacementPart>,
    replace_all: bool,
}

impl CompiledRule {
    pub fn compile(
        pattern: &str,
        template: &str,
        case_sensitive: bool,
        replace_all: bool,
    ) -> Result<Self, TemplateError> {
        if pattern.is_empty() {
            return Err(TemplateError::EmptyPattern);
        }
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(!case_sensitive)
            .build()
            .map_err(|source| TemplateError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;
        let parts = parse_replacement(template, &regex);
        Ok(Self {
            regex,
            parts,
            replace_all,
        })
    }

    /// Returns `None` when the pattern does not match `source_name`.
    pub fn apply(&self, source_name: &str) -> Option<String> {
        if !self.regex.is_match(source_name) {
            return None;
        }
        let limit = if self.replace_all { 0 } else { 1 };
        let replaced = self.regex.replacen(source_name, limit, |caps: &Captures<'_>| {
            let mut out = String::new();
            expand(&self.parts, caps, source_name, &mut out);
            out
        });
        Some(replaced.into_owned())
    }

    pub fn parts(&self) -> &[ReplacementPart] {
        &self.parts
    }
}

/// Computes the target name for a single file name. A non-matching pattern
/// yields the source name unchanged.
pub fn compute_target(
    source_name: &str,
    pattern: &str,
    template: &str,
    case_sensitive: bool,
    replace_all: bool,
) -> Result<String, TemplateError> {
    let rule = CompiledRule::compile(pattern, template, case_sensitive, replace_all)?;
    Ok(rule
        .apply(source_name)
        .unwrap_or_else(|| source_name.to_string()))
}

/// Parses `$`-references in `template`. References to groups `regex` does not
/// define are kept as literal text, so `$1dog` reads as group 1 then `dog`.
pub fn parse_replacement(template: &str, regex: &Regex) -> Vec<ReplacementPart> {
    let group_count = regex.captures_len();
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            literal.push(ch);
            continue;
        }

        let part = match chars.peek().copied() {
            Some('$') => {
                chars.next();
                literal.push('$');
                continue;
            }
            Some('&') => ReplacementPart::Group(0),
            Some('`') => ReplacementPart::Before,
            Some('\'') => ReplacementPart::After,
            Some('+') => ReplacementPart::LastGroup,
            Some('_') => ReplacementPart::Input,
            Some(d) if d.is_ascii_digit() => {
                let mut digits = String::new();
                while let Some(d) = chars.next_if(char::is_ascii_digit) {
                    digits.push(d);
                }
                match digits.parse::<usize>() {
                    Ok(n) if n < group_count => {
                        flush_literal(&mut literal, &mut parts);
                        parts.push(ReplacementPart::Group(n));
                    }
                    _ => {
                        literal.push('$');
                        literal.push_str(&digits);
                    }
                }
                continue;
            }
            Some('{') => {
                let mut lookahead = chars.clone();
                lookahead.next();
                let mut name = String::new();
                let mut closed = false;
                for next in lookahead.by_ref() {
                    if next == '}' {
                        closed = true;
                        break;
                    }
                    name.push(next);
                }
                match braced_reference(&name, regex, group_count).filter(|_| closed) {
                    Some(part) => {
                        chars = lookahead;
                        flush_literal(&mut literal, &mut parts);
                        parts.push(part);
                    }
                    None => literal.push('$'),
                }
                continue;
            }
            _ => {
                literal.push('$');
                continue;
            }
        };

        chars.next();
        flush_literal(&mut literal, &mut parts);
        parts.push(part);
    }

    flush_literal(&mut literal, &mut parts);
    parts
}

fn braced_reference(name: &str, regex: &Regex, group_count: usize) -> Option<ReplacementPart> {
    if name.is_empty() {
        return None;
    }
    if name.chars().all(|c| c.is_ascii_digit()) {
        return name
            .parse::<usize>()
            .ok()
            .filter(|n| *n < group_count)
            .map(ReplacementPart::Group);
    }
    regex
        .capture_names()
        .flatten()
        .any(|known| known == name)
        .then(|| ReplacementPart::Named(name.to_string()))
}

fn flush_literal(literal: &mut String, parts: &mut Vec<ReplacementPart>) {
    if !literal.is_empty() {
        parts.push(ReplacementPart::Literal(std::mem::take(literal)));
    }
}

fn expand(parts: &[ReplacementPart], caps: &Captures<'_>, input: &str, out: &mut String) {
    for part in parts {
        match part {
            ReplacementPart::Literal(s) => out.push_str(s),
            ReplacementPart::Group(n) => {
                if let Some(m) = caps.get(*n) {
                    out.push_str(m.as_str());
                }
            }
            ReplacementPart::Named(name) => {
                if let Some(m) = caps.name(name) {
                    out.push_str(m.as_str());
                }
            }
            ReplacementPart::Before => {
                if let Some(m) = caps.get(0) {
                    out.push_str(&input[..m.start()]);
                }
            }
            ReplacementPart::After => {
                if let Some(m) = caps.get(0) {
                    out.push_str(&input[m.end()..]);
                }
            }
            ReplacementPart::LastGroup => {
                if let Some(m) = caps.get(caps.len().saturating_sub(1)) {
                    out.push_str(m.as_str());
                }
            }
            ReplacementPart::Input => out.push_str(input),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(source: &str, pattern: &str, template: &str, case_sensitive: bool) -> String {
        compute_target(source, pattern, template, case_sensitive, false).expect("must compile")
    }

    #[test]
    fn plain_text_case_insensitive() {
        assert_eq!(target("Cat", "cat", "dog", false), "dog");
        assert_eq!(target("cate", "cat", "dog", false), "doge");
        assert_eq!(target("acate", "cat", "dog", false), "adoge");
    }

    #[test]
    fn plain_text_case_sensitive() {
        assert_eq!(target("Cat", "Cat", "dog", true), "dog");
        assert_eq!(target("cate", "Cat", "dog", true), "cate");
        assert_eq!(target("aCate", "Cat", "dog", true), "adoge");
    }

    #[test]
    fn regex_wildcards() {
        assert_eq!(target("Cote", "c.t", "dog", false), "doge");
        assert_eq!(target("acte", "c.t", "dog", false), "acte");
        assert_eq!(target("cat", "C.t", "doG", true), "cat");
        assert_eq!(target("aCute", "C.t", "doG", true), "adoGe");
    }

    #[test]
    fn numbered_group_followed_by_letters() {
        assert_eq!(target("aCute", "(c.t)", "$1dog##", false), "aCutdog##e");
        assert_eq!(target("cuT", "(c.t)", "$1dog", false), "cuTdog");
    }

    #[test]
    fn date_style_groups() {
        assert_eq!(
            target(
                "IMG_20240131.jpeg",
                r"IMG_(\d{4})(\d\d)(\d\d)",
                "$1-$2-$3 IMG",
                false
            ),
            "2024-01-31 IMG.jpeg"
        );
    }

    #[test]
    fn replace_all_versus_first() {
        let source = "CatDogFrogDogDogFishDog";
        let all = compute_target(source, "d.g", "XYZ", false, true).expect("compile");
        assert_eq!(all, "CatXYZFrogXYZXYZFishXYZ");
        let first = compute_target(source, "d.g", "XYZ", false, false).expect("compile");
        assert_eq!(first, "CatXYZFrogDogDogFishDog");
    }

    #[test]
    fn replace_all_case_sensitive() {
        let out = compute_target("3CatdogFrogDogdogFishDog", "D.g", "XYZ", true, true)
            .expect("compile");
        assert_eq!(out, "3CatdogFrogXYZdogFishXYZ");
    }

    #[test]
    fn special_references() {
        assert_eq!(target("abc", "b", "[$&]", false), "a[b]c");
        assert_eq!(target("abc", "b", "[$`]", false), "a[a]c");
        assert_eq!(target("abc", "b", "[$']", false), "a[c]c");
        assert_eq!(target("abc", "b", "[$_]", false), "a[abc]c");
        assert_eq!(target("abc", "(a)(b)", "$+", false), "bc");
        assert_eq!(target("abc", "b", "$$", false), "a$c");
    }

    #[test]
    fn braced_and_named_references() {
        assert_eq!(target("abc", "(b)", "${1}0", false), "ab0c");
        assert_eq!(target("abc", "(?P<mid>b)", "<${mid}>", false), "a<b>c");
        assert_eq!(target("abc", "b", "${nope}", false), "a${nope}c");
    }

    #[test]
    fn unknown_group_stays_literal() {
        assert_eq!(target("abc", "(b)", "$2", false), "a$2c");
        assert_eq!(target("abc", "b", "$", false), "a$c");
    }

    #[test]
    fn empty_template_deletes_match() {
        assert_eq!(target("cat.jpeg", r"\.jpeg$", "", false), "cat");
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        let err = compute_target("cat", "(", "dog", false, false).expect_err("must fail");
        assert!(matches!(err, TemplateError::InvalidPattern { .. }));
    }

    #[test]
    fn empty_pattern_is_rejected() {
        let err = CompiledRule::compile("", "dog", false, false).expect_err("must fail");
        assert!(matches!(err, TemplateError::EmptyPattern));
    }

    #[test]
    fn apply_reports_no_match() {
        let rule = CompiledRule::compile("zzz", "dog", false, false).expect("compile");
        assert_eq!(rule.apply("cat"), None);
    }

    #[test]
    fn parse_splits_literals_and_groups() {
        let regex = Regex::new("(a)(b)").expect("regex");
        let parts = parse_replacement("x$2y$1", &regex);
        assert_eq!(
            parts,
            vec![
                ReplacementPart::Literal("x".to_string()),
                ReplacementPart::Group(2),
                ReplacementPart::Literal("y".to_string()),
                ReplacementPart::Group(1),
            ]
        );
    }
}
