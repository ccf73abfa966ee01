//! Contextual excerpt extraction
//!
//! Scans a buffer with the excerpt regex produced by a search, merges
//! matches that fall within the context window into fragments, and
//! returns the densest fragments with every match highlighted.

use regex::Regex;

use crate::config::ExcerptConfig;

#[derive(Debug)]
struct Fragment {
    start: usize,
    end: usize,
    count: usize,
}

pub struct Excerpter<'a> {
    config: &'a ExcerptConfig,
}

impl<'a> Excerpter<'a> {
    pub fn new(config: &'a ExcerptConfig) -> Self {
        Self { config }
    }

    /// Extract highlighted excerpts from `buf`
    pub fn excerpts(&self, buf: &str, regex: &Regex) -> Vec<String> {
        let ctxt = self.config.ctxt_num_chars;

        let mut fragments: Vec<Fragment> = Vec::new();
        for m in regex.find_iter(buf) {
            match fragments.last_mut() {
                Some(last) if m.start() <= last.end + ctxt => {
                    last.end = m.end();
                    last.count += 1;
                }
                _ => fragments.push(Fragment {
                    start: m.start(),
                    end: m.end(),
                    count: 1,
                }),
            }
        }

        for fragment in &mut fragments {
            fragment.start = floor_char_boundary(buf, fragment.start.saturating_sub(ctxt));
            fragment.end = ceil_char_boundary(buf, (fragment.end + ctxt).min(buf.len()));
        }

        // Densest fragments first; stable sort keeps buffer order on ties
        fragments.sort_by(|a, b| b.count.cmp(&a.count));
        fragments.truncate(self.config.max_excerpts);

        fragments
            .iter()
            .map(|fragment| {
                let snippet = &buf[fragment.start..fragment.end];
                let highlighted = regex.replace_all(snippet, |caps: &regex::Captures<'_>| {
                    format!(
                        "{}{}{}",
                        self.config.pre_match,
                        &caps[0],
                        self.config.post_match
                    )
                });
                format!("...{}...", highlighted)
            })
            .collect()
    }
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_char_boundary(s: &str, mut index: usize) -> usize {
    while index < s.len() && !s.is_char_boundary(index) {
        index += 1;
    }
    index
}
