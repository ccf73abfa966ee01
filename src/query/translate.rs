//! Query translation
//!
//! Walks a parsed tree, resolves every term to a wordId through the
//! dictionary, and collects the two side outputs of a search: the killed
//! words (stopwords, unknowns, normalizer-dropped terms) and the regex
//! fragments later combined into the excerpt regex.

use std::collections::BTreeSet;

use crate::dict::{Dictionary, STOPWORD_ID};
use crate::error::Result;
use crate::lexer::Lexer;
use crate::query::ast::{ParsedGroup, ParsedSub, TranslatedGroup, TranslatedSub};
use crate::store::StoreSet;

/// Everything the evaluator and the excerpter need from a query
#[derive(Debug)]
pub struct Translation {
    pub groups: Vec<TranslatedGroup>,
    /// Surface terms that did not contribute to the search, sorted
    pub killed_words: Vec<String>,
    /// `\W+`-joined fragments, surface and normalized form per subquery
    pub word_regexes: Vec<String>,
}

pub struct Translator<'a> {
    store: &'a StoreSet,
    lexer: &'a Lexer,
    fieldname: Option<&'a str>,
}

impl<'a> Translator<'a> {
    pub fn new(store: &'a StoreSet, lexer: &'a Lexer, fieldname: Option<&'a str>) -> Self {
        Self {
            store,
            lexer,
            fieldname,
        }
    }

    pub fn translate(&self, groups: &[ParsedGroup]) -> Result<Translation> {
        let mut killed = BTreeSet::new();
        let mut regexes = Vec::new();
        let translated = self.translate_groups(groups, &mut killed, &mut regexes)?;
        Ok(Translation {
            groups: translated,
            killed_words: killed.into_iter().collect(),
            word_regexes: regexes,
        })
    }

    fn translate_groups(
        &self,
        groups: &[ParsedGroup],
        killed: &mut BTreeSet<String>,
        regexes: &mut Vec<String>,
    ) -> Result<Vec<TranslatedGroup>> {
        let mut out = Vec::with_capacity(groups.len());
        for group in groups {
            let mut subs = Vec::with_capacity(group.subs.len());
            for sub in &group.subs {
                match sub {
                    ParsedSub::Paren(inner) => {
                        subs.push(TranslatedSub::Paren(
                            self.translate_groups(inner, killed, regexes)?,
                        ));
                    }
                    ParsedSub::Match { field, value } => {
                        // A field-qualified subquery is only ours when the
                        // field matches the configured name
                        if let Some(field) = field {
                            if self.fieldname != Some(field.as_str()) {
                                continue;
                            }
                        }
                        subs.push(self.translate_match(value, killed, regexes)?);
                    }
                }
            }
            if !subs.is_empty() {
                out.push(TranslatedGroup {
                    sign: group.sign,
                    subs,
                });
            }
        }
        Ok(out)
    }

    fn translate_match(
        &self,
        value: &str,
        killed: &mut BTreeSet<String>,
        regexes: &mut Vec<String>,
    ) -> Result<TranslatedSub> {
        // Re-tokenize with our own regex: the parser's idea of a term
        // boundary does not have to match ours
        let surface = self.lexer.surface_tokens(value);
        if surface.is_empty() {
            return Ok(TranslatedSub::NoInfo);
        }

        let escaped: Vec<String> = surface.iter().map(|w| regex::escape(w)).collect();
        regexes.push(escaped.join(r"\W+"));
        let normalized: Vec<String> = surface
            .iter()
            .map(|w| self.lexer.normalize(w))
            .filter(|w| !w.is_empty())
            .map(|w| regex::escape(&w))
            .collect();
        if !normalized.is_empty() {
            regexes.push(normalized.join(r"\W+"));
        }

        let dict = Dictionary::new(self.store);
        let mut ids: Vec<i32> = Vec::with_capacity(surface.len());
        for word in &surface {
            let normalized = self.lexer.normalize(word);
            // An empty normalization never has a dictionary entry, so it
            // reads as unknown and keeps its slot in a phrase
            let id = if normalized.is_empty() {
                None
            } else {
                dict.word_id(&normalized)?
            };
            match id {
                Some(id) if id > 0 => ids.push(id),
                Some(_) => {
                    killed.insert((*word).to_string());
                    ids.push(STOPWORD_ID);
                }
                None => {
                    killed.insert((*word).to_string());
                    ids.push(0);
                }
            }
        }

        Ok(match ids.len() {
            0 => TranslatedSub::NoInfo,
            1 => match ids[0] {
                0 => TranslatedSub::NoInfo,
                STOPWORD_ID => TranslatedSub::Stopword,
                id => TranslatedSub::Term(id as u32),
            },
            _ => TranslatedSub::Phrase(ids),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::default_normalizer;
    use crate::query::parser::QueryParser;
    use crate::query::ast::Sign;
    use crate::store::OpenMode;
    use tempfile::TempDir;

    fn seeded_stores(tmp: &TempDir) -> StoreSet {
        let stores = StoreSet::open(tmp.path(), OpenMode::Write).unwrap();
        let dict = Dictionary::new(&stores);
        dict.mark_stopword("the").unwrap();
        dict.word_id_or_assign("quick").unwrap(); // 1
        dict.word_id_or_assign("brown").unwrap(); // 2
        dict.word_id_or_assign("fox").unwrap(); // 3
        stores
    }

    fn translate(stores: &StoreSet, query: &str) -> Translation {
        let lexer = Lexer::new(r"\w+", default_normalizer()).unwrap();
        let parsed = QueryParser::new().parse(query, true).unwrap();
        Translator::new(stores, &lexer, Some("body"))
            .translate(&parsed)
            .unwrap()
    }

    #[test]
    fn test_known_term() {
        let tmp = TempDir::new().unwrap();
        let stores = seeded_stores(&tmp);
        let translation = translate(&stores, "Fox");
        assert_eq!(
            translation.groups,
            vec![TranslatedGroup {
                sign: Sign::Must,
                subs: vec![TranslatedSub::Term(3)],
            }]
        );
        assert!(translation.killed_words.is_empty());
    }

    #[test]
    fn test_stopword_and_unknown_are_killed() {
        let tmp = TempDir::new().unwrap();
        let stores = seeded_stores(&tmp);
        let translation = translate(&stores, "the zebra fox");
        assert_eq!(translation.killed_words, vec!["the", "zebra"]);
        assert_eq!(
            translation.groups[0].subs,
            vec![
                TranslatedSub::Stopword,
                TranslatedSub::NoInfo,
                TranslatedSub::Term(3),
            ]
        );
    }

    #[test]
    fn test_phrase_keeps_slot_ids() {
        let tmp = TempDir::new().unwrap();
        let stores = seeded_stores(&tmp);
        let translation = translate(&stores, "'the quick zebra fox'");
        assert_eq!(
            translation.groups[0].subs,
            vec![TranslatedSub::Phrase(vec![STOPWORD_ID, 1, 0, 3])]
        );
        assert_eq!(translation.killed_words, vec!["the", "zebra"]);
    }

    #[test]
    fn test_dropped_terms_occupy_phrase_slots() {
        let tmp = TempDir::new().unwrap();
        let stores = seeded_stores(&tmp);

        // Normalizer drops two-letter tokens, as the indexer would have
        let normalizer: crate::config::Normalizer = std::sync::Arc::new(|t: &str| {
            if t.len() <= 2 {
                String::new()
            } else {
                crate::lexer::latin1_fold(t)
            }
        });
        let lexer = Lexer::new(r"\w+", normalizer).unwrap();
        let parsed = QueryParser::new().parse("'quick ok fox'", true).unwrap();
        let translation = Translator::new(&stores, &lexer, None)
            .translate(&parsed)
            .unwrap();

        assert_eq!(
            translation.groups[0].subs,
            vec![TranslatedSub::Phrase(vec![1, 0, 3])]
        );
        assert_eq!(translation.killed_words, vec!["ok"]);
    }

    #[test]
    fn test_foreign_field_is_dropped() {
        let tmp = TempDir::new().unwrap();
        let stores = seeded_stores(&tmp);
        let translation = translate(&stores, "title:fox body:brown");
        assert_eq!(
            translation.groups[0].subs,
            vec![TranslatedSub::Term(2)]
        );
    }

    #[test]
    fn test_word_regexes_cover_surface_and_normalized() {
        let tmp = TempDir::new().unwrap();
        let stores = seeded_stores(&tmp);
        let translation = translate(&stores, "'Quick Brown'");
        assert_eq!(
            translation.word_regexes,
            vec![r"Quick\W+Brown".to_string(), r"quick\W+brown".to_string()]
        );
    }

    #[test]
    fn test_empty_value_is_no_info() {
        let tmp = TempDir::new().unwrap();
        let stores = seeded_stores(&tmp);
        let translation = translate(&stores, "'...'");
        assert_eq!(translation.groups.len(), 1);
        assert_eq!(translation.groups[0].subs, vec![TranslatedSub::NoInfo]);
        assert!(translation.word_regexes.is_empty());
    }
}
