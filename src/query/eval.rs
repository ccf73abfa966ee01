//! Score evaluation
//!
//! Combines translated subqueries into a per-document score map:
//! mandatory subqueries intersect, optional ones union-add, negative ones
//! subtract. A subquery with no information (unknown word, stopword, or a
//! term with no postings) yields `None` and is skipped rather than
//! emptying the result.

use std::collections::HashMap;

use crate::error::Result;
use crate::postings::Postings;
use crate::query::ast::{Sign, TranslatedGroup, TranslatedSub};
use crate::store::StoreSet;

/// Per-document integer scores
pub type Scores = HashMap<u32, i64>;

pub struct Evaluator<'a> {
    store: &'a StoreSet,
}

impl<'a> Evaluator<'a> {
    pub fn new(store: &'a StoreSet) -> Self {
        Self { store }
    }

    /// Evaluate a translated tree; `None` means no subquery had information
    pub fn evaluate(&self, groups: &[TranslatedGroup]) -> Result<Option<Scores>> {
        let mut scores: Option<Scores> = None;

        for sub in subs_with_sign(groups, Sign::Must) {
            let Some(sc) = self.score_sub(sub)? else {
                continue;
            };
            scores = Some(match scores {
                None => sc,
                Some(mut acc) => {
                    acc.retain(|doc, _| sc.contains_key(doc));
                    for (doc, total) in acc.iter_mut() {
                        if let Some(extra) = sc.get(doc) {
                            *total += extra;
                        }
                    }
                    acc
                }
            });
        }

        let no_mandatory = scores.is_none();
        for sub in subs_with_sign(groups, Sign::Optional) {
            let Some(sc) = self.score_sub(sub)? else {
                continue;
            };
            match scores.as_mut() {
                None => scores = Some(sc),
                Some(acc) => {
                    for (doc, extra) in sc {
                        if let Some(total) = acc.get_mut(&doc) {
                            *total += extra;
                        } else if no_mandatory {
                            acc.insert(doc, extra);
                        }
                    }
                }
            }
        }

        let Some(mut scores) = scores else {
            return Ok(None);
        };

        for sub in subs_with_sign(groups, Sign::Not) {
            if let Some(sc) = self.score_sub(sub)? {
                for doc in sc.keys() {
                    scores.remove(doc);
                }
            }
        }

        Ok(Some(scores))
    }

    fn score_sub(&self, sub: &TranslatedSub) -> Result<Option<Scores>> {
        match sub {
            TranslatedSub::NoInfo | TranslatedSub::Stopword => Ok(None),
            TranslatedSub::Term(word_id) => self.score_term(*word_id),
            TranslatedSub::Phrase(ids) => self.score_phrase(ids),
            TranslatedSub::Paren(groups) => self.evaluate(groups),
        }
    }

    /// Score one word: `floor(ln((N+1)/k) * 100 * occ)` per matched doc
    fn score_term(&self, word_id: u32) -> Result<Option<Scores>> {
        let postings = Postings::new(self.store);
        let records = postings.doc_records(word_id)?;
        if records.is_empty() {
            return Ok(None);
        }
        let total_docs = postings.doc_count()? as f64;
        let matched = records.len() as f64;
        let coeff = ((total_docs + 1.0) / matched).ln() * 100.0;

        let mut scores = Scores::with_capacity(records.len());
        for (doc, occ) in records {
            scores.insert(doc, (coeff * occ as f64).floor() as i64);
        }
        Ok(Some(scores))
    }

    /// Exact-phrase scoring by position-window intersection
    ///
    /// The first word with postings anchors the phrase; each later word
    /// may sit at most `word_delta` positions after it, where
    /// `word_delta` counts the words seen since the anchor. Stopword and
    /// unknown slots widen the window without constraining positions.
    fn score_phrase(&self, ids: &[i32]) -> Result<Option<Scores>> {
        let postings = Postings::new(self.store);
        let mut scores: Option<Scores> = None;
        let mut matched_pos: HashMap<u32, Vec<u32>> = HashMap::new();
        let mut word_delta: u32 = 0;

        for &id in ids {
            let sc = if id > 0 {
                self.score_term(id as u32)?
            } else {
                None
            };

            match scores.as_mut() {
                None => {
                    if let Some(sc) = sc {
                        for &doc in sc.keys() {
                            matched_pos.insert(doc, postings.positions(doc, id as u32)?);
                        }
                        scores = Some(sc);
                    }
                }
                Some(acc) => {
                    word_delta += 1;
                    let Some(sc) = sc else {
                        continue;
                    };
                    let docs: Vec<u32> = acc.keys().copied().collect();
                    for doc in docs {
                        let Some(&extra) = sc.get(&doc) else {
                            acc.remove(&doc);
                            matched_pos.remove(&doc);
                            continue;
                        };
                        let new_pos = postings.positions(doc, id as u32)?;
                        let near = near_positions(&matched_pos[&doc], &new_pos, word_delta);
                        if near.is_empty() {
                            acc.remove(&doc);
                            matched_pos.remove(&doc);
                        } else {
                            matched_pos.insert(doc, near);
                            if let Some(total) = acc.get_mut(&doc) {
                                *total += extra;
                            }
                        }
                    }
                }
            }
        }

        Ok(scores.filter(|sc| !sc.is_empty()))
    }
}

fn subs_with_sign(
    groups: &[TranslatedGroup],
    sign: Sign,
) -> impl Iterator<Item = &TranslatedSub> {
    groups
        .iter()
        .filter(move |group| group.sign == sign)
        .flat_map(|group| group.subs.iter())
}

/// Elements of `b` lying in `(a[i], a[i] + delta]` for some `a[i]`
///
/// Both inputs must be sorted ascending; the output is too.
pub fn near_positions(a: &[u32], b: &[u32], delta: u32) -> Vec<u32> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if b[j] as u64 > a[i] as u64 + delta as u64 {
            i += 1;
        } else if b[j] > a[i] {
            out.push(b[j]);
            j += 1;
        } else {
            j += 1;
        }
    }
    out
}
