//! Query-string parser
//!
//! Turns a user query string into the signed tree the translator walks:
//!
//! ```text
//! query := entry*
//! entry := ('+' | '-')? atom | OR
//! atom  := '(' query ')' | quoted | word (':' (word | quoted))?
//! ```
//!
//! Unsigned entries become mandatory when `implicit_plus` is set and
//! optional otherwise. The uppercase keyword `OR` downgrades the entries
//! it joins to optional regardless of `implicit_plus` (lowercase `or`
//! stays an ordinary term). Quoted values keep their raw inner text; the
//! translator re-tokenizes them with the indexer's own word regex.

use crate::error::{Result, SquillError};
use crate::query::ast::{ParsedGroup, ParsedSub, Sign};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Quoted(String),
    Or,
    Plus,
    Minus,
    Colon,
    LeftParen,
    RightParen,
    Eof,
}

struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    fn next_token(&mut self) -> Result<Token> {
        while self.position < self.input.len() && self.input[self.position].is_whitespace() {
            self.position += 1;
        }

        if self.position >= self.input.len() {
            return Ok(Token::Eof);
        }

        let ch = self.input[self.position];
        match ch {
            '+' => {
                self.position += 1;
                Ok(Token::Plus)
            }
            '-' => {
                self.position += 1;
                Ok(Token::Minus)
            }
            ':' => {
                self.position += 1;
                Ok(Token::Colon)
            }
            '(' => {
                self.position += 1;
                Ok(Token::LeftParen)
            }
            ')' => {
                self.position += 1;
                Ok(Token::RightParen)
            }
            '"' | '\'' => {
                self.position += 1;
                self.read_quoted(ch)
            }
            _ => self.read_word(),
        }
    }

    fn read_quoted(&mut self, quote: char) -> Result<Token> {
        let mut value = String::new();
        while self.position < self.input.len() {
            let ch = self.input[self.position];
            self.position += 1;
            if ch == quote {
                return Ok(Token::Quoted(value));
            }
            value.push(ch);
        }
        Err(SquillError::QueryParse(
            "unterminated quoted phrase".to_string(),
        ))
    }

    fn read_word(&mut self) -> Result<Token> {
        let mut word = String::new();
        while self.position < self.input.len() {
            let ch = self.input[self.position];
            if ch.is_whitespace() || matches!(ch, '+' | '-' | ':' | '(' | ')' | '"' | '\'') {
                break;
            }
            word.push(ch);
            self.position += 1;
        }
        if word == "OR" {
            Ok(Token::Or)
        } else {
            Ok(Token::Word(word))
        }
    }
}

/// Recursive-descent parser producing signed query groups
#[derive(Debug, Default)]
pub struct QueryParser;

impl QueryParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse `input` into sign groups
    pub fn parse(&self, input: &str, implicit_plus: bool) -> Result<Vec<ParsedGroup>> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token()?;
        let mut state = ParserState { lexer, current };
        let groups = state.parse_entries(implicit_plus)?;
        if state.current != Token::Eof {
            return Err(SquillError::QueryParse(format!(
                "unexpected token after query: {:?}",
                state.current
            )));
        }
        Ok(groups)
    }
}

struct ParserState {
    lexer: Lexer,
    current: Token,
}

impl ParserState {
    fn advance(&mut self) -> Result<()> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    /// Parse entries until EOF or a closing parenthesis
    fn parse_entries(&mut self, implicit_plus: bool) -> Result<Vec<ParsedGroup>> {
        // (explicit sign, joined by OR, subquery)
        let mut entries: Vec<(Option<Sign>, bool, ParsedSub)> = Vec::new();
        let mut or_pending = false;

        loop {
            match self.current {
                Token::Eof | Token::RightParen => break,
                Token::Or => {
                    if let Some(last) = entries.last_mut() {
                        last.1 = true;
                    }
                    or_pending = true;
                    self.advance()?;
                }
                Token::Plus => {
                    self.advance()?;
                    let sub = self.parse_atom(implicit_plus)?;
                    entries.push((Some(Sign::Must), false, sub));
                    or_pending = false;
                }
                Token::Minus => {
                    self.advance()?;
                    let sub = self.parse_atom(implicit_plus)?;
                    entries.push((Some(Sign::Not), false, sub));
                    or_pending = false;
                }
                _ => {
                    let sub = self.parse_atom(implicit_plus)?;
                    entries.push((None, or_pending, sub));
                    or_pending = false;
                }
            }
        }

        let mut groups: Vec<ParsedGroup> = Vec::new();
        for sign in [Sign::Must, Sign::Optional, Sign::Not] {
            let subs: Vec<ParsedSub> = entries
                .iter()
                .filter(|(explicit, or_joined, _)| {
                    let resolved = match explicit {
                        Some(s) => *s,
                        None if *or_joined => Sign::Optional,
                        None if implicit_plus => Sign::Must,
                        None => Sign::Optional,
                    };
                    resolved == sign
                })
                .map(|(_, _, sub)| sub.clone())
                .collect();
            if !subs.is_empty() {
                groups.push(ParsedGroup { sign, subs });
            }
        }
        Ok(groups)
    }

    fn parse_atom(&mut self, implicit_plus: bool) -> Result<ParsedSub> {
        match self.current.clone() {
            Token::LeftParen => {
                self.advance()?;
                let groups = self.parse_entries(implicit_plus)?;
                if self.current != Token::RightParen {
                    return Err(SquillError::QueryParse(
                        "missing closing parenthesis".to_string(),
                    ));
                }
                self.advance()?;
                Ok(ParsedSub::Paren(groups))
            }
            Token::Quoted(value) => {
                self.advance()?;
                Ok(ParsedSub::Match { field: None, value })
            }
            Token::Word(word) => {
                self.advance()?;
                if self.current == Token::Colon {
                    self.advance()?;
                    match self.current.clone() {
                        Token::Word(value) => {
                            self.advance()?;
                            Ok(ParsedSub::Match {
                                field: Some(word),
                                value,
                            })
                        }
                        Token::Quoted(value) => {
                            self.advance()?;
                            Ok(ParsedSub::Match {
                                field: Some(word),
                                value,
                            })
                        }
                        _ => Err(SquillError::QueryParse(format!(
                            "expected value after '{}:'",
                            word
                        ))),
                    }
                } else {
                    Ok(ParsedSub::Match {
                        field: None,
                        value: word,
                    })
                }
            }
            other => Err(SquillError::QueryParse(format!(
                "unexpected token: {:?}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(value: &str) -> ParsedSub {
        ParsedSub::Match {
            field: None,
            value: value.to_string(),
        }
    }

    #[test]
    fn test_implicit_plus() {
        let groups = QueryParser::new().parse("quick fox", true).unwrap();
        assert_eq!(
            groups,
            vec![ParsedGroup {
                sign: Sign::Must,
                subs: vec![term("quick"), term("fox")],
            }]
        );
    }

    #[test]
    fn test_implicit_optional() {
        let groups = QueryParser::new().parse("quick fox", false).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].sign, Sign::Optional);
    }

    #[test]
    fn test_explicit_signs() {
        let groups = QueryParser::new().parse("+brown -dogs fox", true).unwrap();
        assert_eq!(
            groups,
            vec![
                ParsedGroup {
                    sign: Sign::Must,
                    subs: vec![term("brown"), term("fox")],
                },
                ParsedGroup {
                    sign: Sign::Not,
                    subs: vec![term("dogs")],
                },
            ]
        );
    }

    #[test]
    fn test_or_downgrades_to_optional() {
        let groups = QueryParser::new().parse("fox OR dogs", true).unwrap();
        assert_eq!(
            groups,
            vec![ParsedGroup {
                sign: Sign::Optional,
                subs: vec![term("fox"), term("dogs")],
            }]
        );
    }

    #[test]
    fn test_lowercase_or_is_a_term() {
        let groups = QueryParser::new().parse("fox or dogs", true).unwrap();
        assert_eq!(groups[0].subs.len(), 3);
    }

    #[test]
    fn test_quoted_phrase() {
        let groups = QueryParser::new().parse("'quick brown'", true).unwrap();
        assert_eq!(
            groups,
            vec![ParsedGroup {
                sign: Sign::Must,
                subs: vec![term("quick brown")],
            }]
        );
    }

    #[test]
    fn test_field_qualified() {
        let groups = QueryParser::new().parse("title:fox body:'lazy dog'", true).unwrap();
        assert_eq!(
            groups[0].subs,
            vec![
                ParsedSub::Match {
                    field: Some("title".to_string()),
                    value: "fox".to_string(),
                },
                ParsedSub::Match {
                    field: Some("body".to_string()),
                    value: "lazy dog".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_parenthesised_group() {
        let groups = QueryParser::new().parse("+(fox OR dogs) -lazy", true).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].sign, Sign::Must);
        match &groups[0].subs[0] {
            ParsedSub::Paren(inner) => {
                assert_eq!(inner.len(), 1);
                assert_eq!(inner[0].sign, Sign::Optional);
                assert_eq!(inner[0].subs.len(), 2);
            }
            other => panic!("expected paren group, got {:?}", other),
        }
        assert_eq!(groups[1].sign, Sign::Not);
    }

    #[test]
    fn test_unterminated_quote() {
        let err = QueryParser::new().parse("'quick brown", true).unwrap_err();
        assert!(matches!(err, SquillError::QueryParse(_)));
    }

    #[test]
    fn test_missing_close_paren() {
        let err = QueryParser::new().parse("(fox dogs", true).unwrap_err();
        assert!(matches!(err, SquillError::QueryParse(_)));
    }

    #[test]
    fn test_missing_field_value() {
        let err = QueryParser::new().parse("title:", true).unwrap_err();
        assert!(matches!(err, SquillError::QueryParse(_)));
    }

    #[test]
    fn test_empty_query() {
        let groups = QueryParser::new().parse("   ", true).unwrap();
        assert!(groups.is_empty());
    }
}
