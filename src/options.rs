use std::ops::RangeInclusive;

use crate::error::SessionError;
use crate::handle::Handle;

/// A value of an option: either a single token or a brace-delimited list of values.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Single(String),
    List(Vec<OptionValue>),
}

impl OptionValue {
    /// Flattens the value into its tokens, in order.
    fn tokens(&self) -> Vec<&str> {
        match self {
            OptionValue::Single(token) => vec![token.as_str()],
            OptionValue::List(values) => values.iter().flat_map(|value| value.tokens()).collect(),
        }
    }
}

#[derive(Debug, PartialEq)]
enum Token {
    Open,
    Close,
    Word(String),
}

fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    for character in text.chars() {
        match character {
            '{' | '}' => {
                if !word.is_empty() {
                    tokens.push(Token::Word(std::mem::take(&mut word)));
                }
                tokens.push(if character == '{' {
                    Token::Open
                } else {
                    Token::Close
                });
            }
            character if character.is_whitespace() => {
                if !word.is_empty() {
                    tokens.push(Token::Word(std::mem::take(&mut word)));
                }
            }
            character => word.push(character),
        }
    }
    if !word.is_empty() {
        tokens.push(Token::Word(word));
    }
    tokens
}

/// A parsed option list, such as `fitmethod meet boxsize {200 100} position 50`.
/// Keys are case-insensitive and a key given twice keeps its last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionList {
    entries: Vec<(String, OptionValue)>,
}

impl OptionList {
    pub fn parse(text: &str) -> Result<OptionList, SessionError> {
        let mut tokens = tokenize(text).into_iter().peekable();
        let mut entries = Vec::new();

        while let Some(token) = tokens.next() {
            let key = match token {
                Token::Word(key) => key.to_lowercase(),
                Token::Open | Token::Close => {
                    return Err(SessionError::option(format!(
                        "Malformed option list {:?}: expected a key but found a brace",
                        text
                    )))
                }
            };
            let value = match tokens.next() {
                Some(Token::Word(word)) => OptionValue::Single(word),
                Some(Token::Open) => parse_list(&mut tokens).ok_or_else(|| {
                    SessionError::option(format!(
                        "Malformed option list {:?}: unbalanced braces in the value of {:?}",
                        text, key
                    ))
                })?,
                Some(Token::Close) | None => {
                    return Err(SessionError::option(format!(
                        "Malformed option list {:?}: missing value for option {:?}",
                        text, key
                    )))
                }
            };
            entries.push((key, value));
        }

        Ok(OptionList { entries })
    }

    /// Parses the option list and rejects any key which is not in `known_keys`.
    pub fn parse_with_keys(text: &str, known_keys: &[&str]) -> Result<OptionList, SessionError> {
        let option_list = OptionList::parse(text)?;
        option_list.ensure_known(known_keys)?;
        Ok(option_list)
    }

    pub fn ensure_known(&self, known_keys: &[&str]) -> Result<(), SessionError> {
        for (key, _) in &self.entries {
            if !known_keys.contains(&key.as_str()) {
                return Err(SessionError::option(format!("Unknown option {:?}", key)));
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.entries
            .iter()
            .rev()
            .find(|(entry_key, _)| entry_key == key)
            .map(|(_, value)| value)
    }

    pub fn string(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.get(key).map(|value| value.tokens().join(" ")))
    }

    pub fn float(&self, key: &str) -> Result<Option<f32>, SessionError> {
        Ok(self.floats(key, 1..=1)?.map(|values| values[0]))
    }

    pub fn floats(
        &self,
        key: &str,
        arity: RangeInclusive<usize>,
    ) -> Result<Option<Vec<f32>>, SessionError> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        let tokens = value.tokens();
        if !arity.contains(&tokens.len()) {
            return Err(SessionError::option(format!(
                "Option {:?} expects between {} and {} numbers but got {}",
                key,
                arity.start(),
                arity.end(),
                tokens.len()
            )));
        }
        tokens
            .into_iter()
            .map(|token| {
                token
                    .parse::<f32>()
                    .ok()
                    .filter(|number| number.is_finite())
                    .ok_or_else(|| {
                        SessionError::option(format!(
                            "Option {:?} expects a number but got {:?}",
                            key, token
                        ))
                    })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    pub fn integer(&self, key: &str) -> Result<Option<i64>, SessionError> {
        let Some(token) = self.single_token(key)? else {
            return Ok(None);
        };
        token.parse::<i64>().map(Some).map_err(|_| {
            SessionError::option(format!(
                "Option {:?} expects an integer but got {:?}",
                key, token
            ))
        })
    }

    pub fn boolean(&self, key: &str) -> Result<Option<bool>, SessionError> {
        let Some(token) = self.single_token(key)? else {
            return Ok(None);
        };
        match token.to_lowercase().as_str() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            _ => Err(SessionError::option(format!(
                "Option {:?} expects true or false but got {:?}",
                key, token
            ))),
        }
    }

    /// Retrieves a keyword, lower-cased, which must be one of `allowed`.
    pub fn keyword(&self, key: &str, allowed: &[&str]) -> Result<Option<String>, SessionError> {
        let Some(token) = self.single_token(key)? else {
            return Ok(None);
        };
        let keyword = token.to_lowercase();
        if allowed.contains(&keyword.as_str()) {
            Ok(Some(keyword))
        } else {
            Err(SessionError::option(format!(
                "Option {:?} expects one of {:?} but got {:?}",
                key, allowed, token
            )))
        }
    }

    pub fn handle(&self, key: &str) -> Result<Option<Handle>, SessionError> {
        let Some(token) = self.single_token(key)? else {
            return Ok(None);
        };
        token.parse::<u64>().map(|value| Some(Handle(value))).map_err(|_| {
            SessionError::option(format!(
                "Option {:?} expects a handle but got {:?}",
                key, token
            ))
        })
    }

    fn single_token(&self, key: &str) -> Result<Option<&str>, SessionError> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        match value.tokens()[..] {
            [token] => Ok(Some(token)),
            _ => Err(SessionError::option(format!(
                "Option {:?} expects a single value",
                key
            ))),
        }
    }
}

/// Parses the remainder of a list whose opening brace was already consumed, returns
/// `None` when the closing brace is missing.
fn parse_list(tokens: &mut std::iter::Peekable<std::vec::IntoIter<Token>>) -> Option<OptionValue> {
    let mut values = Vec::new();
    loop {
        match tokens.next()? {
            Token::Close => return Some(OptionValue::List(values)),
            Token::Open => values.push(parse_list(tokens)?),
            Token::Word(word) => values.push(OptionValue::Single(word)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn parses_single_values_and_lists() {
        let options = OptionList::parse("position {100 0}  scale 0.5 fitmethod{meet}").unwrap();
        assert_eq!(
            options.floats("position", 1..=2).unwrap(),
            Some(vec![100.0, 0.0])
        );
        assert_eq!(options.float("scale").unwrap(), Some(0.5));
        assert_eq!(
            options.keyword("fitmethod", &["meet", "clip"]).unwrap(),
            Some("meet".into())
        );
        assert_eq!(options.float("rotate").unwrap(), None);
    }

    #[test]
    fn keys_are_case_insensitive_and_last_one_wins() {
        let options = OptionList::parse("Scale 2 SCALE 3").unwrap();
        assert_eq!(options.float("scale").unwrap(), Some(3.0));
    }

    #[test]
    fn nested_lists_are_flattened_for_typed_access() {
        let options = OptionList::parse("dasharray {{1 2} 3}").unwrap();
        assert_eq!(
            options.floats("dasharray", 1..=8).unwrap(),
            Some(vec![1.0, 2.0, 3.0])
        );
    }

    #[test]
    fn unknown_keys_are_named_in_the_error() {
        let error = OptionList::parse_with_keys("scale 1 bogus 2", &["scale"]).unwrap_err();
        assert_eq!(error.kind, ErrorKind::Option);
        assert!(error.context.contains("\"bogus\""));
    }

    #[test]
    fn malformed_lists_are_rejected() {
        for text in ["position {1 2", "scale", "} scale 1", "position {1 {2}"] {
            let error = OptionList::parse(text).unwrap_err();
            assert_eq!(error.kind, ErrorKind::Option, "{}", text);
        }
    }

    #[test]
    fn values_of_the_wrong_type_are_rejected() {
        let options = OptionList::parse("scale abc position {1 2 3} ignoremask maybe").unwrap();
        assert!(options.float("scale").is_err());
        assert!(options.floats("position", 1..=2).is_err());
        assert!(options.boolean("ignoremask").is_err());
    }

    #[test]
    fn empty_option_list_is_valid() {
        let options = OptionList::parse("   ").unwrap();
        assert!(options.is_empty());
        assert!(!options.contains("scale"));
    }
}
