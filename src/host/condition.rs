//! Evaluator for interface table conditions.
//!
//! Supports a small subset of installer condition syntax:
//!
//! ```text
//! expr  := and ( OR and )*
//! and   := unary ( AND unary )*
//! unary := NOT unary | term
//! term  := INTEGER | PROPERTY [ ( "=" | "<>" ) "text" ] | "(" expr ")"
//! ```
//!
//! Keywords are case-insensitive. A bare integer is true when non-zero; a
//! bare property is true when it is set to a non-empty value. Anything the
//! grammar does not cover is an evaluation error, never a silent `false`.

use super::ConditionOutcome;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Int(i64),
    Ident(String),
    Str(String),
    Eq,
    Ne,
    Open,
    Close,
    Not,
    And,
    Or,
}

/// Evaluates `condition`, looking properties up through `lookup`.
///
/// # Examples
///
/// ```
/// use netjournal::host::ConditionOutcome;
/// use netjournal::host::condition::evaluate;
///
/// let lookup = |name: &str| (name == "VersionNT").then(|| "601".to_string());
/// assert_eq!(evaluate("", lookup), ConditionOutcome::None);
/// assert_eq!(evaluate("0", lookup), ConditionOutcome::False);
/// assert_eq!(evaluate("VersionNT", lookup), ConditionOutcome::True);
/// assert_eq!(evaluate("NOT Installed", lookup), ConditionOutcome::True);
/// assert_eq!(evaluate("VersionNT = \"601\"", lookup), ConditionOutcome::True);
/// assert_eq!(evaluate("VersionNT >", lookup), ConditionOutcome::Error);
/// ```
pub fn evaluate<F>(condition: &str, lookup: F) -> ConditionOutcome
where
    F: Fn(&str) -> Option<String>,
{
    if condition.trim().is_empty() {
        return ConditionOutcome::None;
    }

    let Some(tokens) = tokenize(condition) else {
        return ConditionOutcome::Error;
    };

    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        lookup: &lookup,
    };
    match parser.expr() {
        Some(value) if parser.pos == tokens.len() => {
            if value {
                ConditionOutcome::True
            } else {
                ConditionOutcome::False
            }
        }
        _ => ConditionOutcome::Error,
    }
}

fn tokenize(text: &str) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Token::Close);
            }
            '=' => {
                chars.next();
                tokens.push(Token::Eq);
            }
            '<' => {
                chars.next();
                if chars.next().map(|(_, c)| c) != Some('>') {
                    return None;
                }
                tokens.push(Token::Ne);
            }
            '"' => {
                chars.next();
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some((_, '"')) => break,
                        Some((_, c)) => value.push(c),
                        None => return None,
                    }
                }
                tokens.push(Token::Str(value));
            }
            c if c.is_ascii_digit() || c == '-' => {
                let mut end = start + c.len_utf8();
                chars.next();
                while let Some(&(i, d)) = chars.peek() {
                    if !d.is_ascii_digit() {
                        break;
                    }
                    end = i + d.len_utf8();
                    chars.next();
                }
                tokens.push(Token::Int(text[start..end].parse().ok()?));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut end = start + c.len_utf8();
                chars.next();
                while let Some(&(i, d)) = chars.peek() {
                    if !(d.is_alphanumeric() || d == '_' || d == '.') {
                        break;
                    }
                    end = i + d.len_utf8();
                    chars.next();
                }
                let word = &text[start..end];
                tokens.push(match word.to_ascii_uppercase().as_str() {
                    "NOT" => Token::Not,
                    "AND" => Token::And,
                    "OR" => Token::Or,
                    _ => Token::Ident(word.to_string()),
                });
            }
            _ => return None,
        }
    }

    Some(tokens)
}

struct Parser<'a, F> {
    tokens: &'a [Token],
    pos: usize,
    lookup: &'a F,
}

impl<F> Parser<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    fn expr(&mut self) -> Option<bool> {
        let mut value = self.and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let rhs = self.and()?;
            value = value || rhs;
        }
        Some(value)
    }

    fn and(&mut self) -> Option<bool> {
        let mut value = self.unary()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let rhs = self.unary()?;
            value = value && rhs;
        }
        Some(value)
    }

    fn unary(&mut self) -> Option<bool> {
        if self.peek() == Some(&Token::Not) {
            self.pos += 1;
            return self.unary().map(|v| !v);
        }
        self.term()
    }

    fn term(&mut self) -> Option<bool> {
        match self.bump()?.clone() {
            Token::Int(n) => Some(n != 0),
            Token::Open => {
                let value = self.expr()?;
                (self.bump()? == &Token::Close).then_some(value)
            }
            Token::Ident(name) => {
                let value = (self.lookup)(&name).unwrap_or_default();
                match self.peek() {
                    Some(Token::Eq) | Some(Token::Ne) => {
                        let negate = self.bump()? == &Token::Ne;
                        let Token::Str(expected) = self.bump()?.clone() else {
                            return None;
                        };
                        Some((value == expected) != negate)
                    }
                    _ => Some(!value.is_empty()),
                }
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn props() -> HashMap<String, String> {
        HashMap::from([
            ("ProductLanguage".to_string(), "1033".to_string()),
            ("TAPDRIVER".to_string(), "1".to_string()),
            ("Empty".to_string(), String::new()),
        ])
    }

    fn eval(condition: &str) -> ConditionOutcome {
        let props = props();
        evaluate(condition, |name| props.get(name).cloned())
    }

    #[test]
    fn empty_condition_is_none() {
        assert_eq!(eval(""), ConditionOutcome::None);
        assert_eq!(eval("   \t"), ConditionOutcome::None);
    }

    #[test]
    fn integer_literals() {
        assert_eq!(eval("0"), ConditionOutcome::False);
        assert_eq!(eval("1"), ConditionOutcome::True);
        assert_eq!(eval("-3"), ConditionOutcome::True);
    }

    #[test]
    fn bare_properties_test_for_non_empty_value() {
        assert_eq!(eval("TAPDRIVER"), ConditionOutcome::True);
        assert_eq!(eval("Empty"), ConditionOutcome::False);
        assert_eq!(eval("Unset"), ConditionOutcome::False);
    }

    #[test]
    fn comparisons() {
        assert_eq!(eval("ProductLanguage = \"1033\""), ConditionOutcome::True);
        assert_eq!(eval("ProductLanguage <> \"1033\""), ConditionOutcome::False);
        assert_eq!(eval("Unset = \"\""), ConditionOutcome::True);
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(eval("not 0"), ConditionOutcome::True);
        assert_eq!(eval("1 and 0"), ConditionOutcome::False);
        assert_eq!(eval("1 Or 0"), ConditionOutcome::True);
    }

    #[test]
    fn and_binds_tighter_than_or() {
        assert_eq!(eval("1 OR 1 AND 0"), ConditionOutcome::True);
        assert_eq!(eval("(1 OR 1) AND 0"), ConditionOutcome::False);
    }

    #[test]
    fn malformed_conditions_are_errors() {
        for condition in [
            "(1",
            "1)",
            "1 AND",
            "NOT",
            "TAPDRIVER = 1",
            "\"unterminated",
            "A < B",
            "1 2",
            "A >= \"1\"",
        ] {
            assert_eq!(eval(condition), ConditionOutcome::Error, "{condition:?}");
        }
    }
}
