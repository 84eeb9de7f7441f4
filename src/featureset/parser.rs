// Recursive-descent parser for feature-set expressions.
//
//   expr   := term ('+' term)*
//   term   := source ('*' number)?
//   source := field | 'max' '(' field (',' field)* ')'

use super::{is_known_field, ExprError, Source, Term, ALL_FIELDS};

struct Parser<'a> {
    chars: Vec<(usize, char)>,
    pos: usize,
    input: &'a str,
}

/// Parse an expression into its weighted terms.
pub fn parse(input: &str) -> Result<Vec<Term>, ExprError> {
    if input.trim().is_empty() {
        return Err(ExprError::Empty);
    }

    let mut parser = Parser {
        chars: input.char_indices().collect(),
        pos: 0,
        input,
    };

    let mut terms = vec![parser.term()?];
    loop {
        parser.skip_whitespace();
        match parser.peek() {
            None => break,
            Some('+') => {
                parser.pos += 1;
                terms.push(parser.term()?);
            }
            Some(ch) => {
                return Err(ExprError::UnexpectedChar {
                    pos: parser.offset(),
                    ch,
                })
            }
        }
    }
    Ok(terms)
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|&(_, c)| c)
    }

    /// Byte offset of the current position, for error messages.
    fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map_or(self.input.len(), |&(offset, _)| offset)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn term(&mut self) -> Result<Term, ExprError> {
        let source = self.source()?;
        self.skip_whitespace();

        let weight = if self.peek() == Some('*') {
            self.pos += 1;
            self.number()?
        } else {
            1.0
        };

        Ok(Term { source, weight })
    }

    fn source(&mut self) -> Result<Source, ExprError> {
        let name = self.identifier("a field name")?;

        self.skip_whitespace();
        if name == "max" && self.peek() == Some('(') {
            self.pos += 1;
            let mut fields = Vec::new();

            self.skip_whitespace();
            if self.peek() == Some(')') {
                return Err(ExprError::EmptyMax);
            }

            loop {
                fields.push(self.field()?);
                self.skip_whitespace();
                match self.peek() {
                    Some(',') => self.pos += 1,
                    Some(')') => {
                        self.pos += 1;
                        break;
                    }
                    Some(ch) => {
                        return Err(ExprError::UnexpectedChar {
                            pos: self.offset(),
                            ch,
                        })
                    }
                    None => return Err(ExprError::UnexpectedEnd { expected: "')'" }),
                }
            }
            return Ok(Source::Max(fields));
        }

        // A bare `all` already means the max over every field, so it shares
        // the canonical form of `max(all)`.
        let name = check_field(name)?;
        if name == ALL_FIELDS {
            Ok(Source::Max(vec![name]))
        } else {
            Ok(Source::Field(name))
        }
    }

    fn field(&mut self) -> Result<String, ExprError> {
        let name = self.identifier("a field name")?;
        check_field(name)
    }

    /// Field names: letters, digits, `-`, `_` and `:` (for `meta-og:title`).
    fn identifier(&mut self, expected: &'static str) -> Result<String, ExprError> {
        self.skip_whitespace();
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':'))
        {
            self.pos += 1;
        }

        if start == self.pos {
            return match self.peek() {
                Some(ch) => Err(ExprError::UnexpectedChar {
                    pos: self.offset(),
                    ch,
                }),
                None => Err(ExprError::UnexpectedEnd { expected }),
            };
        }

        Ok(self.chars[start..self.pos]
            .iter()
            .map(|&(_, c)| c.to_ascii_lowercase())
            .collect())
    }

    fn number(&mut self) -> Result<f64, ExprError> {
        self.skip_whitespace();
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
        {
            // A '+' only belongs to the number right after an exponent marker;
            // otherwise it starts the next term.
            if self.peek() == Some('+')
                && !matches!(self.pos.checked_sub(1).and_then(|p| self.chars.get(p)), Some(&(_, 'e' | 'E')))
            {
                break;
            }
            self.pos += 1;
        }

        if start == self.pos {
            return match self.peek() {
                Some(ch) => Err(ExprError::UnexpectedChar {
                    pos: self.offset(),
                    ch,
                }),
                None => Err(ExprError::UnexpectedEnd { expected: "a weight" }),
            };
        }

        let text: String = self.chars[start..self.pos].iter().map(|&(_, c)| c).collect();
        match text.parse::<f64>() {
            // abs() folds -0 into 0
            Ok(w) if w.is_finite() && w >= 0.0 => Ok(w.abs()),
            _ => Err(ExprError::InvalidWeight(text)),
        }
    }
}

fn check_field(name: String) -> Result<String, ExprError> {
    if is_known_field(&name) {
        Ok(name)
    } else {
        Err(ExprError::UnknownField(name))
    }
}
