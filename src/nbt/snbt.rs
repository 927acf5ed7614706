use super::{Compound, ListTag, Tag, TagKind};
use crate::{constants::MAX_NBT_DEPTH, types::Error};
use std::fmt::Write;

/// Renders a tag as stringified NBT.
#[must_use]
pub fn to_snbt(tag: &Tag) -> String {
    let mut output = String::with_capacity(256);
    write_tag(&mut output, tag);
    output
}

/// Parses stringified NBT produced by [`to_snbt`] or by the game.
pub fn from_snbt(snbt: &str) -> Result<Tag, Error> {
    let mut parser = Parser { src: snbt, pos: 0 };

    let tag = parser.parse_value(0)?;
    parser.skip_whitespace();

    if parser.pos != snbt.len() {
        return Err(parser.error("trailing characters"));
    }

    Ok(tag)
}

const fn is_bare_char(char: char) -> bool {
    char.is_ascii_alphanumeric() || matches!(char, '_' | '-' | '.' | '+')
}

fn write_quoted(output: &mut String, str: &str) {
    output.push('"');

    for char in str.chars() {
        if matches!(char, '"' | '\\') {
            output.push('\\');
        }

        output.push(char);
    }

    output.push('"');
}

fn write_key(output: &mut String, key: &str) {
    if !key.is_empty() && key.chars().all(is_bare_char) {
        output.push_str(key);
    } else {
        write_quoted(output, key);
    }
}

fn write_array<T: std::fmt::Display>(
    output: &mut String,
    prefix: char,
    suffix: &str,
    values: &[T],
) {
    output.push('[');
    output.push(prefix);
    output.push(';');

    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            output.push(',');
        }

        let _ = write!(output, "{value}{suffix}");
    }

    output.push(']');
}

fn write_tag(output: &mut String, tag: &Tag) {
    // Writing into a String never fails
    let _ = match tag {
        Tag::Byte(value) => write!(output, "{value}b"),
        Tag::Short(value) => write!(output, "{value}s"),
        Tag::Int(value) => write!(output, "{value}"),
        Tag::Long(value) => write!(output, "{value}L"),
        Tag::Float(value) => write!(output, "{value}f"),
        Tag::Double(value) => write!(output, "{value}d"),
        Tag::ByteArray(values) => {
            write_array(output, 'B', "b", values);
            Ok(())
        }
        Tag::IntArray(values) => {
            write_array(output, 'I', "", values);
            Ok(())
        }
        Tag::LongArray(values) => {
            write_array(output, 'L', "L", values);
            Ok(())
        }
        Tag::String(value) => {
            write_quoted(output, value);
            Ok(())
        }
        Tag::List(list) => {
            output.push('[');

            for (i, value) in list.iter().enumerate() {
                if i > 0 {
                    output.push(',');
                }

                write_tag(output, value);
            }

            output.push(']');
            Ok(())
        }
        Tag::Compound(compound) => {
            output.push('{');

            for (i, (key, value)) in compound.iter().enumerate() {
                if i > 0 {
                    output.push(',');
                }

                write_key(output, key);
                output.push(':');
                write_tag(output, value);
            }

            output.push('}');
            Ok(())
        }
    };
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, message: &str) -> Error {
        Error::MalformedSnbt {
            position: self.pos,
            message: message.to_owned(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let char = self.peek()?;
        self.pos += char.len_utf8();
        Some(char)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), Error> {
        self.skip_whitespace();

        match self.bump() {
            Some(char) if char == expected => Ok(()),
            _ => Err(self.error(&format!("expected `{expected}`"))),
        }
    }

    fn parse_value(&mut self, depth: usize) -> Result<Tag, Error> {
        if depth > MAX_NBT_DEPTH {
            return Err(self.error("maximum nesting depth exceeded"));
        }

        self.skip_whitespace();

        match self.peek() {
            Some('{') => self.parse_compound(depth).map(Tag::Compound),
            Some('[') => {
                let rest = &self.src[self.pos + 1..];

                if rest.len() >= 2 && rest.as_bytes()[1] == b';' {
                    match rest.as_bytes()[0] {
                        b'B' => return self.parse_array(TagKind::ByteArray),
                        b'I' => return self.parse_array(TagKind::IntArray),
                        b'L' => return self.parse_array(TagKind::LongArray),
                        _ => {}
                    }
                }

                self.parse_list(depth)
            }
            Some('"' | '\'') => self.parse_quoted().map(Tag::String),
            Some(_) => {
                let token = self.parse_bare()?;
                Ok(parse_scalar(token))
            }
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn parse_quoted(&mut self) -> Result<String, Error> {
        let Some(quote) = self.bump() else {
            return Err(self.error("expected a quoted string"));
        };

        let mut output = String::new();

        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some(char) => output.push(char),
                    None => return Err(self.error("unterminated escape")),
                },
                Some(char) if char == quote => return Ok(output),
                Some(char) => output.push(char),
                None => return Err(self.error("unterminated string")),
            }
        }
    }

    fn parse_bare(&mut self) -> Result<&str, Error> {
        let start = self.pos;

        while self.peek().is_some_and(is_bare_char) {
            self.bump();
        }

        if start == self.pos {
            return Err(self.error("expected a value"));
        }

        // Indices are ASCII boundaries, since bare characters are ASCII
        Ok(&self.src[start..self.pos])
    }

    fn parse_key(&mut self) -> Result<String, Error> {
        self.skip_whitespace();

        match self.peek() {
            Some('"' | '\'') => self.parse_quoted(),
            _ => self.parse_bare().map(str::to_owned),
        }
    }

    /// Parses `,`-separated items until `close`, calling `item` for each one.
    fn parse_sequence<F>(&mut self, close: char, mut item: F) -> Result<(), Error>
    where
        F: FnMut(&mut Self) -> Result<(), Error>,
    {
        self.skip_whitespace();

        if self.peek() == Some(close) {
            self.bump();
            return Ok(());
        }

        loop {
            item(self)?;
            self.skip_whitespace();

            match self.bump() {
                Some(',') => {}
                Some(char) if char == close => return Ok(()),
                _ => {
                    return Err(self.error(&format!("expected `,` or `{close}`")))
                }
            }
        }
    }

    fn parse_compound(&mut self, depth: usize) -> Result<Compound, Error> {
        self.expect('{')?;
        let mut compound = Compound::new();

        self.parse_sequence('}', |parser| {
            let key = parser.parse_key()?;
            parser.expect(':')?;
            let value = parser.parse_value(depth + 1)?;
            compound.insert(key, value);
            Ok(())
        })?;

        Ok(compound)
    }

    fn parse_list(&mut self, depth: usize) -> Result<Tag, Error> {
        self.expect('[')?;
        let mut values = Vec::new();

        self.parse_sequence(']', |parser| {
            values.push(parser.parse_value(depth + 1)?);
            Ok(())
        })?;

        ListTag::from_values(values).map(Tag::List)
    }

    fn parse_array(&mut self, kind: TagKind) -> Result<Tag, Error> {
        self.expect('[')?;
        // Skip the `B;`/`I;`/`L;` header
        self.bump();
        self.bump();

        let mut values = Vec::new();

        self.parse_sequence(']', |parser| {
            parser.skip_whitespace();
            let token = parser.parse_bare()?;
            values.push(parse_scalar(token));
            Ok(())
        })?;

        let mismatch = || self.error(&format!("invalid element in {kind}"));

        Ok(match kind {
            TagKind::ByteArray => Tag::ByteArray(
                values
                    .into_iter()
                    .map(|value| match value {
                        Tag::Byte(value) => Some(value),
                        _ => None,
                    })
                    .collect::<Option<_>>()
                    .ok_or_else(mismatch)?,
            ),
            TagKind::IntArray => Tag::IntArray(
                values
                    .into_iter()
                    .map(|value| value.as_int())
                    .collect::<Option<_>>()
                    .ok_or_else(mismatch)?,
            ),
            _ => Tag::LongArray(
                values
                    .into_iter()
                    .map(|value| match value {
                        Tag::Long(value) => Some(value),
                        _ => None,
                    })
                    .collect::<Option<_>>()
                    .ok_or_else(mismatch)?,
            ),
        })
    }
}

/// Interprets a bare token: suffixed numbers, integers, doubles and booleans, falling back to a string.
fn parse_scalar(token: &str) -> Tag {
    match token {
        "true" => return Tag::Byte(1),
        "false" => return Tag::Byte(0),
        _ => {}
    }

    if let Some(last) = token.chars().last() {
        let number = &token[..token.len() - 1];

        let parsed = match last.to_ascii_lowercase() {
            'b' => number.parse().ok().map(Tag::Byte),
            's' => number.parse().ok().map(Tag::Short),
            'l' => number.parse().ok().map(Tag::Long),
            'f' => number.parse().ok().map(Tag::Float),
            'd' => number.parse().ok().map(Tag::Double),
            _ => None,
        };

        if let Some(tag) = parsed {
            return tag;
        }
    }

    if let Ok(int) = token.parse() {
        return Tag::Int(int);
    }

    if token.contains(['.', 'e', 'E']) {
        if let Ok(double) = token.parse() {
            return Tag::Double(double);
        }
    }

    Tag::String(token.to_owned())
}
