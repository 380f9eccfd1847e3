use super::ExpressionError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Number(f64),
    Text(String),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LParen,
    RParen,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    Equal,
    NotEqual,
    And,
    Or,
    Not,
    Question,
    Colon,
}

impl Token {
    pub(crate) fn describe(&self) -> String {
        match self {
            Token::Number(value) => value.to_string(),
            Token::Text(text) => format!("'{text}'"),
            Token::Ident(name) => name.clone(),
            Token::Plus => "+".into(),
            Token::Minus => "-".into(),
            Token::Star => "*".into(),
            Token::Slash => "/".into(),
            Token::Percent => "%".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),
            Token::Less => "<".into(),
            Token::LessEq => "<=".into(),
            Token::Greater => ">".into(),
            Token::GreaterEq => ">=".into(),
            Token::Equal => "==".into(),
            Token::NotEqual => "!=".into(),
            Token::And => "&&".into(),
            Token::Or => "||".into(),
            Token::Not => "!".into(),
            Token::Question => "?".into(),
            Token::Colon => ":".into(),
        }
    }
}

/// A token plus the byte offset it started at.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub offset: usize,
}

pub(crate) fn tokenize(source: &str) -> Result<Vec<Spanned>, ExpressionError> {
    let chars: Vec<(usize, char)> = source.char_indices().collect();
    let mut tokens = Vec::new();
    let mut index = 0;

    while index < chars.len() {
        let (offset, ch) = chars[index];

        if ch.is_whitespace() {
            index += 1;
            continue;
        }

        if ch.is_ascii_digit() || (ch == '.' && next_is_digit(&chars, index)) {
            let start = index;
            while index < chars.len() && (chars[index].1.is_ascii_digit() || chars[index].1 == '.')
            {
                index += 1;
            }
            // Optional exponent, only when followed by digits.
            if index < chars.len() && matches!(chars[index].1, 'e' | 'E') {
                let mut lookahead = index + 1;
                if lookahead < chars.len() && matches!(chars[lookahead].1, '+' | '-') {
                    lookahead += 1;
                }
                if lookahead < chars.len() && chars[lookahead].1.is_ascii_digit() {
                    index = lookahead;
                    while index < chars.len() && chars[index].1.is_ascii_digit() {
                        index += 1;
                    }
                }
            }
            let literal = slice(source, &chars, start, index);
            let value = literal
                .parse::<f64>()
                .map_err(|_| ExpressionError::InvalidNumber {
                    literal: literal.to_string(),
                    offset,
                })?;
            tokens.push(Spanned {
                token: Token::Number(value),
                offset,
            });
            continue;
        }

        if ch.is_ascii_alphabetic() || ch == '_' || ch == '$' {
            let start = index;
            while index < chars.len()
                && (chars[index].1.is_ascii_alphanumeric() || matches!(chars[index].1, '_' | '$'))
            {
                index += 1;
            }
            tokens.push(Spanned {
                token: Token::Ident(slice(source, &chars, start, index).to_string()),
                offset,
            });
            continue;
        }

        if ch == '\'' || ch == '"' {
            let quote = ch;
            let start = index + 1;
            index += 1;
            while index < chars.len() && chars[index].1 != quote {
                index += 1;
            }
            if index >= chars.len() {
                return Err(ExpressionError::UnterminatedString { offset });
            }
            let text = slice(source, &chars, start, index).to_string();
            index += 1;
            tokens.push(Spanned {
                token: Token::Text(text),
                offset,
            });
            continue;
        }

        let next = chars.get(index + 1).map(|(_, c)| *c);
        let third = chars.get(index + 2).map(|(_, c)| *c);
        let (token, width) = match (ch, next) {
            ('+', _) => (Token::Plus, 1),
            ('-', _) => (Token::Minus, 1),
            ('*', _) => (Token::Star, 1),
            ('/', _) => (Token::Slash, 1),
            ('%', _) => (Token::Percent, 1),
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            ('?', _) => (Token::Question, 1),
            (':', _) => (Token::Colon, 1),
            ('<', Some('=')) => (Token::LessEq, 2),
            ('<', _) => (Token::Less, 1),
            ('>', Some('=')) => (Token::GreaterEq, 2),
            ('>', _) => (Token::Greater, 1),
            ('=', Some('=')) if third == Some('=') => (Token::Equal, 3),
            ('=', Some('=')) => (Token::Equal, 2),
            ('!', Some('=')) if third == Some('=') => (Token::NotEqual, 3),
            ('!', Some('=')) => (Token::NotEqual, 2),
            ('!', _) => (Token::Not, 1),
            ('&', Some('&')) => (Token::And, 2),
            ('|', Some('|')) => (Token::Or, 2),
            _ => return Err(ExpressionError::UnexpectedCharacter { found: ch, offset }),
        };
        tokens.push(Spanned { token, offset });
        index += width;
    }

    Ok(tokens)
}

fn next_is_digit(chars: &[(usize, char)], index: usize) -> bool {
    chars
        .get(index + 1)
        .map(|(_, c)| c.is_ascii_digit())
        .unwrap_or(false)
}

fn slice<'a>(source: &'a str, chars: &[(usize, char)], start: usize, end: usize) -> &'a str {
    let from = chars.get(start).map(|(offset, _)| *offset).unwrap_or(source.len());
    let to = chars.get(end).map(|(offset, _)| *offset).unwrap_or(source.len());
    &source[from..to]
}
