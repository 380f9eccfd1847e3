use super::lexer::{tokenize, Spanned, Token};
use super::ExpressionError;

/// Nesting limit for parenthesised and unary sub-expressions.
pub(crate) const MAX_DEPTH: usize = 64;

/// Binary and logical operators allowed in one formula. Operator chains fold
/// into left-deep trees, so this also bounds evaluation depth.
pub(crate) const MAX_OPERATORS: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    Equal,
    NotEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Negate,
    Plus,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Number(f64),
    Bool(bool),
    Text(String),
    Variable(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Conditional {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
}

pub(crate) fn parse(source: &str) -> Result<Expr, ExpressionError> {
    if source.trim().is_empty() {
        return Err(ExpressionError::Empty);
    }
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        position: 0,
        depth: 0,
        operators: 0,
    };
    let expr = parser.conditional()?;
    match parser.peek() {
        None => Ok(expr),
        Some(spanned) => Err(ExpressionError::UnexpectedToken {
            found: spanned.token.describe(),
            offset: spanned.offset,
        }),
    }
}

struct Parser {
    tokens: Vec<Spanned>,
    position: usize,
    depth: usize,
    operators: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.position)
    }

    fn peek_token(&self) -> Option<&Token> {
        self.peek().map(|spanned| &spanned.token)
    }

    fn advance(&mut self) -> Option<Spanned> {
        let next = self.tokens.get(self.position).cloned();
        if next.is_some() {
            self.position += 1;
        }
        next
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek_token() == Some(expected) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), ExpressionError> {
        match self.advance() {
            Some(spanned) if spanned.token == expected => Ok(()),
            Some(spanned) => Err(ExpressionError::UnexpectedToken {
                found: spanned.token.describe(),
                offset: spanned.offset,
            }),
            None => Err(ExpressionError::UnexpectedEnd {
                expected: expected.describe(),
            }),
        }
    }

    fn descend(&mut self) -> Result<(), ExpressionError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ExpressionError::TooDeep { limit: MAX_DEPTH });
        }
        Ok(())
    }

    fn ascend(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn count_operator(&mut self) -> Result<(), ExpressionError> {
        self.operators += 1;
        if self.operators > MAX_OPERATORS {
            return Err(ExpressionError::TooLarge {
                limit: MAX_OPERATORS,
            });
        }
        Ok(())
    }

    // condition ? then : otherwise, right associative
    fn conditional(&mut self) -> Result<Expr, ExpressionError> {
        let condition = self.logical_or()?;
        if !self.eat(&Token::Question) {
            return Ok(condition);
        }
        self.descend()?;
        let then = self.conditional()?;
        self.expect(Token::Colon)?;
        let otherwise = self.conditional()?;
        self.ascend();
        Ok(Expr::Conditional {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    fn logical_or(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.logical_and()?;
        while self.eat(&Token::Or) {
            self.count_operator()?;
            let right = self.logical_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn logical_and(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.equality()?;
        while self.eat(&Token::And) {
            self.count_operator()?;
            let right = self.equality()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn equality(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.relational()?;
        loop {
            let op = match self.peek_token() {
                Some(Token::Equal) => BinaryOp::Equal,
                Some(Token::NotEqual) => BinaryOp::NotEqual,
                _ => return Ok(left),
            };
            self.position += 1;
            self.count_operator()?;
            let right = self.relational()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn relational(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.additive()?;
        loop {
            let op = match self.peek_token() {
                Some(Token::Less) => BinaryOp::Less,
                Some(Token::LessEq) => BinaryOp::LessEq,
                Some(Token::Greater) => BinaryOp::Greater,
                Some(Token::GreaterEq) => BinaryOp::GreaterEq,
                _ => return Ok(left),
            };
            self.position += 1;
            self.count_operator()?;
            let right = self.additive()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn additive(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.multiplicative()?;
        loop {
            let op = match self.peek_token() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Subtract,
                _ => return Ok(left),
            };
            self.position += 1;
            self.count_operator()?;
            let right = self.multiplicative()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn multiplicative(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek_token() {
                Some(Token::Star) => BinaryOp::Multiply,
                Some(Token::Slash) => BinaryOp::Divide,
                Some(Token::Percent) => BinaryOp::Remainder,
                _ => return Ok(left),
            };
            self.position += 1;
            self.count_operator()?;
            let right = self.unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn unary(&mut self) -> Result<Expr, ExpressionError> {
        let op = match self.peek_token() {
            Some(Token::Minus) => UnaryOp::Negate,
            Some(Token::Plus) => UnaryOp::Plus,
            Some(Token::Not) => UnaryOp::Not,
            _ => return self.primary(),
        };
        self.position += 1;
        self.descend()?;
        let operand = self.unary()?;
        self.ascend();
        Ok(Expr::Unary(op, Box::new(operand)))
    }

    fn primary(&mut self) -> Result<Expr, ExpressionError> {
        let spanned = self.advance().ok_or_else(|| ExpressionError::UnexpectedEnd {
            expected: "a value".to_string(),
        })?;

        match spanned.token {
            Token::Number(value) => Ok(Expr::Number(value)),
            Token::Text(text) => Ok(Expr::Text(text)),
            Token::Ident(name) => match name.as_str() {
                "true" => Ok(Expr::Bool(true)),
                "false" => Ok(Expr::Bool(false)),
                _ => {
                    // Identifiers followed by `(` would be calls; not part of the grammar.
                    if let Some(next) = self.peek().filter(|next| next.token == Token::LParen) {
                        return Err(ExpressionError::UnexpectedToken {
                            found: next.token.describe(),
                            offset: next.offset,
                        });
                    }
                    Ok(Expr::Variable(name))
                }
            },
            Token::LParen => {
                self.descend()?;
                let inner = self.conditional()?;
                self.expect(Token::RParen)?;
                self.ascend();
                Ok(inner)
            }
            other => Err(ExpressionError::UnexpectedToken {
                found: other.describe(),
                offset: spanned.offset,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Box<Expr> {
        Box::new(Expr::Variable(name.to_string()))
    }

    fn num(value: f64) -> Box<Expr> {
        Box::new(Expr::Number(value))
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let expr = parse("units * 10 + squareFootage * 0.05").expect("parses");
        assert_eq!(
            expr,
            Expr::Binary(
                BinaryOp::Add,
                Box::new(Expr::Binary(BinaryOp::Multiply, var("units"), num(10.0))),
                Box::new(Expr::Binary(
                    BinaryOp::Multiply,
                    var("squareFootage"),
                    num(0.05)
                )),
            )
        );
    }

    #[test]
    fn subtraction_is_left_associative() {
        let expr = parse("10 - 4 - 3").expect("parses");
        assert_eq!(
            expr,
            Expr::Binary(
                BinaryOp::Subtract,
                Box::new(Expr::Binary(BinaryOp::Subtract, num(10.0), num(4.0))),
                num(3.0),
            )
        );
    }

    #[test]
    fn ternary_nests_to_the_right() {
        let expr = parse("a > 1 ? 10 : b > 1 ? 20 : 30").expect("parses");
        match expr {
            Expr::Conditional { otherwise, .. } => {
                assert!(matches!(*otherwise, Expr::Conditional { .. }));
            }
            other => panic!("expected conditional, got {other:?}"),
        }
    }

    #[test]
    fn rejects_function_calls_and_trailing_tokens() {
        assert!(matches!(
            parse("max(units, 4)"),
            Err(ExpressionError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            parse("units 4"),
            Err(ExpressionError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            parse("(units + 1"),
            Err(ExpressionError::UnexpectedEnd { .. })
        ));
        assert!(matches!(
            parse("units *"),
            Err(ExpressionError::UnexpectedEnd { .. })
        ));
        assert!(matches!(parse("   "), Err(ExpressionError::Empty)));
    }

    #[test]
    fn deep_nesting_is_bounded() {
        let source = format!("{}1{}", "(".repeat(MAX_DEPTH + 1), ")".repeat(MAX_DEPTH + 1));
        assert!(matches!(
            parse(&source),
            Err(ExpressionError::TooDeep { limit: MAX_DEPTH })
        ));

        let shallow = format!("{}1{}", "(".repeat(8), ")".repeat(8));
        assert_eq!(parse(&shallow).expect("parses"), Expr::Number(1.0));
    }

    #[test]
    fn long_operator_chains_are_bounded() {
        let long = vec!["units"; 10_000].join(" + ");
        assert!(matches!(
            parse(&long),
            Err(ExpressionError::TooLarge {
                limit: MAX_OPERATORS
            })
        ));

        let mixed = vec!["units > 1"; 5_000].join(" && ");
        assert!(matches!(
            parse(&mixed),
            Err(ExpressionError::TooLarge { .. })
        ));

        let within = vec!["1"; MAX_OPERATORS + 1].join(" * ");
        assert!(parse(&within).is_ok());
    }
}
