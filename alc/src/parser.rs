//! Recursive-descent parser
//!
//! Precedence, loosest first: `или`, `и`, comparison, primary. Assignment
//! values use a separate arithmetic ladder (`+ -` over `* /`). Parsing stops
//! at the first error; no partial tree is returned.

use crate::ast::{Assignment, BinaryOp, CellReference, IfStatement, Node};
use crate::token::{Token, TokenKind};
use alc_core::{ParseError, Value};

type ParseResult<T> = Result<T, ParseError>;

/// Deepest parenthesised group accepted
pub const MAX_NESTING: usize = 64;

/// Parse a full token sequence (as produced by `tokenize`) into one statement
pub fn parse(tokens: &[Token]) -> ParseResult<Node> {
    let mut parser = Parser::new(tokens);
    let node = parser.parse_statement()?;

    let next = parser.peek();
    if next.kind != TokenKind::Eof {
        return Err(parser.error_at(
            next,
            format!("Unexpected {} after end of rule", next.describe()),
        ));
    }
    Ok(node)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    eof: Token,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        let eof = match tokens.last() {
            Some(last) => Token::new(TokenKind::Eof, "", last.line, last.offset + last.text.chars().count()),
            None => Token::new(TokenKind::Eof, "", 1, 0),
        };
        Self {
            tokens,
            pos: 0,
            eof,
            depth: 0,
        }
    }

    // ========== Statements ==========

    fn parse_statement(&mut self) -> ParseResult<Node> {
        if self.matches(TokenKind::If) {
            return self.parse_if().map(Node::If);
        }
        if self.peek().is_cell_reference() {
            return self.parse_assignment_or_comparison();
        }

        let token = self.peek();
        Err(self.error_at(
            token,
            format!("Expected 'если' or a column reference, found {}", token.describe()),
        ))
    }

    fn parse_if(&mut self) -> ParseResult<IfStatement> {
        let condition = self.parse_expression()?;
        self.consume(TokenKind::Then, "Expected 'то' after condition")?;
        let then_branch = self.parse_assignment()?;

        let else_branch = if self.matches(TokenKind::Else) {
            Some(self.parse_assignment()?)
        } else {
            None
        };

        Ok(IfStatement {
            condition: Box::new(condition),
            then_branch,
            else_branch,
        })
    }

    fn parse_assignment(&mut self) -> ParseResult<Assignment> {
        let target = self.parse_cell_reference()?;
        self.consume(TokenKind::Assign, "Expected '=' after column reference")?;
        let value = self.parse_arithmetic()?;
        Ok(Assignment {
            target,
            value: Box::new(value),
        })
    }

    /// Bare statement: `гр.. = value` or `гр.. == expression`
    fn parse_assignment_or_comparison(&mut self) -> ParseResult<Node> {
        let target = self.parse_cell_reference()?;

        if self.matches(TokenKind::Assign) {
            let value = self.parse_arithmetic()?;
            return Ok(Node::assignment(target, value));
        }
        if self.matches(TokenKind::Equals) {
            let right = self.parse_expression()?;
            return Ok(Node::binary(Node::Cell(target), BinaryOp::Eq, right));
        }

        let token = self.peek();
        Err(self.error_at(
            token,
            format!("Expected '=' or '==' after column reference, found {}", token.describe()),
        ))
    }

    // ========== Conditions ==========

    fn parse_expression(&mut self) -> ParseResult<Node> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> ParseResult<Node> {
        let mut expr = self.parse_and()?;
        while self.matches(TokenKind::Or) {
            let right = self.parse_and()?;
            expr = Node::binary(expr, BinaryOp::Or, right);
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> ParseResult<Node> {
        let mut expr = self.parse_comparison()?;
        while self.matches(TokenKind::And) {
            let right = self.parse_comparison()?;
            expr = Node::binary(expr, BinaryOp::And, right);
        }
        Ok(expr)
    }

    fn parse_comparison(&mut self) -> ParseResult<Node> {
        let mut expr = self.parse_primary(Self::parse_expression)?;
        while let Some(op) = comparison_op(self.peek().kind) {
            self.advance();
            let right = self.parse_primary(Self::parse_expression)?;
            expr = Node::binary(expr, op, right);
        }
        Ok(expr)
    }

    // ========== Assignment values ==========

    fn parse_arithmetic(&mut self) -> ParseResult<Node> {
        let mut expr = self.parse_term()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_term()?;
            expr = Node::binary(expr, op, right);
        }
        Ok(expr)
    }

    fn parse_term(&mut self) -> ParseResult<Node> {
        let mut expr = self.parse_primary(Self::parse_arithmetic)?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Multiply => BinaryOp::Mul,
                TokenKind::Divide => BinaryOp::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_primary(Self::parse_arithmetic)?;
            expr = Node::binary(expr, op, right);
        }
        Ok(expr)
    }

    // ========== Primary ==========

    /// `grouped` parses the inside of a parenthesised group
    fn parse_primary(&mut self, grouped: fn(&mut Self) -> ParseResult<Node>) -> ParseResult<Node> {
        let token = self.peek();

        if token.is_cell_reference() {
            return self.parse_cell_reference().map(Node::Cell);
        }

        match token.kind {
            TokenKind::Number => {
                let value = token
                    .text
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| {
                        self.error_at(token, format!("Number '{}' is out of range", token.text))
                    })?;
                self.advance();
                Ok(Node::Literal(Value::Number(value)))
            }
            TokenKind::String => {
                let text = token.text.clone();
                self.advance();
                Ok(Node::Literal(Value::Text(text)))
            }
            TokenKind::Empty => {
                self.advance();
                Ok(Node::Literal(Value::Null))
            }
            TokenKind::LParen => {
                if self.depth >= MAX_NESTING {
                    return Err(self.error_at(token, "Expression nested too deeply".to_string()));
                }
                self.advance();
                self.depth += 1;
                let expr = grouped(self);
                self.depth -= 1;
                let expr = expr?;
                self.consume(TokenKind::RParen, "Expected ')'")?;
                Ok(expr)
            }
            _ => Err(self.error_at(
                token,
                format!(
                    "Expected a column reference, number, string, 'пусто' or '(', found {}",
                    token.describe()
                ),
            )),
        }
    }

    fn parse_cell_reference(&mut self) -> ParseResult<CellReference> {
        let token = self.peek();
        if !token.is_cell_reference() {
            return Err(self.error_at(
                token,
                format!("Expected a column reference, found {}", token.describe()),
            ));
        }

        let cell = CellReference::decode(&token.text).ok_or_else(|| {
            self.error_at(
                token,
                format!(
                    "Malformed column reference '{}': expected 'гр' followed by at least 8 digits",
                    token.text
                ),
            )
        })?;
        self.advance();
        Ok(cell)
    }

    // ========== Token stream helpers ==========

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eof)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.peek().kind == kind && kind != TokenKind::Eof {
            self.advance();
            return true;
        }
        false
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> ParseResult<()> {
        if self.matches(kind) {
            return Ok(());
        }
        let token = self.peek();
        Err(self.error_at(token, format!("{}, found {}", message, token.describe())))
    }

    fn error_at(&self, token: &Token, message: String) -> ParseError {
        ParseError::new(message, token.line, token.offset)
    }
}

fn comparison_op(kind: TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::Equals => BinaryOp::Eq,
        TokenKind::NotEquals => BinaryOp::Ne,
        TokenKind::Greater => BinaryOp::Gt,
        TokenKind::GreaterOrEqual => BinaryOp::Ge,
        TokenKind::Less => BinaryOp::Lt,
        TokenKind::LessOrEqual => BinaryOp::Le,
        _ => return None,
    };
    Some(op)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use rstest::rstest;

    fn parse_str(source: &str) -> ParseResult<Node> {
        parse(&tokenize(source))
    }

    fn parse_if(source: &str) -> IfStatement {
        match parse_str(source).unwrap() {
            Node::If(stmt) => stmt,
            other => panic!("expected conditional statement, got {:?}", other),
        }
    }

    fn binary(node: &Node) -> (&Node, BinaryOp, &Node) {
        match node {
            Node::Binary { left, op, right } => (left, *op, right),
            other => panic!("expected binary expression, got {:?}", other),
        }
    }

    #[test]
    fn test_simple_if_without_else() {
        let stmt = parse_if("Если гр10102212 == 1 то гр10103206 = 2");
        let (left, op, right) = binary(&stmt.condition);
        assert_eq!(op, BinaryOp::Eq);
        assert!(matches!(left, Node::Cell(c) if c.register_code == "10102" && c.column == 12));
        assert_eq!(*right, Node::Literal(Value::Number(1.0)));
        assert_eq!(stmt.then_branch.target.column, 6);
        assert_eq!(*stmt.then_branch.value, Node::Literal(Value::Number(2.0)));
        assert!(stmt.else_branch.is_none());
    }

    #[test]
    fn test_if_with_else() {
        let stmt = parse_if("Если гр10102212 == 1 то гр10103206 = 2 иначе гр10103206 = 3");
        let else_branch = stmt.else_branch.unwrap();
        assert_eq!(*else_branch.value, Node::Literal(Value::Number(3.0)));
    }

    #[rstest]
    #[case("==", BinaryOp::Eq)]
    #[case("!=", BinaryOp::Ne)]
    #[case(">", BinaryOp::Gt)]
    #[case(">=", BinaryOp::Ge)]
    #[case("<", BinaryOp::Lt)]
    #[case("<=", BinaryOp::Le)]
    fn test_comparison_operators(#[case] symbol: &str, #[case] expected: BinaryOp) {
        let stmt = parse_if(&format!("Если гр10102212 {} 1 то гр10103206 = 2", symbol));
        assert_eq!(binary(&stmt.condition).1, expected);
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let stmt = parse_if(
            "Если гр10102212 == 1 или гр10102213 == 2 и гр10102214 == 3 то гр10103206 = 4",
        );
        let (_, root, right) = binary(&stmt.condition);
        assert_eq!(root, BinaryOp::Or);
        assert_eq!(binary(right).1, BinaryOp::And);
    }

    #[test]
    fn test_parentheses_regroup() {
        let stmt = parse_if(
            "Если (гр10102212 == 1 или гр10102213 == 2) и гр10102214 == 3 то гр10103206 = 4",
        );
        let (left, root, _) = binary(&stmt.condition);
        assert_eq!(root, BinaryOp::And);
        assert_eq!(binary(left).1, BinaryOp::Or);
    }

    #[test]
    fn test_empty_literal_is_null() {
        let stmt = parse_if("Если гр10102212 == пусто то гр10103206 = 1");
        assert_eq!(*binary(&stmt.condition).2, Node::Literal(Value::Null));
    }

    #[test]
    fn test_string_literal() {
        let stmt = parse_if("Если гр10102212 == \"да\" то гр10103206 = 'нет'");
        assert_eq!(*binary(&stmt.condition).2, Node::Literal(Value::from("да")));
        assert_eq!(*stmt.then_branch.value, Node::Literal(Value::from("нет")));
    }

    #[test]
    fn test_reference_assignment() {
        let stmt = parse_if("Если гр10102212 == 1 то гр10103206 = гр10102209");
        assert!(matches!(&*stmt.then_branch.value, Node::Cell(c) if c.column == 9));
    }

    #[test]
    fn test_arithmetic_assignment_precedence() {
        let stmt = parse_if("Если гр10102212 == 1 то гр10103206 = гр10102209 + 2 * 3");
        let (_, op, right) = binary(&stmt.then_branch.value);
        assert_eq!(op, BinaryOp::Add);
        assert_eq!(binary(right).1, BinaryOp::Mul);
    }

    #[test]
    fn test_bare_comparison() {
        let node = parse_str("гр10102212 == 1").unwrap();
        assert_eq!(binary(&node).1, BinaryOp::Eq);
    }

    #[test]
    fn test_bare_assignment() {
        let node = parse_str("гр10103206 = 5").unwrap();
        assert!(matches!(node, Node::Assignment(a) if a.target.column == 6));
    }

    #[test]
    fn test_missing_then_mentions_keyword() {
        let err = parse_str("Если гр10102212 == 1 гр10103206 = 2").unwrap_err();
        assert!(err.message.contains("то"), "message: {}", err.message);
        assert_eq!(err.offset, 21);
    }

    #[test]
    fn test_malformed_reference_is_error() {
        let err = parse_str("Если гр101 == 1 то гр10103206 = 2").unwrap_err();
        assert!(err.message.contains("гр101"));
    }

    #[rstest]
    #[case("")]
    #[case("   \t\n   ")]
    #[case("123")]
    #[case("гр10102212")]
    #[case("иначе гр10103206 = 2")]
    #[case("Если")]
    #[case("Если то гр10103206 = 2")]
    #[case("Если гр10102212 == 1 то")]
    #[case("Если гр10102212 == 1 то гр10103206 = 2 иначе")]
    #[case("Если гр10102212 == то гр10103206 = 2")]
    #[case("Если == 1 то гр10103206 = 2")]
    #[case("Если гр10102212 == == 1 то гр10103206 = 2")]
    #[case("Если гр10102212 == 1 или или гр10102213 == 2 то гр10103206 = 3")]
    #[case("Если гр10102212 == 1 или то гр10103206 = 2")]
    #[case("Если гр10102212 == 1 то гр10103206 =")]
    #[case("Если гр10102212 == 1 то гр10103206 5")]
    #[case("Если (гр10102212 == 1 то гр10103206 = 2")]
    #[case("Если гр10102212 == 1) то гр10103206 = 2")]
    #[case("Если () то гр10103206 = 2")]
    #[case("Если ((гр10102212 == 1) то гр10103206 = 2")]
    #[case("Если Если гр10102212 == 1 то гр10103206 = 2")]
    #[case("Если гр10102212 == 1 иначе гр10103206 = 2 то гр10103206 = 3")]
    #[case("Если гр10102212 == 1 то гр10103206 = 2 гр10103207 = 3")]
    #[case("Если гр10102212 == 1 то гр10103206 = 2 % 3")]
    #[case("Если гр10102212 == @ то гр10103206 = 2")]
    fn test_syntax_errors(#[case] source: &str) {
        let err = parse_str(source).unwrap_err();
        assert!(!err.message.is_empty());
    }

    #[rstest]
    #[case("Если гр10102212 == 1 то гр10103206 = 2")]
    #[case("Если гр10102212 == 1 и гр10102213 == 2 то гр10103206 = 3")]
    #[case("Если (гр10102212 == 1) то гр10103206 = 2")]
    #[case("Если гр10102212 <= 1 то гр10103206 = 2")]
    #[case("Если гр10102212 == пусто то гр10103206 = 0")]
    #[case("Если гр10102212 == 1 или гр10102212 == 2 и гр10102213 == 5 то гр10103206 = гр10102209")]
    #[case("если\nгр10102212 == 1\nто\nгр10103206 = 2")]
    fn test_valid_rules(#[case] source: &str) {
        assert!(parse_str(source).is_ok(), "failed to parse: {}", source);
    }

    fn nested(depth: usize) -> String {
        format!(
            "Если {}гр10102212 == 1{} то гр10103206 = 2",
            "(".repeat(depth),
            ")".repeat(depth)
        )
    }

    #[test]
    fn test_nesting_up_to_limit() {
        assert!(parse_str(&nested(MAX_NESTING)).is_ok());
    }

    #[rstest]
    #[case(MAX_NESTING + 1)]
    #[case(5000)]
    fn test_nesting_past_limit_is_error(#[case] depth: usize) {
        let err = parse_str(&nested(depth)).unwrap_err();
        assert!(err.message.contains("nested too deeply"));
        assert_eq!(err.offset, "Если ".chars().count() + MAX_NESTING);
    }

    #[test]
    fn test_nesting_in_assigned_value() {
        let source = format!(
            "гр10103206 = {}1{}",
            "(".repeat(MAX_NESTING + 1),
            ")".repeat(MAX_NESTING + 1)
        );
        assert!(parse_str(&source).unwrap_err().message.contains("nested too deeply"));
    }

    #[test]
    fn test_sibling_groups_do_not_accumulate_depth() {
        let group = "(гр10102212 == 1)";
        let condition = vec![group; MAX_NESTING + 10].join(" и ");
        let source = format!("Если {} то гр10103206 = 2", condition);
        assert!(parse_str(&source).is_ok());
    }

    #[test]
    fn test_out_of_range_number_is_error() {
        let literal = format!("1{}", "0".repeat(400));
        let err = parse_str(&format!("Если гр10102212 == {} то гр10102206 = 2", literal)).unwrap_err();
        assert!(err.message.contains(&literal));
        assert_eq!(err.offset, 19);
    }

    #[test]
    fn test_large_finite_number_is_accepted() {
        let stmt = parse_if("Если гр10102212 == 1000000000000000000000 то гр10102206 = 2");
        assert_eq!(*binary(&stmt.condition).2, Node::Literal(Value::Number(1e21)));
    }

    #[test]
    fn test_empty_token_slice() {
        let err = parse(&[]).unwrap_err();
        assert!(err.message.contains("end of input"));
    }
}
