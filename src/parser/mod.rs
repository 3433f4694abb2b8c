use log::debug;

use crate::ast::{Block, Expression, FunctionLiteral, Identifier, Program, Statement};
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

/* The parser takes the tokens produced by the lexer and builds the AST: a more
information-rich structure that later stages (the evaluator) can walk.

Statement parsing is ordinary recursive descent: each statement kind has its own
`parse_*_statement` method. Expression parsing uses a Pratt parser — a precedence-climbing
engine that dispatches on the *current* token to a prefix handler, then repeatedly dispatches
on the *next* token to an infix handler as long as that token's precedence outranks the
threshold passed in. Rust's borrow checker makes a literal `HashMap<TokenKind, fn(&mut
Self) -> _>` registration table (as the Go original's `registerPrefix`/`registerInfix` build)
awkward, since the handlers need `&mut self` and return non-'static-lifetime data; this
implementation keeps the same dispatch *shape* but expresses the "table" as a `match` over
`TokenKind` in `parse_prefix`/`parse_infix`, which is the idiom this family of Rust Monkey
ports converges on. */

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Equals,      // == !=
    LessGreater, // < or >
    Sum,         // + -
    Product,     // * /
    Prefix,      // -x or !x
    Call,        // fn(x) or arr[x]
}

fn precedence_of(kind: TokenKind) -> Precedence {
    match kind {
        TokenKind::Eq | TokenKind::NotEq => Precedence::Equals,
        TokenKind::Lt | TokenKind::Gt => Precedence::LessGreater,
        TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
        TokenKind::Slash | TokenKind::Asterisk => Precedence::Product,
        TokenKind::LParen | TokenKind::LBracket => Precedence::Call,
        _ => Precedence::Lowest,
    }
}

pub struct Parser {
    lexer: Lexer,
    current_token: Token,
    peek_token: Token,
    errors: Vec<String>,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Self {
        let current_token = lexer.next_token();
        let peek_token = lexer.next_token();
        Self {
            lexer,
            current_token,
            peek_token,
            errors: Vec::new(),
        }
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    fn advance(&mut self) {
        self.current_token = std::mem::replace(&mut self.peek_token, self.lexer.next_token());
    }

    pub fn parse_program(&mut self) -> Program {
        let mut program = Program::default();
        while self.current_token.kind != TokenKind::Eof {
            if let Some(stmt) = self.parse_statement() {
                program.statements.push(stmt);
            }
            self.advance();
        }
        program
    }

    fn parse_statement(&mut self) -> Option<Statement> {
        match self.current_token.kind {
            TokenKind::Let => self.parse_let_statement(),
            TokenKind::Return => self.parse_return_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_let_statement(&mut self) -> Option<Statement> {
        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }
        let name = Identifier {
            token: self.current_token.clone(),
            name: self.current_token.literal.clone(),
        };

        if !self.expect_peek(TokenKind::Assign) {
            return None;
        }
        self.advance();

        let value = self.parse_expression(Precedence::Lowest)?;

        if self.peek_token.kind == TokenKind::SemiColon {
            self.advance();
        }

        Some(Statement::Let { name, value })
    }

    fn parse_return_statement(&mut self) -> Option<Statement> {
        self.advance();
        let value = self.parse_expression(Precedence::Lowest)?;

        if self.peek_token.kind == TokenKind::SemiColon {
            self.advance();
        }

        Some(Statement::Return { value })
    }

    fn parse_expression_statement(&mut self) -> Option<Statement> {
        let expr = self.parse_expression(Precedence::Lowest)?;

        if self.peek_token.kind == TokenKind::SemiColon {
            self.advance();
        }

        Some(Statement::Expression { expr })
    }

    fn parse_block(&mut self) -> Block {
        let mut statements = Vec::new();
        self.advance(); // consume '{'

        while self.current_token.kind != TokenKind::RBrace && self.current_token.kind != TokenKind::Eof {
            if let Some(stmt) = self.parse_statement() {
                statements.push(stmt);
            }
            self.advance();
        }

        Block { statements }
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expression> {
        let mut left = self.parse_prefix()?;

        while self.peek_token.kind != TokenKind::SemiColon && precedence < precedence_of(self.peek_token.kind) {
            self.advance();
            left = self.parse_infix(left)?;
        }

        Some(left)
    }

    fn parse_prefix(&mut self) -> Option<Expression> {
        match self.current_token.kind {
            TokenKind::Ident => Some(Expression::Identifier(Identifier {
                token: self.current_token.clone(),
                name: self.current_token.literal.clone(),
            })),
            TokenKind::Int => self.parse_integer_literal(),
            TokenKind::True => Some(Expression::Boolean(true)),
            TokenKind::False => Some(Expression::Boolean(false)),
            TokenKind::Str => Some(Expression::StringLiteral(self.current_token.literal.clone())),
            TokenKind::Bang | TokenKind::Minus => self.parse_prefix_expression(),
            TokenKind::LParen => self.parse_grouped_expression(),
            TokenKind::If => self.parse_if_expression(),
            TokenKind::Function => self.parse_function_literal(),
            TokenKind::LBracket => self.parse_array_literal(),
            TokenKind::LBrace => self.parse_dict_literal(),
            other => {
                self.errors
                    .push(format!("No prefix parse function found for type {other}"));
                None
            }
        }
    }

    fn parse_infix(&mut self, left: Expression) -> Option<Expression> {
        match self.current_token.kind {
            TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Slash
            | TokenKind::Asterisk
            | TokenKind::Eq
            | TokenKind::NotEq
            | TokenKind::Lt
            | TokenKind::Gt => self.parse_infix_expression(left),
            TokenKind::LParen => self.parse_call_expression(left),
            TokenKind::LBracket => self.parse_index_expression(left),
            _ => Some(left),
        }
    }

    fn parse_integer_literal(&mut self) -> Option<Expression> {
        match self.current_token.literal.parse::<i64>() {
            Ok(value) => Some(Expression::IntegerLiteral(value)),
            Err(_) => {
                self.errors.push(format!(
                    "Could not parse {} as integer",
                    self.current_token.literal
                ));
                None
            }
        }
    }

    fn parse_prefix_expression(&mut self) -> Option<Expression> {
        let operator = self.current_token.literal.clone();
        self.advance();
        let right = self.parse_expression(Precedence::Prefix)?;
        Some(Expression::Prefix {
            operator,
            right: Box::new(right),
        })
    }

    fn parse_infix_expression(&mut self, left: Expression) -> Option<Expression> {
        let operator = self.current_token.literal.clone();
        let precedence = precedence_of(self.current_token.kind);
        self.advance();
        let right = self.parse_expression(precedence)?;
        Some(Expression::Infix {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        })
    }

    fn parse_grouped_expression(&mut self) -> Option<Expression> {
        self.advance();
        let expr = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::RParen) {
            return None;
        }
        Some(expr)
    }

    fn parse_if_expression(&mut self) -> Option<Expression> {
        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }
        self.advance();
        let condition = self.parse_expression(Precedence::Lowest)?;

        if !self.expect_peek(TokenKind::RParen) {
            return None;
        }
        if !self.expect_peek(TokenKind::LBrace) {
            return None;
        }
        let consequence = self.parse_block();

        let alternative = if self.peek_token.kind == TokenKind::Else {
            self.advance();
            if !self.expect_peek(TokenKind::LBrace) {
                return None;
            }
            Some(self.parse_block())
        } else {
            None
        };

        Some(Expression::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    fn parse_function_literal(&mut self) -> Option<Expression> {
        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }
        let parameters = self.parse_function_parameters()?;

        if !self.expect_peek(TokenKind::LBrace) {
            return None;
        }
        let body = self.parse_block();

        Some(Expression::FunctionLiteral(FunctionLiteral {
            parameters,
            body,
        }))
    }

    fn parse_function_parameters(&mut self) -> Option<Vec<Identifier>> {
        let mut identifiers = Vec::new();

        if self.peek_token.kind == TokenKind::RParen {
            self.advance();
            return Some(identifiers);
        }

        self.advance();
        identifiers.push(Identifier {
            token: self.current_token.clone(),
            name: self.current_token.literal.clone(),
        });

        while self.peek_token.kind == TokenKind::Comma {
            self.advance();
            self.advance();
            identifiers.push(Identifier {
                token: self.current_token.clone(),
                name: self.current_token.literal.clone(),
            });
        }

        if !self.expect_peek(TokenKind::RParen) {
            return None;
        }

        Some(identifiers)
    }

    fn parse_call_expression(&mut self, function: Expression) -> Option<Expression> {
        let arguments = self.parse_expression_list(TokenKind::RParen)?;
        Some(Expression::Call {
            function: Box::new(function),
            arguments,
        })
    }

    fn parse_index_expression(&mut self, target: Expression) -> Option<Expression> {
        self.advance();
        let index = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::RBracket) {
            return None;
        }
        Some(Expression::Index {
            target: Box::new(target),
            index: Box::new(index),
        })
    }

    fn parse_array_literal(&mut self) -> Option<Expression> {
        let elements = self.parse_expression_list(TokenKind::RBracket)?;
        Some(Expression::ArrayLiteral(elements))
    }

    fn parse_dict_literal(&mut self) -> Option<Expression> {
        let mut entries = Vec::new();

        while self.peek_token.kind != TokenKind::RBrace {
            self.advance();
            let key = self.parse_expression(Precedence::Lowest)?;

            if !self.expect_peek(TokenKind::Colon) {
                return None;
            }
            self.advance();
            let value = self.parse_expression(Precedence::Lowest)?;

            entries.push((key, value));

            if self.peek_token.kind != TokenKind::RBrace && !self.expect_peek(TokenKind::Comma) {
                return None;
            }
        }

        if !self.expect_peek(TokenKind::RBrace) {
            return None;
        }

        Some(Expression::DictLiteral(entries))
    }

    fn parse_expression_list(&mut self, end: TokenKind) -> Option<Vec<Expression>> {
        let mut list = Vec::new();

        if self.peek_token.kind == end {
            self.advance();
            return Some(list);
        }

        self.advance();
        list.push(self.parse_expression(Precedence::Lowest)?);

        while self.peek_token.kind == TokenKind::Comma {
            self.advance();
            self.advance();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }

        if !self.expect_peek(end) {
            return None;
        }

        Some(list)
    }

    fn expect_peek(&mut self, kind: TokenKind) -> bool {
        if self.peek_token.kind == kind {
            self.advance();
            true
        } else {
            self.peek_error(kind);
            false
        }
    }

    fn peek_error(&mut self, expected: TokenKind) {
        let msg = format!(
            "Expected {} token. Got {} instead",
            expected, self.peek_token.kind
        );
        debug!("{msg}");
        self.errors.push(msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Program {
        let lexer = Lexer::new(input);
        let mut parser = Parser::new(lexer);
        let program = parser.parse_program();
        assert!(
            parser.errors().is_empty(),
            "parser had errors: {:?}",
            parser.errors()
        );
        program
    }

    #[test]
    fn let_statements() {
        let program = parse("let x = 5; let y = 10; let foobar = 838383;");
        assert_eq!(program.statements.len(), 3);
        for (stmt, name) in program.statements.iter().zip(["x", "y", "foobar"]) {
            match stmt {
                Statement::Let { name: ident, .. } => assert_eq!(ident.name, name),
                other => panic!("expected let statement, got {other:?}"),
            }
        }
    }

    #[test]
    fn return_statements() {
        let program = parse("return 5; return 10; return 993322;");
        assert_eq!(program.statements.len(), 3);
        for stmt in &program.statements {
            assert!(matches!(stmt, Statement::Return { .. }));
        }
    }

    #[test]
    fn operator_precedence_pretty_printing() {
        let cases = [
            ("-a * b", "((-a) * b)"),
            ("!-a", "(!(-a))"),
            ("a + b + c", "((a + b) + c)"),
            ("a + b - c", "((a + b) - c)"),
            ("a * b * c", "((a * b) * c)"),
            ("a * b / c", "((a * b) / c)"),
            ("a + b / c", "(a + (b / c))"),
            ("a + b * c + d / e - f", "(((a + (b * c)) + (d / e)) - f)"),
            ("5 > 4 == 3 < 4", "((5 > 4) == (3 < 4))"),
            ("5 < 4 != 3 > 4", "((5 < 4) != (3 > 4))"),
            (
                "3 + 4 * 5 == 3 * 1 + 4 * 5",
                "((3 + (4 * 5)) == ((3 * 1) + (4 * 5)))",
            ),
            ("1 + (2 + 3) + 4", "((1 + (2 + 3)) + 4)"),
            ("(5 + 5) * 2", "((5 + 5) * 2)"),
            ("-(5 + 5)", "(-(5 + 5))"),
            ("!(true == true)", "(!(true == true))"),
            ("a + add(b * c) + d", "((a + add((b * c))) + d)"),
            ("a * [1, 2, 3, 4][b * c] * d", "((a * ([1, 2, 3, 4][(b * c)])) * d)"),
            (
                "add(a * b[2], b[1], 2 * [1, 2][1])",
                "add((a * (b[2])), (b[1]), (2 * ([1, 2][1])))",
            ),
        ];

        for (input, want) in cases {
            let program = parse(input);
            assert_eq!(program.to_string(), want, "input: {input}");
        }
    }

    #[test]
    fn if_else_expression() {
        let program = parse("if (x < y) { x } else { y }");
        assert_eq!(program.statements.len(), 1);
        match &program.statements[0] {
            Statement::Expression {
                expr: Expression::If { alternative, .. },
            } => assert!(alternative.is_some()),
            other => panic!("expected if expression, got {other:?}"),
        }
    }

    #[test]
    fn function_literal_parameters() {
        let program = parse("fn(x, y, z) { x + y; }");
        match &program.statements[0] {
            Statement::Expression {
                expr: Expression::FunctionLiteral(FunctionLiteral { parameters, .. }),
            } => {
                let names: Vec<&str> = parameters.iter().map(|p| p.name.as_str()).collect();
                assert_eq!(names, vec!["x", "y", "z"]);
            }
            other => panic!("expected function literal, got {other:?}"),
        }
    }

    #[test]
    fn call_expression_arguments() {
        let program = parse("add(1, 2 * 3, 4 + 5);");
        match &program.statements[0] {
            Statement::Expression {
                expr: Expression::Call { arguments, .. },
            } => assert_eq!(arguments.len(), 3),
            other => panic!("expected call expression, got {other:?}"),
        }
    }

    #[test]
    fn array_and_index_literals() {
        let program = parse("[1, 2 * 2, 3 + 3][1 + 1]");
        match &program.statements[0] {
            Statement::Expression {
                expr: Expression::Index { target, .. },
            } => assert!(matches!(**target, Expression::ArrayLiteral(_))),
            other => panic!("expected index expression, got {other:?}"),
        }
    }

    #[test]
    fn empty_dict_literal() {
        let program = parse("{}");
        match &program.statements[0] {
            Statement::Expression {
                expr: Expression::DictLiteral(entries),
            } => assert!(entries.is_empty()),
            other => panic!("expected dict literal, got {other:?}"),
        }
    }

    #[test]
    fn dict_literal_with_entries() {
        let program = parse(r#"{"one": 1, "two": 2, "three": 3}"#);
        match &program.statements[0] {
            Statement::Expression {
                expr: Expression::DictLiteral(entries),
            } => assert_eq!(entries.len(), 3),
            other => panic!("expected dict literal, got {other:?}"),
        }
    }

    #[test]
    fn missing_prefix_parse_fn_is_reported_as_an_error() {
        let lexer = Lexer::new(")");
        let mut parser = Parser::new(lexer);
        parser.parse_program();
        assert_eq!(parser.errors().len(), 1);
        assert!(parser.errors()[0].contains("No prefix parse function"));
    }

    #[test]
    fn missing_closing_paren_is_reported_as_an_error() {
        let lexer = Lexer::new("(1 + 2");
        let mut parser = Parser::new(lexer);
        parser.parse_program();
        assert!(!parser.errors().is_empty());
        assert!(parser.errors()[0].contains("Expected"));
    }
}
