//! Recursive-descent parser with inline symbol binding and plain name/type
//! checking (spec §1, §4.0 in SPEC_FULL.md).
//!
//! Not part of the analysis core. Produces the typed, resolved [`ast::Program`]
//! the core consumes, plus a per-function [`SymbolTable`] and a
//! [`DiagnosticSink`] of front-end diagnostics (unsound, best-effort).

use crate::ast::{BinaryOp, Block, Expr, Function, Location, Param, Program, Stmt, SymbolId, Type, UnaryOp};
use crate::diagnostics::{DiagnosticKind, DiagnosticSink};
use crate::error::InternalError;
use crate::lexer::{Lexer, SpannedToken, Token};
use crate::symbols::{FunctionSig, Signatures, SymbolKind, SymbolTable};
use std::collections::HashMap;

/// Sentinel id used for a use of an undeclared variable, so parsing and
/// type checking can continue after reporting `UndeclaredVariable`. The
/// pipeline never hands a function containing this id to the CFG builder.
pub const POISON_SYMBOL: SymbolId = SymbolId::MAX;

pub struct ParseOutput {
    pub program: Program,
    pub symbols: HashMap<String, SymbolTable>,
    pub diagnostics: DiagnosticSink,
    /// Functions whose own parse produced an error-level front-end diagnostic
    /// (§4.0): the core's AST input contract requires a fully resolved
    /// program, so the pipeline excludes these from CFG-based analysis
    /// rather than handing a poisoned symbol id to the builder.
    pub function_errors: std::collections::HashSet<String>,
}

pub fn parse(source: &str) -> Result<ParseOutput, InternalError> {
    let tokens = Lexer::new(source).tokenize()?;
    let signatures = collect_signatures(&tokens)?;

    let mut parser = Parser {
        tokens,
        pos: 0,
        signatures,
        diagnostics: DiagnosticSink::new(),
    };

    let mut functions = Vec::new();
    let mut symbols = HashMap::new();
    let mut function_errors = std::collections::HashSet::new();
    while !parser.check(&Token::Eof) {
        let before = parser.diagnostics.as_slice().len();
        let (function, table) = parser.parse_function()?;
        if parser.diagnostics.as_slice()[before..]
            .iter()
            .any(|d| d.severity == crate::diagnostics::Severity::Error)
        {
            function_errors.insert(function.name.clone());
        }
        symbols.insert(function.name.clone(), table);
        functions.push(function);
    }

    Ok(ParseOutput {
        program: Program { functions },
        symbols,
        diagnostics: parser.diagnostics,
        function_errors,
    })
}

/// First pass: scan function headers without binding bodies, so calls to
/// functions declared later in the file still type-check correctly.
fn collect_signatures(tokens: &[SpannedToken]) -> Result<Signatures, InternalError> {
    let mut sigs = Signatures::new();
    let mut i = 0;
    while i < tokens.len() {
        if let Some(ty) = type_token(&tokens[i].token) {
            if let Token::Ident(name) = &tokens.get(i + 1).map(|t| &t.token).unwrap_or(&Token::Eof) {
                let name = name.clone();
                let mut j = i + 2;
                if tokens.get(j).map(|t| &t.token) == Some(&Token::LParen) {
                    j += 1;
                    let mut params = Vec::new();
                    while tokens.get(j).map(|t| &t.token) != Some(&Token::RParen) {
                        if let Some(pty) = tokens.get(j).and_then(|t| type_token(&t.token)) {
                            params.push(pty);
                            j += 2; // type + identifier
                            if tokens.get(j).map(|t| &t.token) == Some(&Token::Comma) {
                                j += 1;
                            }
                        } else {
                            break;
                        }
                    }
                    sigs.insert(FunctionSig {
                        name,
                        return_type: ty,
                        params,
                    });
                    i = j;
                    continue;
                }
            }
        }
        i += 1;
    }
    Ok(sigs)
}

fn type_token(token: &Token) -> Option<Type> {
    match token {
        Token::Int => Some(Type::Int),
        Token::Bool => Some(Type::Bool),
        _ => None,
    }
}

struct Scope {
    names: HashMap<String, SymbolId>,
}

struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
    signatures: Signatures,
    diagnostics: DiagnosticSink,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].token
    }

    fn loc(&self) -> Location {
        self.tokens[self.pos.min(self.tokens.len() - 1)].loc
    }

    fn check(&self, token: &Token) -> bool {
        self.peek() == token
    }

    fn advance(&mut self) -> SpannedToken {
        let t = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn expect(&mut self, token: &Token, what: &str) -> Result<SpannedToken, InternalError> {
        if self.check(token) {
            Ok(self.advance())
        } else {
            Err(InternalError::Parse {
                loc: self.loc(),
                message: format!("expected {}, found {:?}", what, self.peek()),
            })
        }
    }

    fn expect_ident(&mut self) -> Result<(String, Location), InternalError> {
        let loc = self.loc();
        match self.peek().clone() {
            Token::Ident(name) => {
                self.advance();
                Ok((name, loc))
            }
            other => Err(InternalError::Parse {
                loc,
                message: format!("expected identifier, found {:?}", other),
            }),
        }
    }

    fn parse_type(&mut self) -> Result<Type, InternalError> {
        let loc = self.loc();
        match self.peek() {
            Token::Int => {
                self.advance();
                Ok(Type::Int)
            }
            Token::Bool => {
                self.advance();
                Ok(Type::Bool)
            }
            other => Err(InternalError::Parse {
                loc,
                message: format!("expected type, found {:?}", other),
            }),
        }
    }

    fn parse_function(&mut self) -> Result<(Function, SymbolTable), InternalError> {
        let start = self.loc();
        let return_type = self.parse_type()?;
        let (name, _) = self.expect_ident()?;

        self.expect(&Token::LParen, "'('")?;
        let mut table = SymbolTable::new();
        let mut scope = Scope { names: HashMap::new() };
        let mut params = Vec::new();
        while !self.check(&Token::RParen) {
            let ploc = self.loc();
            let pty = self.parse_type()?;
            let (pname, ident_loc) = self.expect_ident()?;
            let id = table.declare(pname.clone(), pty, SymbolKind::Param, ident_loc);
            if scope.names.insert(pname.clone(), id).is_some() {
                self.diagnostics.report(
                    DiagnosticKind::DuplicateDeclaration,
                    ident_loc,
                    format!("duplicate parameter '{}'", pname),
                );
            }
            params.push(Param {
                symbol: id,
                name: pname,
                ty: pty,
                loc: ploc,
            });
            if self.check(&Token::Comma) {
                self.advance();
            }
        }
        self.expect(&Token::RParen, "')'")?;
        self.expect(&Token::LBrace, "'{'")?;

        let mut scopes = vec![scope];
        let body = self.parse_stmt_list(&mut table, &mut scopes, return_type)?;
        let end_loc = self.loc();
        self.expect(&Token::RBrace, "'}'")?;

        Ok((
            Function {
                name,
                return_type,
                params,
                body,
                loc: start,
                end_loc,
            },
            table,
        ))
    }

    fn parse_stmt_list(
        &mut self,
        table: &mut SymbolTable,
        scopes: &mut Vec<Scope>,
        return_type: Type,
    ) -> Result<Block, InternalError> {
        let mut stmts = Vec::new();
        while !self.check(&Token::RBrace) && !self.check(&Token::Eof) {
            stmts.push(self.parse_stmt(table, scopes, return_type)?);
        }
        Ok(stmts)
    }

    fn parse_block(
        &mut self,
        table: &mut SymbolTable,
        scopes: &mut Vec<Scope>,
        return_type: Type,
    ) -> Result<Block, InternalError> {
        self.expect(&Token::LBrace, "'{'")?;
        scopes.push(Scope { names: HashMap::new() });
        let body = self.parse_stmt_list(table, scopes, return_type)?;
        scopes.pop();
        self.expect(&Token::RBrace, "'}'")?;
        Ok(body)
    }

    fn declare_local(&mut self, table: &mut SymbolTable, scopes: &mut Vec<Scope>, name: String, ty: Type, loc: Location) -> SymbolId {
        let id = table.declare(name.clone(), ty, SymbolKind::Local, loc);
        let scope = scopes.last_mut().expect("at least one scope while parsing a function body");
        if scope.names.insert(name.clone(), id).is_some() {
            self.diagnostics
                .report(DiagnosticKind::DuplicateDeclaration, loc, format!("'{}' already declared in this scope", name));
        }
        id
    }

    fn resolve(&mut self, table: &SymbolTable, scopes: &[Scope], name: &str, loc: Location) -> SymbolId {
        for scope in scopes.iter().rev() {
            if let Some(&id) = scope.names.get(name) {
                return id;
            }
        }
        self.diagnostics
            .report(DiagnosticKind::UndeclaredVariable, loc, format!("undeclared variable '{}'", name));
        let _ = table;
        POISON_SYMBOL
    }

    fn symbol_type(&self, table: &SymbolTable, id: SymbolId) -> Option<Type> {
        table.get(id).map(|s| s.ty)
    }

    fn parse_stmt(&mut self, table: &mut SymbolTable, scopes: &mut Vec<Scope>, return_type: Type) -> Result<Stmt, InternalError> {
        match self.peek().clone() {
            Token::Int | Token::Bool => {
                let loc = self.loc();
                let ty = self.parse_type()?;
                let (name, ident_loc) = self.expect_ident()?;
                let init = if self.check(&Token::Assign) {
                    self.advance();
                    let expr = self.parse_expr(table, scopes)?;
                    self.check_type(&expr, table, ty, "variable initializer");
                    Some(expr)
                } else {
                    None
                };
                self.expect(&Token::Semi, "';'")?;
                let symbol = self.declare_local(table, scopes, name.clone(), ty, ident_loc);
                Ok(Stmt::VarDecl { symbol, name, ty, init, loc })
            }
            Token::If => {
                let loc = self.loc();
                self.advance();
                self.expect(&Token::LParen, "'('")?;
                // Accepts `int` as well as `bool`: the core treats a bare
                // `int` condition as a truthy test (spec.md §8 scenario 6,
                // §4.8's `if (x)` edge refinement), so both of MiniC's two
                // types are legal here and no TypeMismatch is possible.
                let cond = self.parse_expr(table, scopes)?;
                self.expect(&Token::RParen, "')'")?;
                let then_block = self.parse_block(table, scopes, return_type)?;
                let else_block = if self.check(&Token::Else) {
                    self.advance();
                    Some(self.parse_block(table, scopes, return_type)?)
                } else {
                    None
                };
                Ok(Stmt::If { cond, then_block, else_block, loc })
            }
            Token::While => {
                let loc = self.loc();
                self.advance();
                self.expect(&Token::LParen, "'('")?;
                let cond = self.parse_expr(table, scopes)?;
                self.expect(&Token::RParen, "')'")?;
                let body = self.parse_block(table, scopes, return_type)?;
                Ok(Stmt::While { cond, body, loc })
            }
            Token::Return => {
                let loc = self.loc();
                self.advance();
                let value = if self.check(&Token::Semi) {
                    self.diagnostics.report(
                        DiagnosticKind::TypeMismatch,
                        loc,
                        format!("function returns '{}' but `return;` supplies no value", return_type),
                    );
                    None
                } else {
                    let expr = self.parse_expr(table, scopes)?;
                    self.check_type(&expr, table, return_type, "return value");
                    Some(expr)
                };
                self.expect(&Token::Semi, "';'")?;
                Ok(Stmt::Return { value, loc })
            }
            Token::Print => {
                let loc = self.loc();
                self.advance();
                self.expect(&Token::LParen, "'('")?;
                let value = self.parse_expr(table, scopes)?;
                self.expect(&Token::RParen, "')'")?;
                self.expect(&Token::Semi, "';'")?;
                Ok(Stmt::Print { value, loc })
            }
            Token::LBrace => {
                let loc = self.loc();
                let body = self.parse_block(table, scopes, return_type)?;
                Ok(Stmt::Block { body, loc })
            }
            Token::Ident(name) => {
                let loc = self.loc();
                self.advance();
                self.expect(&Token::Assign, "'='")?;
                let value = self.parse_expr(table, scopes)?;
                self.expect(&Token::Semi, "';'")?;
                let symbol = self.resolve(table, scopes, &name, loc);
                if let Some(ty) = self.symbol_type(table, symbol) {
                    self.check_type(&value, table, ty, "assignment");
                }
                Ok(Stmt::Assign { symbol, name, value, loc })
            }
            other => Err(InternalError::Parse {
                loc: self.loc(),
                message: format!("unexpected token {:?} at statement start", other),
            }),
        }
    }

    fn infer_type(&self, expr: &Expr, table: &SymbolTable) -> Option<Type> {
        match expr {
            Expr::IntLit { .. } => Some(Type::Int),
            Expr::BoolLit { .. } => Some(Type::Bool),
            Expr::Var { symbol, .. } => self.symbol_type(table, *symbol),
            Expr::Unary { op, .. } => Some(match op {
                UnaryOp::Neg => Type::Int,
                UnaryOp::Not => Type::Bool,
            }),
            Expr::Binary { op, .. } => Some(if op.is_logical() || op.is_comparison() { Type::Bool } else { Type::Int }),
            Expr::Call { callee, .. } => self.signatures.get(callee).map(|s| s.return_type),
        }
    }

    fn check_type(&mut self, expr: &Expr, table: &SymbolTable, expected: Type, context: &str) {
        if let Some(actual) = self.infer_type(expr, table) {
            if actual != expected {
                self.diagnostics.report(
                    DiagnosticKind::TypeMismatch,
                    expr.loc(),
                    format!("{}: expected '{}', found '{}'", context, expected, actual),
                );
            }
        }
    }

    // Precedence climbing: or < and < equality < relational < additive < multiplicative < unary < primary.
    fn parse_expr(&mut self, table: &mut SymbolTable, scopes: &mut Vec<Scope>) -> Result<Expr, InternalError> {
        self.parse_or(table, scopes)
    }

    fn parse_or(&mut self, table: &mut SymbolTable, scopes: &mut Vec<Scope>) -> Result<Expr, InternalError> {
        let mut lhs = self.parse_and(table, scopes)?;
        while self.check(&Token::OrOr) {
            let loc = self.loc();
            self.advance();
            let rhs = self.parse_and(table, scopes)?;
            self.check_type(&lhs, table, Type::Bool, "operand of '||'");
            self.check_type(&rhs, table, Type::Bool, "operand of '||'");
            lhs = Expr::Binary { op: BinaryOp::Or, lhs: Box::new(lhs), rhs: Box::new(rhs), loc };
        }
        Ok(lhs)
    }

    fn parse_and(&mut self, table: &mut SymbolTable, scopes: &mut Vec<Scope>) -> Result<Expr, InternalError> {
        let mut lhs = self.parse_equality(table, scopes)?;
        while self.check(&Token::AndAnd) {
            let loc = self.loc();
            self.advance();
            let rhs = self.parse_equality(table, scopes)?;
            self.check_type(&lhs, table, Type::Bool, "operand of '&&'");
            self.check_type(&rhs, table, Type::Bool, "operand of '&&'");
            lhs = Expr::Binary { op: BinaryOp::And, lhs: Box::new(lhs), rhs: Box::new(rhs), loc };
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self, table: &mut SymbolTable, scopes: &mut Vec<Scope>) -> Result<Expr, InternalError> {
        let mut lhs = self.parse_relational(table, scopes)?;
        loop {
            let op = match self.peek() {
                Token::EqEq => BinaryOp::Eq,
                Token::Ne => BinaryOp::Ne,
                _ => break,
            };
            let loc = self.loc();
            self.advance();
            let rhs = self.parse_relational(table, scopes)?;
            if let (Some(lt), Some(rt)) = (self.infer_type(&lhs, table), self.infer_type(&rhs, table)) {
                if lt != rt {
                    self.diagnostics.report(
                        DiagnosticKind::TypeMismatch,
                        loc,
                        format!("cannot compare '{}' with '{}'", lt, rt),
                    );
                }
            }
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs), loc };
        }
        Ok(lhs)
    }

    fn parse_relational(&mut self, table: &mut SymbolTable, scopes: &mut Vec<Scope>) -> Result<Expr, InternalError> {
        let mut lhs = self.parse_additive(table, scopes)?;
        loop {
            let op = match self.peek() {
                Token::Lt => BinaryOp::Lt,
                Token::Le => BinaryOp::Le,
                Token::Gt => BinaryOp::Gt,
                Token::Ge => BinaryOp::Ge,
                _ => break,
            };
            let loc = self.loc();
            self.advance();
            let rhs = self.parse_additive(table, scopes)?;
            self.check_type(&lhs, table, Type::Int, "relational operand");
            self.check_type(&rhs, table, Type::Int, "relational operand");
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs), loc };
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self, table: &mut SymbolTable, scopes: &mut Vec<Scope>) -> Result<Expr, InternalError> {
        let mut lhs = self.parse_multiplicative(table, scopes)?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => break,
            };
            let loc = self.loc();
            self.advance();
            let rhs = self.parse_multiplicative(table, scopes)?;
            self.check_type(&lhs, table, Type::Int, "arithmetic operand");
            self.check_type(&rhs, table, Type::Int, "arithmetic operand");
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs), loc };
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self, table: &mut SymbolTable, scopes: &mut Vec<Scope>) -> Result<Expr, InternalError> {
        let mut lhs = self.parse_unary(table, scopes)?;
        loop {
            let op = match self.peek() {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                Token::Percent => BinaryOp::Mod,
                _ => break,
            };
            let loc = self.loc();
            self.advance();
            let rhs = self.parse_unary(table, scopes)?;
            self.check_type(&lhs, table, Type::Int, "arithmetic operand");
            self.check_type(&rhs, table, Type::Int, "arithmetic operand");
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs), loc };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self, table: &mut SymbolTable, scopes: &mut Vec<Scope>) -> Result<Expr, InternalError> {
        let loc = self.loc();
        match self.peek() {
            Token::Minus => {
                self.advance();
                let operand = self.parse_unary(table, scopes)?;
                self.check_type(&operand, table, Type::Int, "operand of unary '-'");
                Ok(Expr::Unary { op: UnaryOp::Neg, operand: Box::new(operand), loc })
            }
            Token::Bang => {
                self.advance();
                let operand = self.parse_unary(table, scopes)?;
                self.check_type(&operand, table, Type::Bool, "operand of '!'");
                Ok(Expr::Unary { op: UnaryOp::Not, operand: Box::new(operand), loc })
            }
            _ => self.parse_primary(table, scopes),
        }
    }

    fn parse_primary(&mut self, table: &mut SymbolTable, scopes: &mut Vec<Scope>) -> Result<Expr, InternalError> {
        let loc = self.loc();
        match self.peek().clone() {
            Token::IntLit(digits) => {
                self.advance();
                let value: i64 = digits.parse().unwrap_or(i64::MAX);
                Ok(Expr::IntLit { value, loc })
            }
            Token::True => {
                self.advance();
                Ok(Expr::BoolLit { value: true, loc })
            }
            Token::False => {
                self.advance();
                Ok(Expr::BoolLit { value: false, loc })
            }
            Token::LParen => {
                self.advance();
                let inner = self.parse_expr(table, scopes)?;
                self.expect(&Token::RParen, "')'")?;
                Ok(inner)
            }
            Token::Ident(name) => {
                self.advance();
                if self.check(&Token::LParen) {
                    self.advance();
                    let mut args = Vec::new();
                    while !self.check(&Token::RParen) {
                        args.push(self.parse_expr(table, scopes)?);
                        if self.check(&Token::Comma) {
                            self.advance();
                        }
                    }
                    self.expect(&Token::RParen, "')'")?;
                    self.check_call(&name, &args, table, loc);
                    Ok(Expr::Call { callee: name, args, loc })
                } else {
                    let symbol = self.resolve(table, scopes, &name, loc);
                    Ok(Expr::Var { symbol, name, loc })
                }
            }
            other => Err(InternalError::Parse {
                loc,
                message: format!("unexpected token {:?} in expression", other),
            }),
        }
    }

    fn check_call(&mut self, name: &str, args: &[Expr], table: &SymbolTable, loc: Location) {
        let Some(sig) = self.signatures.get(name).cloned() else {
            self.diagnostics
                .report(DiagnosticKind::UnknownFunction, loc, format!("call to unknown function '{}'", name));
            return;
        };
        if sig.params.len() != args.len() {
            self.diagnostics.report(
                DiagnosticKind::ArityMismatch,
                loc,
                format!("'{}' expects {} argument(s), found {}", name, sig.params.len(), args.len()),
            );
            return;
        }
        for (arg, expected) in args.iter().zip(sig.params.iter()) {
            if let Some(actual) = self.infer_type(arg, table) {
                if actual != *expected {
                    self.diagnostics.report(
                        DiagnosticKind::TypeMismatch,
                        arg.loc(),
                        format!("argument to '{}': expected '{}', found '{}'", name, expected, actual),
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_function() {
        let src = "int main() { return 0; }";
        let out = parse(src).unwrap();
        assert_eq!(out.program.functions.len(), 1);
        assert!(!out.diagnostics.has_errors());
    }

    #[test]
    fn reports_undeclared_variable() {
        let src = "int main() { print(x); return 0; }";
        let out = parse(src).unwrap();
        assert!(out.diagnostics.as_slice().iter().any(|d| d.kind == DiagnosticKind::UndeclaredVariable));
    }

    #[test]
    fn reports_type_mismatch_on_bad_initializer() {
        let src = "int main() { int x = true; return 0; }";
        let out = parse(src).unwrap();
        assert!(out.diagnostics.as_slice().iter().any(|d| d.kind == DiagnosticKind::TypeMismatch));
    }

    #[test]
    fn allows_forward_reference_between_functions() {
        let src = "int main() { return helper(1); } int helper(int a) { return a; }";
        let out = parse(src).unwrap();
        assert!(!out.diagnostics.has_errors());
    }

    #[test]
    fn reports_arity_mismatch() {
        let src = "int helper(int a) { return a; } int main() { return helper(1, 2); }";
        let out = parse(src).unwrap();
        assert!(out.diagnostics.as_slice().iter().any(|d| d.kind == DiagnosticKind::ArityMismatch));
    }

    #[test]
    fn shadowing_in_inner_scope_is_allowed() {
        let src = "int main() { int x = 1; if (x == 1) { int x = 2; print(x); } return x; }";
        let out = parse(src).unwrap();
        assert!(!out.diagnostics.as_slice().iter().any(|d| d.kind == DiagnosticKind::DuplicateDeclaration));
    }

    #[test]
    fn bare_int_condition_is_a_truthy_test_not_a_type_error() {
        let src = "int main() { int x = 5; if (x) { return 1; } return 0; }";
        let out = parse(src).unwrap();
        assert!(!out.diagnostics.has_errors(), "{:?}", out.diagnostics.as_slice());
    }

    #[test]
    fn function_with_front_end_error_is_tracked_for_exclusion() {
        let src = "int main() { print(undeclared); return 0; }";
        let out = parse(src).unwrap();
        assert!(out.function_errors.contains("main"));
    }
}
