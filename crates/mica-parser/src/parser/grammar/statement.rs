use crate::error::DiagnosticData;
use crate::lexer::TokenKind;
use crate::parser::grammar::declaration;
use crate::parser::grammar::expression;
use crate::parser::grammar::expression::ParsedExpr;
use crate::parser::{LabelRef, Parser, CONDITION_RECOVERY, STATEMENT_RECOVERY};
use crate::tables::{mode, Item, Mode, OpCode, ReprId};

/// The context a statement parses under, passed by value so that loop and
/// switch flags restore themselves on every exit path.
#[derive(Clone, Copy, Debug)]
pub(crate) struct StatementContext {
    pub(crate) in_loop: bool,
    pub(crate) in_switch: bool,
    pub(crate) return_mode: Mode,
}

impl StatementContext {
    pub(crate) fn function(return_mode: Mode) -> Self {
        Self {
            in_loop: false,
            in_switch: false,
            return_mode,
        }
    }

    fn looped(self) -> Self {
        Self {
            in_loop: true,
            ..self
        }
    }

    fn switched(self) -> Self {
        Self {
            in_switch: true,
            ..self
        }
    }
}

/// What kind of compound statement a `{` opens. Function bodies reuse the
/// parameter scope, and a `for` body shares the header scope so the
/// induction variable is visible in both.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BlockKind {
    Regular,
    Thread,
    FunctionBody,
    ForHeader,
}

/// Statement [C99 6.8]:
///
/// ```txt
/// statement:
///     labeled-statement
///     compound-statement
///     expression-statement
///     selection-statement
///     iteration-statement
///     jump-statement
/// ```
pub(crate) fn statement(p: &mut Parser<'_>, ctx: StatementContext) {
    if p.recursion_limit.check_and_increment() {
        p.limit_error();
        // Still make progress so the enclosing block reaches its `}`.
        p.skip_until(STATEMENT_RECOVERY);
        if !p.eat(TokenKind::Semicolon) {
            p.eat(TokenKind::LBrace);
        }
        return;
    }
    statement_inner(p, ctx);
    p.recursion_limit.decrement();
}

fn statement_inner(p: &mut Parser<'_>, ctx: StatementContext) {
    match p.peek() {
        TokenKind::LBrace => compound(p, ctx, BlockKind::Regular),
        TokenKind::If => if_statement(p, ctx),
        TokenKind::While => while_statement(p, ctx),
        TokenKind::Do => do_statement(p, ctx),
        TokenKind::For => for_statement(p, ctx),
        TokenKind::Switch => switch_statement(p, ctx),
        TokenKind::Case => case_statement(p, ctx),
        TokenKind::Default => default_statement(p, ctx),
        TokenKind::Break => {
            let token = p.pop();
            if !ctx.in_loop && !ctx.in_switch {
                p.error_at(
                    token.index(),
                    token.end(),
                    DiagnosticData::BreakOutsideLoopOrSwitch,
                );
            }
            p.tree.leaf(OpCode::Break, mode::VOID, &[]);
            p.expect(TokenKind::Semicolon);
        }
        TokenKind::Continue => {
            let token = p.pop();
            if !ctx.in_loop {
                p.error_at(token.index(), token.end(), DiagnosticData::ContinueOutsideLoop);
            }
            p.tree.leaf(OpCode::Continue, mode::VOID, &[]);
            p.expect(TokenKind::Semicolon);
        }
        TokenKind::Return => return_statement(p, ctx),
        TokenKind::Goto => goto_statement(p),
        TokenKind::Thread => thread_statement(p, ctx),
        TokenKind::Semicolon => {
            p.pop();
            p.tree.leaf(OpCode::Nop, mode::VOID, &[]);
        }
        TokenKind::Ident if p.peek2() == TokenKind::Colon => labeled_statement(p, ctx),
        _ => expression_statement(p),
    }
}

/// Compound statement [C99 6.8.2]. This is the single place scopes open and
/// close; recovery inside the block never steps past the closing `}`.
pub(crate) fn compound(p: &mut Parser<'_>, ctx: StatementContext, kind: BlockKind) {
    let opens_scope = matches!(kind, BlockKind::Regular | BlockKind::Thread);
    p.expect(TokenKind::LBrace);
    if opens_scope {
        p.idents.scope_enter();
    }
    p.tree.begin(OpCode::Block, mode::VOID);
    while !p.at(TokenKind::RBrace) && !p.at(TokenKind::Eof) {
        if declaration::at_declaration_start(p) {
            declaration::declaration(p, declaration::Position::Block);
        } else {
            statement(p, ctx);
        }
    }
    p.expect(TokenKind::RBrace);
    p.tree.end();
    if opens_scope {
        p.idents.scope_leave(&mut p.reprs);
    }
}

/// Parse `( expression )` and check the expression is scalar. Recovers to
/// the closing parenthesis or a statement boundary.
fn paren_condition(p: &mut Parser<'_>) -> Option<ParsedExpr> {
    p.expect(TokenKind::LParen);
    match expression::expression(p) {
        Some(cond) => {
            if !expression::is_scalar(p, cond.mode) {
                p.error_at(cond.start, cond.end, DiagnosticData::OperandTypeMismatch);
            }
            p.expect(TokenKind::RParen);
            Some(cond)
        }
        None => {
            p.skip_until(CONDITION_RECOVERY);
            p.eat(TokenKind::RParen);
            None
        }
    }
}

fn if_statement(p: &mut Parser<'_>, ctx: StatementContext) {
    p.pop();
    let node = p.tree.begin(OpCode::If, mode::VOID);
    p.tree.arg(0);
    paren_condition(p);
    statement(p, ctx);
    if p.eat(TokenKind::Else) {
        p.tree.set_arg(node, 0, 1);
        statement(p, ctx);
    }
    p.tree.end();
}

fn while_statement(p: &mut Parser<'_>, ctx: StatementContext) {
    p.pop();
    p.tree.begin(OpCode::While, mode::VOID);
    paren_condition(p);
    statement(p, ctx.looped());
    p.tree.end();
}

fn do_statement(p: &mut Parser<'_>, ctx: StatementContext) {
    p.pop();
    p.tree.begin(OpCode::DoWhile, mode::VOID);
    statement(p, ctx.looped());
    p.expect(TokenKind::While);
    paren_condition(p);
    p.expect(TokenKind::Semicolon);
    p.tree.end();
}

fn for_statement(p: &mut Parser<'_>, ctx: StatementContext) {
    p.pop();
    // The header scope covers the induction variable, the header clauses
    // and the body.
    p.idents.scope_enter();
    let node = p.tree.begin(OpCode::For, mode::VOID);
    p.tree.arg(0);
    p.tree.arg(0);
    p.tree.arg(0);
    p.expect(TokenKind::LParen);

    if p.eat(TokenKind::Semicolon) {
        // no init clause
    } else if declaration::at_declaration_start(p) {
        p.tree.set_arg(node, 0, 1);
        declaration::declaration(p, declaration::Position::Block);
    } else {
        p.tree.set_arg(node, 0, 1);
        match expression::expression(p) {
            Some(_) => {
                p.expect(TokenKind::Semicolon);
            }
            None => {
                p.skip_until(CONDITION_RECOVERY);
                p.eat(TokenKind::Semicolon);
            }
        }
    }

    if p.eat(TokenKind::Semicolon) {
        // no condition clause
    } else {
        p.tree.set_arg(node, 1, 1);
        match expression::expression(p) {
            Some(cond) => {
                if !expression::is_scalar(p, cond.mode) {
                    p.error_at(cond.start, cond.end, DiagnosticData::OperandTypeMismatch);
                }
                p.expect(TokenKind::Semicolon);
            }
            None => {
                p.skip_until(CONDITION_RECOVERY);
                p.eat(TokenKind::Semicolon);
            }
        }
    }

    if !p.at(TokenKind::RParen) {
        p.tree.set_arg(node, 2, 1);
        if expression::expression(p).is_none() {
            p.skip_until(CONDITION_RECOVERY);
        }
    }
    p.expect(TokenKind::RParen);

    let body_ctx = ctx.looped();
    if p.at(TokenKind::LBrace) {
        compound(p, body_ctx, BlockKind::ForHeader);
    } else {
        statement(p, body_ctx);
    }
    p.tree.end();
    p.idents.scope_leave(&mut p.reprs);
}

fn switch_statement(p: &mut Parser<'_>, ctx: StatementContext) {
    p.pop();
    p.tree.begin(OpCode::Switch, mode::VOID);
    p.expect(TokenKind::LParen);
    match expression::expression(p) {
        Some(cond) => {
            if !expression::is_integral(cond.mode) {
                p.error_at(cond.start, cond.end, DiagnosticData::OperandTypeMismatch);
            }
            p.expect(TokenKind::RParen);
        }
        None => {
            p.skip_until(CONDITION_RECOVERY);
            p.eat(TokenKind::RParen);
        }
    }
    statement(p, ctx.switched());
    p.tree.end();
}

fn case_statement(p: &mut Parser<'_>, ctx: StatementContext) {
    let token = *p.current();
    if !ctx.in_switch {
        p.error_at(token.index(), token.end(), DiagnosticData::CaseOutsideSwitch);
    }
    p.pop();
    let node = p.tree.begin(OpCode::Case, mode::VOID);
    p.tree.arg(0);
    if let Some((_, value)) = expression::constant(p) {
        p.tree.set_arg(node, 0, value);
    }
    p.expect(TokenKind::Colon);
    statement(p, ctx);
    p.tree.end();
}

fn default_statement(p: &mut Parser<'_>, ctx: StatementContext) {
    let token = *p.current();
    if !ctx.in_switch {
        p.error_at(token.index(), token.end(), DiagnosticData::DefaultOutsideSwitch);
    }
    p.pop();
    p.tree.begin(OpCode::Default, mode::VOID);
    p.expect(TokenKind::Colon);
    statement(p, ctx);
    p.tree.end();
}

fn return_statement(p: &mut Parser<'_>, ctx: StatementContext) {
    let token = p.pop();
    p.was_return = true;
    let node = p.tree.begin(OpCode::Return, mode::VOID);
    p.tree.arg(0);
    if p.eat(TokenKind::Semicolon) {
        if ctx.return_mode != mode::VOID {
            p.error_at(token.index(), token.end(), DiagnosticData::ReturnTypeMismatch);
        }
    } else {
        p.tree.set_arg(node, 0, 1);
        match expression::expression(p) {
            Some(mut value) => {
                if ctx.return_mode == mode::VOID {
                    p.error_at(value.start, value.end, DiagnosticData::ReturnTypeMismatch);
                } else {
                    match expression::assignability(ctx.return_mode, value.mode) {
                        expression::Compat::Same => {}
                        expression::Compat::Widen => {
                            expression::cast(p, &mut value, ctx.return_mode)
                        }
                        expression::Compat::No => p.error_at(
                            value.start,
                            value.end,
                            DiagnosticData::ReturnTypeMismatch,
                        ),
                    }
                }
                p.expect(TokenKind::Semicolon);
            }
            None => {
                p.skip_until(STATEMENT_RECOVERY);
                p.eat(TokenKind::Semicolon);
            }
        }
    }
    p.tree.end();
}

fn goto_statement(p: &mut Parser<'_>) {
    p.pop();
    if !p.at(TokenKind::Ident) {
        p.error(DiagnosticData::Expected {
            expected: "a label name",
        });
        p.skip_until(STATEMENT_RECOVERY);
        p.eat(TokenKind::Semicolon);
        return;
    }
    let token = p.pop();
    let repr = p.intern(&token);
    let at = label_index(p, repr, token.index());
    let ident = p.labels[at].ident;
    p.tree
        .leaf(OpCode::Goto, mode::VOID, &[ident.index() as Item]);
    p.expect(TokenKind::Semicolon);
}

fn labeled_statement(p: &mut Parser<'_>, ctx: StatementContext) {
    let token = p.pop();
    p.pop(); // the colon
    let repr = p.intern(&token);
    let at = label_index(p, repr, token.index());
    let ident = p.labels[at].ident;
    if p.labels[at].defined {
        p.error_at(
            token.index(),
            token.end(),
            DiagnosticData::LabelRedeclared {
                name: token.data().to_string(),
            },
        );
    } else {
        p.labels[at].defined = true;
    }
    let node = p.tree.begin(OpCode::Labeled, mode::VOID);
    p.tree.arg(ident.index() as Item);
    p.idents.set_displ(ident, node.index() as Item);
    statement(p, ctx);
    p.tree.end();
}

/// Find the label for `repr` in the current function, creating an
/// unresolved one on first mention.
fn label_index(p: &mut Parser<'_>, repr: ReprId, first_use: usize) -> usize {
    if let Some(at) = p.labels.iter().position(|l| l.repr == repr) {
        return at;
    }
    let ident = p.idents.install_label(repr, mode::VOID);
    p.labels.push(LabelRef {
        repr,
        ident,
        defined: false,
        first_use,
    });
    p.labels.len() - 1
}

fn thread_statement(p: &mut Parser<'_>, ctx: StatementContext) {
    p.pop();
    p.tree.begin(OpCode::ThreadBlock, mode::VOID);
    if p.at(TokenKind::LBrace) {
        compound(p, ctx, BlockKind::Thread);
    } else {
        p.error(DiagnosticData::Expected {
            expected: TokenKind::LBrace.describe(),
        });
        p.skip_until(STATEMENT_RECOVERY);
    }
    p.tree.end();
}

fn expression_statement(p: &mut Parser<'_>) {
    match expression::expression(p) {
        Some(_) => {
            p.expect(TokenKind::Semicolon);
        }
        None => {
            p.skip_until(STATEMENT_RECOVERY);
            p.eat(TokenKind::Semicolon);
        }
    }
}

#[cfg(test)]
mod test {
    use crate::error::DiagnosticData;
    use crate::Parser;

    fn parse_errors(input: &str) -> Vec<DiagnosticData> {
        Parser::new(input)
            .parse()
            .errors()
            .iter()
            .map(|e| e.code().clone())
            .collect()
    }

    #[test]
    fn break_outside_loop_or_switch() {
        assert_eq!(
            parse_errors("void f() { break; }"),
            vec![DiagnosticData::BreakOutsideLoopOrSwitch]
        );
    }

    #[test]
    fn continue_outside_loop() {
        assert_eq!(
            parse_errors("void f() { switch (1) { default: continue; } }"),
            vec![DiagnosticData::ContinueOutsideLoop]
        );
    }

    #[test]
    fn case_outside_switch() {
        assert_eq!(
            parse_errors("void f() { case 1: ; }"),
            vec![DiagnosticData::CaseOutsideSwitch]
        );
    }

    #[test]
    fn break_inside_loop_is_fine() {
        assert_eq!(
            parse_errors("void f() { while (1) { break; } }"),
            Vec::<DiagnosticData>::new()
        );
    }

    #[test]
    fn loop_context_does_not_leak_out_of_the_body() {
        assert_eq!(
            parse_errors("void f() { while (1) { } break; }"),
            vec![DiagnosticData::BreakOutsideLoopOrSwitch]
        );
    }

    #[test]
    fn forward_goto_resolves() {
        assert_eq!(
            parse_errors("void f() { goto done; done: ; }"),
            Vec::<DiagnosticData>::new()
        );
    }

    #[test]
    fn undefined_label_is_reported_at_first_use() {
        let source = "void f() { goto missing; }";
        let syntax = Parser::new(source).parse();
        assert_eq!(syntax.errors().len(), 1);
        let error = &syntax.errors()[0];
        assert_eq!(
            error.code(),
            &DiagnosticData::UndefinedLabel {
                name: "missing".into()
            }
        );
        assert_eq!(error.index(), source.find("missing").unwrap());
    }

    #[test]
    fn label_defined_twice() {
        assert_eq!(
            parse_errors("void f() { l: ; l: ; }"),
            vec![DiagnosticData::LabelRedeclared { name: "l".into() }]
        );
    }

    #[test]
    fn for_header_scope_covers_the_body_only() {
        assert_eq!(
            parse_errors("void f() { for (int i = 0; i < 3; i = i + 1) { i; } i; }"),
            vec![DiagnosticData::UndeclaredIdentifier { name: "i".into() }]
        );
    }

    #[test]
    fn do_while_and_switch_parse() {
        let source = "
            int main() {
                int i = 0;
                do { i = i + 1; } while (i < 3);
                switch (i) {
                    case 1: break;
                    case 2: break;
                    default: i = 0;
                }
                return i;
            }
        ";
        assert_eq!(parse_errors(source), Vec::<DiagnosticData>::new());
    }

    #[test]
    fn thread_block_opens_its_own_scope() {
        assert_eq!(
            parse_errors("void f() { thread { int x; x = 1; } x; }"),
            vec![DiagnosticData::UndeclaredIdentifier { name: "x".into() }]
        );
    }

    #[test]
    fn return_type_is_checked() {
        assert_eq!(
            parse_errors("void f() { return 1; }"),
            vec![DiagnosticData::ReturnTypeMismatch]
        );
    }
}
