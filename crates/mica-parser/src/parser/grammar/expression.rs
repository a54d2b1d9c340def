use crate::error::DiagnosticData;
use crate::lexer::TokenKind;
use crate::parser::Parser;
use crate::tables::{mode, Item, Mode, NodeId, OpCode, Tree};

/// A parsed expression: its node in the tree, its inferred mode, and the
/// source range it covers. A subparser that fails syntactically returns
/// `None` instead; the enclosing statement or declaration recovers.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ParsedExpr {
    pub(crate) node: NodeId,
    pub(crate) mode: Mode,
    pub(crate) start: usize,
    pub(crate) end: usize,
}

/// Expression [C99 6.5.17]:
///
/// ```txt
/// expression:
///     assignment-expression
///     expression , assignment-expression
/// ```
pub(crate) fn expression(p: &mut Parser<'_>) -> Option<ParsedExpr> {
    let mut lhs = assignment(p)?;
    while p.at(TokenKind::Comma) {
        p.pop();
        let rhs = assignment(p)?;
        lhs = ParsedExpr {
            node: p.tree.wrap(lhs.node, OpCode::Comma, rhs.mode, &[]),
            mode: rhs.mode,
            start: lhs.start,
            end: rhs.end,
        };
    }
    Some(lhs)
}

/// Assignment expression [C99 6.5.16]. The left operand must be a modifiable
/// lvalue, which is a property of its opcode rather than of its type.
pub(crate) fn assignment(p: &mut Parser<'_>) -> Option<ParsedExpr> {
    let lhs = conditional(p)?;
    let Some(op) = assign_op(p.peek()) else {
        return Some(lhs);
    };
    p.pop();

    if !is_lvalue(p.tree.op(lhs.node)) {
        p.error_at(lhs.start, lhs.end, DiagnosticData::AssignmentToNonLvalue);
    }

    let mut rhs = assignment(p)?;
    if op == OpCode::Assign {
        match assignability(lhs.mode, rhs.mode) {
            Compat::Same => {}
            Compat::Widen => cast(p, &mut rhs, lhs.mode),
            Compat::No => {
                p.error_at(lhs.start, rhs.end, DiagnosticData::IncompatibleAssignment)
            }
        }
    } else {
        let integral_only = matches!(
            op,
            OpCode::RemAssign
                | OpCode::ShlAssign
                | OpCode::ShrAssign
                | OpCode::AndAssign
                | OpCode::XorAssign
                | OpCode::OrAssign
        );
        let ok = if integral_only {
            is_integral(lhs.mode) && is_integral(rhs.mode)
        } else {
            is_arithmetic(lhs.mode) && is_arithmetic(rhs.mode)
        };
        if !ok {
            p.error_at(lhs.start, rhs.end, DiagnosticData::OperandTypeMismatch);
        } else if (lhs.mode == mode::FLOAT) != (rhs.mode == mode::FLOAT) {
            cast(p, &mut rhs, lhs.mode);
        }
    }

    Some(ParsedExpr {
        node: p.tree.wrap(lhs.node, op, lhs.mode, &[]),
        mode: lhs.mode,
        start: lhs.start,
        end: rhs.end,
    })
}

/// Conditional expression [C99 6.5.15]. The two result arms are unified with
/// the usual arithmetic rules.
pub(crate) fn conditional(p: &mut Parser<'_>) -> Option<ParsedExpr> {
    let cond = binary(p, 0)?;
    if !p.at(TokenKind::Question) {
        return Some(cond);
    }
    p.pop();

    if !is_scalar(p, cond.mode) {
        p.error_at(cond.start, cond.end, DiagnosticData::OperandTypeMismatch);
    }

    let mut then = expression(p)?;
    p.expect(TokenKind::Colon);
    let mut other = conditional(p)?;

    let ty = if then.mode == other.mode {
        then.mode
    } else if is_arithmetic(then.mode) && is_arithmetic(other.mode) {
        let common = arithmetic_common(then.mode, other.mode);
        if common == mode::FLOAT {
            cast(p, &mut other, common);
            cast(p, &mut then, common);
        }
        common
    } else {
        p.error_at(then.start, other.end, DiagnosticData::OperandTypeMismatch);
        then.mode
    };

    Some(ParsedExpr {
        node: p.tree.wrap(cond.node, OpCode::Ternary, ty, &[]),
        mode: ty,
        start: cond.start,
        end: other.end,
    })
}

/// Constant expression [C99 6.6]: a conditional expression evaluated at
/// parse time with checked integer arithmetic.
pub(crate) fn constant(p: &mut Parser<'_>) -> Option<(ParsedExpr, Item)> {
    let e = conditional(p)?;
    match evaluate(&p.tree, e.node) {
        Ok(value) => Some((e, value)),
        Err(code) => {
            p.error_at(e.start, e.end, code);
            None
        }
    }
}

/// Evaluate an already-parsed subtree as an integer constant.
pub(crate) fn evaluate(tree: &Tree, node: NodeId) -> Result<Item, DiagnosticData> {
    use DiagnosticData::{ConstantOverflow, DivisionByZero, NotAConstantExpression};

    let children = tree.children(node);
    let op = tree.op(node);
    match op {
        OpCode::Const => Ok(tree.payload_arg(node, 0)),
        OpCode::Neg => evaluate(tree, children[0])?
            .checked_neg()
            .ok_or(ConstantOverflow),
        OpCode::BitNot => Ok(!evaluate(tree, children[0])?),
        OpCode::LogNot => Ok((evaluate(tree, children[0])? == 0) as Item),
        OpCode::Cast => {
            if is_integral(tree.mode(node)) {
                evaluate(tree, children[0])
            } else {
                Err(NotAConstantExpression)
            }
        }
        OpCode::Ternary => {
            if evaluate(tree, children[0])? != 0 {
                evaluate(tree, children[1])
            } else {
                evaluate(tree, children[2])
            }
        }
        OpCode::Mul
        | OpCode::Div
        | OpCode::Rem
        | OpCode::Add
        | OpCode::Sub
        | OpCode::Shl
        | OpCode::Shr
        | OpCode::Lt
        | OpCode::Gt
        | OpCode::LtEq
        | OpCode::GtEq
        | OpCode::EqEq
        | OpCode::NotEq
        | OpCode::BitAnd
        | OpCode::BitXor
        | OpCode::BitOr
        | OpCode::LogAnd
        | OpCode::LogOr => {
            let lhs = evaluate(tree, children[0])?;
            let rhs = evaluate(tree, children[1])?;
            match op {
                OpCode::Mul => lhs.checked_mul(rhs).ok_or(ConstantOverflow),
                OpCode::Add => lhs.checked_add(rhs).ok_or(ConstantOverflow),
                OpCode::Sub => lhs.checked_sub(rhs).ok_or(ConstantOverflow),
                OpCode::Div => {
                    if rhs == 0 {
                        Err(DivisionByZero)
                    } else {
                        lhs.checked_div(rhs).ok_or(ConstantOverflow)
                    }
                }
                OpCode::Rem => {
                    if rhs == 0 {
                        Err(DivisionByZero)
                    } else {
                        lhs.checked_rem(rhs).ok_or(ConstantOverflow)
                    }
                }
                OpCode::Shl => u32::try_from(rhs)
                    .ok()
                    .and_then(|s| lhs.checked_shl(s))
                    .ok_or(ConstantOverflow),
                OpCode::Shr => u32::try_from(rhs)
                    .ok()
                    .and_then(|s| lhs.checked_shr(s))
                    .ok_or(ConstantOverflow),
                OpCode::Lt => Ok((lhs < rhs) as Item),
                OpCode::Gt => Ok((lhs > rhs) as Item),
                OpCode::LtEq => Ok((lhs <= rhs) as Item),
                OpCode::GtEq => Ok((lhs >= rhs) as Item),
                OpCode::EqEq => Ok((lhs == rhs) as Item),
                OpCode::NotEq => Ok((lhs != rhs) as Item),
                OpCode::BitAnd => Ok(lhs & rhs),
                OpCode::BitXor => Ok(lhs ^ rhs),
                OpCode::BitOr => Ok(lhs | rhs),
                OpCode::LogAnd => Ok((lhs != 0 && rhs != 0) as Item),
                OpCode::LogOr => Ok((lhs != 0 || rhs != 0) as Item),
                _ => Err(NotAConstantExpression),
            }
        }
        _ => Err(NotAConstantExpression),
    }
}

fn binary(p: &mut Parser<'_>, min_prec: u8) -> Option<ParsedExpr> {
    let mut lhs = unary(p)?;
    while let Some((prec, op)) = binary_op(p.peek()) {
        if prec < min_prec {
            break;
        }
        p.pop();
        let mut rhs = binary(p, prec + 1)?;
        let ty = binary_type(p, op, &mut lhs, &mut rhs);
        lhs = ParsedExpr {
            node: p.tree.wrap(lhs.node, op, ty, &[]),
            mode: ty,
            start: lhs.start,
            end: rhs.end,
        };
    }
    Some(lhs)
}

/// Type a binary operation, inserting the casts the usual arithmetic
/// conversions call for. The right operand is cast before the left one so
/// that the left operand's offset stays good for the final wrap.
fn binary_type(
    p: &mut Parser<'_>,
    op: OpCode,
    lhs: &mut ParsedExpr,
    rhs: &mut ParsedExpr,
) -> Mode {
    use OpCode::*;

    let arith = is_arithmetic(lhs.mode) && is_arithmetic(rhs.mode);
    let integral = is_integral(lhs.mode) && is_integral(rhs.mode);

    match op {
        Mul | Div | Add | Sub => {
            if !arith {
                p.error_at(lhs.start, rhs.end, DiagnosticData::OperandTypeMismatch);
                return mode::INT;
            }
            let common = arithmetic_common(lhs.mode, rhs.mode);
            if common == mode::FLOAT {
                cast(p, rhs, common);
                cast(p, lhs, common);
            }
            common
        }
        Rem | Shl | Shr | BitAnd | BitXor | BitOr => {
            if !integral {
                p.error_at(lhs.start, rhs.end, DiagnosticData::OperandTypeMismatch);
                return mode::INT;
            }
            arithmetic_common(lhs.mode, rhs.mode)
        }
        Lt | Gt | LtEq | GtEq => {
            if !arith {
                p.error_at(lhs.start, rhs.end, DiagnosticData::OperandTypeMismatch);
                return mode::INT;
            }
            let common = arithmetic_common(lhs.mode, rhs.mode);
            if common == mode::FLOAT {
                cast(p, rhs, common);
                cast(p, lhs, common);
            }
            mode::INT
        }
        EqEq | NotEq => {
            if arith {
                let common = arithmetic_common(lhs.mode, rhs.mode);
                if common == mode::FLOAT {
                    cast(p, rhs, common);
                    cast(p, lhs, common);
                }
            } else if lhs.mode != rhs.mode || !p.modes.is_pointer(lhs.mode) {
                p.error_at(lhs.start, rhs.end, DiagnosticData::OperandTypeMismatch);
            }
            mode::INT
        }
        LogAnd | LogOr => {
            if !is_scalar(p, lhs.mode) || !is_scalar(p, rhs.mode) {
                p.error_at(lhs.start, rhs.end, DiagnosticData::OperandTypeMismatch);
            }
            mode::INT
        }
        _ => mode::INT,
    }
}

fn unary(p: &mut Parser<'_>) -> Option<ParsedExpr> {
    if p.recursion_limit.check_and_increment() {
        p.limit_error();
        return None;
    }
    let result = unary_inner(p);
    p.recursion_limit.decrement();
    result
}

fn unary_inner(p: &mut Parser<'_>) -> Option<ParsedExpr> {
    let start = p.current().index();
    let op = match p.peek() {
        TokenKind::PlusPlus => Some(OpCode::PreInc),
        TokenKind::MinusMinus => Some(OpCode::PreDec),
        _ => None,
    };
    if let Some(op) = op {
        p.pop();
        let e = unary(p)?;
        if !is_lvalue(p.tree.op(e.node)) {
            p.error_at(e.start, e.end, DiagnosticData::AssignmentToNonLvalue);
        } else if !is_arithmetic(e.mode) {
            p.error_at(e.start, e.end, DiagnosticData::OperandTypeMismatch);
        }
        return Some(ParsedExpr {
            node: p.tree.wrap(e.node, op, e.mode, &[]),
            mode: e.mode,
            start,
            end: e.end,
        });
    }

    match p.peek() {
        TokenKind::Plus => {
            p.pop();
            let e = unary(p)?;
            if !is_arithmetic(e.mode) {
                p.error_at(e.start, e.end, DiagnosticData::OperandTypeMismatch);
            }
            Some(ParsedExpr { start, ..e })
        }
        TokenKind::Minus => {
            p.pop();
            let e = unary(p)?;
            let ty = if is_arithmetic(e.mode) {
                promote(e.mode)
            } else {
                p.error_at(e.start, e.end, DiagnosticData::OperandTypeMismatch);
                mode::INT
            };
            Some(ParsedExpr {
                node: p.tree.wrap(e.node, OpCode::Neg, ty, &[]),
                mode: ty,
                start,
                end: e.end,
            })
        }
        TokenKind::Bang => {
            p.pop();
            let e = unary(p)?;
            if !is_scalar(p, e.mode) {
                p.error_at(e.start, e.end, DiagnosticData::OperandTypeMismatch);
            }
            Some(ParsedExpr {
                node: p.tree.wrap(e.node, OpCode::LogNot, mode::INT, &[]),
                mode: mode::INT,
                start,
                end: e.end,
            })
        }
        TokenKind::Tilde => {
            p.pop();
            let e = unary(p)?;
            let ty = if is_integral(e.mode) {
                promote(e.mode)
            } else {
                p.error_at(e.start, e.end, DiagnosticData::OperandTypeMismatch);
                mode::INT
            };
            Some(ParsedExpr {
                node: p.tree.wrap(e.node, OpCode::BitNot, ty, &[]),
                mode: ty,
                start,
                end: e.end,
            })
        }
        TokenKind::Amp => {
            p.pop();
            let e = unary(p)?;
            if !is_lvalue(p.tree.op(e.node)) {
                p.error_at(e.start, e.end, DiagnosticData::AssignmentToNonLvalue);
            }
            let ty = p.modes.pointer(e.mode);
            Some(ParsedExpr {
                node: p.tree.wrap(e.node, OpCode::Address, ty, &[]),
                mode: ty,
                start,
                end: e.end,
            })
        }
        TokenKind::Star => {
            p.pop();
            let e = unary(p)?;
            let ty = if p.modes.is_pointer(e.mode) {
                p.modes.pointee(e.mode)
            } else {
                p.error_at(e.start, e.end, DiagnosticData::OperandTypeMismatch);
                mode::INT
            };
            Some(ParsedExpr {
                node: p.tree.wrap(e.node, OpCode::Deref, ty, &[]),
                mode: ty,
                start,
                end: e.end,
            })
        }
        _ => postfix(p),
    }
}

fn postfix(p: &mut Parser<'_>) -> Option<ParsedExpr> {
    let mut e = primary(p)?;
    loop {
        match p.peek() {
            TokenKind::LBracket => {
                p.pop();
                let index = expression(p)?;
                p.expect(TokenKind::RBracket);
                let element = if p.modes.is_array(e.mode) {
                    p.modes.element(e.mode)
                } else if p.modes.is_pointer(e.mode) {
                    p.modes.pointee(e.mode)
                } else {
                    p.error_at(e.start, e.end, DiagnosticData::SubscriptNotArray);
                    mode::INT
                };
                if !is_integral(index.mode) {
                    p.error_at(index.start, index.end, DiagnosticData::SubscriptNotInteger);
                }
                e = ParsedExpr {
                    node: p.tree.wrap(e.node, OpCode::Subscript, element, &[]),
                    mode: element,
                    start: e.start,
                    end: p.last_end(),
                };
            }
            TokenKind::LParen => {
                e = call(p, e)?;
            }
            TokenKind::Dot => {
                e = member(p, e, OpCode::Member)?;
            }
            TokenKind::Arrow => {
                e = member(p, e, OpCode::MemberPtr)?;
            }
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let op = if p.at(TokenKind::PlusPlus) {
                    OpCode::PostInc
                } else {
                    OpCode::PostDec
                };
                p.pop();
                if !is_lvalue(p.tree.op(e.node)) {
                    p.error_at(e.start, e.end, DiagnosticData::AssignmentToNonLvalue);
                } else if !is_arithmetic(e.mode) {
                    p.error_at(e.start, e.end, DiagnosticData::OperandTypeMismatch);
                }
                e = ParsedExpr {
                    node: p.tree.wrap(e.node, op, e.mode, &[]),
                    mode: e.mode,
                    start: e.start,
                    end: p.last_end(),
                };
            }
            _ => break,
        }
    }
    Some(e)
}

/// A call: checks arity and per-argument assignment compatibility against
/// the callee's function mode. Arguments are emitted in evaluation order.
fn call(p: &mut Parser<'_>, callee: ParsedExpr) -> Option<ParsedExpr> {
    let is_function = p.modes.is_function(callee.mode);
    if !is_function {
        p.error_at(callee.start, callee.end, DiagnosticData::NotAFunction);
    }
    p.pop();

    let mut argc: usize = 0;
    if !p.at(TokenKind::RParen) {
        loop {
            let mut arg = assignment(p)?;
            if is_function && argc < p.modes.arity(callee.mode) {
                let param = p.modes.param(callee.mode, argc);
                match assignability(param, arg.mode) {
                    Compat::Same => {}
                    Compat::Widen => cast(p, &mut arg, param),
                    Compat::No => {
                        p.error_at(arg.start, arg.end, DiagnosticData::IncompatibleAssignment)
                    }
                }
            }
            argc += 1;
            if !p.eat(TokenKind::Comma) {
                break;
            }
        }
    }
    p.expect(TokenKind::RParen);

    let ret = if is_function {
        let arity = p.modes.arity(callee.mode);
        if argc != arity {
            p.error_at(
                callee.start,
                p.last_end(),
                DiagnosticData::WrongArgumentCount {
                    expected: arity,
                    found: argc,
                },
            );
        }
        p.modes.return_mode(callee.mode)
    } else {
        mode::INT
    };

    Some(ParsedExpr {
        node: p.tree.wrap(callee.node, OpCode::Call, ret, &[argc as Item]),
        mode: ret,
        start: callee.start,
        end: p.last_end(),
    })
}

fn member(p: &mut Parser<'_>, base: ParsedExpr, op: OpCode) -> Option<ParsedExpr> {
    p.pop();
    if !p.at(TokenKind::Ident) {
        p.error(DiagnosticData::Expected {
            expected: "a field name",
        });
        return None;
    }
    let token = p.pop();
    let repr = p.intern(&token);

    let structure = if op == OpCode::MemberPtr {
        if p.modes.is_pointer(base.mode) && p.modes.is_struct(p.modes.pointee(base.mode)) {
            Some(p.modes.pointee(base.mode))
        } else {
            None
        }
    } else if p.modes.is_struct(base.mode) {
        Some(base.mode)
    } else {
        None
    };

    let ty = match structure {
        None => {
            p.error_at(base.start, token.end(), DiagnosticData::MemberOnNonStruct);
            mode::INT
        }
        Some(structure) => {
            let field = (0..p.modes.field_count(structure))
                .find(|&i| p.modes.field_name(structure, i) == repr);
            match field {
                Some(i) => p.modes.field_mode(structure, i),
                None => {
                    p.error_at(
                        token.index(),
                        token.end(),
                        DiagnosticData::NoSuchField {
                            name: token.data().to_string(),
                        },
                    );
                    mode::INT
                }
            }
        }
    };

    Some(ParsedExpr {
        node: p.tree.wrap(base.node, op, ty, &[repr.index() as Item]),
        mode: ty,
        start: base.start,
        end: token.end(),
    })
}

fn primary(p: &mut Parser<'_>) -> Option<ParsedExpr> {
    let start = p.current().index();
    match p.peek() {
        TokenKind::Ident => {
            let token = p.pop();
            let repr = p.intern(&token);
            let Some(id) = p.meaning_of(repr) else {
                p.error_at(
                    token.index(),
                    token.end(),
                    DiagnosticData::UndeclaredIdentifier {
                        name: token.data().to_string(),
                    },
                );
                return None;
            };
            let entry = *p.idents.entry(id);
            match entry.kind {
                crate::tables::IdentKind::TypeName | crate::tables::IdentKind::StructTag => {
                    p.error_at(
                        token.index(),
                        token.end(),
                        DiagnosticData::TypeNameInExpression {
                            name: token.data().to_string(),
                        },
                    );
                    None
                }
                _ => {
                    let node = p
                        .tree
                        .leaf(OpCode::Ident, entry.mode, &[id.index() as Item]);
                    Some(ParsedExpr {
                        node,
                        mode: entry.mode,
                        start,
                        end: token.end(),
                    })
                }
            }
        }
        TokenKind::IntLiteral => {
            let token = p.pop();
            let value = match token.int_value() {
                Some(value) => value,
                None => {
                    p.error_at(token.index(), token.end(), DiagnosticData::IntLiteralTooLarge);
                    0
                }
            };
            let node = p.tree.leaf(OpCode::Const, mode::INT, &[value]);
            Some(ParsedExpr {
                node,
                mode: mode::INT,
                start,
                end: token.end(),
            })
        }
        TokenKind::FloatLiteral => {
            let token = p.pop();
            let bits = token.float_value().to_bits() as Item;
            let node = p.tree.leaf(OpCode::ConstFloat, mode::FLOAT, &[bits]);
            Some(ParsedExpr {
                node,
                mode: mode::FLOAT,
                start,
                end: token.end(),
            })
        }
        TokenKind::CharLiteral => {
            let token = p.pop();
            let value = token.char_value().unwrap_or('\0') as Item;
            let node = p.tree.leaf(OpCode::Const, mode::CHAR, &[value]);
            Some(ParsedExpr {
                node,
                mode: mode::CHAR,
                start,
                end: token.end(),
            })
        }
        TokenKind::StringLiteral => {
            let token = p.pop();
            let text = token.string_value();
            let ty = p.modes.array(mode::CHAR);
            let node = string_node(p, &text, ty);
            Some(ParsedExpr {
                node,
                mode: ty,
                start,
                end: token.end(),
            })
        }
        TokenKind::LParen => {
            p.pop();
            let e = expression(p)?;
            p.expect(TokenKind::RParen);
            Some(ParsedExpr {
                start,
                end: p.last_end(),
                ..e
            })
        }
        _ => {
            p.error(DiagnosticData::ExpectedExpression);
            None
        }
    }
}

pub(crate) fn string_node(p: &mut Parser<'_>, text: &str, ty: Mode) -> NodeId {
    let node = p.tree.begin(OpCode::String, ty);
    let chars: Vec<char> = text.chars().collect();
    p.tree.arg(chars.len() as Item);
    for c in chars {
        p.tree.arg(c as Item);
    }
    p.tree.end();
    node
}

fn assign_op(kind: TokenKind) -> Option<OpCode> {
    let op = match kind {
        TokenKind::Assign => OpCode::Assign,
        TokenKind::StarAssign => OpCode::MulAssign,
        TokenKind::SlashAssign => OpCode::DivAssign,
        TokenKind::PercentAssign => OpCode::RemAssign,
        TokenKind::PlusAssign => OpCode::AddAssign,
        TokenKind::MinusAssign => OpCode::SubAssign,
        TokenKind::ShlAssign => OpCode::ShlAssign,
        TokenKind::ShrAssign => OpCode::ShrAssign,
        TokenKind::AmpAssign => OpCode::AndAssign,
        TokenKind::CaretAssign => OpCode::XorAssign,
        TokenKind::PipeAssign => OpCode::OrAssign,
        _ => return None,
    };
    Some(op)
}

fn binary_op(kind: TokenKind) -> Option<(u8, OpCode)> {
    let entry = match kind {
        TokenKind::Star => (10, OpCode::Mul),
        TokenKind::Slash => (10, OpCode::Div),
        TokenKind::Percent => (10, OpCode::Rem),
        TokenKind::Plus => (9, OpCode::Add),
        TokenKind::Minus => (9, OpCode::Sub),
        TokenKind::Shl => (8, OpCode::Shl),
        TokenKind::Shr => (8, OpCode::Shr),
        TokenKind::Lt => (7, OpCode::Lt),
        TokenKind::Gt => (7, OpCode::Gt),
        TokenKind::LtEq => (7, OpCode::LtEq),
        TokenKind::GtEq => (7, OpCode::GtEq),
        TokenKind::EqEq => (6, OpCode::EqEq),
        TokenKind::NotEq => (6, OpCode::NotEq),
        TokenKind::Amp => (5, OpCode::BitAnd),
        TokenKind::Caret => (4, OpCode::BitXor),
        TokenKind::Pipe => (3, OpCode::BitOr),
        TokenKind::AmpAmp => (2, OpCode::LogAnd),
        TokenKind::PipePipe => (1, OpCode::LogOr),
        _ => return None,
    };
    Some(entry)
}

fn is_lvalue(op: OpCode) -> bool {
    matches!(
        op,
        OpCode::Ident | OpCode::Subscript | OpCode::Member | OpCode::MemberPtr | OpCode::Deref
    )
}

pub(crate) fn is_integral(mode: Mode) -> bool {
    matches!(mode, mode::INT | mode::CHAR | mode::LONG | mode::BOOL)
}

pub(crate) fn is_arithmetic(mode: Mode) -> bool {
    is_integral(mode) || mode == mode::FLOAT
}

pub(crate) fn is_scalar(p: &Parser<'_>, mode: Mode) -> bool {
    is_arithmetic(mode) || p.modes.is_pointer(mode)
}

/// Integer promotion: `char` and `bool` compute as `int`.
fn promote(mode: Mode) -> Mode {
    match mode {
        mode::CHAR | mode::BOOL => mode::INT,
        other => other,
    }
}

fn arithmetic_common(lhs: Mode, rhs: Mode) -> Mode {
    if lhs == mode::FLOAT || rhs == mode::FLOAT {
        mode::FLOAT
    } else if lhs == mode::LONG || rhs == mode::LONG {
        mode::LONG
    } else {
        mode::INT
    }
}

#[derive(PartialEq, Eq)]
pub(crate) enum Compat {
    Same,
    Widen,
    No,
}

/// Assignment compatibility. Modes are canonical, so pointer, array, struct
/// and function agreement is handle equality.
pub(crate) fn assignability(to: Mode, from: Mode) -> Compat {
    if to == from {
        Compat::Same
    } else if is_integral(to) && is_integral(from) {
        Compat::Same
    } else if to == mode::FLOAT && is_integral(from) {
        Compat::Widen
    } else if is_integral(to) && from == mode::FLOAT {
        Compat::Widen
    } else {
        Compat::No
    }
}

/// Wrap an expression in an explicit conversion. The wrapped record may have
/// later siblings in the arena already, so only that one record is enclosed.
pub(crate) fn cast(p: &mut Parser<'_>, e: &mut ParsedExpr, target: Mode) {
    if e.mode != target {
        e.node = p.tree.wrap_record(e.node, OpCode::Cast, target, &[]);
        e.mode = target;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Parser;

    fn parse_expr(input: &str) -> (Parser<'_>, ParsedExpr) {
        let mut p = Parser::new(input);
        let e = expression(&mut p).expect("expression should parse");
        (p, e)
    }

    #[test]
    fn precedence_nests_multiplication_tighter() {
        let (p, e) = parse_expr("1 + 2 * 3");
        assert_eq!(p.tree.op(e.node), OpCode::Add);
        let children = p.tree.children(e.node);
        assert_eq!(p.tree.op(children[0]), OpCode::Const);
        assert_eq!(p.tree.op(children[1]), OpCode::Mul);
    }

    #[test]
    fn comparison_produces_int() {
        let (_, e) = parse_expr("1 < 2");
        assert_eq!(e.mode, mode::INT);
    }

    #[test]
    fn float_operand_widens_the_other_side() {
        let (p, e) = parse_expr("1 + 2.5");
        assert!(p.errors.is_empty());
        assert_eq!(e.mode, mode::FLOAT);
        let children = p.tree.children(e.node);
        assert_eq!(p.tree.op(children[0]), OpCode::Cast);
        assert_eq!(p.tree.mode(children[0]), mode::FLOAT);
        assert_eq!(p.tree.op(children[1]), OpCode::ConstFloat);
    }

    #[test]
    fn assignment_to_literal_is_rejected() {
        let mut p = Parser::new("3 = 4");
        let _ = expression(&mut p);
        assert_eq!(p.errors.len(), 1);
        assert_eq!(
            p.errors[0].code(),
            &DiagnosticData::AssignmentToNonLvalue
        );
    }

    #[test]
    fn undeclared_identifier_is_invalid() {
        let mut p = Parser::new("x + 1");
        assert!(expression(&mut p).is_none());
        assert_eq!(
            p.errors[0].code(),
            &DiagnosticData::UndeclaredIdentifier { name: "x".into() }
        );
    }

    #[test]
    fn constants_fold() {
        let mut p = Parser::new("2 * 3 + 4");
        let (_, value) = constant(&mut p).expect("constant should fold");
        assert_eq!(value, 10);

        let mut p = Parser::new("1 ? 5 : 6");
        let (_, value) = constant(&mut p).expect("constant should fold");
        assert_eq!(value, 5);
    }

    #[test]
    fn division_by_zero_in_constant() {
        let mut p = Parser::new("1 / 0");
        assert!(constant(&mut p).is_none());
        assert_eq!(p.errors[0].code(), &DiagnosticData::DivisionByZero);
    }

    #[test]
    fn constant_overflow_is_reported() {
        let mut p = Parser::new("9223372036854775807 + 1");
        assert!(constant(&mut p).is_none());
        assert_eq!(p.errors[0].code(), &DiagnosticData::ConstantOverflow);
    }

    #[test]
    fn recursion_limit_cuts_deep_nesting() {
        let source = format!("{}1{}", "(".repeat(40), ")".repeat(40));
        let mut p = Parser::new(&source).recursion_limit(10);
        let _ = expression(&mut p);
        assert_eq!(p.errors.len(), 1);
        assert!(p.errors[0].is_limit());
    }

    #[test]
    fn comma_takes_the_right_operand_type() {
        let (_, e) = parse_expr("1, 2.5");
        assert_eq!(e.mode, mode::FLOAT);
    }
}
