use crate::error::DiagnosticData;
use crate::lexer::TokenKind;
use crate::parser::grammar::expression;
use crate::parser::grammar::statement;
use crate::parser::grammar::statement::{BlockKind, StatementContext};
use crate::parser::{Parser, DECLARATION_RECOVERY, LIST_RECOVERY};
use crate::tables::{mode, IdentId, IdentKind, Item, Mode, OpCode, ReprId};

/// Where a declaration appears.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Position {
    File,
    Block,
}

/// Where a declarator appears; struct fields must carry explicit array
/// bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DeclaratorPosition {
    Plain,
    StructField,
}

/// One parsed declarator: the declared name, the accumulated mode, and the
/// array bounds that the mode itself does not carry.
struct Declarator {
    repr: ReprId,
    name: String,
    name_start: usize,
    name_end: usize,
    mode: Mode,
    /// Declared array bounds, outermost dimension first; `-1` for an empty
    /// outermost bound awaiting an initializer.
    dims: Vec<Item>,
    empty_bounds: bool,
    params: Option<Vec<Param>>,
}

struct Param {
    mode: Mode,
    repr: Option<ReprId>,
    start: usize,
    end: usize,
}

/// The whole input: external declarations until end of file.
pub(crate) fn translation_unit(p: &mut Parser<'_>) {
    while !p.at(TokenKind::Eof) {
        if at_declaration_start(p) {
            declaration(p, Position::File);
        } else {
            p.error(DiagnosticData::ExpectedDeclarationSpecifier);
            p.skip_until(DECLARATION_RECOVERY);
            if !p.eat(TokenKind::Semicolon) {
                p.eat(TokenKind::RBrace);
            }
        }
    }
}

/// Whether the current token can begin a declaration. An identifier does
/// only when it currently means a type name; this is the one
/// context-sensitive lookup in the grammar.
pub(crate) fn at_declaration_start(p: &Parser<'_>) -> bool {
    match p.peek() {
        TokenKind::Void
        | TokenKind::Char
        | TokenKind::Int
        | TokenKind::Long
        | TokenKind::Float
        | TokenKind::Bool
        | TokenKind::Struct
        | TokenKind::Typedef => true,
        TokenKind::Ident => current_type_name(p).is_some(),
        _ => false,
    }
}

fn current_type_name(p: &Parser<'_>) -> Option<Mode> {
    let repr = p.reprs.lookup(p.current().data())?;
    let id = p.meaning_of(repr)?;
    let entry = p.idents.entry(id);
    (entry.kind == IdentKind::TypeName).then_some(entry.mode)
}

/// Declaration [C99 6.7]: declaration-specifiers, a declarator list with
/// optional initializers, and `;`. A function declarator followed by `{` at
/// file scope is a function definition instead.
pub(crate) fn declaration(p: &mut Parser<'_>, position: Position) {
    if p.eat(TokenKind::Typedef) {
        type_definition(p);
        return;
    }
    let Some(base) = declaration_specifiers(p) else {
        p.skip_until(DECLARATION_RECOVERY);
        p.eat(TokenKind::Semicolon);
        return;
    };
    if p.eat(TokenKind::Semicolon) {
        // a struct definition or tag with nothing declared
        return;
    }

    let mut first = true;
    loop {
        let Some(decl) = declarator(p, base, DeclaratorPosition::Plain) else {
            p.skip_until(DECLARATION_RECOVERY);
            p.eat(TokenKind::Semicolon);
            return;
        };
        if p.modes.is_function(decl.mode) {
            if first && position == Position::File && p.at(TokenKind::LBrace) {
                function_definition(p, decl);
                return;
            }
            function_declaration(p, decl, position);
        } else {
            variable_declaration(p, decl);
        }
        first = false;
        if !p.eat(TokenKind::Comma) {
            break;
        }
    }
    p.expect(TokenKind::Semicolon);
}

/// Declaration specifiers: a primitive keyword, a struct definition or tag,
/// or a typedef name.
fn declaration_specifiers(p: &mut Parser<'_>) -> Option<Mode> {
    match p.peek() {
        TokenKind::Void => consumed(p, mode::VOID),
        TokenKind::Char => consumed(p, mode::CHAR),
        TokenKind::Int => consumed(p, mode::INT),
        TokenKind::Long => consumed(p, mode::LONG),
        TokenKind::Float => consumed(p, mode::FLOAT),
        TokenKind::Bool => consumed(p, mode::BOOL),
        TokenKind::Struct => struct_specifier(p),
        TokenKind::Ident => match current_type_name(p) {
            Some(named) => consumed(p, named),
            None => {
                p.error(DiagnosticData::ExpectedDeclarationSpecifier);
                None
            }
        },
        _ => {
            p.error(DiagnosticData::ExpectedDeclarationSpecifier);
            None
        }
    }
}

fn consumed(p: &mut Parser<'_>, mode: Mode) -> Option<Mode> {
    p.pop();
    Some(mode)
}

/// Struct specifier: `struct tag? { fields }` defines a struct mode (and
/// installs the tag); `struct tag` names a previously defined one.
fn struct_specifier(p: &mut Parser<'_>) -> Option<Mode> {
    p.pop();
    let tag = if p.at(TokenKind::Ident) {
        Some(p.pop())
    } else {
        None
    };

    if !p.eat(TokenKind::LBrace) {
        let Some(tag) = tag else {
            p.error(DiagnosticData::ExpectedDeclarationSpecifier);
            return None;
        };
        let repr = p.intern(&tag);
        return match p.meaning_of(repr) {
            Some(id) if p.idents.entry(id).kind == IdentKind::StructTag => {
                Some(p.idents.entry(id).mode)
            }
            _ => {
                p.error_at(tag.index(), tag.end(), DiagnosticData::IncompleteType);
                None
            }
        };
    }

    let mut fields: Vec<(Mode, ReprId)> = Vec::new();
    while !p.at(TokenKind::RBrace) && !p.at(TokenKind::Eof) {
        let Some(base) = declaration_specifiers(p) else {
            p.skip_until(DECLARATION_RECOVERY);
            p.eat(TokenKind::Semicolon);
            continue;
        };
        loop {
            let Some(field) = declarator(p, base, DeclaratorPosition::StructField) else {
                p.skip_until(DECLARATION_RECOVERY);
                break;
            };
            if fields.iter().any(|&(_, repr)| repr == field.repr) {
                p.error_at(
                    field.name_start,
                    field.name_end,
                    DiagnosticData::DuplicateStructField { name: field.name },
                );
            } else {
                fields.push((field.mode, field.repr));
            }
            if !p.eat(TokenKind::Comma) {
                break;
            }
        }
        p.expect(TokenKind::Semicolon);
    }
    p.expect(TokenKind::RBrace);

    let structure = p.modes.structure(&fields);
    if let Some(tag) = tag {
        let repr = p.intern(&tag);
        if p
            .idents
            .install(&mut p.reprs, repr, IdentKind::StructTag, structure)
            .is_err()
        {
            p.error_at(
                tag.index(),
                tag.end(),
                DiagnosticData::Redeclaration {
                    name: tag.data().to_string(),
                },
            );
        }
    }
    Some(structure)
}

/// Declarator [C99 6.7.5], restricted to the pointer/array/function shapes
/// of the language: `*`s, a name, then either one parameter list or a run of
/// array brackets. Modifiers accumulate modes outside-in, so the innermost
/// written modifier becomes the outermost wrapper around the base.
fn declarator(
    p: &mut Parser<'_>,
    base: Mode,
    position: DeclaratorPosition,
) -> Option<Declarator> {
    let mut mode = base;
    while p.eat(TokenKind::Star) {
        mode = p.modes.pointer(mode);
    }

    if !p.at(TokenKind::Ident) {
        p.error(DiagnosticData::Expected {
            expected: "an identifier",
        });
        return None;
    }
    let token = p.pop();
    let repr = p.intern(&token);

    let mut dims: Vec<Item> = Vec::new();
    let mut empty_bounds = false;
    let mut params = None;

    if p.at(TokenKind::LParen) {
        let list = parameter_list(p)?;
        let modes: Vec<Mode> = list.iter().map(|param| param.mode).collect();
        mode = p.modes.function(mode, &modes);
        params = Some(list);
    } else {
        while p.eat(TokenKind::LBracket) {
            if p.eat(TokenKind::RBracket) {
                if !dims.is_empty() || position == DeclaratorPosition::StructField {
                    p.error_at(
                        token.index(),
                        p.last_end(),
                        DiagnosticData::MissingArrayBound,
                    );
                    dims.push(1);
                } else {
                    empty_bounds = true;
                    dims.push(-1);
                }
            } else {
                dims.push(array_bound(p));
                p.expect(TokenKind::RBracket);
            }
        }
        for _ in &dims {
            mode = p.modes.array(mode);
        }
    }

    Some(Declarator {
        repr,
        name: token.data().to_string(),
        name_start: token.index(),
        name_end: token.end(),
        mode,
        dims,
        empty_bounds,
        params,
    })
}

/// Parse one constant array bound. The bound expression is evaluated at
/// parse time and its subtree discarded from the arena; only the value is
/// kept, in the declaration's payload.
fn array_bound(p: &mut Parser<'_>) -> Item {
    let checkpoint = p.tree.checkpoint();
    let bound = match expression::conditional(p) {
        Some(e) => match expression::evaluate(&p.tree, e.node) {
            Ok(value) if value > 0 => Some(value),
            Ok(_) => {
                p.error_at(e.start, e.end, DiagnosticData::ArrayBoundNotPositive);
                None
            }
            Err(
                code @ (DiagnosticData::ConstantOverflow | DiagnosticData::DivisionByZero),
            ) => {
                p.error_at(e.start, e.end, code);
                None
            }
            Err(_) => {
                p.error_at(e.start, e.end, DiagnosticData::ArrayBoundNotConstant);
                None
            }
        },
        None => None,
    };
    p.tree.truncate(checkpoint);
    bound.unwrap_or(1)
}

/// Parameter list, including the empty `()` and `(void)` spellings.
/// A parameter may itself take a parameter list, making it a function
/// passed as a parameter.
fn parameter_list(p: &mut Parser<'_>) -> Option<Vec<Param>> {
    p.pop();
    if p.eat(TokenKind::RParen) {
        return Some(Vec::new());
    }
    if p.at(TokenKind::Void) && p.peek2() == TokenKind::RParen {
        p.pop();
        p.pop();
        return Some(Vec::new());
    }

    let mut params = Vec::new();
    loop {
        match parameter(p) {
            Some(param) => params.push(param),
            None => p.skip_until(LIST_RECOVERY),
        }
        if !p.eat(TokenKind::Comma) {
            break;
        }
    }
    p.expect(TokenKind::RParen);
    Some(params)
}

fn parameter(p: &mut Parser<'_>) -> Option<Param> {
    let start = p.current().index();
    let base = declaration_specifiers(p)?;
    let mut mode = base;
    while p.eat(TokenKind::Star) {
        mode = p.modes.pointer(mode);
    }

    let name = if p.at(TokenKind::Ident) {
        Some(p.pop())
    } else {
        None
    };

    if p.at(TokenKind::LParen) {
        let list = parameter_list(p)?;
        let modes: Vec<Mode> = list.iter().map(|param| param.mode).collect();
        mode = p.modes.function(mode, &modes);
    } else {
        while p.eat(TokenKind::LBracket) {
            if !p.eat(TokenKind::RBracket) {
                array_bound(p);
                p.expect(TokenKind::RBracket);
            }
            mode = p.modes.array(mode);
        }
    }

    Some(Param {
        mode,
        repr: name.map(|token| p.intern(&token)),
        start: name.map_or(start, |token| token.index()),
        end: name.map_or(start, |token| token.end()),
    })
}

/// `typedef` declaration: installs a type name. The definition produces a
/// tree record so the back-end sees declarations in source order.
fn type_definition(p: &mut Parser<'_>) {
    let Some(base) = declaration_specifiers(p) else {
        p.skip_until(DECLARATION_RECOVERY);
        p.eat(TokenKind::Semicolon);
        return;
    };
    let Some(decl) = declarator(p, base, DeclaratorPosition::Plain) else {
        p.skip_until(DECLARATION_RECOVERY);
        p.eat(TokenKind::Semicolon);
        return;
    };
    if decl.empty_bounds {
        p.error_at(
            decl.name_start,
            decl.name_end,
            DiagnosticData::MissingArrayBound,
        );
    }
    match p
        .idents
        .install(&mut p.reprs, decl.repr, IdentKind::TypeName, decl.mode)
    {
        Ok(id) => {
            p.tree
                .leaf(OpCode::TypeDecl, decl.mode, &[id.index() as Item]);
        }
        Err(_) => {
            p.error_at(
                decl.name_start,
                decl.name_end,
                DiagnosticData::Redeclaration { name: decl.name },
            );
        }
    }
    p.expect(TokenKind::Semicolon);
}

/// Install a function identifier, assigning it a function number on first
/// sight. Redeclaring with the same mode is allowed; anything else is
/// diagnosed.
fn install_function(p: &mut Parser<'_>, decl: &Declarator) -> Option<(IdentId, usize)> {
    match p
        .idents
        .install(&mut p.reprs, decl.repr, IdentKind::Function, decl.mode)
    {
        Ok(id) => {
            let number = p.functions.len();
            p.functions.push(-1);
            p.idents.set_displ(id, number as Item);
            Some((id, number))
        }
        Err(existing) => {
            let entry = *p.idents.entry(existing);
            if entry.kind == IdentKind::Function && entry.mode == decl.mode {
                Some((existing, entry.displ as usize))
            } else if entry.kind == IdentKind::Function {
                p.error_at(
                    decl.name_start,
                    decl.name_end,
                    DiagnosticData::ConflictingDeclaration {
                        name: decl.name.clone(),
                    },
                );
                None
            } else {
                p.error_at(
                    decl.name_start,
                    decl.name_end,
                    DiagnosticData::Redeclaration {
                        name: decl.name.clone(),
                    },
                );
                None
            }
        }
    }
}

fn function_declaration(p: &mut Parser<'_>, decl: Declarator, position: Position) {
    if position == Position::Block {
        p.error_at(decl.name_start, decl.name_end, DiagnosticData::NestedFunction);
        return;
    }
    install_function(p, &decl);
}

/// Function definition [C99 6.9.1]: installs the function, opens the
/// parameter scope, and parses the body as a function-body block in that
/// same scope.
fn function_definition(p: &mut Parser<'_>, decl: Declarator) {
    let function = install_function(p, &decl);
    if let Some((_, number)) = function {
        if p.functions[number] != -1 {
            p.error_at(
                decl.name_start,
                decl.name_end,
                DiagnosticData::Redeclaration {
                    name: decl.name.clone(),
                },
            );
        }
    }

    let return_mode = p.modes.return_mode(decl.mode);
    if decl.name == "main" {
        if return_mode == mode::INT && p.modes.arity(decl.mode) == 0 {
            p.wasmain = true;
        } else {
            p.error_at(
                decl.name_start,
                decl.name_end,
                DiagnosticData::WrongMainSignature,
            );
        }
    }

    let node = p.tree.begin(OpCode::FuncDef, mode::VOID);
    p.tree
        .arg(function.map_or(-1, |(id, _)| id.index() as Item));
    p.tree.arg(0);
    if let Some((_, number)) = function {
        p.functions[number] = node.index() as Item;
    }

    p.idents.scope_enter();
    p.idents.enter_frame();
    p.was_return = false;
    p.labels.clear();

    for param in decl.params.unwrap_or_default() {
        let Some(repr) = param.repr else {
            p.error_at(
                param.start,
                param.end,
                DiagnosticData::Expected {
                    expected: "a parameter name",
                },
            );
            continue;
        };
        let kind = if p.modes.is_function(param.mode) {
            IdentKind::FunctionParameter
        } else {
            IdentKind::Parameter
        };
        match p.idents.install(&mut p.reprs, repr, kind, param.mode) {
            Ok(id) => {
                let size = p.modes.size_of(param.mode);
                let displ = p.idents.alloc(size);
                p.idents.set_displ(id, displ);
            }
            Err(_) => {
                let name = p.reprs.text(repr).to_string();
                p.error_at(param.start, param.end, DiagnosticData::Redeclaration { name });
            }
        }
    }

    statement::compound(
        p,
        StatementContext::function(return_mode),
        BlockKind::FunctionBody,
    );

    let unresolved: Vec<(usize, String)> = p
        .labels
        .iter()
        .filter(|label| !label.defined)
        .map(|label| (label.first_use, p.reprs.text(label.repr).to_string()))
        .collect();
    for (at, name) in unresolved {
        let end = at + name.len();
        p.error_at(at, end, DiagnosticData::UndefinedLabel { name });
    }

    if !p.was_return && return_mode != mode::VOID {
        p.warning_at(decl.name_start, decl.name_end, DiagnosticData::MissingReturn);
    }

    p.tree.set_arg(node, 1, p.idents.frame_high());
    p.idents.leave_frame();
    p.idents.scope_leave(&mut p.reprs);
    p.tree.end();
}

/// Variable declaration with optional initializer.
fn variable_declaration(p: &mut Parser<'_>, decl: Declarator) {
    let mut element = decl.mode;
    while p.modes.is_array(element) {
        element = p.modes.element(element);
    }
    if element == mode::VOID {
        p.error_at(decl.name_start, decl.name_end, DiagnosticData::IncompleteType);
    }

    match p
        .idents
        .install(&mut p.reprs, decl.repr, IdentKind::Variable, decl.mode)
    {
        Err(_) => {
            p.error_at(
                decl.name_start,
                decl.name_end,
                DiagnosticData::Redeclaration {
                    name: decl.name.clone(),
                },
            );
            // Parse and discard the initializer so recovery continues at
            // the declaration's own punctuation.
            if p.eat(TokenKind::Assign) {
                let checkpoint = p.tree.checkpoint();
                initializer(p, decl.mode, &decl.dims, 0);
                p.tree.truncate(checkpoint);
            }
        }
        Ok(id) => {
            let size = p.modes.size_of(decl.mode);
            let displ = p.idents.alloc(size);
            p.idents.set_displ(id, displ);

            let node = p.tree.begin(OpCode::VarDecl, decl.mode);
            p.tree.arg(id.index() as Item);
            p.tree.arg(0);
            p.tree.arg(decl.dims.len() as Item);
            for &bound in &decl.dims {
                p.tree.arg(bound);
            }

            if p.eat(TokenKind::Assign) {
                p.tree.set_arg(node, 1, 1);
                if let Some(count) = initializer(p, decl.mode, &decl.dims, 0) {
                    if decl.dims.first() == Some(&-1) {
                        p.tree.set_arg(node, 3, count as Item);
                    }
                }
            } else if decl.empty_bounds {
                p.error_at(
                    decl.name_start,
                    decl.name_end,
                    DiagnosticData::MissingArrayBound,
                );
            }
            p.tree.end();
        }
    }
}

/// Initializer [C99 6.7.8]: an assignment expression for scalars, a braced
/// list whose shape matches the declared aggregate, or a string literal for
/// char arrays (the strings-only sub-mode, which relaxes element-count
/// checks). Returns the element count parsed at this level.
fn initializer(p: &mut Parser<'_>, target: Mode, dims: &[Item], depth: usize) -> Option<usize> {
    if p.modes.is_array(target) {
        let element = p.modes.element(target);
        if p.at(TokenKind::StringLiteral) && matches!(element, mode::CHAR | mode::INT) {
            let token = p.pop();
            let text = token.string_value();
            expression::string_node(p, &text, target);
            return Some(text.chars().count());
        }
        if !p.at(TokenKind::LBrace) {
            p.error(DiagnosticData::InitializerShapeMismatch);
            if expression::assignment(p).is_none() {
                p.skip_until(LIST_RECOVERY);
            }
            return None;
        }
        let start = p.current().index();
        p.pop();
        let node = p.tree.begin(OpCode::InitList, target);
        p.tree.arg(0);
        let mut count = 0;
        if !p.at(TokenKind::RBrace) {
            loop {
                initializer(p, element, dims, depth + 1);
                count += 1;
                if !p.eat(TokenKind::Comma) {
                    break;
                }
                if p.at(TokenKind::RBrace) {
                    break;
                }
            }
        }
        p.expect(TokenKind::RBrace);
        p.tree.set_arg(node, 0, count as Item);
        p.tree.end();

        if let Some(&declared) = dims.get(depth) {
            if declared >= 0 && count as Item > declared {
                p.error_at(
                    start,
                    p.last_end(),
                    DiagnosticData::InitializerTooLong {
                        expected: declared as usize,
                    },
                );
            }
        }
        Some(count)
    } else if p.modes.is_struct(target) {
        if !p.at(TokenKind::LBrace) {
            p.error(DiagnosticData::InitializerShapeMismatch);
            if expression::assignment(p).is_none() {
                p.skip_until(LIST_RECOVERY);
            }
            return None;
        }
        let start = p.current().index();
        p.pop();
        let node = p.tree.begin(OpCode::InitList, target);
        p.tree.arg(0);
        let field_count = p.modes.field_count(target);
        let mut count = 0;
        if !p.at(TokenKind::RBrace) {
            loop {
                if count < field_count {
                    let field = p.modes.field_mode(target, count);
                    initializer(p, field, &[], 0);
                } else {
                    // Excess entries: parse them to keep moving, diagnose
                    // once below.
                    if expression::assignment(p).is_none() {
                        p.skip_until(LIST_RECOVERY);
                    }
                }
                count += 1;
                if !p.eat(TokenKind::Comma) {
                    break;
                }
                if p.at(TokenKind::RBrace) {
                    break;
                }
            }
        }
        p.expect(TokenKind::RBrace);
        p.tree.set_arg(node, 0, count as Item);
        p.tree.end();

        if count > field_count {
            p.error_at(start, p.last_end(), DiagnosticData::InitializerShapeMismatch);
        }
        Some(count)
    } else {
        if p.at(TokenKind::LBrace) {
            p.error(DiagnosticData::InitializerShapeMismatch);
            p.skip_until(DECLARATION_RECOVERY);
            p.eat(TokenKind::RBrace);
            return None;
        }
        match expression::assignment(p) {
            Some(mut value) => {
                match expression::assignability(target, value.mode) {
                    expression::Compat::Same => {}
                    expression::Compat::Widen => expression::cast(p, &mut value, target),
                    expression::Compat::No => {
                        p.error_at(
                            value.start,
                            value.end,
                            DiagnosticData::IncompatibleInitializer,
                        );
                    }
                }
                Some(1)
            }
            None => {
                p.skip_until(LIST_RECOVERY);
                None
            }
        }
    }
}

#[cfg(test)]
mod test {
    use crate::error::DiagnosticData;
    use crate::tables::{mode, IdentKind};
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
    fn single_global_variable() {
        let syntax = Parser::new("int x;").parse();
        assert!(syntax.ok());
        assert_eq!(syntax.identifiers().len(), 1);
        let (_, entry) = syntax.identifiers().iter().next().unwrap();
        assert_eq!(entry.kind, IdentKind::Variable);
        assert_eq!(entry.mode, mode::INT);
        assert_eq!(entry.displ, 0);
        assert!(syntax.modes().is_empty());
    }

    #[test]
    fn globals_count_upward() {
        let syntax = Parser::new("int x; float y; char z;").parse();
        assert!(syntax.ok());
        let displs: Vec<i64> = syntax.identifiers().iter().map(|(_, e)| e.displ).collect();
        assert_eq!(displs, vec![0, 1, 2]);
    }

    #[test]
    fn redeclaration_in_same_scope() {
        let source = "int x; int x;";
        let syntax = Parser::new(source).parse();
        assert_eq!(syntax.errors().len(), 1);
        let error = &syntax.errors()[0];
        assert_eq!(
            error.code(),
            &DiagnosticData::Redeclaration { name: "x".into() }
        );
        assert_eq!(error.index(), 11);
        assert!(!syntax.ok());
    }

    #[test]
    fn pointer_and_array_declarators_wrap_outside_in() {
        let syntax = Parser::new("int *a[3];").parse();
        assert!(syntax.ok());
        let (_, entry) = syntax.identifiers().iter().next().unwrap();
        let modes = syntax.modes();
        assert!(modes.is_array(entry.mode));
        assert!(modes.is_pointer(modes.element(entry.mode)));
    }

    #[test]
    fn function_mode_is_canonical() {
        let syntax = Parser::new("int f(int a) { return a; } int g(int b) { return b; }").parse();
        assert!(syntax.ok());
        let f = syntax.identifiers().iter().find(|(_, e)| e.kind == IdentKind::Function);
        let modes_of: Vec<i64> = syntax
            .identifiers()
            .iter()
            .filter(|(_, e)| e.kind == IdentKind::Function)
            .map(|(_, e)| e.mode)
            .collect();
        assert_eq!(modes_of.len(), 2);
        assert_eq!(modes_of[0], modes_of[1]);
        assert!(f.is_some());
    }

    #[test]
    fn prototype_then_definition_share_one_function() {
        let syntax = Parser::new("int f(int a); int f(int a) { return a; }").parse();
        assert!(syntax.ok());
        assert_eq!(syntax.function_count(), 1);
        assert_ne!(syntax.functions()[0], -1);
    }

    #[test]
    fn conflicting_function_declarations() {
        assert_eq!(
            parse_errors("int f(int a); float f(int a);"),
            vec![DiagnosticData::ConflictingDeclaration { name: "f".into() }]
        );
    }

    #[test]
    fn array_initializer_too_long() {
        assert_eq!(
            parse_errors("int a[3] = {1, 2, 3, 4};"),
            vec![DiagnosticData::InitializerTooLong { expected: 3 }]
        );
    }

    #[test]
    fn empty_bound_is_patched_from_the_initializer() {
        let syntax = Parser::new("int a[] = {1, 2, 3};").parse();
        assert!(syntax.ok());
        let tree = syntax.tree();
        let decl = tree.roots()[0];
        // [ident, has_init, dims, bound]
        assert_eq!(tree.payload_arg(decl, 2), 1);
        assert_eq!(tree.payload_arg(decl, 3), 3);
    }

    #[test]
    fn string_initializer_relaxes_count_checks() {
        let syntax = Parser::new("char s[2] = \"abc\";").parse();
        assert!(syntax.ok());
    }

    #[test]
    fn array_bound_must_be_constant() {
        assert_eq!(
            parse_errors("int n; int a[n];"),
            vec![DiagnosticData::ArrayBoundNotConstant]
        );
    }

    #[test]
    fn struct_fields_and_duplicates() {
        assert_eq!(
            parse_errors("struct point { int x; int x; };"),
            vec![DiagnosticData::DuplicateStructField { name: "x".into() }]
        );
    }

    #[test]
    fn struct_tags_resolve() {
        let syntax = Parser::new("struct point { int x; int y; }; struct point p;").parse();
        assert!(syntax.ok());
        let p = syntax
            .identifiers()
            .iter()
            .find(|(_, e)| e.kind == IdentKind::Variable)
            .map(|(_, e)| *e)
            .unwrap();
        assert!(syntax.modes().is_struct(p.mode));
        assert_eq!(syntax.modes().field_count(p.mode), 2);
        // A struct variable takes one slot per field.
        assert_eq!(syntax.modes().size_of(p.mode), 2);
    }

    #[test]
    fn struct_array_fields_require_bounds() {
        assert_eq!(
            parse_errors("struct buf { int data[]; };"),
            vec![DiagnosticData::MissingArrayBound]
        );
    }

    #[test]
    fn undefined_struct_tag() {
        assert_eq!(
            parse_errors("struct ghost g;"),
            vec![DiagnosticData::IncompleteType]
        );
    }

    #[test]
    fn typedef_names_declare() {
        let syntax = Parser::new("typedef int word; word w;").parse();
        assert!(syntax.ok());
        let kinds: Vec<IdentKind> = syntax.identifiers().iter().map(|(_, e)| e.kind).collect();
        assert_eq!(kinds, vec![IdentKind::TypeName, IdentKind::Variable]);
        let (_, w) = syntax.identifiers().iter().nth(1).unwrap();
        assert_eq!(w.mode, mode::INT);
    }

    #[test]
    fn void_variable_is_incomplete() {
        assert_eq!(
            parse_errors("void v;"),
            vec![DiagnosticData::IncompleteType]
        );
    }

    #[test]
    fn local_function_declarations_are_rejected() {
        assert_eq!(
            parse_errors("void f() { int g(int x); }"),
            vec![DiagnosticData::NestedFunction]
        );
    }

    #[test]
    fn main_signature_is_checked() {
        let syntax = Parser::new("int main() { return 0; }").parse();
        assert!(syntax.ok());
        assert!(syntax.has_main());

        let syntax = Parser::new("int f() { return 0; }").parse();
        assert!(syntax.ok());
        assert!(!syntax.has_main());

        let syntax = Parser::new("void main() { }").parse();
        assert!(!syntax.ok());
        assert_eq!(
            syntax.errors()[0].code(),
            &DiagnosticData::WrongMainSignature
        );
    }

    #[test]
    fn parameters_precede_locals_in_the_frame() {
        let syntax = Parser::new("int f(int a, int b) { int c; return c; }").parse();
        assert!(syntax.ok());
        let displs: Vec<(IdentKind, i64)> = syntax
            .identifiers()
            .iter()
            .map(|(_, e)| (e.kind, e.displ))
            .collect();
        assert_eq!(
            displs,
            vec![
                (IdentKind::Function, 0),
                (IdentKind::Parameter, 0),
                (IdentKind::Parameter, 1),
                (IdentKind::Variable, 2),
            ]
        );
        assert_eq!(syntax.max_displacement(), 3);
    }

    #[test]
    fn function_as_parameter() {
        let syntax = Parser::new("int apply(int op(int), int x) { return op(x); }").parse();
        assert!(syntax.ok());
        let kinds: Vec<IdentKind> = syntax.identifiers().iter().map(|(_, e)| e.kind).collect();
        assert!(kinds.contains(&IdentKind::FunctionParameter));
    }

    #[test]
    fn missing_return_is_a_warning() {
        let syntax = Parser::new("int f() { }").parse();
        assert!(syntax.ok());
        assert_eq!(syntax.errors().len(), 1);
        assert_eq!(syntax.errors()[0].code(), &DiagnosticData::MissingReturn);
    }
}
