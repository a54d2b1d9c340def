use expect_test::expect;
use mica_parser::tables::{mode, IdentKind};
use mica_parser::{DiagnosticData, Parser, Severity};
use pretty_assertions::assert_eq;
use unindent::unindent;

/// Parse `input` and compare the tree-and-errors dump against `expected`.
fn check(input: &str, expected: &str) {
    let syntax = Parser::new(input).parse();
    let actual = format!("{syntax:?}");
    assert_eq!(actual.trim_end(), unindent(expected).trim_end());
}

#[test]
fn declaration_without_initializer() {
    let syntax = Parser::new("int x;").parse();
    assert!(syntax.ok());
    assert!(syntax.modes().is_empty());
    assert_eq!(syntax.identifiers().len(), 1);

    let (_, entry) = syntax.identifiers().iter().next().unwrap();
    assert_eq!(syntax.representations().text(entry.repr), "x");
    assert_eq!(entry.kind, IdentKind::Variable);
    assert_eq!(entry.mode, mode::INT);
    assert_eq!(entry.displ, 0);

    check(
        "int x;",
        "
        VarDecl `x` int
        Eof
        ",
    );
}

#[test]
fn function_definition_populates_all_tables() {
    let source = "int f(int a){ return a+1; }";
    let syntax = Parser::new(source).parse();
    assert!(syntax.ok());
    assert!(!syntax.has_main());

    // One function mode (int, 1, int).
    assert_eq!(syntax.modes().len(), 1);
    let f = syntax
        .identifiers()
        .iter()
        .find(|(_, e)| e.kind == IdentKind::Function)
        .map(|(_, e)| *e)
        .unwrap();
    assert!(syntax.modes().is_function(f.mode));
    assert_eq!(syntax.modes().return_mode(f.mode), mode::INT);
    assert_eq!(syntax.modes().arity(f.mode), 1);
    assert_eq!(syntax.modes().param(f.mode, 0), mode::INT);

    // The parameter lives in the function scope, after the function itself.
    let a = syntax
        .identifiers()
        .iter()
        .find(|(_, e)| e.kind == IdentKind::Parameter)
        .map(|(_, e)| *e)
        .unwrap();
    assert_eq!(a.mode, mode::INT);
    assert_eq!(a.displ, 0);

    let tree = expect![[r#"
        FuncDef `f` frame=1
            Block
                Return
                    Add int
                        Ident `a` int
                        Const 1 int
        Eof
    "#]];
    tree.assert_eq(&format!("{syntax:?}"));
}

#[test]
fn main_sets_the_flag() {
    let syntax = Parser::new("int main(){ return 0; }").parse();
    assert!(syntax.ok());
    assert!(syntax.has_main());
    assert_eq!(syntax.function_count(), 1);

    check(
        "int main(){ return 0; }",
        "
        FuncDef `main` frame=0
            Block
                Return
                    Const 0 int
        Eof
        ",
    );
}

#[test]
fn redeclaration_is_reported_at_the_second_site() {
    let syntax = Parser::new("int x; int x;").parse();
    assert!(!syntax.ok());
    assert_eq!(syntax.errors().len(), 1);

    let error = &syntax.errors()[0];
    assert_eq!(error.severity(), Severity::Error);
    assert_eq!(
        error.code(),
        &DiagnosticData::Redeclaration { name: "x".into() }
    );
    assert_eq!(error.index(), 11);
    assert_eq!(error.data(), "x");
}

#[test]
fn initializer_too_long() {
    let syntax = Parser::new("int a[3] = {1,2,3,4};").parse();
    assert!(!syntax.ok());
    assert_eq!(
        syntax.errors()[0].code(),
        &DiagnosticData::InitializerTooLong { expected: 3 }
    );
}

#[test]
fn break_outside_loop_or_switch() {
    let syntax = Parser::new("void f(){ break; }").parse();
    assert!(!syntax.ok());
    assert_eq!(syntax.errors().len(), 1);
    assert_eq!(
        syntax.errors()[0].code(),
        &DiagnosticData::BreakOutsideLoopOrSwitch
    );
}

#[test]
fn nested_aggregates_round_trip_through_the_dump() {
    check(
        "int m[2][2] = {{1, 2}, {3, 4}};",
        "
        VarDecl `m` arr(arr(int)) bounds=[2, 2]
            InitList count=2
                InitList count=2
                    Const 1 int
                    Const 2 int
                InitList count=2
                    Const 3 int
                    Const 4 int
        Eof
        ",
    );
}

#[test]
fn statements_nest_in_source_order() {
    check(
        "
        int main() {
            int i;
            i = 0;
            while (i < 3) {
                i = i + 1;
            }
            return i;
        }
        ",
        "
        FuncDef `main` frame=1
            Block
                VarDecl `i` int
                Assign int
                    Ident `i` int
                    Const 0 int
                While
                    Lt int
                        Ident `i` int
                        Const 3 int
                    Block
                        Assign int
                            Ident `i` int
                            Add int
                                Ident `i` int
                                Const 1 int
                Return
                    Ident `i` int
        Eof
        ",
    );
}

#[test]
fn calls_check_arity() {
    let syntax = Parser::new("int f(int a){ return a; } int main(){ return f(1, 2); }").parse();
    assert!(!syntax.ok());
    assert_eq!(
        syntax.errors()[0].code(),
        &DiagnosticData::WrongArgumentCount {
            expected: 1,
            found: 2
        }
    );
}

#[test]
fn arguments_are_converted_like_assignments() {
    check(
        "float f(float x){ return x; } float g(){ return f(1); }",
        "
        FuncDef `f` frame=1
            Block
                Return
                    Ident `x` float
        FuncDef `g` frame=0
            Block
                Return
                    Call argc=1 float
                        Ident `f` fn(float; float)
                        Cast float
                            Const 1 int
        Eof
        ",
    );
}

#[test]
fn struct_members_type_check() {
    let source = "
        struct point { int x; int y; };
        int main() {
            struct point p;
            p.x = 1;
            return p.x + p.z;
        }
    ";
    let syntax = Parser::new(source).parse();
    assert!(!syntax.ok());
    assert_eq!(
        syntax.errors()[0].code(),
        &DiagnosticData::NoSuchField { name: "z".into() }
    );
}

#[test]
fn goto_labels_resolve_forward() {
    let syntax = Parser::new("void f(){ goto end; end: ; }").parse();
    assert!(syntax.ok());
    let label = syntax
        .identifiers()
        .iter()
        .find(|(_, e)| e.kind == IdentKind::Label)
        .map(|(_, e)| *e)
        .unwrap();
    // Defined labels point at their tree record.
    assert_ne!(label.displ, -1);
}

#[test]
fn error_recovery_reaches_later_declarations() {
    let source = "int x = ; int y; void f(){ return }";
    let syntax = Parser::new(source).parse();
    assert!(!syntax.ok());
    // Both errors are reported, and `y` still makes it into the table.
    assert_eq!(syntax.errors().len(), 2);
    assert!(syntax
        .identifiers()
        .iter()
        .any(|(_, e)| syntax.representations().text(e.repr) == "y"));
}
