use mica_parser::tables::{mode, IdentKind, IdentTable, ModeTable, ReprTable};
use mica_parser::{DiagnosticData, Parser};
use pretty_assertions::assert_eq;

#[test]
fn interning_is_injective() {
    let mut reprs = ReprTable::new();
    let words = ["a", "b", "ab", "ba", "долго", "x1", "_x"];
    let handles: Vec<_> = words.iter().map(|w| reprs.intern(w)).collect();

    for (i, a) in words.iter().enumerate() {
        for (j, b) in words.iter().enumerate() {
            assert_eq!(a == b, handles[i] == handles[j], "{a:?} vs {b:?}");
        }
    }
    for (word, handle) in words.iter().zip(&handles) {
        assert_eq!(reprs.intern(word), *handle);
    }
}

#[test]
fn mode_records_return_the_same_handle_every_time() {
    let mut modes = ModeTable::new();
    let f1 = modes.function(mode::INT, &[mode::INT, mode::FLOAT]);
    let a1 = modes.array(mode::CHAR);
    let p1 = modes.pointer(mode::VOID);

    for _ in 0..3 {
        assert_eq!(modes.function(mode::INT, &[mode::INT, mode::FLOAT]), f1);
        assert_eq!(modes.array(mode::CHAR), a1);
        assert_eq!(modes.pointer(mode::VOID), p1);
    }
    assert_eq!(modes.len(), 3);
}

#[test]
fn scope_round_trip_is_a_noop() {
    let mut reprs = ReprTable::new();
    let mut idents = IdentTable::new();
    let x = reprs.intern("x");
    idents
        .install(&mut reprs, x, IdentKind::Variable, mode::INT)
        .unwrap();
    let before = reprs.get_at(x);
    let count = idents.len();

    idents.scope_enter();
    idents.scope_leave(&mut reprs);

    assert_eq!(reprs.get_at(x), before);
    assert_eq!(idents.len(), count);
}

#[test]
fn shadowing_restores_the_outer_meaning() {
    let mut reprs = ReprTable::new();
    let mut idents = IdentTable::new();
    let x = reprs.intern("x");
    let outer = idents
        .install(&mut reprs, x, IdentKind::Variable, mode::INT)
        .unwrap();

    idents.scope_enter();
    idents
        .install(&mut reprs, x, IdentKind::Variable, mode::FLOAT)
        .unwrap();
    idents.scope_leave(&mut reprs);

    assert_eq!(reprs.get_at(x), Some(outer.index() as i64));
}

#[test]
fn identical_inputs_produce_identical_layouts() {
    let source = "
        struct point { int x; int y; };
        int dist(struct point p) { return p.x * p.x + p.y * p.y; }
        int main() { struct point p; p.x = 3; p.y = 4; return dist(p); }
    ";
    let first = Parser::new(source).parse();
    let second = Parser::new(source).parse();

    assert!(first.ok());
    let tree_a: Vec<i64> = (0..first.tree().len()).map(|i| first.tree().get(i)).collect();
    let tree_b: Vec<i64> = (0..second.tree().len()).map(|i| second.tree().get(i)).collect();
    assert_eq!(tree_a, tree_b);
    assert_eq!(first.identifiers().len(), second.identifiers().len());
    assert_eq!(first.modes().len(), second.modes().len());
    assert_eq!(format!("{first:?}"), format!("{second:?}"));
}

#[test]
fn erroneous_inputs_diagnose_identically() {
    let source = "int x; int x; void f() { break; return 1 }";
    let first = Parser::new(source).parse();
    let second = Parser::new(source).parse();

    assert!(!first.ok());
    assert_eq!(first.errors(), second.errors());
}

#[test]
fn empty_translation_unit() {
    let syntax = Parser::new("").parse();
    assert!(syntax.ok());
    assert!(syntax.identifiers().is_empty());
    assert!(syntax.modes().is_empty());
    assert_eq!(syntax.function_count(), 0);
    assert!(!syntax.has_main());
    // Only the end-of-program marker.
    assert_eq!(syntax.tree().roots().len(), 1);
}

#[test]
fn deep_nesting_hits_the_recursion_limit_without_crashing() {
    let mut source = String::from("int main() { return ");
    source.push_str(&"(".repeat(5_000));
    source.push('1');
    source.push_str(&")".repeat(5_000));
    source.push_str("; }");

    let syntax = Parser::new(&source).recursion_limit(100).parse();
    assert!(!syntax.ok());
    assert!(syntax.errors().iter().any(|e| e.is_limit()));
    assert!(syntax.recursion_limit().high > 100);
}

#[test]
fn token_limit_aborts_the_parse() {
    let syntax = Parser::new("int a; int b; int c;").token_limit(4).parse();
    assert!(!syntax.ok());
    assert_eq!(
        syntax
            .errors()
            .iter()
            .filter(|e| e.code() == &DiagnosticData::TokenLimitReached)
            .count(),
        1
    );
    assert_eq!(syntax.token_limit().limit, 4);
}

#[test]
fn large_array_bound() {
    let syntax = Parser::new("int big[1000000];").parse();
    assert!(syntax.ok());
    let decl = syntax.tree().roots()[0];
    assert_eq!(syntax.tree().payload_arg(decl, 3), 1_000_000);
}

#[test]
fn colliding_identifiers_stay_separate() {
    // "ab" and "ba" land in the same interner bucket.
    let syntax = Parser::new("int ab; int ba; int main() { return ab + ba; }").parse();
    assert!(syntax.ok());
    assert_eq!(
        syntax
            .identifiers()
            .iter()
            .filter(|(_, e)| e.kind == IdentKind::Variable)
            .count(),
        2
    );
}
