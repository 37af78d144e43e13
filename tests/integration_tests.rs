use jackc::compile;
use jackc::error::CompileError;

fn compile_source(source: &str) -> Vec<String> {
    compile_unit(source).instructions
}

fn compile_unit(source: &str) -> jackc::codegen::CompiledClass {
    let lines: Vec<String> = source.lines().map(|l| l.to_string()).collect();
    compile(&lines).unwrap()
}

/// True when `needle` appears as a contiguous run inside `haystack`.
fn emits_in_order(haystack: &[String], needle: &[&str]) -> bool {
    haystack
        .windows(needle.len())
        .any(|window| window.iter().zip(needle).all(|(a, b)| a == b))
}

#[test]
fn one_method_class_end_to_end() {
    let code = compile_source("class Foo { method void bar() { return; } }");
    assert_eq!(
        code,
        vec![
            "function Foo.bar 0",
            "push argument 0",
            "pop pointer 0",
            "push constant 0",
            "return",
        ]
    );
}

#[test]
fn reports_the_class_name() {
    let unit = compile_unit("class Square { function void noop() { return; } }");
    assert_eq!(unit.class_name, "Square");
}

#[test]
fn one_function_header_per_subroutine_declaration() {
    let code = compile_source(
        "class Foo {
            constructor Foo new() { return this; }
            function void a() { return; }
            method void b() { return; }
        }",
    );
    let headers = code
        .iter()
        .filter(|line| line.starts_with("function "))
        .count();
    assert_eq!(headers, 3);
}

#[test]
fn constructor_allocates_one_word_per_field_name() {
    // five field names across three declarations; the static does not count
    let code = compile_source(
        "class Point {
            static int instances;
            field int x, y;
            field int z;
            field Point next, prev;
            constructor Point new() { return this; }
        }",
    );
    assert!(emits_in_order(
        &code,
        &[
            "function Point.new 0",
            "push constant 5",
            "call Memory.alloc 1",
            "pop pointer 0",
        ]
    ));
}

#[test]
fn constructor_header_ignores_its_local_count() {
    let code = compile_source(
        "class Point {
            field int x;
            constructor Point new() { var int a, b; let a = 1; let b = 2; return this; }
        }",
    );
    assert_eq!(code[0], "function Point.new 0");
}

#[test]
fn function_header_uses_the_real_local_count() {
    let code = compile_source(
        "class Foo { function void f() { var int a, b; var boolean c; return; } }",
    );
    assert_eq!(code[0], "function Foo.f 3");
}

#[test]
fn expressions_evaluate_left_to_right_without_precedence() {
    let code = compile_source(
        "class Foo { function void f() { var int x; let x = 2 + 3 * 4; return; } }",
    );
    // each operator lands right after its second term, so + runs before *
    // and the result is (2 + 3) * 4
    assert!(emits_in_order(
        &code,
        &[
            "push constant 2",
            "push constant 3",
            "add",
            "push constant 4",
            "call Math.multiply 2",
            "pop local 0",
        ]
    ));
}

#[test]
fn unary_operators_follow_their_operand() {
    let code = compile_source(
        "class Foo { function void f() { var int x; let x = -(1 + 2); let x = ~x; return; } }",
    );
    assert!(emits_in_order(
        &code,
        &["push constant 1", "push constant 2", "add", "neg"]
    ));
    assert!(emits_in_order(&code, &["push local 0", "not", "pop local 0"]));
}

#[test]
fn labels_stay_unique_across_subroutines() {
    let code = compile_source(
        "class Foo {
            method void a() { while (true) { if (true) { return; } } return; }
            method void b() { while (true) { if (true) { return; } } return; }
        }",
    );
    let labels: Vec<&String> = code.iter().filter(|l| l.starts_with("label ")).collect();
    for (i, a) in labels.iter().enumerate() {
        for b in labels.iter().skip(i + 1) {
            assert_ne!(a, b, "label emitted twice in one unit");
        }
    }
    // the second subroutine continues the file-scoped counters
    assert!(code.contains(&"label WHILE_EXP1".to_string()));
    assert!(code.contains(&"label IF_TRUE1".to_string()));
}

#[test]
fn if_without_else_shape() {
    let code = compile_source(
        "class Foo { function void f() { if (true) { do Output.go(); } return; } }",
    );
    assert!(emits_in_order(
        &code,
        &[
            "push constant 0",
            "not",
            "if-goto IF_TRUE0",
            "goto IF_FALSE0",
            "label IF_TRUE0",
            "call Output.go 0",
            "pop temp 0",
            "label IF_FALSE0",
        ]
    ));
}

#[test]
fn if_else_shape() {
    let code = compile_source(
        "class Foo { function void f() { if (false) { do A.b(); } else { do C.d(); } return; } }",
    );
    assert!(emits_in_order(
        &code,
        &[
            "push constant 0",
            "if-goto IF_TRUE0",
            "goto IF_FALSE0",
            "label IF_TRUE0",
            "call A.b 0",
            "pop temp 0",
            "goto IF_END0",
            "label IF_FALSE0",
            "call C.d 0",
            "pop temp 0",
            "label IF_END0",
        ]
    ));
}

#[test]
fn while_shape() {
    let code = compile_source(
        "class Foo { function void f() { var int i; while (i < 3) { let i = i + 1; } return; } }",
    );
    assert!(emits_in_order(
        &code,
        &[
            "label WHILE_EXP0",
            "push local 0",
            "push constant 3",
            "lt",
            "not",
            "if-goto WHILE_END0",
            "push local 0",
            "push constant 1",
            "add",
            "pop local 0",
            "goto WHILE_EXP0",
            "label WHILE_END0",
        ]
    ));
}

#[test]
fn parameter_shadows_field_of_the_same_name() {
    let shadowed = compile_source(
        "class Foo { field int x; method void a(int x) { let x = 1; return; } }",
    );
    // the hidden receiver holds argument 0, so the parameter lands at 1
    assert!(shadowed.contains(&"pop argument 1".to_string()));

    let unshadowed =
        compile_source("class Foo { field int x; method void a() { let x = 1; return; } }");
    assert!(unshadowed.contains(&"pop this 0".to_string()));
}

#[test]
fn bare_call_passes_the_current_receiver() {
    let code = compile_source(
        "class Foo {
            method void a() { do doSomething(1, 2); return; }
            method void doSomething(int a, int b) { return; }
        }",
    );
    assert!(emits_in_order(
        &code,
        &[
            "push pointer 0",
            "push constant 1",
            "push constant 2",
            "call Foo.doSomething 3",
            "pop temp 0",
        ]
    ));
}

#[test]
fn bare_call_in_expression_position_passes_the_receiver_too() {
    let code = compile_source(
        "class Foo {
            method int a() { var int x; let x = twice(4); return x; }
            method int twice(int n) { return n + n; }
        }",
    );
    assert!(emits_in_order(
        &code,
        &["push pointer 0", "push constant 4", "call Foo.twice 2"]
    ));
}

#[test]
fn known_variable_receiver_uses_its_declared_type() {
    let code =
        compile_source("class Foo { field Bar b; method void a() { do b.go(7); return; } }");
    assert!(emits_in_order(
        &code,
        &["push this 0", "push constant 7", "call Bar.go 2"]
    ));
}

#[test]
fn class_qualified_call_has_no_hidden_receiver() {
    let code =
        compile_source("class Foo { function void f() { do Output.printInt(7); return; } }");
    assert!(emits_in_order(
        &code,
        &["push constant 7", "call Output.printInt 1"]
    ));
    assert!(!code.contains(&"push pointer 0".to_string()));
}

#[test]
fn array_read_and_write() {
    let code = compile_source(
        "class Foo {
            function void f(Array a, int i) {
                var int x;
                let x = a[i];
                let a[i] = x;
                return;
            }
        }",
    );
    assert!(emits_in_order(
        &code,
        &[
            "push argument 1",
            "push argument 0",
            "add",
            "pop pointer 1",
            "push that 0",
            "pop local 0",
        ]
    ));
    assert!(emits_in_order(
        &code,
        &[
            "push argument 1",
            "push argument 0",
            "add",
            "push local 0",
            "pop temp 0",
            "pop pointer 1",
            "push temp 0",
            "pop that 0",
        ]
    ));
}

#[test]
fn keyword_constants() {
    let code = compile_source(
        "class Foo {
            method Foo me() { return this; }
            function boolean f() { var boolean b; let b = true; let b = false; return null; }
        }",
    );
    assert!(emits_in_order(&code, &["push pointer 0", "return"]));
    assert!(emits_in_order(&code, &["push constant 0", "not", "pop local 0"]));
    assert!(emits_in_order(&code, &["push constant 0", "pop local 0"]));
}

#[test]
fn string_constants_expand_to_appendchar_calls() {
    let code = compile_source(
        "class Foo { function void f() { do Output.printString(\"Hi!\"); return; } }",
    );
    assert!(emits_in_order(
        &code,
        &[
            "push constant 3",
            "call String.new 1",
            "push constant 72",
            "call String.appendChar 2",
            "push constant 105",
            "call String.appendChar 2",
            "push constant 33",
            "call String.appendChar 2",
            "call Output.printString 1",
        ]
    ));
}

#[test]
fn identical_compacted_literals_recover_their_own_spacing() {
    // both literals compact to the same pseudo-token; recovery is by
    // position, so each keeps its own original spacing
    let code = compile_source(
        "class Foo {
            function void f() {
                do Output.printString(\"a b\");
                do Output.printString(\"a  b\");
                return;
            }
        }",
    );
    assert!(emits_in_order(
        &code,
        &[
            "push constant 3",
            "call String.new 1",
            "push constant 97",
            "call String.appendChar 2",
            "push constant 32",
            "call String.appendChar 2",
            "push constant 98",
            "call String.appendChar 2",
        ]
    ));
    assert!(emits_in_order(
        &code,
        &[
            "push constant 4",
            "call String.new 1",
            "push constant 97",
            "call String.appendChar 2",
            "push constant 32",
            "call String.appendChar 2",
            "push constant 32",
            "call String.appendChar 2",
            "push constant 98",
            "call String.appendChar 2",
        ]
    ));
}

#[test]
fn empty_return_pushes_a_placeholder() {
    let code = compile_source("class Foo { function void f() { return; } }");
    assert_eq!(code, vec!["function Foo.f 0", "push constant 0", "return"]);
}

#[test]
fn unit_must_start_with_the_class_keyword() {
    let lines = vec!["function void f() { return; }".to_string()];
    let err = compile(&lines).unwrap_err();
    assert!(matches!(err, CompileError::StructuralMismatch { .. }));
}

#[test]
fn missing_delimiter_is_a_structural_mismatch() {
    let lines = vec!["class Foo { function void f() { return } }".to_string()];
    let err = compile(&lines).unwrap_err();
    assert!(matches!(err, CompileError::StructuralMismatch { .. }));
}

#[test]
fn void_is_only_a_return_type() {
    let lines =
        vec!["class Foo { function void f() { var void x; return; } }".to_string()];
    let err = compile(&lines).unwrap_err();
    assert!(matches!(err, CompileError::StructuralMismatch { .. }));

    let lines = vec!["class Foo { field void y; }".to_string()];
    let err = compile(&lines).unwrap_err();
    assert!(matches!(err, CompileError::StructuralMismatch { .. }));
}

#[test]
fn unknown_name_is_an_unresolved_symbol() {
    let lines = vec!["class Foo { function void f() { let y = 1; return; } }".to_string()];
    let err = compile(&lines).unwrap_err();
    assert_eq!(err, CompileError::UnresolvedSymbol("y".to_string()));
}

#[test]
fn failure_yields_no_partial_output() {
    // the second statement trips on an unknown name; the whole unit errors
    let lines =
        vec!["class Foo { function void f() { do Output.go(); let y = 1; return; } }".to_string()];
    assert!(compile(&lines).is_err());
}
