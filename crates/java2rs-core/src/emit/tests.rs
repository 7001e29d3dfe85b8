use pretty_assertions::assert_eq;

use crate::transpile_source;

fn emit(source: &str) -> String {
    transpile_source(source).unwrap()
}

fn assert_contains(text: &str, needle: &str) {
    assert!(text.contains(needle), "missing `{needle}` in:\n{text}");
}

#[test]
fn test_receiver_follows_instance_state() {
    let out = emit("class A { int n; void inc() { n++; } int get() { return n; } static int one() { return 1; } }");
    assert_contains(&out, "fn inc(&mut self) {\n        self.n += 1;\n    }");
    assert_contains(&out, "fn get(&self) -> i32 {\n        return self.n;\n    }");
    assert_contains(&out, "fn one() -> i32 {\n        return 1;\n    }");
}

#[test]
fn test_constructor_is_a_factory() {
    let out = emit("class P { int x; P(int x) { this.x = x; } }");
    assert_eq!(
        out,
        "struct P {\n    x: i32,\n}\n\nimpl P {\n    pub fn new(x: i32) -> Self {\n        let x = x;\n        Self { x }\n    }\n}\n"
    );
}

#[test]
fn test_unassigned_fields_default_in_factory() {
    let out = emit("class Q { int a; int b = 4; Q() { } }");
    assert_contains(&out, "Self { a: Default::default(), b: 4 }");
}

#[test]
fn test_local_mutability() {
    let out = emit("class A { static void f() { int a = 1; int b = 2; b = a + b; } }");
    assert_contains(&out, "let a: i32 = 1;");
    assert_contains(&out, "let mut b: i32 = 2;");
    assert_contains(&out, "b = a + b;");
}

#[test]
fn test_upper_case_locals_become_constants() {
    let out = emit("class A { static void f() { final int LIMIT = 3; final String NAME = \"x\"; } }");
    assert_contains(&out, "const LIMIT: i32 = 3;");
    assert_contains(&out, "const NAME: &'static str = \"x\";");
}

#[test]
fn test_string_concatenation_is_one_format_call() {
    let out = emit("class A { static String f(int n, int m) { return \"n=\" + n + \", m=\" + m; } }");
    assert_contains(&out, "format!(\"n={}, m={}\", n, m)");
}

#[test]
fn test_print_calls_become_macros() {
    let out = emit("class A { static void f(int n) { System.out.println(\"n is \" + n); } }");
    assert_contains(&out, "println!(\"n is {}\", n);");
}

#[test]
fn test_for_loop_desugars_to_while() {
    let out = emit(
        "class A { static int sum(int[] xs) { int t = 0; for (int i = 0; i < xs.length; i++) { t += xs[i]; } return t; } }",
    );
    assert_contains(&out, "let mut i: i32 = 0;");
    assert_contains(&out, "while i < xs.len() {");
    assert_contains(&out, "t += xs[(i) as usize];");
    assert_contains(&out, "i += 1;");
    assert_contains(&out, "fn sum(xs: &Vec<i32>) -> i32");
}

#[test]
fn test_do_while_loops_check_at_the_end() {
    let out = emit("class A { static void f() { int i = 0; do { i++; } while (i < 3); } }");
    assert_contains(&out, "loop {\n            i += 1;\n            if !(i < 3) {\n                break;\n            }\n        }");
}

#[test]
fn test_labeled_loops_keep_labels() {
    let out = emit("class A { static void f() { outer: while (true) { break outer; } } }");
    assert_contains(&out, "'outer: loop {\n            break 'outer;\n        }");
}

#[test]
fn test_thrown_types_become_results() {
    let out = emit("class Failure extends Exception { }\nclass A { static void f() throws Failure { throw new Failure(); } }");
    assert_contains(&out, "fn f() -> Result<(), Failure> /* throws Failure */ {");
    assert_contains(&out, "return Err(Failure::new().into());");
}

#[test]
fn test_throwing_callers_propagate() {
    let out = emit(
        "class Failure extends Exception { }\nclass A { static void f() throws Failure { throw new Failure(); } static void g() throws Failure { f(); } }",
    );
    assert_contains(&out, "A::f()?;");
    assert_contains(&out, "Ok(())");
}

#[test]
fn test_try_catch_skeleton() {
    let out = emit(
        "class Failure extends Exception { }\nclass A { static void f() throws Failure { throw new Failure(); }\n static int g() { try { f(); return 1; } catch (Failure e) { return 0; } } }",
    );
    assert_contains(&out, "let mut try_result_1 = 0;");
    assert_contains(&out, "'try_1: loop {");
    assert_contains(
        &out,
        "match A::f() { Ok(v) => v, Err(_) => { try_result_1 = 1; break 'try_1; } };",
    );
    // caught types still count towards the thrown set
    assert_contains(&out, "fn g() -> Result<i32, Failure> /* throws Failure */ {");
    assert_contains(&out, "match try_result_1 {\n            1 => {\n                return Ok(0);\n            }\n            _ => {}\n        }");
}

#[test]
fn test_switch_groups_labels() {
    let out = emit(
        "class A { static int f(int k) { switch (k) { case 1: case 2: return 1; default: return 0; } } }",
    );
    assert_contains(&out, "match k {");
    assert_contains(&out, "1 | 2 => {\n                return 1;\n            }");
    assert_contains(&out, "_ => {\n                return 0;\n            }");
}

#[test]
fn test_switch_without_default_gets_catch_all() {
    let out = emit("class A { static void f(int k) { switch (k) { case 1: k = 2; break; } } }");
    assert_contains(&out, "1 => {\n                k = 2;\n            }\n            _ => {}");
}

#[test]
fn test_enum_variants() {
    assert_eq!(emit("enum Color { RED, DARK_BLUE }"), "enum Color {\n    Red,\n    DarkBlue,\n}\n");
}

#[test]
fn test_enum_fields_become_accessors() {
    let out = emit(
        "enum Planet { MERCURY(1), VENUS(2); private final int order; Planet(int order) { this.order = order; } }",
    );
    assert_contains(&out, "fn order(&self) -> i32 {\n        match self {\n            Planet::Mercury => 1,\n            Planet::Venus => 2,\n        }\n    }");
    assert!(!out.contains("fn new"), "{out}");
}

#[test]
fn test_records_get_public_fields_and_accessors() {
    let out = emit("record Point(int x, int y) { }");
    assert_contains(&out, "struct Point {\n    pub x: i32,\n    pub y: i32,\n}");
    assert_contains(&out, "pub fn new(x: i32, y: i32) -> Self {\n        Self { x, y }\n    }");
    assert_contains(&out, "pub fn x(&self) -> i32 {\n        self.x\n    }");
}

#[test]
fn test_generic_bounds_only_in_impl_header() {
    let out = emit("interface D { }\nclass A<B, C extends D, E> { C i; }");
    assert_contains(&out, "struct A<B, C, E> {\n    i: C,\n}");
    assert_contains(&out, "impl<B, C: D, E> A<B, C, E> {}");
}

#[test]
fn test_inherited_methods_are_forwarded() {
    let out = emit("class Base { int v; int value() { return v; } }\nclass Derived extends Base { }");
    assert_contains(&out, "struct Derived {\n    base: Base,\n}");
    assert_contains(&out, "fn value(&self) -> i32 {\n        self.base.value()\n    }");
}

#[test]
fn test_overridden_methods_are_not_forwarded() {
    let out = emit(
        "class Base { int v; int value() { return v; } }\nclass Derived extends Base { int value() { return 2; } }",
    );
    assert!(!out.contains("self.base.value()"), "{out}");
}

#[test]
fn test_comments_are_kept_in_place() {
    let out = emit("class A { static void f() {\n // first\n int x = 1;\n // second\n int y = 2; } }");
    assert_contains(&out, "// first\n        let x: i32 = 1;\n        // second\n        let y: i32 = 2;");
}

#[test]
fn test_lambdas_are_marked_unsupported() {
    let out = emit("class A { static void f() { Runnable r = () -> { }; } }");
    assert_contains(&out, "/* unsupported");
}

#[test]
fn test_embedded_postfix_update_captures_old_value() {
    let out = emit("class A { static int f(int i) { int j = i++; return j; } }");
    assert_contains(&out, "let j: i32 = { let tmp = i; i += 1; tmp };");
    assert_contains(&out, "fn f(mut i: i32) -> i32");
}

#[test]
fn test_literal_translation() {
    let out = emit("class A { static void f() { long a = 10L; double b = 2; float c = 1.5f; char d = 'x'; String e = null; } }");
    assert_contains(&out, "let a: i64 = 10;");
    assert_contains(&out, "let b: f64 = 2.0;");
    assert_contains(&out, "let c: f32 = 1.5;");
    assert_contains(&out, "let d: char = 'x';");
    assert_contains(&out, "let e: String = None;");
}

#[test]
fn test_static_fields_are_associated_constants() {
    let out = emit("class A { static final int MAX_SIZE = 8; static final String LABEL = \"a\"; }");
    assert_contains(&out, "impl A {\n    const MAX_SIZE: i32 = 8;\n    const LABEL: &'static str = \"a\";\n}");
}

#[test]
fn test_capitalized_locals_become_constants_even_when_reassigned() {
    let out = emit("class A { static void f() { int Count = 0; Count = 1; double Rate = 2; } }");
    assert_contains(&out, "const Count: i32 = 0;");
    assert_contains(&out, "const Rate: f64 = 2.0;");
    assert!(!out.contains("let mut Count"), "{out}");
}

#[test]
fn test_text_blocks_keep_their_content() {
    let out = emit("class A { static void f() { String s = \"\"\"\n    line1\n    line2\n    \"\"\"; } }");
    assert_contains(&out, "let s: String = \"line1\\nline2\\n\".to_string();");
}

#[test]
fn test_enum_getter_named_after_field_is_not_duplicated() {
    let out = emit(
        "enum Color { RED(\"r\"), GREEN(\"g\"); private final String code; Color(String c) { this.code = c; } String code() { return code; } }",
    );
    assert_eq!(out.matches("fn code(").count(), 1, "{out}");
    assert_contains(
        &out,
        "fn code(&self) -> &'static str {\n        match self {\n            Color::Red => \"r\",\n            Color::Green => \"g\",\n        }\n    }",
    );
    assert!(!out.contains("self.code()"), "{out}");
}

#[test]
fn test_custom_enum_getter_reads_renamed_accessor() {
    let out = emit(
        "enum Level { LOW(1), HIGH(2); private final int weight; Level(int w) { this.weight = w; } int weight() { return weight * 10; } }",
    );
    assert_contains(&out, "fn weight_value(&self) -> i32 {");
    assert_contains(&out, "self.weight_value() * 10");
    assert_eq!(out.matches("fn weight(").count(), 1, "{out}");
}

#[test]
fn test_string_append_of_non_text_value() {
    let out = emit("class A { static String f(int n) { String s = \"a\"; s += n; s += \"b\"; return s; } }");
    assert_contains(&out, "s += &n.to_string();");
    assert_contains(&out, "s += \"b\";");
}

#[test]
fn test_explicit_constructor_calls() {
    let out = emit(
        "class Base { int v; Base(int v) { this.v = v; } }\nclass Sub extends Base { Sub(int v) { super(v); } Sub() { this(1); } }",
    );
    assert_contains(&out, "let base = Base::new(v);");
    assert_contains(&out, "let mut this = Self::new(1);");
}
