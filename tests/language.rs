use std::{cell::RefCell, rc::Rc};

use pretty_assertions::assert_eq;

use bawal_code::{parse, run, tokenize, Interpreter};

fn run_err(source: &str) -> String {
    run(source).unwrap_err().to_string()
}

#[test]
fn sum_of_declared_variables() {
    let source = r#"
        bawal suru
        ye x = 10;
        ye y = 20;
        bol "Sum is: " + (x + y);
        bawal khatam
    "#;
    assert_eq!(run(source).unwrap(), "Sum is: 30");
}

#[test]
fn functions_are_called_with_arguments() {
    let source = r#"
        bawal suru
        kaam jod(a, b) {
            ye r = a + b;
            bol r;
        }
        jod(2, 3);
        jod(10, 20);
        bawal khatam
    "#;
    assert_eq!(run(source).unwrap(), "5\n30");
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    assert_eq!(run("bawal suru bol 2 + 3 * 4; bawal khatam").unwrap(), "14");
    assert_eq!(
        run("bawal suru bol (2 + 3) * 4; bawal khatam").unwrap(),
        "20"
    );
}

#[test]
fn plus_adds_numbers_and_concatenates_otherwise() {
    assert_eq!(run("bawal suru bol 1 + 1; bawal khatam").unwrap(), "2");
    assert_eq!(
        run("bawal suru bol \"a\" + 1; bawal khatam").unwrap(),
        "a1"
    );
    assert_eq!(
        run("bawal suru bol \"v=\" + (1 == 1); bawal khatam").unwrap(),
        "v=true"
    );
}

#[test]
fn division_yields_fractions_and_rejects_zero() {
    assert_eq!(run("bawal suru bol 5 / 2; bawal khatam").unwrap(), "2.5");

    let message = run_err("bawal suru bol 5 / 0; bawal khatam");
    assert_eq!(message, "Runtime Error: Division by zero");
}

#[test]
fn arithmetic_on_strings_is_an_error() {
    let message = run_err("bawal suru bol \"a\" * 2; bawal khatam");
    assert_eq!(
        message,
        "Runtime Error: Cannot perform * on non-numeric value: a"
    );
}

#[test]
fn equality_does_not_coerce() {
    assert_eq!(
        run("bawal suru bol 1 == \"1\"; bawal khatam").unwrap(),
        "false"
    );
    assert_eq!(
        run("bawal suru bol 1 != \"1\"; bawal khatam").unwrap(),
        "true"
    );
}

#[test]
fn unary_operators() {
    assert_eq!(run("bawal suru bol -(2 + 3); bawal khatam").unwrap(), "-5");
    assert_eq!(run("bawal suru bol !0; bawal khatam").unwrap(), "true");
    assert_eq!(run("bawal suru bol !!5; bawal khatam").unwrap(), "true");

    let message = run_err("bawal suru bol -\"a\"; bawal khatam");
    assert_eq!(
        message,
        "Runtime Error: Cannot perform unary - on non-numeric value: a"
    );
}

#[test]
fn truthiness_drives_conditionals() {
    let source = r#"
        bawal suru
        agar ("") { bol "no"; } warna { bol "empty string is false"; }
        agar (0) { bol "no"; } warna { bol "zero is false"; }
        agar ("x") { bol "nonempty string is true"; }
        bawal khatam
    "#;
    assert_eq!(
        run(source).unwrap(),
        "empty string is false\nzero is false\nnonempty string is true"
    );
}

#[test]
fn else_if_chain_picks_the_matching_branch() {
    let source = r#"
        bawal suru
        ye n = 2;
        agar (n == 1) { bol "one"; }
        warna agar (n == 2) { bol "two"; }
        warna { bol "many"; }
        bawal khatam
    "#;
    assert_eq!(run(source).unwrap(), "two");
}

#[test]
fn while_loop_counts_down() {
    let source = r#"
        bawal suru
        ye n = 3;
        jabtak (n > 0) {
            bol n;
            ye n = n - 1;
        }
        bawal khatam
    "#;
    assert_eq!(run(source).unwrap(), "3\n2\n1");
}

#[test]
fn logical_operators_combine_truthiness() {
    assert_eq!(
        run("bawal suru bol 1 && \"x\"; bawal khatam").unwrap(),
        "true"
    );
    assert_eq!(run("bawal suru bol 0 || \"\"; bawal khatam").unwrap(), "false");
}

#[test]
fn logical_operators_evaluate_both_operands() {
    // no short-circuit: the right side runs even when the left decides
    let message = run_err("bawal suru bol 0 && foo(); bawal khatam");
    assert_eq!(message, "Runtime Error: Undefined function: foo");
}

#[test]
fn loop_completes_exactly_at_the_iteration_cap() {
    let source = r#"
        bawal suru
        ye n = 0;
        jabtak (n < 1000) {
            ye n = n + 1;
        }
        bol n;
        bawal khatam
    "#;
    assert_eq!(run(source).unwrap(), "1000");
}

#[test]
fn loop_fails_past_the_iteration_cap() {
    let source = r#"
        bawal suru
        ye n = 0;
        jabtak (n < 1001) {
            ye n = n + 1;
        }
        bawal khatam
    "#;
    assert_eq!(
        run_err(source),
        "Runtime Error: Maximum loop iteration limit exceeded"
    );
}

#[test]
fn operation_limit_stops_runaway_programs() {
    let mut source = String::from("bawal suru\n");
    for _ in 0..10_001 {
        source.push_str("bol 1;\n");
    }
    source.push_str("bawal khatam");

    assert_eq!(
        run_err(&source),
        "Runtime Error: Maximum operation limit exceeded - possible infinite loop"
    );
}

#[test]
fn wrong_argument_count_names_both_counts() {
    let source = r#"
        bawal suru
        kaam jod(a, b) { bol a + b; }
        jod(1);
        bawal khatam
    "#;
    assert_eq!(
        run_err(source),
        "Runtime Error: Function jod expects 2 arguments, got 1"
    );
}

#[test]
fn calling_an_undefined_function_names_it() {
    let message = run_err("bawal suru foo(); bawal khatam");
    assert!(message.contains("foo"), "unexpected message: {message}");
}

#[test]
fn reading_an_undefined_variable_names_it() {
    let message = run_err("bawal suru bol nahi_hai; bawal khatam");
    assert_eq!(message, "Runtime Error: Undefined variable: nahi_hai");
}

#[test]
fn return_yields_the_call_result() {
    let source = r#"
        bawal suru
        kaam paanch() { wapis 5; }
        bol paanch() + 2;
        bawal khatam
    "#;
    assert_eq!(run(source).unwrap(), "7");
}

#[test]
fn call_result_is_the_last_executed_statement() {
    let source = r#"
        bawal suru
        kaam doubled(n) { n * 2; }
        bol doubled(4);
        bawal khatam
    "#;
    assert_eq!(run(source).unwrap(), "8");
}

#[test]
fn callee_sees_caller_locals_but_cannot_change_them() {
    let source = r#"
        bawal suru
        ye x = 1;
        kaam peek() {
            bol x;
            ye x = 99;
        }
        peek();
        bol x;
        bawal khatam
    "#;
    assert_eq!(run(source).unwrap(), "1\n1");
}

#[test]
fn declaration_without_initializer_prints_empty() {
    assert_eq!(run("bawal suru ye x; bol x; bawal khatam").unwrap(), "");
}

#[test]
fn comments_and_escapes() {
    let source = "bawal suru\n// yeh comment hai\nbol \"a\\nb\";\nbawal khatam";
    assert_eq!(run(source).unwrap(), "a\nb");
}

#[test]
fn input_is_coerced_to_a_number_when_possible() {
    let tokens = tokenize("bawal suru nivesh x; bol x + 1; bawal khatam").unwrap();
    let program = parse(&tokens).unwrap();

    let prompts = Rc::new(RefCell::new(Vec::new()));
    let seen = prompts.clone();

    let mut interpreter = Interpreter::new();
    interpreter.set_input_callback(move |prompt| {
        seen.borrow_mut().push(prompt.to_string());
        Ok("42".to_string())
    });

    assert_eq!(interpreter.interpret(&program).unwrap(), "43");
    assert_eq!(prompts.borrow().as_slice(), ["Enter value for x:"]);
}

#[test]
fn non_numeric_input_stays_a_string() {
    let tokens = tokenize("bawal suru nivesh naam; bol naam + \"!\"; bawal khatam").unwrap();
    let program = parse(&tokens).unwrap();

    let mut interpreter = Interpreter::new();
    interpreter.set_input_callback(|_| Ok("hello".to_string()));

    assert_eq!(interpreter.interpret(&program).unwrap(), "hello!");
}

#[test]
fn input_without_a_callback_is_an_error() {
    let message = run_err("bawal suru nivesh x; bawal khatam");
    assert_eq!(
        message,
        "Runtime Error: Input not available in this environment"
    );
}

#[test]
fn state_persists_across_interpret_calls_until_reset() {
    let first = parse(&tokenize("bawal suru ye x = 1; kaam f() { bol x; } bawal khatam").unwrap())
        .unwrap();
    let second = parse(&tokenize("bawal suru f(); bawal khatam").unwrap()).unwrap();

    let mut interpreter = Interpreter::new();
    interpreter.interpret(&first).unwrap();
    assert_eq!(interpreter.interpret(&second).unwrap(), "1");

    interpreter.reset();
    let message = interpreter.interpret(&second).unwrap_err().to_string();
    assert_eq!(message, "Runtime Error: Undefined function: f");
}

#[test]
fn sentinel_errors_name_the_missing_sentinel() {
    let message = run("ye x = 1;").unwrap_err().to_string();
    assert!(message.contains("bawal suru"), "unexpected message: {message}");

    let message = run("bawal suru ye x = 1;").unwrap_err().to_string();
    assert!(
        message.contains("bawal khatam"),
        "unexpected message: {message}"
    );
}

#[test]
fn lex_errors_carry_positions() {
    let err = run("bawal suru\nbol @;\nbawal khatam").unwrap_err();
    assert_eq!(
        err.to_string(),
        "unexpected character '@' at line 2, column 5"
    );
}
