mod common;

#[cfg(test)]
mod interpreter_tests {
    use super::common::{run, SharedBuffer};
    use rox::Lox;

    fn assert_prints(source: &str, expected: &[&str]) {
        let outcome = run(source);

        assert_eq!(outcome.stderr, "", "unexpected diagnostics for {:?}", source);
        assert_eq!(outcome.exit_code, 0);

        let lines: Vec<&str> = outcome.stdout.lines().collect();
        assert_eq!(lines, expected);
    }

    #[test]
    fn test_arithmetic_and_number_formatting() {
        assert_prints(
            "print 1 + 2; print 7 / 2; print -3 * 2; print 10 - 0.5; print 2 / 0;",
            &["3", "3.5", "-6", "9.5", "inf"],
        );
    }

    #[test]
    fn test_string_concatenation() {
        assert_prints("print \"a\" + \"b\";", &["ab"]);
    }

    #[test]
    fn test_no_implicit_coercion_on_plus() {
        let outcome = run("print 1 + \"b\";");

        assert_eq!(outcome.stdout, "");
        assert_eq!(
            outcome.stderr,
            "Operands must be two numbers or two strings.\n[line 1]\n"
        );
        assert_eq!(outcome.exit_code, 70);
    }

    #[test]
    fn test_truthiness_and_logic() {
        assert_prints(
            "print !nil; print !0; print !\"\"; print nil or \"x\"; print 1 and 2; print false and boom;",
            &["true", "false", "false", "x", "2", "false"],
        );
    }

    #[test]
    fn test_equality() {
        assert_prints(
            "print nil == nil; print nil == false; print 1 == 1; print \"a\" != \"a\"; print clock == clock;",
            &["true", "false", "true", "false", "true"],
        );
    }

    #[test]
    fn test_comparison_needs_numbers() {
        let outcome = run("print 1 < 2;\nprint \"a\" < \"b\";");

        assert_eq!(outcome.stdout, "true\n");
        assert_eq!(outcome.stderr, "Operands must be numbers.\n[line 2]\n");
    }

    #[test]
    fn test_unary_minus_needs_number() {
        let outcome = run("print -\"x\";");

        assert_eq!(outcome.stderr, "Operand must be a number.\n[line 1]\n");
        assert_eq!(outcome.exit_code, 70);
    }

    #[test]
    fn test_block_shadowing() {
        assert_prints("var a = 1; { var a = 2; print a; } print a;", &["2", "1"]);
    }

    #[test]
    fn test_uninitialized_variable_is_nil() {
        assert_prints("var a; print a;", &["nil"]);
    }

    #[test]
    fn test_undefined_variable() {
        let outcome = run("print nope;");

        assert_eq!(outcome.stderr, "Undefined variable 'nope'.\n[line 1]\n");
        assert_eq!(outcome.exit_code, 70);
    }

    #[test]
    fn test_assignment_to_undefined_global() {
        let outcome = run("nope = 1;");

        assert_eq!(outcome.stderr, "Undefined variable 'nope'.\n[line 1]\n");
    }

    #[test]
    fn test_control_flow() {
        assert_prints(
            "if (1 > 2) print \"no\"; else print \"yes\";\n\
             var i = 0; while (i < 3) { print i; i = i + 1; }\n\
             for (var j = 10; j > 8; j = j - 1) print j;",
            &["yes", "0", "1", "2", "10", "9"],
        );
    }

    #[test]
    fn test_closure_capture_per_iteration() {
        let source = r#"
            var first; var second; var third;
            for (var i = 0; i < 3; i = i + 1) {
              var j = i;
              fun show() { print j; }
              if (i == 0) first = show;
              if (i == 1) second = show;
              if (i == 2) third = show;
            }
            first(); second(); third();
        "#;

        assert_prints(source, &["0", "1", "2"]);
    }

    #[test]
    fn test_closure_counter() {
        let source = r#"
            fun makeCounter() {
              var count = 0;
              fun increment() { count = count + 1; return count; }
              return increment;
            }
            var a = makeCounter();
            var b = makeCounter();
            print a(); print a(); print b();
        "#;

        assert_prints(source, &["1", "2", "1"]);
    }

    #[test]
    fn test_closures_bind_lexically() {
        let source = r#"
            var a = "global";
            {
              fun show() { print a; }
              show();
              var a = "block";
              show();
            }
        "#;

        assert_prints(source, &["global", "global"]);
    }

    #[test]
    fn test_recursion_and_early_return() {
        let source = r#"
            fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }
            print fib(15);
            fun find() { var i = 0; while (true) { if (i == 4) return i; i = i + 1; } }
            print find();
            fun nothing() { return; }
            print nothing();
        "#;

        assert_prints(source, &["610", "4", "nil"]);
    }

    #[test]
    fn test_unbounded_recursion_is_a_runtime_error() {
        let outcome = run("fun f() { f(); }\nf();");

        assert_eq!(outcome.stdout, "");
        assert_eq!(outcome.stderr, "Stack overflow.\n[line 1]\n");
        assert_eq!(outcome.exit_code, 70);
    }

    #[test]
    fn test_deep_recursion_below_the_limit() {
        let source = r#"
            fun count(n) { if (n == 0) return 0; return 1 + count(n - 1); }
            print count(3000);
        "#;

        assert_prints(source, &["3000"]);
    }

    #[test]
    fn test_session_recovers_after_stack_overflow() {
        let stdout = SharedBuffer::default();
        let stderr = SharedBuffer::default();
        let mut lox = Lox::with_streams(Box::new(stdout.clone()), Box::new(stderr.clone()));

        lox.run("fun down(n) { if (n == 0) return \"bottom\"; return down(n - 1); }");
        lox.run("down(-1);");
        assert_eq!(lox.diagnostics().exit_code(), 70);
        lox.reset_diagnostics();

        lox.run("print down(2000);");

        assert_eq!(stdout.contents(), "bottom\n");
        assert_eq!(stderr.contents(), "Stack overflow.\n[line 1]\n");
        assert!(lox.diagnostics().is_empty());
    }

    #[test]
    fn test_local_functions_outlive_their_call() {
        let source = r#"
            fun outer() {
              fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }
              var alias = fib;
              print alias == fib;
              return fib;
            }
            var f = outer();
            print f(10);
            print f == f;
            print outer() == f;
        "#;

        // The last line calls `outer` once more, which prints before the comparison.
        assert_prints(source, &["true", "55", "true", "true", "false"]);
    }

    #[test]
    fn test_wrong_arity_does_not_run_body() {
        let outcome = run("fun f(a, b) { print \"ran\"; }\nf(1);");

        assert_eq!(outcome.stdout, "");
        assert_eq!(outcome.stderr, "Expected 2 arguments but got 1.\n[line 2]\n");
        assert_eq!(outcome.exit_code, 70);
    }

    #[test]
    fn test_calling_non_callable() {
        let outcome = run("\"text\"();");

        assert_eq!(outcome.stderr, "Can only call functions and classes.\n[line 1]\n");
    }

    #[test]
    fn test_runtime_error_stops_program_after_earlier_output() {
        let outcome = run("print 1;\nprint nil + 1;\nprint 3;");

        assert_eq!(outcome.stdout, "1\n");
        assert_eq!(outcome.exit_code, 70);
    }

    #[test]
    fn test_value_stringification() {
        assert_prints(
            r#"
            fun f() {}
            class C {}
            print f; print clock; print C; print C(); print true; print nil;
            "#,
            &["<fn f>", "<native fn>", "C", "C instance", "true", "nil"],
        );
    }

    #[test]
    fn test_clock_returns_seconds() {
        assert_prints("print clock() > 1000000000;", &["true"]);
    }

    #[test]
    fn test_fields_and_methods() {
        let source = r#"
            class Bagel {
              eat() { print "Crunch " + this.flavor; }
            }
            var b = Bagel();
            b.flavor = "sesame";
            b.eat();
            var eat = b.eat;
            b.flavor = "plain";
            eat();
        "#;

        assert_prints(source, &["Crunch sesame", "Crunch plain"]);
    }

    #[test]
    fn test_fields_shadow_methods() {
        let source = r#"
            class A { m() { return "method"; } }
            var a = A();
            fun f() { return "field"; }
            a.m = f;
            print a.m();
        "#;

        assert_prints(source, &["field"]);
    }

    #[test]
    fn test_initializer_and_this() {
        let source = r#"
            class Point {
              init(x, y) { this.x = x; this.y = y; }
              sum() { return this.x + this.y; }
            }
            var p = Point(2, 3);
            print p.sum();
            print p.init(10, 20) == p;
            print p.sum();
        "#;

        assert_prints(source, &["5", "true", "30"]);
    }

    #[test]
    fn test_early_return_in_initializer_yields_instance() {
        let source = r#"
            class A { init() { this.v = 1; return; this.v = 2; } }
            print A().v;
        "#;

        assert_prints(source, &["1"]);
    }

    #[test]
    fn test_class_arity_comes_from_init() {
        let outcome = run("class A { init(a) {} }\nA();");

        assert_eq!(outcome.stderr, "Expected 1 arguments but got 0.\n[line 2]\n");

        let outcome = run("class B {}\nB(1);");

        assert_eq!(outcome.stderr, "Expected 0 arguments but got 1.\n[line 2]\n");
    }

    #[test]
    fn test_inherited_initializer() {
        let source = r#"
            class A { init(n) { this.n = n; } }
            class B < A {}
            print B(5).n;
        "#;

        assert_prints(source, &["5"]);
    }

    #[test]
    fn test_super_calls() {
        let source = r#"
            class Doughnut {
              cook() { print "Fry until golden brown."; }
            }
            class BostonCream < Doughnut {
              cook() {
                super.cook();
                print "Pipe full of custard and coat with chocolate.";
              }
            }
            BostonCream().cook();
        "#;

        assert_prints(
            source,
            &[
                "Fry until golden brown.",
                "Pipe full of custard and coat with chocolate.",
            ],
        );
    }

    #[test]
    fn test_super_binds_current_instance() {
        let source = r#"
            class A { name() { return this.tag; } }
            class B < A { name() { return "B:" + super.name(); } }
            class C < B {}
            var c = C();
            c.tag = "c";
            print c.name();
        "#;

        assert_prints(source, &["B:c"]);
    }

    #[test]
    fn test_property_errors() {
        let outcome = run("var x = 1;\nprint x.y;");
        assert_eq!(outcome.stderr, "Only instances have properties.\n[line 2]\n");

        let outcome = run("var x = 1;\nx.y = 2;");
        assert_eq!(outcome.stderr, "Only instances have fields.\n[line 2]\n");

        let outcome = run("class A {}\nprint A().missing;");
        assert_eq!(outcome.stderr, "Undefined property 'missing'.\n[line 2]\n");
    }

    #[test]
    fn test_superclass_must_be_class() {
        let outcome = run("var NotAClass = 1;\nclass A < NotAClass {}");

        assert_eq!(outcome.stderr, "Superclass must be a class.\n[line 2]\n");
        assert_eq!(outcome.exit_code, 70);
    }

    #[test]
    fn test_compile_errors_skip_evaluation() {
        let outcome = run("print \"before\";\nprint ;\nprint $;");

        assert_eq!(outcome.stdout, "");
        assert_eq!(
            outcome.stderr,
            "[line 3] Error: Unexpected character: $\n\
             [line 2] Error at ';': Expected expression\n\
             [line 3] Error at ';': Expected expression\n"
        );
        assert_eq!(outcome.exit_code, 65);
    }

    #[test]
    fn test_resolve_error_skips_evaluation() {
        let outcome = run("print \"before\";\n{ var a = 1; var a = 2; }");

        assert_eq!(outcome.stdout, "");
        assert_eq!(
            outcome.stderr,
            "[line 2] Error at 'a': Already a variable with this name in this scope.\n"
        );
        assert_eq!(outcome.exit_code, 65);
    }

    #[test]
    fn test_diagnostics_keep_report_order() {
        let mut lox = Lox::with_streams(
            Box::new(SharedBuffer::default()),
            Box::new(SharedBuffer::default()),
        );

        lox.run("var x = ;\nprint #;");

        let reported: Vec<String> = lox
            .diagnostics()
            .errors()
            .iter()
            .map(|e| e.to_string())
            .collect();
        assert_eq!(
            reported,
            vec![
                "[line 2] Error: Unexpected character: #",
                "[line 1] Error at ';': Expected expression",
                "[line 2] Error at ';': Expected expression",
            ]
        );
        assert!(lox.diagnostics().errors().iter().all(|e| e.is_compile_time()));

        lox.reset_diagnostics();
        lox.run("print 1;\nprint nil + 1;");

        let errors = lox.diagnostics().errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].is_runtime());
        assert_eq!(
            errors[0].to_string(),
            "Operands must be two numbers or two strings.\n[line 2]"
        );
    }

    #[test]
    fn test_session_keeps_globals_between_runs() {
        let stdout = SharedBuffer::default();
        let stderr = SharedBuffer::default();
        let mut lox = Lox::with_streams(Box::new(stdout.clone()), Box::new(stderr.clone()));

        lox.run("var count = 1; fun bump() { count = count + 1; return count; }");
        lox.run("print bump();");

        lox.run("print missing;");
        assert_eq!(lox.diagnostics().exit_code(), 70);
        lox.reset_diagnostics();

        lox.run("print bump();");

        assert_eq!(stdout.contents(), "2\n3\n");
        assert_eq!(stderr.contents(), "Undefined variable 'missing'.\n[line 1]\n");
        assert!(lox.diagnostics().is_empty());
    }
}
