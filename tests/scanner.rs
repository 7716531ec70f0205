#[cfg(test)]
mod scanner_tests {
    use rox::error::LoxError;
    use rox::scanner::*;
    use rox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source);
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_longest_match_operators() {
        assert_token_sequence(
            "! != = == < <= > >= /",
            &[
                (TokenType::BANG, "!"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL, "="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::LESS, "<"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER, ">"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::SLASH, "/"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_keywords_and_identifiers() {
        assert_token_sequence(
            "class fun orchid or _tmp1 this super",
            &[
                (TokenType::CLASS, "class"),
                (TokenType::FUN, "fun"),
                (TokenType::IDENTIFIER, "orchid"),
                (TokenType::OR, "or"),
                (TokenType::IDENTIFIER, "_tmp1"),
                (TokenType::THIS, "this"),
                (TokenType::SUPER, "super"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_04_comments_and_lines() {
        let source = "var a; // the rest is ignored ( { \"\nprint a;";
        let (tokens, errors) = Scanner::new(source).scan_tokens();

        assert!(errors.is_empty());

        let lines: Vec<usize> = tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 1, 1, 2, 2, 2, 2]);
        assert_eq!(tokens[3].token_type, TokenType::PRINT);
    }

    #[test]
    fn test_scanner_05_literals() {
        let (tokens, errors) = Scanner::new("\"hi there\" 12 3.25 7.").scan_tokens();

        assert!(errors.is_empty());

        match &tokens[0].token_type {
            TokenType::STRING(s) => assert_eq!(s, "hi there"),
            other => panic!("expected STRING, got {:?}", other),
        }
        assert_eq!(tokens[0].lexeme, "\"hi there\"");

        match tokens[1].token_type {
            TokenType::NUMBER(n) => assert_eq!(n, 12.0),
            ref other => panic!("expected NUMBER, got {:?}", other),
        }
        match tokens[2].token_type {
            TokenType::NUMBER(n) => assert_eq!(n, 3.25),
            ref other => panic!("expected NUMBER, got {:?}", other),
        }

        // No trailing-dot numbers: `7.` is NUMBER then DOT.
        assert_eq!(tokens[3].lexeme, "7");
        assert_eq!(tokens[4].token_type, TokenType::DOT);
    }

    #[test]
    fn test_scanner_06_number_values_survive_restringification() {
        for lexeme in ["0", "7", "42", "1234567", "3.5", "0.125", "10.75"] {
            let (tokens, _) = Scanner::new(lexeme).scan_tokens();

            let TokenType::NUMBER(n) = tokens[0].token_type else {
                panic!("{} did not scan as a number", lexeme);
            };

            let printed = rox::value::Value::Number(n).to_string();
            assert_eq!(printed.parse::<f64>().unwrap(), n, "lexeme {}", lexeme);
        }
    }

    #[test]
    fn test_scanner_07_multiline_string_advances_line() {
        let (tokens, errors) = Scanner::new("\"a\nb\"\nx").scan_tokens();

        assert!(errors.is_empty());
        assert_eq!(tokens[1].lexeme, "x");
        assert_eq!(tokens[1].line, 3);
    }

    #[test]
    fn test_unterminated_string_is_reported_and_scanning_finishes() {
        let (tokens, errors) = Scanner::new("print \"oops").scan_tokens();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "[line 1] Error: Unterminated string.");
        assert_eq!(tokens.last().map(|t| t.token_type.clone()), Some(TokenType::EOF));
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let source = ",.$(#";
        let scanner = Scanner::new(source);

        let results: Vec<_> = scanner.collect();

        // 0: COMMA ','
        // 1: DOT '.'
        // 2: Error for '$'
        // 3: LEFT_PAREN '('
        // 4: Error for '#'
        // 5: EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let error_count = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(error_count, 2, "Expected 2 error messages");

        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(
                err.to_string().contains("Unexpected character"),
                "Error message should contain 'Unexpected character', got: {}",
                err
            );
        }

        fn assert_token_matches(
            result: &Result<Token, LoxError>,
            expected_type: TokenType,
            expected_lexeme: &str,
        ) {
            match result {
                Ok(token) => {
                    assert_eq!(
                        token.token_type, expected_type,
                        "Expected token type {:?}, got {:?}",
                        expected_type, token.token_type
                    );
                    assert_eq!(
                        token.lexeme, expected_lexeme,
                        "Expected lexeme '{}', got '{}'",
                        expected_lexeme, token.lexeme
                    );
                }
                Err(e) => panic!("Expected token but got error: {}", e),
            }
        }
    }

    #[test]
    fn test_non_ascii_character_is_one_error() {
        let (tokens, errors) = Scanner::new("é;").scan_tokens();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "[line 1] Error: Unexpected character: é");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].token_type, TokenType::SEMICOLON);
    }

    #[test]
    fn test_token_display_matches_tokenize_format() {
        let (tokens, _) = Scanner::new("var x = 12.5 + 3; \"s\"").scan_tokens();
        let printed: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();

        assert_eq!(
            printed,
            vec![
                "VAR var null",
                "IDENTIFIER x null",
                "EQUAL = null",
                "NUMBER 12.5 12.5",
                "PLUS + null",
                "NUMBER 3 3.0",
                "SEMICOLON ; null",
                "STRING \"s\" s",
                "EOF  null",
            ]
        );
    }
}
