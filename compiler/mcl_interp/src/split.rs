//! Splits a decoded string literal's body into literal and `${...}`
//! expression segments.

/// One piece of an interpolated string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    /// Plain text copied verbatim into the rewritten tree.
    Literal(String),
    /// The raw source text found between `${` and its matching `}`.
    Expr(String),
}

/// Splits `s` on `${...}` boundaries.
///
/// Brace depth inside an expression segment is tracked with a small
/// quote-aware scanner, so a nested string literal's own `{`/`}` (e.g.
/// `${f("}")}`) does not end the segment early. It does not otherwise
/// re-lex the nested text; `Expr` segments are handed to `mcl_parse`
/// unmodified by the caller.
///
/// Returns the byte offset of the unmatched `${` on failure.
pub fn split_interpolated(s: &str) -> Result<Vec<Segment>, usize> {
    let chars: Vec<char> = s.chars().collect();
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '$' && chars.get(i + 1) == Some(&'{') {
            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            let open_at = i;
            let start = i + 2;
            let mut depth = 1usize;
            let mut in_string = false;
            let mut j = start;
            while j < chars.len() && depth > 0 {
                let c = chars[j];
                if in_string {
                    if c == '\\' {
                        j += 1;
                    } else if c == '"' {
                        in_string = false;
                    }
                } else {
                    match c {
                        '"' => in_string = true,
                        '{' => depth += 1,
                        '}' => depth -= 1,
                        _ => {}
                    }
                }
                j += 1;
            }
            if depth != 0 {
                return Err(open_at);
            }
            let inner: String = chars[start..j - 1].iter().collect();
            segments.push(Segment::Expr(inner));
            i = j;
        } else {
            literal.push(chars[i]);
            i += 1;
        }
    }
    if !literal.is_empty() || segments.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_one_literal_segment() {
        assert_eq!(
            split_interpolated("hello").unwrap(),
            vec![Segment::Literal("hello".to_string())]
        );
    }

    #[test]
    fn splits_literal_and_expr_segments() {
        let segments = split_interpolated("hi ${name}!").unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::Literal("hi ".to_string()),
                Segment::Expr("name".to_string()),
                Segment::Literal("!".to_string()),
            ]
        );
    }

    #[test]
    fn leading_expr_with_no_preceding_literal() {
        let segments = split_interpolated("${x}").unwrap();
        assert_eq!(segments, vec![Segment::Expr("x".to_string())]);
    }

    #[test]
    fn dotted_path_expr() {
        let segments = split_interpolated("${pkg.foo.bar}").unwrap();
        assert_eq!(segments, vec![Segment::Expr("pkg.foo.bar".to_string())]);
    }

    #[test]
    fn nested_braces_in_expr_are_balanced() {
        let segments = split_interpolated("${struct{a: 1}.a}").unwrap();
        assert_eq!(
            segments,
            vec![Segment::Expr("struct{a: 1}.a".to_string())]
        );
    }

    #[test]
    fn quoted_brace_inside_expr_does_not_close_early() {
        let segments = split_interpolated(r#"${f("}")}"#).unwrap();
        assert_eq!(segments, vec![Segment::Expr(r#"f("}")"#.to_string())]);
    }

    #[test]
    fn unterminated_expr_reports_open_brace_offset() {
        let err = split_interpolated("hi ${name").unwrap_err();
        assert_eq!(err, 3);
    }

    #[test]
    fn multiple_interpolations_in_one_string() {
        let segments = split_interpolated("${a}-${b}").unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::Expr("a".to_string()),
                Segment::Literal("-".to_string()),
                Segment::Expr("b".to_string()),
            ]
        );
    }
}
