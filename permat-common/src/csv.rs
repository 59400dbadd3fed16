//! CSV parsing and writing primitives
//!
//! The admin surfaces exchange CSV with spreadsheet tools. Fields are always
//! double-quoted on export (embedded quotes doubled); on import a field may
//! be quoted or bare and may contain literal commas and quotes inside a
//! quoted region. The parser is a small explicit state machine so the
//! quoting rules stay exactly as the import/export contract requires.

/// Split one CSV line into fields, honoring double-quote escaping.
///
/// # Examples
/// ```
/// use permat_common::csv::parse_line;
///
/// assert_eq!(parse_line(r#""a","b,c","d""e""#), vec!["a", "b,c", "d\"e"]);
/// assert_eq!(parse_line("1,two,3"), vec!["1", "two", "3"]);
/// ```
pub fn parse_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    // Doubled quote inside a quoted field is a literal quote
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
        } else {
            match c {
                '"' => in_quotes = true,
                ',' => fields.push(std::mem::take(&mut field)),
                _ => field.push(c),
            }
        }
    }
    fields.push(field);
    fields
}

/// Parse a whole CSV document into rows, skipping blank lines.
///
/// The header row (when present) is returned as row 0; scenario codecs
/// decide whether to read it or discard it by position.
pub fn parse_rows(text: &str) -> Vec<Vec<String>> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_line)
        .collect()
}

/// Quote a single field for output; embedded double quotes are doubled.
pub fn quote_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Format one data row: every field quoted, comma separated.
pub fn format_row<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|field| quote_field(field.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Normalize a header cell for flexible matching: lowercase, alphanumerics
/// only. `Package_ID`, `packageId` and `package id` all normalize to
/// `packageid`.
pub fn normalize_header(header: &str) -> String {
    header
        .to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_bare_fields() {
        assert_eq!(parse_line("a,b,c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_line_quoted_fields() {
        assert_eq!(parse_line(r#""a","b","c""#), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_line_comma_inside_quotes() {
        assert_eq!(
            parse_line(r#""Reports, Advanced","2""#),
            vec!["Reports, Advanced", "2"]
        );
    }

    #[test]
    fn test_parse_line_escaped_quote() {
        assert_eq!(parse_line(r#""say ""hi""""#), vec![r#"say "hi""#]);
    }

    #[test]
    fn test_parse_line_empty_fields() {
        assert_eq!(parse_line(",,"), vec!["", "", ""]);
        assert_eq!(parse_line(r#""","",""#), vec!["", "", ""]);
    }

    #[test]
    fn test_parse_line_mixed_quoting() {
        assert_eq!(parse_line(r#"1,"two",3"#), vec!["1", "two", "3"]);
    }

    #[test]
    fn test_parse_rows_skips_blank_lines() {
        let rows = parse_rows("a,b\n\n  \nc,d\n");
        assert_eq!(rows, vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn test_parse_rows_handles_crlf() {
        let rows = parse_rows("a,b\r\nc,d\r\n");
        assert_eq!(rows, vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn test_quote_field_doubles_embedded_quotes() {
        assert_eq!(quote_field(r#"say "hi""#), r#""say ""hi""""#);
    }

    #[test]
    fn test_format_row_quotes_everything() {
        assert_eq!(format_row(&["1", "a,b", ""]), r#""1","a,b","""#);
    }

    #[test]
    fn test_format_then_parse_round_trip() {
        let fields = vec!["5", r#"odd "name""#, "x,y", ""];
        let line = format_row(&fields);
        assert_eq!(parse_line(&line), fields);
    }

    #[test]
    fn test_normalize_header_variants() {
        assert_eq!(normalize_header("Package_ID"), "packageid");
        assert_eq!(normalize_header("packageId"), "packageid");
        assert_eq!(normalize_header("package id"), "packageid");
        assert_eq!(normalize_header(" Feature-Code "), "featurecode");
    }
}
