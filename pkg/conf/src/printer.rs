use std::fmt::Write;

use crate::value::{Member, Value};

/// Serializes a value tree on one line.
pub fn print(value: &Value) -> String {
    run(value, None)
}

/// Serializes a value tree in the human-editable form: CRLF newlines, one
/// tab per nesting level and a blank line after members whose value ended
/// as a non-empty object or array.
pub fn print_pretty(value: &Value) -> String {
    run(value, Some(PrettyState::default()))
}

#[derive(Default, Clone)]
struct PrettyState {
    level: usize,
    more_space: bool,
}

const NEWLINE: &str = "\r\n";

/// The write pass runs over a buffer pre-sized by an identical length pass,
/// so serialization never reallocates.
fn run(value: &Value, pretty: Option<PrettyState>) -> String {
    let mut measure = pretty.clone();
    let len = value_length(value, &mut measure);

    let mut out = String::with_capacity(len);
    let mut state = pretty;
    write_value(&mut out, value, &mut state);
    debug_assert_eq!(out.len(), len);

    out
}

fn value_length(value: &Value, pretty: &mut Option<PrettyState>) -> usize {
    match value {
        Value::Null => 4,
        Value::Bool(true) => 4,
        Value::Bool(false) => 5,
        Value::Integer(v) => integer_length(*v),
        Value::Short(s) => string_length(s.as_str()),
        Value::String(s) => string_length(s),
        Value::Array(elements) => array_length(elements, pretty),
        Value::Object(members) => object_length(members, pretty),
    }
}

fn write_value(out: &mut String, value: &Value, pretty: &mut Option<PrettyState>) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Integer(v) => {
            write!(out, "{}", v).unwrap();
        }
        Value::Short(s) => write_string(out, s.as_str()),
        Value::String(s) => write_string(out, s),
        Value::Array(elements) => write_array(out, elements, pretty),
        Value::Object(members) => write_object(out, members, pretty),
    }
}

fn integer_length(v: i64) -> usize {
    let mut len = if v < 0 { 1 } else { 0 };
    let mut u = v.unsigned_abs();
    loop {
        len += 1;
        u /= 10;
        if u == 0 {
            return len;
        }
    }
}

fn string_length(s: &str) -> usize {
    let mut len = 2;
    for c in s.chars() {
        len += match c {
            '"' | '\\' => 2,
            '\x08' | '\x0C' | '\n' | '\r' | '\t' => 2,
            c if (c as u32) < 0x20 => 6,
            c => c.len_utf8(),
        };
    }
    len
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        if (c as u32) >= 0x20 && c != '"' && c != '\\' {
            out.push(c);
            continue;
        }
        match c {
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\x08' => out.push_str("\\b"),
            '\x0C' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => {
                write!(out, "\\u00{:02X}", c as u32).unwrap();
            }
        }
    }
    out.push('"');
}

fn object_length(members: &[Member], pretty: &mut Option<PrettyState>) -> usize {
    let mut len = 2;
    if members.is_empty() {
        return len;
    }

    if let Some(p) = pretty.as_mut() {
        len += NEWLINE.len();
        p.level += 1;
    }

    for (i, member) in members.iter().enumerate() {
        if i != 0 {
            len += 1;
            if let Some(p) = pretty.as_mut() {
                len += NEWLINE.len();
                if p.more_space {
                    p.more_space = false;
                    len += NEWLINE.len();
                }
            }
        }

        if let Some(p) = pretty.as_ref() {
            len += p.level;
        }
        len += string_length(member.name()) + 1;
        if pretty.is_some() {
            len += 1;
        }
        len += value_length(&member.value(), pretty);
    }

    if let Some(p) = pretty.as_mut() {
        len += NEWLINE.len();
        p.level -= 1;
        len += p.level;
        p.more_space = true;
    }

    len
}

fn write_object(out: &mut String, members: &[Member], pretty: &mut Option<PrettyState>) {
    out.push('{');
    if members.is_empty() {
        out.push('}');
        return;
    }

    if let Some(p) = pretty.as_mut() {
        out.push_str(NEWLINE);
        p.level += 1;
    }

    for (i, member) in members.iter().enumerate() {
        if i != 0 {
            out.push(',');
            if let Some(p) = pretty.as_mut() {
                out.push_str(NEWLINE);
                if p.more_space {
                    p.more_space = false;
                    out.push_str(NEWLINE);
                }
            }
        }

        if let Some(p) = pretty.as_ref() {
            indentation(out, p.level);
        }
        write_string(out, member.name());
        out.push(':');
        if pretty.is_some() {
            out.push(' ');
        }
        write_value(out, &member.value(), pretty);
    }

    if let Some(p) = pretty.as_mut() {
        out.push_str(NEWLINE);
        p.level -= 1;
        indentation(out, p.level);
        p.more_space = true;
    }

    out.push('}');
}

fn array_length(elements: &[Value], pretty: &mut Option<PrettyState>) -> usize {
    let mut len = 2;
    if elements.is_empty() {
        return len;
    }

    if let Some(p) = pretty.as_mut() {
        len += NEWLINE.len();
        p.level += 1;
    }

    for (i, element) in elements.iter().enumerate() {
        if i != 0 {
            len += 1;
            if let Some(p) = pretty.as_mut() {
                len += NEWLINE.len();
                if p.more_space {
                    p.more_space = false;
                    len += NEWLINE.len();
                }
            }
        }

        if let Some(p) = pretty.as_ref() {
            len += p.level;
        }
        len += value_length(element, pretty);
    }

    if let Some(p) = pretty.as_mut() {
        len += NEWLINE.len();
        p.level -= 1;
        len += p.level;
        p.more_space = true;
    }

    len
}

fn write_array(out: &mut String, elements: &[Value], pretty: &mut Option<PrettyState>) {
    out.push('[');
    if elements.is_empty() {
        out.push(']');
        return;
    }

    if let Some(p) = pretty.as_mut() {
        out.push_str(NEWLINE);
        p.level += 1;
    }

    for (i, element) in elements.iter().enumerate() {
        if i != 0 {
            out.push(',');
            if let Some(p) = pretty.as_mut() {
                out.push_str(NEWLINE);
                if p.more_space {
                    p.more_space = false;
                    out.push_str(NEWLINE);
                }
            }
        }

        if let Some(p) = pretty.as_ref() {
            indentation(out, p.level);
        }
        write_value(out, element, pretty);
    }

    if let Some(p) = pretty.as_mut() {
        out.push_str(NEWLINE);
        p.level -= 1;
        indentation(out, p.level);
        p.more_space = true;
    }

    out.push(']');
}

fn indentation(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push('\t');
    }
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;

    use super::*;
    use crate::parser::parse;

    #[test]
    fn plain_roundtrip() {
        let arena = Bump::new();
        let inputs: &[&str] = &[
            r#"{"a":1,"b":[2,3]}"#,
            r#"{}"#,
            r#"[]"#,
            r#"[-9223372036854775808,9223372036854775807,0]"#,
            r#"{"s":"x","nested":{"t":[true,false,null]}}"#,
        ];
        for input in inputs {
            let v = parse(&arena, input.as_bytes()).unwrap();
            assert_eq!(print(&v), *input);
        }
    }

    #[test]
    fn escapes() {
        let arena = Bump::new();
        let v = parse(&arena, b"\"q\\\"b\\\\n\\n\\u0001\"").unwrap();
        assert_eq!(print(&v), "\"q\\\"b\\\\n\\n\\u0001\"");
    }

    #[test]
    fn pretty_simple() {
        let arena = Bump::new();
        let v = parse(&arena, br#"{"a":1,"b":[2,3]}"#).unwrap();
        assert_eq!(
            print_pretty(&v),
            "{\r\n\t\"a\": 1,\r\n\t\"b\": [\r\n\t\t2,\r\n\t\t3\r\n\t]\r\n}"
        );
    }

    #[test]
    fn pretty_blank_line_after_nested() {
        let arena = Bump::new();
        let v = parse(&arena, br#"{"a":{"x":1},"b":2}"#).unwrap();
        assert_eq!(
            print_pretty(&v),
            "{\r\n\t\"a\": {\r\n\t\t\"x\": 1\r\n\t},\r\n\r\n\t\"b\": 2\r\n}"
        );
    }

    #[test]
    fn pretty_empty_aggregates_stay_inline() {
        let arena = Bump::new();
        let v = parse(&arena, br#"{"a":{},"b":[]}"#).unwrap();
        assert_eq!(
            print_pretty(&v),
            "{\r\n\t\"a\": {},\r\n\t\"b\": []\r\n}"
        );
    }

    #[test]
    fn length_pass_is_exact() {
        let arena = Bump::new();
        let inputs: &[&str] = &[
            r#"{"a":1,"b":[2,3],"c":{"d":{}},"e":""}"#,
            r#"[[1],[2],{"x":[true]}]"#,
            r#"-42"#,
        ];
        for input in inputs {
            let v = parse(&arena, input.as_bytes()).unwrap();

            let mut measure = None;
            assert_eq!(value_length(&v, &mut measure), print(&v).len());

            let mut measure = Some(PrettyState::default());
            assert_eq!(value_length(&v, &mut measure), print_pretty(&v).len());
        }
    }
}
