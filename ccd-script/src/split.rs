//! Splits a blob of Lua source into one self-contained unit per named
//! `function ... end` block.
//!
//! This is a lexical scan, not a parser. The body is matched lazily up to the
//! first `end` that follows it, so a nested `function`/`if`/`for` block ends the
//! outer function early and the remainder of the outer body is left unmatched.
//! The same holds for `end` appearing inside an identifier such as `send`.

use std::sync::OnceLock;

use regex::Regex;

static FUNCTION_PATTERN: OnceLock<Regex> = OnceLock::new();

fn function_pattern() -> &'static Regex {
    FUNCTION_PATTERN.get_or_init(|| {
        Regex::new(r"(?s)function\s+([\w.]+)\s*\((.*?)\)\s*(.*?)\s*end")
            .unwrap_or_else(|err| panic!("function pattern must compile: {err}"))
    })
}

/// One extracted function plus a trailing call to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptUnit {
    /// Last dot-separated segment of the declared name.
    pub name: String,
    /// Full declared name as written, e.g. `turtle.util.refuel`.
    pub declared_name: String,
    pub code: String,
}

impl ScriptUnit {
    pub fn file_name(&self) -> String {
        crate::naming::unit_file_name(&self.name)
    }
}

/// Returns every `function name(args) body end` block in source order.
///
/// An empty result means the input has no extractable functions and should be
/// written out whole instead.
pub fn split_functions(source: &str) -> Vec<ScriptUnit> {
    function_pattern()
        .captures_iter(source)
        .map(|captures| {
            let declared_name = captures
                .get(1)
                .map(|m| m.as_str().trim())
                .unwrap_or_default();
            let args = captures
                .get(2)
                .map(|m| m.as_str().trim())
                .unwrap_or_default();
            let body = captures
                .get(3)
                .map(|m| m.as_str().trim())
                .unwrap_or_default();
            let name = declared_name
                .rsplit('.')
                .next()
                .unwrap_or(declared_name)
                .to_string();
            let code = format!("function {declared_name}({args})\n{body}\nend\n\n{name}()\n");
            ScriptUnit {
                name,
                declared_name: declared_name.to_string(),
                code,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_function_is_reformatted_with_call() {
        let units = split_functions("function foo() print(1) end");
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].name, "foo");
        assert_eq!(units[0].code, "function foo()\nprint(1)\nend\n\nfoo()\n");
    }

    #[test]
    fn dotted_name_keeps_last_segment() {
        let units = split_functions("function mod.sub.bar(x, y)\n  return x\nend");
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].name, "bar");
        assert_eq!(units[0].declared_name, "mod.sub.bar");
        assert!(units[0].code.starts_with("function mod.sub.bar(x, y)\n"));
        assert!(units[0].code.ends_with("\nbar()\n"));
    }

    #[test]
    fn whitespace_only_input_has_no_units() {
        assert!(split_functions("").is_empty());
        assert!(split_functions("   \n\t ").is_empty());
        assert!(split_functions("print('hello')\nsleep(1)").is_empty());
    }
}
