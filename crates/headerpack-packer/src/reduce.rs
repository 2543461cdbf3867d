//! Whitespace Reducer
//!
//! Shrinks preprocessor output: drops line markers, trims lines and collapses
//! blank-line runs. Purely textual and idempotent.

use headerpack_core::config::ReduceConfig;
use once_cell::sync::Lazy;
use regex::Regex;

/// Matches a preprocessor line marker at the end of a line, e.g.
/// `# 12 "include/foo.h" 2 3`, capturing whatever precedes it.
static LINE_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(.*?)#\s*(?:line\s+)?[0-9]+\s+"[^"]*"(?:\s+[0-9]+)*\s*$"#).unwrap()
});

/// Whitespace reducer
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceReducer {
    config: ReduceConfig,
}

impl WhitespaceReducer {
    pub fn new(config: ReduceConfig) -> Self {
        Self { config }
    }

    /// Reduce the given text
    pub fn reduce(&self, text: &str) -> String {
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        let mut out = String::with_capacity(normalized.len());
        let mut pending_blanks = 0usize;
        let mut started = false;

        for raw_line in normalized.split('\n') {
            let line = self.strip_markers(self.trim(raw_line));

            if line.is_empty() {
                if started {
                    pending_blanks += 1;
                }
                continue;
            }

            for _ in 0..pending_blanks.min(self.config.max_blank_lines) {
                out.push('\n');
            }
            pending_blanks = 0;
            started = true;

            out.push_str(line);
            out.push('\n');
        }

        out
    }

    fn trim<'a>(&self, line: &'a str) -> &'a str {
        if self.config.trim_leading {
            line.trim()
        } else {
            line.trim_end()
        }
    }

    /// Remove trailing line markers until none is left
    fn strip_markers<'a>(&self, mut line: &'a str) -> &'a str {
        while let Some(captures) = LINE_MARKER_RE.captures(line) {
            let prefix = captures.get(1).map_or("", |m| m.as_str());
            line = self.trim(prefix);
        }
        line
    }
}

/// Reduce text with the given configuration
pub fn reduce_whitespace(text: &str, config: ReduceConfig) -> String {
    WhitespaceReducer::new(config).reduce(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config(max_blank_lines: usize, trim_leading: bool) -> ReduceConfig {
        ReduceConfig {
            max_blank_lines,
            trim_leading,
        }
    }

    const CLANG_OUTPUT: &str = r#"# 1 "/tmp/headerpack-x.hpp"
# 1 "<built-in>" 1
# 1 "<built-in>" 3
# 400 "<built-in>" 3
# 1 "<command line>" 1
# 1 "<built-in>" 2
# 1 "/tmp/headerpack-x.hpp" 2


namespace model {
    class Value {
      public:
        int size() const;
    };



}
int a; # 7 "/tmp/headerpack-x.hpp"
"#;

    #[test]
    fn test_default_reduction_matches_packer_behaviour() {
        let reduced = reduce_whitespace(CLANG_OUTPUT, ReduceConfig::default());

        assert_eq!(
            reduced,
            "namespace model {\nclass Value {\npublic:\nint size() const;\n};\n}\nint a;\n"
        );
    }

    #[test]
    fn test_collapse_to_single_blank_line_keeping_indentation() {
        let reduced = reduce_whitespace(CLANG_OUTPUT, config(1, false));

        assert_eq!(
            reduced,
            "namespace model {\n    class Value {\n      public:\n        int size() const;\n    };\n\n}\nint a;\n"
        );
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            CLANG_OUTPUT,
            "",
            "\n\n\n",
            "a\r\n\r\n\r\nb\rc   \n",
            "x # 1 \"a.h\" # 2 \"b.h\"\n",
            "\t\tint x;\t\n\n\n\t\n  int y;",
        ];

        for max_blank_lines in 0..3 {
            for trim_leading in [true, false] {
                let cfg = config(max_blank_lines, trim_leading);
                for input in inputs {
                    let once = reduce_whitespace(input, cfg);
                    let twice = reduce_whitespace(&once, cfg);
                    assert_eq!(once, twice, "input {:?} with {:?}", input, cfg);
                }
            }
        }
    }

    #[test]
    fn test_nested_markers_are_all_removed() {
        let reduced = reduce_whitespace("x # 1 \"a.h\" # 2 \"b.h\" 1\n", ReduceConfig::default());
        assert_eq!(reduced, "x\n");
    }

    #[test]
    fn test_line_endings_are_normalized() {
        let reduced = reduce_whitespace("a\r\nb\rc", ReduceConfig::default());
        assert_eq!(reduced, "a\nb\nc\n");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(reduce_whitespace("", ReduceConfig::default()), "");
        assert_eq!(reduce_whitespace("  \n\t\n", config(1, false)), "");
    }

    #[test]
    fn test_directives_that_are_not_markers_survive() {
        let input = "#pragma once\n#define WIDTH 80\n";
        assert_eq!(reduce_whitespace(input, ReduceConfig::default()), input);
    }
}
