//! Judge language tag to file extension

/// Extension used when a language tag is not in the table.
pub const FALLBACK_EXTENSION: &str = "txt";

/// Map a judge language tag (e.g. `python3`) to a file extension.
pub fn extension_for(lang: &str) -> &'static str {
    match lang.to_lowercase().as_str() {
        "python" | "python3" | "pythondata" => "py",
        "cpp" | "c++" => "cpp",
        "java" => "java",
        "c" => "c",
        "csharp" | "c#" => "cs",
        "javascript" => "js",
        "typescript" => "ts",
        "ruby" => "rb",
        "golang" | "go" => "go",
        "kotlin" => "kt",
        "swift" => "swift",
        "rust" => "rs",
        "scala" => "scala",
        "php" => "php",
        "dart" => "dart",
        "elixir" => "ex",
        "erlang" => "erl",
        "racket" => "rkt",
        "mysql" | "mssql" | "oraclesql" | "postgresql" => "sql",
        "bash" => "sh",
        _ => FALLBACK_EXTENSION,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("python3", "py")]
    #[case("python", "py")]
    #[case("cpp", "cpp")]
    #[case("golang", "go")]
    #[case("csharp", "cs")]
    #[case("Rust", "rs")]
    #[case("mysql", "sql")]
    fn known_languages(#[case] lang: &str, #[case] expected: &str) {
        assert_eq!(extension_for(lang), expected);
    }

    #[test]
    fn unknown_language_falls_back_to_text() {
        assert_eq!(extension_for("brainfuck"), FALLBACK_EXTENSION);
        assert_eq!(extension_for(""), FALLBACK_EXTENSION);
    }
}
