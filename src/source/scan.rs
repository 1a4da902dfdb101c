//! Header scanning for Go source files.
//!
//! Only the part of a file before the first declaration matters: build
//! constraint comments, the package clause, and the import declarations.

use std::sync::LazyLock;

use regex::Regex;

static IMPORT_SINGLE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r#"^import\s+(?:[\w.]+\s+)?["`]([^"`]+)["`]"#).unwrap()
});

static IMPORT_SPEC: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r#"^(?:[\w.]+\s+)?["`]([^"`]+)["`]"#).unwrap()
});

static PACKAGE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^package\s+(\w+)").unwrap()
});

/// What the header of one source file declares.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileHeader {
    /// The package clause name.
    pub package: Option<String>,
    /// Imported paths, in declaration order.
    pub imports: Vec<String>,
    /// Expression of a `//go:build` line, if any.
    pub go_build: Option<String>,
    /// Bodies of `// +build` lines.
    pub plus_build: Vec<String>,
}

/// Scan the header of a Go source file.
#[must_use]
pub fn parse_header(src: &str) -> FileHeader {
    let mut header = FileHeader::default();
    let mut in_block_comment = false;
    let mut in_import_group = false;

    for raw in src.lines() {
        let mut rest = raw.trim();
        if in_block_comment {
            match rest.find("*/") {
                Some(end) => {
                    in_block_comment = false;
                    rest = &rest[end + 2..];
                }
                None => continue,
            }
        }
        let (code, opens_block) = strip_block_comments(rest);
        in_block_comment = opens_block;
        let line = code.trim();

        if header.package.is_none() {
            if let Some(expr) = line.strip_prefix("//go:build ") {
                header.go_build = Some(expr.trim().to_owned());
            } else if let Some(body) = line.strip_prefix("// +build ") {
                header.plus_build.push(body.trim().to_owned());
            } else if let Some(caps) = PACKAGE.captures(line) {
                header.package = Some(caps[1].to_owned());
            }
            continue;
        }

        let line = strip_line_comment(line);
        if line.is_empty() {
            continue;
        }

        if in_import_group {
            if line.starts_with(')') {
                in_import_group = false;
            } else if let Some(caps) = IMPORT_SPEC.captures(line) {
                header.imports.push(caps[1].to_owned());
            }
            continue;
        }

        if line.starts_with("import") {
            let rest = line["import".len()..].trim_start();
            if rest.starts_with('(') {
                in_import_group = true;
                // `import ("fmt")` on one line.
                let inner = rest[1..].trim();
                if let Some(caps) = IMPORT_SPEC.captures(inner) {
                    header.imports.push(caps[1].to_owned());
                }
                if inner.ends_with(')') {
                    in_import_group = false;
                }
            } else if let Some(caps) = IMPORT_SINGLE.captures(line) {
                header.imports.push(caps[1].to_owned());
            }
            continue;
        }

        // First declaration ends the header.
        break;
    }
    header
}

/// Remove `/* ... */` spans from one line.
///
/// Returns the remaining code and whether an unterminated block comment
/// starts on this line.
fn strip_block_comments(line: &str) -> (String, bool) {
    let mut code = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(start) = rest.find("/*") {
        code.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => {
                code.push(' ');
                rest = &rest[start + 2 + end + 2..];
            }
            None => return (code, true),
        }
    }
    code.push_str(rest);
    (code, false)
}

fn strip_line_comment(line: &str) -> &str {
    // Import paths never contain `//`, so a plain split is safe here.
    line.find("//").map_or(line, |idx| &line[..idx]).trim()
}
