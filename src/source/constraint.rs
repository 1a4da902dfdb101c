//! Build-constraint evaluation for the strict inclusion configuration.
//!
//! A file is excluded when its name carries a `_GOOS`/`_GOARCH` suffix for
//! another platform, or when its `//go:build` (or legacy `// +build`)
//! constraint is not satisfied by the [`BuildContext`].

use super::scan::FileHeader;

const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js", "linux",
    "nacl", "netbsd", "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "arm", "arm64", "loong64", "mips", "mipsle", "mips64", "mips64le", "ppc64",
    "ppc64le", "riscv64", "s390x", "sparc64", "wasm",
];

const UNIX_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "linux",
    "netbsd", "openbsd", "solaris",
];

/// The platform and tags a strict load is evaluated against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildContext {
    /// Target operating system, Go naming (`linux`, `darwin`, ...).
    pub goos: String,
    /// Target architecture, Go naming (`amd64`, `arm64`, ...).
    pub goarch: String,
    /// Additional satisfied tags.
    pub tags: Vec<String>,
}

impl BuildContext {
    /// The context of the machine glock runs on.
    #[must_use]
    pub fn host(tags: Vec<String>) -> Self {
        let goos = match std::env::consts::OS {
            "macos" => "darwin",
            other => other,
        };
        let goarch = match std::env::consts::ARCH {
            "x86_64" => "amd64",
            "x86" => "386",
            "aarch64" => "arm64",
            "powerpc64" => "ppc64",
            "loongarch64" => "loong64",
            other => other,
        };
        Self {
            goos: goos.to_owned(),
            goarch: goarch.to_owned(),
            tags,
        }
    }

    /// Whether a single tag is satisfied.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        tag == self.goos
            || tag == self.goarch
            || tag == "gc"
            || tag == "cgo"
            || (tag == "unix" && UNIX_OS.contains(&self.goos.as_str()))
            || (self.goos == "android" && tag == "linux")
            || (self.goos == "ios" && tag == "darwin")
            || (self.goos == "illumos" && tag == "solaris")
            || tag.strip_prefix("go1.").is_some_and(|v| v.parse::<u32>().is_ok())
            || self.tags.iter().any(|t| t == tag)
    }

    /// Whether a file name's `_GOOS`/`_GOARCH` suffix admits this platform.
    #[must_use]
    pub fn matches_file_name(&self, name: &str) -> bool {
        let stem = name.strip_suffix(".go").unwrap_or(name);
        let stem = stem.strip_suffix("_test").unwrap_or(stem);
        let parts: Vec<&str> = stem.split('_').collect();
        let n = parts.len();
        if n >= 3 && KNOWN_OS.contains(&parts[n - 2]) && KNOWN_ARCH.contains(&parts[n - 1]) {
            return self.has_tag(parts[n - 2]) && self.has_tag(parts[n - 1]);
        }
        if n >= 2 && (KNOWN_OS.contains(&parts[n - 1]) || KNOWN_ARCH.contains(&parts[n - 1])) {
            return self.has_tag(parts[n - 1]);
        }
        true
    }

    /// Whether a scanned header's constraints admit this platform.
    ///
    /// `//go:build` takes precedence over `// +build` lines. An unparsable
    /// expression excludes the file.
    #[must_use]
    pub fn matches_header(&self, header: &FileHeader) -> bool {
        if let Some(expr) = &header.go_build {
            return Expr::parse(expr).is_some_and(|e| e.eval(&|t| self.has_tag(t)));
        }
        header
            .plus_build
            .iter()
            .all(|line| self.matches_plus_build(line))
    }

    /// `// +build a,b c` means `(a AND b) OR c`.
    fn matches_plus_build(&self, line: &str) -> bool {
        line.split_whitespace().any(|clause| {
            clause.split(',').all(|term| match term.strip_prefix('!') {
                Some(tag) => !self.has_tag(tag),
                None => self.has_tag(term),
            })
        })
    }
}

// ---------------------------------------------------------------------------
// //go:build expressions
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq)]
enum Expr {
    Tag(String),
    Not(Box<Self>),
    And(Box<Self>, Box<Self>),
    Or(Box<Self>, Box<Self>),
}

#[derive(Debug, PartialEq, Eq)]
enum Token {
    Ident(String),
    Not,
    And,
    Or,
    Open,
    Close,
}

impl Expr {
    fn parse(src: &str) -> Option<Self> {
        let tokens = tokenize(src)?;
        let mut pos = 0;
        let expr = parse_or(&tokens, &mut pos)?;
        (pos == tokens.len()).then_some(expr)
    }

    fn eval(&self, has: &dyn Fn(&str) -> bool) -> bool {
        match self {
            Self::Tag(t) => has(t),
            Self::Not(e) => !e.eval(has),
            Self::And(a, b) => a.eval(has) && b.eval(has),
            Self::Or(a, b) => a.eval(has) || b.eval(has),
        }
    }
}

fn tokenize(src: &str) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = src.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '!' => {
                chars.next();
                tokens.push(Token::Not);
            }
            '(' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Token::Close);
            }
            '&' | '|' => {
                chars.next();
                if chars.next() != Some(c) {
                    return None;
                }
                tokens.push(if c == '&' { Token::And } else { Token::Or });
            }
            c if c.is_alphanumeric() || c == '_' || c == '.' => {
                let mut ident = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' || c == '.' {
                        ident.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(ident));
            }
            _ => return None,
        }
    }
    Some(tokens)
}

fn parse_or(tokens: &[Token], pos: &mut usize) -> Option<Expr> {
    let mut left = parse_and(tokens, pos)?;
    while tokens.get(*pos) == Some(&Token::Or) {
        *pos += 1;
        let right = parse_and(tokens, pos)?;
        left = Expr::Or(Box::new(left), Box::new(right));
    }
    Some(left)
}

fn parse_and(tokens: &[Token], pos: &mut usize) -> Option<Expr> {
    let mut left = parse_unary(tokens, pos)?;
    while tokens.get(*pos) == Some(&Token::And) {
        *pos += 1;
        let right = parse_unary(tokens, pos)?;
        left = Expr::And(Box::new(left), Box::new(right));
    }
    Some(left)
}

fn parse_unary(tokens: &[Token], pos: &mut usize) -> Option<Expr> {
    match tokens.get(*pos)? {
        Token::Not => {
            *pos += 1;
            Some(Expr::Not(Box::new(parse_unary(tokens, pos)?)))
        }
        Token::Open => {
            *pos += 1;
            let inner = parse_or(tokens, pos)?;
            if tokens.get(*pos) != Some(&Token::Close) {
                return None;
            }
            *pos += 1;
            Some(inner)
        }
        Token::Ident(name) => {
            *pos += 1;
            Some(Expr::Tag(name.clone()))
        }
        _ => None,
    }
}
