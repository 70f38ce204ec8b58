//! LaTeX math to plain Unicode text.
//!
//! Covers the notation that shows up in prose: Greek letters, operators and relations, arrows,
//! big operators, blackboard/calligraphic/fraktur/bold letters, `\frac`, `\sqrt`, accents,
//! named functions and super/subscripts. Whitespace in the source is insignificant, as in TeX
//! math mode. Anything outside that set is an error so callers can keep the original text.
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MathError {
    #[error("empty expression")]
    Empty,
    #[error("unknown command \\{0}")]
    UnknownCommand(String),
    #[error("unbalanced braces at offset {0}")]
    Unbalanced(usize),
    #[error("{command} is missing an argument")]
    MissingArgument { command: String },
}

/// Converts a LaTeX math expression (without `$` delimiters) to Unicode text.
///
/// ```
/// use textbook_prose::math::to_unicode;
///
/// assert_eq!(to_unicode(r"x^2 + \alpha_i").unwrap(), "x²+αᵢ");
/// assert_eq!(to_unicode(r"\frac{a+b}{2}").unwrap(), "(a+b)/2");
/// assert!(to_unicode(r"\badcmd{").is_err());
/// ```
pub fn to_unicode(latex: &str) -> Result<String, MathError> {
    if latex.trim().is_empty() {
        return Err(MathError::Empty);
    }
    Converter::new(latex).sequence(false)
}

/// One converted unit of input.
struct Atom {
    text: String,
    /// Named functions (`\sin`) want a space before a following letter or digit.
    function: bool,
}

impl Atom {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            function: false,
        }
    }
}

struct Converter {
    chars: Vec<char>,
    pos: usize,
}

impl Converter {
    fn new(src: &str) -> Self {
        Self {
            chars: src.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    /// Converts up to the end of input or, inside a group, up to the matching `}`.
    fn sequence(&mut self, in_group: bool) -> Result<String, MathError> {
        let mut out = String::new();
        let mut after_function = false;
        loop {
            self.skip_ws();
            match self.peek() {
                None if in_group => return Err(MathError::Unbalanced(self.pos)),
                None => break,
                Some('}') if in_group => {
                    self.pos += 1;
                    break;
                }
                Some('}') => return Err(MathError::Unbalanced(self.pos)),
                Some(kind @ ('^' | '_')) => {
                    self.pos += 1;
                    let arg = self.argument(&kind.to_string())?;
                    out.push_str(&script(kind, &arg));
                }
                Some(_) => {
                    let atom = self.atom()?;
                    if after_function && atom.text.starts_with(char::is_alphanumeric) {
                        out.push(' ');
                    }
                    after_function = atom.function;
                    out.push_str(&atom.text);
                }
            }
        }
        Ok(out)
    }

    fn atom(&mut self) -> Result<Atom, MathError> {
        let Some(c) = self.bump() else {
            return Ok(Atom::text(""));
        };
        Ok(match c {
            '{' => Atom::text(self.sequence(true)?),
            '\\' => self.command()?,
            '\'' => Atom::text("′"),
            '~' => Atom::text(" "),
            other => Atom::text(other),
        })
    }

    /// A mandatory argument: one atom or a braced group.
    fn argument(&mut self, command: &str) -> Result<String, MathError> {
        self.skip_ws();
        match self.peek() {
            None | Some('}' | '^' | '_') => Err(MathError::MissingArgument {
                command: command.to_string(),
            }),
            Some(_) => Ok(self.atom()?.text),
        }
    }

    /// The verbatim contents of a braced group, for `\text{...}`.
    fn raw_group(&mut self, command: &str) -> Result<String, MathError> {
        self.skip_ws();
        if self.peek() != Some('{') {
            return self.argument(command);
        }
        let open = self.pos;
        self.pos += 1;
        let mut depth = 1usize;
        let mut out = String::new();
        while let Some(c) = self.bump() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(out);
                    }
                }
                '\\' => {
                    if let Some(escaped) = self.bump() {
                        out.push(escaped);
                    }
                    continue;
                }
                _ => {}
            }
            out.push(c);
        }
        Err(MathError::Unbalanced(open))
    }

    /// `[...]` after `\sqrt`, converted.
    fn optional_bracket(&mut self) -> Result<Option<String>, MathError> {
        self.skip_ws();
        if self.peek() != Some('[') {
            return Ok(None);
        }
        let open = self.pos;
        self.pos += 1;
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == ']' {
                let inner: String = self.chars[start..self.pos].iter().collect();
                self.pos += 1;
                return to_unicode(&inner).map(Some);
            }
            self.pos += 1;
        }
        Err(MathError::Unbalanced(open))
    }

    fn command_name(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            self.pos += 1;
        }
        if self.pos == start {
            return self.bump().map(String::from).unwrap_or_default();
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn command(&mut self) -> Result<Atom, MathError> {
        let name = self.command_name();
        let cmd = format!("\\{name}");

        if let Some(sym) = symbol(&name) {
            return Ok(Atom::text(sym));
        }
        if FUNCTIONS.contains(&name.as_str()) {
            return Ok(Atom {
                text: name,
                function: true,
            });
        }

        let atom = match name.as_str() {
            "frac" | "dfrac" | "tfrac" | "cfrac" => {
                let num = self.argument(&cmd)?;
                let den = self.argument(&cmd)?;
                Atom::text(fraction(&num, &den))
            }
            "binom" | "dbinom" | "tbinom" => {
                let n = self.argument(&cmd)?;
                let k = self.argument(&cmd)?;
                Atom::text(format!("C({n},{k})"))
            }
            "sqrt" => {
                let index = self.optional_bracket()?;
                let radicand = parenthesize(&self.argument(&cmd)?);
                let root = match index.as_deref() {
                    None | Some("2") => "√".to_string(),
                    Some("3") => "∛".to_string(),
                    Some("4") => "∜".to_string(),
                    Some(n) => format!("{}√", script('^', n)),
                };
                Atom::text(format!("{root}{radicand}"))
            }
            "mathbb" => Atom::text(restyle(&self.argument(&cmd)?, double_struck)),
            "mathcal" | "mathscr" => Atom::text(restyle(&self.argument(&cmd)?, script_letter)),
            "mathfrak" => Atom::text(restyle(&self.argument(&cmd)?, fraktur)),
            "mathbf" | "boldsymbol" | "bm" => Atom::text(restyle(&self.argument(&cmd)?, bold)),
            "mathrm" | "mathit" | "mathsf" | "mathtt" => Atom::text(self.argument(&cmd)?),
            "operatorname" => Atom {
                text: self.argument(&cmd)?,
                function: true,
            },
            "text" | "textrm" | "textit" | "textbf" | "textsf" | "texttt" | "mbox" => {
                Atom::text(self.raw_group(&cmd)?)
            }
            "hat" | "widehat" => Atom::text(accent(&self.argument(&cmd)?, '\u{0302}')),
            "bar" | "overline" => Atom::text(accent(&self.argument(&cmd)?, '\u{0305}')),
            "underline" => Atom::text(accent(&self.argument(&cmd)?, '\u{0332}')),
            "vec" | "overrightarrow" => Atom::text(accent(&self.argument(&cmd)?, '\u{20D7}')),
            "dot" => Atom::text(accent(&self.argument(&cmd)?, '\u{0307}')),
            "ddot" => Atom::text(accent(&self.argument(&cmd)?, '\u{0308}')),
            "tilde" | "widetilde" => Atom::text(accent(&self.argument(&cmd)?, '\u{0303}')),
            "left" | "right" | "bigl" | "bigr" | "Bigl" | "Bigr" | "big" | "Big" | "bigg"
            | "Bigg" | "biggl" | "biggr" => {
                self.skip_ws();
                if self.peek() == Some('.') {
                    self.pos += 1;
                }
                Atom::text("")
            }
            "displaystyle" | "textstyle" | "scriptstyle" | "limits" | "nolimits" => {
                Atom::text("")
            }
            _ => return Err(MathError::UnknownCommand(name)),
        };
        Ok(atom)
    }
}

const FUNCTIONS: &[&str] = &[
    "sin", "cos", "tan", "cot", "sec", "csc", "arcsin", "arccos", "arctan", "sinh", "cosh",
    "tanh", "coth", "log", "ln", "lg", "exp", "min", "max", "sup", "inf", "lim", "liminf",
    "limsup", "det", "dim", "gcd", "deg", "arg", "ker", "hom", "Pr", "mod", "bmod", "argmax",
    "argmin",
];

fn symbol(name: &str) -> Option<&'static str> {
    Some(match name {
        "alpha" => "α",
        "beta" => "β",
        "gamma" => "γ",
        "delta" => "δ",
        "epsilon" => "ϵ",
        "varepsilon" => "ε",
        "zeta" => "ζ",
        "eta" => "η",
        "theta" => "θ",
        "vartheta" => "ϑ",
        "iota" => "ι",
        "kappa" => "κ",
        "lambda" => "λ",
        "mu" => "μ",
        "nu" => "ν",
        "xi" => "ξ",
        "omicron" => "ο",
        "pi" => "π",
        "varpi" => "ϖ",
        "rho" => "ρ",
        "varrho" => "ϱ",
        "sigma" => "σ",
        "varsigma" => "ς",
        "tau" => "τ",
        "upsilon" => "υ",
        "phi" => "ϕ",
        "varphi" => "φ",
        "chi" => "χ",
        "psi" => "ψ",
        "omega" => "ω",
        "Gamma" => "Γ",
        "Delta" => "Δ",
        "Theta" => "Θ",
        "Lambda" => "Λ",
        "Xi" => "Ξ",
        "Pi" => "Π",
        "Sigma" => "Σ",
        "Upsilon" => "Υ",
        "Phi" => "Φ",
        "Psi" => "Ψ",
        "Omega" => "Ω",

        "pm" => "±",
        "mp" => "∓",
        "times" => "×",
        "div" => "÷",
        "cdot" => "⋅",
        "ast" => "∗",
        "star" => "⋆",
        "circ" => "∘",
        "bullet" => "∙",
        "oplus" => "⊕",
        "ominus" => "⊖",
        "otimes" => "⊗",
        "oslash" => "⊘",
        "odot" => "⊙",
        "cap" => "∩",
        "cup" => "∪",
        "setminus" => "∖",
        "wedge" | "land" => "∧",
        "vee" | "lor" => "∨",
        "neg" | "lnot" => "¬",

        "leq" | "le" => "≤",
        "geq" | "ge" => "≥",
        "neq" | "ne" => "≠",
        "approx" => "≈",
        "equiv" => "≡",
        "sim" => "∼",
        "simeq" => "≃",
        "cong" => "≅",
        "propto" => "∝",
        "ll" => "≪",
        "gg" => "≫",
        "subset" => "⊂",
        "supset" => "⊃",
        "subseteq" => "⊆",
        "supseteq" => "⊇",
        "in" => "∈",
        "notin" => "∉",
        "ni" => "∋",
        "mid" => "∣",
        "parallel" => "∥",
        "perp" => "⊥",
        "models" => "⊨",
        "vdash" => "⊢",
        "prec" => "≺",
        "succ" => "≻",
        "preceq" => "⪯",
        "succeq" => "⪰",
        "doteq" => "≐",

        "to" | "rightarrow" => "→",
        "leftarrow" | "gets" => "←",
        "leftrightarrow" => "↔",
        "Rightarrow" => "⇒",
        "Leftarrow" => "⇐",
        "Leftrightarrow" => "⇔",
        "implies" => "⟹",
        "impliedby" => "⟸",
        "iff" => "⟺",
        "mapsto" => "↦",
        "longrightarrow" => "⟶",
        "longleftarrow" => "⟵",
        "uparrow" => "↑",
        "downarrow" => "↓",
        "hookrightarrow" => "↪",

        "sum" => "∑",
        "prod" => "∏",
        "coprod" => "∐",
        "int" => "∫",
        "iint" => "∬",
        "iiint" => "∭",
        "oint" => "∮",
        "bigcup" => "⋃",
        "bigcap" => "⋂",
        "bigoplus" => "⨁",
        "bigotimes" => "⨂",
        "bigvee" => "⋁",
        "bigwedge" => "⋀",

        "infty" => "∞",
        "partial" => "∂",
        "nabla" => "∇",
        "forall" => "∀",
        "exists" => "∃",
        "nexists" => "∄",
        "emptyset" | "varnothing" => "∅",
        "aleph" => "ℵ",
        "hbar" => "ℏ",
        "ell" => "ℓ",
        "Re" => "ℜ",
        "Im" => "ℑ",
        "wp" => "℘",
        "angle" => "∠",
        "triangle" => "△",
        "prime" => "′",
        "degree" => "°",
        "surd" => "√",
        "top" => "⊤",
        "bot" => "⊥",
        "cdots" => "⋯",
        "ldots" | "dots" => "…",
        "vdots" => "⋮",
        "ddots" => "⋱",
        "therefore" => "∴",
        "because" => "∵",
        "langle" => "⟨",
        "rangle" => "⟩",
        "lceil" => "⌈",
        "rceil" => "⌉",
        "lfloor" => "⌊",
        "rfloor" => "⌋",
        "vert" | "lvert" | "rvert" => "|",
        "Vert" | "lVert" | "rVert" | "|" => "‖",
        "backslash" => "\\",

        "," | ":" | ";" | " " | "\\" => " ",
        "!" => "",
        "quad" => "  ",
        "qquad" => "    ",

        "{" => "{",
        "}" => "}",
        "$" => "$",
        "%" => "%",
        "&" => "&",
        "_" => "_",
        "#" => "#",
        _ => return None,
    })
}

fn superscript(c: char) -> Option<char> {
    Some(match c {
        '0' => '⁰',
        '1' => '¹',
        '2' => '²',
        '3' => '³',
        '4' => '⁴',
        '5' => '⁵',
        '6' => '⁶',
        '7' => '⁷',
        '8' => '⁸',
        '9' => '⁹',
        '+' => '⁺',
        '-' | '−' => '⁻',
        '=' => '⁼',
        '(' => '⁽',
        ')' => '⁾',
        'a' => 'ᵃ',
        'b' => 'ᵇ',
        'c' => 'ᶜ',
        'd' => 'ᵈ',
        'e' => 'ᵉ',
        'f' => 'ᶠ',
        'g' => 'ᵍ',
        'h' => 'ʰ',
        'i' => 'ⁱ',
        'j' => 'ʲ',
        'k' => 'ᵏ',
        'l' => 'ˡ',
        'm' => 'ᵐ',
        'n' => 'ⁿ',
        'o' => 'ᵒ',
        'p' => 'ᵖ',
        'r' => 'ʳ',
        's' => 'ˢ',
        't' => 'ᵗ',
        'u' => 'ᵘ',
        'v' => 'ᵛ',
        'w' => 'ʷ',
        'x' => 'ˣ',
        'y' => 'ʸ',
        'z' => 'ᶻ',
        'A' => 'ᴬ',
        'B' => 'ᴮ',
        'D' => 'ᴰ',
        'E' => 'ᴱ',
        'G' => 'ᴳ',
        'H' => 'ᴴ',
        'I' => 'ᴵ',
        'J' => 'ᴶ',
        'K' => 'ᴷ',
        'L' => 'ᴸ',
        'M' => 'ᴹ',
        'N' => 'ᴺ',
        'O' => 'ᴼ',
        'P' => 'ᴾ',
        'R' => 'ᴿ',
        'T' => 'ᵀ',
        'U' => 'ᵁ',
        'V' => 'ⱽ',
        'W' => 'ᵂ',
        'α' => 'ᵅ',
        'β' => 'ᵝ',
        'γ' => 'ᵞ',
        'δ' => 'ᵟ',
        'θ' => 'ᶿ',
        'φ' | 'ϕ' => 'ᵠ',
        'χ' => 'ᵡ',
        '′' => '′',
        '∗' | '*' => '*',
        _ => return None,
    })
}

fn subscript(c: char) -> Option<char> {
    Some(match c {
        '0' => '₀',
        '1' => '₁',
        '2' => '₂',
        '3' => '₃',
        '4' => '₄',
        '5' => '₅',
        '6' => '₆',
        '7' => '₇',
        '8' => '₈',
        '9' => '₉',
        '+' => '₊',
        '-' | '−' => '₋',
        '=' => '₌',
        '(' => '₍',
        ')' => '₎',
        'a' => 'ₐ',
        'e' => 'ₑ',
        'h' => 'ₕ',
        'i' => 'ᵢ',
        'j' => 'ⱼ',
        'k' => 'ₖ',
        'l' => 'ₗ',
        'm' => 'ₘ',
        'n' => 'ₙ',
        'o' => 'ₒ',
        'p' => 'ₚ',
        'r' => 'ᵣ',
        's' => 'ₛ',
        't' => 'ₜ',
        'u' => 'ᵤ',
        'v' => 'ᵥ',
        'x' => 'ₓ',
        'β' => 'ᵦ',
        'γ' => 'ᵧ',
        'ρ' => 'ᵨ',
        'φ' | 'ϕ' => 'ᵩ',
        'χ' => 'ᵪ',
        _ => return None,
    })
}

/// `^`/`_` applied to an already converted argument.
fn script(kind: char, arg: &str) -> String {
    let map = if kind == '^' { superscript } else { subscript };
    if arg.is_empty() {
        return String::new();
    }
    arg.chars()
        .map(map)
        .collect::<Option<String>>()
        .unwrap_or_else(|| format!("{kind}({arg})"))
}

fn is_simple(s: &str) -> bool {
    s.chars().count() <= 1 || s.chars().all(char::is_alphanumeric)
}

fn parenthesize(s: &str) -> String {
    if is_simple(s) {
        s.to_string()
    } else {
        format!("({s})")
    }
}

fn fraction(num: &str, den: &str) -> String {
    let vulgar = match (num, den) {
        ("1", "2") => Some("½"),
        ("1", "3") => Some("⅓"),
        ("2", "3") => Some("⅔"),
        ("1", "4") => Some("¼"),
        ("3", "4") => Some("¾"),
        ("1", "5") => Some("⅕"),
        ("1", "8") => Some("⅛"),
        _ => None,
    };
    match vulgar {
        Some(v) => v.to_string(),
        None => format!("{}/{}", parenthesize(num), parenthesize(den)),
    }
}

fn accent(arg: &str, mark: char) -> String {
    let mut out = String::with_capacity(arg.len() * 2);
    for c in arg.chars() {
        out.push(c);
        if !c.is_whitespace() {
            out.push(mark);
        }
    }
    out
}

fn restyle(arg: &str, map: fn(char) -> Option<char>) -> String {
    arg.chars().map(|c| map(c).unwrap_or(c)).collect()
}

fn offset(base: u32, from: char, c: char) -> Option<char> {
    char::from_u32(base + (c as u32 - from as u32))
}

fn double_struck(c: char) -> Option<char> {
    match c {
        'C' => Some('ℂ'),
        'H' => Some('ℍ'),
        'N' => Some('ℕ'),
        'P' => Some('ℙ'),
        'Q' => Some('ℚ'),
        'R' => Some('ℝ'),
        'Z' => Some('ℤ'),
        'A'..='Z' => offset(0x1D538, 'A', c),
        'a'..='z' => offset(0x1D552, 'a', c),
        '0'..='9' => offset(0x1D7D8, '0', c),
        _ => None,
    }
}

fn script_letter(c: char) -> Option<char> {
    match c {
        'B' => Some('ℬ'),
        'E' => Some('ℰ'),
        'F' => Some('ℱ'),
        'H' => Some('ℋ'),
        'I' => Some('ℐ'),
        'L' => Some('ℒ'),
        'M' => Some('ℳ'),
        'R' => Some('ℛ'),
        'e' => Some('ℯ'),
        'g' => Some('ℊ'),
        'o' => Some('ℴ'),
        'A'..='Z' => offset(0x1D49C, 'A', c),
        'a'..='z' => offset(0x1D4B6, 'a', c),
        _ => None,
    }
}

fn fraktur(c: char) -> Option<char> {
    match c {
        'C' => Some('ℭ'),
        'H' => Some('ℌ'),
        'I' => Some('ℑ'),
        'R' => Some('ℜ'),
        'Z' => Some('ℨ'),
        'A'..='Z' => offset(0x1D504, 'A', c),
        'a'..='z' => offset(0x1D51E, 'a', c),
        _ => None,
    }
}

fn bold(c: char) -> Option<char> {
    match c {
        'A'..='Z' => offset(0x1D400, 'A', c),
        'a'..='z' => offset(0x1D41A, 'a', c),
        '0'..='9' => offset(0x1D7CE, '0', c),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conv(s: &str) -> String {
        to_unicode(s).unwrap()
    }

    #[test]
    fn scripts_use_unicode_forms_when_possible() {
        assert_eq!(conv("x^2"), "x²");
        assert_eq!(conv("x^{n+1}"), "xⁿ⁺¹");
        assert_eq!(conv("a_{ij}"), "aᵢⱼ");
        assert_eq!(conv("x_{\\max}"), "xₘₐₓ");
        assert_eq!(conv("x_{\\alpha}"), "x_(α)");
        assert_eq!(conv("e^{\\pi i}"), "e^(πi)");
        assert_eq!(conv("x^{}"), "x");
    }

    #[test]
    fn converts_symbols_and_ignores_whitespace() {
        assert_eq!(conv(r"\alpha + \beta \leq \Gamma"), "α+β≤Γ");
        assert_eq!(conv(r"\forall x \in \mathbb{R}"), "∀x∈ℝ");
        assert_eq!(conv(r"\sum_{i=1}^{n} i"), "∑ᵢ₌₁ⁿi");
        assert_eq!(conv(r"a \to b"), "a→b");
    }

    #[test]
    fn fractions_and_roots() {
        assert_eq!(conv(r"\frac{1}{2}"), "½");
        assert_eq!(conv(r"\frac{a}{b}"), "a/b");
        assert_eq!(conv(r"\frac{x+1}{x-1}"), "(x+1)/(x-1)");
        assert_eq!(conv(r"\frac12"), "½");
        assert_eq!(conv(r"\sqrt{2}"), "√2");
        assert_eq!(conv(r"\sqrt{x+y}"), "√(x+y)");
        assert_eq!(conv(r"\sqrt[3]{x}"), "∛x");
        assert_eq!(conv(r"\sqrt[n]{x}"), "ⁿ√x");
    }

    #[test]
    fn functions_keep_a_space_before_their_argument() {
        assert_eq!(conv(r"\sin x"), "sin x");
        assert_eq!(conv(r"\sin^2 x"), "sin² x");
        assert_eq!(conv(r"\log(n)"), "log(n)");
        assert_eq!(conv(r"\operatorname{rank} A"), "rank A");
    }

    #[test]
    fn text_fonts_and_accents() {
        assert_eq!(conv(r"\text{if } x > 0"), "if x>0");
        assert_eq!(conv(r"\mathcal{L}"), "ℒ");
        assert_eq!(conv(r"\mathbf{v}"), "𝐯");
        assert_eq!(conv(r"\hat{x}"), "x\u{0302}");
        assert_eq!(conv(r"\left( x \right)"), "(x)");
        assert_eq!(conv(r"\left. x \right|"), "x|");
        assert_eq!(conv(r"50\%"), "50%");
    }

    #[test]
    fn reports_errors() {
        assert_eq!(
            to_unicode(r"\badcmd{"),
            Err(MathError::UnknownCommand("badcmd".to_string()))
        );
        assert_eq!(to_unicode("{x"), Err(MathError::Unbalanced(2)));
        assert_eq!(to_unicode("x}"), Err(MathError::Unbalanced(1)));
        assert!(matches!(
            to_unicode(r"\frac{a}"),
            Err(MathError::MissingArgument { .. })
        ));
        assert!(matches!(
            to_unicode("x^"),
            Err(MathError::MissingArgument { .. })
        ));
        assert_eq!(to_unicode("  "), Err(MathError::Empty));
    }
}
