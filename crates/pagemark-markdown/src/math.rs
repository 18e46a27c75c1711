//! LaTeX math to plain Unicode text.
//!
//! Terminals cannot typeset, so math is flattened: Greek letters and operators map to their
//! Unicode code points, scripts use the superscript/subscript blocks where every character has
//! a form (falling back to `^(..)`/`_(..)`), and `\frac{a}{b}` becomes `a/b`. Relations and
//! binary operators get a space on each side; source whitespace is otherwise ignored.

use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MathError {
    #[error("unbalanced `}}` at offset {0}")]
    UnbalancedBrace(usize),
    #[error("unterminated group")]
    UnterminatedGroup,
    #[error("missing argument for \\{0}")]
    MissingArgument(String),
    #[error("missing script after `{0}`")]
    MissingScript(char),
    #[error("missing delimiter after \\{0}")]
    MissingDelimiter(String),
    #[error("\\left and \\right are not paired")]
    UnpairedDelimiters,
    #[error("unknown command \\{0}")]
    UnknownCommand(String),
    #[error("groups nested deeper than {} levels", MAX_DEPTH)]
    TooDeep,
}

/// Deepest group or command-argument nesting accepted before giving up.
pub const MAX_DEPTH: usize = 128;

/// Converts a math expression (without its `$` delimiters) to Unicode text.
pub fn to_unicode(source: &str) -> Result<String, MathError> {
    let mut parser = MathParser {
        chars: source.chars().collect(),
        pos: 0,
        left_depth: 0,
        depth: 0,
    };
    let out = parser.parse_seq(false)?;
    if parser.left_depth != 0 {
        return Err(MathError::UnpairedDelimiters);
    }
    Ok(out.finish())
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Atom {
    Ord(String),
    Rel(String),
    Bin(String),
    Punct(String),
    Open(String),
    Close(String),
    Space(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Last {
    Start,
    Ord,
    Operator,
    Open,
}

#[derive(Debug)]
struct Output {
    text: String,
    last: Last,
}

impl Output {
    fn new() -> Self {
        Self {
            text: String::new(),
            last: Last::Start,
        }
    }

    fn push(&mut self, atom: Atom) {
        match atom {
            Atom::Ord(s) | Atom::Close(s) => {
                self.text.push_str(&s);
                self.last = Last::Ord;
            }
            Atom::Open(s) => {
                self.text.push_str(&s);
                self.last = Last::Open;
            }
            Atom::Rel(s) => {
                self.text.push(' ');
                self.text.push_str(&s);
                self.text.push(' ');
                self.last = Last::Operator;
            }
            Atom::Bin(s) => {
                // unary when nothing precedes it
                if self.last == Last::Ord {
                    self.text.push(' ');
                    self.text.push_str(&s);
                    self.text.push(' ');
                } else {
                    self.text.push_str(&s);
                }
                self.last = Last::Operator;
            }
            Atom::Punct(s) => {
                self.text.push_str(&s);
                self.text.push(' ');
                self.last = Last::Operator;
            }
            Atom::Space(s) => self.text.push_str(&s),
        }
    }

    fn push_script(&mut self, marker: char, script: &str) {
        let compact: String = script.chars().filter(|c| !c.is_whitespace()).collect();
        let map = if marker == '^' { superscript } else { subscript };
        let mapped: Option<String> = compact.chars().map(map).collect();
        match mapped {
            Some(s) => self.text.push_str(&s),
            None if compact.chars().count() == 1 => {
                self.text.push(marker);
                self.text.push_str(&compact);
            }
            None => {
                self.text.push(marker);
                self.text.push('(');
                self.text.push_str(&compact);
                self.text.push(')');
            }
        }
        self.last = Last::Ord;
    }

    fn finish(self) -> String {
        let mut out = String::with_capacity(self.text.len());
        let mut prev_space = true;
        for ch in self.text.chars() {
            if ch == ' ' {
                if !prev_space {
                    out.push(' ');
                }
                prev_space = true;
            } else {
                out.push(ch);
                prev_space = false;
            }
        }
        out.truncate(out.trim_end().len());
        out
    }
}

struct MathParser {
    chars: Vec<char>,
    pos: usize,
    left_depth: usize,
    depth: usize,
}

impl MathParser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn nested<R>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<R, MathError>,
    ) -> Result<R, MathError> {
        if self.depth >= MAX_DEPTH {
            return Err(MathError::TooDeep);
        }
        self.depth += 1;
        let res = f(self);
        self.depth -= 1;
        res
    }

    fn parse_seq(&mut self, in_group: bool) -> Result<Output, MathError> {
        self.nested(|p| p.parse_seq_inner(in_group))
    }

    fn parse_seq_inner(&mut self, in_group: bool) -> Result<Output, MathError> {
        let mut out = Output::new();
        loop {
            self.skip_ws();
            let Some(c) = self.peek() else {
                if in_group {
                    return Err(MathError::UnterminatedGroup);
                }
                return Ok(out);
            };
            match c {
                '}' if in_group => {
                    self.pos += 1;
                    return Ok(out);
                }
                '}' => return Err(MathError::UnbalancedBrace(self.pos)),
                '^' | '_' => {
                    self.pos += 1;
                    let script = self.parse_script(c)?;
                    out.push_script(c, &script);
                }
                '\'' => {
                    self.pos += 1;
                    out.push(Atom::Ord("′".to_string()));
                }
                '{' => {
                    self.pos += 1;
                    let group = self.parse_seq(true)?;
                    out.push(Atom::Ord(group.finish()));
                }
                '\\' => {
                    self.pos += 1;
                    let name = self.command_name();
                    if let Some(atom) = self.command(&name)? {
                        out.push(atom);
                    }
                }
                other => {
                    self.pos += 1;
                    out.push(char_atom(other));
                }
            }
        }
    }

    fn command_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if !c.is_ascii_alphabetic() {
                break;
            }
            name.push(c);
            self.pos += 1;
        }
        if name.is_empty()
            && let Some(c) = self.peek()
        {
            name.push(c);
            self.pos += 1;
        }
        name
    }

    /// A braced group, a single command, or a single character.
    fn parse_argument(&mut self, command: &str) -> Result<String, MathError> {
        self.skip_ws();
        match self.peek() {
            None | Some('}') => Err(MathError::MissingArgument(command.to_string())),
            Some('{') => {
                self.pos += 1;
                Ok(self.parse_seq(true)?.finish())
            }
            Some('\\') => {
                self.pos += 1;
                let name = self.command_name();
                let mut out = Output::new();
                if let Some(atom) = self.command(&name)? {
                    out.push(atom);
                }
                Ok(out.text.trim().to_string())
            }
            Some(c) => {
                self.pos += 1;
                Ok(c.to_string())
            }
        }
    }

    fn parse_script(&mut self, marker: char) -> Result<String, MathError> {
        self.skip_ws();
        match self.peek() {
            None | Some('}') | Some('^') | Some('_') => Err(MathError::MissingScript(marker)),
            _ => self.parse_argument(&marker.to_string()),
        }
    }

    /// Raw text up to the matching `}`, whitespace preserved.
    fn parse_text_argument(&mut self, command: &str) -> Result<String, MathError> {
        self.skip_ws();
        if self.peek() != Some('{') {
            return Err(MathError::MissingArgument(command.to_string()));
        }
        self.pos += 1;
        let mut depth = 1usize;
        let mut out = String::new();
        while let Some(c) = self.peek() {
            self.pos += 1;
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(out);
                    }
                }
                '\\' => {
                    if let Some(next) = self.peek() {
                        self.pos += 1;
                        out.push(next);
                    }
                    continue;
                }
                _ => {}
            }
            if depth > 0 {
                out.push(c);
            }
        }
        Err(MathError::UnterminatedGroup)
    }

    fn parse_delimiter(&mut self, command: &str) -> Result<String, MathError> {
        self.skip_ws();
        match self.peek() {
            None => Err(MathError::MissingDelimiter(command.to_string())),
            Some('\\') => {
                self.pos += 1;
                let name = self.command_name();
                match name.as_str() {
                    "{" | "lbrace" => Ok("{".to_string()),
                    "}" | "rbrace" => Ok("}".to_string()),
                    "|" | "Vert" => Ok("‖".to_string()),
                    "langle" => Ok("⟨".to_string()),
                    "rangle" => Ok("⟩".to_string()),
                    "lvert" | "rvert" | "vert" => Ok("|".to_string()),
                    "lfloor" => Ok("⌊".to_string()),
                    "rfloor" => Ok("⌋".to_string()),
                    "lceil" => Ok("⌈".to_string()),
                    "rceil" => Ok("⌉".to_string()),
                    _ => Err(MathError::MissingDelimiter(command.to_string())),
                }
            }
            Some('.') => {
                self.pos += 1;
                Ok(String::new())
            }
            Some(c @ ('(' | ')' | '[' | ']' | '|' | '/' | '<' | '>')) => {
                self.pos += 1;
                Ok(match c {
                    '<' => "⟨".to_string(),
                    '>' => "⟩".to_string(),
                    other => other.to_string(),
                })
            }
            Some(_) => Err(MathError::MissingDelimiter(command.to_string())),
        }
    }

    fn command(&mut self, name: &str) -> Result<Option<Atom>, MathError> {
        self.nested(|p| p.command_inner(name))
    }

    fn command_inner(&mut self, name: &str) -> Result<Option<Atom>, MathError> {
        if let Some(s) = greek(name) {
            return Ok(Some(Atom::Ord(s.to_string())));
        }
        if let Some(atom) = symbol(name) {
            return Ok(Some(atom));
        }
        let atom = match name {
            "frac" | "dfrac" | "tfrac" => {
                let num = self.parse_argument(name)?;
                let den = self.parse_argument(name)?;
                Atom::Ord(format!("{}/{}", wrap_compound(&num), wrap_compound(&den)))
            }
            "sqrt" => {
                self.skip_ws();
                let index = if self.peek() == Some('[') {
                    self.pos += 1;
                    let mut index = String::new();
                    loop {
                        match self.peek() {
                            None => return Err(MathError::UnterminatedGroup),
                            Some(']') => {
                                self.pos += 1;
                                break;
                            }
                            Some(c) => {
                                index.push(c);
                                self.pos += 1;
                            }
                        }
                    }
                    Some(index.trim().to_string())
                } else {
                    None
                };
                let radicand = self.parse_argument(name)?;
                let sign = match index.as_deref() {
                    None | Some("2") => "√".to_string(),
                    Some("3") => "∛".to_string(),
                    Some("4") => "∜".to_string(),
                    Some(n) => {
                        let sup: Option<String> = n.chars().map(superscript).collect();
                        format!("{}√", sup.unwrap_or_else(|| n.to_string()))
                    }
                };
                Atom::Ord(format!("{sign}{}", wrap_compound(&radicand)))
            }
            "text" | "textrm" | "textit" | "textbf" | "mbox" | "operatorname" => {
                Atom::Ord(self.parse_text_argument(name)?)
            }
            "mathrm" | "mathit" | "mathbf" | "mathsf" | "mathtt" | "boldsymbol" | "mathcal" => {
                Atom::Ord(self.parse_argument(name)?)
            }
            "mathbb" => {
                let arg = self.parse_argument(name)?;
                Atom::Ord(arg.chars().map(double_struck).collect())
            }
            "hat" | "widehat" => Atom::Ord(self.accent(name, '\u{0302}')?),
            "bar" | "overline" => Atom::Ord(self.accent(name, '\u{0304}')?),
            "tilde" | "widetilde" => Atom::Ord(self.accent(name, '\u{0303}')?),
            "vec" => Atom::Ord(self.accent(name, '\u{20D7}')?),
            "dot" => Atom::Ord(self.accent(name, '\u{0307}')?),
            "ddot" => Atom::Ord(self.accent(name, '\u{0308}')?),
            "left" => {
                let delim = self.parse_delimiter(name)?;
                self.left_depth += 1;
                Atom::Open(delim)
            }
            "right" => {
                if self.left_depth == 0 {
                    return Err(MathError::UnpairedDelimiters);
                }
                let delim = self.parse_delimiter(name)?;
                self.left_depth -= 1;
                Atom::Close(delim)
            }
            "big" | "Big" | "bigg" | "Bigg" | "bigl" | "bigr" | "Bigl" | "Bigr" => {
                Atom::Ord(self.parse_delimiter(name)?)
            }
            "begin" | "end" => {
                self.parse_text_argument(name)?;
                return Ok(None);
            }
            "displaystyle" | "textstyle" | "limits" | "nolimits" | "!" => return Ok(None),
            _ => return Err(MathError::UnknownCommand(name.to_string())),
        };
        Ok(Some(atom))
    }

    fn accent(&mut self, name: &str, mark: char) -> Result<String, MathError> {
        let mut arg = self.parse_argument(name)?;
        arg.push(mark);
        Ok(arg)
    }
}

fn char_atom(c: char) -> Atom {
    match c {
        '=' | '<' | '>' => Atom::Rel(c.to_string()),
        '+' => Atom::Bin("+".to_string()),
        '-' => Atom::Bin("−".to_string()),
        '*' => Atom::Bin("∗".to_string()),
        ',' | ';' => Atom::Punct(c.to_string()),
        '(' | '[' => Atom::Open(c.to_string()),
        ')' | ']' => Atom::Close(c.to_string()),
        '&' => Atom::Space(" ".to_string()),
        '~' => Atom::Space(" ".to_string()),
        other => Atom::Ord(other.to_string()),
    }
}

fn wrap_compound(s: &str) -> String {
    let simple = s.chars().count() <= 1
        || s.chars().all(|c| c.is_alphanumeric() || c == '.')
        || (s.starts_with('(') && s.ends_with(')'));
    if simple {
        s.to_string()
    } else {
        format!("({s})")
    }
}

fn greek(name: &str) -> Option<&'static str> {
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
        _ => return None,
    })
}

fn symbol(name: &str) -> Option<Atom> {
    let ord = |s: &str| Some(Atom::Ord(s.to_string()));
    let rel = |s: &str| Some(Atom::Rel(s.to_string()));
    let bin = |s: &str| Some(Atom::Bin(s.to_string()));
    let space = |s: &str| Some(Atom::Space(s.to_string()));
    match name {
        "sum" => ord("∑"),
        "prod" => ord("∏"),
        "coprod" => ord("∐"),
        "int" => ord("∫"),
        "iint" => ord("∬"),
        "oint" => ord("∮"),
        "partial" => ord("∂"),
        "nabla" => ord("∇"),
        "infty" => ord("∞"),
        "hbar" => ord("ħ"),
        "ell" => ord("ℓ"),
        "prime" => ord("′"),
        "emptyset" | "varnothing" => ord("∅"),
        "forall" => ord("∀"),
        "exists" => ord("∃"),
        "neg" | "lnot" => ord("¬"),
        "degree" => ord("°"),
        "angle" => ord("∠"),
        "cdots" => ord("⋯"),
        "ldots" | "dots" => ord("…"),
        "vdots" => ord("⋮"),
        "langle" => ord("⟨"),
        "rangle" => ord("⟩"),
        "vert" | "lvert" | "rvert" | "mid" => ord("|"),
        "|" | "Vert" => ord("‖"),
        "{" | "lbrace" => Some(Atom::Open("{".to_string())),
        "}" | "rbrace" => Some(Atom::Close("}".to_string())),
        "%" => ord("%"),
        "$" => ord("$"),
        "#" => ord("#"),
        "&" => ord("&"),
        "_" => ord("_"),
        "exp" | "ln" | "log" | "lg" | "sin" | "cos" | "tan" | "cot" | "sec" | "csc" | "sinh"
        | "cosh" | "tanh" | "arcsin" | "arccos" | "arctan" | "lim" | "max" | "min" | "sup"
        | "inf" | "det" | "gcd" | "deg" | "dim" | "ker" | "arg" | "Pr" => ord(name),
        "pm" => bin("±"),
        "mp" => bin("∓"),
        "times" => bin("×"),
        "div" => bin("÷"),
        "cdot" => bin("·"),
        "ast" => bin("∗"),
        "circ" => bin("∘"),
        "bullet" => bin("•"),
        "oplus" => bin("⊕"),
        "otimes" => bin("⊗"),
        "cup" => bin("∪"),
        "cap" => bin("∩"),
        "land" | "wedge" => bin("∧"),
        "lor" | "vee" => bin("∨"),
        "setminus" => bin("∖"),
        "leq" | "le" => rel("≤"),
        "geq" | "ge" => rel("≥"),
        "neq" | "ne" => rel("≠"),
        "approx" => rel("≈"),
        "equiv" => rel("≡"),
        "sim" => rel("∼"),
        "simeq" => rel("≃"),
        "cong" => rel("≅"),
        "propto" => rel("∝"),
        "ll" => rel("≪"),
        "gg" => rel("≫"),
        "in" => rel("∈"),
        "notin" => rel("∉"),
        "ni" => rel("∋"),
        "subset" => rel("⊂"),
        "supset" => rel("⊃"),
        "subseteq" => rel("⊆"),
        "supseteq" => rel("⊇"),
        "perp" => rel("⊥"),
        "parallel" => rel("∥"),
        "to" | "rightarrow" => rel("→"),
        "leftarrow" | "gets" => rel("←"),
        "leftrightarrow" => rel("↔"),
        "Rightarrow" | "implies" => rel("⇒"),
        "Leftarrow" => rel("⇐"),
        "Leftrightarrow" | "iff" => rel("⇔"),
        "mapsto" => rel("↦"),
        "longrightarrow" => rel("⟶"),
        "uparrow" => rel("↑"),
        "downarrow" => rel("↓"),
        "quad" => space("  "),
        "qquad" => space("    "),
        "," | ":" | ";" | " " | "enspace" | "thinspace" => space(" "),
        "\\" | "newline" => space("; "),
        _ => None,
    }
}

fn double_struck(c: char) -> char {
    match c {
        'C' => 'ℂ',
        'H' => 'ℍ',
        'N' => 'ℕ',
        'P' => 'ℙ',
        'Q' => 'ℚ',
        'R' => 'ℝ',
        'Z' => 'ℤ',
        other => other,
    }
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
        'β' => 'ᵝ',
        'γ' => 'ᵞ',
        'δ' => 'ᵟ',
        'θ' => 'ᶿ',
        'φ' | 'ϕ' => 'ᵠ',
        'χ' => 'ᵡ',
        '∞' => '∞',
        '′' => '′',
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_letters_and_scripts() {
        assert_eq!(to_unicode("E_F").as_deref(), Ok("E_F"));
        assert_eq!(to_unicode("g_i").as_deref(), Ok("gᵢ"));
        assert_eq!(to_unicode("e^{-\\infty}").as_deref(), Ok("e⁻∞"));
        assert_eq!(to_unicode("x^{n+1}").as_deref(), Ok("xⁿ⁺¹"));
        assert_eq!(to_unicode("\\alpha + \\beta").as_deref(), Ok("α + β"));
    }

    #[test]
    fn unmappable_scripts_fall_back_to_carets() {
        assert_eq!(to_unicode("x^{Q}").as_deref(), Ok("x^Q"));
        assert_eq!(to_unicode("a_{F,q}").as_deref(), Ok("a_(F,q)"));
    }

    #[test]
    fn relations_and_operators_are_spaced() {
        assert_eq!(to_unicode("E<E_F").as_deref(), Ok("E < E_F"));
        assert_eq!(to_unicode("T \\rightarrow 0").as_deref(), Ok("T → 0"));
        assert_eq!(to_unicode("-x").as_deref(), Ok("−x"));
        assert_eq!(to_unicode("8 \\times 10^{-6}").as_deref(), Ok("8 × 10⁻⁶"));
    }

    #[test]
    fn fractions_parenthesize_compound_parts() {
        assert_eq!(to_unicode("\\frac{1}{2}").as_deref(), Ok("1/2"));
        assert_eq!(
            to_unicode("\\frac{E - E_F}{kT}").as_deref(),
            Ok("(E − E_F)/kT")
        );
    }

    #[test]
    fn renders_the_fermi_dirac_function() {
        let src = "f_F(E) = \\frac{1}{1 + \\exp\\left(\\frac{E - E_F}{kT}\\right)} \\quad (3.79)";
        assert_eq!(
            to_unicode(src).as_deref(),
            Ok("f_F(E) = 1/(1 + exp((E − E_F)/kT)) (3.79)")
        );
    }

    #[test]
    fn text_keeps_its_spaces() {
        assert_eq!(
            to_unicode("10^{-5} \\text{ eV/K}").as_deref(),
            Ok("10⁻⁵ eV/K")
        );
    }

    #[test]
    fn sqrt_and_accents() {
        assert_eq!(to_unicode("\\sqrt{2}").as_deref(), Ok("√2"));
        assert_eq!(to_unicode("\\sqrt[3]{x+1}").as_deref(), Ok("∛(x + 1)"));
        assert_eq!(to_unicode("\\hat{p}").as_deref(), Ok("p\u{0302}"));
        assert_eq!(to_unicode("\\mathbb{R}").as_deref(), Ok("ℝ"));
    }

    #[test]
    fn malformed_math_is_an_error() {
        assert_eq!(to_unicode("\\frac{1}{2"), Err(MathError::UnterminatedGroup));
        assert_eq!(to_unicode("a}"), Err(MathError::UnbalancedBrace(1)));
        assert_eq!(
            to_unicode("\\frac{1}"),
            Err(MathError::MissingArgument("frac".to_string()))
        );
        assert_eq!(to_unicode("x^"), Err(MathError::MissingScript('^')));
        assert_eq!(
            to_unicode("\\left( x"),
            Err(MathError::UnpairedDelimiters)
        );
        assert_eq!(
            to_unicode("\\foo"),
            Err(MathError::UnknownCommand("foo".to_string()))
        );
    }

    #[test]
    fn deep_nesting_is_an_error() {
        let braces = format!("{}x{}", "{".repeat(50_000), "}".repeat(50_000));
        assert_eq!(to_unicode(&braces), Err(MathError::TooDeep));
        let fracs = format!("{}x", "\\sqrt".repeat(50_000));
        assert_eq!(to_unicode(&fracs), Err(MathError::TooDeep));

        let ok = format!("{}x{}", "{".repeat(MAX_DEPTH - 1), "}".repeat(MAX_DEPTH - 1));
        assert_eq!(to_unicode(&ok).as_deref(), Ok("x"));
    }

    #[test]
    fn error_messages_are_readable() {
        assert_eq!(
            MathError::MissingArgument("frac".to_string()).to_string(),
            "missing argument for \\frac"
        );
        assert_eq!(
            MathError::UnknownCommand("foo".to_string()).to_string(),
            "unknown command \\foo"
        );
    }
}
