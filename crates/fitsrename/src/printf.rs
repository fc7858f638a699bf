//! Runtime printf-style formatting of a single header value.
//!
//! Template format specifiers such as `%0.2f` or `exp%03ds` are only known at
//! run time, so they cannot go through `format!`. A specifier is literal text
//! with exactly one conversion `%[flags][width][.precision]verb`; `%%` is a
//! literal percent sign.

use std::fmt;

/// Guard against absurd widths in user-supplied specifiers.
const MAX_WIDTH: usize = 1024;

/// The value a specifier is applied to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arg {
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Arg {
    fn kind(&self) -> &'static str {
        match self {
            Arg::Int(_) => "integer",
            Arg::Float(_) => "float",
            Arg::Bool(_) => "boolean",
        }
    }
}

/// Why a specifier could not be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatError(pub String);

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for FormatError {}

fn err<T>(msg: impl Into<String>) -> Result<T, FormatError> {
    Err(FormatError(msg.into()))
}

#[derive(Debug, Clone, Copy, Default)]
struct Spec {
    plus: bool,
    minus: bool,
    sharp: bool,
    zero: bool,
    space: bool,
    width: usize,
    precision: Option<usize>,
}

/// Apply `format` to `arg`.
pub fn sprintf(format: &str, arg: Arg) -> Result<String, FormatError> {
    let mut out = String::with_capacity(format.len() + 8);
    let mut chars = format.chars().peekable();
    let mut converted = false;

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let mut spec = Spec::default();
        while let Some(&flag) = chars.peek() {
            match flag {
                '+' => spec.plus = true,
                '-' => spec.minus = true,
                '#' => spec.sharp = true,
                '0' => spec.zero = true,
                ' ' => spec.space = true,
                _ => break,
            }
            chars.next();
        }
        spec.width = number(&mut chars)?.unwrap_or(0);
        if chars.peek() == Some(&'.') {
            chars.next();
            spec.precision = Some(number(&mut chars)?.unwrap_or(0));
        }

        let verb = match chars.next() {
            Some(v) => v,
            None => return err("format ends with an incomplete conversion"),
        };
        if verb == '%' {
            out.push('%');
            continue;
        }
        if converted {
            return err("format contains more than one conversion");
        }
        converted = true;
        out.push_str(&spec.convert(verb, arg)?);
    }

    if !converted {
        return err("format has no conversion");
    }
    Ok(out)
}

fn number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Result<Option<usize>, FormatError> {
    let mut n: Option<usize> = None;
    while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
        let next = n.unwrap_or(0) * 10 + d as usize;
        if next > MAX_WIDTH {
            return err(format!("width or precision larger than {MAX_WIDTH}"));
        }
        n = Some(next);
        chars.next();
    }
    Ok(n)
}

impl Spec {
    fn convert(&self, verb: char, arg: Arg) -> Result<String, FormatError> {
        match (verb, arg) {
            ('d' | 'v', Arg::Int(n)) => Ok(self.integer(n, 10, "", false)),
            ('x', Arg::Int(n)) => Ok(self.integer(n, 16, "0x", false)),
            ('X', Arg::Int(n)) => Ok(self.integer(n, 16, "0X", true)),
            ('o', Arg::Int(n)) => Ok(self.integer(n, 8, "0", false)),
            ('b', Arg::Int(n)) => Ok(self.integer(n, 2, "0b", false)),
            ('f' | 'F', Arg::Float(v)) => Ok(self.float(v, |a| self.fixed(a))),
            ('e', Arg::Float(v)) => Ok(self.float(v, |a| self.exponent(a, false))),
            ('E', Arg::Float(v)) => Ok(self.float(v, |a| self.exponent(a, true))),
            ('g' | 'v', Arg::Float(v)) => Ok(self.float(v, |a| self.general(a, false))),
            ('G', Arg::Float(v)) => Ok(self.float(v, |a| self.general(a, true))),
            ('t' | 'v', Arg::Bool(b)) => Ok(self.pad("", if b { "true" } else { "false" }, false)),
            ('d' | 'x' | 'X' | 'o' | 'b' | 'f' | 'F' | 'e' | 'E' | 'g' | 'G' | 't', _) => err(
                format!("verb %{verb} does not apply to a {} value", arg.kind()),
            ),
            _ => err(format!("unknown verb %{verb}")),
        }
    }

    fn sign(&self, negative: bool) -> &'static str {
        if negative {
            "-"
        } else if self.plus {
            "+"
        } else if self.space {
            " "
        } else {
            ""
        }
    }

    /// Pad `prefix + body` to the field width. Zero padding goes between
    /// the prefix and the body.
    fn pad(&self, prefix: &str, body: &str, zero: bool) -> String {
        let len = prefix.chars().count() + body.chars().count();
        let fill = self.width.saturating_sub(len);
        let mut out = String::with_capacity(len + fill);
        if self.minus {
            out.push_str(prefix);
            out.push_str(body);
            out.extend(std::iter::repeat(' ').take(fill));
        } else if zero {
            out.push_str(prefix);
            out.extend(std::iter::repeat('0').take(fill));
            out.push_str(body);
        } else {
            out.extend(std::iter::repeat(' ').take(fill));
            out.push_str(prefix);
            out.push_str(body);
        }
        out
    }

    fn integer(&self, n: i64, radix: u32, alt: &str, upper: bool) -> String {
        let magnitude = n.unsigned_abs();
        let mut digits = match radix {
            16 if upper => format!("{magnitude:X}"),
            16 => format!("{magnitude:x}"),
            8 => format!("{magnitude:o}"),
            2 => format!("{magnitude:b}"),
            _ => magnitude.to_string(),
        };
        if let Some(p) = self.precision {
            if p == 0 && magnitude == 0 {
                digits.clear();
            } else if digits.len() < p {
                digits.insert_str(0, &"0".repeat(p - digits.len()));
            }
        }

        let mut prefix = String::from(self.sign(n < 0));
        if self.sharp && !(radix == 8 && digits.starts_with('0')) {
            prefix.push_str(alt);
        }
        // An explicit precision disables zero padding for integers.
        self.pad(&prefix, &digits, self.zero && self.precision.is_none())
    }

    fn float(&self, v: f64, body: impl Fn(f64) -> String) -> String {
        let sign = self.sign(v.is_sign_negative() && !v.is_nan());
        if v.is_nan() {
            return self.pad(sign, "NaN", false);
        }
        if v.is_infinite() {
            let sign = if v < 0.0 { "-" } else { "+" };
            return self.pad(sign, "Inf", false);
        }
        self.pad(sign, &body(v.abs()), self.zero)
    }

    fn fixed(&self, a: f64) -> String {
        let p = self.precision.unwrap_or(6);
        let mut s = format!("{a:.p$}");
        if self.sharp && p == 0 {
            s.push('.');
        }
        s
    }

    fn exponent(&self, a: f64, upper: bool) -> String {
        let p = self.precision.unwrap_or(6);
        let formatted = format!("{a:.p$e}");
        let (mantissa, exp) = split_exponent(&formatted);
        let mut s = String::from(mantissa);
        if self.sharp && p == 0 {
            s.push('.');
        }
        push_exponent(&mut s, exp, upper);
        s
    }

    /// `%g`: exponent form when the exponent is below -4 or at least the
    /// precision (6 for the shortest representation), trailing zeros trimmed.
    fn general(&self, a: f64, upper: bool) -> String {
        let shortest = self.precision.is_none();
        let (digits, exp) = match self.precision {
            None => significant_digits(&format!("{a:e}")),
            Some(p) => {
                let p = p.max(1) - 1;
                significant_digits(&format!("{a:.p$e}"))
            }
        };

        let nd = digits.len() as i32;
        let dp = exp + 1;
        let eprec = match self.precision {
            Some(p) if !shortest => {
                let p = p.max(1) as i32;
                if p > nd && nd >= dp {
                    nd
                } else {
                    p
                }
            }
            _ => 6,
        };

        if exp < -4 || exp >= eprec {
            let mut s = String::from(&digits[..1]);
            if digits.len() > 1 {
                s.push('.');
                s.push_str(&digits[1..]);
            }
            push_exponent(&mut s, exp, upper);
            return s;
        }

        if dp <= 0 {
            format!("0.{}{}", "0".repeat((-dp) as usize), digits)
        } else if dp >= nd {
            format!("{}{}", digits, "0".repeat((dp - nd) as usize))
        } else {
            format!("{}.{}", &digits[..dp as usize], &digits[dp as usize..])
        }
    }
}

/// Split Rust's `1.5e2` notation into mantissa and decimal exponent.
fn split_exponent(s: &str) -> (&str, i32) {
    match s.split_once('e') {
        Some((m, e)) => (m, e.parse().unwrap_or(0)),
        None => (s, 0),
    }
}

/// Significant digits of a scientific-notation string, trailing zeros
/// removed (at least one digit is kept).
fn significant_digits(s: &str) -> (String, i32) {
    let (mantissa, exp) = split_exponent(s);
    let mut digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    while digits.len() > 1 && digits.ends_with('0') {
        digits.pop();
    }
    (digits, exp)
}

/// Append `e+NN` / `E-NN`, with at least two exponent digits.
fn push_exponent(s: &mut String, exp: i32, upper: bool) {
    s.push(if upper { 'E' } else { 'e' });
    s.push(if exp < 0 { '-' } else { '+' });
    let magnitude = exp.unsigned_abs();
    if magnitude < 10 {
        s.push('0');
    }
    s.push_str(&magnitude.to_string());
}
