//! CSS-like style maps and the `style` / `textStyle` split.
//!
//! Every styleable thing on the canvas carries two buckets:
//! - `style`: box properties for the container (background, padding,
//!   border, margin, sizing...)
//! - `textStyle`: typography for the text inside it (font, color, align)
//!
//! `classify_property` decides which bucket a property belongs in.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use winnow::ascii::{Caseless, digit0, digit1};
use winnow::combinator::{alt, opt};
use winnow::prelude::*;
use winnow::token::{literal, one_of};

// ─── Values ──────────────────────────────────────────────────────────────

/// A single CSS value: either a bare number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StyleValue {
    Number(f64),
    Text(String),
}

impl StyleValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Number(_) => None,
        }
    }

    /// Numeric reading of the value: bare numbers, or lengths like `"16px"`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => parse_css_length(s).map(|l| l.value),
        }
    }
}

impl fmt::Display for StyleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) if n.fract() == 0.0 => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for StyleValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for StyleValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for StyleValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

// ─── Style maps ──────────────────────────────────────────────────────────

/// Ordered property map. Keys use the camelCase names the browser's
/// style objects use (`backgroundColor`, `fontSize`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleMap(BTreeMap<String, StyleValue>);

impl StyleMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&StyleValue> {
        self.0.get(key)
    }

    /// Set one property. Returns `false` if the value was already equal.
    pub fn set(&mut self, key: &str, value: StyleValue) -> bool {
        if self.0.get(key) == Some(&value) {
            return false;
        }
        self.0.insert(key.to_string(), value);
        true
    }

    pub fn remove(&mut self, key: &str) -> Option<StyleValue> {
        self.0.remove(key)
    }

    /// Shallow-merge `patch` into `self`. Returns `true` if anything changed.
    pub fn merge(&mut self, patch: &StyleMap) -> bool {
        let mut changed = false;
        for (k, v) in &patch.0 {
            changed |= self.set(k, v.clone());
        }
        changed
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StyleValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Render as an inline CSS declaration list (`background-color: red; ...`).
    /// Bare numbers get a `px` suffix unless the property is unitless.
    pub fn to_css(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.0 {
            let prop = kebab_case(key);
            if !out.is_empty() {
                out.push(' ');
            }
            match value {
                StyleValue::Number(_) if !is_unitless(&prop) => {
                    out.push_str(&format!("{prop}: {value}px;"));
                }
                _ => out.push_str(&format!("{prop}: {value};")),
            }
        }
        out
    }
}

impl<K: Into<String>, V: Into<StyleValue>> FromIterator<(K, V)> for StyleMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// The two style buckets carried by every keyed or inserted element.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementStyle {
    #[serde(default)]
    pub style: StyleMap,
    #[serde(default)]
    pub text_style: StyleMap,
}

impl ElementStyle {
    pub fn bucket(&self, bucket: StyleBucket) -> &StyleMap {
        match bucket {
            StyleBucket::Container => &self.style,
            StyleBucket::Text => &self.text_style,
        }
    }

    pub fn bucket_mut(&mut self, bucket: StyleBucket) -> &mut StyleMap {
        match bucket {
            StyleBucket::Container => &mut self.style,
            StyleBucket::Text => &mut self.text_style,
        }
    }
}

/// Which of the two maps a write targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StyleBucket {
    #[serde(rename = "style")]
    Container,
    #[serde(rename = "textStyle")]
    Text,
}

/// Classify a CSS property into its bucket. Accepts camelCase or
/// kebab-case names.
pub fn classify_property(key: &str) -> StyleBucket {
    let prop = kebab_case(key);
    let text = prop.starts_with("font-")
        || matches!(
            prop.as_str(),
            "color"
                | "text-align"
                | "text-decoration"
                | "text-transform"
                | "line-height"
                | "letter-spacing"
                | "white-space"
        );
    if text {
        StyleBucket::Text
    } else {
        StyleBucket::Container
    }
}

/// `backgroundColor` → `background-color`. Already-kebab input passes through.
pub fn kebab_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn is_unitless(prop: &str) -> bool {
    matches!(
        prop,
        "font-weight" | "line-height" | "opacity" | "z-index" | "flex-grow" | "flex-shrink"
    )
}

// ─── CSS lengths ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    Px,
    Rem,
    Em,
    Percent,
    Vw,
    Vh,
    /// A bare number (`0`, `1.5`).
    None,
}

impl LengthUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Px => "px",
            Self::Rem => "rem",
            Self::Em => "em",
            Self::Percent => "%",
            Self::Vw => "vw",
            Self::Vh => "vh",
            Self::None => "",
        }
    }
}

/// A parsed CSS length like `16px` or `1.5rem`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CssLength {
    pub value: f64,
    pub unit: LengthUnit,
}

impl CssLength {
    pub const fn px(value: f64) -> Self {
        Self {
            value,
            unit: LengthUnit::Px,
        }
    }

    /// Convert to pixels. Relative font units use `root_px`; viewport and
    /// percentage units have no pixel meaning out of context. Results that
    /// don't fit an `f32` are `None`.
    pub fn to_px(&self, root_px: f64) -> Option<f64> {
        let px = match self.unit {
            LengthUnit::Px | LengthUnit::None => self.value,
            LengthUnit::Rem | LengthUnit::Em => self.value * root_px,
            LengthUnit::Percent | LengthUnit::Vw | LengthUnit::Vh => return None,
        };
        in_f32_range(px).then_some(px)
    }
}

impl fmt::Display for CssLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", StyleValue::Number(self.value), self.unit.as_str())
    }
}

/// Parse a CSS length. Surrounding whitespace is allowed; anything else
/// after the unit makes the whole value invalid.
pub fn parse_css_length(input: &str) -> Option<CssLength> {
    let mut rest = input.trim();
    let length = parse_length.parse_next(&mut rest).ok()?;
    rest.is_empty().then_some(length)
}

fn parse_length(input: &mut &str) -> ModalResult<CssLength> {
    (parse_number, opt(parse_unit))
        .map(|(value, unit)| CssLength {
            value,
            unit: unit.unwrap_or(LengthUnit::None),
        })
        .parse_next(input)
}

fn parse_unit(input: &mut &str) -> ModalResult<LengthUnit> {
    alt((
        literal("%").value(LengthUnit::Percent),
        literal(Caseless("rem")).value(LengthUnit::Rem),
        literal(Caseless("em")).value(LengthUnit::Em),
        literal(Caseless("px")).value(LengthUnit::Px),
        literal(Caseless("vw")).value(LengthUnit::Vw),
        literal(Caseless("vh")).value(LengthUnit::Vh),
    ))
    .parse_next(input)
}

/// Signed decimal without exponent: `12`, `-3.5`, `.5`, `4.`. Values
/// outside the `f32` range stored on the canvas are rejected.
fn parse_number(input: &mut &str) -> ModalResult<f64> {
    (
        opt(one_of(['+', '-'])),
        alt(((digit1, opt(('.', digit0))).void(), ('.', digit1).void())),
    )
        .take()
        .try_map(str::parse::<f64>)
        .verify(|v: &f64| in_f32_range(*v))
        .parse_next(input)
}

fn in_f32_range(v: f64) -> bool {
    v.is_finite() && v.abs() <= f64::from(f32::MAX)
}

// ─── Colors ──────────────────────────────────────────────────────────────

fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Normalize a hex color to the 6-digit lowercase form a color picker
/// accepts: `#ABC` → `#aabbcc`. Returns `None` for non-hex values
/// (named colors, `rgb()`), which the picker can't show.
pub fn normalize_hex_color(value: &str) -> Option<String> {
    let hex = value.trim().strip_prefix('#')?;
    let bytes = hex.as_bytes();
    let digits: Vec<u8> = match bytes.len() {
        3 => bytes.iter().flat_map(|&b| [b, b]).collect(),
        6 => bytes.to_vec(),
        _ => return None,
    };
    let mut out = String::from("#");
    for d in digits {
        let v = hex_val(d)?;
        out.push(char::from_digit(v as u32, 16)?);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn typography_goes_to_text_bucket() {
        for key in ["color", "fontSize", "font-family", "textAlign", "lineHeight"] {
            assert_eq!(classify_property(key), StyleBucket::Text, "{key}");
        }
        for key in ["backgroundColor", "padding", "border", "borderRadius", "margin"] {
            assert_eq!(classify_property(key), StyleBucket::Container, "{key}");
        }
    }

    #[test]
    fn merge_reports_changes() {
        let mut base: StyleMap = [("color", "red")].into_iter().collect();
        let same: StyleMap = [("color", "red")].into_iter().collect();
        assert!(!base.merge(&same));
        let patch: StyleMap = [("padding", "4px")].into_iter().collect();
        assert!(base.merge(&patch));
        assert_eq!(base.len(), 2);
    }

    #[test]
    fn css_output_is_kebab_with_px_numbers() {
        let mut m = StyleMap::new();
        m.set("backgroundColor", "#fff".into());
        m.set("fontSize", 18.0.into());
        m.set("fontWeight", 700.0.into());
        assert_eq!(
            m.to_css(),
            "background-color: #fff; font-size: 18px; font-weight: 700;"
        );
    }

    #[test]
    fn parses_lengths() {
        assert_eq!(parse_css_length("16px"), Some(CssLength::px(16.0)));
        assert_eq!(
            parse_css_length(" 1.5rem "),
            Some(CssLength {
                value: 1.5,
                unit: LengthUnit::Rem
            })
        );
        assert_eq!(parse_css_length("50%").map(|l| l.unit), Some(LengthUnit::Percent));
        assert_eq!(parse_css_length("0").map(|l| l.unit), Some(LengthUnit::None));
        assert_eq!(parse_css_length(".5em").map(|l| l.value), Some(0.5));
        assert_eq!(parse_css_length("12pt"), None);
        assert_eq!(parse_css_length("auto"), None);
        assert_eq!(parse_css_length("10px solid"), None);
        assert_eq!(parse_css_length("-4PX"), Some(CssLength::px(-4.0)));
        assert_eq!(parse_css_length("3.").map(|l| l.value), Some(3.0));
        assert_eq!(parse_css_length("+."), None);
    }

    #[test]
    fn lengths_beyond_f32_are_rejected() {
        let huge = format!("1{}", "0".repeat(40));
        assert_eq!(parse_css_length(&huge), None);
        assert_eq!(parse_css_length(&format!("{huge}px")), None);
        // Fits as a value but overflows once scaled by the root size.
        let near_max = parse_css_length("300000000000000000000000000000000000000rem").unwrap();
        assert_eq!(near_max.to_px(16.0), None);
    }

    #[test]
    fn rem_converts_with_root_size() {
        let l = parse_css_length("2rem").unwrap();
        assert_eq!(l.to_px(16.0), Some(32.0));
        assert_eq!(parse_css_length("10%").unwrap().to_px(16.0), None);
    }

    #[test]
    fn hex_colors_expand() {
        assert_eq!(normalize_hex_color("#ABC").as_deref(), Some("#aabbcc"));
        assert_eq!(normalize_hex_color("#00ff00").as_deref(), Some("#00ff00"));
        assert_eq!(normalize_hex_color("red"), None);
        assert_eq!(normalize_hex_color("#12345"), None);
    }

    #[test]
    fn element_style_json_shape() {
        let mut el = ElementStyle::default();
        el.text_style.set("color", "red".into());
        let json = serde_json::to_string(&el).unwrap();
        assert_eq!(json, r#"{"style":{},"textStyle":{"color":"red"}}"#);
    }
}
