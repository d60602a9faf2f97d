//! Derived product attributes parsed out of raw product names

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Brand marker that precedes the product type in catalogue names
pub const BRAND_MARKER: &str = "Kouli";

/// Packaging suffixes that terminate the product type, checked in order
const PACKAGING_SUFFIXES: [&str; 5] = [
    "G Share Pack Bag",
    "G Box",
    "G Bag",
    "KG Mini Pack",
    "KG Pocket Pack",
];

/// Packaging category derived from a product name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PackagingType {
    ShareBag,
    ShareBox,
    PocketPack,
    MiniPack,
    SharePack,
    Bag,
    Box,
    Bottle,
    LargePack,
    Bulk,
    SmallPack,
    MediumPack,
    Other,
}

impl PackagingType {
    pub const ALL: [PackagingType; 13] = [
        PackagingType::ShareBag,
        PackagingType::ShareBox,
        PackagingType::PocketPack,
        PackagingType::MiniPack,
        PackagingType::SharePack,
        PackagingType::Bag,
        PackagingType::Box,
        PackagingType::Bottle,
        PackagingType::LargePack,
        PackagingType::Bulk,
        PackagingType::SmallPack,
        PackagingType::MediumPack,
        PackagingType::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PackagingType::ShareBag => "share pack bag",
            PackagingType::ShareBox => "share pack box",
            PackagingType::PocketPack => "pocket pack",
            PackagingType::MiniPack => "mini pack",
            PackagingType::SharePack => "share pack",
            PackagingType::Bag => "bag",
            PackagingType::Box => "box",
            PackagingType::Bottle => "bottle",
            PackagingType::LargePack => "large pack",
            PackagingType::Bulk => "bulk",
            PackagingType::SmallPack => "small pack",
            PackagingType::MediumPack => "medium pack",
            PackagingType::Other => "other",
        }
    }
}

impl fmt::Display for PackagingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// Keyword rules, first match wins. Combo variants must precede their parts.
static KEYWORD_RULES: Lazy<Vec<(Regex, PackagingType)>> = Lazy::new(|| {
    [
        (r"(?i)share\s*pack\s*bag", PackagingType::ShareBag),
        (r"(?i)share\s*pack\s*box", PackagingType::ShareBox),
        (r"(?i)pocket\s*pack", PackagingType::PocketPack),
        (r"(?i)mini\s*pack", PackagingType::MiniPack),
        (r"(?i)share\s*pack", PackagingType::SharePack),
        (r"(?i)\bbag\b", PackagingType::Bag),
        (r"(?i)\bbox\b", PackagingType::Box),
        (r"(?i)\bbottle\b", PackagingType::Bottle),
    ]
    .into_iter()
    .filter_map(|(pattern, packaging)| Regex::new(pattern).ok().map(|re| (re, packaging)))
    .collect()
});

static KG_WEIGHT: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*KG\b").ok());

static G_WEIGHT: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*G\b").ok());

static DIGIT_TOKEN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\d+\w*\s*").ok());

/// Classify the packaging of a product from its display name.
///
/// Total: anything that matches no rule, including an empty name, is
/// [`PackagingType::Other`].
pub fn classify_packaging(name: &str) -> PackagingType {
    if let Some((_, packaging)) = KEYWORD_RULES.iter().find(|(re, _)| re.is_match(name)) {
        return *packaging;
    }

    if let Some(weight) = first_weight(&KG_WEIGHT, name) {
        return if weight >= 1.5 {
            PackagingType::LargePack
        } else {
            PackagingType::Bulk
        };
    }

    if let Some(weight) = first_weight(&G_WEIGHT, name) {
        return if weight <= 50.0 {
            PackagingType::SmallPack
        } else if weight <= 100.0 {
            PackagingType::MediumPack
        } else {
            PackagingType::LargePack
        };
    }

    PackagingType::Other
}

fn first_weight(pattern: &Lazy<Option<Regex>>, name: &str) -> Option<f64> {
    let re = pattern.as_ref()?;
    let captures = re.captures(name)?;
    captures.get(1)?.as_str().parse::<f64>().ok()
}

/// Build the short display name `"<product type> (<code>)"`.
///
/// Falls back to the bare product code when the name carries no brand marker
/// or nothing is left after stripping sizes and packaging.
pub fn simplify_product_name(code: &str, name: &str) -> String {
    extract_product_type(name)
        .map(|product_type| format!("{} ({})", product_type, code))
        .unwrap_or_else(|| code.to_string())
}

fn extract_product_type(name: &str) -> Option<String> {
    // Only the text between the first and second marker
    let after_marker = name.split(BRAND_MARKER).nth(1)?;
    let mut part = after_marker.split('-').next().unwrap_or(after_marker);

    if let Some(suffix) = PACKAGING_SUFFIXES.iter().find(|s| part.contains(*s)) {
        part = part.split(suffix).next().unwrap_or(part);
    }

    let stripped = match DIGIT_TOKEN.as_ref() {
        Some(re) => re.replace_all(part, "").into_owned(),
        None => part.to_string(),
    };
    let trimmed = stripped.trim();

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
