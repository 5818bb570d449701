//! Category to palette class assignment.
//!
//! Distinct values of the colour column are sorted and assigned palette
//! classes in order, cycling once the palette is exhausted. The mapping is
//! built from every row, so it does not depend on which rows later fail
//! validation.

use crate::record::{CellValue, RecordSet};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

/// Class for null, missing and unmapped categories.
pub const DEFAULT_COLOR_CLASS: &str = "bar-gray";

/// Number of classes in every built-in palette.
pub const PALETTE_SIZE: usize = 12;

/// Fewest colours a custom palette may have before falling back to classic.
pub const MIN_CUSTOM_COLORS: usize = 6;

/// Most colours a custom palette keeps.
pub const MAX_CUSTOM_COLORS: usize = 12;

/// Category count above which a cardinality warning is emitted.
pub const HIGH_CARDINALITY_THRESHOLD: usize = 50;

const HUES: [&str; PALETTE_SIZE] = [
    "blue", "green", "orange", "purple", "red", "teal", "pink", "indigo", "cyan", "amber",
    "lime", "gray",
];

static HEX_COLOR: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^#(?:[0-9A-Fa-f]{3}|[0-9A-Fa-f]{6})$").ok());

/// Palette selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaletteName {
    /// Saturated hues for light backgrounds
    #[default]
    Classic,
    /// Soft hues
    Pastel,
    /// Deep hues for dark backgrounds
    Dark,
    /// High-contrast hues
    Vibrant,
    /// Caller-supplied hex colours
    Custom,
}

impl PaletteName {
    /// Every built-in palette, in display order.
    pub const BUILTIN: [Self; 4] = [Self::Classic, Self::Pastel, Self::Dark, Self::Vibrant];

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Pastel => "pastel",
            Self::Dark => "dark",
            Self::Vibrant => "vibrant",
            Self::Custom => "custom",
        }
    }

    const fn class_prefix(self) -> &'static str {
        match self {
            Self::Classic => "bar-",
            Self::Pastel => "bar-pastel-",
            Self::Dark => "bar-dark-",
            Self::Vibrant => "bar-vibrant-",
            Self::Custom => "bar-custom-",
        }
    }
}

impl fmt::Display for PaletteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaletteName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "classic" => Ok(Self::Classic),
            "pastel" => Ok(Self::Pastel),
            "dark" => Ok(Self::Dark),
            "vibrant" => Ok(Self::Vibrant),
            "custom" => Ok(Self::Custom),
            _ => Err(format!(
                "Invalid palette: {s}. Expected one of: classic, pastel, dark, vibrant, custom"
            )),
        }
    }
}

/// An ordered list of colour classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    name: PaletteName,
    classes: Vec<String>,
    hex_colors: Vec<String>,
}

impl Palette {
    /// One of the built-in palettes. `Custom` yields classic.
    #[must_use]
    pub fn builtin(name: PaletteName) -> Self {
        let name = if name == PaletteName::Custom {
            PaletteName::Classic
        } else {
            name
        };
        Self {
            name,
            classes: HUES
                .iter()
                .map(|hue| format!("{}{hue}", name.class_prefix()))
                .collect(),
            hex_colors: Vec::new(),
        }
    }

    /// Resolve the palette a configuration asks for.
    ///
    /// Custom colours that are not `#RGB` or `#RRGGBB` are dropped. Fewer
    /// than [`MIN_CUSTOM_COLORS`] survivors fall back to classic; more than
    /// [`MAX_CUSTOM_COLORS`] are truncated. Returns the palette and any
    /// warnings raised along the way.
    #[must_use]
    pub fn resolve(name: PaletteName, custom_colors: &[String]) -> (Self, Vec<String>) {
        if name != PaletteName::Custom {
            return (Self::builtin(name), Vec::new());
        }

        let mut warnings = Vec::new();
        let mut colors: Vec<String> = Vec::with_capacity(custom_colors.len());
        for color in custom_colors {
            let color = color.trim();
            if is_hex_color(color) {
                colors.push(color.to_string());
            } else {
                warnings.push(format!("Ignoring invalid custom color '{color}'"));
            }
        }

        if colors.len() < MIN_CUSTOM_COLORS {
            warn!(
                provided = colors.len(),
                minimum = MIN_CUSTOM_COLORS,
                "Custom palette too small, using classic"
            );
            warnings.push(format!(
                "Custom palette needs at least {MIN_CUSTOM_COLORS} valid colors, got {}. Using the classic palette.",
                colors.len()
            ));
            return (Self::builtin(PaletteName::Classic), warnings);
        }

        if colors.len() > MAX_CUSTOM_COLORS {
            debug!(
                provided = colors.len(),
                kept = MAX_CUSTOM_COLORS,
                "Truncating custom palette"
            );
            colors.truncate(MAX_CUSTOM_COLORS);
        }

        let palette = Self {
            name: PaletteName::Custom,
            classes: (0..colors.len())
                .map(|i| format!("{}{i}", PaletteName::Custom.class_prefix()))
                .collect(),
            hex_colors: colors,
        };
        (palette, warnings)
    }

    /// The palette actually in use (after any fallback).
    #[must_use]
    pub const fn name(&self) -> PaletteName {
        self.name
    }

    /// Classes in assignment order.
    #[must_use]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Number of classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Always false; palettes hold at least [`MIN_CUSTOM_COLORS`] classes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Class for the `index`-th category, cycling.
    #[must_use]
    pub fn class_at(&self, index: usize) -> &str {
        &self.classes[index % self.classes.len()]
    }

    /// For custom palettes, the hex colour behind each class.
    #[must_use]
    pub fn custom_colors(&self) -> Option<BTreeMap<String, String>> {
        (self.name == PaletteName::Custom).then(|| {
            self.classes
                .iter()
                .cloned()
                .zip(self.hex_colors.iter().cloned())
                .collect()
        })
    }
}

fn is_hex_color(color: &str) -> bool {
    HEX_COLOR.as_ref().is_some_and(|re| re.is_match(color))
}

/// Category value to palette class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorMapping(BTreeMap<String, String>);

/// Aggregate view of a mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingSummary {
    /// Distinct categories mapped
    pub total_categories: usize,
    /// Distinct classes used
    pub unique_colors: usize,
    /// How many categories share each class
    pub color_distribution: BTreeMap<String, usize>,
    /// How many times the palette was walked
    pub palette_cycles: usize,
}

impl ColorMapping {
    /// Class assigned to `category`, if any.
    #[must_use]
    pub fn get(&self, category: &str) -> Option<&str> {
        self.0.get(category).map(String::as_str)
    }

    /// Number of mapped categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when nothing is mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in category order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Class for a cell: mapped class, or [`DEFAULT_COLOR_CLASS`] when the
    /// cell is null or its value was never mapped.
    #[must_use]
    pub fn color_class(&self, value: &CellValue) -> &str {
        category_key(value)
            .and_then(|key| self.get(&key))
            .unwrap_or(DEFAULT_COLOR_CLASS)
    }

    /// Summarise the mapping against the palette it was built from.
    #[must_use]
    pub fn summary(&self, palette: &Palette) -> MappingSummary {
        let mut color_distribution: BTreeMap<String, usize> = BTreeMap::new();
        for class in self.0.values() {
            *color_distribution.entry(class.clone()).or_default() += 1;
        }
        MappingSummary {
            total_categories: self.len(),
            unique_colors: color_distribution.len(),
            color_distribution,
            palette_cycles: self.len().div_ceil(palette.len().max(1)),
        }
    }
}

/// A mapping together with the warnings raised while building it.
#[derive(Debug, Clone, Default)]
pub struct MappingOutcome {
    /// The mapping
    pub mapping: ColorMapping,
    /// Non-fatal problems
    pub warnings: Vec<String>,
}

fn category_key(value: &CellValue) -> Option<String> {
    value.non_blank_text()
}

/// Map every distinct value of `column` to a class of `palette`.
///
/// Values are string-cast and sorted lexicographically before assignment, so
/// the result is independent of row order.
#[must_use]
pub fn create_mapping(records: &RecordSet, column: &str, palette: &Palette) -> MappingOutcome {
    if !records.has_column(column) {
        warn!(column, "Color column not found");
        return MappingOutcome {
            mapping: ColorMapping::default(),
            warnings: vec![format!(
                "Color column '{column}' not found. All tasks use the default color."
            )],
        };
    }

    let categories: BTreeSet<String> = records.column_values(column).filter_map(category_key).collect();

    let mut warnings = Vec::new();
    if categories.len() > HIGH_CARDINALITY_THRESHOLD {
        warn!(column, categories = categories.len(), "High cardinality color column");
        warnings.push(format!(
            "Column '{column}' has {} unique values. Consider using a column with fewer categories for better visualization.",
            categories.len()
        ));
    }

    let mapping: BTreeMap<String, String> = categories
        .into_iter()
        .enumerate()
        .map(|(index, category)| (category, palette.class_at(index).to_string()))
        .collect();

    info!(
        column,
        categories = mapping.len(),
        palette = %palette.name(),
        "Created color mapping"
    );

    MappingOutcome {
        mapping: ColorMapping(mapping),
        warnings,
    }
}

/// Class for one cell under `mapping`.
#[must_use]
pub fn get_color_class<'a>(value: &CellValue, mapping: &'a ColorMapping) -> &'a str {
    mapping.color_class(value)
}
