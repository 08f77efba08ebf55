//! Qualitative ColorBrewer palettes.

use std::fmt;
use std::str::FromStr;

const PAIRED: [&str; 12] = [
    "#a6cee3", "#1f78b4", "#b2df8a", "#33a02c", "#fb9a99", "#e31a1c", "#fdbf6f", "#ff7f00",
    "#cab2d6", "#6a3d9a", "#ffff99", "#b15928",
];

const SET1: [&str; 9] = [
    "#e41a1c", "#377eb8", "#4daf4a", "#984ea3", "#ff7f00", "#ffff33", "#a65628", "#f781bf",
    "#999999",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColourStyle {
    /// 12 colours in light/dark pairs
    #[default]
    Paired,
    /// 9 strong colours
    Set1,
}

impl ColourStyle {
    /// Hex codes of the palette, in order.
    pub fn colours(&self) -> &'static [&'static str] {
        match self {
            ColourStyle::Paired => &PAIRED,
            ColourStyle::Set1 => &SET1,
        }
    }
}

impl FromStr for ColourStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "paired" => Ok(ColourStyle::Paired),
            "set1" => Ok(ColourStyle::Set1),
            other => Err(format!("unknown colour style '{other}', expected 'paired' or 'set1'")),
        }
    }
}

impl fmt::Display for ColourStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColourStyle::Paired => write!(f, "paired"),
            ColourStyle::Set1 => write!(f, "set1"),
        }
    }
}

/// Value to colour assignment, in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColourMap {
    entries: Vec<(String, &'static str)>,
}

impl ColourMap {
    pub fn get(&self, value: &str) -> Option<&'static str> {
        self.entries.iter().find(|(v, _)| v == value).map(|(_, c)| *c)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(value, colour)` pairs, for a legend.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &'static str)> {
        self.entries.iter().map(|(v, c)| (v.as_str(), *c))
    }
}

/// Maps the distinct `values`, in order of first appearance, to consecutive
/// colours of `style`.
///
/// If there are more distinct values than colours, the map is empty and a
/// warning is logged.
///
/// # Example
/// ```
/// use phylotraits::render::{brew_colour_dictionary, ColourStyle};
///
/// let map = brew_colour_dictionary(["human", "avian", "human"], ColourStyle::Set1);
/// assert_eq!(map.len(), 2);
/// assert_eq!(map.get("avian"), Some("#377eb8"));
/// ```
pub fn brew_colour_dictionary<I, S>(values: I, style: ColourStyle) -> ColourMap
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let palette = style.colours();
    let mut entries: Vec<(String, &'static str)> = Vec::new();

    for value in values {
        let value = value.as_ref();
        if entries.iter().any(|(v, _)| v == value) {
            continue;
        }
        let Some(&colour) = palette.get(entries.len()) else {
            log::warn!(
                "Too many distinct values to map onto the {style} palette ({} colours)",
                palette.len()
            );
            return ColourMap::default();
        };
        entries.push((value.to_string(), colour));
    }

    ColourMap { entries }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_appearance_order() {
        let map = brew_colour_dictionary(vec!["b", "a", "b", "c"], ColourStyle::Paired);
        let values: Vec<_> = map.entries().map(|(v, _)| v).collect();
        assert_eq!(values, vec!["b", "a", "c"]);
        assert_eq!(map.get("b"), Some("#a6cee3"));
        assert_eq!(map.get("c"), Some("#b2df8a"));
        assert_eq!(map.get("d"), None);
    }

    #[test]
    fn test_too_many_values() {
        let values: Vec<String> = (0..10).map(|i| i.to_string()).collect();
        assert!(brew_colour_dictionary(&values, ColourStyle::Set1).is_empty());
        assert_eq!(brew_colour_dictionary(&values, ColourStyle::Paired).len(), 10);
    }

    #[test]
    fn test_style_from_str() {
        assert_eq!("Set1".parse::<ColourStyle>(), Ok(ColourStyle::Set1));
        assert!("viridis".parse::<ColourStyle>().is_err());
    }
}
