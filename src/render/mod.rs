//! Tree figures.
//!
//! [quick_draw_tree] lays out a tree and draws its branches, with tips
//! coloured by a leaf trait using a qualitative palette
//! ([brew_colour_dictionary]). Figures are saved as SVG or PNG.
//!
//! # Example
//! ```no_run
//! use phylotraits::newick::parse_str;
//! use phylotraits::render::{quick_draw_tree, DrawOptions};
//!
//! let tree = parse_str("((A:0.01,B:0.02):0.01,C:0.03);").unwrap();
//! let figure = quick_draw_tree(&tree, &DrawOptions::default()).unwrap();
//! figure.save("tree.png").unwrap();
//! ```

mod draw;
mod palette;

pub use self::draw::{DrawOptions, Figure, RenderError, draw_tree, quick_draw_tree};
pub use self::palette::{ColourMap, ColourStyle, brew_colour_dictionary};
