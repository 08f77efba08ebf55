//! Drawing a laid-out tree as SVG, optionally rasterized to PNG.

use crate::layout::{SegmentKind, TreeLayout};
use crate::model::PhyloTree;
use crate::render::palette::{ColourMap, ColourStyle, brew_colour_dictionary};
use crate::traits::UNDEF;
use std::io;
use std::path::{Path, PathBuf};
use svg::Document;
use svg::node::element::{Circle, Group, Line, Rectangle, Text};
use thiserror::Error;

/// Points per inch
const PT_PER_INCH: f64 = 72.0;

/// Halo marker area relative to the tip marker area
const HALO_AREA_FACTOR: f64 = 1.8;

const LEGEND_FONT_PT: f64 = 10.0;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Tree has no root")]
    EmptyTree,
    #[error("Layout covers {layout} vertices, tree has {tree}")]
    LayoutMismatch { layout: usize, tree: usize },
    #[error("Cannot write '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Rasterization failed: {0}")]
    Raster(String),
    #[error("Unsupported output format '{0}', expected .svg or .png")]
    UnsupportedFormat(String),
}

/// Settings of [draw_tree].
///
/// Sizes follow plotting conventions: figure in inches, line widths in
/// points, tip sizes as marker areas in points².
#[derive(Debug, Clone, PartialEq)]
pub struct DrawOptions {
    pub width_in: f64,
    pub height_in: f64,
    pub dpi: f64,
    pub branch_width: f64,
    pub branch_colour: String,
    pub tip_size: f64,
    /// Shift of all x coordinates; the root is at 0 otherwise
    pub x_offset: f64,
    /// Draw a frame around the plot area
    pub show_borders: bool,
    /// Length of the scale bar in branch length units
    pub scale_bar: f64,
    pub style: ColourStyle,
    /// Leaf trait to colour tips by; no tips are drawn without one
    pub colour_by: Option<String>,
    /// Trait values that get colours; all leaf values if empty
    pub values_of_interest: Vec<String>,
}

impl Default for DrawOptions {
    fn default() -> Self {
        Self {
            width_in: 9.0,
            height_in: 12.0,
            dpi: 100.0,
            branch_width: 0.5,
            branch_colour: String::from("black"),
            tip_size: 8.0,
            x_offset: 0.0,
            show_borders: false,
            scale_bar: 0.01,
            style: ColourStyle::default(),
            colour_by: None,
            values_of_interest: Vec::new(),
        }
    }
}

impl DrawOptions {
    pub fn with_colour_by<S: Into<String>>(mut self, trait_name: S) -> Self {
        self.colour_by = Some(trait_name.into());
        self
    }

    pub fn with_values_of_interest(mut self, values: Vec<String>) -> Self {
        self.values_of_interest = values;
        self
    }

    pub fn with_size(mut self, width_in: f64, height_in: f64) -> Self {
        self.width_in = width_in;
        self.height_in = height_in;
        self
    }

    fn px_per_pt(&self) -> f64 {
        self.dpi / PT_PER_INCH
    }
}

/// A drawn tree.
#[derive(Debug, Clone)]
pub struct Figure {
    document: Document,
    colour_map: ColourMap,
    coloured_tips: usize,
}

impl Figure {
    /// Tip colours in use, for legends elsewhere.
    pub fn colour_map(&self) -> &ColourMap {
        &self.colour_map
    }

    /// Number of tips drawn with a colour.
    pub fn coloured_tips(&self) -> usize {
        self.coloured_tips
    }

    pub fn to_svg_string(&self) -> String {
        self.document.to_string()
    }

    /// Saves the figure; the extension picks the format, `.svg` or `.png`.
    ///
    /// # Errors
    /// * [RenderError::UnsupportedFormat] - other extension
    /// * [RenderError::Io] / [RenderError::Raster] - writing or rendering failed
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), RenderError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "svg" => svg::save(path, &self.document).map_err(|source| RenderError::Io {
                path: path.to_path_buf(),
                source,
            }),
            "png" => self.save_png(path),
            _ => Err(RenderError::UnsupportedFormat(extension)),
        }?;

        log::info!("Saved figure to {}", path.display());
        Ok(())
    }

    fn save_png(&self, path: &Path) -> Result<(), RenderError> {
        let mut options = resvg::usvg::Options::default();
        options.fontdb_mut().load_system_fonts();

        let tree = resvg::usvg::Tree::from_str(&self.to_svg_string(), &options)
            .map_err(|e| RenderError::Raster(e.to_string()))?;
        let size = tree.size().to_int_size();
        let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
            .ok_or_else(|| RenderError::Raster(String::from("figure has zero size")))?;

        resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap.as_mut());
        pixmap
            .save_png(path)
            .map_err(|e| RenderError::Raster(e.to_string()))
    }
}

/// Computes the layout of `tree` and draws it.
pub fn quick_draw_tree(tree: &PhyloTree, options: &DrawOptions) -> Result<Figure, RenderError> {
    let layout = TreeLayout::compute(tree).ok_or(RenderError::EmptyTree)?;
    draw_tree(tree, &layout, options)
}

/// Draws `tree` with a rectangular `layout`.
///
/// Branches are black lines; with [DrawOptions::colour_by] set, tips whose
/// value has a colour are drawn as coloured dots over a black halo and listed
/// in a legend. A scale bar sits below the tree.
///
/// # Errors
/// [RenderError::LayoutMismatch] if `layout` was computed for another tree.
pub fn draw_tree(tree: &PhyloTree, layout: &TreeLayout, options: &DrawOptions) -> Result<Figure, RenderError> {
    if layout.positions.len() != tree.num_vertices() {
        return Err(RenderError::LayoutMismatch {
            layout: layout.positions.len(),
            tree: tree.num_vertices(),
        });
    }

    let frame = Frame::new(layout, options);
    let px_per_pt = options.px_per_pt();
    let line_width = options.branch_width * px_per_pt;

    let mut document = Document::new()
        .set("width", frame.width)
        .set("height", frame.height)
        .set("viewBox", (0, 0, frame.width as i32, frame.height as i32));
    document = document.add(
        Rectangle::new()
            .set("width", "100%")
            .set("height", "100%")
            .set("fill", "white"),
    );

    // Branches
    let mut branches = Group::new()
        .set("id", "branches")
        .set("stroke", options.branch_colour.as_str())
        .set("stroke-width", line_width)
        .set("stroke-linecap", "square");
    for segment in &layout.segments {
        if segment.kind == SegmentKind::Horizontal && segment.start == segment.end {
            continue;
        }
        let (x1, y1) = frame.map(segment.start, options.x_offset);
        let (x2, y2) = frame.map(segment.end, options.x_offset);
        branches = branches.add(
            Line::new()
                .set("x1", x1)
                .set("y1", y1)
                .set("x2", x2)
                .set("y2", y2),
        );
    }
    document = document.add(branches);

    // Tips
    let colour_map = tip_colours(tree, options);
    let mut coloured_tips = 0;
    if let Some(trait_name) = options.colour_by.as_deref().filter(|_| !colour_map.is_empty()) {
        let tip_radius = options.tip_size.sqrt() / 2.0 * px_per_pt;
        let halo_radius = (options.tip_size * HALO_AREA_FACTOR).sqrt() / 2.0 * px_per_pt;

        let mut halos = Group::new().set("id", "tip-halos").set("fill", "black");
        let mut tips = Group::new().set("id", "tips");
        for leaf in tree.leaf_indices() {
            let value = tree[leaf].trait_value(trait_name).unwrap_or(UNDEF);
            let Some(colour) = colour_map.get(value) else {
                continue;
            };
            let (cx, cy) = frame.map(layout.position(leaf), options.x_offset);
            halos = halos.add(Circle::new().set("cx", cx).set("cy", cy).set("r", halo_radius));
            tips = tips.add(
                Circle::new()
                    .set("cx", cx)
                    .set("cy", cy)
                    .set("r", tip_radius)
                    .set("fill", colour),
            );
            coloured_tips += 1;
        }
        document = document.add(halos).add(tips);
        document = document.add(legend(&colour_map, &frame, px_per_pt));
    }

    document = document.add(scale_bar(layout, options, &frame, line_width));

    if options.show_borders {
        document = document.add(
            Rectangle::new()
                .set("x", frame.margin_x)
                .set("y", frame.margin_y)
                .set("width", frame.width - 2.0 * frame.margin_x)
                .set("height", frame.height - 2.0 * frame.margin_y)
                .set("fill", "none")
                .set("stroke", "black")
                .set("stroke-width", px_per_pt),
        );
    }

    log::debug!("Drew {} vertices, {coloured_tips} coloured tips", tree.num_vertices());
    Ok(Figure {
        document,
        colour_map,
        coloured_tips,
    })
}

/// Colours for the tip values of [DrawOptions::colour_by].
fn tip_colours(tree: &PhyloTree, options: &DrawOptions) -> ColourMap {
    let Some(trait_name) = options.colour_by.as_deref() else {
        return ColourMap::default();
    };
    if !options.values_of_interest.is_empty() {
        return brew_colour_dictionary(&options.values_of_interest, options.style);
    }

    let values: Vec<&str> = tree
        .leaf_indices()
        .into_iter()
        .map(|leaf| tree[leaf].trait_value(trait_name).unwrap_or(UNDEF))
        .collect();
    brew_colour_dictionary(values, options.style)
}

fn legend(colour_map: &ColourMap, frame: &Frame, px_per_pt: f64) -> Group {
    let font_px = LEGEND_FONT_PT * px_per_pt;
    let row_height = font_px * 1.4;
    let x = frame.width - frame.margin_x - font_px * 8.0;
    let mut y = frame.margin_y + font_px;

    let mut group = Group::new().set("id", "legend").set("font-size", font_px);
    for (value, colour) in colour_map.entries() {
        group = group.add(
            Rectangle::new()
                .set("x", x)
                .set("y", y - font_px * 0.8)
                .set("width", font_px * 1.6)
                .set("height", font_px * 0.8)
                .set("fill", colour),
        );
        group = group.add(
            Text::new("")
                .set("x", x + font_px * 2.0)
                .set("y", y)
                .add(svg::node::Text::new(value)),
        );
        y += row_height;
    }
    group
}

fn scale_bar(layout: &TreeLayout, options: &DrawOptions, frame: &Frame, line_width: f64) -> Group {
    let bar_y = -layout.y_span * 0.05;
    let label_y = -layout.y_span * 0.045;
    let (x1, y) = frame.map((0.0, bar_y), options.x_offset);
    let (x2, _) = frame.map((options.scale_bar, bar_y), options.x_offset);
    let (label_x, label_y) = frame.map((options.scale_bar / 2.0, label_y), options.x_offset);

    Group::new()
        .set("id", "scale-bar")
        .add(
            Line::new()
                .set("x1", x1)
                .set("y1", y)
                .set("x2", x2)
                .set("y2", y)
                .set("stroke", "black")
                .set("stroke-width", line_width * 2.0),
        )
        .add(
            Text::new("")
                .set("x", label_x)
                .set("y", label_y)
                .set("text-anchor", "middle")
                .set("font-size", LEGEND_FONT_PT * options.px_per_pt())
                .add(svg::node::Text::new(options.scale_bar.to_string())),
        )
}

/// Mapping from layout coordinates to pixels; `y` grows upwards in the
/// layout and downwards in the image.
struct Frame {
    width: f64,
    height: f64,
    margin_x: f64,
    margin_y: f64,
    min_x: f64,
    max_y: f64,
    scale_x: f64,
    scale_y: f64,
}

impl Frame {
    fn new(layout: &TreeLayout, options: &DrawOptions) -> Self {
        let width = options.width_in * options.dpi;
        let height = options.height_in * options.dpi;
        let margin_x = (width * 0.05).clamp(20.0, 60.0);
        let margin_y = (height * 0.05).clamp(20.0, 40.0);

        let min_x = options.x_offset.min(0.0);
        let max_x = (layout.tree_height + options.x_offset).max(options.scale_bar);
        let min_y = -layout.y_span * 0.05;
        let max_y = layout
            .positions
            .iter()
            .map(|p| p.1)
            .fold(0.0, f64::max);

        let span_x = (max_x - min_x).max(f64::EPSILON);
        let span_y = (max_y - min_y).max(f64::EPSILON);
        Self {
            width,
            height,
            margin_x,
            margin_y,
            min_x,
            max_y,
            scale_x: (width - 2.0 * margin_x).max(1.0) / span_x,
            scale_y: (height - 2.0 * margin_y).max(1.0) / span_y,
        }
    }

    fn map(&self, (x, y): (f64, f64), x_offset: f64) -> (f64, f64) {
        (
            self.margin_x + (x + x_offset - self.min_x) * self.scale_x,
            self.margin_y + (self.max_y - y) * self.scale_y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::newick::parse_str;

    fn coloured_tree() -> PhyloTree {
        let mut tree = parse_str("((A:0.01,B:0.02):0.01,(C:0.01,D:0.01):0.02);").unwrap();
        for (name, host) in [("A", "human"), ("B", "avian"), ("C", "human"), ("D", "swine")] {
            let leaf = tree.find_by_name(name).unwrap();
            tree[leaf].traits_mut().insert("host".into(), host.into());
        }
        tree
    }

    #[test]
    fn test_plain_tree() {
        let tree = coloured_tree();
        let figure = quick_draw_tree(&tree, &DrawOptions::default()).unwrap();
        let svg = figure.to_svg_string();

        // 7 vertices minus the root stub, 3 vertical joins, 1 scale bar
        assert_eq!(svg.matches("<line").count(), 6 + 3 + 1);
        assert!(!svg.contains("<circle"));
        assert!(svg.contains("viewBox=\"0 0 900 1200\""));
        assert_eq!(figure.coloured_tips(), 0);
    }

    #[test]
    fn test_coloured_tips() {
        let tree = coloured_tree();
        let options = DrawOptions::default().with_colour_by("host");
        let figure = quick_draw_tree(&tree, &options).unwrap();

        assert_eq!(figure.coloured_tips(), 4);
        assert_eq!(figure.colour_map().len(), 3);
        // halo + tip per coloured leaf
        assert_eq!(figure.to_svg_string().matches("<circle").count(), 8);
    }

    #[test]
    fn test_values_of_interest() {
        let tree = coloured_tree();
        let options = DrawOptions::default()
            .with_colour_by("host")
            .with_values_of_interest(vec![String::from("human")]);
        let figure = quick_draw_tree(&tree, &options).unwrap();
        assert_eq!(figure.coloured_tips(), 2);
        assert!(figure.to_svg_string().contains("human"));
    }

    #[test]
    fn test_borders() {
        let tree = coloured_tree();
        let without = quick_draw_tree(&tree, &DrawOptions::default()).unwrap();
        let options = DrawOptions {
            show_borders: true,
            ..DrawOptions::default()
        };
        let with = quick_draw_tree(&tree, &options).unwrap();
        let rects = |figure: &Figure| figure.to_svg_string().matches("<rect").count();
        assert_eq!(rects(&with), rects(&without) + 1);
    }

    #[test]
    fn test_layout_mismatch() {
        let tree = coloured_tree();
        let other = parse_str("(A:1,B:1);").unwrap();
        let layout = TreeLayout::compute(&other).unwrap();
        let err = draw_tree(&tree, &layout, &DrawOptions::default()).unwrap_err();
        assert!(matches!(err, RenderError::LayoutMismatch { .. }));
    }

    #[test]
    fn test_unsupported_format() {
        let tree = coloured_tree();
        let figure = quick_draw_tree(&tree, &DrawOptions::default()).unwrap();
        let err = figure.save("tree.pdf").unwrap_err();
        assert!(matches!(err, RenderError::UnsupportedFormat(ext) if ext == "pdf"));
    }
}
