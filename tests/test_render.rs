use phylotraits::layout::TreeLayout;
use phylotraits::newick::read_tree;
use phylotraits::render::{ColourStyle, DrawOptions, RenderError, draw_tree, quick_draw_tree};
use phylotraits::traits::{TraitTable, assign_leaf_trait};
use std::path::Path;

fn host_tree() -> phylotraits::model::PhyloTree {
    let mut tree = read_tree(Path::new("tests").join("fixtures").join("small.nwk")).unwrap();
    let table = TraitTable::from_reader(
        "name,host\nKea,alpine\nKaka,forest\nKakapo,forest\nTakahe,wetland\n".as_bytes(),
    )
    .unwrap();
    assign_leaf_trait(&mut tree, &table, "name", "host", None).unwrap();
    tree
}

fn small_options() -> DrawOptions {
    DrawOptions::default()
        .with_size(3.0, 4.0)
        .with_colour_by("host")
}

#[test]
fn test_save_svg() {
    let tree = host_tree();
    let figure = quick_draw_tree(&tree, &small_options()).unwrap();
    assert_eq!(figure.coloured_tips(), 4);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tree.svg");
    figure.save(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("<svg"));
    assert!(text.contains("wetland"));
    assert!(text.contains("0.01"));
}

#[test]
fn test_save_png() {
    let tree = host_tree();
    let figure = quick_draw_tree(&tree, &small_options()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tree.PNG");
    figure.save(&path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
}

#[test]
fn test_palette_overflow_draws_no_tips() {
    let mut tree = host_tree();
    for (i, leaf) in tree.leaf_indices().into_iter().enumerate() {
        tree[leaf].traits_mut().insert("id".into(), i.to_string());
    }
    let options = DrawOptions {
        style: ColourStyle::Set1,
        ..small_options().with_colour_by("id")
    };
    // 4 values fit
    assert_eq!(quick_draw_tree(&tree, &options).unwrap().coloured_tips(), 4);

    let values: Vec<String> = (0..10).map(|i| i.to_string()).collect();
    let options = options.with_values_of_interest(values);
    let figure = quick_draw_tree(&tree, &options).unwrap();
    assert_eq!(figure.coloured_tips(), 0);
    assert!(figure.colour_map().is_empty());
}

#[test]
fn test_layout_reuse() {
    let tree = host_tree();
    let layout = TreeLayout::compute(&tree).unwrap();
    let first = draw_tree(&tree, &layout, &small_options()).unwrap();
    let second = draw_tree(&tree, &layout, &small_options()).unwrap();
    assert_eq!(first.to_svg_string(), second.to_svg_string());
}

#[test]
fn test_unsupported_extension() {
    let tree = host_tree();
    let figure = quick_draw_tree(&tree, &small_options()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let err = figure.save(dir.path().join("tree.jpg")).unwrap_err();
    assert!(matches!(err, RenderError::UnsupportedFormat(_)));
}
