use phylotraits::dates::decimal_date_default;
use phylotraits::nexus::{LoadError, NexusLoader, NexusWriter, TipDates, load_nexus, read_dated_nexus};
use phylotraits::parser::ParsingErrorType;
use regex::Regex;
use std::path::{Path, PathBuf};

fn fixture(name: &str) -> PathBuf {
    Path::new("tests").join("fixtures").join(name)
}

#[test]
fn test_translate_and_delimited_dates() {
    let result = read_dated_nexus(fixture("dated_translate.trees"), "_");
    if let Err(e) = &result {
        eprintln!("Error loading dated tree: {:?}", e);
    }
    let dated = result.unwrap();

    let tree = &dated.tree;
    assert_eq!(tree.num_leaves(), 4);
    assert!(tree.is_valid());
    assert_eq!(tree.name(), Some("TREE1"));
    assert_eq!(dated.tip_map.get("3").map(String::as_str), Some("Kakapo_2018-11-15"));
    for name in ["Kea_2019-05-01", "Kaka_2020-02-01", "Kakapo_2018-11-15", "Takahe_2021-01-20"] {
        assert!(tree.find_by_name(name).is_some(), "{name} missing");
    }

    let takahe = decimal_date_default("2021-01-20").unwrap();
    assert_eq!(dated.highest_tip, Some(takahe));
}

#[test]
fn test_absolute_times() {
    let dated = read_dated_nexus(fixture("dated_translate.trees"), "_").unwrap();
    let tree = &dated.tree;
    let highest = dated.highest_tip.unwrap();

    // Kaka and Takahe both end at height 2.0, the tree height
    let kaka = tree.find_by_name("Kaka_2020-02-01").unwrap();
    assert!((dated.absolute_time(kaka).unwrap() - highest).abs() < 1e-9);
    let root_time = dated.absolute_time(tree.root_index()).unwrap();
    assert!((root_time - (highest - 2.0)).abs() < 1e-9);

    let kakapo = tree.find_by_name("Kakapo_2018-11-15").unwrap();
    let times = dated.absolute_times().unwrap();
    assert!((times[kakapo] - (highest - 1.0)).abs() < 1e-9);
}

#[test]
fn test_default_pattern_finds_no_dates() {
    // names use '_' rather than '|' before the date
    let dated = load_nexus(fixture("dated_translate.trees")).unwrap();
    assert_eq!(dated.highest_tip, None);
    assert_eq!(dated.absolute_time(dated.tree.root_index()), None);
}

#[test]
fn test_custom_pattern() {
    let dated = NexusLoader::for_file(fixture("dated_translate.trees"))
        .unwrap()
        .with_tip_dates(TipDates::Pattern(Regex::new(r"_(\d{4}-\d{2})-").unwrap()))
        .with_date_format("%Y-%m-%d")
        .with_variable_dates(true)
        .load()
        .unwrap();
    // days are dropped, so Takahe counts from the first of January
    assert_eq!(dated.highest_tip, Some(2021.0));
}

#[test]
fn test_sorting() {
    let ascending = read_dated_nexus(fixture("dated_translate.trees"), "_").unwrap();
    let first = ascending.tree.root().children()[0];
    assert_eq!(ascending.tree[first].name(), Some("Takahe_2021-01-20"));

    let descending = NexusLoader::for_file(fixture("dated_translate.trees"))
        .unwrap()
        .with_tip_dates(TipDates::None)
        .load()
        .unwrap();
    let first = descending.tree.root().children()[0];
    assert!(!descending.tree[first].is_leaf());
}

#[test]
fn test_missing_file() {
    let err = load_nexus(fixture("no_such.trees")).unwrap_err();
    match err {
        LoadError::Parsing(e) => assert!(matches!(e.kind(), ParsingErrorType::IoError(_))),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_treesub_input_is_not_loadable_without_tree() {
    let err = load_nexus(fixture("treesub_no_trees.tree")).unwrap_err();
    match err {
        LoadError::Parsing(e) => assert_eq!(e.kind(), &ParsingErrorType::MissingTree),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_written_document_loads() {
    let taxa = vec![String::from("Kea|2019-05-01"), String::from("Kaka|2020-02-01")];
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("minimal.trees");

    let file = std::fs::File::create(&path).unwrap();
    let mut writer = NexusWriter::new(file);
    writer
        .write_minimal(&taxa, "('Kea|2019-05-01':1.0,'Kaka|2020-02-01':0.25)3:0.0;")
        .unwrap();
    writer.finish().unwrap();

    let dated = load_nexus(&path).unwrap();
    assert_eq!(dated.tree.num_leaves(), 2);
    assert_eq!(dated.tree.root().name(), Some("3"));
    assert_eq!(dated.highest_tip, Some(decimal_date_default("2020-02-01").unwrap()));
}
