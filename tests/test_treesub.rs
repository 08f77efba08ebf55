use phylotraits::newick::parse_str;
use phylotraits::nexus::read_dated_nexus;
use phylotraits::treesub::{
    DuplicateBlocks, LeafBlocks, NONSYN_COUNT_TRAIT, NONSYNSUBS_TRAIT, NormalizeError, SideTable, TreePrefix,
    TreesubNormalizer, normalize,
};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

fn fixture(name: &str) -> PathBuf {
    Path::new("tests").join("fixtures").join(name)
}

fn quiet() -> TreesubNormalizer {
    TreesubNormalizer::new().with_preview(false)
}

const KAKAPO_TAXA: [&str; 5] = [
    "Kea_2019-05-01",
    "Kaka_2020-02-01",
    "Kakapo_2018-11-15",
    "Takahe_2021-01-20",
    "Weka_2020-08-30",
];

// --- OUTPUT DOCUMENT ---
#[test]
fn test_taxa_preserved_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("clean.trees");
    normalize(fixture("treesub_kakapo.tree"), &output).unwrap();

    let text = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.iter().position(|l| *l == "taxlabels").unwrap();
    let end = lines.iter().position(|l| *l == ";").unwrap();

    assert_eq!(&lines[start + 1..end], &KAKAPO_TAXA);
    assert!(lines.contains(&"dimensions ntax=5;"));
}

#[test]
fn test_output_layout() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("clean.trees");
    normalize(fixture("treesub_kakapo.tree"), &output).unwrap();

    let text = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "#NEXUS");
    assert_eq!(lines[1], "begin taxa;");
    assert_eq!(lines.len(), 14);
    assert_eq!(lines[lines.len() - 3], "begin trees;");
    assert!(lines[lines.len() - 2].starts_with("tree TREE1 = [&R] ((("));
    assert_eq!(lines[lines.len() - 1], "end;");
    assert!(text.ends_with("end;\n"));
}

#[test]
fn test_cleaned_tree_string() {
    let normalized = quiet()
        .normalize_str(&fs::read_to_string(fixture("treesub_kakapo.tree")).unwrap())
        .unwrap();

    assert_eq!(
        normalized.tree_string,
        "(((Kea_2019-05-01:0.01,Kaka_2020-02-01:0.02)7:0.005,Kakapo_2018-11-15:0.03)8:0.004,\
         (Takahe_2021-01-20:0.02,Weka_2020-08-30:0.01)9:0.006)6:0.0;"
    );
    assert!(!normalized.tree_string.contains("[&"));

    let tree = parse_str(&normalized.tree_string).unwrap();
    assert_eq!(tree.num_leaves(), 5);
    assert!(tree.is_valid());
    assert!(tree.find_by_name("8").is_some());
}

// --- SIDE TABLE ---
#[test]
fn test_side_table_rows() {
    let dir = tempfile::tempdir().unwrap();
    let side_table = normalize(fixture("treesub_kakapo.tree"), dir.path().join("clean.trees")).unwrap();

    // one row per annotation block, in order of appearance
    let numbers: Vec<&str> = side_table.iter().map(|r| r.node_num.as_str()).collect();
    assert_eq!(numbers, vec!["1", "2", "7", "3", "8", "4", "5", "9", "6"]);

    // brackets and quotes stripped
    assert_eq!(side_table.get("7").unwrap().nonsynsubs, "N145S,S193F");
    assert_eq!(side_table.get("8").unwrap().substitutions(), vec!["G5T", "L3I", "E62K"]);
    // listed but empty
    assert_eq!(side_table.get("3").unwrap().nonsynsubs, "");
    // absent key
    assert_eq!(side_table.get("2").unwrap().nonsynsubs, "*");
    assert_eq!(side_table.get("6").unwrap().nonsynsubs, "*");
    assert!(side_table.degraded().is_empty());
}

#[test]
fn test_identical_blocks_collapse_to_one_row() {
    // Both leaves carry the same block text. Replacement is by text, so they
    // share one row and one identifier: this is the intended default.
    let input = "#NEXUS\nbegin taxa;\ntaxlabels\nA\nB\n;\nend;\nbegin trees;\n\
                 tree tree_1 = [&R] (A[&NUMBER=\"1\"]:0.1,B[&NUMBER=\"1\"]:0.2)[&NUMBER=\"2\"]:0.0;\nend;\n";

    let collapsed = quiet().normalize_str(input).unwrap();
    assert_eq!(collapsed.side_table.len(), 2);
    assert_eq!(collapsed.tree_string, "(A:0.1,B:0.2)2:0.0;");

    let per_occurrence = quiet()
        .with_duplicate_policy(DuplicateBlocks::PerOccurrence)
        .normalize_str(input)
        .unwrap();
    assert_eq!(per_occurrence.side_table.len(), 3);
    assert_eq!(per_occurrence.tree_string, collapsed.tree_string);
}

#[test]
fn test_missing_number_is_degraded_not_fatal() {
    let normalized = quiet()
        .normalize_str(&fs::read_to_string(fixture("treesub_missing_number.tree")).unwrap())
        .unwrap();

    assert_eq!(normalized.side_table.len(), 5);
    assert_eq!(normalized.warnings.len(), 1);
    assert!(normalized.warnings[0].block.contains("REALNAME=\"lost\""));

    let degraded = normalized.side_table.degraded();
    assert_eq!(degraded.len(), 1);
    assert_eq!(degraded[0].nonsynsubs, "D10N");
    assert_eq!(normalized.tree_string, "((Kea:0.1,Kaka:0.2):0.05,Kakapo:0.3)4:0.0;");
}

#[test]
fn test_side_table_csv() {
    let dir = tempfile::tempdir().unwrap();
    let side_table = normalize(fixture("treesub_kakapo.tree"), dir.path().join("clean.trees")).unwrap();

    let csv_path = dir.path().join("nonsynsubs.csv");
    side_table.write_csv(&csv_path).unwrap();
    let text = fs::read_to_string(&csv_path).unwrap();
    assert!(text.starts_with("node_num,nonsynsubs\n1,K140I\n2,*\n7,\"N145S,S193F\"\n"));

    assert_eq!(SideTable::read_csv(&csv_path).unwrap(), side_table);
}

// --- JOINING BACK ONTO THE TREE ---
#[test]
fn test_side_table_joins_onto_loaded_tree() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("clean.trees");
    let normalized = quiet()
        .normalize_file(fixture("treesub_kakapo.tree"), &output)
        .unwrap();
    assert_eq!(normalized.side_table.len(), 9);

    let mut dated = read_dated_nexus(&output, "_").unwrap();
    let tree = &mut dated.tree;
    for taxon in KAKAPO_TAXA {
        assert!(tree.find_by_name(taxon).is_some(), "{taxon} missing");
    }

    // leaf rows have no vertex to go to
    assert_eq!(normalized.side_table.assign_to_tree(tree), 4);
    let node = tree.find_by_name("8").unwrap();
    assert_eq!(tree[node].trait_value(NONSYNSUBS_TRAIT), Some("G5T,L3I,E62K"));
    assert_eq!(tree[node].trait_value(NONSYN_COUNT_TRAIT), Some("3"));
    let root = tree.root_index();
    assert_eq!(tree[root].trait_value(NONSYN_COUNT_TRAIT), Some("0"));

    let highest = dated.highest_tip.unwrap();
    assert!((highest - (2021.0 + 19.0 / 365.0)).abs() < 1e-9);
}

#[test]
fn test_statement_prefix() {
    let input = "#NEXUS\nbegin taxa;\ntaxlabels\nA\nB\n;\nend;\nbegin trees;\n\
                 tree STATE_0 = [&U] (A[&NUMBER=\"1\"]:0.1,B[&NUMBER=\"2\"]:0.2)[&NUMBER=\"3\"]:0.0;\nend;\n";

    let err = quiet().normalize_str(input).unwrap_err();
    assert!(matches!(err, NormalizeError::MalformedInput(_)));

    let normalized = quiet()
        .with_tree_prefix(TreePrefix::Statement)
        .normalize_str(input)
        .unwrap();
    assert_eq!(normalized.tree_string, "(A:0.1,B:0.2)3:0.0;");
}

#[test]
fn test_default_output_loads_with_tip_dates() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("clean.trees");
    normalize(fixture("treesub_kakapo.tree"), &output).unwrap();

    let dated = read_dated_nexus(&output, "_").unwrap();
    let mut leaf_names: Vec<&str> = dated
        .tree
        .leaf_indices()
        .into_iter()
        .filter_map(|i| dated.tree[i].name())
        .collect();
    leaf_names.sort_unstable();
    let mut taxa = KAKAPO_TAXA.to_vec();
    taxa.sort_unstable();
    assert_eq!(leaf_names, taxa);
    let highest = dated.highest_tip.unwrap();
    assert!((highest - (2021.0 + 19.0 / 365.0)).abs() < 1e-9);
}

#[test]
fn test_numbered_leaf_blocks() {
    let normalized = quiet()
        .with_leaf_blocks(LeafBlocks::Identifier)
        .normalize_str(&fs::read_to_string(fixture("treesub_kakapo.tree")).unwrap())
        .unwrap();

    assert!(normalized.tree_string.starts_with("(((Kea_2019-05-011:0.01,Kaka_2020-02-012:0.02)7:0.005,"));
    assert_eq!(normalized.side_table.len(), 9);
}

// --- RE-RUNS AND FAILURES ---
#[test]
fn test_rerun_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("clean.trees");

    normalize(fixture("treesub_kakapo.tree"), &output).unwrap();
    let first = fs::read(&output).unwrap();
    normalize(fixture("treesub_kakapo.tree"), &output).unwrap();
    let second = fs::read(&output).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_missing_trees_block_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("clean.trees");

    let err = normalize(fixture("treesub_no_trees.tree"), &output).unwrap_err();
    assert!(matches!(err, NormalizeError::MalformedInput(_)));
    assert_eq!(err.io_kind(), None);
    assert!(!output.exists());
}

#[test]
fn test_missing_input_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = normalize(fixture("no_such_file.tree"), dir.path().join("clean.trees")).unwrap_err();
    assert_eq!(err.io_kind(), Some(ErrorKind::NotFound));
}

#[test]
fn test_unwritable_destination() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("missing_dir").join("clean.trees");

    let err = normalize(fixture("treesub_kakapo.tree"), &output).unwrap_err();
    match &err {
        NormalizeError::Io { path, .. } => assert_eq!(path, &output),
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(err.io_kind(), Some(ErrorKind::NotFound));
}
