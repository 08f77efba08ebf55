use phylotraits::dates::{DateError, DecimalDate, decimal_date, decimal_date_default, is_float};

#[test]
fn test_mid_year_within_year() {
    let value = decimal_date_default("2020-07-01").unwrap();
    assert!(value > 2020.0 && value < 2021.0);
}

#[test]
fn test_year_only_with_variable() {
    assert_eq!(decimal_date("2020", "%Y-%m-%d", true, "-").unwrap(), 2020.0);
}

#[test]
fn test_float_passthrough() {
    assert!(is_float("2016.37"));
    assert_eq!(decimal_date_default("2016.37").unwrap(), 2016.37);
    assert_eq!(decimal_date_default(" 1999 ").unwrap(), 1999.0);
}

#[test]
fn test_end_of_year() {
    let value = decimal_date_default("2019-12-31").unwrap();
    assert!((value - (2019.0 + 364.0 / 365.0)).abs() < 1e-9);
}

#[test]
fn test_other_layouts() {
    let us = DecimalDate::default().with_format("%m/%d/%Y").with_splitter("/");
    assert_eq!(us.convert("07/01/2020").unwrap(), decimal_date_default("2020-07-01").unwrap());

    let err = DecimalDate::default().convert("2020/07/01").unwrap_err();
    match err {
        DateError::Unparseable { date, format, .. } => {
            assert_eq!(date, "2020/07/01");
            assert_eq!(format, "%Y-%m-%d");
        }
        other => panic!("unexpected error {other:?}"),
    }
}
