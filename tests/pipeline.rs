use std::collections::HashSet;

use arff_split::export::{write_split, ExportFormat};
use arff_split::report::summary::SplitReport;
use arff_split::{
    coerce, parse_arff, parse_arff_with_stats, select_stratify_column, split, CellValue,
    SplitConfig, Stratification,
};

/// 100 rows: 60 tcp / 40 udp, an id column and a noisy numeric column.
fn kdd_like() -> String {
    let mut text = String::from(
        "% generated\n@relation traffic\n@attribute id numeric\n@attribute flag {SF,REJ}\n\
         @attribute 'protocol_type' {tcp,udp}\n@attribute bytes numeric\n@data\n",
    );
    for i in 0..100 {
        let proto = if i < 60 { "tcp" } else { "udp" };
        let flag = if i % 3 == 0 { "REJ" } else { "SF" };
        // Every tenth row uses an exponent, which per-token parsing keeps as text.
        let bytes = if i % 10 == 0 { format!("{i}e1") } else { format!("{}", i * 7) };
        text.push_str(&format!("{i},{flag},{proto},{bytes}\n"));
    }
    text
}

fn ids(table: &arff_split::Table) -> Vec<i64> {
    table
        .column_values(0)
        .map(|v| match v {
            CellValue::Integer(i) => *i,
            other => panic!("unexpected id {other}"),
        })
        .collect()
}

#[test]
fn parse_coerce_select_split_report() {
    let table = parse_arff(kdd_like().as_bytes()).unwrap();
    assert_eq!(table.len(), 100);
    assert_eq!(table.rows()[0][3], CellValue::Text("0e1".into()));

    let table = coerce(table);
    assert_eq!(table.rows()[10][3], CellValue::Float(100.0));
    assert_eq!(table.rows()[1][3], CellValue::Float(7.0));

    let column = select_stratify_column(&table);
    assert_eq!(column.as_deref(), Some("protocol_type"));

    let config = SplitConfig {
        stratify_column: column.clone(),
        ..SplitConfig::default()
    };
    let result = split(&table, &config).unwrap();
    assert_eq!(result.stratification, Stratification::Applied);
    assert_eq!(result.train.len() + result.val.len() + result.test.len(), 100);

    let mut seen = HashSet::new();
    for subset in [&result.train, &result.val, &result.test] {
        for id in ids(subset) {
            assert!(seen.insert(id), "row {id} appears twice");
        }
    }
    assert_eq!(seen.len(), 100);

    let report = SplitReport::new(&table, &result, &config);
    let dists = report.distributions.expect("distributions");
    let train_tcp = dists.train.iter().find(|vc| vc.value == CellValue::Text("tcp".into())).unwrap();
    assert_eq!(train_tcp.count, 36);
    assert_eq!(report.original.numeric_columns, vec!["id", "bytes"]);
}

#[test]
fn repeated_splits_are_identical() {
    let table = coerce(parse_arff(kdd_like().as_bytes()).unwrap());
    let config = SplitConfig {
        stratify_column: Some("protocol_type".into()),
        random_seed: 1234,
        ..SplitConfig::default()
    };
    let a = split(&table, &config).unwrap();
    let b = split(&table, &config).unwrap();
    assert_eq!(ids(&a.train), ids(&b.train));
    assert_eq!(ids(&a.val), ids(&b.val));
    assert_eq!(ids(&a.test), ids(&b.test));
}

#[test]
fn malformed_file_is_recovered_then_exported() {
    let input = "@attribute a numeric\n@attribute b numeric\n@attribute c string\n\
                 1,2,x\n3,4\n5,6,y,extra\n7,8,z % note\n";
    let parsed = parse_arff_with_stats(input.as_bytes()).unwrap();
    assert!(parsed.stats.missing_data_marker);
    assert_eq!(parsed.stats.padded_rows, 1);
    assert_eq!(parsed.stats.truncated_rows, 1);
    assert_eq!(parsed.table.rows()[1][2], CellValue::Null);

    let result = split(&parsed.table, &SplitConfig::default()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let paths = write_split(&result, dir.path(), ExportFormat::Json).unwrap();
    assert!(paths.iter().all(|p| p.exists()));
}
