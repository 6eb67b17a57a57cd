use admit_fit::institutions::InstitutionTable;
use admit_fit::{CriterionName, DataError};

const WEIGHTED_CSV: &str = "\
Name,Country,GlobalRank,RequiredScore,Grades,Essay,LOR,Interview
Northfield University,UK,12,88,0.5,0.2,0.3,
Lakeside College,USA,=45,72.5,40%,30%,20%,10%
Harbour Institute,Canada,,n/a,0.6,-0.1,abc,0.4
,UK,99,50,1,0,0,0
";

const COUNTRY_WEIGHTS_CSV: &str = "\
Country,Grades (Academics),Personal Statement/Essay,Letters of Recommendation (LORs),Extracurricular Activities,Interview,Total
UK,0.6,0.2,0.2,0,0,1
Country,,,,,,
USA,0.35,0.25,0.15,0.15,0.1,1
";

const UNIVERSITIES_CSV: &str = "\
Country,University,QS World Rank,Required Profile Score
UK,Northfield University,12,88
USA,Lakeside College,45,72
Germany,Rhein Polytechnic,80,65
USA,Prairie State,,55
";

#[test]
fn loads_per_row_weights_and_metadata() {
    let table = InstitutionTable::from_reader(WEIGHTED_CSV.as_bytes()).expect("table parses");
    assert_eq!(table.len(), 3);

    let northfield = &table.rows()[0];
    assert_eq!(northfield.global_rank, Some(12));
    assert_eq!(northfield.required_score, Some(88.0));
    assert_eq!(northfield.weight(CriterionName::Lor), 0.3);
    assert_eq!(northfield.weight(CriterionName::Interview), 0.0);

    let lakeside = &table.rows()[1];
    assert_eq!(lakeside.global_rank, Some(45));
    assert!((lakeside.weight(CriterionName::Grades) - 0.4).abs() < 1e-9);
}

#[test]
fn bad_cells_degrade_to_missing() {
    let table = InstitutionTable::from_reader(WEIGHTED_CSV.as_bytes()).expect("table parses");
    let harbour = &table.rows()[2];

    assert_eq!(harbour.global_rank, None);
    assert_eq!(harbour.required_score, None);
    assert!(!harbour.weights.contains_key(&CriterionName::Essay));
    assert!(!harbour.weights.contains_key(&CriterionName::Lor));
    assert_eq!(harbour.weight(CriterionName::Interview), 0.4);
}

#[test]
fn percent_required_scores_stay_on_fit_scale() {
    let csv = "Name,Country,RequiredScore,Grades\nNorthfield,UK,85%,1\n";
    let table = InstitutionTable::from_reader(csv.as_bytes()).expect("table parses");
    assert_eq!(table.rows()[0].required_score, Some(85.0));
    assert_eq!(table.rows()[0].weight(CriterionName::Grades), 1.0);
}

#[test]
fn unknown_columns_are_rejected() {
    let csv = "Name,Country,Vibes\nNorthfield,UK,0.4\n";
    match InstitutionTable::from_reader(csv.as_bytes()) {
        Err(DataError::UnknownColumn(column)) => assert_eq!(column, "Vibes"),
        other => panic!("expected unknown column error, got {:?}", other),
    }
}

#[test]
fn name_column_is_required() {
    let csv = "Country,Grades\nUK,0.4\n";
    assert!(matches!(
        InstitutionTable::from_reader(csv.as_bytes()),
        Err(DataError::MissingColumn("Name"))
    ));
}

#[test]
fn split_tables_join_weights_by_country() {
    let table = InstitutionTable::from_split_readers(
        COUNTRY_WEIGHTS_CSV.as_bytes(),
        UNIVERSITIES_CSV.as_bytes(),
    )
    .expect("split tables parse");

    assert_eq!(table.country_weights().len(), 2);
    assert_eq!(table.len(), 4);

    let lakeside = &table.rows()[1];
    assert_eq!(lakeside.weight(CriterionName::Eca), 0.15);
    assert_eq!(lakeside.required_score, Some(72.0));

    let rhein = &table.rows()[2];
    assert!(rhein.weights.is_empty());
}

#[test]
fn catalogue_views_follow_rank_and_country() {
    let table = InstitutionTable::from_split_readers(
        COUNTRY_WEIGHTS_CSV.as_bytes(),
        UNIVERSITIES_CSV.as_bytes(),
    )
    .expect("split tables parse");

    assert_eq!(table.countries(), vec!["UK", "USA", "Germany"]);

    let ranked: Vec<&str> = table
        .by_global_rank(&[])
        .iter()
        .map(|row| row.name.as_str())
        .collect();
    assert_eq!(
        ranked,
        vec!["Northfield University", "Lakeside College", "Rhein Polytechnic", "Prairie State"]
    );

    let usa: Vec<&str> = table
        .by_global_rank(&["USA".to_string()])
        .iter()
        .map(|row| row.name.as_str())
        .collect();
    assert_eq!(usa, vec!["Lakeside College", "Prairie State"]);
}
