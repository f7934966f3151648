use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const CATEGORIES: &str = r#"{
    "BLACKLIST": ["FASTER PAYMENT RECEIVED"],
    "Groceries": ["TESCO", "LIDL"]
}"#;

const RAW: &str = "Date,Description,Extra,Amount\n\
                   01/01/2025,TESCO,STORE 1,12.50\n\
                   02/01/2025,CORNER SHOP,,3.20\n\
                   03/01/2025,LIDL,,-4.00\n\
                   04/01/2025,FASTER PAYMENT RECEIVED,,-100\n";

fn penny(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("penny").unwrap();
    cmd.env("HOME", home.path())
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .arg("--data-dir")
        .arg(home.path().join("data"));
    cmd
}

fn setup(raw: &str, categories: Option<&str>) -> TempDir {
    let home = tempfile::tempdir().unwrap();
    let data = home.path().join("data");
    std::fs::create_dir_all(&data).unwrap();
    std::fs::write(data.join("raw.csv"), raw).unwrap();
    if let Some(c) = categories {
        std::fs::write(data.join("categories.json"), c).unwrap();
    }
    home
}

#[test]
fn test_import_reports_counts() {
    let home = setup(RAW, Some(CATEGORIES));
    penny(&home)
        .arg("import")
        .assert()
        .success()
        .stdout(predicate::str::contains("Classified: 3/4"))
        .stdout(predicate::str::contains("Unclassified: 1/4"));
    assert!(home.path().join("data/classified.csv").exists());
    assert!(home.path().join("data/unclassified.csv").exists());
}

#[test]
fn test_import_without_categories_shows_template() {
    let home = setup(RAW, None);
    penny(&home)
        .arg("import")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: Category definitions not usable"))
        .stderr(predicate::str::contains("For example"));
    assert!(!home.path().join("data/classified.csv").exists());
}

#[test]
fn test_import_names_missing_columns() {
    let home = setup("Description\nTESCO\n", Some(CATEGORIES));
    penny(&home)
        .arg("import")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Mandatory column(s) not found in raw.csv: Date, Amount"));
}

#[test]
fn test_classify_learns_manual_types() {
    let home = setup(RAW, Some(CATEGORIES));
    penny(&home).arg("import").assert().success();

    let path = home.path().join("data/unclassified.csv");
    let content = std::fs::read_to_string(&path).unwrap();
    std::fs::write(&path, content.replace("CORNER SHOP|,", "CORNER SHOP|,Snacks")).unwrap();

    penny(&home)
        .arg("classify")
        .assert()
        .success()
        .stdout(predicate::str::contains("New classifications: 1/1"));
    assert!(!path.exists());
    let mappings = std::fs::read_to_string(home.path().join("data/mappings.json")).unwrap();
    assert!(mappings.contains(r#""CORNER SHOP|": "Snacks""#));

    penny(&home)
        .arg("classify")
        .assert()
        .success()
        .stdout(predicate::str::contains("All transactions classified already"));
}

#[test]
fn test_categories_add_show_delete() {
    let home = setup(RAW, Some(CATEGORIES));
    penny(&home).arg("import").assert().success();

    penny(&home)
        .args(["categories", "add", "Shops,Travel", "--keyword", "CORNER"])
        .assert()
        .success()
        .stdout(predicate::str::contains(" >> Shops"))
        .stdout(predicate::str::contains("Re-processing raw data"))
        .stdout(predicate::str::contains("Classified: 4/4"));

    penny(&home)
        .args(["categories", "add", "groceries"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot create duplicate categories: groceries"));

    penny(&home)
        .args(["categories", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Shops"))
        .stdout(predicate::str::contains("CORNER"));

    penny(&home)
        .args(["categories", "delete", "shops,Nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot delete non-existent categories: Nope"));

    penny(&home)
        .args(["categories", "delete", "shops,TRAVEL"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Unclassified: 1/4"));
}

#[test]
fn test_info_lists_counts() {
    let home = setup(RAW, Some(CATEGORIES));
    penny(&home).arg("import").assert().success();
    penny(&home)
        .args(["info", "--unique"])
        .assert()
        .success()
        .stdout(predicate::str::contains("classified.csv"))
        .stdout(predicate::str::contains("Transactions (unique)"));
}
