#![cfg(feature = "cli")]

use std::fs;

use assert_cmd::Command;
use calamine::{Reader, Xlsx, open_workbook};
use predicates::str::contains as str_contains;
use rust_xlsxwriter::Workbook;
use tempfile::{NamedTempFile, tempdir};

const DEMAND: &str = "\
Descripcion,Marca,Unit Quantity,Cajas por hora linea automatica,Cajas por hora linea manual
Milka Oreo,Milka,100,50,80
Galleta Maria,ACME,1000,10,100
Milka Grande,MILKA,1000,10,5
";

#[allow(deprecated)]
fn run_cli(script: &str) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("cli").expect("cli binary");
    cmd.write_stdin(script.to_string()).assert()
}

fn demand_file() -> NamedTempFile {
    let tmp = NamedTempFile::new().expect("create temp file");
    fs::write(tmp.path(), DEMAND).expect("write demand");
    tmp
}

#[test]
fn cli_requires_a_plan_before_metrics() {
    run_cli("metrics\nquit\n")
        .success()
        .stdout(str_contains("No plan loaded. Use 'load <csv_path>' first."));
}

#[test]
fn cli_loads_demand_and_reports_truncation() {
    let demand = demand_file();
    let script = format!("load {}\nquit\n", demand.path().display());
    run_cli(&script)
        .success()
        .stdout(str_contains("Loaded 3 demand rows;"))
        .stdout(str_contains(
            "Warning: row 2 (Milka Grande) truncated: 49/1000 boxes scheduled (NoThroughput).",
        ));
}

#[test]
fn cli_metrics_follow_filter() {
    let demand = demand_file();
    let script = format!(
        "load {}\nfilter line 3\nmetrics\ndaily\nfilter clear\nquit\n",
        demand.path().display()
    );
    run_cli(&script)
        .success()
        .stdout(str_contains("Filter updated."))
        .stdout(str_contains("Active lines : 2"))
        .stdout(str_contains("Headcount    : 12"))
        .stdout(str_contains("Total boxes  : 1000"))
        .stdout(str_contains("Lunes      : 700"))
        .stdout(str_contains("Viernes    : 0"))
        .stdout(str_contains("Filter cleared."));
}

#[test]
fn cli_rejects_unknown_day_filter() {
    let demand = demand_file();
    let script = format!("load {}\nfilter day Sabado\nquit\n", demand.path().display());
    let assert = run_cli(&script).success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(!output.contains("Filter updated."), "{output}");
}

#[test]
fn cli_exports_workbook_as_json_and_csv() {
    let demand = demand_file();
    let dir = tempdir().expect("temp dir");
    let json_path = dir.path().join("plan.json");
    let csv_dir = dir.path().join("sheets");
    let script = format!(
        "load {}\nfilter brand acme\nexport json {}\nexport csv {}\nquit\n",
        demand.path().display(),
        json_path.display(),
        csv_dir.display()
    );
    run_cli(&script)
        .success()
        .stdout(str_contains("Workbook saved to"));

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(raw["Vista_Filtrada"].as_array().unwrap().len(), 2);
    assert!(csv_dir.join("Plan_Completo.csv").exists());
    assert!(csv_dir.join("Vista_Filtrada.csv").exists());
}

#[test]
fn cli_config_load_replans() {
    let demand = demand_file();
    let config = NamedTempFile::new().expect("create temp file");
    fs::write(config.path(), r#"{"crew_per_line": 10}"#).unwrap();
    let script = format!(
        "load {}\nconfig load {}\nmetrics\nquit\n",
        demand.path().display(),
        config.path().display()
    );
    run_cli(&script)
        .success()
        .stdout(str_contains("Config loaded from"))
        .stdout(str_contains("Headcount    : 20"));
}

#[test]
fn cli_loads_xlsx_demand_and_exports_xlsx() {
    let dir = tempdir().expect("temp dir");
    let demand = dir.path().join("demanda.xlsx");
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (row, line) in DEMAND.lines().enumerate() {
        for (col, value) in line.split(',').enumerate() {
            let written = match value.parse::<f64>() {
                Ok(number) => sheet.write_number(row as u32, col as u16, number),
                Err(_) => sheet.write_string(row as u32, col as u16, value),
            };
            written.unwrap();
        }
    }
    workbook.save(&demand).unwrap();

    let out = dir.path().join("plan_produccion.xlsx");
    let script = format!(
        "load {}\nfilter line 3\nexport xlsx {}\nquit\n",
        demand.display(),
        out.display()
    );
    run_cli(&script)
        .success()
        .stdout(str_contains("Loaded 3 demand rows;"))
        .stdout(str_contains("Workbook saved to"));

    let mut book: Xlsx<_> = open_workbook(&out).unwrap();
    assert_eq!(book.sheet_names(), vec!["Plan_Completo", "Vista_Filtrada"]);
    assert_eq!(book.worksheet_range("Vista_Filtrada").unwrap().height(), 3);
}
