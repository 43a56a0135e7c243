use std::error::Error;
use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn render_grid_to_stdout() -> Result<(), Box<dyn Error>> {
    cli()?
        .args(["render", fixture("orders.json").to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("<!DOCTYPE html PUBLIC"))
        .stdout(predicate::str::contains("<title>Orders</title>"))
        .stdout(predicate::str::contains(
            "<thead><tr><th>Customer</th><th>Total</th></tr></thead>",
        ))
        .stdout(predicate::str::contains("<tr><td>Acme</td><td>1250.5</td></tr>"))
        .stdout(predicate::str::contains(
            "<tr><td colspan=\"2\"><em>rush order</em></td></tr>",
        ))
        .stdout(predicate::str::contains("internal").not())
        .stdout(predicate::str::contains("standard").not());
    Ok(())
}

#[test]
fn render_applies_override_flags() -> Result<(), Box<dyn Error>> {
    let workspace = tempdir()?;
    let output = workspace.path().join("notes.html");

    cli()?
        .args([
            "render",
            fixture("notes.json").to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
            "--base-cls",
            "release",
            "--style-sheet",
            "/css/a.css",
            "--style-sheet",
            "/css/b.css",
            "--doc-type",
            "<!DOCTYPE html>",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rendered 'release notes'"));

    let html = fs::read_to_string(output)?;
    assert!(html.starts_with("<!DOCTYPE html><html>"));
    assert!(html.contains("<body class=\"release\">"));
    let default = html.find("/resources/css/printer.css").unwrap();
    let a = html.find("/css/a.css").unwrap();
    let b = html.find("/css/b.css").unwrap();
    assert!(default < a && a < b);
    assert!(html.contains(
        "<div class=\"x-panel-print\"><h2>Release</h2><p>Fixed printing.</p></div>"
    ));
    assert!(html.contains("<title>Printing</title>"));
    Ok(())
}

#[test]
fn render_uses_stored_settings_beneath_flags() -> Result<(), Box<dyn Error>> {
    let workspace = tempdir()?;
    let settings = workspace.path().join("printer.json");
    fs::write(
        &settings,
        serde_json::json!({"base_cls": "stored", "style_sheets": ["/css/stored.css"]}).to_string(),
    )?;

    cli()?
        .args([
            "--settings",
            settings.to_str().unwrap(),
            "render",
            fixture("notes.json").to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("<body class=\"stored\">"))
        .stdout(predicate::str::contains("href=\"/css/stored.css\""));

    cli()?
        .args([
            "--settings",
            settings.to_str().unwrap(),
            "render",
            fixture("notes.json").to_str().unwrap(),
            "--base-cls",
            "flag",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("<body class=\"flag\">"));
    Ok(())
}

#[test]
fn render_unknown_component_fails() -> Result<(), Box<dyn Error>> {
    cli()?
        .args(["render", fixture("button.json").to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("no renderer for 'component/button'"));
    Ok(())
}

#[test]
fn render_with_registered_renderer_succeeds() -> Result<(), Box<dyn Error>> {
    cli()?
        .args([
            "--register",
            "button=panel",
            "render",
            fixture("button.json").to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "<div class=\"x-panel-print\"><span>Save</span></div>",
        ));
    Ok(())
}

#[test]
fn render_missing_snapshot_reports_path() -> Result<(), Box<dyn Error>> {
    cli()?
        .args(["render", "does/not/exist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does/not/exist.json"));
    Ok(())
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn cli() -> Result<Command, Box<dyn Error>> {
    Ok(Command::cargo_bin("uxprinter-cli")?)
}
