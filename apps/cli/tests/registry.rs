use std::error::Error;

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn resolve_picks_most_specific_tag() -> Result<(), Box<dyn Error>> {
    cli()?
        .args(["resolve", "component/container/panel/tablepanel/treepanel"])
        .assert()
        .success()
        .stdout("treepanel -> tree\n");
    cli()?
        .args(["resolve", "component/container/panel/form"])
        .assert()
        .success()
        .stdout("panel -> panel\n");
    Ok(())
}

#[test]
fn resolve_unregistered_chain_fails() -> Result<(), Box<dyn Error>> {
    cli()?
        .args(["resolve", "component/button"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("no renderer registered for 'component/button'"));
    Ok(())
}

#[test]
fn registration_overrides_builtin() -> Result<(), Box<dyn Error>> {
    cli()?
        .args(["--register", "panel=chart", "resolve", "component/panel"])
        .assert()
        .success()
        .stdout("panel -> chart\n");
    Ok(())
}

#[test]
fn malformed_registration_is_rejected() -> Result<(), Box<dyn Error>> {
    cli()?
        .args(["--register", "panel", "renderers"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected TAG=ID"));
    Ok(())
}

#[test]
fn renderers_lists_defaults_sorted() -> Result<(), Box<dyn Error>> {
    cli()?
        .arg("renderers")
        .assert()
        .success()
        .stdout(
            "Registered renderers:\n  - chart -> chart\n  - gridpanel -> grid\n  - panel -> panel\n  - treepanel -> tree\n",
        );
    Ok(())
}

fn cli() -> Result<Command, Box<dyn Error>> {
    Ok(Command::cargo_bin("uxprinter-cli")?)
}
