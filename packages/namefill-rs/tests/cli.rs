//! Integration tests for the CLI commands

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use lopdf::{dictionary, Document, Object};
use predicates::prelude::*;

/// Writes a one-page US Letter PDF, optionally with AcroForm text fields
/// stacked down the page.
fn write_pdf(path: &Path, fields: &[&str]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(612), Object::Integer(792)],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );
    let mut catalog = dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    };
    if !fields.is_empty() {
        let refs: Vec<Object> = fields
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let top = 700 - 40 * i as i64;
                Object::Reference(doc.add_object(dictionary! {
                    "T" => Object::string_literal(*name),
                    "FT" => "Tx",
                    "Subtype" => "Widget",
                    "Rect" => vec![
                        Object::Integer(72),
                        Object::Integer(top - 20),
                        Object::Integer(300),
                        Object::Integer(top),
                    ],
                    "P" => page_id,
                }))
            })
            .collect();
        if let Ok(Object::Dictionary(page)) = doc.get_object_mut(page_id) {
            page.set("Annots", refs.clone());
        }
        let form_id = doc.add_object(dictionary! { "Fields" => refs });
        catalog.set("AcroForm", form_id);
    }
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

#[test]
fn test_version_command() {
    let mut cmd = cargo_bin_cmd!("namefill");
    cmd.arg("version");

    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("namefill "));
}

#[test]
fn test_version_flag() {
    let mut cmd = cargo_bin_cmd!("namefill");
    cmd.arg("--version");

    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("namefill "));
}

#[test]
fn test_fields_command_lists_acroform_fields() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("form.pdf");
    write_pdf(&input, &["date", "applicant_name"]);

    let mut cmd = cargo_bin_cmd!("namefill");
    cmd.arg("fields").arg("--input").arg(&input);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"applicant_name\""))
        .stdout(predicate::str::contains("\"date\""));
}

#[test]
fn test_fill_command_uses_form_field() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("form.pdf");
    let output = dir.path().join("out.pdf");
    write_pdf(&input, &["full_name"]);

    let mut cmd = cargo_bin_cmd!("namefill");
    cmd.arg("fill")
        .arg("-i")
        .arg(&input)
        .arg("-n")
        .arg("Jane Doe")
        .arg("-o")
        .arg(&output);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Filled form field \"full_name\""));
    assert!(output.exists());

    let mut cmd = cargo_bin_cmd!("namefill");
    cmd.arg("fields").arg("--input").arg(&output);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"fields\": []"));
}

#[test]
fn test_locate_blank_page_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("blank.pdf");
    write_pdf(&input, &[]);

    let mut cmd = cargo_bin_cmd!("namefill");
    cmd.arg("locate").arg("--input").arg(&input).arg("--name").arg("Jane Doe");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"common_position\""))
        .stdout(predicate::str::contains("\"font_size\": 12.0"));
}

#[test]
fn test_missing_name_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("blank.pdf");
    write_pdf(&input, &[]);

    let mut cmd = cargo_bin_cmd!("namefill");
    cmd.arg("locate").arg("-i").arg(&input).arg("-n").arg(" ");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("no name provided"));
}

#[test]
fn test_missing_input_fails() {
    let mut cmd = cargo_bin_cmd!("namefill");
    cmd.arg("fields").arg("--input").arg("does-not-exist.pdf");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Error: failed to read"));
}
