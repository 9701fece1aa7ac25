//! Integration tests for the compose command
//!
//! A tiny tilesheet is generated on the fly: 4x4 pixels, magenta color key
//! sampled at (0,0), one grass cell and one dirt cell of 2x2 each.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use image::{Rgba, RgbaImage};

const MAGENTA: Rgba<u8> = Rgba([255, 0, 255, 255]);
const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
const BROWN: Rgba<u8> = Rgba([139, 69, 19, 255]);

/// Get the path to the sdb binary
fn sdb_binary() -> PathBuf {
    if let Some(path) = option_env!("CARGO_BIN_EXE_sdb") {
        return PathBuf::from(path);
    }

    let release = Path::new("target/release/sdb");
    if release.exists() {
        return release.to_path_buf();
    }

    let debug = Path::new("target/debug/sdb");
    if debug.exists() {
        return debug.to_path_buf();
    }

    panic!("sdb binary not found. Run 'cargo build' first.");
}

/// Data directory plus sheet directory for one grass/dirt scenario.
///
/// Sheet layout: rect "0 0 2 2" is the grass cell (green pixel at (1,1)),
/// rect "2 0 2 2" is the dirt cell (brown pixels at its corners).
fn write_scenario(sprites_json: &str) -> (TempDir, TempDir) {
    let data = TempDir::new().unwrap();
    fs::write(
        data.path().join("database.json"),
        r#"[
            {"TableName": "BaseSprites", "JSON": [{"File": "basesprites.json", "Tilesheet": "floors.png"}]},
            {"TableName": "Sprites", "JSON": [{"File": "sprites.json"}]}
        ]"#,
    )
    .unwrap();
    fs::write(
        data.path().join("basesprites.json"),
        r#"[
            {"ID": "GrassBase", "SourceRectangle": "0 0 2 2"},
            {"ID": "DirtBase", "SourceRectangle": "2 0 2 2"}
        ]"#,
    )
    .unwrap();
    fs::write(data.path().join("sprites.json"), sprites_json).unwrap();

    let sheets = TempDir::new().unwrap();
    let mut img = RgbaImage::from_pixel(4, 4, MAGENTA);
    img.put_pixel(1, 1, GREEN);
    img.put_pixel(2, 0, BROWN);
    img.put_pixel(3, 1, BROWN);
    img.save(sheets.path().join("floors.png")).unwrap();

    (data, sheets)
}

fn run_compose(data: &TempDir, sheets: &TempDir, extra: &[&str]) -> std::process::Output {
    let mut cmd = Command::new(sdb_binary());
    cmd.arg("compose")
        .arg(data.path())
        .arg("--sheets")
        .arg(sheets.path());
    for arg in extra {
        cmd.arg(arg);
    }
    cmd.output().expect("Failed to execute sdb")
}

#[test]
fn test_compose_writes_all_sprites() {
    let (data, sheets) = write_scenario(
        r#"[
            {"ID": "GrassFloor", "BaseSprite": "GrassBase"},
            {"ID": "Path", "Combine": [{"BaseSprite": "DirtBase"}, {"Sprite": "GrassFloor", "Offset": "2 2"}]}
        ]"#,
    );
    let out = TempDir::new().unwrap();
    let out_arg = out.path().to_str().unwrap().to_string();

    let output = run_compose(&data, &sheets, &["-o", &out_arg]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Loading images..."), "stdout: {}", stdout);
    assert!(stdout.contains("Saved:"), "stdout: {}", stdout);

    let grass = image::open(out.path().join("GrassFloor.png"))
        .unwrap()
        .to_rgba8();
    assert_eq!(grass.dimensions(), (2, 2));
    // Color key became transparency, the one real pixel survived
    assert_eq!(grass.get_pixel(0, 0)[3], 0);
    assert_eq!(*grass.get_pixel(1, 1), GREEN);

    // Canvas grows to fit the offset layer, lower layer shows through
    let path = image::open(out.path().join("Path.png")).unwrap().to_rgba8();
    assert_eq!(path.dimensions(), (4, 4));
    assert_eq!(*path.get_pixel(0, 0), BROWN);
    assert_eq!(*path.get_pixel(1, 1), BROWN);
    assert_eq!(*path.get_pixel(3, 3), GREEN);
    assert_eq!(path.get_pixel(2, 2)[3], 0);
}

#[test]
fn test_compose_single_sprite_scaled() {
    let (data, sheets) = write_scenario(r#"[{"ID": "GrassFloor", "BaseSprite": "GrassBase"}]"#);
    let out = TempDir::new().unwrap();
    let file = out.path().join("grass.png");
    let file_arg = file.to_str().unwrap().to_string();

    let output = run_compose(
        &data,
        &sheets,
        &["--sprite", "GrassFloor", "--scale", "3", "-o", &file_arg],
    );
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let img = image::open(&file).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (6, 6));
    // (1,1) became a 3x3 block
    assert_eq!(*img.get_pixel(3, 3), GREEN);
    assert_eq!(*img.get_pixel(5, 5), GREEN);
    assert_eq!(img.get_pixel(0, 0)[3], 0);
}

#[test]
fn test_compose_unknown_sprite_id_errors() {
    let (data, sheets) = write_scenario(r#"[{"ID": "GrassFloor", "BaseSprite": "GrassBase"}]"#);

    let output = run_compose(&data, &sheets, &["--sprite", "Nope"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No sprite with ID 'Nope'"), "stderr: {}", stderr);
}

#[test]
fn test_compose_dangling_reference_warns_but_succeeds() {
    let (data, sheets) = write_scenario(
        r#"[
            {"ID": "GrassFloor", "BaseSprite": "GrassBase"},
            {"ID": "Broken", "Combine": [{"Sprite": "Ghost"}]}
        ]"#,
    );
    let out = TempDir::new().unwrap();
    let out_arg = out.path().to_str().unwrap().to_string();

    let output = run_compose(&data, &sheets, &["-o", &out_arg]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("'Ghost'"), "stderr: {}", stderr);
    assert!(stderr.contains("never resolved"), "stderr: {}", stderr);

    // The resolvable sprite still came out
    assert!(out.path().join("GrassFloor.png").exists());
    assert!(!out.path().join("Broken.png").exists());
}

#[test]
fn test_compose_missing_sheet_warns_but_completes() {
    let (data, _) = write_scenario(r#"[{"ID": "GrassFloor", "BaseSprite": "GrassBase"}]"#);
    let empty_sheets = TempDir::new().unwrap();

    let output = run_compose(&data, &empty_sheets, &[]);
    // Nothing resolves, so composing everything finds no images
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("floors.png"), "stderr: {}", stderr);
}

#[test]
fn test_compose_missing_manifest_is_usage_error() {
    let data = TempDir::new().unwrap();
    let sheets = TempDir::new().unwrap();

    let output = Command::new(sdb_binary())
        .arg("compose")
        .arg(data.path())
        .arg("--sheets")
        .arg(sheets.path())
        .output()
        .expect("Failed to execute sdb");

    assert_eq!(output.status.code(), Some(2));
}
