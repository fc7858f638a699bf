//! Filesystem tests for batch renaming.

use std::fs;
use std::path::Path;

use fitsrename::{
    process_file, run_batch, BatchSummary, FrameTemplates, FrameType, Outcome, RenameOptions,
    ResolutionContext, SpacePolicy, SuffixPolicy, BLOCK_SIZE, CARD_SIZE,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn fits_bytes(cards: &[&str]) -> Vec<u8> {
    let mut out = Vec::new();
    for c in cards.iter().chain(std::iter::once(&"END")) {
        let mut card = [b' '; CARD_SIZE];
        card[..c.len()].copy_from_slice(c.as_bytes());
        out.extend_from_slice(&card);
    }
    out.resize(out.len().div_ceil(BLOCK_SIZE) * BLOCK_SIZE, b' ');
    out
}

fn xisf_bytes(keywords: &[(&str, &str)]) -> Vec<u8> {
    let mut xml = String::from("<xisf version=\"1.0\"><Image>");
    for (name, value) in keywords {
        xml.push_str(&format!("<FITSKeyword name=\"{name}\" value=\"{value}\"/>"));
    }
    xml.push_str("</Image></xisf>");

    let mut out = Vec::new();
    out.extend_from_slice(b"XISF0100");
    out.extend_from_slice(&(xml.len() as u32).to_le_bytes());
    out.extend_from_slice(&[0u8; 4]);
    out.extend_from_slice(xml.as_bytes());
    out
}

fn light(filter: &str) -> Vec<u8> {
    fits_bytes(&[
        "SIMPLE  =                    T",
        "IMAGETYP= 'Light Frame'",
        "OBJECT  = 'M 101'",
        format!("FILTER  = '{filter}'").as_str(),
        "EXPTIME =                180.0",
    ])
}

fn dark() -> Vec<u8> {
    fits_bytes(&[
        "SIMPLE  =                    T",
        "IMAGETYP= 'Dark Frame'",
        "EXPTIME =                180.0",
        "CCD-TEMP=                -10.0",
    ])
}

fn options(out: &Path) -> RenameOptions {
    let out = out.display();
    RenameOptions {
        templates: FrameTemplates::new()
            .with(FrameType::Light, &format!("{out}/lights/{{OBJECT}}/{{FILTER}}_{{EXPTIME:%d}}s_"))
            .with(FrameType::Dark, &format!("{out}/darks/{{EXPTIME:%d}}s_{{CCD-TEMP:%d}}C_")),
        context: ResolutionContext::new(),
        spaces: SpacePolicy::Underscore,
        suffix: SuffixPolicy::parse("%03d.fits", false).unwrap(),
        dry_run: false,
    }
}

// ---------------------------------------------------------------------------
// Batches
// ---------------------------------------------------------------------------

#[test]
fn renames_lights_and_darks_with_counters() {
    let raw = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    fs::write(raw.path().join("a.fits"), light("L")).unwrap();
    fs::write(raw.path().join("b.fits"), light("L")).unwrap();
    fs::write(raw.path().join("c.fits"), light("R")).unwrap();
    fs::write(raw.path().join("d.fits"), dark()).unwrap();

    let pattern = format!("{}/*.fits", raw.path().display());
    let summary = run_batch(&pattern, &options(out.path())).unwrap();
    assert_eq!(summary.renamed, 4);
    assert_eq!(summary.failed, 0);

    let lights = out.path().join("lights").join("M_101");
    assert!(lights.join("L_180s_000.fits").exists());
    assert!(lights.join("L_180s_001.fits").exists());
    assert!(lights.join("R_180s_000.fits").exists());
    assert!(out.path().join("darks").join("180s_-10C_000.fits").exists());
    assert_eq!(fs::read_dir(raw.path()).unwrap().count(), 0);
}

#[test]
fn recursive_glob_picks_up_xisf() {
    let raw = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let night = raw.path().join("2023-05-01").join("M101");
    fs::create_dir_all(&night).unwrap();
    fs::write(
        night.join("frame_0001.xisf"),
        xisf_bytes(&[
            ("IMAGETYP", "'Light Frame'"),
            ("OBJECT", "'M 101'"),
            ("FILTER", "'G'"),
            ("EXPOSURE", "120"),
        ]),
    )
    .unwrap();

    let pattern = format!("{}/**/*.xisf", raw.path().display());
    let summary = run_batch(&pattern, &options(out.path())).unwrap();
    assert_eq!(summary.renamed, 1);
    assert!(out.path().join("lights/M_101/G_120s_000.fits").exists());
}

#[test]
fn dry_run_touches_nothing() {
    let raw = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let src = raw.path().join("a.fits");
    fs::write(&src, light("Ha")).unwrap();

    let mut options = options(out.path());
    options.dry_run = true;
    let summary = run_batch(&format!("{}/*.fits", raw.path().display()), &options).unwrap();

    assert_eq!(
        summary,
        BatchSummary {
            renamed: 0,
            planned: 1,
            skipped: 0,
            failed: 0,
        }
    );
    assert!(src.exists());
    assert!(!out.path().join("lights").exists());
}

#[test]
fn failures_are_isolated_per_file() {
    let raw = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    // No FILTER header.
    fs::write(
        raw.path().join("a.fits"),
        fits_bytes(&[
            "SIMPLE  =                    T",
            "IMAGETYP= 'Light Frame'",
            "OBJECT  = 'M 101'",
            "EXPTIME =                180.0",
        ]),
    )
    .unwrap();
    fs::write(raw.path().join("b.fits"), light("B")).unwrap();
    // Unknown frame type.
    fs::write(
        raw.path().join("c.fits"),
        fits_bytes(&["SIMPLE  =                    T", "IMAGETYP= 'Master Bias'"]),
    )
    .unwrap();

    let summary = run_batch(&format!("{}/*.fits", raw.path().display()), &options(out.path())).unwrap();
    assert_eq!(
        summary,
        BatchSummary {
            renamed: 1,
            planned: 0,
            skipped: 1,
            failed: 1,
        }
    );
    assert!(raw.path().join("a.fits").exists());
    assert!(raw.path().join("c.fits").exists());
    assert!(out.path().join("lights/M_101/B_180s_000.fits").exists());
}

#[test]
fn literal_suffix_without_counter() {
    let raw = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let src = raw.path().join("a.fits");
    fs::write(&src, light("L")).unwrap();

    let mut options = options(out.path());
    options.suffix = SuffixPolicy::parse(".fits", true).unwrap();
    let outcome = process_file(&src, &options).unwrap();

    match outcome {
        Outcome::Renamed { to, .. } => {
            assert_eq!(to, out.path().join("lights/M_101/L_180s_.fits"));
            assert!(to.exists());
        }
        other => panic!("Expected Renamed, got {:?}", other),
    }
}

#[cfg(unix)]
#[test]
fn created_directories_follow_source_directory_mode() {
    use std::os::unix::fs::PermissionsExt;

    let raw = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    fs::set_permissions(raw.path(), fs::Permissions::from_mode(0o700)).unwrap();
    let src = raw.path().join("a.fits");
    fs::write(&src, light("L")).unwrap();

    process_file(&src, &options(out.path())).unwrap();

    let mode = fs::metadata(out.path().join("lights/M_101")).unwrap().permissions().mode();
    assert_eq!(mode & 0o077, 0);
}
