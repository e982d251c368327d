use anyhow::{anyhow, Result};
use regex::Regex;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::log;

const TESSDATA_REPO: &str = "https://github.com/tesseract-ocr/tessdata/raw/main";

/// Where the engine lives and, if it needs one, which tessdata to use.
#[derive(Debug, Clone)]
pub struct TesseractPaths {
    pub executable: PathBuf,
    /// `None` means the executable's built-in tessdata has `eng`.
    pub tessdata: Option<PathBuf>,
}

/// Returns the directory for storing Tesseract files
pub fn get_tesseract_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("loot-scout")
        .join("tesseract")
}

/// Locates Tesseract and makes sure English trained data is available,
/// downloading `eng.traineddata` into the local data dir if necessary.
pub fn ensure_tesseract(configured: Option<&Path>) -> Result<TesseractPaths> {
    let executable = find_tesseract_executable(configured)?;

    match tesseract_version(&executable) {
        Ok(version) => log(&format!(
            "Tesseract {} found at: {}",
            version,
            executable.display()
        )),
        Err(e) => log(&format!("Could not read Tesseract version: {}", e)),
    }

    if let Some(tessdata) = find_tessdata_dir() {
        return Ok(TesseractPaths {
            executable,
            tessdata: Some(tessdata),
        });
    }

    let langs = Command::new(&executable).arg("--list-langs").output()?;
    let listing = format!(
        "{}{}",
        String::from_utf8_lossy(&langs.stdout),
        String::from_utf8_lossy(&langs.stderr)
    );
    if lists_language(&listing, "eng") {
        return Ok(TesseractPaths {
            executable,
            tessdata: None,
        });
    }

    log("eng.traineddata not found, downloading...");
    let tessdata_dir = get_tesseract_dir().join("tessdata");
    fs::create_dir_all(&tessdata_dir)?;
    download_tessdata(&tessdata_dir)?;

    Ok(TesseractPaths {
        executable,
        tessdata: Some(tessdata_dir),
    })
}

/// Downloads English trained data
fn download_tessdata(tessdata_dir: &Path) -> Result<()> {
    let eng_url = format!("{}/eng.traineddata", TESSDATA_REPO);
    let eng_path = tessdata_dir.join("eng.traineddata");

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    let response = client
        .get(&eng_url)
        .header("User-Agent", "loot-scout")
        .send()?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Failed to download eng.traineddata: HTTP {}",
            response.status()
        ));
    }

    let bytes = response.bytes()?;
    let mut file = fs::File::create(&eng_path)?;
    file.write_all(&bytes)?;

    log(&format!(
        "Downloaded eng.traineddata ({} bytes)",
        bytes.len()
    ));

    Ok(())
}

/// Finds the Tesseract executable: configured path, local dir, PATH, then
/// common install locations.
pub fn find_tesseract_executable(configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = configured {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        log(&format!(
            "Configured Tesseract path {} does not exist, searching",
            path.display()
        ));
    }

    let exe_name = if cfg!(windows) { "tesseract.exe" } else { "tesseract" };
    let local_exe = get_tesseract_dir().join(exe_name);
    if local_exe.exists() {
        return Ok(local_exe);
    }

    // Check PATH
    if let Ok(output) = Command::new("tesseract").arg("--version").output() {
        if output.status.success() {
            return Ok(PathBuf::from("tesseract"));
        }
    }

    let common_paths = [
        "/opt/homebrew/bin/tesseract",
        "/usr/local/bin/tesseract",
        "/usr/bin/tesseract",
        r"C:\Program Files\Tesseract-OCR\tesseract.exe",
        r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
    ];

    for path in &common_paths {
        let p = PathBuf::from(path);
        if p.exists() {
            return Ok(p);
        }
    }

    Err(anyhow!("Tesseract not found. Please install Tesseract-OCR."))
}

/// Finds a tessdata directory holding `eng.traineddata`, local dir first.
pub fn find_tessdata_dir() -> Option<PathBuf> {
    let local_tessdata = get_tesseract_dir().join("tessdata");
    if local_tessdata.join("eng.traineddata").exists() {
        return Some(local_tessdata);
    }

    // Check TESSDATA_PREFIX environment variable
    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        let p = PathBuf::from(&prefix);
        if p.join("eng.traineddata").exists() {
            return Some(p);
        }
        let p = p.join("tessdata");
        if p.join("eng.traineddata").exists() {
            return Some(p);
        }
    }

    None
}

fn tesseract_version(executable: &Path) -> Result<String> {
    let output = Command::new(executable).arg("--version").output()?;
    // Older releases print the banner on stderr
    let text = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    parse_version(&text).ok_or_else(|| anyhow!("unrecognized --version output"))
}

/// Extracts the version number from `tesseract --version` output.
pub fn parse_version(text: &str) -> Option<String> {
    let re = Regex::new(r"(?m)^tesseract v?(\d+\.\d+(?:\.\d+)?)").ok()?;
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Returns true if `tesseract --list-langs` output includes `lang`.
pub fn lists_language(listing: &str, lang: &str) -> bool {
    listing
        .lines()
        .skip_while(|l| !l.starts_with("List of available languages"))
        .skip(1)
        .any(|l| l.trim() == lang)
}
