//! Font loading for the TOC and newspaper renderers.
//!
//! `genpdf` needs real TrueType files both for measuring and for embedding. The bundled family is
//! searched in `PDF_TOC_FONTS_DIR`, next to the running binary and in the crate's `assets/fonts`
//! directory, in that order. When none of those hold the files, the Arial family from the Windows
//! font directory is used as a fallback.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use genpdf::error::{Error, ErrorKind};
use genpdf::fonts::{self, FontData, FontFamily};
use log::{debug, warn};

/// Name of the bundled font family.
pub const DEFAULT_FONT_FAMILY_NAME: &str = "LiberationSans";

/// Environment variable overriding the bundled font directory.
pub const FONTS_DIR_ENV: &str = "PDF_TOC_FONTS_DIR";

/// Environment variable overriding the Windows fallback font directory.
pub const WINDOWS_FONTS_DIR_ENV: &str = "PDF_TOC_WINDOWS_FONTS_DIR";

const FONT_FILES: &[&str] = &[
    "LiberationSans-Regular.ttf",
    "LiberationSans-Bold.ttf",
    "LiberationSans-Italic.ttf",
    "LiberationSans-BoldItalic.ttf",
];

const WINDOWS_FALLBACK_FAMILY_NAME: &str = "Arial";

struct WindowsFontFiles {
    regular: &'static str,
    bold: &'static str,
    italic: &'static str,
    bold_italic: &'static str,
}

const WINDOWS_FONT_FILES: WindowsFontFiles = WindowsFontFiles {
    regular: "arial.ttf",
    bold: "arialbd.ttf",
    italic: "ariali.ttf",
    bold_italic: "arialbi.ttf",
};

/// Directory holding the fonts shipped with the crate sources.
pub fn bundled_fonts_source_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts")
}

fn env_path(var: &str) -> Option<PathBuf> {
    env::var_os(var).and_then(|value| {
        let path = PathBuf::from(value);
        if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        }
    })
}

fn font_directory_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(path) = env_path(FONTS_DIR_ENV) {
        candidates.push(path);
    }

    if let Ok(current_exe) = env::current_exe() {
        if let Some(bin_dir) = current_exe.parent() {
            let candidate = bin_dir.join("assets/fonts");
            if !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }
    }

    let manifest_candidate = bundled_fonts_source_dir();
    if !candidates.contains(&manifest_candidate) {
        candidates.push(manifest_candidate);
    }

    candidates
}

fn missing_font_files(path: &Path) -> Vec<PathBuf> {
    FONT_FILES
        .iter()
        .map(|name| path.join(name))
        .filter(|candidate| !candidate.is_file())
        .collect()
}

fn resolve_font_directory() -> Result<PathBuf, Error> {
    let mut attempts = Vec::new();

    for candidate in font_directory_candidates() {
        let exists = candidate.is_dir();
        let missing = missing_font_files(&candidate);

        if exists && missing.is_empty() {
            debug!("using fonts from {}", candidate.display());
            return Ok(candidate);
        }

        let reason = if !exists {
            format!("directory missing at {}", candidate.display())
        } else {
            let missing_list = missing
                .iter()
                .map(|path| path.file_name().unwrap_or_default().to_string_lossy())
                .collect::<Vec<_>>()
                .join(", ");
            format!("missing files [{}]", missing_list)
        };

        attempts.push(format!("{} ({})", candidate.display(), reason));
    }

    Err(Error::new(
        format!(
            "Unable to locate bundled font directory. Checked: {}. Set {} to a directory containing {}.",
            attempts.join(", "),
            FONTS_DIR_ENV,
            FONT_FILES.join(", ")
        ),
        io::Error::new(io::ErrorKind::NotFound, "bundled fonts directory not found"),
    ))
}

fn load_bundled_font_family() -> Result<FontFamily<FontData>, Error> {
    let directory = resolve_font_directory()?;

    fonts::from_files(&directory, DEFAULT_FONT_FAMILY_NAME, None).map_err(|err| {
        Error::new(
            format!(
                "Failed to load default font family '{}' from {}: {}",
                DEFAULT_FONT_FAMILY_NAME,
                directory.display(),
                err
            ),
            io::Error::new(io::ErrorKind::Other, err.to_string()),
        )
    })
}

fn windows_font_directory() -> Option<PathBuf> {
    if let Some(path) = env_path(WINDOWS_FONTS_DIR_ENV) {
        return Some(path);
    }

    #[cfg(windows)]
    {
        for var in ["WINDIR", "SystemRoot"] {
            if let Some(root) = env_path(var) {
                let candidate = root.join("Fonts");
                if candidate.is_dir() {
                    return Some(candidate);
                }
            }
        }
    }

    None
}

fn load_windows_font(directory: &Path, file: &str, style: &str) -> Result<FontData, Error> {
    let path = directory.join(file);
    FontData::load(&path, None).map_err(|err| {
        let io_kind = if path.is_file() {
            io::ErrorKind::Other
        } else {
            io::ErrorKind::NotFound
        };
        Error::new(
            format!(
                "Failed to load Windows fallback {} font at {}: {}",
                style,
                path.display(),
                err
            ),
            io::Error::new(io_kind, err.to_string()),
        )
    })
}

fn windows_fallback_font_family() -> Result<FontFamily<FontData>, Error> {
    let directory = windows_font_directory().ok_or_else(|| {
        Error::new(
            "Windows font directory not found for fallback",
            io::Error::new(io::ErrorKind::NotFound, "windows fonts directory not found"),
        )
    })?;

    Ok(FontFamily {
        regular: load_windows_font(&directory, WINDOWS_FONT_FILES.regular, "regular")?,
        bold: load_windows_font(&directory, WINDOWS_FONT_FILES.bold, "bold")?,
        italic: load_windows_font(&directory, WINDOWS_FONT_FILES.italic, "italic")?,
        bold_italic: load_windows_font(&directory, WINDOWS_FONT_FILES.bold_italic, "bold italic")?,
    })
}

fn fonts_missing(err: &Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::IoError(io_err)
            if io_err.kind() == io::ErrorKind::NotFound
                || io_err.kind() == io::ErrorKind::PermissionDenied
    )
}

/// Returns the bundled font family, falling back to the Windows Arial family when the bundled
/// files are missing.
pub fn default_font_family() -> Result<FontFamily<FontData>, Error> {
    match load_bundled_font_family() {
        Ok(family) => Ok(family),
        Err(err) if fonts_missing(&err) => match windows_fallback_font_family() {
            Ok(fallback) => {
                warn!(
                    "Bundled fonts unavailable ({}); falling back to Windows '{}' family.",
                    err, WINDOWS_FALLBACK_FAMILY_NAME
                );
                Ok(fallback)
            }
            Err(fallback_err) => {
                warn!(
                    "Bundled fonts unavailable ({}); Windows fallback failed: {}",
                    err, fallback_err
                );
                Err(Error::new(
                    format!(
                        "Bundled fonts unavailable and Windows fallback failed: {}",
                        fallback_err
                    ),
                    io::Error::new(io::ErrorKind::NotFound, "default fonts are not available"),
                ))
            }
        },
        Err(err) => Err(err),
    }
}

/// Indicates whether a usable default font family can be found.
pub fn default_fonts_available() -> bool {
    resolve_font_directory().is_ok()
        || windows_font_directory()
            .map(|directory| {
                [
                    WINDOWS_FONT_FILES.regular,
                    WINDOWS_FONT_FILES.bold,
                    WINDOWS_FONT_FILES.italic,
                    WINDOWS_FONT_FILES.bold_italic,
                ]
                .iter()
                .all(|file| directory.join(file).is_file())
            })
            .unwrap_or(false)
}
