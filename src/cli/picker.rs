//! Interactive CSV picker.
//!
//! This is intentionally kept separate from clap parsing:
//! - clap handles structured flags/subcommands
//! - the picker provides the "run `wafer` and choose a price CSV" UX
//!
//! The picker searches for `*.csv` files under the current working directory.
//! Files whose name mentions `price` are listed first.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// Default directory recursion depth for finding CSV files.
const DEFAULT_SEARCH_DEPTH: usize = 4;

/// Prompt the user to select a price CSV from the current directory tree.
///
/// Behavior:
/// - list discovered `*.csv` files
/// - accept either a number (from the list) or an explicit path
/// - `q` cancels
pub fn prompt_for_csv_path() -> Result<PathBuf, AppError> {
    let files = discover_csv_files();
    if files.is_empty() {
        return Err(AppError::new(
            2,
            "No .csv files found. Provide one with `wafer report -f <prices.csv>` or run `wafer generate`.",
        ));
    }

    println!("Found {} CSV file(s):", files.len());
    for (idx, path) in files.iter().enumerate() {
        println!("{:>3}) {}", idx + 1, pretty_path(path));
    }

    loop {
        print!("Select a file by number (1-{}) or type a path (q to quit): ", files.len());
        io::stdout()
            .flush()
            .map_err(|e| AppError::new(2, format!("Failed to write prompt: {e}")))?;

        let mut input = String::new();
        let bytes = io::stdin()
            .read_line(&mut input)
            .map_err(|e| AppError::new(2, format!("Failed to read input: {e}")))?;

        if bytes == 0 {
            return Err(AppError::new(
                2,
                "No input received. Provide a CSV path with `-f <prices.csv>` or WAFER_PRICES.",
            ));
        }

        let input = input.trim();
        if input.eq_ignore_ascii_case("q") {
            return Err(AppError::new(2, "Canceled."));
        }

        if let Ok(choice) = input.parse::<usize>() {
            if (1..=files.len()).contains(&choice) {
                return validate_csv_path(&files[choice - 1]);
            }
            println!("Invalid choice: {choice}. Enter a number between 1 and {}.", files.len());
            continue;
        }

        let candidate = PathBuf::from(input);
        match validate_csv_path(&candidate) {
            Ok(path) => return Ok(path),
            Err(err) => {
                println!("{err}");
                continue;
            }
        }
    }
}

/// Validate the provided path points to a `.csv` file.
pub fn validate_csv_path(path: &Path) -> Result<PathBuf, AppError> {
    if !path.exists() {
        return Err(AppError::new(
            2,
            format!("CSV file not found: {}", path.display()),
        ));
    }
    if path.is_dir() {
        return Err(AppError::new(
            2,
            format!("Expected a file, got a directory: {}", path.display()),
        ));
    }
    if path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        != Some(true)
    {
        return Err(AppError::new(
            2,
            format!(
                "Expected a .csv file (got: {}). Use -f to pass a CSV path.",
                path.display()
            ),
        ));
    }

    Ok(path.to_path_buf())
}

/// Discover `*.csv` files under the current directory (deterministic order).
pub fn discover_csv_files() -> Vec<PathBuf> {
    find_csv_files(Path::new("."), DEFAULT_SEARCH_DEPTH)
}

fn find_csv_files(root: &Path, max_depth: usize) -> Vec<PathBuf> {
    let mut out = Vec::new();
    find_csv_files_inner(root, 0, max_depth, &mut out);
    out.sort_by_key(|p| (!looks_like_prices(p), pretty_path(p)));
    out
}

fn find_csv_files_inner(root: &Path, depth: usize, max_depth: usize, out: &mut Vec<PathBuf>) {
    if depth > max_depth {
        return;
    }

    let Ok(entries) = fs::read_dir(root) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let file_type = match entry.file_type() {
            Ok(ft) => ft,
            Err(_) => continue,
        };

        if file_type.is_dir() {
            if should_skip_dir(&path) {
                continue;
            }
            find_csv_files_inner(&path, depth + 1, max_depth, out);
            continue;
        }

        if file_type.is_file()
            && path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("csv"))
                == Some(true)
        {
            out.push(path);
        }
    }
}

fn should_skip_dir(path: &Path) -> bool {
    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
    matches!(name, ".git" | "target" | "node_modules")
}

fn looks_like_prices(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase().contains("price"))
        .unwrap_or(false)
}

fn pretty_path(path: &Path) -> String {
    let stripped = path.strip_prefix("./").unwrap_or(path);
    stripped.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_csvs_and_lists_price_files_first() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("data")).unwrap();
        fs::create_dir_all(root.join("target")).unwrap();
        fs::write(root.join("aaa_forecast.csv"), "date,x\n").unwrap();
        fs::write(root.join("data/polysilicon_prices.csv"), "date,price\n").unwrap();
        fs::write(root.join("target/skipped.csv"), "").unwrap();
        fs::write(root.join("notes.txt"), "").unwrap();

        let found = find_csv_files(root, DEFAULT_SEARCH_DEPTH);
        let names: Vec<String> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["polysilicon_prices.csv", "aaa_forecast.csv"]);
    }

    #[test]
    fn validate_rejects_non_csv() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("prices.txt");
        fs::write(&txt, "").unwrap();
        assert_eq!(validate_csv_path(&txt).unwrap_err().exit_code(), 2);
        assert_eq!(validate_csv_path(dir.path()).unwrap_err().exit_code(), 2);
        assert!(validate_csv_path(&dir.path().join("missing.csv")).is_err());
    }
}
