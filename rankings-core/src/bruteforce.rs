//! Bruteforce link enumerator: the one place this crate drives
//! [`Fetcher::head_all`] at realistic scale. Phase IDs are recovered from
//! the HTML folder names already saved by C4/C5, not hardcoded, since the
//! portal's phase-ID space is sparse but otherwise opaque.

use std::path::Path;

use tracing::{error, info, warn};

use crate::constants::{OUTPUT_BRUTEFORCE_FOLDER, OUTPUT_LINKS_FOLDER, WEB_RISULTATI_AMMISSIONE_HOST};
use crate::error::Result;
use crate::fetch::Fetcher;
use crate::writer::FsStore;

const HEX_COMBOS: u32 = 1 << 16;
const BRUTEFORCE_MAX_WORKERS: usize = 200;
const BRUTEFORCE_RPS: u32 = 1000;
const BRUTEFORCE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// Parses saved HTML directory names (`2020_20002_html`, `2024_20103_2d5d_html`)
/// into their phase IDs, deduplicated and sorted ascending.
pub fn extract_phase_ids(saved_htmls_dir: &Path) -> Vec<u32> {
    let mut out = Vec::new();

    let entries = match std::fs::read_dir(saved_htmls_dir) {
        Ok(entries) => entries,
        Err(e) => {
            error!(
                dir = %saved_htmls_dir.display(),
                error = %e,
                "could not read saved HTML entries from local folder"
            );
            return out;
        }
    };

    for entry in entries.filter_map(|e| e.ok()) {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        let parts: Vec<&str> = name.split('_').collect();
        if parts.len() < 3 {
            warn!(name = %name, "saved HTML folder name is not recognized");
            continue;
        }

        let raw_id = parts[1].strip_prefix('2').unwrap_or(parts[1]);
        match raw_id.parse::<u32>() {
            Ok(id) if !out.contains(&id) => out.push(id),
            Ok(_) => {}
            Err(_) => error!(raw_id = parts[1], name = %name, "found HTML phase ID not integer"),
        }
    }

    out.sort_unstable();
    info!(phase_ids = ?out, "final known phase ids");
    out
}

fn generate_link(year: u16, phase_id: u32, random_hex: u32) -> String {
    format!(
        "https://{WEB_RISULTATI_AMMISSIONE_HOST}/{year}_2{phase_id:04}_{random_hex:04x}_html/{year}_2{phase_id:04}_generale.html"
    )
}

fn valid_links_filename(year: u16) -> String {
    format!("valid_links_{year}.json")
}

/// Bruteforces every `<phase_id>_<4-hex-digit>` combination for `year`,
/// returning the links that responded 200 to HEAD. Cached per-year: if
/// `valid_links_<year>.json` already exists under `data_root`, its contents
/// are returned without hitting the network.
pub async fn run_bruteforce(
    fetcher: &Fetcher,
    data_root: &Path,
    saved_htmls_dir: &Path,
    year: u16,
) -> Result<Vec<String>> {
    let store = FsStore::new(data_root.join(OUTPUT_LINKS_FOLDER).join(OUTPUT_BRUTEFORCE_FOLDER)).await?;
    let filename = valid_links_filename(year);

    let saved: Vec<String> = store.read_json_or_default(&filename).await;
    if !saved.is_empty() {
        info!(year, count = saved.len(), "reusing saved bruteforce results");
        return Ok(saved);
    }

    let phase_ids = extract_phase_ids(saved_htmls_dir);
    let combos = phase_ids.len() * HEX_COMBOS as usize;
    let mut links = Vec::with_capacity(combos);
    for id in &phase_ids {
        for random_hex in 0..HEX_COMBOS {
            links.push(generate_link(year, *id, random_hex));
        }
    }

    info!(year, combos, "started bruteforce, it might take a while");

    let results = fetcher
        .head_all(&links, BRUTEFORCE_MAX_WORKERS, BRUTEFORCE_RPS, BRUTEFORCE_TIMEOUT)
        .await;

    let valid: Vec<String> = results
        .into_iter()
        .filter(|r| r.status == Some(200))
        .map(|r| r.url)
        .collect();

    info!(year, count = valid.len(), "ended bruteforce");
    store.write_json(&filename, &valid, true).await?;

    Ok(valid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_phase_ids_parses_and_dedupes() {
        let dir = tempdir();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::create_dir(dir.join("2020_20002_html")).unwrap();
        std::fs::create_dir(dir.join("2024_20103_2d5d_html")).unwrap();
        std::fs::create_dir(dir.join("2024_20002_abcd_html")).unwrap();
        std::fs::create_dir(dir.join("not_a_match")).unwrap();

        let ids = extract_phase_ids(&dir);
        assert_eq!(ids, vec![2, 103]);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_generate_link_format() {
        let link = generate_link(2024, 103, 0x2d5);
        assert_eq!(
            link,
            format!("https://{WEB_RISULTATI_AMMISSIONE_HOST}/2024_20103_02d5_html/2024_20103_generale.html")
        );
    }

    fn tempdir() -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("rankings-core-bruteforce-test-{}", std::process::id()));
        p
    }
}
