use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissionSource {
    pub mission_id: String,
    pub file_path: PathBuf,
}

pub fn discover_missions(missions_dir: &Path) -> io::Result<Vec<MissionSource>> {
    let mut sources = Vec::new();
    for entry in fs::read_dir(missions_dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let is_xml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"));
        let stem = path.file_stem().and_then(|stem| stem.to_str());
        if let (true, Some(stem)) = (is_xml, stem) {
            if is_valid_mission_id(stem) {
                sources.push(MissionSource {
                    mission_id: stem.to_string(),
                    file_path: path.clone(),
                });
            }
        }
    }
    sources.sort_by(|a, b| a.mission_id.cmp(&b.mission_id));
    Ok(sources)
}

/// Lowercase ASCII letters, digits, `_` and `-`; never a path.
pub(crate) fn is_valid_mission_id(mission_id: &str) -> bool {
    !mission_id.is_empty()
        && mission_id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

pub(crate) fn mission_file_path(missions_dir: &Path, mission_id: &str) -> PathBuf {
    missions_dir.join(format!("{mission_id}.xml"))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn lists_only_xml_files_in_id_order() {
        let temp = TempDir::new().expect("temp");
        fs::write(temp.path().join("harbor.xml"), "<Mission/>").expect("write");
        fs::write(temp.path().join("city.XML"), "<Mission/>").expect("write");
        fs::write(temp.path().join("notes.txt"), "x").expect("write");
        fs::write(temp.path().join("Bad Name.xml"), "<Mission/>").expect("write");
        fs::create_dir_all(temp.path().join("nested.xml")).expect("mkdir");

        let ids = discover_missions(temp.path())
            .expect("discover")
            .into_iter()
            .map(|source| source.mission_id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["city".to_string(), "harbor".to_string()]);
    }

    #[test]
    fn mission_ids_cannot_escape_the_directory() {
        assert!(is_valid_mission_id("city_02"));
        assert!(!is_valid_mission_id(""));
        assert!(!is_valid_mission_id("../city"));
        assert!(!is_valid_mission_id("City"));
    }
}
