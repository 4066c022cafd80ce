//! Reading user-supplied files through `cap_std`.

use std::path::Path;

use cap_std::{ambient_authority, fs::Dir};

use crate::domain::{Error, SalonListingForm};

/// Read `path` and return its file name with the contents.
pub fn read_file(path: &Path) -> Result<(String, Vec<u8>), Error> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| Error::invalid_request(format!("{} is not a file", path.display())))?;
    let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(|err| {
        Error::invalid_request(format!("open directory '{}': {err}", parent.display()))
    })?;
    let bytes = dir
        .read(Path::new(file_name))
        .map_err(|err| Error::invalid_request(format!("read '{}': {err}", path.display())))?;
    Ok((file_name.to_string_lossy().into_owned(), bytes))
}

/// Load a listing form from a JSON file.
pub fn read_listing_form(path: &Path) -> Result<SalonListingForm, Error> {
    let (_, bytes) = read_file(path)?;
    serde_json::from_slice(&bytes)
        .map_err(|err| Error::invalid_request(format!("listing form '{}': {err}", path.display())))
}

#[cfg(test)]
mod tests {
    //! Regression coverage for file loading.

    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    fn reads_listing_forms_from_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("form.json");
        std::fs::write(
            &path,
            r#"{"salonName":"Test Salon","services":[{"name":"Haircut","price":300,"duration":30}]}"#,
        )
        .expect("write");

        let form = read_listing_form(&path).expect("form");

        assert_eq!(form.salon_name, "Test Salon");
        assert_eq!(form.services.first().map(|s| s.name.as_str()), Some("Haircut"));
    }

    #[rstest]
    fn missing_files_are_invalid_requests() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = read_file(&dir.path().join("absent.png")).expect_err("missing");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }
}
