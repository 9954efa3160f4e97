use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::config::CatalogMap;
use crate::error::ProvisioningError;

/// Append `lines` to `dest` in order, one line terminator each, creating
/// the file if absent. Duplicates are written as given; resolving
/// duplicate keys is the consuming process's concern. Empty input leaves
/// the destination untouched (and uncreated).
pub fn append_lines(dest: &Path, lines: &[String]) -> Result<(), ProvisioningError> {
    if lines.is_empty() {
        return Ok(());
    }

    let write_err = |source| ProvisioningError::Write {
        path: dest.to_path_buf(),
        source,
    };

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dest)
        .map_err(write_err)?;
    for line in lines {
        writeln!(file, "{line}").map_err(write_err)?;
    }

    tracing::debug!(path = %dest.display(), count = lines.len(), "Appended property lines");
    Ok(())
}

/// One `<name>.properties` file per catalog entry, each receiving its
/// full line sequence. The catalog directory is guaranteed to exist by
/// the directory provisioning step.
pub fn write_catalogs(catalog_dir: &Path, catalogs: &CatalogMap) -> Result<(), ProvisioningError> {
    for (name, lines) in catalogs {
        append_lines(&catalog_dir.join(format!("{name}.properties")), lines)?;
    }
    Ok(())
}
