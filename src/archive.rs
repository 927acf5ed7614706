//! Datapack archives: scanning members for text literals and rewriting them in place.

use crate::{
    constants::{
        localization::SKIPPED_MEMBER_MSG, DATAPACKS_DIR, ELIGIBLE_EXTENSIONS,
        ESCAPED_DELIMITER, PLAIN_DELIMITER, TEMP_FILE_PREFIX,
    },
    functions::is_candidate,
    statics::regexes::TEXT_LITERAL_RE,
    types::{Error, TextMapping},
};
use indexmap::IndexSet;
use log::warn;
use std::{
    fs::File,
    io::{BufReader, Read, Write},
    path::{Path, PathBuf},
};
use walkdir::WalkDir;
use zip::{write::SimpleFileOptions, CompressionMethod, ZipArchive, ZipWriter};

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> Error + '_ {
    move |err| Error::Io(path.to_path_buf(), err)
}

fn zip_error(path: &Path) -> impl FnOnce(zip::result::ZipError) -> Error + '_ {
    move |err| Error::Zip(path.to_path_buf(), err)
}

/// Whether an archive member's text should be scanned, judging by its name.
pub fn is_eligible(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ELIGIBLE_EXTENSIONS.contains(ext))
}

/// Yields `(delimiter, body)` for every delimited literal in `content`.
///
/// The delimiter is either `"` or the escaped `\\"` form used by commands nested inside strings.
pub fn find_literals(
    content: &str,
) -> impl Iterator<Item = (&'static str, &str)> + '_ {
    TEXT_LITERAL_RE.captures_iter(content).filter_map(|captures| {
        if let Some(body) = captures.get(1) {
            Some((ESCAPED_DELIMITER, body.as_str()))
        } else {
            captures.get(2).map(|body| (PLAIN_DELIMITER, body.as_str()))
        }
    })
}

/// Candidate literal bodies found in `content`, in order of appearance.
pub fn extract_literals(content: &str) -> Vec<String> {
    find_literals(content)
        .filter(|(_, body)| is_candidate(body))
        .map(|(_, body)| body.to_owned())
        .collect()
}

/// Replaces every translated literal in `content`, keeping its delimiter.
///
/// Replacement is keyed on the whole delimited literal, so repeated occurrences are all replaced the same way.
pub fn translate_literals(content: &str, mapping: &TextMapping) -> String {
    let replacements: IndexSet<(&str, &str)> = find_literals(content)
        .filter(|(_, body)| is_candidate(body) && mapping.contains(body))
        .collect();

    let mut output = content.to_owned();

    for (delimiter, body) in replacements {
        let Some(translation) = mapping.get(body) else {
            continue;
        };

        output = output.replace(
            &format!("{delimiter}{body}{delimiter}"),
            &format!("{delimiter}{translation}{delimiter}"),
        );
    }

    output
}

fn read_text<R: Read>(
    path: &Path,
    name: &str,
    reader: &mut R,
) -> Result<String, Error> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).map_err(io_error(path))?;

    String::from_utf8(bytes).map_err(|_| Error::InvalidUtf8 {
        path: path.to_path_buf(),
        member: name.to_owned(),
    })
}

fn read_member<R: Read + std::io::Seek>(
    path: &Path,
    archive: &mut ZipArchive<R>,
    index: usize,
) -> Result<Option<String>, Error> {
    let mut file = archive.by_index(index).map_err(zip_error(path))?;

    if file.is_dir() || !is_eligible(file.name()) {
        return Ok(None);
    }

    let name = file.name().to_owned();
    read_text(path, &name, &mut file).map(Some)
}

/// Collects candidate literals from every eligible member of a datapack.
///
/// Members that can't be read or decoded are skipped with a warning.
pub fn extract_datapack(path: &Path) -> Result<Vec<String>, Error> {
    let file = File::open(path).map_err(io_error(path))?;
    let mut archive =
        ZipArchive::new(BufReader::new(file)).map_err(zip_error(path))?;

    let mut lines = Vec::new();

    for index in 0..archive.len() {
        match read_member(path, &mut archive, index) {
            Ok(Some(content)) => lines.extend(extract_literals(&content)),
            Ok(None) => {}
            Err(err) => warn!("{SKIPPED_MEMBER_MSG} {err}"),
        }
    }

    Ok(lines)
}

fn write_translated(
    path: &Path,
    output: &File,
    mapping: &TextMapping,
) -> Result<usize, Error> {
    let source = File::open(path).map_err(io_error(path))?;
    let mut archive =
        ZipArchive::new(BufReader::new(source)).map_err(zip_error(path))?;
    let mut writer = ZipWriter::new(output);

    let mut changed = 0;

    for index in 0..archive.len() {
        let mut file = archive.by_index(index).map_err(zip_error(path))?;

        if file.is_dir() || !is_eligible(file.name()) {
            writer.raw_copy_file(file).map_err(zip_error(path))?;
            continue;
        }

        let method = match file.compression() {
            CompressionMethod::Stored => CompressionMethod::Stored,
            _ => CompressionMethod::Deflated,
        };

        let mut options =
            SimpleFileOptions::default().compression_method(method);

        if let Some(modified) = file.last_modified() {
            options = options.last_modified_time(modified);
        }

        if let Some(mode) = file.unix_mode() {
            options = options.unix_permissions(mode);
        }

        let name = file.name().to_owned();
        let content = read_text(path, &name, &mut file)?;
        drop(file);

        let translated = translate_literals(&content, mapping);

        if translated != content {
            changed += 1;
        }

        writer.start_file(name, options).map_err(zip_error(path))?;
        writer
            .write_all(translated.as_bytes())
            .map_err(io_error(path))?;
    }

    writer.finish().map_err(zip_error(path))?;
    Ok(changed)
}

/// Rewrites a datapack with its eligible members translated. Returns the number of members that changed.
///
/// The new archive is written next to the original and atomically moved over it.
/// On failure the temporary file is removed and the original is left untouched.
pub fn rewrite_datapack(
    path: &Path,
    mapping: &TextMapping,
) -> Result<usize, Error> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    let temp = tempfile::Builder::new()
        .prefix(TEMP_FILE_PREFIX)
        .tempfile_in(parent)
        .map_err(io_error(parent))?;

    let changed = write_translated(path, temp.as_file(), mapping)?;

    temp.persist(path)
        .map_err(|err| Error::Io(path.to_path_buf(), err.error))?;

    Ok(changed)
}

/// Every `.zip` archive below the world's `datapacks` directory, sorted by path.
pub fn find_datapacks(world_dir: &Path) -> Vec<PathBuf> {
    let datapacks_dir = world_dir.join(DATAPACKS_DIR);

    if !datapacks_dir.is_dir() {
        return Vec::new();
    }

    let mut datapacks: Vec<PathBuf> = WalkDir::new(&datapacks_dir)
        .into_iter()
        .flatten()
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| path.extension().is_some_and(|ext| ext == "zip"))
        .collect();

    datapacks.sort();
    datapacks
}
