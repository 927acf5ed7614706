use crate::{
    constants::{LEVEL_DAT_FILE, README_EXTENSION, README_FILE},
    functions::decode_legacy_name,
    types::Error,
};
use chrono::{FixedOffset, Offset, SecondsFormat, Utc};
use std::{
    fs::{copy, create_dir_all, remove_dir_all, File, OpenOptions},
    io::{self, BufReader, Write},
    path::{Path, PathBuf},
};
use walkdir::WalkDir;
use zip::{write::SimpleFileOptions, CompressionMethod, ZipArchive, ZipWriter};

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> Error + '_ {
    move |err| Error::Io(path.to_path_buf(), err)
}

fn zip_error(path: &Path) -> impl FnOnce(zip::result::ZipError) -> Error + '_ {
    move |err| Error::Zip(path.to_path_buf(), err)
}

/// Recovers the intended name of a top-level readme that was stored without the UTF-8 flag.
fn readme_name(relative: &Path, raw: &[u8], decoded: &str) -> Option<String> {
    let is_top_level_readme = relative.components().count() == 1
        && relative
            .extension()
            .is_some_and(|ext| ext == README_EXTENSION);

    if !is_top_level_readme || raw == decoded.as_bytes() {
        return None;
    }

    decode_legacy_name(raw)
        .filter(|name| !name.contains(['/', '\\']) && name != "..")
}

/// Extracts a world export archive into `output_dir`.
///
/// Entries that would escape `output_dir` are skipped.
pub fn unpack_export(archive_path: &Path, output_dir: &Path) -> Result<(), Error> {
    let file = File::open(archive_path).map_err(io_error(archive_path))?;
    let mut archive = ZipArchive::new(BufReader::new(file))
        .map_err(zip_error(archive_path))?;

    create_dir_all(output_dir).map_err(io_error(output_dir))?;

    for index in 0..archive.len() {
        let mut entry =
            archive.by_index(index).map_err(zip_error(archive_path))?;

        let Some(relative) =
            entry.enclosed_name().map(|path| path.to_path_buf())
        else {
            continue;
        };

        let relative = match readme_name(&relative, entry.name_raw(), entry.name())
        {
            Some(name) => PathBuf::from(name),
            None => relative,
        };

        let path = output_dir.join(relative);

        if entry.is_dir() {
            create_dir_all(&path).map_err(io_error(&path))?;
            continue;
        }

        if let Some(parent) = path.parent() {
            create_dir_all(parent).map_err(io_error(parent))?;
        }

        let mut output = File::create(&path).map_err(io_error(&path))?;
        io::copy(&mut entry, &mut output).map_err(io_error(&path))?;
    }

    Ok(())
}

/// Returns the first directory, at most two levels below `dir`, that contains `level.dat`.
pub fn locate_world(dir: &Path) -> Result<PathBuf, Error> {
    WalkDir::new(dir)
        .max_depth(3)
        .sort_by_file_name()
        .into_iter()
        .flatten()
        .find(|entry| {
            entry.file_type().is_file() && entry.file_name() == LEVEL_DAT_FILE
        })
        .and_then(|entry| entry.path().parent().map(Path::to_path_buf))
        .ok_or_else(|| Error::WorldMissing(dir.to_path_buf()))
}

/// Builds the line appended to the package readme: `label` followed by the current time at `utc_offset_hours`.
pub fn build_stamp(label: &str, utc_offset_hours: i32) -> String {
    let offset = FixedOffset::east_opt(utc_offset_hours * 3600)
        .unwrap_or_else(|| Utc.fix());

    let now = Utc::now()
        .with_timezone(&offset)
        .to_rfc3339_opts(SecondsFormat::Secs, false);

    format!("{label}{now}")
}

/// Copies the contents of `source` into `destination`, merging with what's already there.
fn copy_tree(source: &Path, destination: &Path) -> Result<(), Error> {
    if source.is_file() {
        let Some(name) = source.file_name() else {
            return Ok(());
        };

        let target = destination.join(name);
        copy(source, &target).map_err(io_error(&target))?;
        return Ok(());
    }

    for entry in WalkDir::new(source).min_depth(1).into_iter().flatten() {
        let Ok(relative) = entry.path().strip_prefix(source) else {
            continue;
        };

        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            create_dir_all(&target).map_err(io_error(&target))?;
        } else {
            if let Some(parent) = target.parent() {
                create_dir_all(parent).map_err(io_error(parent))?;
            }

            copy(entry.path(), &target).map_err(io_error(&target))?;
        }
    }

    Ok(())
}

fn append_stamp(dir: &Path, stamp: &str) -> Result<(), Error> {
    let readme_path = dir.join(README_FILE);

    let mut readme = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&readme_path)
        .map_err(io_error(&readme_path))?;

    write!(readme, "\n{stamp}").map_err(io_error(&readme_path))
}

fn zip_dir(dir: &Path, output: &Path) -> Result<(), Error> {
    if let Some(parent) = output.parent() {
        create_dir_all(parent).map_err(io_error(parent))?;
    }

    let file = File::create(output).map_err(io_error(output))?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .flatten()
    {
        let Ok(relative) = entry.path().strip_prefix(dir) else {
            continue;
        };

        let name = relative
            .iter()
            .map(|component| component.to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if entry.file_type().is_dir() {
            writer
                .add_directory(name, options)
                .map_err(zip_error(output))?;
        } else {
            writer.start_file(name, options).map_err(zip_error(output))?;

            let mut source =
                File::open(entry.path()).map_err(io_error(entry.path()))?;
            io::copy(&mut source, &mut writer).map_err(io_error(output))?;
        }
    }

    writer.finish().map_err(zip_error(output))?;
    Ok(())
}

/// Finalizes a working directory into the output archive and removes the directory.
///
/// `attachments`, if given, are copied into the package root, and `stamp` is appended to its readme.
pub fn assemble_package(
    work_dir: &Path,
    output: &Path,
    attachments: Option<&Path>,
    stamp: &str,
) -> Result<(), Error> {
    if let Some(attachments) = attachments {
        copy_tree(attachments, work_dir)?;
    }

    append_stamp(work_dir, stamp)?;
    zip_dir(work_dir, output)?;

    remove_dir_all(work_dir).map_err(io_error(work_dir))
}
