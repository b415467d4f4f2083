use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::error::{ReportError, ReportResult};

fn io_err(path: &Path) -> impl Fn(std::io::Error) -> ReportError + '_ {
    move |source| ReportError::Io { path: path.to_path_buf(), source }
}

fn json_err(path: &Path) -> impl Fn(serde_json::Error) -> ReportError + '_ {
    move |source| ReportError::Json { path: path.to_path_buf(), source }
}

/// Write `value` as JSON indented by four spaces, creating parent directories.
pub(crate) fn write_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> ReportResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err(parent))?;
    }

    let file = File::create(path).map_err(io_err(path))?;
    let mut writer = BufWriter::new(file);
    let mut ser = Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser).map_err(json_err(path))?;
    writer.write_all(b"\n").map_err(io_err(path))?;
    writer.flush().map_err(io_err(path))
}

pub(crate) fn read<T: DeserializeOwned>(path: &Path) -> ReportResult<T> {
    let file = File::open(path).map_err(io_err(path))?;
    serde_json::from_reader(BufReader::new(file)).map_err(json_err(path))
}
