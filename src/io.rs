use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::Serialize;

use crate::item::MapItem;
use crate::GeofeedError;

/// Read a JSON array of items.
pub fn read_items_from_reader<R: Read>(reader: R) -> Result<Vec<MapItem>, GeofeedError> {
    let items = serde_json::from_reader(reader)?;
    Ok(items)
}

pub fn read_items<P: AsRef<Path>>(path: P) -> Result<Vec<MapItem>, GeofeedError> {
    let file = File::open(path)?;
    read_items_from_reader(BufReader::new(file))
}

/// Write any engine output (partition, ranking) as pretty-printed JSON
/// followed by a newline.
pub fn write_json_to_writer<W: Write, T: Serialize + ?Sized>(
    mut writer: W,
    value: &T,
) -> Result<(), GeofeedError> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

pub fn write_json<P: AsRef<Path>, T: Serialize + ?Sized>(
    path: P,
    value: &T,
) -> Result<(), GeofeedError> {
    let file = File::create(path)?;
    write_json_to_writer(BufWriter::new(file), value)
}
