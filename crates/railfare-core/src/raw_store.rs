//! Raw document persistence.
//!
//! The raw document is a single JSON array of tagged [`RawResponse`] objects.
//! It is written once after harvesting and read back element by element, so
//! at most one response is materialized at a time while reading.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::de::{Deserializer as _, SeqAccess, Visitor};

use crate::domain::RawResponse;
use crate::CoreError;

pub fn write_raw_document(path: &Path, responses: &[RawResponse]) -> Result<(), CoreError> {
    let file = File::create(path)?;
    write_raw_document_to(BufWriter::new(file), responses)?;
    log::info!("wrote {} raw responses to {}", responses.len(), path.display());
    Ok(())
}

pub fn write_raw_document_to<W: Write>(mut writer: W, responses: &[RawResponse]) -> Result<(), CoreError> {
    serde_json::to_writer_pretty(&mut writer, responses)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Streams every response of the document at `path` into `on_response`.
/// Returns the number of responses read.
pub fn read_raw_document<F>(path: &Path, on_response: F) -> Result<usize, CoreError>
where
    F: FnMut(RawResponse),
{
    let file = File::open(path)?;
    read_raw_document_from(BufReader::new(file), on_response)
}

pub fn read_raw_document_from<R, F>(reader: R, mut on_response: F) -> Result<usize, CoreError>
where
    R: Read,
    F: FnMut(RawResponse),
{
    let mut deserializer = serde_json::Deserializer::from_reader(reader);
    let count = (&mut deserializer).deserialize_seq(ResponseVisitor {
        on_response: &mut on_response,
    })?;
    deserializer.end()?;
    Ok(count)
}

struct ResponseVisitor<'f, F> {
    on_response: &'f mut F,
}

impl<'de, F> Visitor<'de> for ResponseVisitor<'_, F>
where
    F: FnMut(RawResponse),
{
    type Value = usize;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an array of raw responses")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut count = 0;
        while let Some(response) = seq.next_element::<RawResponse>()? {
            (self.on_response)(response);
            count += 1;
        }
        Ok(count)
    }
}
