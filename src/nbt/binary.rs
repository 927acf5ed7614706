use super::{Compound, ListTag, NamedTag, Tag, TagKind};
use crate::{constants::MAX_NBT_DEPTH, types::Error};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::{
    borrow::Cow,
    io::{self, Cursor, Read, Write},
};

fn malformed<E: ToString>(err: E) -> Error {
    Error::MalformedNbt(err.to_string())
}

/// Parses an uncompressed binary NBT document.
pub fn from_bytes(bytes: &[u8]) -> Result<NamedTag, Error> {
    let mut decoder = Decoder {
        cursor: Cursor::new(bytes),
    };

    let kind = decoder.read_kind()?;

    if !kind.is_compound() {
        return Err(malformed(format!(
            "root tag must be a compound, found {kind}"
        )));
    }

    let name = decoder.read_string()?;
    let root = decoder.read_compound(0)?;

    Ok(NamedTag { name, root })
}

/// Serializes an NBT document to uncompressed binary form.
pub fn to_bytes(tag: &NamedTag) -> Result<Vec<u8>, Error> {
    let mut output = Vec::with_capacity(4096);

    output
        .write_u8(TagKind::Compound.into())
        .map_err(malformed)?;
    write_string(&mut output, &tag.name)?;
    write_compound(&mut output, &tag.root)?;

    Ok(output)
}

struct Decoder<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl Decoder<'_> {
    fn remaining(&self) -> usize {
        let total = self.cursor.get_ref().len();
        total.saturating_sub(self.cursor.position() as usize)
    }

    fn read_kind(&mut self) -> Result<TagKind, Error> {
        let id = self.cursor.read_u8().map_err(malformed)?;
        TagKind::try_from(id)
            .map_err(|_| malformed(format!("unknown tag id {id}")))
    }

    fn read_len(&mut self, element_size: usize) -> Result<usize, Error> {
        let len = self.cursor.read_i32::<BigEndian>().map_err(malformed)?;

        let len = usize::try_from(len)
            .map_err(|_| malformed(format!("negative length {len}")))?;

        if len.saturating_mul(element_size) > self.remaining() {
            return Err(malformed(format!(
                "length {len} exceeds remaining data"
            )));
        }

        Ok(len)
    }

    fn read_string(&mut self) -> Result<String, Error> {
        let len = self.cursor.read_u16::<BigEndian>().map_err(malformed)?;
        let mut buffer = vec![0u8; len as usize];
        self.cursor.read_exact(&mut buffer).map_err(malformed)?;
        decode_mutf8(&buffer)
    }

    fn read_compound(&mut self, depth: usize) -> Result<Compound, Error> {
        let mut compound = Compound::new();

        loop {
            let kind = self.read_kind()?;

            if kind.is_end() {
                break;
            }

            let name = self.read_string()?;
            let value = self.read_payload(kind, depth + 1)?;
            compound.insert(name, value);
        }

        Ok(compound)
    }

    fn read_payload(
        &mut self,
        kind: TagKind,
        depth: usize,
    ) -> Result<Tag, Error> {
        if depth > MAX_NBT_DEPTH {
            return Err(malformed("maximum nesting depth exceeded"));
        }

        Ok(match kind {
            TagKind::End => return Err(malformed("unexpected end tag")),
            TagKind::Byte => Tag::Byte(self.cursor.read_i8().map_err(malformed)?),
            TagKind::Short => {
                Tag::Short(self.cursor.read_i16::<BigEndian>().map_err(malformed)?)
            }
            TagKind::Int => {
                Tag::Int(self.cursor.read_i32::<BigEndian>().map_err(malformed)?)
            }
            TagKind::Long => {
                Tag::Long(self.cursor.read_i64::<BigEndian>().map_err(malformed)?)
            }
            TagKind::Float => {
                Tag::Float(self.cursor.read_f32::<BigEndian>().map_err(malformed)?)
            }
            TagKind::Double => {
                Tag::Double(self.cursor.read_f64::<BigEndian>().map_err(malformed)?)
            }
            TagKind::ByteArray => {
                let len = self.read_len(1)?;
                let mut values = vec![0i8; len];
                self.cursor.read_i8_into(&mut values).map_err(malformed)?;
                Tag::ByteArray(values)
            }
            TagKind::IntArray => {
                let len = self.read_len(4)?;
                let mut values = vec![0i32; len];
                self.cursor
                    .read_i32_into::<BigEndian>(&mut values)
                    .map_err(malformed)?;
                Tag::IntArray(values)
            }
            TagKind::LongArray => {
                let len = self.read_len(8)?;
                let mut values = vec![0i64; len];
                self.cursor
                    .read_i64_into::<BigEndian>(&mut values)
                    .map_err(malformed)?;
                Tag::LongArray(values)
            }
            TagKind::String => Tag::String(self.read_string()?),
            TagKind::List => {
                let element_kind = self.read_kind()?;
                let len = self.read_len(0)?;

                if element_kind.is_end() && len > 0 {
                    return Err(malformed("non-empty list of end tags"));
                }

                let mut values = Vec::with_capacity(len.min(self.remaining()));

                for _ in 0..len {
                    values.push(self.read_payload(element_kind, depth + 1)?);
                }

                Tag::List(ListTag::new(element_kind, values)?)
            }
            TagKind::Compound => Tag::Compound(self.read_compound(depth)?),
        })
    }
}

fn write_len<W: Write>(writer: &mut W, len: usize) -> Result<(), Error> {
    let len = i32::try_from(len)
        .map_err(|_| malformed(format!("length {len} doesn't fit in i32")))?;
    writer.write_i32::<BigEndian>(len).map_err(malformed)
}

fn write_string<W: Write>(writer: &mut W, str: &str) -> Result<(), Error> {
    let bytes = encode_mutf8(str);

    let len = u16::try_from(bytes.len()).map_err(|_| {
        malformed(format!("string of {} bytes is too long", bytes.len()))
    })?;

    writer.write_u16::<BigEndian>(len).map_err(malformed)?;
    writer.write_all(&bytes).map_err(malformed)
}

fn write_compound<W: Write>(
    writer: &mut W,
    compound: &Compound,
) -> Result<(), Error> {
    for (name, value) in compound {
        writer.write_u8(value.kind().into()).map_err(malformed)?;
        write_string(writer, name)?;
        write_payload(writer, value)?;
    }

    writer.write_u8(TagKind::End.into()).map_err(malformed)
}

fn write_payload<W: Write>(writer: &mut W, tag: &Tag) -> Result<(), Error> {
    let result: io::Result<()> = match tag {
        Tag::Byte(value) => writer.write_i8(*value),
        Tag::Short(value) => writer.write_i16::<BigEndian>(*value),
        Tag::Int(value) => writer.write_i32::<BigEndian>(*value),
        Tag::Long(value) => writer.write_i64::<BigEndian>(*value),
        Tag::Float(value) => writer.write_f32::<BigEndian>(*value),
        Tag::Double(value) => writer.write_f64::<BigEndian>(*value),
        Tag::ByteArray(values) => {
            write_len(writer, values.len())?;
            values.iter().try_for_each(|value| writer.write_i8(*value))
        }
        Tag::IntArray(values) => {
            write_len(writer, values.len())?;
            values
                .iter()
                .try_for_each(|value| writer.write_i32::<BigEndian>(*value))
        }
        Tag::LongArray(values) => {
            write_len(writer, values.len())?;
            values
                .iter()
                .try_for_each(|value| writer.write_i64::<BigEndian>(*value))
        }
        Tag::String(value) => return write_string(writer, value),
        Tag::List(list) => {
            writer.write_u8(list.kind().into()).map_err(malformed)?;
            write_len(writer, list.len())?;

            for value in list {
                write_payload(writer, value)?;
            }

            Ok(())
        }
        Tag::Compound(compound) => return write_compound(writer, compound),
    };

    result.map_err(malformed)
}

/// Decodes Java's Modified UTF-8.
///
/// Plain UTF-8 is accepted too, since it is what most files contain in practice.
fn decode_mutf8(bytes: &[u8]) -> Result<String, Error> {
    if let Ok(str) = std::str::from_utf8(bytes) {
        return Ok(str.to_owned());
    }

    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;

    let continuation = |i: usize| -> Result<u16, Error> {
        match bytes.get(i) {
            Some(byte) if byte & 0xC0 == 0x80 => Ok(u16::from(byte & 0x3F)),
            _ => Err(malformed("invalid modified UTF-8 sequence")),
        }
    };

    while i < bytes.len() {
        let byte = bytes[i];

        if byte < 0x80 {
            units.push(u16::from(byte));
            i += 1;
        } else if byte & 0xE0 == 0xC0 {
            units.push((u16::from(byte & 0x1F) << 6) | continuation(i + 1)?);
            i += 2;
        } else if byte & 0xF0 == 0xE0 {
            units.push(
                (u16::from(byte & 0x0F) << 12)
                    | (continuation(i + 1)? << 6)
                    | continuation(i + 2)?,
            );
            i += 3;
        } else {
            return Err(malformed("invalid modified UTF-8 lead byte"));
        }
    }

    String::from_utf16(&units).map_err(malformed)
}

fn encode_mutf8(str: &str) -> Cow<'_, [u8]> {
    if !str.bytes().any(|byte| byte == 0 || byte >= 0xF0) {
        return Cow::Borrowed(str.as_bytes());
    }

    let mut output = Vec::with_capacity(str.len() + 8);

    for unit in str.encode_utf16() {
        match unit {
            0x0001..=0x007F => output.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                output.push(0xC0 | (unit >> 6) as u8);
                output.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                output.push(0xE0 | (unit >> 12) as u8);
                output.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                output.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }

    Cow::Owned(output)
}
