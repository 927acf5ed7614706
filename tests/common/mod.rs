#![allow(dead_code)]

use byteorder::{LittleEndian, WriteBytesExt};
use std::io::Write;
use worldtext::nbt::{Compound, ListTag, NamedTag, Tag};

/// Builds a zip archive of stored entries with raw, unflagged names.
pub fn stored_zip(entries: &[(&[u8], &[u8])]) -> Vec<u8> {
    const DOS_DATE: u16 = (1 << 5) | 1;

    let mut output = Vec::new();
    let mut central = Vec::new();

    for (name, data) in entries {
        let mut crc = flate2::Crc::new();
        crc.update(data);
        let crc = crc.sum();
        let offset = output.len() as u32;

        output.write_u32::<LittleEndian>(0x0403_4b50).unwrap();
        output.write_u16::<LittleEndian>(20).unwrap();
        output.write_u16::<LittleEndian>(0).unwrap();
        output.write_u16::<LittleEndian>(0).unwrap();
        output.write_u16::<LittleEndian>(0).unwrap();
        output.write_u16::<LittleEndian>(DOS_DATE).unwrap();
        output.write_u32::<LittleEndian>(crc).unwrap();
        output.write_u32::<LittleEndian>(data.len() as u32).unwrap();
        output.write_u32::<LittleEndian>(data.len() as u32).unwrap();
        output.write_u16::<LittleEndian>(name.len() as u16).unwrap();
        output.write_u16::<LittleEndian>(0).unwrap();
        output.write_all(name).unwrap();
        output.write_all(data).unwrap();

        central.write_u32::<LittleEndian>(0x0201_4b50).unwrap();
        central.write_u16::<LittleEndian>(20).unwrap();
        central.write_u16::<LittleEndian>(20).unwrap();
        central.write_u16::<LittleEndian>(0).unwrap();
        central.write_u16::<LittleEndian>(0).unwrap();
        central.write_u16::<LittleEndian>(0).unwrap();
        central.write_u16::<LittleEndian>(DOS_DATE).unwrap();
        central.write_u32::<LittleEndian>(crc).unwrap();
        central.write_u32::<LittleEndian>(data.len() as u32).unwrap();
        central.write_u32::<LittleEndian>(data.len() as u32).unwrap();
        central.write_u16::<LittleEndian>(name.len() as u16).unwrap();
        central.write_u16::<LittleEndian>(0).unwrap();
        central.write_u16::<LittleEndian>(0).unwrap();
        central.write_u16::<LittleEndian>(0).unwrap();
        central.write_u16::<LittleEndian>(0).unwrap();
        central.write_u32::<LittleEndian>(0).unwrap();
        central.write_u32::<LittleEndian>(offset).unwrap();
        central.write_all(name).unwrap();
    }

    let central_offset = output.len() as u32;
    output.write_all(&central).unwrap();

    output.write_u32::<LittleEndian>(0x0605_4b50).unwrap();
    output.write_u16::<LittleEndian>(0).unwrap();
    output.write_u16::<LittleEndian>(0).unwrap();
    output.write_u16::<LittleEndian>(entries.len() as u16).unwrap();
    output.write_u16::<LittleEndian>(entries.len() as u16).unwrap();
    output.write_u32::<LittleEndian>(central.len() as u32).unwrap();
    output.write_u32::<LittleEndian>(central_offset).unwrap();
    output.write_u16::<LittleEndian>(0).unwrap();

    output
}

pub fn sign(x: i32, y: i32, z: i32, messages: &[&str]) -> Compound {
    let messages = ListTag::from_values(
        messages.iter().map(|message| Tag::from(*message)).collect(),
    )
    .unwrap();

    let mut front_text = Compound::new();
    front_text.insert("messages".into(), messages.into());
    front_text.insert("color".into(), "black".into());
    front_text.insert("has_glowing_text".into(), Tag::Byte(0));

    let mut sign = Compound::new();
    sign.insert("id".into(), "minecraft:sign".into());
    sign.insert("x".into(), Tag::Int(x));
    sign.insert("y".into(), Tag::Int(y));
    sign.insert("z".into(), Tag::Int(z));
    sign.insert("is_waxed".into(), Tag::Byte(0));
    sign.insert("front_text".into(), front_text.into());
    sign
}

/// A chunk in the 1.18+ layout holding the given block entities.
pub fn chunk(x: i32, z: i32, block_entities: Vec<Compound>) -> NamedTag {
    let block_entities = ListTag::from_values(
        block_entities.into_iter().map(Tag::Compound).collect(),
    )
    .unwrap();

    let mut root = Compound::new();
    root.insert("DataVersion".into(), Tag::Int(3955));
    root.insert("xPos".into(), Tag::Int(x));
    root.insert("zPos".into(), Tag::Int(z));
    root.insert("yPos".into(), Tag::Int(-4));
    root.insert("Status".into(), "minecraft:full".into());
    root.insert("InhabitedTime".into(), Tag::Long(1200));
    root.insert("block_entities".into(), block_entities.into());

    NamedTag::new("", root)
}
