//! Packed integer command implementation.

use cpsave_codec::{encode_packed_int, PackedInt};

/// Runs the packed command.
pub fn run(value: i64) -> Result<(), Box<dyn std::error::Error>> {
    let packed = encode_packed_int(value)?;
    println!("{} => {} ({} bytes)", value, format_hex(&packed), packed.len());
    Ok(())
}

fn format_hex(packed: &PackedInt) -> String {
    packed
        .as_bytes()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
