#![no_main]

use libfuzzer_sys::fuzz_target;
use rdes::{CodecConfig, Compressor, Decompressor, Variant, RAW_VALUE_MAX};

fuzz_target!(|data: &[u8]| {
    // First byte picks the variant, column count and refresh interval
    let Some((&setup, rest)) = data.split_first() else {
        return;
    };
    let variant = Variant::ALL[usize::from(setup % 3)];
    let columns = usize::from((setup >> 2) % 4) + 1;
    let refresh = u32::from(setup >> 4);
    let config = CodecConfig::new(variant, columns).with_refresh_interval(refresh);

    // Remaining bytes are little-endian u32 values, masked to 31 bits
    let values: Vec<u32> = rest
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]) & RAW_VALUE_MAX)
        .collect();
    let rows: Vec<&[u32]> = values.chunks_exact(columns).collect();

    let mut comp = Compressor::new(config.clone()).unwrap();
    for row in &rows {
        comp.write_row(row).unwrap();
    }

    // Property 1: never larger than the raw table
    let bytes = comp.to_bytes();
    assert!(bytes.len() as u64 <= comp.uncompressed_size(), "output expanded");

    // Property 2: lossless
    let mut deco = Decompressor::new(config).unwrap();
    let decoded = deco.decompress(&bytes).unwrap();
    assert_eq!(decoded.len(), rows.len(), "row count mismatch");
    for (got, want) in decoded.iter().zip(&rows) {
        let want: Vec<i64> = want.iter().map(|&v| i64::from(v)).collect();
        assert_eq!(got, &want, "value mismatch");
    }
});
