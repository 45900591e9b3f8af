#![no_main]

use libfuzzer_sys::fuzz_target;
use rdes::{Decompressor, Variant};

fuzz_target!(|data: &[u8]| {
    // First byte is the chunk size, the rest an arbitrary stream.
    // Chunked feeding must agree with one-shot decoding, rows and errors alike.
    let Some((&chunk, stream)) = data.split_first() else {
        return;
    };
    let chunk = usize::from(chunk).max(1);

    for variant in Variant::ALL {
        let mut whole = Decompressor::with_variant(variant, 2).unwrap();
        let expected = whole.decompress(stream);

        let mut pieces = Decompressor::with_variant(variant, 2).unwrap();
        let mut rows = Vec::new();
        let mut failed = false;
        for piece in stream.chunks(chunk) {
            match pieces.feed(piece) {
                Ok(decoded) => rows.extend(decoded),
                Err(_) => {
                    failed = true;
                    break;
                }
            }
        }
        let finished = !failed && pieces.finish().is_ok();

        match expected {
            Ok(all) => {
                assert!(finished, "chunked decode failed on a valid stream");
                assert_eq!(rows, all, "chunked rows differ");
            }
            Err(_) => assert!(!finished, "chunked decode accepted an invalid stream"),
        }
    }
});
