#![no_main]

use libfuzzer_sys::fuzz_target;
use rdes::{inspect, CodecConfig, Decompressor, Variant};

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must decode to rows or an error, never a panic.
    // Plain and framed decoders with 1-3 columns and a signed column.
    for variant in Variant::ALL {
        for columns in 1..=3 {
            for framed in [false, true] {
                let config = CodecConfig::new(variant, columns)
                    .with_signed_columns([columns - 1])
                    .with_framing(framed);
                let Ok(mut deco) = Decompressor::new(config.clone()) else {
                    continue;
                };

                let strict = deco.decompress(data);
                let listed = inspect(&config, data);
                assert_eq!(strict.is_ok(), listed.is_ok(), "decompress and inspect disagree");

                deco.reset();
                let _ = deco.feed(data);
                let _ = deco.finish();
            }
        }
    }
});
