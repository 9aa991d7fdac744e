#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (dxtc::Format, [u8; 16])| {
    let (format, block) = input;

    // The largest DXTC compressed block is 16 bytes.
    let block = &block[..format.block_size_in_bytes()];
    let pixels = dxtc::decode_block_rgba8(block, format).unwrap();

    if format == dxtc::Format::Dxt1 {
        assert!(pixels.iter().flatten().all(|p| p[3] == 255));
    }
});
