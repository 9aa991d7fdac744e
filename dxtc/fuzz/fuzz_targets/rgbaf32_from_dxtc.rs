#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (dxtc::Format, f32, [u8; 16])| {
    let (format, gamma, block) = input;
    let block = &block[..format.block_size_in_bytes()];
    let result = dxtc::rgbaf32_from_dxtc(4, 4, block, format, gamma as f64);
    assert!(result.is_ok());
});
