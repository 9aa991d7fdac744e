#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (u16, u16, u32, &[u8])| {
    // Keep dimensions small enough to avoid large allocations.
    let (width, height, format, data) = input;
    let _raster = dxtc::decompress(data, width as u32, height as u32, format);
});
