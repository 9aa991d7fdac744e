#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (u8, u8, dxtc::Format, &[u8])| {
    let (width, height, format, data) = input;
    let (width, height) = (width as u32, height as u32);

    // Pad or truncate the data to hit the decoding path more often.
    if let Some(size) = dxtc::dxtc_size(width, height, format) {
        let mut data = data.to_vec();
        data.resize(size, 0u8);
        if let Ok(rgba) = dxtc::rgba8_from_dxtc(width, height, &data, format) {
            assert_eq!(width as usize * height as usize * 4, rgba.len());
        }
    }
});
