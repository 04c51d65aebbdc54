#![no_main]
use libfuzzer_sys::fuzz_target;

use jpeg_spectra::Decoder;

fuzz_target!(|data: &[u8]| {
    // Arbitrary input must never panic, only return errors.
    let mut decoder = Decoder::new(data);
    let _ = decoder.decode();
});
