extern crate jpeg_spectra as jpeg;

use jpeg::{amplitude, read_entropy_segment, HuffmanTable, JpegRead, Marker};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn rng() -> StdRng {
    StdRng::seed_from_u64(0x1234_5678)
}

/// Every marker byte this decoder recognizes.
fn recognized_marker_bytes() -> Vec<u8> {
    let mut bytes: Vec<u8> = (0xC0..=0xCF).collect();
    bytes.extend(0xD0..=0xDD);
    bytes.extend(0xE0..=0xEF);
    bytes.push(0xFE);
    bytes
}

#[test]
fn marker_scan_swallows_arbitrary_fill_runs() {
    let mut rng = rng();
    let markers = recognized_marker_bytes();

    for _ in 0..1000 {
        let fill = rng.gen_range(1..64);
        let byte = markers[rng.gen_range(0..markers.len())];

        let mut stream = vec![0xFF; fill];
        stream.push(byte);

        let mut reader = stream.as_slice();
        assert_eq!(reader.next_marker().unwrap(), Marker::from_u8(byte).unwrap());
    }
}

/// The number of 16-bit codewords a leaf-count histogram covers; the table
/// is buildable exactly when at least the all-ones codeword is left over.
fn covered_codewords(counts: &[u8; 16]) -> u64 {
    counts
        .iter()
        .enumerate()
        .map(|(level, &count)| u64::from(count) << (15 - level))
        .sum()
}

#[test]
fn huffman_construction_succeeds_exactly_on_valid_histograms() {
    let mut rng = rng();

    for _ in 0..2000 {
        let mut counts = [0u8; 16];
        for count in counts.iter_mut() {
            // Biased towards zero so both outcomes occur often.
            *count = match rng.gen_range(0..8) {
                0 => rng.gen_range(1..4),
                1 => rng.gen_range(1..32),
                _ => 0,
            };
        }

        let total: usize = counts.iter().map(|&count| usize::from(count)).sum();
        if total > 256 {
            continue;
        }
        let values: Vec<u8> = (0..total as u16).map(|value| value as u8).collect();

        let valid = covered_codewords(&counts) < (1 << 16);
        assert_eq!(
            HuffmanTable::new(&counts, &values).is_ok(),
            valid,
            "histogram {:?} covering {} codewords",
            counts,
            covered_codewords(&counts),
        );
    }
}

#[test]
fn huffman_decode_round_trips_canonical_codes() {
    let mut rng = rng();

    'tables: for _ in 0..200 {
        // Draw histograms until one is valid and non-empty.
        let mut counts = [0u8; 16];
        loop {
            for count in counts.iter_mut() {
                *count = match rng.gen_range(0..6) {
                    0 => rng.gen_range(1..5),
                    _ => 0,
                };
            }
            let total: u64 = counts.iter().map(|&count| u64::from(count)).sum();
            if total > 0 && total <= 256 && covered_codewords(&counts) < (1 << 16) {
                break;
            }
        }

        let total: usize = counts.iter().map(|&count| usize::from(count)).sum();
        let values: Vec<u8> = (0..total as u16).map(|value| value as u8).collect();
        let table = match HuffmanTable::new(&counts, &values) {
            Ok(table) => table,
            Err(_) => continue 'tables,
        };

        // Assign canonical codewords in the DHT order (Annex C).
        let mut code = 0u32;
        let mut leaf = 0usize;
        for (level, &count) in counts.iter().enumerate() {
            let length = level as u8 + 1;
            for _ in 0..count {
                let aligned = (code << (16 - length)) as u16;
                let trailing = if length == 16 {
                    0
                } else {
                    rng.gen::<u16>() >> length
                };

                let entry = table.decode(aligned | trailing).unwrap();
                assert_eq!(entry.value, values[leaf]);
                assert_eq!(entry.length, length);

                code += 1;
                leaf += 1;
            }
            code <<= 1;
        }
    }
}

#[test]
fn amplitude_round_trips_every_category() {
    let mut rng = rng();

    for count in 1u8..=15 {
        let half = 1i32 << (count - 1);
        let full = (1i32 << count) - 1;

        let magnitudes = (half..=full).map(|v| v as i16);
        for magnitude in magnitudes {
            for &value in &[magnitude, -magnitude] {
                // A positive value is its own bit pattern; a negative one is
                // stored in one's complement.
                let pattern = if value > 0 {
                    value as u16
                } else {
                    (i32::from(value) + full) as u16
                };

                let trailing = rng.gen::<u16>() >> count;
                let window = (pattern << (16 - count)) | trailing;
                assert_eq!(
                    amplitude(count, window),
                    value,
                    "category {} value {}",
                    count,
                    value
                );
            }
        }
    }
}

#[test]
fn destuffing_round_trips_marker_free_payloads() {
    let mut rng = rng();

    for _ in 0..500 {
        let length = rng.gen_range(0..256);
        let payload: Vec<u8> = (0..length).map(|_| rng.gen()).collect();

        // JPEG byte stuffing: a zero byte after every 0xFF.
        let mut wire = Vec::with_capacity(payload.len() * 2 + 2);
        for &byte in &payload {
            wire.push(byte);
            if byte == 0xFF {
                wire.push(0x00);
            }
        }
        wire.extend([0xFF, 0xD9]);

        let mut reader = wire.as_slice();
        let (destuffed, terminator) = read_entropy_segment(&mut reader).unwrap();
        assert_eq!(destuffed, payload);
        assert_eq!(terminator, Marker::EOI);
    }
}
