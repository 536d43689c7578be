//! 16-bit packed pixel conversions
//!
//! Channel order in the names runs from the least significant bit, so
//! `R5G6B5` keeps red in bits 0..5 and blue in bits 11..16.

/// Expand 16-bit pixels with `convert` into RGBA8
fn convert_u16(data: &[u8], convert: impl Fn(u16) -> [u8; 4]) -> Vec<u8> {
    let mut output = Vec::with_capacity(data.len() * 2);

    for pixel in data.chunks_exact(2) {
        output.extend_from_slice(&convert(u16::from_le_bytes([pixel[0], pixel[1]])));
    }

    output
}

#[inline]
fn expand5(value: u16) -> u8 {
    let value = (value & 0x1f) as u8;
    (value << 3) | (value >> 2)
}

#[inline]
fn expand6(value: u16) -> u8 {
    let value = (value & 0x3f) as u8;
    (value << 2) | (value >> 4)
}

#[inline]
fn expand4(value: u16) -> u8 {
    let value = (value & 0xf) as u8;
    value | (value << 4)
}

pub fn r5g6b5_to_rgba8(data: &[u8]) -> Vec<u8> {
    convert_u16(data, |p| [expand5(p), expand6(p >> 5), expand5(p >> 11), 0xff])
}

/// `force_alpha` is used for the X1 variant whose top bit carries no alpha
pub fn r5g5b5a1_to_rgba8(data: &[u8], force_alpha: bool) -> Vec<u8> {
    convert_u16(data, |p| {
        let alpha = if force_alpha || p & 0x8000 != 0 { 0xff } else { 0 };
        [expand5(p), expand5(p >> 5), expand5(p >> 10), alpha]
    })
}

pub fn a1b5g5r5_to_rgba8(data: &[u8]) -> Vec<u8> {
    convert_u16(data, |p| {
        let alpha = if p & 1 != 0 { 0xff } else { 0 };
        [expand5(p >> 11), expand5(p >> 6), expand5(p >> 1), alpha]
    })
}

pub fn r4g4b4a4_to_rgba8(data: &[u8]) -> Vec<u8> {
    convert_u16(data, |p| [expand4(p), expand4(p >> 4), expand4(p >> 8), expand4(p >> 12)])
}

/// Swap red and blue in place, turning BGRA8 into RGBA8 and back
pub fn swap_red_blue(data: &mut [u8]) {
    for pixel in data.chunks_exact_mut(4) {
        pixel.swap(0, 2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_r5g6b5_channels() {
        let red = 0x001fu16.to_le_bytes();
        let green = 0x07e0u16.to_le_bytes();
        let blue = 0xf800u16.to_le_bytes();
        let data = [red, green, blue].concat();

        let output = r5g6b5_to_rgba8(&data);
        assert_eq!(output, vec![255, 0, 0, 255, 0, 255, 0, 255, 0, 0, 255, 255]);
    }

    #[test]
    fn test_r5g5b5_alpha_modes() {
        let data = 0x001fu16.to_le_bytes();

        assert_eq!(r5g5b5a1_to_rgba8(&data, false), vec![255, 0, 0, 0]);
        assert_eq!(r5g5b5a1_to_rgba8(&data, true), vec![255, 0, 0, 255]);
    }

    #[test]
    fn test_a1b5g5r5_channels() {
        // red in the top five bits, alpha in bit zero
        let data = 0xf801u16.to_le_bytes();
        assert_eq!(a1b5g5r5_to_rgba8(&data), vec![255, 0, 0, 255]);
    }

    #[test]
    fn test_r4g4b4a4_replicates_nibbles() {
        let data = 0x8421u16.to_le_bytes();
        assert_eq!(r4g4b4a4_to_rgba8(&data), vec![0x11, 0x22, 0x44, 0x88]);
    }

    #[test]
    fn test_swap_red_blue() {
        let mut data = vec![1, 2, 3, 4, 5, 6, 7, 8];
        swap_red_blue(&mut data);
        assert_eq!(data, vec![3, 2, 1, 4, 7, 6, 5, 8]);
    }
}
