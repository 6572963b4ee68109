// Half-precision conversion for the tensor wire format. The stick consumes
// and produces IEEE 754 binary16 values, little-endian on the bulk pipe.

pub fn f32_to_f16(value: f32) -> u16 {
    let bits = value.to_bits();
    let sign = ((bits >> 16) & 0x8000) as u16;
    let exp = ((bits >> 23) & 0xff) as i32;
    let mant = bits & 0x007f_ffff;

    if exp == 0xff {
        if mant == 0 {
            return sign | 0x7c00;
        }
        // Quieten NaN, keep it a NaN.
        return sign | 0x7e00 | ((mant >> 13) as u16 & 0x01ff);
    }

    let unbiased = exp - 127;

    if unbiased >= 16 {
        return sign | 0x7c00;
    }

    if unbiased >= -14 {
        let half_exp = (unbiased + 15) as u32;
        let mut half = (half_exp << 10) | (mant >> 13);
        let round_bits = mant & 0x1fff;
        if round_bits > 0x1000 || (round_bits == 0x1000 && (half & 1) != 0) {
            // Carry into the exponent is still a well-formed half.
            half += 1;
        }
        return sign | half as u16;
    }

    if unbiased >= -25 {
        let full_mant = mant | 0x0080_0000;
        let shift = (-unbiased - 1) as u32;
        let mut half = full_mant >> shift;
        let rem = full_mant & ((1u32 << shift) - 1);
        let halfway = 1u32 << (shift - 1);
        if rem > halfway || (rem == halfway && (half & 1) != 0) {
            half += 1;
        }
        return sign | half as u16;
    }

    // Too small for a subnormal half.
    sign
}

pub fn f16_to_f32(half: u16) -> f32 {
    let sign = ((half & 0x8000) as u32) << 16;
    let exp = ((half >> 10) & 0x1f) as u32;
    let mant = (half & 0x03ff) as u32;

    let bits = match (exp, mant) {
        (0, 0) => sign,
        (0, _) => {
            // Renormalize a subnormal half.
            let shift = mant.leading_zeros() - 21;
            let mant = (mant << shift) & 0x03ff;
            let exp = 113 - shift;
            sign | (exp << 23) | (mant << 13)
        }
        (0x1f, 0) => sign | 0x7f80_0000,
        (0x1f, _) => sign | 0x7fc0_0000 | (mant << 13),
        _ => sign | ((exp + 112) << 23) | (mant << 13),
    };

    f32::from_bits(bits)
}

pub fn encode_f16_slice(values: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * 2);
    for &value in values {
        out.extend_from_slice(&f32_to_f16(value).to_le_bytes());
    }
    out
}

// Callers are expected to have rejected odd-length payloads already; a
// trailing odd byte is dropped here.
pub fn decode_f16_slice(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|pair| f16_to_f32(u16::from_le_bytes([pair[0], pair[1]])))
        .collect()
}
