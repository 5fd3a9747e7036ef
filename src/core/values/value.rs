use serde::{Deserialize, Serialize};

/// Widest bit-vector a port can carry
pub const MAX_WIDTH: u8 = 32;

/// Fixed-width bit-vector carried by ports.
///
/// Bits above `width` are always zero, so derived equality is structural.
/// An invalid value stands for an undriven signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Value {
    bits: u32,
    width: u8,
    valid: bool,
}

fn mask(width: u8) -> u32 {
    if width >= 32 {
        u32::MAX
    } else {
        (1u32 << width) - 1
    }
}

impl Value {
    /// Create a valid value, truncating `bits` to `width`
    pub fn new(width: u8, bits: u32) -> Self {
        let width = width.clamp(1, MAX_WIDTH);
        Self {
            bits: bits & mask(width),
            width,
            valid: true,
        }
    }

    pub fn zero(width: u8) -> Self {
        Self::new(width, 0)
    }

    /// Value of an undriven port
    pub fn floating(width: u8) -> Self {
        Self {
            bits: 0,
            width: width.clamp(1, MAX_WIDTH),
            valid: false,
        }
    }

    pub fn from_bool(b: bool) -> Self {
        Self::new(1, b as u32)
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Largest value representable at this width
    pub fn max(&self) -> u32 {
        mask(self.width)
    }

    /// Read a single bit; out of range bits read as zero
    pub fn bit(&self, index: u8) -> bool {
        index < self.width && (self.bits >> index) & 1 == 1
    }

    /// True if the value is valid and non-zero
    pub fn is_high(&self) -> bool {
        self.valid && self.bits != 0
    }

    /// Zero-extend or truncate to `width`, keeping validity
    pub fn resized(&self, width: u8) -> Self {
        let mut v = Self::new(width, self.bits);
        v.valid = self.valid;
        v
    }

    fn combine(&self, other: &Value, op: impl Fn(u32, u32) -> u32) -> Self {
        let width = self.width.max(other.width);
        let mut v = Self::new(width, op(self.bits, other.bits));
        v.valid = self.valid && other.valid;
        v
    }

    pub fn and(&self, other: &Value) -> Self {
        self.combine(other, |a, b| a & b)
    }

    pub fn or(&self, other: &Value) -> Self {
        self.combine(other, |a, b| a | b)
    }

    pub fn xor(&self, other: &Value) -> Self {
        self.combine(other, |a, b| a ^ b)
    }

    pub fn not(&self) -> Self {
        let mut v = Self::new(self.width, !self.bits);
        v.valid = self.valid;
        v
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for i in (0..self.width).rev() {
            let c = if !self.valid {
                'x'
            } else if self.bit(i) {
                '1'
            } else {
                '0'
            };
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_masks_to_width() {
        let v = Value::new(4, 0x1f);
        assert_eq!(v.bits(), 0xf);
        assert_eq!(v, Value::new(4, 15));
        assert_eq!(Value::new(32, u32::MAX).bits(), u32::MAX);
    }

    #[test]
    fn test_width_is_part_of_equality() {
        assert_ne!(Value::new(4, 1), Value::new(1, 1));
        assert_ne!(Value::zero(4), Value::floating(4));
    }

    #[test]
    fn test_resize_keeps_validity() {
        assert_eq!(Value::new(4, 0b1010).resized(2), Value::new(2, 0b10));
        assert!(!Value::floating(4).resized(8).is_valid());
        assert_eq!(Value::new(2, 3).resized(4).bits(), 3);
    }

    #[test]
    fn test_bitwise_ops() {
        let a = Value::new(4, 0b1100);
        let b = Value::new(4, 0b1010);
        assert_eq!(a.and(&b).bits(), 0b1000);
        assert_eq!(a.or(&b).bits(), 0b1110);
        assert_eq!(a.xor(&b).bits(), 0b0110);
        assert_eq!(a.not().bits(), 0b0011);
        assert!(!a.or(&Value::floating(4)).is_valid());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::new(4, 5).to_string(), "0101");
        assert_eq!(Value::floating(2).to_string(), "xx");
    }
}
