//! Encoding and decoding of the primitive types all wire structs are composed of
//! (u8, u16, u32, i8, i16, i32, f32 and fixed-size arrays), little-endian as on the wire.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

use crate::Result;

/// The `Encode` trait allows objects to be encoded to raw bytes.
/// See [`Decode`] for decoding objects from raw bytes.
///
/// Components are encoded in the order they appear in the type definition.
pub trait Encode {
    /// Writes the encoded representation into `write`.
    fn encode(&self, write: impl Write) -> Result<()>;

    /// The number of bytes [`Encode::encode`] will produce.
    fn encoded_len(&self) -> usize;
}

/// The `Decode` trait allows objects to be decoded from raw bytes.
/// See [`Encode`] for encoding objects into raw bytes.
pub trait Decode {
    /// Reads one value from `read`.
    fn decode(read: impl Read) -> Result<Self>
    where
        Self: Sized;
}

impl Encode for bool {
    fn encode(&self, mut write: impl Write) -> Result<()> {
        write.write_u8(u8::from(*self))?;
        Ok(())
    }

    fn encoded_len(&self) -> usize {
        1
    }
}

impl Decode for bool {
    fn decode(mut read: impl Read) -> Result<Self> {
        Ok(read.read_u8()? != 0)
    }
}

impl Encode for u8 {
    fn encode(&self, mut write: impl Write) -> Result<()> {
        write.write_u8(*self)?;
        Ok(())
    }

    fn encoded_len(&self) -> usize {
        1
    }
}

impl Decode for u8 {
    fn decode(mut read: impl Read) -> Result<Self> {
        Ok(read.read_u8()?)
    }
}

impl Encode for i8 {
    fn encode(&self, mut write: impl Write) -> Result<()> {
        write.write_i8(*self)?;
        Ok(())
    }

    fn encoded_len(&self) -> usize {
        1
    }
}

impl Decode for i8 {
    fn decode(mut read: impl Read) -> Result<Self> {
        Ok(read.read_i8()?)
    }
}

impl Encode for u16 {
    fn encode(&self, mut write: impl Write) -> Result<()> {
        write.write_u16::<LittleEndian>(*self)?;
        Ok(())
    }

    fn encoded_len(&self) -> usize {
        2
    }
}

impl Decode for u16 {
    fn decode(mut read: impl Read) -> Result<Self> {
        Ok(read.read_u16::<LittleEndian>()?)
    }
}

impl Encode for i16 {
    fn encode(&self, mut write: impl Write) -> Result<()> {
        write.write_i16::<LittleEndian>(*self)?;
        Ok(())
    }

    fn encoded_len(&self) -> usize {
        2
    }
}

impl Decode for i16 {
    fn decode(mut read: impl Read) -> Result<Self> {
        Ok(read.read_i16::<LittleEndian>()?)
    }
}

impl Encode for u32 {
    fn encode(&self, mut write: impl Write) -> Result<()> {
        write.write_u32::<LittleEndian>(*self)?;
        Ok(())
    }

    fn encoded_len(&self) -> usize {
        4
    }
}

impl Decode for u32 {
    fn decode(mut read: impl Read) -> Result<Self> {
        Ok(read.read_u32::<LittleEndian>()?)
    }
}

impl Encode for i32 {
    fn encode(&self, mut write: impl Write) -> Result<()> {
        write.write_i32::<LittleEndian>(*self)?;
        Ok(())
    }

    fn encoded_len(&self) -> usize {
        4
    }
}

impl Decode for i32 {
    fn decode(mut read: impl Read) -> Result<Self> {
        Ok(read.read_i32::<LittleEndian>()?)
    }
}

impl Encode for f32 {
    fn encode(&self, mut write: impl Write) -> Result<()> {
        write.write_f32::<LittleEndian>(*self)?;
        Ok(())
    }

    fn encoded_len(&self) -> usize {
        4
    }
}

impl Decode for f32 {
    fn decode(mut read: impl Read) -> Result<Self> {
        Ok(read.read_f32::<LittleEndian>()?)
    }
}

impl<T, const N: usize> Encode for [T; N]
where
    T: Encode,
{
    fn encode(&self, mut write: impl Write) -> Result<()> {
        for item in self {
            item.encode(&mut write)?;
        }
        Ok(())
    }

    fn encoded_len(&self) -> usize {
        self.iter().map(Encode::encoded_len).sum()
    }
}

impl<T, const N: usize> Decode for [T; N]
where
    T: Decode + Copy,
{
    fn decode(mut read: impl Read) -> Result<Self> {
        let mut arr = [T::decode(&mut read)?; N];
        for item in arr.iter_mut().skip(1) {
            *item = T::decode(&mut read)?;
        }
        Ok(arr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Debug;

    fn roundtrip<T>(input: T) -> Result<()>
    where
        T: Encode + Decode + Debug + PartialEq,
    {
        let mut encoded: Vec<u8> = Vec::new();
        input.encode(&mut encoded)?;
        let decoded = T::decode(&mut encoded.as_slice())?;

        assert_eq!(input, decoded);
        assert_eq!(input.encoded_len(), encoded.len());

        Ok(())
    }

    #[test]
    fn primitives() -> Result<()> {
        roundtrip(false)?;
        roundtrip(true)?;

        roundtrip(u8::MAX)?;
        roundtrip(u16::MAX)?;
        roundtrip(u32::MAX)?;

        roundtrip(i8::MIN)?;
        roundtrip(i16::MIN)?;
        roundtrip(i32::MIN)?;

        roundtrip(f32::MAX)?;
        roundtrip(-0.125_f32)?;

        Ok(())
    }

    #[test]
    fn arrays() -> Result<()> {
        roundtrip([u8::MAX; 4])?;
        roundtrip([i16::MIN; 3])?;
        roundtrip([1.5_f32, -2.25, 0.0])?;

        Ok(())
    }

    #[test]
    fn little_endian_on_the_wire() -> Result<()> {
        let mut buf = Vec::new();
        0x0102_u16.encode(&mut buf)?;
        assert_eq!(buf, [0x02, 0x01]);

        Ok(())
    }
}
