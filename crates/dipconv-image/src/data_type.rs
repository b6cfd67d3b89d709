/// Pixel data type of an image.
///
/// Samples are always stored as `f64` or `Complex<f64>`; the data type records what the pixels
/// represent and drives the output type of filters and the value used by the `add max` and
/// `add min` boundary conditions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataType {
    /// Binary pixels, 0 or 1.
    Bin,
    /// 8-bit unsigned integer.
    UInt8,
    /// 16-bit unsigned integer.
    UInt16,
    /// 32-bit unsigned integer.
    UInt32,
    /// 8-bit signed integer.
    SInt8,
    /// 16-bit signed integer.
    SInt16,
    /// 32-bit signed integer.
    SInt32,
    /// Single precision float.
    SFloat,
    /// Double precision float.
    DFloat,
    /// Single precision complex.
    SComplex,
    /// Double precision complex.
    DComplex,
}

impl DataType {
    /// Whether the type holds complex samples.
    pub fn is_complex(&self) -> bool {
        matches!(self, DataType::SComplex | DataType::DComplex)
    }

    /// Whether the type is a real floating point type.
    pub fn is_float(&self) -> bool {
        matches!(self, DataType::SFloat | DataType::DFloat)
    }

    /// Whether the type is an integer type.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            DataType::UInt8
                | DataType::UInt16
                | DataType::UInt32
                | DataType::SInt8
                | DataType::SInt16
                | DataType::SInt32
        )
    }

    /// Whether the type is binary.
    pub fn is_binary(&self) -> bool {
        matches!(self, DataType::Bin)
    }

    /// Largest value representable by the type.
    ///
    /// For complex types this is the largest value of one component.
    pub fn max_value(&self) -> f64 {
        match self {
            DataType::Bin => 1.0,
            DataType::UInt8 => u8::MAX as f64,
            DataType::UInt16 => u16::MAX as f64,
            DataType::UInt32 => u32::MAX as f64,
            DataType::SInt8 => i8::MAX as f64,
            DataType::SInt16 => i16::MAX as f64,
            DataType::SInt32 => i32::MAX as f64,
            DataType::SFloat | DataType::SComplex => f32::MAX as f64,
            DataType::DFloat | DataType::DComplex => f64::MAX,
        }
    }

    /// Lowest value representable by the type.
    pub fn min_value(&self) -> f64 {
        match self {
            DataType::Bin | DataType::UInt8 | DataType::UInt16 | DataType::UInt32 => 0.0,
            DataType::SInt8 => i8::MIN as f64,
            DataType::SInt16 => i16::MIN as f64,
            DataType::SInt32 => i32::MIN as f64,
            DataType::SFloat | DataType::SComplex => f32::MIN as f64,
            DataType::DFloat | DataType::DComplex => f64::MIN,
        }
    }

    /// The type a linear filter computes in for inputs of this type.
    ///
    /// Binary and integer types are promoted to `SFloat`, floating point and complex types are
    /// kept.
    pub fn suggest_flex(&self) -> DataType {
        match self {
            DataType::DFloat => DataType::DFloat,
            DataType::SComplex => DataType::SComplex,
            DataType::DComplex => DataType::DComplex,
            _ => DataType::SFloat,
        }
    }

    /// The complex type with the same precision.
    pub fn to_complex(&self) -> DataType {
        match self {
            DataType::DFloat | DataType::DComplex => DataType::DComplex,
            _ => DataType::SComplex,
        }
    }

    /// The real type with the same precision. Real types are returned unchanged.
    pub fn to_real(&self) -> DataType {
        match self {
            DataType::SComplex => DataType::SFloat,
            DataType::DComplex => DataType::DFloat,
            other => *other,
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            DataType::Bin => "BIN",
            DataType::UInt8 => "UINT8",
            DataType::UInt16 => "UINT16",
            DataType::UInt32 => "UINT32",
            DataType::SInt8 => "SINT8",
            DataType::SInt16 => "SINT16",
            DataType::SInt32 => "SINT32",
            DataType::SFloat => "SFLOAT",
            DataType::DFloat => "DFLOAT",
            DataType::SComplex => "SCOMPLEX",
            DataType::DComplex => "DCOMPLEX",
        };
        write!(f, "{name}")
    }
}
