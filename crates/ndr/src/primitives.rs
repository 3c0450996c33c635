//! NDR primitive type implementations
//!
//! NDR primitive types and their encodings:
//!
//! | MIDL Type     | Rust Type | Size | Alignment |
//! |---------------|-----------|------|-----------|
//! | boolean       | bool      | 1    | 1         |
//! | byte/char     | u8        | 1    | 1         |
//! | small         | i8        | 1    | 1         |
//! | short         | i16       | 2    | 2         |
//! | long/int      | i32       | 4    | 4         |
//! | hyper         | i64       | 8    | 8         |
//! | unsigned short| u16       | 2    | 2         |
//! | unsigned long | u32       | 4    | 4         |
//! | unsigned hyper| u64       | 8    | 8         |
//! | float         | f32       | 4    | 4         |
//! | double        | f64       | 8    | 8         |
//! | wchar_t       | u16       | 2    | 2         |
//! | error_status_t| u32       | 4    | 4         |

use crate::{NdrDecode, NdrEncode, NdrReader, NdrWriter, Result};

macro_rules! impl_ndr_primitive {
    ($ty:ty, $align:expr, $write:ident, $read:ident) => {
        impl NdrEncode for $ty {
            fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
                w.$write(*self);
                Ok(())
            }

            fn ndr_align() -> usize {
                $align
            }
        }

        impl NdrDecode for $ty {
            fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
                *self = r.$read()?;
                Ok(())
            }

            fn ndr_align() -> usize {
                $align
            }
        }
    };
}

impl_ndr_primitive!(bool, 1, write_bool, read_bool);
impl_ndr_primitive!(u8, 1, write_u8, read_u8);
impl_ndr_primitive!(i8, 1, write_i8, read_i8);
impl_ndr_primitive!(u16, 2, write_u16, read_u16);
impl_ndr_primitive!(i16, 2, write_i16, read_i16);
impl_ndr_primitive!(u32, 4, write_u32, read_u32);
impl_ndr_primitive!(i32, 4, write_i32, read_i32);
impl_ndr_primitive!(u64, 8, write_u64, read_u64);
impl_ndr_primitive!(i64, 8, write_i64, read_i64);
impl_ndr_primitive!(f32, 4, write_f32, read_f32);
impl_ndr_primitive!(f64, 8, write_f64, read_f64);

/// NDR error_status_t
pub type ErrorStatusT = u32;

/// HRESULT as carried in a response; zero means success
pub type Hresult = i32;
