mod bitstream;
mod linked_list;

pub use bitstream::*;
pub use linked_list::*;

type InternalPtr = u32;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
/// # Description
/// a pointer type for pointer-based data-structures
pub struct Ptr(InternalPtr);

impl Ptr {
    pub fn as_usize(&self) -> usize {
        self.0 as usize
    }

    pub fn is_null(&self) -> bool {
        *self == NULL
    }
}

impl From<usize> for Ptr {
    fn from(idx: usize) -> Self {
        Self(idx as InternalPtr)
    }
}

pub const NULL: Ptr = Ptr(!0);
