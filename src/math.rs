pub mod lifting;
pub mod zerotree;

pub use lifting::*;
pub use zerotree::*;

/// # Description
/// returns `log2(len)`
/// ## Comments
/// panics unless `len` is a power of two no smaller than 2, frames of any other
/// length are a caller bug
pub fn power_of_two(len: usize) -> u32 {
    assert!(len > 1, "length must be at least 2, got {}", len);
    assert!(
        len.is_power_of_two(),
        "length must be a power of two, got {}",
        len
    );
    len.trailing_zeros()
}

mod tests {
    #[allow(unused_imports)]
    use super::*;

    #[test]
    fn powers() {
        assert_eq!(power_of_two(2), 1);
        assert_eq!(power_of_two(1024), 10);
        assert_eq!(power_of_two(1 << 16), 16);
    }

    #[test]
    #[should_panic]
    fn rejects_one() {
        power_of_two(1);
    }

    #[test]
    #[should_panic]
    fn rejects_non_power() {
        power_of_two(1000);
    }
}
