//! Significance map over the implicit coefficient tree
//!
//! ```text
//!           0
//!           |
//!           1
//!         /   \
//!        2     3
//!       / \   / \
//!      4   5 6   7      children of i live at 2i and 2i+1
//! ```

use super::power_of_two;

/// # Description
/// builds `map` where `map[i]` is the largest magnitude found *below* node `i`
/// ## Comments
/// - the leaf half of the array just mirrors `|coefs[i]|`
/// - with the map a whole subtree can be tested against a threshold with one comparison
pub fn build_significance_map(coefs: &[i32]) -> Vec<u32> {
    let length = coefs.len();
    let levels = power_of_two(length) - 1;
    let mut map = vec![0u32; length];

    for i in length / 2..length {
        map[i] = coefs[i].unsigned_abs();
    }

    let mut cur_start = length / 4;
    let mut cur_end = length / 2;
    for _ in 0..levels {
        for j in cur_start..cur_end {
            map[j] = map[2 * j]
                .max(map[2 * j + 1])
                .max(coefs[2 * j].unsigned_abs())
                .max(coefs[2 * j + 1].unsigned_abs());
        }
        cur_start /= 2;
        cur_end /= 2;
    }

    map[0] = map[1].max(coefs[1].unsigned_abs());
    map
}

mod tests {
    #[allow(unused_imports)]
    use super::*;

    #[test]
    fn eight_coefficients() {
        let coefs = [50, -3, 4, -9, 1, -2, 30, 0];
        let map = build_significance_map(&coefs);

        // leaves
        assert_eq!(&map[4..], &[1, 2, 30, 0]);
        // node 2 -> {4,5}, node 3 -> {6,7}
        assert_eq!(map[2], 2);
        assert_eq!(map[3], 30);
        // node 1 -> everything from 2 down
        assert_eq!(map[1], 30);
        // the root ignores its own value
        assert_eq!(map[0], 30);
    }

    #[test]
    fn map_bounds_every_descendant() {
        let coefs = (0..64)
            .map(|k: i32| ((k * 37) % 23 - 11) * if k % 5 == 0 { 40 } else { 1 })
            .collect::<Vec<_>>();
        let map = build_significance_map(&coefs);

        for i in 1..coefs.len() / 2 {
            let mut stack = vec![2 * i, 2 * i + 1];
            let mut largest = 0u32;
            while let Some(node) = stack.pop() {
                largest = largest.max(coefs[node].unsigned_abs());
                if 2 * node + 1 < coefs.len() {
                    stack.push(2 * node);
                    stack.push(2 * node + 1);
                }
            }
            assert_eq!(map[i], largest, "node {}", i);
        }
    }

    #[test]
    fn two_coefficients() {
        let map = build_significance_map(&[7, -5]);
        assert_eq!(map, vec![5, 5]);
    }
}
