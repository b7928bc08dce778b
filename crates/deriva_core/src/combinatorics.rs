//! Small combinatorial helpers the builder and search use to split a size
//! budget across several slots.

/// Every ordered partition of `total` into `n` strictly positive integers.
///
/// `pick_to_sum(0, 0)` yields the single empty tuple; `pick_to_sum(0, k)` for
/// `k > 0` yields nothing. Otherwise the first slot ranges from `1` up to
/// `total - (n - 1)` (leaving at least `1` for each remaining slot), and the
/// rest recurses — this is what gives `pick_to_sum(3, 5)` the order
/// `(1,1,3), (1,2,2), (1,3,1), (2,1,2), (2,2,1), (3,1,1)`.
pub fn pick_to_sum(n: usize, total: u32) -> Vec<Vec<u32>> {
    if n == 0 {
        return if total == 0 { vec![vec![]] } else { vec![] };
    }
    if n == 1 {
        return if total >= 1 { vec![vec![total]] } else { vec![] };
    }
    let mut out = Vec::new();
    if total < n as u32 {
        return out;
    }
    let max_first = total - (n as u32 - 1);
    for first in 1..=max_first {
        for mut rest in pick_to_sum(n - 1, total - first) {
            let mut row = Vec::with_capacity(n);
            row.push(first);
            row.append(&mut rest);
            out.push(row);
        }
    }
    out
}

/// The Cartesian product of `lists`, ordered with the first list outermost:
/// the result varies the last list fastest, matching how a sequence of
/// nested loops (first list as the outer loop) would enumerate it.
pub fn cross_product<T: Clone>(lists: &[Vec<T>]) -> Vec<Vec<T>> {
    let mut out: Vec<Vec<T>> = vec![vec![]];
    for list in lists {
        let mut next = Vec::with_capacity(out.len() * list.len());
        for prefix in &out {
            for item in list {
                let mut row = prefix.clone();
                row.push(item.clone());
                next.push(row);
            }
        }
        out = next;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_to_sum_three_five_matches_the_documented_order() {
        let got = pick_to_sum(3, 5);
        assert_eq!(
            got,
            vec![
                vec![1, 1, 3],
                vec![1, 2, 2],
                vec![1, 3, 1],
                vec![2, 1, 2],
                vec![2, 2, 1],
                vec![3, 1, 1],
            ]
        );
    }

    #[test]
    fn pick_to_sum_empty_case() {
        assert_eq!(pick_to_sum(0, 0), vec![Vec::<u32>::new()]);
        assert!(pick_to_sum(0, 3).is_empty());
    }

    #[test]
    fn pick_to_sum_singleton_case() {
        assert_eq!(pick_to_sum(1, 7), vec![vec![7]]);
    }

    #[test]
    fn pick_to_sum_every_tuple_sums_to_total() {
        for row in pick_to_sum(4, 9) {
            assert_eq!(row.len(), 4);
            assert_eq!(row.iter().sum::<u32>(), 9);
            assert!(row.iter().all(|&x| x >= 1));
        }
    }

    #[test]
    fn cross_product_varies_last_fastest() {
        let a = cross_product(&[vec![1, 2], vec![10, 20]]);
        assert_eq!(a, vec![vec![1, 10], vec![1, 20], vec![2, 10], vec![2, 20]]);
    }

    #[test]
    fn cross_product_of_empty_lists_is_one_empty_row() {
        let a: Vec<Vec<i32>> = cross_product(&[]);
        assert_eq!(a, vec![vec![]]);
    }
}
