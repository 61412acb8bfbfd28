//! Conversion of proportions into whole numbers of ballots.

use log::debug;

/// Rounds half up: `round_num(2.5) == 3`, `round_num(2.49) == 2`.
///
/// Negative inputs round to 0.
pub fn round_num(x: f64) -> u64 {
    let r = (x + 0.5).floor();
    if r <= 0.0 {
        0
    } else {
        r as u64
    }
}

/// How a number of ballots is split between blocs (or between crossover and
/// non-crossover voters inside a bloc).
///
/// - `LargestRemainder` gives every share the floor of its quota, then hands
///   the remaining ballots to the largest fractional parts. Ties go to the
///   share listed first. The counts always sum to the total.
/// - `PerShare` rounds every quota on its own with the given function. With
///   `round_num` this reproduces plain round-half-up, whose counts may differ
///   from the total by a few ballots.
#[derive(Debug, Clone, Copy)]
pub enum Apportionment {
    LargestRemainder,
    PerShare(fn(f64) -> u64),
}

impl Default for Apportionment {
    fn default() -> Self {
        Apportionment::LargestRemainder
    }
}

impl Apportionment {
    pub fn round_half_up() -> Apportionment {
        Apportionment::PerShare(round_num)
    }

    /// Splits `total` ballots according to `shares`.
    ///
    /// Shares must be non-negative. Under `LargestRemainder` they are
    /// normalised by their sum first; if they sum to zero, they are treated as
    /// equal.
    pub fn apportion(&self, total: u64, shares: &[f64]) -> Vec<u64> {
        let res = match self {
            Apportionment::PerShare(round) => shares
                .iter()
                .map(|s| round(total as f64 * s))
                .collect(),
            Apportionment::LargestRemainder => largest_remainder(total, shares),
        };
        debug!("apportion: {} over {:?} -> {:?}", total, shares, res);
        res
    }

    /// Splits `total` ballots between a set of rates and an implicit
    /// remainder share of `1 - sum(rates)`.
    ///
    /// Returns the count for each rate and the count for the remainder.
    /// Under `PerShare`, the rates are rounded first and the remainder gets
    /// whatever is left, so that the counts never exceed the total.
    pub fn split(&self, total: u64, rates: &[f64]) -> (Vec<u64>, u64) {
        match self {
            Apportionment::LargestRemainder => {
                let rest = (1.0 - rates.iter().sum::<f64>()).max(0.0);
                let mut shares = rates.to_vec();
                shares.push(rest);
                let mut counts = largest_remainder(total, &shares);
                let rest_count = counts.pop().unwrap_or(0);
                (counts, rest_count)
            }
            Apportionment::PerShare(round) => {
                let mut left = total;
                let counts: Vec<u64> = rates
                    .iter()
                    .map(|r| {
                        let c = round(total as f64 * r).min(left);
                        left -= c;
                        c
                    })
                    .collect();
                (counts, left)
            }
        }
    }
}

fn largest_remainder(total: u64, shares: &[f64]) -> Vec<u64> {
    if shares.is_empty() {
        return vec![];
    }
    let sum: f64 = shares.iter().sum();
    let quotas: Vec<f64> = if sum > 0.0 {
        shares.iter().map(|s| total as f64 * s / sum).collect()
    } else {
        vec![total as f64 / shares.len() as f64; shares.len()]
    };
    let mut counts: Vec<u64> = quotas.iter().map(|q| q.floor() as u64).collect();
    let fractions: Vec<f64> = quotas.iter().map(|q| q - q.floor()).collect();

    // Indices by decreasing fractional part, first share first on ties.
    let mut order: Vec<usize> = (0..shares.len()).collect();
    order.sort_by(|&i, &j| {
        fractions[j]
            .partial_cmp(&fractions[i])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(i.cmp(&j))
    });

    let mut assigned: u64 = counts.iter().sum();
    // Rounding noise in the quotas can overshoot by a ballot.
    for &idx in order.iter().rev() {
        if assigned <= total {
            break;
        }
        if counts[idx] > 0 {
            counts[idx] -= 1;
            assigned -= 1;
        }
    }
    let mut pos = 0;
    while assigned < total {
        counts[order[pos % order.len()]] += 1;
        assigned += 1;
        pos += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_half_up() {
        assert_eq!(round_num(2.5), 3);
        assert_eq!(round_num(2.4999), 2);
        assert_eq!(round_num(0.5), 1);
        assert_eq!(round_num(-3.0), 0);
        assert_eq!(round_num(70.00000000000001), 70);
    }

    #[test]
    fn largest_remainder_sums_to_total() {
        let lr = Apportionment::LargestRemainder;
        assert_eq!(lr.apportion(100, &[0.7, 0.3]), vec![70, 30]);
        assert_eq!(lr.apportion(3, &[0.6, 0.4]), vec![2, 1]);
        // Three equal thirds of ten: the first share gets the extra ballot.
        assert_eq!(lr.apportion(10, &[1.0, 1.0, 1.0]), vec![4, 3, 3]);
        assert_eq!(lr.apportion(7, &[0.0, 0.0]), vec![4, 3]);
        assert_eq!(lr.apportion(0, &[0.5, 0.5]), vec![0, 0]);
        for n in 0..200 {
            let counts = lr.apportion(n, &[0.15, 0.35, 0.2, 0.3]);
            assert_eq!(counts.iter().sum::<u64>(), n);
        }
    }

    #[test]
    fn split_with_remainder() {
        let lr = Apportionment::LargestRemainder;
        assert_eq!(lr.split(10, &[0.3]), (vec![3], 7));
        assert_eq!(lr.split(5, &[0.5, 0.5]), (vec![3, 2], 0));
        assert_eq!(lr.split(7, &[]), (vec![], 7));
        let hu = Apportionment::round_half_up();
        assert_eq!(hu.split(3, &[0.5, 0.5]), (vec![2, 1], 0));
        assert_eq!(hu.split(70, &[0.3]), (vec![21], 49));
    }

    #[test]
    fn round_half_up_may_overshoot() {
        let counts = Apportionment::round_half_up().apportion(3, &[0.5, 0.5]);
        assert_eq!(counts, vec![2, 2]);
    }
}
