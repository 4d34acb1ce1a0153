use itertools::Itertools;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Number of index tuples over `radices`, or an error if it does not fit in `usize`.
pub fn total(radices: &[usize]) -> eyre::Result<usize> {
    radices
        .iter()
        .try_fold(1usize, |acc, &r| acc.checked_mul(r))
        .ok_or(eyre::eyre!(
            "the product of {:?} overflows the number of combinations we can count",
            radices
        ))
}

/// Every index tuple over `radices`, last position fastest.
///
/// No radices yields a single empty tuple; any zero radix yields nothing.
pub fn sequential(radices: Vec<usize>) -> Box<dyn Iterator<Item = Vec<usize>>> {
    if radices.is_empty() {
        return Box::new(std::iter::once(Vec::new()));
    }
    Box::new(radices.into_iter().map(|r| 0..r).multi_cartesian_product())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductOrder {
    Sequential,
    /// Seeded runs repeat; unseeded runs draw from OS entropy.
    Shuffled { seed: Option<u64> },
}

pub fn product_order(
    radices: Vec<usize>,
    order: ProductOrder,
) -> eyre::Result<Box<dyn Iterator<Item = Vec<usize>>>> {
    let count = total(&radices)?;
    match order {
        ProductOrder::Sequential => Ok(sequential(radices)),
        ProductOrder::Shuffled { seed } => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };

            let mut tuples = Vec::with_capacity(count);
            tuples.extend(sequential(radices));
            tuples.shuffle(&mut rng);

            Ok(Box::new(tuples.into_iter()))
        }
    }
}
