use std::collections::HashSet;

use rdkit::ROMol;
use serde::Serialize;

use crate::chem::molzip::molzip;
use crate::chem::{smiles, toolkit};
use crate::config::EnumerationConfig;
use crate::inputs::{load_inputs, Core, Fragment, RGroup};
use crate::output::open_writer;

pub mod product;

pub use product::{product_order, total, ProductOrder};

/// A unique product, kept the first time its canonical SMILES is seen.
pub struct Product<'a> {
    pub canonical_smiles: String,
    pub name: String,
    /// One chosen fragment per R-group, in R-group order.
    pub fragments: Vec<(&'a RGroup, &'a Fragment)>,
    /// The SMILES handed to the toolkit; its atom order is the toolkit's atom order.
    pub smiles: String,
    /// For each atom of `smiles`, the core atom it came from, if any.
    pub core_atoms: Vec<Option<usize>>,
    pub molecule: ROMol,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnumerationStats {
    pub combinations: usize,
    pub visited: usize,
    pub unique: usize,
    pub duplicates: usize,
    pub failed: usize,
    pub limit_reached: bool,
}

pub struct Enumerator<'a> {
    core: &'a Core,
    rgroups: &'a [RGroup],
    order: Box<dyn Iterator<Item = Vec<usize>>>,
    seen: HashSet<String>,
    limit: Option<usize>,
    stats: EnumerationStats,
}

impl<'a> Enumerator<'a> {
    pub fn new(
        core: &'a Core,
        rgroups: &'a [RGroup],
        order: ProductOrder,
        limit: Option<usize>,
    ) -> eyre::Result<Self> {
        let radices = rgroups
            .iter()
            .map(|g| g.fragments.len())
            .collect::<Vec<_>>();
        let combinations = total(&radices)?;

        Ok(Enumerator {
            core,
            rgroups,
            order: product_order(radices, order)?,
            seen: HashSet::new(),
            limit,
            stats: EnumerationStats {
                combinations,
                ..Default::default()
            },
        })
    }

    pub fn stats(&self) -> &EnumerationStats {
        &self.stats
    }

    /// Builds the product for one choice of fragments, without deduplication.
    pub fn build(&self, choice: &[usize]) -> eyre::Result<Product<'a>> {
        let rgroups: &'a [RGroup] = self.rgroups;
        if choice.len() != rgroups.len() {
            return Err(eyre::eyre!(
                "got {} fragment choices for {} R-groups",
                choice.len(),
                rgroups.len()
            ));
        }
        let picks = rgroups
            .iter()
            .zip(choice.iter().copied())
            .collect::<Vec<_>>();
        let fragments = picks
            .iter()
            .map(|&(group, idx)| {
                group
                    .fragments
                    .get(idx)
                    .map(|fragment| (group, fragment))
                    .ok_or(eyre::eyre!("fragment {} out of range for {}", idx, group.label))
            })
            .collect::<eyre::Result<Vec<_>>>()?;

        let mut combined = self.core.molecule.clone();
        for (_, fragment) in &fragments {
            combined.insert(&fragment.molecule);
        }

        let zipped = molzip(&combined)?;
        let (folded, kept) = zipped.molecule.fold_hydrogens()?;
        let written = smiles::write(&folded)?;
        let molecule = toolkit::sanitize(&written.smiles)?;
        let canonical_smiles = toolkit::canonical_smiles(&molecule);

        let core_len = self.core.molecule.atom_count();
        let core_atoms = written
            .atom_order
            .iter()
            .map(|&atom| {
                let source = zipped.source_atoms[kept[atom]];
                (source < core_len).then_some(source)
            })
            .collect();

        Ok(Product {
            canonical_smiles,
            name: product_name(self.core, &picks),
            fragments,
            smiles: written.smiles,
            core_atoms,
            molecule,
        })
    }
}

impl<'a> Iterator for Enumerator<'a> {
    type Item = Product<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(limit) = self.limit {
                if self.stats.unique >= limit {
                    if !self.stats.limit_reached && self.order.next().is_some() {
                        log::info!("stopping after {} unique products", limit);
                        self.stats.limit_reached = true;
                    }
                    return None;
                }
            }

            let choice = self.order.next()?;
            self.stats.visited += 1;

            let product = match self.build(&choice) {
                Ok(product) => product,
                Err(e) => {
                    log::warn!("skipping combination {:?}: {}", choice, e);
                    self.stats.failed += 1;
                    continue;
                }
            };

            if self.seen.insert(product.canonical_smiles.clone()) {
                self.stats.unique += 1;
                return Some(product);
            }

            log::debug!(
                "{} repeats {}, skipping",
                product.name,
                product.canonical_smiles
            );
            self.stats.duplicates += 1;
        }
    }
}

/// `<core>_<label>-<fragment name or 1-based position>` for each R-group.
pub fn product_name(core: &Core, picks: &[(&RGroup, usize)]) -> String {
    let mut name = core.display_name().to_string();
    for (group, idx) in picks {
        let part = group
            .fragments
            .get(*idx)
            .and_then(|fragment| fragment.name.clone())
            .unwrap_or_else(|| (idx + 1).to_string());
        name.push_str(&format!("_{}-{}", group.label, part));
    }
    name
}

fn order_from_config(config: &EnumerationConfig) -> ProductOrder {
    if config.random_order {
        ProductOrder::Shuffled { seed: config.seed }
    } else {
        ProductOrder::Sequential
    }
}

/// Loads the inputs, enumerates, and writes unique products to `config.output`.
pub fn run(config: &EnumerationConfig) -> eyre::Result<EnumerationStats> {
    let (core, rgroups) = load_inputs(config)?;

    let mut enumerator = Enumerator::new(&core, &rgroups, order_from_config(config), config.limit)?;
    log::info!(
        "enumerating {} combinations into {:?} ({})",
        enumerator.stats().combinations,
        config.output,
        config.output_format
    );

    let mut writer = open_writer(config, &core)?;
    for product in enumerator.by_ref() {
        writer.write_product(&product)?;
    }
    writer.finish()?;

    let stats = enumerator.stats().clone();
    log::info!(
        "wrote {} unique products ({} duplicates, {} failed)",
        stats.unique,
        stats.duplicates,
        stats.failed
    );

    Ok(stats)
}
