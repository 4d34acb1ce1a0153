use std::collections::HashSet;
use std::path::Path;

use rayon::prelude::*;

use crate::chem::depict::Point2;
use crate::chem::molecule::Molecule;
use crate::chem::{smiles, toolkit};
use crate::config::{EnumerationConfig, RGroupLabel};

/// One non-blank line of a SMILES file: the structure and an optional name column.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub line: usize,
    pub smiles: String,
    pub name: Option<String>,
}

pub fn read_records(text: &str) -> Vec<Record> {
    text.lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let mut columns = line.split_whitespace();
            let smiles = columns.next()?;
            let name = columns.collect::<Vec<_>>().join(" ");
            Some(Record {
                line: idx + 1,
                smiles: smiles.to_string(),
                name: (!name.is_empty()).then_some(name),
            })
        })
        .collect()
}

fn read_file(path: &Path) -> eyre::Result<String> {
    std::fs::read_to_string(path).map_err(|e| eyre::eyre!("could not read {:?}: {}", path, e))
}

#[derive(Debug, Clone)]
pub struct Core {
    pub smiles: String,
    pub name: Option<String>,
    pub molecule: Molecule,
    /// 2D position of every core atom, indexed like `molecule`.
    pub layout: Option<Vec<Point2>>,
}

impl Core {
    /// Reads the first record of a SMILES file.
    pub fn from_path(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let path = path.as_ref();
        let record = read_records(&read_file(path)?)
            .into_iter()
            .next()
            .ok_or(eyre::eyre!("core file {:?} has no SMILES", path))?;

        Self::new(&record.smiles, record.name)
            .map_err(|e| eyre::eyre!("{}:{}: {}", path.display(), record.line, e))
    }

    pub fn new(smiles: &str, name: Option<String>) -> eyre::Result<Self> {
        let romol = toolkit::sanitize(smiles)?;
        // atom for atom with the toolkit's copy, so the layout lines up
        let (molecule, _) = smiles::parse(smiles)?.fold_hydrogens()?;

        let mut seen = HashSet::new();
        for point in molecule.attachment_points() {
            if point.map_number == 0 {
                log::warn!(
                    "core atom {} is an unmapped attachment point and will stay in every product",
                    point.atom
                );
            } else if !seen.insert(point.map_number) {
                return Err(eyre::eyre!(
                    "core uses attachment point [*:{}] more than once",
                    point.map_number
                ));
            }
        }
        if seen.is_empty() {
            return Err(eyre::eyre!(
                "core '{}' has no mapped attachment points such as [*:1]",
                smiles
            ));
        }

        let layout = match toolkit::depiction(&romol).and_then(|block| block.layout()) {
            Ok(layout) if layout.len() == molecule.atom_count() => Some(layout),
            Ok(layout) => {
                log::warn!(
                    "core depiction has {} atoms but the core has {}; products will not be oriented",
                    layout.len(),
                    molecule.atom_count()
                );
                None
            }
            Err(e) => {
                log::warn!("could not lay out core: {}", e);
                None
            }
        };

        Ok(Core {
            smiles: smiles.to_string(),
            name,
            molecule,
            layout,
        })
    }

    pub fn map_numbers(&self) -> Vec<u32> {
        let mut numbers = self
            .molecule
            .attachment_points()
            .into_iter()
            .map(|p| p.map_number)
            .filter(|n| *n > 0)
            .collect::<Vec<_>>();
        numbers.sort_unstable();
        numbers
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("core")
    }
}

#[derive(Debug, Clone)]
pub struct Fragment {
    pub line: usize,
    /// As written in the input file.
    pub smiles: String,
    pub name: Option<String>,
    /// Parsed graph with the attachment point mapped to its R-group number.
    pub molecule: Molecule,
}

impl Fragment {
    pub fn new(label: &RGroupLabel, record: Record) -> eyre::Result<Self> {
        let mut molecule = smiles::parse(&record.smiles)?;

        let points = molecule.attachment_points();
        let point = match points.as_slice() {
            [point] => *point,
            _ => {
                return Err(eyre::eyre!(
                    "fragment '{}' needs exactly one attachment point '*', found {}",
                    record.smiles,
                    points.len()
                ))
            }
        };

        match point.map_number {
            0 => {
                if let Some(atom) = molecule.atom_mut(point.atom) {
                    atom.map_number = label.map_number;
                    atom.bracket = true;
                }
            }
            n if n == label.map_number => {}
            n => {
                return Err(eyre::eyre!(
                    "fragment '{}' is mapped to {} but belongs to {}",
                    record.smiles,
                    n,
                    label
                ))
            }
        }

        let mapped = smiles::write(&molecule)?;
        toolkit::sanitize(&mapped.smiles)?;

        Ok(Fragment {
            line: record.line,
            smiles: record.smiles,
            name: record.name,
            molecule,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RGroup {
    pub label: RGroupLabel,
    pub fragments: Vec<Fragment>,
}

impl RGroup {
    pub fn from_path(label: RGroupLabel, path: impl AsRef<Path>) -> eyre::Result<Self> {
        let path = path.as_ref();
        let text = read_file(path)?;
        Self::from_text(label, &text, &path.display().to_string())
    }

    /// `source` names the input in error messages.
    pub fn from_text(label: RGroupLabel, text: &str, source: &str) -> eyre::Result<Self> {
        let fragments = read_records(text)
            .into_par_iter()
            .map(|record| {
                let line = record.line;
                Fragment::new(&label, record)
                    .map_err(|e| eyre::eyre!("{}:{}: {}", source, line, e))
            })
            .collect::<eyre::Result<Vec<_>>>()?;

        if fragments.is_empty() {
            log::warn!("R-group {} ({}) has no fragments, so no products will be made", label, source);
        }
        log::info!("loaded {} fragments for {}", fragments.len(), label);

        Ok(RGroup { label, fragments })
    }
}

/// Attachment points and R-groups that do not pair up with each other.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttachmentReport {
    pub unused_core_points: Vec<u32>,
    pub unmatched_rgroups: Vec<RGroupLabel>,
}

pub fn check_attachments(core: &Core, rgroups: &[RGroup]) -> AttachmentReport {
    let core_numbers = core.map_numbers();
    let group_numbers = rgroups
        .iter()
        .map(|g| g.label.map_number)
        .collect::<HashSet<_>>();

    AttachmentReport {
        unused_core_points: core_numbers
            .iter()
            .copied()
            .filter(|n| !group_numbers.contains(n))
            .collect(),
        unmatched_rgroups: rgroups
            .iter()
            .filter(|g| !core_numbers.contains(&g.label.map_number))
            .map(|g| g.label.clone())
            .collect(),
    }
}

pub fn load_inputs(config: &EnumerationConfig) -> eyre::Result<(Core, Vec<RGroup>)> {
    log::info!("loading core from {:?}", config.core);
    let core = Core::from_path(&config.core)?;

    let rgroups = config
        .rgroups
        .iter()
        .map(|(label, path)| RGroup::from_path(label.clone(), path))
        .collect::<eyre::Result<Vec<_>>>()?;

    let report = check_attachments(&core, &rgroups);
    for number in &report.unused_core_points {
        log::warn!(
            "core attachment point [*:{}] has no R-group and stays unpaired",
            number
        );
    }
    for label in &report.unmatched_rgroups {
        log::warn!(
            "R-group {} has no [*:{}] on the core; its fragments stay disconnected",
            label,
            label.map_number
        );
    }

    Ok((core, rgroups))
}
