use std::fs::File;
use std::io::{BufWriter, Write};

use crate::chem::depict::{align_to_core, Point2};
use crate::chem::toolkit;
use crate::config::{EnumerationConfig, OutputFormat};
use crate::enumeration::Product;
use crate::inputs::Core;

pub trait ProductWriter {
    fn write_product(&mut self, product: &Product) -> eyre::Result<()>;

    fn finish(&mut self) -> eyre::Result<()>;
}

/// One canonical SMILES per line, optionally followed by a tab and the product name.
pub struct SmiWriter<W: Write> {
    out: W,
    name_column: bool,
}

impl<W: Write> SmiWriter<W> {
    pub fn new(out: W, name_column: bool) -> Self {
        SmiWriter { out, name_column }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ProductWriter for SmiWriter<W> {
    fn write_product(&mut self, product: &Product) -> eyre::Result<()> {
        if self.name_column {
            writeln!(self.out, "{}\t{}", product.canonical_smiles, product.name)?;
        } else {
            writeln!(self.out, "{}", product.canonical_smiles)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> eyre::Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// SD records with 2D coordinates turned to match the core's own layout.
pub struct SdfWriter<'a, W: Write> {
    out: W,
    core: &'a Core,
}

impl<'a, W: Write> SdfWriter<'a, W> {
    pub fn new(out: W, core: &'a Core) -> Self {
        SdfWriter { out, core }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn core_pairs(&self, product: &Product, atom_count: usize) -> Vec<(usize, Point2)> {
        let Some(layout) = &self.core.layout else {
            return Vec::new();
        };
        if product.core_atoms.len() != atom_count {
            log::debug!(
                "{}: depiction has {} atoms, expected {}; leaving it unaligned",
                product.name,
                atom_count,
                product.core_atoms.len()
            );
            return Vec::new();
        }

        product
            .core_atoms
            .iter()
            .enumerate()
            .filter_map(|(idx, core_atom)| {
                core_atom
                    .and_then(|core_atom| layout.get(core_atom))
                    .map(|point| (idx, *point))
            })
            .collect()
    }
}

impl<'a, W: Write> ProductWriter for SdfWriter<'a, W> {
    fn write_product(&mut self, product: &Product) -> eyre::Result<()> {
        let mut block = toolkit::depiction(&product.molecule)?;
        let pairs = self.core_pairs(product, block.atom_count());
        align_to_core(&mut block, &pairs)?;
        block.set_title(&product.name);

        write!(self.out, "{}", block)?;
        writeln!(self.out, "> <SMILES>\n{}\n", product.canonical_smiles)?;
        for (group, fragment) in &product.fragments {
            writeln!(self.out, "> <{}>\n{}\n", group.label, fragment.smiles)?;
        }
        writeln!(self.out, "$$$$")?;

        Ok(())
    }

    fn finish(&mut self) -> eyre::Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Creates missing parent directories and opens the writer for `config.output_format`.
pub fn open_writer<'a>(
    config: &EnumerationConfig,
    core: &'a Core,
) -> eyre::Result<Box<dyn ProductWriter + 'a>> {
    if let Some(parent) = config.output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(&config.output)
        .map_err(|e| eyre::eyre!("could not create {:?}: {}", config.output, e))?;
    let out = BufWriter::new(file);

    Ok(match config.output_format {
        OutputFormat::Smi => Box::new(SmiWriter::new(out, config.name_column)),
        OutputFormat::Sdf => Box::new(SdfWriter::new(out, core)),
    })
}
