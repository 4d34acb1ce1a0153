//! The chemistry the enumerator delegates to RDKit: sanitization, canonical
//! SMILES and 2D depiction.

use rdkit::ROMol;

use super::depict::MolBlock;

/// Parses and sanitizes a SMILES string (valence, aromaticity, kekulization).
pub fn sanitize(smiles: &str) -> eyre::Result<ROMol> {
    let romol = ROMol::from_smiles(smiles)
        .map_err(|e| eyre::eyre!("could not sanitize '{}': {}", smiles, e))?;
    Ok(romol)
}

pub fn canonical_smiles(romol: &ROMol) -> String {
    romol.as_smiles()
}

/// V2000 molblock of `romol`. RDKit lays out 2D coordinates when the molecule has no conformer,
/// which holds for anything built by `sanitize`.
pub fn depiction(romol: &ROMol) -> eyre::Result<MolBlock> {
    MolBlock::parse(&romol.to_molblock())
}
