use std::collections::BTreeMap;

use super::molecule::{Bond, BondDirection, BondOrder, Molecule, Neighbor};

/// Product of a zip join. `source_atoms[i]` is the index in the zip input of product atom `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct Zipped {
    pub molecule: Molecule,
    pub source_atoms: Vec<usize>,
}

struct Attachment {
    dummy: usize,
    bond: usize,
    atom: usize,
}

fn attachment(mol: &Molecule, dummy: usize) -> eyre::Result<Attachment> {
    let neighbors = mol.neighbors(dummy);
    match neighbors.as_slice() {
        [(bond, atom)] => Ok(Attachment {
            dummy,
            bond: *bond,
            atom: *atom,
        }),
        _ => Err(eyre::eyre!(
            "attachment point {} has {} neighbours, expected exactly one",
            dummy,
            neighbors.len()
        )),
    }
}

fn joined_order(first: BondOrder, second: BondOrder) -> eyre::Result<BondOrder> {
    match (first, second) {
        (a, b) if a == b => Ok(a),
        (BondOrder::Single, other) | (other, BondOrder::Single) => Ok(other),
        (a, b) => Err(eyre::eyre!("cannot join a {:?} bond with a {:?} bond", a, b)),
    }
}

/// Joins every pair of dummy atoms that share an atom-map number.
///
/// Both dummies are removed and their neighbours bonded directly. A map number
/// carried by a single dummy is left alone, as are unmapped dummies. A map number
/// carried by three or more dummies is an error.
pub fn molzip(mol: &Molecule) -> eyre::Result<Zipped> {
    let mut groups: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for point in mol.attachment_points() {
        if point.map_number > 0 {
            groups.entry(point.map_number).or_default().push(point.atom);
        }
    }

    let mut work = mol.clone();
    let mut removed_atoms = vec![false; mol.atom_count()];
    let mut removed_bonds = vec![false; mol.bond_count()];

    for (map_number, dummies) in groups {
        let (first, second) = match dummies.as_slice() {
            [first, second] => (*first, *second),
            [_] => continue,
            _ => {
                return Err(eyre::eyre!(
                    "atom-map number {} appears on {} attachment points",
                    map_number,
                    dummies.len()
                ))
            }
        };

        let left = attachment(mol, first)?;
        let right = attachment(mol, second)?;
        if left.atom == right.dummy || right.atom == left.dummy {
            return Err(eyre::eyre!(
                "attachment points for map number {} are bonded to each other",
                map_number
            ));
        }
        if left.atom == right.atom {
            return Err(eyre::eyre!(
                "attachment points for map number {} share a neighbour",
                map_number
            ));
        }

        let left_bond = &mol.bonds()[left.bond];
        let right_bond = &mol.bonds()[right.bond];
        let order = joined_order(left_bond.order, right_bond.order)?;

        // `left.atom -> dummy` reads the same as `left.atom -> right.atom`,
        // and `dummy -> right.atom` likewise once the dummy is replaced
        let direction: Option<BondDirection> = left_bond
            .direction_from(left.atom)
            .or_else(|| right_bond.direction_from(right.dummy));

        if let Some(bond) = work.bond_mut(left.bond) {
            *bond = Bond {
                begin: left.atom,
                end: right.atom,
                order,
                direction,
            };
        }
        removed_bonds[right.bond] = true;
        removed_atoms[left.dummy] = true;
        removed_atoms[right.dummy] = true;

        replace_neighbor(&mut work, left.atom, left.dummy, right.atom);
        replace_neighbor(&mut work, right.atom, right.dummy, left.atom);
    }

    let (product, source_atoms) = work.compact(&removed_atoms, &removed_bonds)?;

    Ok(Zipped {
        molecule: product,
        source_atoms,
    })
}

fn replace_neighbor(mol: &mut Molecule, atom: usize, old: usize, new: usize) {
    if let Some(atom) = mol.atom_mut(atom) {
        for neighbor in atom.stereo_neighbors.iter_mut() {
            if *neighbor == Neighbor::Atom(old) {
                *neighbor = Neighbor::Atom(new);
            }
        }
    }
}
