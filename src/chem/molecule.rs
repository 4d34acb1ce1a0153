/// Tetrahedral tag as written in SMILES, relative to the atom's stereo-neighbour order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chirality {
    None,
    /// `@`
    CounterClockwise,
    /// `@@`
    Clockwise,
}

impl Chirality {
    pub fn inverted(self) -> Self {
        match self {
            Chirality::None => Chirality::None,
            Chirality::CounterClockwise => Chirality::Clockwise,
            Chirality::Clockwise => Chirality::CounterClockwise,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Neighbor {
    Atom(usize),
    ImplicitH,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Element symbol in standard case ("C", "Cl", "Se") or "*" for a dummy.
    pub symbol: String,
    pub aromatic: bool,
    pub isotope: Option<u16>,
    pub charge: i8,
    /// Hydrogen count of a bracket atom; `None` leaves it to the valence model.
    pub hydrogens: Option<u8>,
    pub chirality: Chirality,
    pub map_number: u32,
    pub bracket: bool,
    pub stereo_neighbors: Vec<Neighbor>,
}

impl Atom {
    pub fn new(symbol: &str) -> Self {
        Atom {
            symbol: symbol.to_string(),
            aromatic: false,
            isotope: None,
            charge: 0,
            hydrogens: None,
            chirality: Chirality::None,
            map_number: 0,
            bracket: false,
            stereo_neighbors: Vec::new(),
        }
    }

    pub fn is_dummy(&self) -> bool {
        self.symbol == "*"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BondOrder {
    Single,
    Aromatic,
    Double,
    Triple,
    Quadruple,
}

/// `/` is `Up`, `\` is `Down`, read from `Bond::begin` towards `Bond::end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondDirection {
    Up,
    Down,
}

impl BondDirection {
    pub fn flipped(self) -> Self {
        match self {
            BondDirection::Up => BondDirection::Down,
            BondDirection::Down => BondDirection::Up,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bond {
    pub begin: usize,
    pub end: usize,
    pub order: BondOrder,
    pub direction: Option<BondDirection>,
}

impl Bond {
    pub fn other(&self, atom: usize) -> Option<usize> {
        if self.begin == atom {
            Some(self.end)
        } else if self.end == atom {
            Some(self.begin)
        } else {
            None
        }
    }

    /// Direction mark as seen when walking the bond away from `from`.
    pub fn direction_from(&self, from: usize) -> Option<BondDirection> {
        self.direction.map(|d| if from == self.begin { d } else { d.flipped() })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentPoint {
    pub atom: usize,
    pub map_number: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Molecule {
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
}

impl Molecule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn atom(&self, idx: usize) -> Option<&Atom> {
        self.atoms.get(idx)
    }

    pub fn atom_mut(&mut self, idx: usize) -> Option<&mut Atom> {
        self.atoms.get_mut(idx)
    }

    pub fn bond_mut(&mut self, idx: usize) -> Option<&mut Bond> {
        self.bonds.get_mut(idx)
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    pub fn add_atom(&mut self, atom: Atom) -> usize {
        self.atoms.push(atom);
        self.atoms.len() - 1
    }

    pub fn add_bond(&mut self, bond: Bond) -> usize {
        self.bonds.push(bond);
        self.bonds.len() - 1
    }

    /// `(bond index, neighbour atom)` pairs in bond insertion order.
    pub fn neighbors(&self, atom: usize) -> Vec<(usize, usize)> {
        self.bonds
            .iter()
            .enumerate()
            .filter_map(|(idx, bond)| bond.other(atom).map(|other| (idx, other)))
            .collect()
    }

    /// Appends `other` as new disconnected atoms and bonds; returns the index of its first atom.
    pub fn insert(&mut self, other: &Molecule) -> usize {
        let offset = self.atoms.len();

        self.atoms.extend(other.atoms.iter().map(|atom| {
            let mut atom = atom.clone();
            for neighbor in atom.stereo_neighbors.iter_mut() {
                if let Neighbor::Atom(idx) = neighbor {
                    *idx += offset;
                }
            }
            atom
        }));

        self.bonds.extend(other.bonds.iter().map(|bond| Bond {
            begin: bond.begin + offset,
            end: bond.end + offset,
            ..bond.clone()
        }));

        offset
    }

    /// Copy without the flagged atoms and bonds, plus the old index of every kept atom.
    ///
    /// Stereo neighbours that were removed drop out of the neighbour lists.
    pub fn compact(
        &self,
        removed_atoms: &[bool],
        removed_bonds: &[bool],
    ) -> eyre::Result<(Molecule, Vec<usize>)> {
        let mut new_index = vec![None; self.atoms.len()];
        let mut kept = Vec::new();
        for idx in 0..self.atoms.len() {
            if !removed_atoms.get(idx).copied().unwrap_or(false) {
                new_index[idx] = Some(kept.len());
                kept.push(idx);
            }
        }

        let mut compacted = Molecule::new();
        for &idx in &kept {
            let mut atom = self.atoms[idx].clone();
            atom.stereo_neighbors = atom
                .stereo_neighbors
                .iter()
                .filter_map(|neighbor| match neighbor {
                    Neighbor::Atom(other) => new_index[*other].map(Neighbor::Atom),
                    Neighbor::ImplicitH => Some(Neighbor::ImplicitH),
                })
                .collect();
            compacted.add_atom(atom);
        }

        for (idx, bond) in self.bonds.iter().enumerate() {
            if removed_bonds.get(idx).copied().unwrap_or(false) {
                continue;
            }
            let (Some(begin), Some(end)) = (new_index[bond.begin], new_index[bond.end]) else {
                return Err(eyre::eyre!("bond {} still points at a removed atom", idx));
            };
            compacted.add_bond(Bond {
                begin,
                end,
                ..bond.clone()
            });
        }

        Ok((compacted, kept))
    }

    /// Turns plain explicit hydrogens (`[H]` on one heavy atom by a single bond) into
    /// hydrogen counts, the way the toolkit does when it reads SMILES.
    ///
    /// Hydrogens on dummies, charged or isotopic hydrogens and hydrogens on a
    /// directional bond stay explicit. Returns the old index of every kept atom.
    pub fn fold_hydrogens(&self) -> eyre::Result<(Molecule, Vec<usize>)> {
        let mut work = self.clone();
        let mut removed_atoms = vec![false; self.atoms.len()];
        let mut removed_bonds = vec![false; self.bonds.len()];

        for (h, atom) in self.atoms.iter().enumerate() {
            if !is_plain_hydrogen(atom) {
                continue;
            }
            let (bond, heavy) = match self.neighbors(h).as_slice() {
                [(bond, heavy)] => (*bond, *heavy),
                _ => continue,
            };
            let link = &self.bonds[bond];
            if link.order != BondOrder::Single || link.direction.is_some() {
                continue;
            }
            let heavy_atom = &self.atoms[heavy];
            if heavy_atom.symbol == "H" || heavy_atom.is_dummy() {
                continue;
            }

            removed_atoms[h] = true;
            removed_bonds[bond] = true;

            let Some(heavy_atom) = work.atom_mut(heavy) else {
                continue;
            };
            if !heavy_atom.bracket {
                // organic-subset atoms get their hydrogens from valence
                continue;
            }
            heavy_atom.hydrogens = Some(heavy_atom.hydrogens.unwrap_or(0) + 1);
            if heavy_atom.stereo_neighbors.contains(&Neighbor::ImplicitH) {
                // two hydrogens on one centre leave nothing to keep
                heavy_atom.chirality = Chirality::None;
            } else {
                for neighbor in heavy_atom.stereo_neighbors.iter_mut() {
                    if *neighbor == Neighbor::Atom(h) {
                        *neighbor = Neighbor::ImplicitH;
                    }
                }
            }
        }

        work.compact(&removed_atoms, &removed_bonds)
    }

    pub fn attachment_points(&self) -> Vec<AttachmentPoint> {
        self.atoms
            .iter()
            .enumerate()
            .filter(|(_, atom)| atom.is_dummy())
            .map(|(idx, atom)| AttachmentPoint {
                atom: idx,
                map_number: atom.map_number,
            })
            .collect()
    }
}

fn is_plain_hydrogen(atom: &Atom) -> bool {
    atom.symbol == "H"
        && !atom.aromatic
        && atom.isotope.is_none()
        && atom.charge == 0
        && atom.map_number == 0
        && atom.hydrogens.unwrap_or(0) == 0
        && atom.chirality == Chirality::None
}
