use std::collections::{BTreeSet, HashMap, HashSet};

use super::molecule::{Atom, Bond, BondDirection, BondOrder, Chirality, Molecule, Neighbor};

lazy_static::lazy_static! {
    static ref ELEMENTS: HashSet<&'static str> = [
        "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S",
        "Cl", "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga",
        "Ge", "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd",
        "Ag", "Cd", "In", "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm",
        "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os",
        "Ir", "Pt", "Au", "Hg", "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa",
        "U", "Np", "Pu", "Am", "Cm", "Bk", "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg",
        "Bh", "Hs", "Mt", "Ds", "Rg", "Cn", "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
    ]
    .into_iter()
    .collect();
}

const ORGANIC_SUBSET: [&str; 11] = ["B", "C", "N", "O", "P", "S", "F", "Cl", "Br", "I", "*"];
const AROMATIC_ORGANIC_SUBSET: [&str; 6] = ["B", "C", "N", "O", "P", "S"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BondSymbol {
    Single,
    Double,
    Triple,
    Quadruple,
    Aromatic,
    Up,
    Down,
}

impl BondSymbol {
    fn from_byte(c: u8) -> Option<Self> {
        match c {
            b'-' => Some(BondSymbol::Single),
            b'=' => Some(BondSymbol::Double),
            b'#' => Some(BondSymbol::Triple),
            b'$' => Some(BondSymbol::Quadruple),
            b':' => Some(BondSymbol::Aromatic),
            b'/' => Some(BondSymbol::Up),
            b'\\' => Some(BondSymbol::Down),
            _ => None,
        }
    }

    fn order(self) -> BondOrder {
        match self {
            BondSymbol::Single | BondSymbol::Up | BondSymbol::Down => BondOrder::Single,
            BondSymbol::Double => BondOrder::Double,
            BondSymbol::Triple => BondOrder::Triple,
            BondSymbol::Quadruple => BondOrder::Quadruple,
            BondSymbol::Aromatic => BondOrder::Aromatic,
        }
    }

    fn direction(self) -> Option<BondDirection> {
        match self {
            BondSymbol::Up => Some(BondDirection::Up),
            BondSymbol::Down => Some(BondDirection::Down),
            _ => None,
        }
    }
}

struct RingOpening {
    atom: usize,
    symbol: Option<BondSymbol>,
    slot: usize,
}

struct Parser<'a> {
    text: &'a [u8],
    pos: usize,
    mol: Molecule,
    prev: Option<usize>,
    branches: Vec<usize>,
    bond: Option<BondSymbol>,
    rings: HashMap<u16, RingOpening>,
}

/// Reads a SMILES string into a `Molecule`, keeping atoms in text order.
pub fn parse(smiles: &str) -> eyre::Result<Molecule> {
    if smiles.is_empty() {
        return Err(eyre::eyre!("empty SMILES"));
    }
    if !smiles.is_ascii() {
        return Err(eyre::eyre!("SMILES '{}' contains non-ASCII characters", smiles));
    }

    let mut parser = Parser {
        text: smiles.as_bytes(),
        pos: 0,
        mol: Molecule::new(),
        prev: None,
        branches: Vec::new(),
        bond: None,
        rings: HashMap::new(),
    };
    parser.run()?;

    Ok(parser.mol)
}

impl<'a> Parser<'a> {
    fn error(&self, msg: &str) -> eyre::Report {
        eyre::eyre!(
            "{} at position {} in SMILES '{}'",
            msg,
            self.pos,
            String::from_utf8_lossy(self.text)
        )
    }

    fn peek(&self) -> Option<u8> {
        self.text.get(self.pos).copied()
    }

    fn run(&mut self) -> eyre::Result<()> {
        while let Some(c) = self.peek() {
            match c {
                b'(' => {
                    let prev = self.prev.ok_or_else(|| self.error("branch before any atom"))?;
                    if self.bond.is_some() {
                        return Err(self.error("bond symbol before branch"));
                    }
                    self.branches.push(prev);
                    self.pos += 1;
                }
                b')' => {
                    let open = self
                        .branches
                        .pop()
                        .ok_or_else(|| self.error("unmatched ')'"))?;
                    if self.bond.is_some() {
                        return Err(self.error("dangling bond symbol"));
                    }
                    self.prev = Some(open);
                    self.pos += 1;
                }
                b'.' => {
                    if self.bond.is_some() {
                        return Err(self.error("bond symbol before '.'"));
                    }
                    if !self.branches.is_empty() {
                        return Err(self.error("'.' inside a branch"));
                    }
                    self.prev = None;
                    self.pos += 1;
                }
                b'0'..=b'9' => {
                    self.pos += 1;
                    self.ring((c - b'0') as u16)?;
                }
                b'%' => {
                    let digits = self
                        .text
                        .get(self.pos + 1..self.pos + 3)
                        .filter(|d| d.iter().all(u8::is_ascii_digit))
                        .ok_or_else(|| self.error("'%' must be followed by two digits"))?;
                    let number = ((digits[0] - b'0') * 10 + (digits[1] - b'0')) as u16;
                    self.pos += 3;
                    self.ring(number)?;
                }
                b'[' => {
                    let atom = self.bracket_atom()?;
                    self.attach(atom)?;
                }
                _ => {
                    if let Some(symbol) = BondSymbol::from_byte(c) {
                        if self.prev.is_none() {
                            return Err(self.error("bond symbol before any atom"));
                        }
                        if self.bond.is_some() {
                            return Err(self.error("two consecutive bond symbols"));
                        }
                        self.bond = Some(symbol);
                        self.pos += 1;
                    } else {
                        let atom = self.organic_atom()?;
                        self.attach(atom)?;
                    }
                }
            }
        }

        if self.bond.is_some() {
            return Err(self.error("dangling bond symbol"));
        }
        if !self.branches.is_empty() {
            return Err(self.error("unclosed branch"));
        }
        if let Some(number) = self.rings.keys().min() {
            return Err(self.error(&format!("unclosed ring {}", number)));
        }

        Ok(())
    }

    fn attach(&mut self, atom: Atom) -> eyre::Result<()> {
        let has_hydrogen = atom.bracket && atom.hydrogens.unwrap_or(0) > 0;
        let idx = self.mol.add_atom(atom);

        if let Some(prev) = self.prev {
            let symbol = self.bond.take();
            self.connect(prev, idx, symbol)?;
            self.push_neighbor(prev, Neighbor::Atom(idx));
            self.push_neighbor(idx, Neighbor::Atom(prev));
        }
        if has_hydrogen {
            self.push_neighbor(idx, Neighbor::ImplicitH);
        }
        self.prev = Some(idx);

        Ok(())
    }

    fn push_neighbor(&mut self, atom: usize, neighbor: Neighbor) {
        if let Some(atom) = self.mol.atom_mut(atom) {
            atom.stereo_neighbors.push(neighbor);
        }
    }

    fn connect(&mut self, begin: usize, end: usize, symbol: Option<BondSymbol>) -> eyre::Result<()> {
        if begin == end {
            return Err(self.error("atom bonded to itself"));
        }
        if self.mol.neighbors(begin).iter().any(|(_, other)| *other == end) {
            return Err(self.error("duplicate bond"));
        }

        let both_aromatic = [begin, end]
            .iter()
            .all(|idx| self.mol.atom(*idx).map(|a| a.aromatic).unwrap_or(false));
        let order = match symbol {
            Some(symbol) => symbol.order(),
            None if both_aromatic => BondOrder::Aromatic,
            None => BondOrder::Single,
        };

        self.mol.add_bond(Bond {
            begin,
            end,
            order,
            direction: symbol.and_then(BondSymbol::direction),
        });

        Ok(())
    }

    fn ring(&mut self, number: u16) -> eyre::Result<()> {
        let current = self
            .prev
            .ok_or_else(|| self.error("ring closure before any atom"))?;
        let symbol = self.bond.take();

        match self.rings.remove(&number) {
            Some(opening) => {
                if opening.atom == current {
                    return Err(self.error("ring closure on the same atom"));
                }
                match (opening.symbol, symbol) {
                    (Some(open), Some(close)) if open.order() != close.order() => {
                        return Err(self.error(&format!("conflicting bonds for ring {}", number)));
                    }
                    (Some(open), _) => self.connect(opening.atom, current, Some(open))?,
                    (None, Some(close)) => self.connect(current, opening.atom, Some(close))?,
                    (None, None) => self.connect(opening.atom, current, None)?,
                }
                if let Some(atom) = self.mol.atom_mut(opening.atom) {
                    atom.stereo_neighbors[opening.slot] = Neighbor::Atom(current);
                }
                self.push_neighbor(current, Neighbor::Atom(opening.atom));
            }
            None => {
                // the slot is filled in once the ring closes
                let slot = self
                    .mol
                    .atom(current)
                    .map(|a| a.stereo_neighbors.len())
                    .unwrap_or(0);
                self.push_neighbor(current, Neighbor::Atom(current));
                self.rings.insert(
                    number,
                    RingOpening {
                        atom: current,
                        symbol,
                        slot,
                    },
                );
            }
        }

        Ok(())
    }

    fn organic_atom(&mut self) -> eyre::Result<Atom> {
        let rest = &self.text[self.pos..];
        let (symbol, aromatic, len) = if rest.starts_with(b"Cl") {
            ("Cl".to_string(), false, 2)
        } else if rest.starts_with(b"Br") {
            ("Br".to_string(), false, 2)
        } else {
            match rest[0] {
                c @ (b'B' | b'C' | b'N' | b'O' | b'P' | b'S' | b'F' | b'I') => {
                    ((c as char).to_string(), false, 1)
                }
                c @ (b'b' | b'c' | b'n' | b'o' | b'p' | b's') => {
                    ((c.to_ascii_uppercase() as char).to_string(), true, 1)
                }
                b'*' => ("*".to_string(), false, 1),
                c => {
                    return Err(self.error(&format!("unexpected character '{}'", c as char)));
                }
            }
        };
        self.pos += len;

        let mut atom = Atom::new(&symbol);
        atom.aromatic = aromatic;
        Ok(atom)
    }

    /// Digits at the cursor; `None` when there are none, an error when they overflow.
    fn number(&mut self) -> eyre::Result<Option<u32>> {
        let start = self.pos;
        while self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
            self.pos += 1;
        }
        if start == self.pos {
            return Ok(None);
        }
        std::str::from_utf8(&self.text[start..self.pos])
            .ok()
            .and_then(|digits| digits.parse::<u32>().ok())
            .map(Some)
            .ok_or_else(|| self.error("number out of range"))
    }

    fn bracket_atom(&mut self) -> eyre::Result<Atom> {
        self.pos += 1;

        let isotope = match self.number()? {
            Some(mass) => Some(
                u16::try_from(mass).map_err(|_| self.error("isotope out of range"))?,
            ),
            None => None,
        };

        let mut atom = self.bracket_symbol()?;
        atom.bracket = true;
        atom.isotope = isotope;

        if self.peek() == Some(b'@') {
            self.pos += 1;
            atom.chirality = if self.peek() == Some(b'@') {
                self.pos += 1;
                Chirality::Clockwise
            } else {
                Chirality::CounterClockwise
            };
            if matches!(self.peek(), Some(b'T' | b'A' | b'S' | b'O')) {
                return Err(self.error("only tetrahedral '@' and '@@' are supported"));
            }
        }

        atom.hydrogens = Some(0);
        if self.peek() == Some(b'H') {
            self.pos += 1;
            let count = self.number()?.unwrap_or(1);
            atom.hydrogens =
                Some(u8::try_from(count).map_err(|_| self.error("hydrogen count out of range"))?);
        }

        if let Some(sign @ (b'+' | b'-')) = self.peek() {
            self.pos += 1;
            let unit: i32 = if sign == b'+' { 1 } else { -1 };
            let magnitude = match self.number()? {
                Some(n) => i32::try_from(n).map_err(|_| self.error("charge out of range"))?,
                None => {
                    let mut n = 1;
                    while self.peek() == Some(sign) {
                        self.pos += 1;
                        n += 1;
                    }
                    n
                }
            };
            atom.charge =
                i8::try_from(unit * magnitude).map_err(|_| self.error("charge out of range"))?;
        }

        if self.peek() == Some(b':') {
            self.pos += 1;
            atom.map_number = self
                .number()?
                .ok_or_else(|| self.error("':' must be followed by an atom-map number"))?;
        }

        if self.peek() != Some(b']') {
            return Err(self.error("expected ']'"));
        }
        self.pos += 1;

        Ok(atom)
    }

    fn bracket_symbol(&mut self) -> eyre::Result<Atom> {
        let rest = &self.text[self.pos..];
        let first = *rest.first().ok_or_else(|| self.error("unterminated bracket atom"))?;

        let (symbol, aromatic, len) = match first {
            b'*' => ("*".to_string(), false, 1),
            c if c.is_ascii_lowercase() => {
                let two = rest
                    .get(..2)
                    .and_then(|s| std::str::from_utf8(s).ok())
                    .filter(|s| ["se", "as", "te"].contains(s));
                match two {
                    Some(s) => (capitalize(s), true, 2),
                    None if b"bcnops".contains(&c) => (capitalize(&(c as char).to_string()), true, 1),
                    None => {
                        return Err(self.error(&format!("unknown aromatic symbol '{}'", c as char)))
                    }
                }
            }
            c if c.is_ascii_uppercase() => {
                let two = rest
                    .get(..2)
                    .and_then(|s| std::str::from_utf8(s).ok())
                    .filter(|s| ELEMENTS.contains(s));
                match two {
                    Some(s) => (s.to_string(), false, 2),
                    None => {
                        let one = (c as char).to_string();
                        if !ELEMENTS.contains(one.as_str()) {
                            return Err(self.error(&format!("unknown element '{}'", one)));
                        }
                        (one, false, 1)
                    }
                }
            }
            c => return Err(self.error(&format!("unexpected character '{}'", c as char))),
        };
        self.pos += len;

        let mut atom = Atom::new(&symbol);
        atom.aromatic = aromatic;
        Ok(atom)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// A SMILES string plus the molecule atom index behind each atom of the string, in text order.
#[derive(Debug, Clone, PartialEq)]
pub struct Written {
    pub smiles: String,
    pub atom_order: Vec<usize>,
}

enum Step {
    Atom {
        atom: usize,
        from: Option<(usize, usize)>,
    },
    Text(&'static str),
}

struct Writer<'a> {
    mol: &'a Molecule,
    adjacency: Vec<Vec<(usize, usize)>>,
    visited: Vec<bool>,
    closed: Vec<bool>,
    order: Vec<usize>,
    children: Vec<Vec<(usize, usize)>>,
    ring_closes: Vec<Vec<usize>>,
    ring_opens: Vec<Vec<usize>>,
    ring_digits: HashMap<usize, u8>,
    used_digits: BTreeSet<u8>,
}

/// Writes a valid, non-canonical SMILES for `mol`.
///
/// Atoms are visited depth first from the lowest unvisited index, so a molecule
/// built by `insert` starts with its first component. Tetrahedral tags are
/// re-derived from each atom's stored stereo-neighbour order.
pub fn write(mol: &Molecule) -> eyre::Result<Written> {
    let n = mol.atom_count();
    let mut adjacency = vec![Vec::new(); n];
    for (idx, bond) in mol.bonds().iter().enumerate() {
        adjacency[bond.begin].push((idx, bond.end));
        adjacency[bond.end].push((idx, bond.begin));
    }

    let mut writer = Writer {
        mol,
        adjacency,
        visited: vec![false; n],
        closed: vec![false; mol.bond_count()],
        order: Vec::with_capacity(n),
        children: vec![Vec::new(); n],
        ring_closes: vec![Vec::new(); n],
        ring_opens: vec![Vec::new(); n],
        ring_digits: HashMap::new(),
        used_digits: BTreeSet::new(),
    };

    let mut roots = Vec::new();
    for start in 0..n {
        if !writer.visited[start] {
            roots.push(start);
            writer.explore(start);
        }
    }

    let mut smiles = String::new();
    for (i, root) in roots.into_iter().enumerate() {
        if i > 0 {
            smiles.push('.');
        }
        writer.emit(root, &mut smiles)?;
    }

    Ok(Written {
        smiles,
        atom_order: writer.order,
    })
}

impl<'a> Writer<'a> {
    /// Depth-first walk from `root` in adjacency order, recording tree children and ring bonds.
    fn explore(&mut self, root: usize) {
        self.visited[root] = true;
        self.order.push(root);

        // (atom, bond to its parent, next adjacency entry to look at)
        let mut stack: Vec<(usize, Option<usize>, usize)> = vec![(root, None, 0)];
        while let Some(frame) = stack.last_mut() {
            let (atom, parent_bond, next) = *frame;
            let Some(&(bond, other)) = self.adjacency[atom].get(next) else {
                stack.pop();
                continue;
            };
            frame.2 += 1;

            if Some(bond) == parent_bond {
                continue;
            }
            if !self.visited[other] {
                self.visited[other] = true;
                self.order.push(other);
                self.children[atom].push((bond, other));
                stack.push((other, Some(bond), 0));
            } else if !self.closed[bond] {
                // first seen from the descendant, so `other` is written earlier
                self.closed[bond] = true;
                self.ring_closes[atom].push(bond);
                self.ring_opens[other].push(bond);
            }
        }
    }

    fn emit(&mut self, root: usize, out: &mut String) -> eyre::Result<()> {
        let mut stack = vec![Step::Atom {
            atom: root,
            from: None,
        }];

        while let Some(step) = stack.pop() {
            let (atom, from) = match step {
                Step::Text(text) => {
                    out.push_str(text);
                    continue;
                }
                Step::Atom { atom, from } => (atom, from),
            };

            if let Some((bond, prev)) = from {
                out.push_str(bond_text(self.mol, bond, prev));
            }

            let chirality = self.chirality(atom, from.map(|(_, prev)| prev));
            out.push_str(&atom_text(&self.mol.atoms()[atom], chirality));

            for bond in self.ring_closes[atom].clone() {
                let digit = self
                    .ring_digits
                    .remove(&bond)
                    .ok_or_else(|| eyre::eyre!("ring bond {} closed before it was opened", bond))?;
                self.used_digits.remove(&digit);
                out.push_str(&digit_text(digit));
            }
            for bond in self.ring_opens[atom].clone() {
                let digit = (1..=99u8)
                    .find(|d| !self.used_digits.contains(d))
                    .ok_or_else(|| eyre::eyre!("more than 99 open rings"))?;
                self.used_digits.insert(digit);
                self.ring_digits.insert(bond, digit);
                out.push_str(bond_text(self.mol, bond, atom));
                out.push_str(&digit_text(digit));
            }

            // every child but the last is a branch; pushed in reverse so the first pops first
            let children = &self.children[atom];
            let last = children.len().saturating_sub(1);
            for (i, &(bond, child)) in children.iter().enumerate().rev() {
                let next = Step::Atom {
                    atom: child,
                    from: Some((bond, atom)),
                };
                if i < last {
                    stack.push(Step::Text(")"));
                    stack.push(next);
                    stack.push(Step::Text("("));
                } else {
                    stack.push(next);
                }
            }
        }

        Ok(())
    }

    fn emitted_neighbors(&self, atom: usize, prev: Option<usize>) -> Vec<Neighbor> {
        let data = &self.mol.atoms()[atom];
        let mut neighbors = Vec::new();

        if let Some(prev) = prev {
            neighbors.push(Neighbor::Atom(prev));
        }
        if data.bracket && data.hydrogens.unwrap_or(0) > 0 {
            neighbors.push(Neighbor::ImplicitH);
        }
        for bond in self.ring_closes[atom].iter().chain(self.ring_opens[atom].iter()) {
            if let Some(other) = self.mol.bonds()[*bond].other(atom) {
                neighbors.push(Neighbor::Atom(other));
            }
        }
        neighbors.extend(self.children[atom].iter().map(|(_, child)| Neighbor::Atom(*child)));

        neighbors
    }

    fn chirality(&self, atom: usize, prev: Option<usize>) -> Chirality {
        let data = &self.mol.atoms()[atom];
        if data.chirality == Chirality::None {
            return Chirality::None;
        }

        let emitted = self.emitted_neighbors(atom, prev);
        match permutation_is_odd(&data.stereo_neighbors, &emitted) {
            Some(true) => data.chirality.inverted(),
            Some(false) => data.chirality,
            None => {
                log::debug!("dropping chirality on atom {}: neighbour lists disagree", atom);
                Chirality::None
            }
        }
    }
}

/// Parity of the permutation taking `reference` to `emitted`; `None` if they are not permutations.
fn permutation_is_odd(reference: &[Neighbor], emitted: &[Neighbor]) -> Option<bool> {
    if reference.len() != emitted.len() {
        return None;
    }

    let positions = emitted
        .iter()
        .map(|n| reference.iter().position(|r| r == n))
        .collect::<Option<Vec<_>>>()?;

    let mut inversions = 0;
    for i in 0..positions.len() {
        for j in i + 1..positions.len() {
            if positions[i] > positions[j] {
                inversions += 1;
            }
        }
    }

    Some(inversions % 2 == 1)
}

fn digit_text(digit: u8) -> String {
    if digit < 10 {
        digit.to_string()
    } else {
        format!("%{}", digit)
    }
}

fn bond_text(mol: &Molecule, bond: usize, from: usize) -> &'static str {
    let bond = &mol.bonds()[bond];
    if let Some(direction) = bond.direction_from(from) {
        return match direction {
            BondDirection::Up => "/",
            BondDirection::Down => "\\",
        };
    }

    let both_aromatic = mol.atoms()[bond.begin].aromatic && mol.atoms()[bond.end].aromatic;
    match bond.order {
        BondOrder::Single if both_aromatic => "-",
        BondOrder::Single => "",
        BondOrder::Aromatic if both_aromatic => "",
        BondOrder::Aromatic => ":",
        BondOrder::Double => "=",
        BondOrder::Triple => "#",
        BondOrder::Quadruple => "$",
    }
}

fn atom_text(atom: &Atom, chirality: Chirality) -> String {
    let symbol = if atom.aromatic {
        atom.symbol.to_lowercase()
    } else {
        atom.symbol.clone()
    };

    let organic = if atom.aromatic {
        AROMATIC_ORGANIC_SUBSET.contains(&atom.symbol.as_str())
    } else {
        ORGANIC_SUBSET.contains(&atom.symbol.as_str())
    };
    let bracket = atom.bracket
        || !organic
        || atom.isotope.is_some()
        || atom.charge != 0
        || atom.map_number > 0
        || chirality != Chirality::None;

    if !bracket {
        return symbol;
    }

    let mut text = String::from("[");
    if let Some(isotope) = atom.isotope {
        text.push_str(&isotope.to_string());
    }
    text.push_str(&symbol);
    match chirality {
        Chirality::None => {}
        Chirality::CounterClockwise => text.push('@'),
        Chirality::Clockwise => text.push_str("@@"),
    }
    match atom.hydrogens.unwrap_or(0) {
        0 => {}
        1 => text.push('H'),
        n => text.push_str(&format!("H{}", n)),
    }
    match atom.charge {
        0 => {}
        1 => text.push('+'),
        -1 => text.push('-'),
        c => text.push_str(&format!("{:+}", c)),
    }
    if atom.map_number > 0 {
        text.push_str(&format!(":{}", atom.map_number));
    }
    text.push(']');

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chain_with_branch() {
        let mol = parse("CC(=O)O").unwrap();
        assert_eq!(mol.atom_count(), 4);
        assert_eq!(mol.bond_count(), 3);
        assert_eq!(mol.bonds()[1].order, BondOrder::Double);
        assert_eq!(mol.bonds()[2].begin, 1);
        assert_eq!(mol.bonds()[2].end, 3);
    }

    #[test]
    fn test_parse_aromatic_ring() {
        let mol = parse("c1ccccc1Cl").unwrap();
        assert_eq!(mol.atom_count(), 7);
        assert_eq!(mol.bond_count(), 7);
        assert!(mol.atoms()[0].aromatic);
        assert_eq!(mol.atoms()[6].symbol, "Cl");
        let aromatic = mol
            .bonds()
            .iter()
            .filter(|b| b.order == BondOrder::Aromatic)
            .count();
        assert_eq!(aromatic, 6);
    }

    #[test]
    fn test_parse_bracket_atoms() {
        let mol = parse("[13CH3:4][NH3+].[O-2].[nH]1cccc1[*:2]").unwrap();
        let carbon = &mol.atoms()[0];
        assert_eq!(carbon.isotope, Some(13));
        assert_eq!(carbon.hydrogens, Some(3));
        assert_eq!(carbon.map_number, 4);
        assert_eq!(mol.atoms()[1].charge, 1);
        assert_eq!(mol.atoms()[2].charge, -2);
        assert!(mol.atoms()[3].aromatic);
        assert_eq!(mol.atoms()[3].symbol, "N");
        assert!(mol.atoms()[8].is_dummy());
        assert_eq!(mol.atoms()[8].map_number, 2);
    }

    #[test]
    fn test_parse_two_letter_bracket_elements() {
        let mol = parse("[Cl-].[Se].[se]1cccc1").unwrap();
        assert_eq!(mol.atoms()[0].symbol, "Cl");
        assert_eq!(mol.atoms()[1].symbol, "Se");
        assert!(mol.atoms()[2].aromatic);
        assert_eq!(mol.atoms()[2].symbol, "Se");
    }

    #[test]
    fn test_parse_stereo_neighbors() {
        let mol = parse("F[C@H](Cl)Br").unwrap();
        assert_eq!(mol.atoms()[1].chirality, Chirality::CounterClockwise);
        assert_eq!(
            mol.atoms()[1].stereo_neighbors,
            vec![
                Neighbor::Atom(0),
                Neighbor::ImplicitH,
                Neighbor::Atom(2),
                Neighbor::Atom(3)
            ]
        );

        let ring = parse("[C@@H]1(F)CC1").unwrap();
        assert_eq!(
            ring.atoms()[0].stereo_neighbors,
            vec![
                Neighbor::ImplicitH,
                Neighbor::Atom(3),
                Neighbor::Atom(1),
                Neighbor::Atom(2)
            ]
        );
    }

    #[test]
    fn test_parse_ring_percent_and_direction() {
        let mol = parse("C%12CC%12").unwrap();
        assert_eq!(mol.bond_count(), 3);

        let alkene = parse("F/C=C\\F").unwrap();
        assert_eq!(alkene.bonds()[0].direction, Some(BondDirection::Up));
        assert_eq!(alkene.bonds()[2].direction, Some(BondDirection::Down));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse("").is_err());
        assert!(parse("C1CC").is_err());
        assert!(parse("C(C").is_err());
        assert!(parse("CC)").is_err());
        assert!(parse("C=").is_err());
        assert!(parse("[C").is_err());
        assert!(parse("[Xx]").is_err());
        assert!(parse("Q").is_err());
        assert!(parse("[C@TH1](F)(Cl)(Br)I").is_err());
    }

    #[test]
    fn test_parse_rejects_out_of_range_numbers() {
        assert!(parse("[C+4294967295]").is_err());
        assert!(parse("[C+99999999999]").is_err());
        assert!(parse("[C+128]").is_err());
        assert!(parse("[*:99999999999]").is_err());
        assert!(parse("[99999C]").is_err());
        assert_eq!(parse("[C-127]").unwrap().atom(0).unwrap().charge, -127);
        assert_eq!(parse("[13CH4]").unwrap().atom(0).unwrap().isotope, Some(13));
    }

    #[test]
    fn test_write_long_chain() {
        let chain = "C".repeat(20_000);
        let written = write(&parse(&chain).unwrap()).unwrap();
        assert_eq!(written.smiles, chain);
        assert_eq!(written.atom_order.len(), 20_000);

        let branched = format!("C{}", "(C)C".repeat(10_000));
        let written = write(&parse(&branched).unwrap()).unwrap();
        assert_eq!(written.smiles, branched);
    }

    #[test]
    fn test_write_simple_molecules() {
        for smiles in ["CCO", "CC(=O)O", "c1ccccc1", "C#N", "[NH4+]", "CC.O", "[*:1]C"] {
            let written = write(&parse(smiles).unwrap()).unwrap();
            assert_eq!(written.smiles, smiles);
        }
    }

    #[test]
    fn test_write_atom_order_is_text_order() {
        let written = write(&parse("C(O)C").unwrap()).unwrap();
        assert_eq!(written.smiles, "C(O)C");
        assert_eq!(written.atom_order, vec![0, 1, 2]);
    }

    #[test]
    fn test_write_keeps_biphenyl_single_bond() {
        let written = write(&parse("c1ccccc1-c1ccccc1").unwrap()).unwrap();
        assert_eq!(written.smiles, "c1ccccc1-c1ccccc1");
    }

    #[test]
    fn test_write_keeps_chirality() {
        for smiles in ["F[C@H](Cl)Br", "F[C@@H](Cl)Br", "[C@@H]1(F)CC1", "N[C@@](C)(F)O"] {
            let written = write(&parse(smiles).unwrap()).unwrap();
            assert_eq!(written.smiles, smiles);
        }
    }

    #[test]
    fn test_permutation_parity() {
        let reference = [Neighbor::Atom(0), Neighbor::ImplicitH, Neighbor::Atom(2)];
        let swapped = [Neighbor::ImplicitH, Neighbor::Atom(0), Neighbor::Atom(2)];
        let rotated = [Neighbor::ImplicitH, Neighbor::Atom(2), Neighbor::Atom(0)];
        assert_eq!(permutation_is_odd(&reference, &reference), Some(false));
        assert_eq!(permutation_is_odd(&reference, &swapped), Some(true));
        assert_eq!(permutation_is_odd(&reference, &rotated), Some(false));
        assert_eq!(permutation_is_odd(&reference, &swapped[..2]), None);
    }
}
