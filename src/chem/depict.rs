use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Point2 { x, y }
    }
}

/// A V2000 molblock kept as text lines, so only the touched columns change on rewrite.
#[derive(Debug, Clone, PartialEq)]
pub struct MolBlock {
    lines: Vec<String>,
    atom_count: usize,
    bond_count: usize,
}

const HEADER_LINES: usize = 3;
const COORDINATE_WIDTH: usize = 10;
const BOND_STEREO_COLUMNS: std::ops::Range<usize> = 9..12;

impl MolBlock {
    pub fn parse(text: &str) -> eyre::Result<Self> {
        let lines = text.lines().map(str::to_string).collect::<Vec<_>>();

        let counts = lines
            .get(HEADER_LINES)
            .ok_or(eyre::eyre!("molblock has no counts line"))?;
        if !counts.contains("V2000") {
            return Err(eyre::eyre!("only V2000 molblocks are supported"));
        }
        let atom_count = counts
            .get(0..3)
            .ok_or(eyre::eyre!("counts line is too short"))?
            .trim()
            .parse::<usize>()?;
        let bond_count = counts
            .get(3..6)
            .ok_or(eyre::eyre!("counts line is too short"))?
            .trim()
            .parse::<usize>()?;

        if lines.len() < HEADER_LINES + 1 + atom_count + bond_count {
            return Err(eyre::eyre!(
                "molblock declares {} atoms and {} bonds but has {} lines",
                atom_count,
                bond_count,
                lines.len()
            ));
        }

        let block = MolBlock {
            lines,
            atom_count,
            bond_count,
        };
        for idx in 0..atom_count {
            block.coordinates(idx)?;
        }

        Ok(block)
    }

    pub fn atom_count(&self) -> usize {
        self.atom_count
    }

    pub fn bond_count(&self) -> usize {
        self.bond_count
    }

    pub fn title(&self) -> &str {
        &self.lines[0]
    }

    pub fn set_title(&mut self, title: &str) {
        self.lines[0] = title.lines().next().unwrap_or("").to_string();
    }

    fn atom_line(&self, idx: usize) -> eyre::Result<&String> {
        if idx >= self.atom_count {
            return Err(eyre::eyre!("atom {} out of range", idx));
        }
        Ok(&self.lines[HEADER_LINES + 1 + idx])
    }

    pub fn coordinates(&self, idx: usize) -> eyre::Result<Point2> {
        let line = self.atom_line(idx)?;
        let field = |n: usize| -> eyre::Result<f64> {
            let text = line
                .get(n * COORDINATE_WIDTH..(n + 1) * COORDINATE_WIDTH)
                .ok_or(eyre::eyre!("atom line {} is too short", idx))?;
            Ok(text.trim().parse::<f64>()?)
        };

        Ok(Point2::new(field(0)?, field(1)?))
    }

    pub fn layout(&self) -> eyre::Result<Vec<Point2>> {
        (0..self.atom_count).map(|idx| self.coordinates(idx)).collect()
    }

    pub fn set_coordinates(&mut self, idx: usize, point: Point2) -> eyre::Result<()> {
        let line = self.atom_line(idx)?;
        let rest = line
            .get(2 * COORDINATE_WIDTH..)
            .ok_or(eyre::eyre!("atom line {} is too short", idx))?;
        let updated = format!("{:>10.4}{:>10.4}{}", point.x, point.y, rest);
        self.lines[HEADER_LINES + 1 + idx] = updated;
        Ok(())
    }

    /// Bond stereo column of bond `idx`: 0 plain, 1 wedge, 4 either, 6 hash.
    pub fn bond_stereo(&self, idx: usize) -> eyre::Result<u8> {
        let line = self.bond_line(idx)?;
        let field = line
            .get(BOND_STEREO_COLUMNS)
            .ok_or(eyre::eyre!("bond line {} has no stereo column", idx))?;
        Ok(field.trim().parse::<u8>()?)
    }

    /// Swaps wedge and hash bonds, so a reflected drawing keeps its configuration.
    pub fn mirror_wedges(&mut self) -> eyre::Result<()> {
        for idx in 0..self.bond_count {
            let flipped = match self.bond_stereo(idx)? {
                1 => 6,
                6 => 1,
                _ => continue,
            };
            let line = &mut self.lines[HEADER_LINES + 1 + self.atom_count + idx];
            line.replace_range(BOND_STEREO_COLUMNS, &format!("{:>3}", flipped));
        }
        Ok(())
    }

    fn bond_line(&self, idx: usize) -> eyre::Result<&String> {
        if idx >= self.bond_count {
            return Err(eyre::eyre!("bond {} out of range", idx));
        }
        Ok(&self.lines[HEADER_LINES + 1 + self.atom_count + idx])
    }
}

impl fmt::Display for MolBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Rotation (with optional mirror) about a centroid followed by a translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidTransform {
    pub cos: f64,
    pub sin: f64,
    pub mirror: bool,
    pub from_centroid: Point2,
    pub to_centroid: Point2,
}

impl RigidTransform {
    pub fn apply(&self, point: Point2) -> Point2 {
        let x = point.x - self.from_centroid.x;
        let mut y = point.y - self.from_centroid.y;
        if self.mirror {
            y = -y;
        }
        Point2::new(
            self.cos * x - self.sin * y + self.to_centroid.x,
            self.sin * x + self.cos * y + self.to_centroid.y,
        )
    }
}

fn centroid(points: &[Point2]) -> Point2 {
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Point2::new(sx / n, sy / n)
}

/// Least-squares rigid fit of `moving` onto `target` (2D Procrustes, mirror allowed).
pub fn fit_rigid(moving: &[Point2], target: &[Point2]) -> Option<RigidTransform> {
    if moving.is_empty() || moving.len() != target.len() {
        return None;
    }

    let from_centroid = centroid(moving);
    let to_centroid = centroid(target);

    let score = |mirror: bool| {
        let (mut dot, mut cross) = (0.0, 0.0);
        for (p, q) in moving.iter().zip(target) {
            let px = p.x - from_centroid.x;
            let py = if mirror {
                -(p.y - from_centroid.y)
            } else {
                p.y - from_centroid.y
            };
            let qx = q.x - to_centroid.x;
            let qy = q.y - to_centroid.y;
            dot += px * qx + py * qy;
            cross += px * qy - py * qx;
        }
        (dot.hypot(cross), dot, cross)
    };

    let (plain, plain_dot, plain_cross) = score(false);
    let (mirrored, mirrored_dot, mirrored_cross) = score(true);
    let (mirror, dot, cross) = if mirrored > plain + 1e-9 {
        (true, mirrored_dot, mirrored_cross)
    } else {
        (false, plain_dot, plain_cross)
    };

    let angle = if dot == 0.0 && cross == 0.0 {
        0.0
    } else {
        cross.atan2(dot)
    };

    Some(RigidTransform {
        cos: angle.cos(),
        sin: angle.sin(),
        mirror,
        from_centroid,
        to_centroid,
    })
}

/// Moves the whole depiction so that the listed atoms best overlay their core positions.
/// A reflected drawing has its wedges and hashes swapped.
///
/// `pairs` holds `(atom index in block, target position)`. Nothing changes when it is empty.
pub fn align_to_core(block: &mut MolBlock, pairs: &[(usize, Point2)]) -> eyre::Result<()> {
    let moving = pairs
        .iter()
        .map(|(idx, _)| block.coordinates(*idx))
        .collect::<eyre::Result<Vec<_>>>()?;
    let target = pairs.iter().map(|(_, p)| *p).collect::<Vec<_>>();

    let Some(transform) = fit_rigid(&moving, &target) else {
        return Ok(());
    };

    for idx in 0..block.atom_count() {
        let moved = transform.apply(block.coordinates(idx)?);
        block.set_coordinates(idx, moved)?;
    }
    if transform.mirror {
        block.mirror_wedges()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ETHANOL: &str = "
     RDKit          2D

  3  2  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    1.2990    0.7500    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    2.5981   -0.0000    0.0000 O   0  0  0  0  0  0  0  0  0  0  0  0
  1  2  1  0
  2  3  1  0
M  END
";

    fn close(a: Point2, b: Point2) -> bool {
        (a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3
    }

    #[test]
    fn test_parse_molblock() {
        let block = MolBlock::parse(ETHANOL).unwrap();
        assert_eq!(block.atom_count(), 3);
        assert_eq!(block.title(), "");
        assert!(close(block.coordinates(1).unwrap(), Point2::new(1.299, 0.75)));
        assert!(block.coordinates(3).is_err());
    }

    #[test]
    fn test_rewrite_keeps_other_columns() {
        let mut block = MolBlock::parse(ETHANOL).unwrap();
        block.set_title("ethanol");
        block
            .set_coordinates(2, Point2::new(-10.5, 3.25))
            .unwrap();

        let text = block.to_string();
        assert!(text.starts_with("ethanol\n"));
        assert!(text.contains("  -10.5000    3.2500    0.0000 O   0  0"));
        assert!(text.ends_with("M  END\n"));
    }

    #[test]
    fn test_rejects_v3000() {
        let v3000 = ETHANOL.replace("V2000", "V3000");
        assert!(MolBlock::parse(&v3000).is_err());
    }

    #[test]
    fn test_fit_recovers_rotation_and_translation() {
        let target = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 2.0),
        ];
        // rotated by 90 degrees and shifted
        let moving = target
            .iter()
            .map(|p| Point2::new(-p.y + 5.0, p.x - 3.0))
            .collect::<Vec<_>>();

        let transform = fit_rigid(&moving, &target).unwrap();
        assert!(!transform.mirror);
        for (m, t) in moving.iter().zip(&target) {
            assert!(close(transform.apply(*m), *t));
        }
    }

    #[test]
    fn test_fit_uses_mirror_when_better() {
        let target = vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(0.0, 1.0),
        ];
        let moving = target
            .iter()
            .map(|p| Point2::new(p.x, -p.y))
            .collect::<Vec<_>>();

        let transform = fit_rigid(&moving, &target).unwrap();
        assert!(transform.mirror);
        for (m, t) in moving.iter().zip(&target) {
            assert!(close(transform.apply(*m), *t));
        }
    }

    #[test]
    fn test_align_single_point_translates() {
        let mut block = MolBlock::parse(ETHANOL).unwrap();
        align_to_core(&mut block, &[(0, Point2::new(1.0, 1.0))]).unwrap();
        assert!(close(block.coordinates(0).unwrap(), Point2::new(1.0, 1.0)));
        assert!(close(block.coordinates(1).unwrap(), Point2::new(2.299, 1.75)));
    }

    const CHIRAL_CENTRE: &str = "
     RDKit          2D

  5  4  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    0.0000    1.0000    0.0000 Cl  0  0  0  0  0  0  0  0  0  0  0  0
    1.0000    0.0000    0.0000 F   0  0  0  0  0  0  0  0  0  0  0  0
   -1.0000    0.0000    0.0000 Br  0  0  0  0  0  0  0  0  0  0  0  0
    0.0000   -1.0000    0.0000 I   0  0  0  0  0  0  0  0  0  0  0  0
  1  2  1  1
  1  3  1  0
  1  4  1  0
  1  5  1  6
M  END
";

    #[test]
    fn test_mirrored_alignment_swaps_wedges() {
        let mut block = MolBlock::parse(CHIRAL_CENTRE).unwrap();
        assert_eq!(block.bond_count(), 4);

        // the core was drawn upside down relative to this depiction
        let pairs = block
            .layout()
            .unwrap()
            .into_iter()
            .enumerate()
            .map(|(idx, p)| (idx, Point2::new(p.x, -p.y)))
            .collect::<Vec<_>>();
        align_to_core(&mut block, &pairs).unwrap();

        assert!(close(block.coordinates(1).unwrap(), Point2::new(0.0, -1.0)));
        assert!(close(block.coordinates(4).unwrap(), Point2::new(0.0, 1.0)));
        assert_eq!(block.bond_stereo(0).unwrap(), 6);
        assert_eq!(block.bond_stereo(1).unwrap(), 0);
        assert_eq!(block.bond_stereo(3).unwrap(), 1);
        assert!(block.to_string().contains("  1  2  1  6\n"));
    }

    #[test]
    fn test_rotation_keeps_wedges() {
        let mut block = MolBlock::parse(CHIRAL_CENTRE).unwrap();
        let pairs = block
            .layout()
            .unwrap()
            .into_iter()
            .enumerate()
            .map(|(idx, p)| (idx, Point2::new(-p.y, p.x)))
            .collect::<Vec<_>>();
        align_to_core(&mut block, &pairs).unwrap();

        assert_eq!(block.bond_stereo(0).unwrap(), 1);
        assert_eq!(block.bond_stereo(3).unwrap(), 6);
    }

    #[test]
    fn test_align_without_pairs_is_noop() {
        let mut block = MolBlock::parse(ETHANOL).unwrap();
        let before = block.clone();
        align_to_core(&mut block, &[]).unwrap();
        assert_eq!(block, before);
    }
}
