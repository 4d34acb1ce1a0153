use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

lazy_static::lazy_static! {
    static ref RGROUP_LABEL_RE: regex::Regex = regex::Regex::new(r"^[rR](?P<num>\d+)$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Smi,
    Sdf,
}

impl FromStr for OutputFormat {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "smi" => Ok(OutputFormat::Smi),
            "sdf" => Ok(OutputFormat::Sdf),
            other => Err(eyre::eyre!(
                "Please specify the output format from [smi, sdf]. Your specified format: {}",
                other
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Smi => write!(f, "smi"),
            OutputFormat::Sdf => write!(f, "sdf"),
        }
    }
}

/// An R-group key such as `r2`, and the atom-map number it stands for.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RGroupLabel {
    pub map_number: u32,
    pub label: String,
}

impl FromStr for RGroupLabel {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = RGROUP_LABEL_RE
            .captures(s)
            .ok_or(eyre::eyre!("R-group key '{}' must look like r1, r2, ...", s))?;
        let map_number = captures["num"].parse::<u32>()?;
        if map_number == 0 {
            return Err(eyre::eyre!("R-group key '{}' must be numbered from 1", s));
        }

        Ok(RGroupLabel {
            map_number,
            label: s.to_string(),
        })
    }
}

impl fmt::Display for RGroupLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    core: PathBuf,
    rgroup: BTreeMap<String, PathBuf>,
    output: PathBuf,
    output_format: String,
    #[serde(default)]
    random_order: bool,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    limit: Option<usize>,
    #[serde(default)]
    name_column: bool,
}

/// A validated run file. R-groups are sorted by map number.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumerationConfig {
    pub core: PathBuf,
    pub rgroups: Vec<(RGroupLabel, PathBuf)>,
    pub output: PathBuf,
    pub output_format: OutputFormat,
    pub random_order: bool,
    pub seed: Option<u64>,
    pub limit: Option<usize>,
    pub name_column: bool,
}

impl EnumerationConfig {
    pub fn from_path(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| eyre::eyre!("could not read config {:?}: {}", path, e))?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> eyre::Result<Self> {
        let raw: RawConfig = serde_yaml::from_str(text)?;
        let output_format = raw.output_format.parse::<OutputFormat>()?;

        let mut rgroups = raw
            .rgroup
            .into_iter()
            .map(|(key, path)| -> eyre::Result<(RGroupLabel, PathBuf)> {
                Ok((key.parse::<RGroupLabel>()?, path))
            })
            .collect::<eyre::Result<Vec<_>>>()?;
        rgroups.sort_by(|a, b| a.0.cmp(&b.0));

        for pair in rgroups.windows(2) {
            if pair[0].0.map_number == pair[1].0.map_number {
                return Err(eyre::eyre!(
                    "R-group keys '{}' and '{}' both use map number {}",
                    pair[0].0,
                    pair[1].0,
                    pair[0].0.map_number
                ));
            }
        }

        Ok(EnumerationConfig {
            core: raw.core,
            rgroups,
            output: raw.output,
            output_format,
            random_order: raw.random_order,
            seed: raw.seed,
            limit: raw.limit,
            name_column: raw.name_column,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_parsing() {
        let label = "r12".parse::<RGroupLabel>().unwrap();
        assert_eq!(label.map_number, 12);
        assert_eq!(label.to_string(), "r12");
        assert_eq!("R3".parse::<RGroupLabel>().unwrap().map_number, 3);
        assert!("r0".parse::<RGroupLabel>().is_err());
        assert!("x1".parse::<RGroupLabel>().is_err());
        assert!("r".parse::<RGroupLabel>().is_err());
    }

    #[test]
    fn test_rgroups_sorted_by_map_number() {
        let config = EnumerationConfig::from_yaml(
            "core: core.smi\nrgroup:\n  r10: ten.smi\n  r2: two.smi\noutput: out/a.smi\noutput_format: smi\n",
        )
        .unwrap();
        let labels = config
            .rgroups
            .iter()
            .map(|(label, _)| label.map_number)
            .collect::<Vec<_>>();
        assert_eq!(labels, vec![2, 10]);
        assert!(!config.random_order);
        assert_eq!(config.limit, None);
    }

    #[test]
    fn test_duplicate_map_numbers_rejected() {
        let result = EnumerationConfig::from_yaml(
            "core: c.smi\nrgroup:\n  r1: a.smi\n  R01: b.smi\noutput: o.smi\noutput_format: smi\n",
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_output_format() {
        let err = EnumerationConfig::from_yaml(
            "core: c.smi\nrgroup: {}\noutput: o.csv\noutput_format: csv\n",
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Please specify the output format from [smi, sdf]. Your specified format: csv"
        );
    }
}
