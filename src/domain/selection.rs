//! User-selectable options that pick which pre-generated CSV variant to load.
//!
//! Every layer publishes its snapshots under `output/{layer}/`, and the file
//! name is derived from the selected options through fixed lookup tables.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::Layer;
use crate::error::AppError;

/// `(explorers, staking_keys)` clustering combination -> file fragment.
const CONSENSUS_CLUSTERING: [((bool, bool), &str); 4] = [
    ((true, true), "explorers_staking_keys"),
    ((true, false), "explorers"),
    ((false, true), "staking_keys"),
    ((false, false), "no_clustering"),
];

/// Sample windows (commits per sample) the software snapshots are published for.
pub const SOFTWARE_SAMPLE_WINDOWS: [u32; 4] = [100, 250, 500, 1000];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TokenomicsThreshold {
    /// Top 1000 addresses.
    Top1000,
    /// Top 10000 addresses.
    Top10000,
    /// Addresses holding more than 0.0001% of supply.
    Above0001,
    /// Every address.
    NoThreshold,
}

impl TokenomicsThreshold {
    fn fragment(self) -> &'static str {
        match self {
            TokenomicsThreshold::Top1000 => "top_1000",
            TokenomicsThreshold::Top10000 => "top_10000",
            TokenomicsThreshold::Above0001 => "above_0.0001%",
            TokenomicsThreshold::NoThreshold => "no_threshold",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SoftwareWeight {
    Commits,
    Lines,
}

impl SoftwareWeight {
    fn fragment(self) -> &'static str {
        match self {
            SoftwareWeight::Commits => "commits",
            SoftwareWeight::Lines => "lines",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GovernanceFile {
    /// Gini coefficient of participation per ledger.
    Gini,
    /// Posts / comments / users over time.
    Activity,
    /// Community count and modularity of the interaction graph.
    Communities,
}

impl GovernanceFile {
    fn fragment(self) -> &'static str {
        match self {
            GovernanceFile::Gini => "gini",
            GovernanceFile::Activity => "activity",
            GovernanceFile::Communities => "communities",
        }
    }
}

/// Fully-resolved option set for one layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "layer", rename_all = "lowercase")]
pub enum DataSelection {
    Consensus {
        explorers: bool,
        staking_keys: bool,
    },
    Tokenomics {
        threshold: TokenomicsThreshold,
        clustered: bool,
    },
    Software {
        weight: SoftwareWeight,
        sample_window: u32,
    },
    Network {
        without_tor: bool,
    },
    Geography {
        without_tor: bool,
    },
    Governance {
        file: GovernanceFile,
    },
}

impl DataSelection {
    /// Default options for `layer` (the dashboard's initial selection).
    pub fn default_for(layer: Layer, without_tor: bool) -> Self {
        match layer {
            Layer::Consensus => DataSelection::Consensus {
                explorers: true,
                staking_keys: true,
            },
            Layer::Tokenomics => DataSelection::Tokenomics {
                threshold: TokenomicsThreshold::Top1000,
                clustered: true,
            },
            Layer::Software => DataSelection::Software {
                weight: SoftwareWeight::Commits,
                sample_window: 100,
            },
            Layer::Network => DataSelection::Network { without_tor },
            Layer::Geography => DataSelection::Geography { without_tor },
            Layer::Governance => DataSelection::Governance {
                file: GovernanceFile::Gini,
            },
        }
    }

    pub fn layer(&self) -> Layer {
        match self {
            DataSelection::Consensus { .. } => Layer::Consensus,
            DataSelection::Tokenomics { .. } => Layer::Tokenomics,
            DataSelection::Software { .. } => Layer::Software,
            DataSelection::Network { .. } => Layer::Network,
            DataSelection::Geography { .. } => Layer::Geography,
            DataSelection::Governance { .. } => Layer::Governance,
        }
    }

    /// Relative path of the CSV for this selection (`output/{layer}/{file}.csv`).
    pub fn path(&self) -> Result<String, AppError> {
        let file = match *self {
            DataSelection::Consensus {
                explorers,
                staking_keys,
            } => {
                let fragment = CONSENSUS_CLUSTERING
                    .iter()
                    .find(|(combo, _)| *combo == (explorers, staking_keys))
                    .map(|(_, f)| *f)
                    .ok_or_else(|| AppError::new(2, "Unsupported consensus clustering combination."))?;
                format!("output_{fragment}.csv")
            }
            DataSelection::Tokenomics {
                threshold,
                clustered,
            } => {
                let clustering = if clustered { "clustered" } else { "non_clustered" };
                format!("output-{}-{clustering}.csv", threshold.fragment())
            }
            DataSelection::Software {
                weight,
                sample_window,
            } => {
                if !SOFTWARE_SAMPLE_WINDOWS.contains(&sample_window) {
                    return Err(AppError::new(
                        2,
                        format!(
                            "Unsupported software sample window {sample_window} (expected one of {SOFTWARE_SAMPLE_WINDOWS:?})."
                        ),
                    ));
                }
                format!("output_{}_{sample_window}.csv", weight.fragment())
            }
            DataSelection::Network { without_tor } => {
                format!("output_organizations{}.csv", tor_suffix(without_tor))
            }
            DataSelection::Geography { without_tor } => {
                format!("output_countries{}.csv", tor_suffix(without_tor))
            }
            DataSelection::Governance { file } => format!("{}.csv", file.fragment()),
        };
        Ok(format!("output/{}/{file}", self.layer().as_str()))
    }

    /// The same selection with the "without Tor" toggle applied (no-op for
    /// layers that have no Tor variant).
    pub fn with_without_tor(self, without_tor: bool) -> Self {
        match self {
            DataSelection::Network { .. } => DataSelection::Network { without_tor },
            DataSelection::Geography { .. } => DataSelection::Geography { without_tor },
            other => other,
        }
    }

    /// Short human summary used in headers and status lines.
    pub fn describe(&self) -> String {
        match *self {
            DataSelection::Consensus {
                explorers,
                staking_keys,
            } => format!("explorers={explorers} staking_keys={staking_keys}"),
            DataSelection::Tokenomics {
                threshold,
                clustered,
            } => format!("threshold={} clustered={clustered}", threshold.fragment()),
            DataSelection::Software {
                weight,
                sample_window,
            } => format!("weight={} window={sample_window}", weight.fragment()),
            DataSelection::Network { without_tor } | DataSelection::Geography { without_tor } => {
                format!("without_tor={without_tor}")
            }
            DataSelection::Governance { file } => format!("file={}", file.fragment()),
        }
    }
}

fn tor_suffix(without_tor: bool) -> &'static str {
    if without_tor { "_without_tor" } else { "" }
}

/// Path of the top-contributors CSV behind the software doughnut chart.
pub fn doughnut_path(ledger: &str, weight: SoftwareWeight) -> String {
    format!("output/software/contributors/{ledger}_{}.csv", weight.fragment())
}
