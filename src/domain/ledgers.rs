//! Base ledger registry: display names and colours, partitioned per layer.
//!
//! A layer's subset doubles as its ledger allow-list: a ledger id that is not
//! listed for a layer is dropped by that layer's CSV parser.

use serde::Serialize;

use crate::domain::Layer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// `#rrggbb`
    pub fn hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    /// `rgba(r, g, b, a)` with `alpha` clamped to `[0, 1]`.
    pub fn rgba(self, alpha: f64) -> String {
        let a = if alpha.is_finite() { alpha.clamp(0.0, 1.0) } else { 1.0 };
        format!("rgba({}, {}, {}, {a})", self.0, self.1, self.2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LedgerInfo {
    pub id: &'static str,
    pub display_name: &'static str,
    pub color: Rgb,
}

const fn info(id: &'static str, display_name: &'static str, color: Rgb) -> LedgerInfo {
    LedgerInfo {
        id,
        display_name,
        color,
    }
}

const BITCOIN: Rgb = Rgb(247, 147, 26);
const BITCOIN_CASH: Rgb = Rgb(141, 195, 81);
const CARDANO: Rgb = Rgb(0, 51, 173);
const DOGECOIN: Rgb = Rgb(194, 166, 51);
const ETHEREUM: Rgb = Rgb(98, 126, 234);
const LITECOIN: Rgb = Rgb(52, 93, 157);
const TEZOS: Rgb = Rgb(44, 125, 247);
const ZCASH: Rgb = Rgb(236, 178, 68);

/// Every known ledger. The first entry is the fallback for unknown ids.
pub const BASE_LEDGERS: &[LedgerInfo] = &[
    info("bitcoin", "Bitcoin", BITCOIN),
    info("bitcoin_cash", "Bitcoin Cash", BITCOIN_CASH),
    info("cardano", "Cardano", CARDANO),
    info("dogecoin", "Dogecoin", DOGECOIN),
    info("ethereum", "Ethereum", ETHEREUM),
    info("litecoin", "Litecoin", LITECOIN),
    info("tezos", "Tezos", TEZOS),
    info("zcash", "Zcash", ZCASH),
];

pub const CONSENSUS_LEDGERS: &[LedgerInfo] = BASE_LEDGERS;

pub const TOKENOMICS_LEDGERS: &[LedgerInfo] = BASE_LEDGERS;

pub const SOFTWARE_LEDGERS: &[LedgerInfo] = &[
    info("bitcoin", "Bitcoin Core", BITCOIN),
    info("bitcoin_cash", "Bitcoin Cash Node", BITCOIN_CASH),
    info("cardano", "Cardano Node", CARDANO),
    info("ethereum", "Go Ethereum", ETHEREUM),
    info("litecoin", "Litecoin Core", LITECOIN),
    info("tezos", "Octez", TEZOS),
    info("zcash", "Zcashd", ZCASH),
];

pub const NETWORK_LEDGERS: &[LedgerInfo] = &[
    info("bitcoin", "Bitcoin", BITCOIN),
    info("bitcoin_cash", "Bitcoin Cash", BITCOIN_CASH),
    info("dogecoin", "Dogecoin", DOGECOIN),
    info("litecoin", "Litecoin", LITECOIN),
    info("zcash", "Zcash", ZCASH),
];

pub const GEOGRAPHY_LEDGERS: &[LedgerInfo] = NETWORK_LEDGERS;

/// Governance also carries the synthetic ledgers produced by
/// [`unify_metrics`](crate::chart::governance::unify_metrics).
pub const GOVERNANCE_LEDGERS: &[LedgerInfo] = &[
    info("bitcoin", "Bitcoin (BIPs)", BITCOIN),
    info("cardano", "Cardano (CIPs)", CARDANO),
    info("ethereum", "Ethereum (EIPs)", ETHEREUM),
    info("Posts", "Posts", Rgb(54, 162, 235)),
    info("Comments", "Comments", Rgb(255, 99, 132)),
    info("Users", "Users", Rgb(75, 192, 192)),
    info("Communities", "Communities", Rgb(153, 102, 255)),
    info("Modularity", "Modularity", Rgb(255, 159, 64)),
    info("Gini coefficient", "Gini coefficient", Rgb(201, 203, 207)),
];

/// Colours for series that have no ledger identity (doughnut slices, extra axes).
pub const PALETTE: &[Rgb] = &[
    Rgb(54, 162, 235),
    Rgb(255, 99, 132),
    Rgb(75, 192, 192),
    Rgb(255, 205, 86),
    Rgb(153, 102, 255),
    Rgb(255, 159, 64),
    Rgb(201, 203, 207),
    Rgb(46, 204, 113),
    Rgb(231, 76, 60),
    Rgb(52, 73, 94),
];

/// Colour used when a ledger is unknown to the registry (the first base entry).
pub const DEFAULT_COLOR: Rgb = BITCOIN;

pub fn layer_ledgers(layer: Layer) -> &'static [LedgerInfo] {
    match layer {
        Layer::Consensus => CONSENSUS_LEDGERS,
        Layer::Tokenomics => TOKENOMICS_LEDGERS,
        Layer::Software => SOFTWARE_LEDGERS,
        Layer::Network => NETWORK_LEDGERS,
        Layer::Geography => GEOGRAPHY_LEDGERS,
        Layer::Governance => GOVERNANCE_LEDGERS,
    }
}

/// Allow-listed ledger ids for `layer`.
pub fn ledger_ids(layer: Layer) -> Vec<&'static str> {
    layer_ledgers(layer).iter().map(|l| l.id).collect()
}

pub fn ledger_info(ledger: &str, layer: Layer) -> Option<&'static LedgerInfo> {
    layer_ledgers(layer).iter().find(|l| l.id == ledger)
}

/// Colour for `ledger` in `layer`; unknown ledgers get [`DEFAULT_COLOR`].
pub fn ledger_color(ledger: &str, layer: Layer) -> Rgb {
    ledger_info(ledger, layer).map_or(DEFAULT_COLOR, |l| l.color)
}

/// Display name for `ledger` in `layer`; unknown ledgers keep their raw id.
pub fn ledger_display_name(ledger: &str, layer: Layer) -> String {
    ledger_info(ledger, layer).map_or_else(|| ledger.to_string(), |l| l.display_name.to_string())
}

pub fn palette_color(idx: usize) -> Rgb {
    PALETTE[idx % PALETTE.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_ledger_falls_back_to_bitcoin_colour() {
        assert_eq!(ledger_color("unknown_ledger", Layer::Consensus), BITCOIN);
        assert_eq!(ledger_display_name("unknown_ledger", Layer::Consensus), "unknown_ledger");
    }

    #[test]
    fn display_names_are_layer_aware() {
        assert_eq!(ledger_display_name("bitcoin", Layer::Consensus), "Bitcoin");
        assert_eq!(ledger_display_name("bitcoin", Layer::Software), "Bitcoin Core");
        // Known ledger, but not part of the network subset.
        assert_eq!(ledger_display_name("ethereum", Layer::Network), "ethereum");
        assert_eq!(ledger_color("ethereum", Layer::Network), DEFAULT_COLOR);
    }

    #[test]
    fn colour_formats() {
        assert_eq!(Rgb(247, 147, 26).hex(), "#f7931a");
        assert_eq!(Rgb(1, 2, 3).rgba(0.2), "rgba(1, 2, 3, 0.2)");
        assert_eq!(Rgb(1, 2, 3).rgba(7.0), "rgba(1, 2, 3, 1)");
    }

    #[test]
    fn every_layer_has_an_allow_list() {
        for layer in Layer::ALL {
            assert!(!ledger_ids(layer).is_empty(), "{layer} has no ledgers");
        }
        assert!(ledger_ids(Layer::Governance).contains(&"Posts"));
    }
}
