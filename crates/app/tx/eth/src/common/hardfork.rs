//! Ordered protocol forks and the upgrades each one activates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::CommonError;

/// Upgrade identifiers (EIP numbers) consulted by the transaction types.
pub mod eip {
    /// Low-S signatures, contract creation cost.
    pub const EIP2: u32 = 2;
    /// Simple replay attack protection.
    pub const EIP155: u32 = 155;
    /// Fee market change.
    pub const EIP1559: u32 = 1559;
    /// Calldata gas cost reduction.
    pub const EIP2028: u32 = 2028;
    /// Typed transaction envelope.
    pub const EIP2718: u32 = 2718;
    /// Optional access lists.
    pub const EIP2930: u32 = 2930;
    /// Limit and meter initcode.
    pub const EIP3860: u32 = 3860;
}

/// A named protocol revision. Ordering follows activation order on mainnet.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum Hardfork {
    Chainstart,
    Homestead,
    Dao,
    TangerineWhistle,
    SpuriousDragon,
    Byzantium,
    Constantinople,
    Petersburg,
    Istanbul,
    MuirGlacier,
    Berlin,
    London,
    ArrowGlacier,
    GrayGlacier,
    #[serde(alias = "merge")]
    Paris,
    #[default]
    Shanghai,
    Cancun,
}

impl Hardfork {
    /// All forks in activation order.
    pub const ALL: [Hardfork; 17] = [
        Hardfork::Chainstart,
        Hardfork::Homestead,
        Hardfork::Dao,
        Hardfork::TangerineWhistle,
        Hardfork::SpuriousDragon,
        Hardfork::Byzantium,
        Hardfork::Constantinople,
        Hardfork::Petersburg,
        Hardfork::Istanbul,
        Hardfork::MuirGlacier,
        Hardfork::Berlin,
        Hardfork::London,
        Hardfork::ArrowGlacier,
        Hardfork::GrayGlacier,
        Hardfork::Paris,
        Hardfork::Shanghai,
        Hardfork::Cancun,
    ];

    /// Upgrades introduced by this fork (not cumulative).
    pub fn introduced_eips(self) -> &'static [u32] {
        match self {
            Hardfork::Homestead => &[eip::EIP2, 7, 8],
            Hardfork::TangerineWhistle => &[150],
            Hardfork::SpuriousDragon => &[eip::EIP155, 160, 161, 170],
            Hardfork::Byzantium => &[100, 140, 196, 197, 198, 211, 214, 649, 658],
            Hardfork::Constantinople => &[145, 1014, 1052, 1234, 1283],
            Hardfork::Petersburg => &[1716],
            Hardfork::Istanbul => &[1108, 1344, 1884, eip::EIP2028, 2200],
            Hardfork::MuirGlacier => &[2384],
            Hardfork::Berlin => &[2565, eip::EIP2718, 2929, eip::EIP2930],
            Hardfork::London => &[eip::EIP1559, 3198, 3529, 3541],
            Hardfork::ArrowGlacier => &[4345],
            Hardfork::GrayGlacier => &[5133],
            Hardfork::Paris => &[3675, 4399],
            Hardfork::Shanghai => &[3651, 3855, eip::EIP3860, 4895],
            Hardfork::Cancun => &[1153, 4788, 4844, 5656, 6780, 7516],
            Hardfork::Chainstart | Hardfork::Dao => &[],
        }
    }

    /// The first fork that activates `eip`, if any fork does.
    pub fn activating(eip: u32) -> Option<Hardfork> {
        Self::ALL
            .into_iter()
            .find(|fork| fork.introduced_eips().contains(&eip))
    }

    pub fn name(self) -> &'static str {
        match self {
            Hardfork::Chainstart => "chainstart",
            Hardfork::Homestead => "homestead",
            Hardfork::Dao => "dao",
            Hardfork::TangerineWhistle => "tangerineWhistle",
            Hardfork::SpuriousDragon => "spuriousDragon",
            Hardfork::Byzantium => "byzantium",
            Hardfork::Constantinople => "constantinople",
            Hardfork::Petersburg => "petersburg",
            Hardfork::Istanbul => "istanbul",
            Hardfork::MuirGlacier => "muirGlacier",
            Hardfork::Berlin => "berlin",
            Hardfork::London => "london",
            Hardfork::ArrowGlacier => "arrowGlacier",
            Hardfork::GrayGlacier => "grayGlacier",
            Hardfork::Paris => "paris",
            Hardfork::Shanghai => "shanghai",
            Hardfork::Cancun => "cancun",
        }
    }
}

impl fmt::Display for Hardfork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Hardfork {
    type Err = CommonError;

    /// Case-insensitive; `merge` is accepted for `paris`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        if lowered == "merge" {
            return Ok(Hardfork::Paris);
        }
        Self::ALL
            .into_iter()
            .find(|fork| fork.name().to_ascii_lowercase() == lowered)
            .ok_or_else(|| CommonError::UnknownFork(s.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fork_ordering_is_total() {
        for pair in Hardfork::ALL.windows(2) {
            assert!(pair[0] < pair[1], "{} !< {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_activation_lookup() {
        assert_eq!(Hardfork::activating(eip::EIP2), Some(Hardfork::Homestead));
        assert_eq!(Hardfork::activating(eip::EIP155), Some(Hardfork::SpuriousDragon));
        assert_eq!(Hardfork::activating(eip::EIP2930), Some(Hardfork::Berlin));
        assert_eq!(Hardfork::activating(eip::EIP1559), Some(Hardfork::London));
        assert_eq!(Hardfork::activating(eip::EIP3860), Some(Hardfork::Shanghai));
        assert_eq!(Hardfork::activating(999_999), None);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("london".parse::<Hardfork>().unwrap(), Hardfork::London);
        assert_eq!("spuriousDragon".parse::<Hardfork>().unwrap(), Hardfork::SpuriousDragon);
        assert_eq!("SPURIOUSDRAGON".parse::<Hardfork>().unwrap(), Hardfork::SpuriousDragon);
        assert_eq!("merge".parse::<Hardfork>().unwrap(), Hardfork::Paris);
        assert!(matches!(
            "frontier2".parse::<Hardfork>(),
            Err(CommonError::UnknownFork(name)) if name == "frontier2"
        ));
    }

    #[test]
    fn test_display_round_trips() {
        for fork in Hardfork::ALL {
            assert_eq!(fork.to_string().parse::<Hardfork>().unwrap(), fork);
        }
    }
}
