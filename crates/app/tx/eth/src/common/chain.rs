//! Well-known chains selectable by name or id.

use std::fmt;
use std::str::FromStr;

use super::CommonError;

/// A public chain with a fixed chain id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chain {
    Mainnet,
    Ropsten,
    Rinkeby,
    Goerli,
    Holesky,
    Sepolia,
}

impl Chain {
    pub const ALL: [Chain; 6] = [
        Chain::Mainnet,
        Chain::Ropsten,
        Chain::Rinkeby,
        Chain::Goerli,
        Chain::Holesky,
        Chain::Sepolia,
    ];

    pub const fn id(self) -> u64 {
        match self {
            Chain::Mainnet => 1,
            Chain::Ropsten => 3,
            Chain::Rinkeby => 4,
            Chain::Goerli => 5,
            Chain::Holesky => 17000,
            Chain::Sepolia => 11_155_111,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Chain::Mainnet => "mainnet",
            Chain::Ropsten => "ropsten",
            Chain::Rinkeby => "rinkeby",
            Chain::Goerli => "goerli",
            Chain::Holesky => "holesky",
            Chain::Sepolia => "sepolia",
        }
    }

    pub fn from_id(id: u64) -> Result<Self, CommonError> {
        Self::ALL
            .into_iter()
            .find(|chain| chain.id() == id)
            .ok_or_else(|| CommonError::UnknownChain(id.to_string()))
    }

    pub fn is_supported_id(id: u64) -> bool {
        Self::from_id(id).is_ok()
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Chain {
    type Err = CommonError;

    /// Accepts a chain name (case-insensitive) or a decimal chain id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(id) = s.parse::<u64>() {
            return Self::from_id(id);
        }
        Self::ALL
            .into_iter()
            .find(|chain| chain.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| CommonError::UnknownChain(s.to_string()))
    }
}

impl TryFrom<u64> for Chain {
    type Error = CommonError;

    fn try_from(id: u64) -> Result<Self, Self::Error> {
        Self::from_id(id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_name_and_id() {
        assert_eq!("mainnet".parse::<Chain>().unwrap(), Chain::Mainnet);
        assert_eq!("Sepolia".parse::<Chain>().unwrap(), Chain::Sepolia);
        assert_eq!("4".parse::<Chain>().unwrap(), Chain::Rinkeby);
        assert_eq!(Chain::try_from(5u64).unwrap(), Chain::Goerli);
        assert!(Chain::is_supported_id(17000));
    }

    #[test]
    fn test_unknown_chain() {
        assert!(matches!(
            "atlantis".parse::<Chain>(),
            Err(CommonError::UnknownChain(name)) if name == "atlantis"
        ));
        assert!(matches!(Chain::from_id(1337), Err(CommonError::UnknownChain(_))));
    }
}
